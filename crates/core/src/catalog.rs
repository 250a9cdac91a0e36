//! Scan catalog and directory reference data.
//!
//! Reference data is supplied externally and read-only here. Conversion from the backend's
//! wire rows fails closed: a row whose id, charge or duration cannot be read as a
//! non-negative number within [`MAX_AMOUNT_UNITS`] is dropped with a warning, and the rest of the catalog is kept.

use crate::constants::MAX_AMOUNT_UNITS;
use api_shared::{DirectoryEntry, ScanCatalogEntry};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Catalog identifier of a scan type (`s_id`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanId(pub u64);

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ScanId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// A scan type that can be booked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScanOption {
    pub id: ScanId,
    pub name: String,
    pub charge: Decimal,
    pub estimated_minutes: u32,
}

impl ScanOption {
    /// Returns `None` when `charge` is negative or above [`MAX_AMOUNT_UNITS`].
    pub fn new(
        id: impl Into<ScanId>,
        name: impl Into<String>,
        charge: Decimal,
        estimated_minutes: u32,
    ) -> Option<Self> {
        if (charge.is_sign_negative() && !charge.is_zero())
            || charge > Decimal::from(MAX_AMOUNT_UNITS)
        {
            return None;
        }
        Some(Self {
            id: id.into(),
            name: name.into(),
            charge,
            estimated_minutes,
        })
    }

    /// Interprets one backend catalog row.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when any numeric field is missing, non-numeric,
    /// negative or out of range.
    pub fn from_wire(entry: &ScanCatalogEntry) -> Result<Self, String> {
        let id = u64_from_value(&entry.s_id).ok_or_else(|| format!("bad s_id {}", entry.s_id))?;
        let charge = decimal_from_value(&entry.charges)
            .ok_or_else(|| format!("bad charges {}", entry.charges))?;
        let minutes = u64_from_value(&entry.estimate_time)
            .and_then(|m| u32::try_from(m).ok())
            .ok_or_else(|| format!("bad estimate_time {}", entry.estimate_time))?;

        Self::new(id, entry.s_name.trim(), charge, minutes)
            .ok_or_else(|| format!("charges {charge} out of range"))
    }

    pub fn to_wire(&self) -> ScanCatalogEntry {
        ScanCatalogEntry {
            s_id: Value::from(self.id.0),
            s_name: self.name.clone(),
            charges: Value::String(self.charge.to_string()),
            estimate_time: Value::from(self.estimated_minutes),
        }
    }
}

/// Builds catalog entries from raw JSON rows, dropping anything malformed.
pub fn scan_options_from_values(rows: Vec<Value>) -> Vec<ScanOption> {
    rows.into_iter()
        .filter_map(|row| {
            let entry: ScanCatalogEntry = match serde_json::from_value(row) {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("dropping unreadable scan catalog row: {}", e);
                    return None;
                }
            };
            match ScanOption::from_wire(&entry) {
                Ok(option) => Some(option),
                Err(reason) => {
                    tracing::warn!("dropping scan catalog row {:?}: {}", entry.s_name, reason);
                    None
                }
            }
        })
        .collect()
}

/// A hospital offered on the enrollment form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Hospital {
    pub id: String,
    pub name: String,
}

/// A referring doctor offered on the enrollment form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub hospital_id: Option<String>,
}

impl From<DirectoryEntry> for Hospital {
    fn from(entry: DirectoryEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            name: entry.name,
        }
    }
}

impl From<DirectoryEntry> for Doctor {
    fn from(entry: DirectoryEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            name: entry.name,
            hospital_id: entry.hospital_id.map(|h| h.to_string()),
        }
    }
}

fn u64_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}
