//! Backend wire contracts.
//!
//! The backend is loosely typed: numeric fields sometimes arrive as strings. Catalog entries
//! therefore keep their numeric fields as raw JSON values and are interpreted one entry at a
//! time by the consumer, so a single bad row cannot poison the whole list.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One scan catalog row: `{s_id, s_name, charges, estimate_time}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScanCatalogEntry {
    pub s_id: serde_json::Value,
    pub s_name: String,
    pub charges: serde_json::Value,
    pub estimate_time: serde_json::Value,
}

/// Identifier that the backend sends either as a number or as a string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlexId {
    Number(u64),
    Text(String),
}

impl fmt::Display for FlexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlexId::Number(n) => write!(f, "{n}"),
            FlexId::Text(s) => f.write_str(s),
        }
    }
}

/// Hospital or doctor row from the directory endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub id: FlexId,
    pub name: String,
    /// Only present on doctor rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_id: Option<FlexId>,
}

/// Body of the backend's patient-creation request.
///
/// `amount` is the gross charge before any category waiver; `total_amount` is what the patient
/// owes. `scan_type` is the comma-joined list of selected scan ids.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreatePatientReq {
    pub cro: String,
    pub hospital_id: String,
    pub doctor_id: String,
    pub patient_name: String,
    pub age: String,
    pub age_unit: String,
    pub gender: String,
    pub contact_no: String,
    pub scan_type: String,
    pub category: String,
    pub allot_date: String,
    pub allot_time: String,
    pub estimated_minutes: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub rec_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub dis_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub due_amount: Decimal,
}

/// Backend confirmation. Both fields are optional because the backend is not consistent
/// about what it echoes back.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePatientRes {
    #[serde(default)]
    pub id: Option<FlexId>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn create_patient_req_uses_backend_field_names() {
        let req = CreatePatientReq {
            cro: "CRO-20261016-0001".into(),
            hospital_id: "1".into(),
            doctor_id: "7".into(),
            patient_name: "Asha Meena".into(),
            age: "34".into(),
            age_unit: "Years".into(),
            gender: "Female".into(),
            contact_no: "9829012345".into(),
            scan_type: "1,2".into(),
            category: "GEN / Paid".into(),
            allot_date: "2026-10-16".into(),
            allot_time: "10:30".into(),
            estimated_minutes: 45,
            amount: Decimal::from(1500),
            total_amount: Decimal::from(1500),
            rec_amount: Decimal::from(500),
            dis_amount: Decimal::from(200),
            due_amount: Decimal::from(800),
        };

        let json = serde_json::to_value(&req).expect("serialise");
        for key in [
            "patient_name",
            "age",
            "gender",
            "scan_type",
            "category",
            "allot_date",
            "allot_time",
            "amount",
            "total_amount",
            "rec_amount",
            "dis_amount",
            "due_amount",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["due_amount"], serde_json::json!(800.0));
        assert_eq!(json["scan_type"], "1,2");
    }

    #[test]
    fn amounts_keep_cents() {
        let json = serde_json::json!(450.75);
        let amount: Decimal = rust_decimal::serde::float::deserialize(json).expect("float");
        assert_eq!(amount, Decimal::from_str("450.75").expect("decimal"));
    }

    #[test]
    fn directory_entry_accepts_numeric_and_text_ids() {
        let rows: Vec<DirectoryEntry> = serde_json::from_str(
            r#"[{"id": 3, "name": "City Hospital"}, {"id": "D-9", "name": "Dr Rao", "hospital_id": 3}]"#,
        )
        .expect("parse directory rows");

        assert_eq!(rows[0].id.to_string(), "3");
        assert_eq!(rows[1].id, FlexId::Text("D-9".into()));
        assert_eq!(rows[1].hospital_id, Some(FlexId::Number(3)));
    }

    #[test]
    fn create_patient_res_tolerates_empty_body() {
        let res: CreatePatientRes = serde_json::from_str("{}").expect("empty object");
        assert_eq!(res, CreatePatientRes::default());
    }
}
