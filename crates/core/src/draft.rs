//! The in-progress registration.
//!
//! A [`RegistrationDraft`] mirrors the intake form: text fields hold whatever was typed, and the
//! money fields are recomputed after every change that affects them. Only
//! [`RegistrationWizard`](crate::RegistrationWizard) mutates a draft; everything else reads it.

use crate::catalog::{ScanId, ScanOption};
use crate::category::{Category, CategoryTable};
use crate::constants::DEFAULT_CATEGORY;
use crate::error::IntakeError;
use crate::pricing::{compute_charges, compute_due, Charges};
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AgeUnit {
    #[default]
    Years,
    Months,
    Days,
}

impl AgeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeUnit::Years => "Years",
            AgeUnit::Months => "Months",
            AgeUnit::Days => "Days",
        }
    }
}

impl fmt::Display for AgeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgeUnit {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "years" | "year" | "y" => Ok(AgeUnit::Years),
            "months" | "month" | "m" => Ok(AgeUnit::Months),
            "days" | "day" | "d" => Ok(AgeUnit::Days),
            _ => Err(IntakeError::InvalidInput(format!(
                "invalid age unit '{s}' (expected Years, Months or Days)"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            "other" | "o" => Ok(Gender::Other),
            _ => Err(IntakeError::InvalidInput(format!(
                "invalid gender '{s}' (expected Male, Female or Other)"
            ))),
        }
    }
}

/// Enrollment fields that the forward guard checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Hospital,
    Doctor,
    PatientName,
    Age,
    ContactNumber,
}

impl Field {
    /// Name of the field as it appears in request bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Hospital => "hospital_id",
            Field::Doctor => "doctor_id",
            Field::PatientName => "patient_name",
            Field::Age => "age",
            Field::ContactNumber => "contact_no",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-field messages from a failed enrollment check.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, msg)| (*field, msg.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Values entered on the enrollment step, applied in one go.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnrollmentDetails {
    pub hospital_id: Option<String>,
    pub doctor_id: Option<String>,
    pub patient_name: String,
    pub age: String,
    pub age_unit: AgeUnit,
    pub gender: Option<Gender>,
    pub contact_no: String,
}

/// One patient's intake, as currently entered.
///
/// Invariants maintained by the setters:
/// - `total_amount` is zero for a fee-exempt category and the sum of the selected catalog
///   scans otherwise;
/// - `due_amount == total_amount - received_amount - discount_amount`, unclamped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrationDraft {
    pub(crate) hospital_id: Option<String>,
    pub(crate) doctor_id: Option<String>,
    pub(crate) patient_name: String,
    pub(crate) age: String,
    pub(crate) age_unit: AgeUnit,
    pub(crate) gender: Option<Gender>,
    pub(crate) contact_no: String,
    pub(crate) category: Category,
    pub(crate) selected_scan_ids: BTreeSet<ScanId>,
    pub(crate) allot_date: Option<NaiveDate>,
    pub(crate) allot_time: Option<NaiveTime>,
    pub(crate) charges: Charges,
    pub(crate) received_amount: Decimal,
    pub(crate) discount_amount: Decimal,
    pub(crate) due_amount: Decimal,
}

impl RegistrationDraft {
    /// An empty draft with the default category.
    pub fn new(categories: &CategoryTable) -> Self {
        Self {
            hospital_id: None,
            doctor_id: None,
            patient_name: String::new(),
            age: String::new(),
            age_unit: AgeUnit::default(),
            gender: None,
            contact_no: String::new(),
            category: categories.category(DEFAULT_CATEGORY),
            selected_scan_ids: BTreeSet::new(),
            allot_date: None,
            allot_time: None,
            charges: Charges::default(),
            received_amount: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            due_amount: Decimal::ZERO,
        }
    }

    pub fn hospital_id(&self) -> Option<&str> {
        self.hospital_id.as_deref()
    }

    pub fn doctor_id(&self) -> Option<&str> {
        self.doctor_id.as_deref()
    }

    pub fn patient_name(&self) -> &str {
        &self.patient_name
    }

    pub fn age(&self) -> &str {
        &self.age
    }

    pub fn age_unit(&self) -> AgeUnit {
        self.age_unit
    }

    pub fn gender(&self) -> Option<Gender> {
        self.gender
    }

    pub fn contact_no(&self) -> &str {
        &self.contact_no
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn selected_scan_ids(&self) -> &BTreeSet<ScanId> {
        &self.selected_scan_ids
    }

    pub fn allot_date(&self) -> Option<NaiveDate> {
        self.allot_date
    }

    pub fn allot_time(&self) -> Option<NaiveTime> {
        self.allot_time
    }

    pub fn gross_amount(&self) -> Decimal {
        self.charges.gross_amount
    }

    pub fn total_amount(&self) -> Decimal {
        self.charges.total_amount
    }

    pub fn total_minutes(&self) -> u32 {
        self.charges.total_minutes
    }

    pub fn received_amount(&self) -> Decimal {
        self.received_amount
    }

    pub fn discount_amount(&self) -> Decimal {
        self.discount_amount
    }

    pub fn due_amount(&self) -> Decimal {
        self.due_amount
    }

    /// Nothing left to collect; the receipt may be printed.
    pub fn is_settled(&self) -> bool {
        crate::pricing::is_settled(self.due_amount)
    }

    /// Expected end of the appointment, when a start time is set.
    pub fn estimated_end_time(&self) -> Option<NaiveTime> {
        let start = self.allot_time?;
        let minutes = chrono::Duration::minutes(i64::from(self.charges.total_minutes));
        Some(start.overflowing_add_signed(minutes).0)
    }

    pub(crate) fn reprice(&mut self, catalog: &[ScanOption]) {
        self.charges = compute_charges(&self.selected_scan_ids, catalog, &self.category);
        self.recompute_due();
    }

    pub(crate) fn recompute_due(&mut self) {
        self.due_amount = compute_due(
            self.charges.total_amount,
            self.received_amount,
            self.discount_amount,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_draft_is_empty_and_paying() {
        let draft = RegistrationDraft::new(&CategoryTable::default());
        assert_eq!(draft.category().name, "GEN / Paid");
        assert!(!draft.category().is_fee_exempt);
        assert!(draft.selected_scan_ids().is_empty());
        assert!(draft.total_amount().is_zero());
        assert!(draft.is_settled());
    }

    #[test]
    fn settled_only_when_nothing_is_due() {
        let mut draft = RegistrationDraft::new(&CategoryTable::default());
        draft.charges.total_amount = Decimal::from(600);
        draft.received_amount = Decimal::from(600);
        draft.recompute_due();
        assert!(draft.due_amount().is_zero());
        assert!(draft.is_settled());

        draft.received_amount = Decimal::from(599);
        draft.recompute_due();
        assert!(!draft.is_settled());
    }

    #[test]
    fn end_time_adds_scan_minutes() {
        let mut draft = RegistrationDraft::new(&CategoryTable::default());
        assert_eq!(draft.estimated_end_time(), None);

        draft.allot_time = NaiveTime::from_hms_opt(10, 30, 0);
        draft.charges.total_minutes = 45;
        assert_eq!(draft.estimated_end_time(), NaiveTime::from_hms_opt(11, 15, 0));
    }

    #[test]
    fn age_unit_and_gender_parse_loosely() {
        assert_eq!("months".parse::<AgeUnit>().ok(), Some(AgeUnit::Months));
        assert_eq!(" Y ".parse::<AgeUnit>().ok(), Some(AgeUnit::Years));
        assert!("weeks".parse::<AgeUnit>().is_err());
        assert_eq!("FEMALE".parse::<Gender>().ok(), Some(Gender::Female));
        assert!(matches!(
            "unknown".parse::<Gender>(),
            Err(IntakeError::InvalidInput(msg)) if msg.contains("gender")
        ));
    }

    #[test]
    fn field_errors_display_in_field_order() {
        let mut errors = FieldErrors::new();
        errors.insert(Field::PatientName, "required");
        errors.insert(Field::Hospital, "required");
        assert_eq!(errors.to_string(), "hospital_id: required; patient_name: required");
        assert_eq!(errors.len(), 2);
    }
}
