//! A registration ready to be persisted.

use crate::catalog::ScanId;
use crate::category::Category;
use crate::constants::CURRENCY_DECIMAL_PLACES;
use crate::draft::{AgeUnit, Gender, RegistrationDraft};
use crate::error::{IntakeError, IntakeResult};
use crate::pricing::Charges;
use crate::validation::{validate_enrollment, Enrollment};
use api_shared::CreatePatientReq;
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use scanreg_ids::CroNumber;
use std::collections::BTreeSet;

/// A draft that passed every wizard guard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientRecord {
    pub enrollment: Enrollment,
    pub age_unit: AgeUnit,
    pub gender: Option<Gender>,
    pub category: Category,
    pub scan_ids: BTreeSet<ScanId>,
    pub allot_date: Option<NaiveDate>,
    pub allot_time: Option<NaiveTime>,
    pub charges: Charges,
    pub received_amount: Decimal,
    pub discount_amount: Decimal,
    pub due_amount: Decimal,
}

impl PatientRecord {
    /// Re-runs both forward guards on `draft` and captures its current values.
    ///
    /// # Errors
    ///
    /// - [`IntakeError::Validation`] when an enrollment field is missing.
    /// - [`IntakeError::NoScanSelected`] when no scan is selected.
    pub fn from_draft(draft: &RegistrationDraft) -> IntakeResult<Self> {
        let enrollment = validate_enrollment(draft).map_err(IntakeError::Validation)?;
        if draft.selected_scan_ids().is_empty() {
            return Err(IntakeError::NoScanSelected);
        }

        Ok(Self {
            enrollment,
            age_unit: draft.age_unit(),
            gender: draft.gender(),
            category: draft.category().clone(),
            scan_ids: draft.selected_scan_ids().clone(),
            allot_date: draft.allot_date(),
            allot_time: draft.allot_time(),
            charges: draft.charges,
            received_amount: draft.received_amount(),
            discount_amount: draft.discount_amount(),
            due_amount: draft.due_amount(),
        })
    }

    /// Comma-joined scan ids in ascending order, as the backend's `scan_type` expects.
    pub fn scan_type(&self) -> String {
        self.scan_ids
            .iter()
            .map(ScanId::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Flattens the record into the backend's patient-creation body.
    pub fn to_wire(&self, cro: &CroNumber) -> CreatePatientReq {
        CreatePatientReq {
            cro: cro.to_string(),
            hospital_id: self.enrollment.hospital_id.to_string(),
            doctor_id: self.enrollment.doctor_id.to_string(),
            patient_name: self.enrollment.patient_name.to_string(),
            age: self.enrollment.age.to_string(),
            age_unit: self.age_unit.to_string(),
            gender: self.gender.map(|g| g.to_string()).unwrap_or_default(),
            contact_no: self.enrollment.contact_no.to_string(),
            scan_type: self.scan_type(),
            category: self.category.name.clone(),
            allot_date: self
                .allot_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            allot_time: self
                .allot_time
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_default(),
            estimated_minutes: self.charges.total_minutes,
            amount: currency(self.charges.gross_amount),
            total_amount: currency(self.charges.total_amount),
            rec_amount: currency(self.received_amount),
            dis_amount: currency(self.discount_amount),
            due_amount: currency(self.due_amount),
        }
    }
}

/// Rounds to whole paise/cents using banker's rounding.
pub fn currency(amount: Decimal) -> Decimal {
    amount.round_dp(CURRENCY_DECIMAL_PLACES)
}
