//! Conversions from core values to response bodies.

use crate::error::field_error_map;
use api_shared::{DraftView, RegistrationSummary, ScanOptionRes, SessionRes};
use scanreg_core::{currency, RegistrationDraft, RegistrationWizard, ScanOption, StoredRegistration};
use scanreg_ids::RecordId;

pub(crate) fn scan_option_res(scan: &ScanOption) -> ScanOptionRes {
    ScanOptionRes {
        id: scan.id.0,
        name: scan.name.clone(),
        charge: currency(scan.charge),
        estimated_minutes: scan.estimated_minutes,
    }
}

pub(crate) fn draft_view(draft: &RegistrationDraft) -> DraftView {
    DraftView {
        hospital_id: draft.hospital_id().map(str::to_owned),
        doctor_id: draft.doctor_id().map(str::to_owned),
        patient_name: draft.patient_name().to_owned(),
        age: draft.age().to_owned(),
        age_unit: draft.age_unit().to_string(),
        gender: draft.gender().map(|g| g.to_string()),
        contact_no: draft.contact_no().to_owned(),
        category: draft.category().name.clone(),
        is_fee_exempt: draft.category().is_fee_exempt,
        selected_scan_ids: draft.selected_scan_ids().iter().map(|id| id.0).collect(),
        allot_date: draft.allot_date().map(|d| d.format("%Y-%m-%d").to_string()),
        allot_time: draft.allot_time().map(|t| t.format("%H:%M").to_string()),
        estimated_end_time: draft
            .estimated_end_time()
            .map(|t| t.format("%H:%M").to_string()),
        gross_amount: currency(draft.gross_amount()),
        total_amount: currency(draft.total_amount()),
        total_minutes: draft.total_minutes(),
        received_amount: currency(draft.received_amount()),
        discount_amount: currency(draft.discount_amount()),
        due_amount: currency(draft.due_amount()),
        settled: draft.is_settled(),
    }
}

pub(crate) fn session_res(session_id: RecordId, wizard: &RegistrationWizard) -> SessionRes {
    SessionRes {
        session_id: session_id.to_string(),
        step: wizard.step().to_string(),
        draft: draft_view(wizard.draft()),
        field_errors: field_error_map(wizard.field_errors()),
    }
}

pub(crate) fn registration_summary(stored: &StoredRegistration) -> RegistrationSummary {
    let reg = &stored.registration;
    RegistrationSummary {
        record_id: stored.record_id.to_string(),
        cro: reg.cro.clone(),
        patient_name: reg.patient_name.clone(),
        category: reg.category.clone(),
        scan_type: reg.scan_type.clone(),
        total_amount: reg.total_amount,
        due_amount: reg.due_amount,
        created_at: stored.created_at.to_rfc3339(),
    }
}
