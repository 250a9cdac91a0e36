//! Request and response bodies of the registration REST service.
//!
//! Amounts are accepted as JSON numbers or numeric strings and always returned as numbers
//! rounded to two decimal places.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
    /// Per-field messages when the error is a failed enrollment check.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub field_errors: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryRes {
    pub name: String,
    pub is_fee_exempt: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ListCategoriesRes {
    pub categories: Vec<CategoryRes>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ScanOptionRes {
    pub id: u64,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub charge: Decimal,
    pub estimated_minutes: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ListScansRes {
    pub scans: Vec<ScanOptionRes>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct QuoteReq {
    #[serde(default)]
    pub scan_ids: Vec<u64>,
    pub category: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct QuoteRes {
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub gross_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total_amount: Decimal,
    pub total_minutes: u32,
    pub is_fee_exempt: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DueReq {
    #[schema(value_type = f64)]
    pub total_amount: Decimal,
    #[serde(default)]
    #[schema(value_type = f64)]
    pub received_amount: Decimal,
    #[serde(default)]
    #[schema(value_type = f64)]
    pub discount_amount: Decimal,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DueRes {
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub due_amount: Decimal,
    /// True when nothing is left to pay and the receipt may be printed.
    pub settled: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct EnrollmentReq {
    #[serde(default)]
    pub hospital_id: Option<String>,
    #[serde(default)]
    pub doctor_id: Option<String>,
    #[serde(default)]
    pub patient_name: String,
    #[serde(default)]
    pub age: String,
    /// `Years`, `Months` or `Days`; defaults to `Years`.
    #[serde(default)]
    pub age_unit: Option<String>,
    /// `Male`, `Female` or `Other`.
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub contact_no: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ScansReq {
    #[serde(default)]
    pub scan_ids: Vec<u64>,
    /// Leaves the draft's category unchanged when absent.
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct PaymentReq {
    #[serde(default)]
    #[schema(value_type = Option<f64>)]
    pub received_amount: Option<Decimal>,
    #[serde(default)]
    #[schema(value_type = Option<f64>)]
    pub discount_amount: Option<Decimal>,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub allot_date: Option<String>,
    /// `HH:MM`
    #[serde(default)]
    pub allot_time: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct GotoReq {
    /// `enrollment`, `scan_options` or `payment`
    pub step: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DraftView {
    pub hospital_id: Option<String>,
    pub doctor_id: Option<String>,
    pub patient_name: String,
    pub age: String,
    pub age_unit: String,
    pub gender: Option<String>,
    pub contact_no: String,
    pub category: String,
    pub is_fee_exempt: bool,
    pub selected_scan_ids: Vec<u64>,
    pub allot_date: Option<String>,
    pub allot_time: Option<String>,
    /// `allot_time` plus the selected scans' minutes.
    pub estimated_end_time: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub gross_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total_amount: Decimal,
    pub total_minutes: u32,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub received_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub discount_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub due_amount: Decimal,
    pub settled: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionRes {
    pub session_id: String,
    pub step: String,
    pub draft: DraftView,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub field_errors: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitRes {
    pub cro: String,
    pub record_id: Option<String>,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RegistrationSummary {
    pub record_id: String,
    pub cro: String,
    pub patient_name: String,
    pub category: String,
    pub scan_type: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub due_amount: Decimal,
    pub created_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ListRegistrationsRes {
    pub registrations: Vec<RegistrationSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_req_accepts_numbers_and_strings() {
        let req: DueReq = serde_json::from_str(
            r#"{"total_amount": 1500, "received_amount": "500", "discount_amount": 200.5}"#,
        )
        .expect("mixed amount encodings");
        assert_eq!(req.total_amount, Decimal::from(1500));
        assert_eq!(req.received_amount, Decimal::from(500));
        assert_eq!(req.discount_amount, Decimal::new(2005, 1));
    }

    #[test]
    fn due_req_defaults_missing_amounts_to_zero() {
        let req: DueReq = serde_json::from_str(r#"{"total_amount": 600}"#).expect("defaults");
        assert!(req.received_amount.is_zero());
        assert!(req.discount_amount.is_zero());
    }

    #[test]
    fn error_res_omits_empty_field_map() {
        let res = ErrorRes {
            error: "at least one scan must be selected".into(),
            field_errors: BTreeMap::new(),
        };
        let json = serde_json::to_value(&res).expect("serialise");
        assert!(json.get("field_errors").is_none());
    }
}
