//! # Scanreg Core
//!
//! Business logic for diagnostic-centre patient registration.
//!
//! This crate contains:
//! - Fee categories and the exempt-category lookup
//! - Scan catalog conversion and pricing (`compute_charges`, `compute_due`)
//! - The three-step registration wizard and its draft
//! - Collaborator traits for reference data and patient persistence, with file-backed
//!   implementations under `PATIENT_DATA_DIR`
//!
//! HTTP servers and clients belong in `api-rest` and `api-client`. Core does build the
//! backend's patient-creation body and reads its catalog rows, using the wire types from
//! `api-shared`.

pub mod catalog;
pub mod category;
pub mod config;
pub mod constants;
pub mod directory;
pub mod draft;
pub mod error;
pub mod pricing;
pub mod record;
pub mod store;
pub mod validation;
pub mod wizard;

pub use catalog::{scan_options_from_values, Doctor, Hospital, ScanId, ScanOption};
pub use category::{Category, CategoryTable};
pub use config::CoreConfig;
pub use directory::{Directory, DirectoryData, FileDirectory};
pub use draft::{AgeUnit, EnrollmentDetails, Field, FieldErrors, Gender, RegistrationDraft};
pub use error::{IntakeError, IntakeResult};
pub use pricing::{check_amount, compute_charges, compute_due, is_settled, Charges};
pub use record::{currency, PatientRecord};
pub use store::{Confirmation, FilePatientStore, PatientStore, StoredRegistration};
pub use validation::{validate_enrollment, Enrollment};
pub use wizard::{RegistrationWizard, WizardStep};
