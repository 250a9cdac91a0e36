use crate::draft::FieldErrors;
use crate::wizard::WizardStep;

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("required fields missing or invalid: {0}")]
    Validation(FieldErrors),
    #[error("at least one scan must be selected")]
    NoScanSelected,
    #[error("scan {0} is not in the catalog")]
    UnknownScan(crate::ScanId),
    #[error("registration can only be submitted from the payment step (current step: {0})")]
    NotAtPaymentStep(WizardStep),

    #[error("catalog error: {0}")]
    Catalog(String),
    #[error("backend request failed: {0}")]
    Backend(String),
    #[error("backend rejected request with status {status}: {message}")]
    BackendRejected { status: u16, message: String },

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to write registration file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize registration: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize registration: {0}")]
    Deserialization(serde_json::Error),
}

impl IntakeError {
    /// True for errors the user fixes by changing form input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            IntakeError::InvalidInput(_)
                | IntakeError::Validation(_)
                | IntakeError::NoScanSelected
                | IntakeError::UnknownScan(_)
                | IntakeError::NotAtPaymentStep(_)
        )
    }

    /// True for collaborator failures that leave the draft intact and may succeed on retry.
    pub fn is_collaborator(&self) -> bool {
        matches!(
            self,
            IntakeError::Backend(_)
                | IntakeError::BackendRejected { .. }
                | IntakeError::Catalog(_)
                | IntakeError::StorageDirCreation(_)
                | IntakeError::FileWrite(_)
                | IntakeError::FileRead(_)
                | IntakeError::Serialization(_)
                | IntakeError::Deserialization(_)
        )
    }
}

pub type IntakeResult<T> = std::result::Result<T, IntakeError>;
