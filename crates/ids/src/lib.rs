//! Identifiers issued by the registration desk.
//!
//! Two kinds of identifier exist:
//!
//! - [`RecordId`]: an opaque UUID naming a stored registration or an open wizard session. Its
//!   canonical text form is **32 lowercase hexadecimal characters** (no hyphens), and stored
//!   registrations are sharded on disk by its first four characters:
//!   `parent_dir/<id[0..2]>/<id[2..4]>/<id>/`.
//! - [`CroNumber`]: the human-facing visit reference printed on receipts,
//!   `CRO-YYYYMMDD-NNNN`, where `NNNN` counts registrations within one calendar day.
//!
//! Externally supplied identifiers must already be canonical; nothing is normalised.

mod cro;
mod record_id;

pub use cro::{CroNumber, CroSequence};
pub use record_id::{RecordId, Uuid};

/// Error type for identifier parsing.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type IdResult<T> = Result<T, IdError>;
