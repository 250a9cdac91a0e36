//! Reference-data source for the enrollment and scan steps.
//!
//! The wizard reads hospitals, doctors and the scan catalog through [`Directory`]. Two sources
//! exist: the backend's list endpoints (in `api-client`) and a YAML file, [`FileDirectory`],
//! for deployments that run without a backend.
//!
//! ## Catalog file layout
//!
//! ```yaml
//! hospitals:
//!   - id: 1
//!     name: City Hospital
//! doctors:
//!   - id: 7
//!     name: Dr Rao
//!     hospital_id: 1
//! scans:
//!   - s_id: 1
//!     s_name: X-Ray Chest
//!     charges: 600
//!     estimate_time: 15
//! ```
//!
//! Scan rows are read with the same fail-closed rules as the backend's catalog endpoint.

use crate::catalog::{scan_options_from_values, Doctor, Hospital, ScanOption};
use crate::error::{IntakeError, IntakeResult};
use api_shared::DirectoryEntry;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[async_trait]
pub trait Directory: Send + Sync {
    async fn hospitals(&self) -> IntakeResult<Vec<Hospital>>;
    async fn doctors(&self) -> IntakeResult<Vec<Doctor>>;
    async fn scans(&self) -> IntakeResult<Vec<ScanOption>>;
}

/// Parsed contents of a catalog file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirectoryData {
    pub hospitals: Vec<Hospital>,
    pub doctors: Vec<Doctor>,
    pub scans: Vec<ScanOption>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DirectoryFileWire {
    #[serde(default)]
    hospitals: Vec<DirectoryEntry>,
    #[serde(default)]
    doctors: Vec<DirectoryEntry>,
    #[serde(default)]
    scans: Vec<serde_json::Value>,
}

impl DirectoryData {
    /// Parses catalog YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::Catalog`] naming the failing path (for example
    /// `hospitals[0].name`) when the hospital or doctor lists do not match the layout. Bad scan
    /// rows are not errors; they are dropped.
    pub fn parse_yaml(yaml_text: &str) -> IntakeResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
        let wire: DirectoryFileWire = serde_path_to_error::deserialize(deserializer)
            .map_err(|err| {
                let path = err.path().to_string();
                let path = if path.is_empty() || path == "." {
                    "<root>".to_owned()
                } else {
                    path
                };
                IntakeError::Catalog(format!(
                    "catalog schema mismatch at {path}: {}",
                    err.into_inner()
                ))
            })?;

        Ok(Self {
            hospitals: wire.hospitals.into_iter().map(Hospital::from).collect(),
            doctors: wire.doctors.into_iter().map(Doctor::from).collect(),
            scans: scan_options_from_values(wire.scans),
        })
    }
}

/// [`Directory`] backed by a YAML catalog file.
///
/// The file is re-read on every call so edits take effect on the next wizard mount.
#[derive(Clone, Debug)]
pub struct FileDirectory {
    path: PathBuf,
}

impl FileDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and parses the whole file.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::FileRead`] if the file cannot be read, or the errors of
    /// [`DirectoryData::parse_yaml`].
    pub async fn load(&self) -> IntakeResult<DirectoryData> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(IntakeError::FileRead)?;
        DirectoryData::parse_yaml(&text)
    }
}

#[async_trait]
impl Directory for FileDirectory {
    async fn hospitals(&self) -> IntakeResult<Vec<Hospital>> {
        Ok(self.load().await?.hospitals)
    }

    async fn doctors(&self) -> IntakeResult<Vec<Doctor>> {
        Ok(self.load().await?.doctors)
    }

    async fn scans(&self) -> IntakeResult<Vec<ScanOption>> {
        Ok(self.load().await?.scans)
    }
}
