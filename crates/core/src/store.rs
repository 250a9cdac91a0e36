//! Patient persistence.
//!
//! Submitting a registration hands the backend's patient-creation body to a [`PatientStore`].
//! The HTTP implementation lives in `api-client`; [`FilePatientStore`] keeps registrations on
//! local disk for stand-alone deployments.
//!
//! ## Storage Layout
//!
//! ```text
//! <PATIENT_DATA_DIR>/
//!   registrations/
//!     <s1>/
//!       <s2>/
//!         <record_id>/
//!           registration.json
//! ```
//!
//! where `s1` and `s2` are the first four hex characters of the record id.

use crate::config::CoreConfig;
use crate::constants::{REGISTRATIONS_DIR_NAME, REGISTRATION_JSON_FILENAME};
use crate::error::{IntakeError, IntakeResult};
use api_shared::CreatePatientReq;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scanreg_ids::{CroNumber, RecordId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// What the store reports back after accepting a registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Confirmation {
    pub cro: String,
    pub record_id: Option<String>,
    pub message: String,
}

#[async_trait]
pub trait PatientStore: Send + Sync {
    /// Persists one registration.
    ///
    /// # Errors
    ///
    /// Any error leaves nothing half-written that a retry would trip over.
    async fn create_patient(&self, request: &CreatePatientReq) -> IntakeResult<Confirmation>;
}

/// A registration as written to disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredRegistration {
    pub record_id: RecordId,
    pub created_at: DateTime<Utc>,
    pub registration: CreatePatientReq,
}

/// [`PatientStore`] writing one JSON file per registration.
#[derive(Clone, Debug)]
pub struct FilePatientStore {
    registrations_dir: PathBuf,
}

impl FilePatientStore {
    pub fn new(cfg: &CoreConfig) -> Self {
        Self::with_data_dir(cfg.patient_data_dir())
    }

    pub fn with_data_dir(data_dir: &Path) -> Self {
        Self {
            registrations_dir: data_dir.join(REGISTRATIONS_DIR_NAME),
        }
    }

    pub fn registrations_dir(&self) -> &Path {
        &self.registrations_dir
    }

    /// Reads every stored registration, oldest first.
    ///
    /// Files that cannot be parsed are logged and skipped.
    pub fn list_registrations(&self) -> Vec<StoredRegistration> {
        let mut found = Vec::new();

        let Ok(s1_iter) = fs::read_dir(&self.registrations_dir) else {
            return found;
        };
        for s1 in s1_iter.flatten() {
            let Ok(s2_iter) = fs::read_dir(s1.path()) else {
                continue;
            };
            for s2 in s2_iter.flatten() {
                let Ok(id_iter) = fs::read_dir(s2.path()) else {
                    continue;
                };
                for id_ent in id_iter.flatten() {
                    let path = id_ent.path().join(REGISTRATION_JSON_FILENAME);
                    if !path.is_file() {
                        continue;
                    }
                    match read_registration(&path) {
                        Ok(stored) => found.push(stored),
                        Err(e) => {
                            tracing::warn!("failed to read registration {}: {}", path.display(), e)
                        }
                    }
                }
            }
        }

        found.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        found
    }

    /// Highest CRO number already on disk, used to seed the CRO sequence at startup.
    pub fn last_cro(&self) -> Option<CroNumber> {
        self.list_registrations()
            .iter()
            .filter_map(|r| r.registration.cro.parse::<CroNumber>().ok())
            .max()
    }
}

fn read_registration(path: &Path) -> IntakeResult<StoredRegistration> {
    let contents = fs::read_to_string(path).map_err(IntakeError::FileRead)?;
    serde_json::from_str(&contents).map_err(IntakeError::Deserialization)
}

#[async_trait]
impl PatientStore for FilePatientStore {
    async fn create_patient(&self, request: &CreatePatientReq) -> IntakeResult<Confirmation> {
        let record_id = RecordId::new();
        let stored = StoredRegistration {
            record_id,
            created_at: Utc::now(),
            registration: request.clone(),
        };
        let json = serde_json::to_string_pretty(&stored).map_err(IntakeError::Serialization)?;

        let record_dir = record_id.sharded_dir(&self.registrations_dir);
        tokio::fs::create_dir_all(&record_dir)
            .await
            .map_err(IntakeError::StorageDirCreation)?;

        let path = record_dir.join(REGISTRATION_JSON_FILENAME);
        if let Err(e) = tokio::fs::write(&path, json).await {
            // Remove the partial record directory.
            if let Err(cleanup) = tokio::fs::remove_dir_all(&record_dir).await {
                tracing::warn!(
                    "failed to clean up {} after write error: {}",
                    record_dir.display(),
                    cleanup
                );
            }
            return Err(IntakeError::FileWrite(e));
        }

        tracing::info!("stored registration {} as {}", request.cro, record_id);

        Ok(Confirmation {
            cro: request.cro.clone(),
            record_id: Some(record_id.to_string()),
            message: "registration stored".into(),
        })
    }
}
