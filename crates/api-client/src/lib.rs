//! # API Client
//!
//! HTTP implementation of the core collaborator traits against the existing backend.
//!
//! | Trait | Call |
//! |---|---|
//! | [`Directory::hospitals`] | `GET {base}/hospitals` |
//! | [`Directory::doctors`] | `GET {base}/doctors` |
//! | [`Directory::scans`] | `GET {base}/scans` |
//! | [`PatientStore::create_patient`] | `POST {base}/patients` |
//!
//! List endpoints may answer with a bare JSON array or with `{"data": [...]}`.

#![warn(rust_2018_idioms)]

use api_shared::{CreatePatientReq, CreatePatientRes, DirectoryEntry};
use async_trait::async_trait;
use reqwest::Client;
use scanreg_core::{
    scan_options_from_values, Confirmation, CoreConfig, Directory, Doctor, Hospital,
    IntakeError, IntakeResult, PatientStore, ScanOption,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Longest backend error body carried into an error message.
const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Deserialize)]
#[serde(untagged)]
enum ListBody<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> ListBody<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            ListBody::Bare(items) | ListBody::Wrapped { data: items } => items,
        }
    }
}

/// Backend client implementing both [`Directory`] and [`PatientStore`].
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// # Errors
    ///
    /// Returns [`IntakeError::Backend`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> IntakeResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IntakeError::Backend(format!("failed to build HTTP client: {e}")))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    /// Builds a client when `SCANREG_BACKEND_URL` was configured.
    ///
    /// # Errors
    ///
    /// As for [`HttpBackend::new`].
    pub fn from_config(cfg: &CoreConfig) -> IntakeResult<Option<Self>> {
        cfg.backend_url()
            .map(|url| Self::new(url, cfg.http_timeout()))
            .transpose()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> IntakeResult<Vec<T>> {
        let url = self.endpoint(path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| IntakeError::Backend(format!("GET {url}: {e}")))?;
        let response = check_status(response).await?;
        let body: ListBody<T> = response
            .json()
            .await
            .map_err(|e| IntakeError::Backend(format!("GET {url}: unreadable body: {e}")))?;
        Ok(body.into_vec())
    }
}

async fn check_status(response: reqwest::Response) -> IntakeResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(IntakeError::BackendRejected {
        status: status.as_u16(),
        message: error_message(&body, status.canonical_reason()),
    })
}

fn error_message(body: &str, reason: Option<&str>) -> String {
    let body = body.trim();
    if body.is_empty() {
        return reason.unwrap_or("no response body").to_string();
    }
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

#[async_trait]
impl Directory for HttpBackend {
    async fn hospitals(&self) -> IntakeResult<Vec<Hospital>> {
        let rows: Vec<DirectoryEntry> = self.get_list("hospitals").await?;
        Ok(rows.into_iter().map(Hospital::from).collect())
    }

    async fn doctors(&self) -> IntakeResult<Vec<Doctor>> {
        let rows: Vec<DirectoryEntry> = self.get_list("doctors").await?;
        Ok(rows.into_iter().map(Doctor::from).collect())
    }

    async fn scans(&self) -> IntakeResult<Vec<ScanOption>> {
        // Rows are read one by one so a single bad row cannot fail the whole catalog.
        let rows: Vec<serde_json::Value> = self.get_list("scans").await?;
        let total = rows.len();
        let scans = scan_options_from_values(rows);
        if scans.len() < total {
            tracing::warn!(
                "{} of {} scan catalog rows from {} were dropped",
                total - scans.len(),
                total,
                self.base_url
            );
        }
        Ok(scans)
    }
}

#[async_trait]
impl PatientStore for HttpBackend {
    async fn create_patient(&self, request: &CreatePatientReq) -> IntakeResult<Confirmation> {
        let url = self.endpoint("patients");
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| IntakeError::Backend(format!("POST {url}: {e}")))?;
        let response = check_status(response).await?;

        // Some deployments answer 201 with an empty body.
        let text = response
            .text()
            .await
            .map_err(|e| IntakeError::Backend(format!("POST {url}: unreadable body: {e}")))?;
        let created: CreatePatientRes = if text.trim().is_empty() {
            CreatePatientRes::default()
        } else {
            serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!("unexpected patient-creation response from {}: {}", url, e);
                CreatePatientRes::default()
            })
        };

        tracing::info!("backend accepted registration {}", request.cro);

        Ok(Confirmation {
            cro: request.cro.clone(),
            record_id: created.id.map(|id| id.to_string()),
            message: created
                .message
                .unwrap_or_else(|| "registration created".into()),
        })
    }
}
