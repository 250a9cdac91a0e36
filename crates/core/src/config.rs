//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into services, so request
//! handling never reads process-wide environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `PATIENT_DATA_DIR` | `patient_data` |
//! | `SCANREG_CATALOG_FILE` | `catalog.yaml` |
//! | `SCANREG_BACKEND_URL` | unset (file collaborators) |
//! | `SCANREG_EXEMPT_CATEGORIES` | [`DEFAULT_EXEMPT_CATEGORIES`] |
//! | `SCANREG_HTTP_TIMEOUT_SECS` | `10` |

use crate::category::CategoryTable;
use crate::constants::{
    DEFAULT_CATALOG_FILE, DEFAULT_EXEMPT_CATEGORIES, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_PATIENT_DATA_DIR,
};
use crate::error::{IntakeError, IntakeResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    patient_data_dir: PathBuf,
    catalog_file: PathBuf,
    backend_url: Option<String>,
    exempt_categories: Vec<String>,
    http_timeout: Duration,
}

impl CoreConfig {
    /// # Errors
    ///
    /// Returns [`IntakeError::InvalidInput`] if the exempt list is empty or the timeout is zero.
    pub fn new(
        patient_data_dir: PathBuf,
        catalog_file: PathBuf,
        backend_url: Option<String>,
        exempt_categories: Vec<String>,
        http_timeout: Duration,
    ) -> IntakeResult<Self> {
        if exempt_categories.is_empty() {
            return Err(IntakeError::InvalidInput(
                "exempt category list cannot be empty".into(),
            ));
        }
        if http_timeout.is_zero() {
            return Err(IntakeError::InvalidInput(
                "HTTP timeout must be greater than zero".into(),
            ));
        }

        Ok(Self {
            patient_data_dir,
            catalog_file,
            backend_url,
            exempt_categories,
            http_timeout,
        })
    }

    /// Reads the `SCANREG_*` and `PATIENT_DATA_DIR` variables.
    ///
    /// Call once from `main`, after `dotenvy` has loaded any `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::InvalidInput`] for any malformed value.
    pub fn from_env() -> IntakeResult<Self> {
        let patient_data_dir = std::env::var("PATIENT_DATA_DIR")
            .unwrap_or_else(|_| DEFAULT_PATIENT_DATA_DIR.into());
        let catalog_file =
            std::env::var("SCANREG_CATALOG_FILE").unwrap_or_else(|_| DEFAULT_CATALOG_FILE.into());

        Self::new(
            PathBuf::from(patient_data_dir),
            PathBuf::from(catalog_file),
            backend_url_from_env_value(std::env::var("SCANREG_BACKEND_URL").ok())?,
            exempt_categories_from_env_value(std::env::var("SCANREG_EXEMPT_CATEGORIES").ok())?,
            http_timeout_from_env_value(std::env::var("SCANREG_HTTP_TIMEOUT_SECS").ok())?,
        )
    }

    pub fn patient_data_dir(&self) -> &Path {
        &self.patient_data_dir
    }

    pub fn catalog_file(&self) -> &Path {
        &self.catalog_file
    }

    pub fn backend_url(&self) -> Option<&str> {
        self.backend_url.as_deref()
    }

    pub fn exempt_categories(&self) -> &[String] {
        &self.exempt_categories
    }

    pub fn http_timeout(&self) -> Duration {
        self.http_timeout
    }

    pub fn category_table(&self) -> CategoryTable {
        CategoryTable::new(self.exempt_categories.iter().cloned())
    }
}

/// Parses a comma-separated exempt-category override.
///
/// `None` or a blank value yields [`DEFAULT_EXEMPT_CATEGORIES`]. Whitespace around each comma
/// is configuration formatting and is removed; the labels themselves are then matched exactly.
///
/// # Errors
///
/// Returns [`IntakeError::InvalidInput`] if the value contains only separators.
pub fn exempt_categories_from_env_value(value: Option<String>) -> IntakeResult<Vec<String>> {
    let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
        return Ok(DEFAULT_EXEMPT_CATEGORIES
            .iter()
            .map(|s| (*s).to_owned())
            .collect());
    };

    let labels: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect();

    if labels.is_empty() {
        return Err(IntakeError::InvalidInput(
            "SCANREG_EXEMPT_CATEGORIES contains no category labels".into(),
        ));
    }
    Ok(labels)
}

/// Validates a backend base URL and strips any trailing `/`.
///
/// # Errors
///
/// Returns [`IntakeError::InvalidInput`] unless the URL starts with `http://` or `https://`.
pub fn backend_url_from_env_value(value: Option<String>) -> IntakeResult<Option<String>> {
    let Some(url) = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
    else {
        return Ok(None);
    };

    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(IntakeError::InvalidInput(format!(
            "SCANREG_BACKEND_URL must start with http:// or https://, got '{url}'"
        )));
    }
    Ok(Some(url.trim_end_matches('/').to_string()))
}

/// # Errors
///
/// Returns [`IntakeError::InvalidInput`] if the value is not a whole number of seconds.
pub fn http_timeout_from_env_value(value: Option<String>) -> IntakeResult<Duration> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let secs = match value {
        Some(v) => v.parse::<u64>().map_err(|_| {
            IntakeError::InvalidInput(format!(
                "SCANREG_HTTP_TIMEOUT_SECS must be a whole number of seconds, got '{v}'"
            ))
        })?,
        None => DEFAULT_HTTP_TIMEOUT_SECS,
    };
    Ok(Duration::from_secs(secs))
}
