//! Constants used throughout the intake core crate.
//!
//! The exempt-category list lives here and nowhere else. Every screen, endpoint and command
//! that needs to know whether a category waives charges goes through
//! [`CategoryTable`](crate::CategoryTable), which is built from this list unless configuration
//! overrides it.

/// Category labels for which scan charges are waived.
///
/// Matching is exact and case-sensitive. The system owner has not yet confirmed this list;
/// deployments that need a different set override it with `SCANREG_EXEMPT_CATEGORIES`.
pub const DEFAULT_EXEMPT_CATEGORIES: &[&str] = &[
    "IPD FREE",
    "OPD FREE",
    "RTA",
    "RGHS",
    "Chiranjeevi",
    "Sn. CITIZEN",
    "BHAMASHAH",
    "Destitute",
];

/// Category labels offered by the registration form, in display order.
pub const KNOWN_CATEGORIES: &[&str] = &[
    "GEN / Paid",
    "IPD FREE",
    "OPD FREE",
    "RTA",
    "RGHS",
    "Chiranjeevi",
    "Sn. CITIZEN",
    "BHAMASHAH",
    "Destitute",
];

/// Category a fresh draft starts with.
pub const DEFAULT_CATEGORY: &str = "GEN / Paid";

/// Default directory for stored registrations when no explicit directory is configured.
pub const DEFAULT_PATIENT_DATA_DIR: &str = "patient_data";

/// Directory name under the data directory that holds registration records.
pub const REGISTRATIONS_DIR_NAME: &str = "registrations";

/// Filename of a stored registration record.
pub const REGISTRATION_JSON_FILENAME: &str = "registration.json";

/// Default YAML directory file (hospitals, doctors, scans) used without a backend.
pub const DEFAULT_CATALOG_FILE: &str = "catalog.yaml";

/// Default timeout for backend requests, in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Decimal places kept for currency amounts on the wire.
pub const CURRENCY_DECIMAL_PLACES: u32 = 2;

/// Largest charge, payment or discount accepted, in whole currency units.
pub const MAX_AMOUNT_UNITS: i64 = 1_000_000_000_000;
