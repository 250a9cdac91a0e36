//! # API Shared
//!
//! Wire types shared by the intake crates.
//!
//! Contains:
//! - `wire`: the existing backend's JSON contracts (scan catalog, directory lists, patient
//!   creation). Field names here must not change; the backend matches on them.
//! - `rest`: request/response bodies of the registration REST service.
//! - `HealthService`
//!
//! Used by `scanreg-core`, `api-client` and `api-rest`.

pub mod health;
pub mod rest;
pub mod wire;

pub use health::HealthService;
pub use rest::*;
pub use wire::*;
