use crate::rest::HealthRes;

/// Health check for the REST service.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Returns a `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "scanreg is alive".into(),
        }
    }
}
