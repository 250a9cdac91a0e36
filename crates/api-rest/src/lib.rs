//! # API REST
//!
//! REST API for diagnostic-centre registration.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - Wizard sessions held in memory, one lock per session
//!
//! Uses `api-shared` for request and response bodies and `scanreg-core` for everything else.

#![warn(rust_2018_idioms)]

mod error;
pub mod pricing;
pub mod registrations;
mod views;

pub use error::{ApiError, ApiResult};

use api_shared::{HealthRes, HealthService};
use axum::{
    extract::State,
    response::Json,
    routing::{get, post, put},
    Router,
};
use scanreg_core::{
    CategoryTable, CoreConfig, Directory, FilePatientStore, PatientStore, RegistrationWizard,
};
use scanreg_ids::{CroSequence, RecordId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Sessions untouched for this long are dropped when the next session is opened.
pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// One open wizard and when a request last used it.
pub(crate) struct Session {
    pub(crate) wizard: RegistrationWizard,
    touched: Instant,
}

impl Session {
    fn new(wizard: RegistrationWizard) -> Self {
        Self {
            wizard,
            touched: Instant::now(),
        }
    }

    pub(crate) fn touch(&mut self) {
        self.touched = Instant::now();
    }

    pub(crate) fn is_idle(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.touched) >= timeout
    }
}

type Sessions = Arc<RwLock<HashMap<RecordId, Arc<Mutex<Session>>>>>;

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    categories: Arc<CategoryTable>,
    directory: Arc<dyn Directory>,
    store: Arc<dyn PatientStore>,
    file_store: Option<FilePatientStore>,
    cro_sequence: Arc<CroSequence>,
    sessions: Sessions,
    session_idle_timeout: Duration,
}

impl AppState {
    pub fn new(
        cfg: &CoreConfig,
        directory: Arc<dyn Directory>,
        store: Arc<dyn PatientStore>,
        cro_sequence: Arc<CroSequence>,
    ) -> Self {
        let categories = Arc::new(cfg.category_table());
        Self {
            categories,
            directory,
            store,
            file_store: None,
            cro_sequence,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            session_idle_timeout: DEFAULT_SESSION_IDLE_TIMEOUT,
        }
    }

    /// Enables `GET /patients` over the given store's directory.
    pub fn with_file_store(mut self, file_store: FilePatientStore) -> Self {
        self.file_store = Some(file_store);
        self
    }

    pub fn with_session_idle_timeout(mut self, timeout: Duration) -> Self {
        self.session_idle_timeout = timeout;
        self
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        pricing::list_categories,
        pricing::list_scans,
        pricing::quote,
        pricing::due,
        registrations::open_registration,
        registrations::get_registration,
        registrations::set_enrollment,
        registrations::set_scans,
        registrations::set_payment,
        registrations::next_step,
        registrations::back_step,
        registrations::goto_step,
        registrations::submit_registration,
        registrations::close_registration,
        registrations::list_registrations,
    ),
    components(schemas(
        api_shared::HealthRes,
        api_shared::ErrorRes,
        api_shared::CategoryRes,
        api_shared::ListCategoriesRes,
        api_shared::ScanOptionRes,
        api_shared::ListScansRes,
        api_shared::QuoteReq,
        api_shared::QuoteRes,
        api_shared::DueReq,
        api_shared::DueRes,
        api_shared::EnrollmentReq,
        api_shared::ScansReq,
        api_shared::PaymentReq,
        api_shared::GotoReq,
        api_shared::DraftView,
        api_shared::SessionRes,
        api_shared::SubmitRes,
        api_shared::RegistrationSummary,
        api_shared::ListRegistrationsRes,
    ))
)]
pub struct ApiDoc;

/// Builds the full REST router, including `/swagger-ui` and `/api-docs/openapi.json`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/categories", get(pricing::list_categories))
        .route("/catalog/scans", get(pricing::list_scans))
        .route("/pricing/quote", post(pricing::quote))
        .route("/pricing/due", post(pricing::due))
        .route("/registrations", post(registrations::open_registration))
        .route(
            "/registrations/:id",
            get(registrations::get_registration).delete(registrations::close_registration),
        )
        .route(
            "/registrations/:id/enrollment",
            put(registrations::set_enrollment),
        )
        .route("/registrations/:id/scans", put(registrations::set_scans))
        .route("/registrations/:id/payment", put(registrations::set_payment))
        .route("/registrations/:id/next", post(registrations::next_step))
        .route("/registrations/:id/back", post(registrations::back_step))
        .route("/registrations/:id/goto", post(registrations::goto_step))
        .route(
            "/registrations/:id/submit",
            post(registrations::submit_registration),
        )
        .route("/patients", get(registrations::list_registrations))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
pub async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}
