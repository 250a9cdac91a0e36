use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_client::HttpBackend;
use api_rest::AppState;
use scanreg_core::{CoreConfig, Directory, FileDirectory, FilePatientStore, PatientStore};
use scanreg_ids::CroSequence;

/// Main entry point for the registration service
///
/// Serves the REST API (with Swagger UI) on `SCANREG_REST_ADDR`.
///
/// Collaborators are chosen from configuration: with `SCANREG_BACKEND_URL` set, reference data
/// and patient creation go to the backend; otherwise the YAML catalog file and the sharded
/// file store under `PATIENT_DATA_DIR` are used.
///
/// # Environment Variables
/// - `SCANREG_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `SCANREG_BACKEND_URL`: backend base URL (optional)
/// - `SCANREG_CATALOG_FILE`: catalog file (default: "catalog.yaml")
/// - `PATIENT_DATA_DIR`: file store root (default: "patient_data")
/// - `SCANREG_EXEMPT_CATEGORIES`: comma-separated fee-exempt categories
/// - `SCANREG_HTTP_TIMEOUT_SECS`: backend timeout (default: 10)
/// - `SCANREG_SESSION_IDLE_SECS`: idle time before a wizard session is dropped (default: 1800)
///
/// # Errors
/// Returns an error if configuration is invalid, the address cannot be bound, or the server
/// fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("scanreg=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("SCANREG_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let cfg = Arc::new(CoreConfig::from_env()?);

    let file_store = FilePatientStore::new(&cfg);
    // Continue the day's CRO count across restarts.
    let cro_sequence = Arc::new(CroSequence::new(file_store.last_cro()));

    let state = match HttpBackend::from_config(&cfg)? {
        Some(backend) => {
            tracing::info!("++ Using backend at {}", backend.base_url());
            let backend = Arc::new(backend);
            let directory: Arc<dyn Directory> = backend.clone();
            let store: Arc<dyn PatientStore> = backend;
            AppState::new(&cfg, directory, store, cro_sequence)
        }
        None => {
            tracing::info!(
                "++ Using catalog {} and file store {}",
                cfg.catalog_file().display(),
                file_store.registrations_dir().display()
            );
            let directory: Arc<dyn Directory> = Arc::new(FileDirectory::new(cfg.catalog_file()));
            let store: Arc<dyn PatientStore> = Arc::new(file_store.clone());
            AppState::new(&cfg, directory, store, cro_sequence).with_file_store(file_store)
        }
    };

    let state = match std::env::var("SCANREG_SESSION_IDLE_SECS") {
        Ok(secs) => state.with_session_idle_timeout(Duration::from_secs(secs.trim().parse()?)),
        Err(_) => state,
    };

    tracing::info!("++ Starting scanreg REST on {}", rest_addr);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, api_rest::router(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
