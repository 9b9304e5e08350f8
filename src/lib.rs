//! Modam — community and self-diagnosis backend for the Modam
//! hair-care platform
//!
//! A single Axum service over SQLite, with Cloudflare R2 for images
//! and a capped local JSON file for the diagnosis history. Layers,
//! top to bottom:
//!
//! - `api`: HTTP handlers (auth/profiles, board, diagnosis, catalog,
//!   reviews, metrics)
//! - `service`: business logic (board, counters, accounts, diagnosis,
//!   reviews)
//! - `data`: database wrapper, content codec, diagnosis ledger,
//!   built-in catalog
//! - `storage`: R2 buckets for post images and avatars
//! - `auth`: session tokens, identity binding, extractors
//! - `config` / `error` / `metrics`: the usual ambient pieces

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod service;
pub mod storage;

use std::sync::Arc;
use std::time::Duration;

/// Shared application state, cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::AppConfig>,
    pub db: Arc<data::Database>,
    pub storage: Arc<storage::MediaStorage>,
    /// Local diagnosis ledger (capped at 20 entries)
    pub ledger: Arc<data::DiagnosisLedger>,
}

impl AppState {
    /// Connect the database (running migrations), open the diagnosis
    /// ledger, and set up the R2 client.
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let db = data::Database::connect(&config.database.path).await?;
        tracing::info!("Database connected");

        let ledger = data::DiagnosisLedger::open(&config.diagnosis.ledger_path).await?;
        tracing::info!("Diagnosis ledger opened");

        let storage = storage::MediaStorage::new(&config.storage, &config.cloudflare).await?;
        tracing::info!("Image storage initialized");

        Ok(Self {
            config: Arc::new(config),
            db: Arc::new(db),
            storage: Arc::new(storage),
            ledger: Arc::new(ledger),
        })
    }

    /// Session/profile binder over this state's database
    pub fn binder(&self) -> auth::SessionBinder {
        auth::SessionBinder::new(
            self.db.clone(),
            self.config.auth.session_secret.clone(),
            Duration::from_secs(self.config.auth.session_recover_timeout),
        )
    }
}

/// Compose the full router. Shared between the binary and the e2e
/// tests so both serve exactly the same routes.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{compression::CompressionLayer, trace::TraceLayer};

    let api_routes = Router::new()
        .merge(api::auth_router())
        .merge(api::board_router())
        .merge(api::diagnosis_router())
        .merge(api::catalog_router())
        .merge(api::reviews_router());

    Router::new()
        .route("/health", axum::routing::get(|| async { "OK" }))
        .nest("/api", api_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&state.config.server))
        .with_state(state)
        .merge(api::metrics_router())
}

/// Cross-origin policy: permissive for plain-http (local) serving,
/// locked to the configured origin once the instance runs on https.
fn build_cors_layer(server: &config::ServerConfig) -> tower_http::cors::CorsLayer {
    use axum::http::HeaderValue;
    use tower_http::cors::{Any, CorsLayer};

    if !server.protocol.eq_ignore_ascii_case("https") {
        return CorsLayer::permissive();
    }

    let base_url = server.base_url();
    match HeaderValue::from_str(&base_url) {
        Ok(origin) => CorsLayer::new()
            .allow_origin([origin])
            .allow_methods(Any)
            .allow_headers(Any),
        Err(error) => {
            tracing::error!(
                %error,
                origin = %base_url,
                "Server base URL is not a valid CORS origin; cross-origin requests disabled"
            );
            CorsLayer::new().allow_methods(Any).allow_headers(Any)
        }
    }
}
