//! Modam binary entry point

use modam::{AppState, config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "modam=info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    // The logging config is not loaded yet at this point; read the
    // format straight from the environment so startup itself is logged
    // in the requested shape.
    let format =
        std::env::var("MODAM__LOGGING__FORMAT").unwrap_or_else(|_| "pretty".to_string());
    if format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    modam::metrics::init_metrics();

    let config = config::AppConfig::load()?;
    tracing::info!(
        domain = %config.server.domain,
        protocol = %config.server.protocol,
        "Configuration loaded"
    );

    let state = AppState::new(config.clone()).await?;
    let app = modam::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, public_url = %config.server.base_url(), "Modam listening");

    axum::serve(listener, app).await?;

    Ok(())
}
