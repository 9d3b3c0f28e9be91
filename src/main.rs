//! Publicness server
//!
//! Loads configuration first so the log level and format come from the same
//! layered sources as everything else, then serves until Ctrl+C.

use publicness::{
    AppState,
    config::{AppConfig, LoggingConfig},
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging);
    publicness::metrics::init_metrics();

    config.warn_missing_keys();

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = publicness::build_router(AppState::new(config)?);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, version = env!("CARGO_PKG_VERSION"), "publicness ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("publicness shut down");
    Ok(())
}

/// Install the global subscriber
///
/// `RUST_LOG` wins over `logging.level`; `logging.format = "json"` switches
/// to one JSON object per line.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(logging)));
    let registry = tracing_subscriber::registry().with(filter);

    match logging.format.as_str() {
        "json" => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        _ => registry.with(tracing_subscriber::fmt::layer().compact()).init(),
    }
}

fn default_directives(logging: &LoggingConfig) -> String {
    format!("publicness={level},tower_http={level}", level = logging.level)
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "ctrl-c handler failed");
    }
}
