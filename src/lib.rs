//! Publicness - password-gated proxy for place-narrative analysis
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - POST /api/login, GET /api/auth-status                    │
//! │  - POST /api/genai (gated)                                  │
//! │  - GET /metrics (gated), GET /health                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Auth Layer                              │
//! │  - HMAC-signed session tokens (stateless)                   │
//! │  - Gate: proxy-key header or session cookie                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   GenAI Collaborator                         │
//! │  - Gemini generateContent with structured output            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers for analysis and metrics
//! - `auth`: Session tokens, login and the authorization gate
//! - `cors`: Cross-origin allow-list
//! - `genai`: Generative-AI client and report types
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod auth;
pub mod config;
pub mod cors;
pub mod error;
pub mod genai;
pub mod metrics;

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};

/// Maximum accepted request body (login and analysis bodies are tiny)
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Application state shared across all handlers
///
/// Holds read-only configuration and clients; nothing here is mutated
/// after startup.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Generative-AI client
    pub genai: Arc<genai::GeminiClient>,

    /// Process start, for the uptime gauge
    pub started_at: Instant,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let http_client = reqwest::Client::builder()
            .user_agent(concat!("Publicness/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(config.genai.timeout_seconds))
            .build()
            .map_err(|e| error::AppError::Internal(e.into()))?;

        let genai = genai::GeminiClient::new(Arc::new(http_client), &config.genai);

        tracing::info!(
            model = %config.genai.model,
            secret_configured = config.auth.shared_secret().is_some(),
            "Application state initialized successfully"
        );

        Ok(Self {
            config: Arc::new(config),
            genai: Arc::new(genai),
            started_at: Instant::now(),
        })
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{
        compression::CompressionLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
    };

    let cors_layer = cors::build_cors_layer(&state.config.cors);

    let api_routes = auth::auth_router().merge(api::genai_router(state.clone()));

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/api", api_routes)
        .merge(api::metrics_router(state.clone()))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(axum::middleware::from_fn(track_requests))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Count responses by method and status
async fn track_requests(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let response = next.run(request).await;

    metrics::HTTP_REQUESTS_TOTAL
        .with_label_values(&[method.as_str(), response.status().as_str()])
        .inc();

    response
}

async fn health_check() -> &'static str {
    "OK"
}
