//! API layer
//!
//! HTTP handlers for:
//! - Place analysis (proxied to the generative-AI provider)
//! - Metrics (Prometheus)

mod genai;
pub mod metrics;

pub use genai::genai_router;
pub use metrics::metrics_router;
