//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{Gauge, Histogram, HistogramOpts, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("publicness_http_requests_total", "Total number of HTTP requests"),
        &["method", "status"]
    ).expect("metric can be created");

    // Auth Metrics
    pub static ref AUTH_DECISIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("publicness_auth_decisions_total", "Gate decisions on protected routes"),
        &["outcome"]
    ).expect("metric can be created");
    pub static ref LOGINS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("publicness_logins_total", "Password login attempts"),
        &["outcome"]
    ).expect("metric can be created");

    // GenAI Metrics
    pub static ref GENAI_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("publicness_genai_requests_total", "Total number of analysis requests sent upstream"),
        &["status"]
    ).expect("metric can be created");
    pub static ref GENAI_REQUEST_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "publicness_genai_request_duration_seconds",
            "Upstream analysis duration in seconds"
        ).buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0])
    ).expect("metric can be created");

    // Application Metrics
    pub static ref APP_UPTIME_SECONDS: Gauge = Gauge::new(
        "publicness_app_uptime_seconds",
        "Application uptime in seconds"
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("publicness_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("HTTP_REQUESTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(AUTH_DECISIONS_TOTAL.clone()))
        .expect("AUTH_DECISIONS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(LOGINS_TOTAL.clone()))
        .expect("LOGINS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(GENAI_REQUESTS_TOTAL.clone()))
        .expect("GENAI_REQUESTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(GENAI_REQUEST_DURATION_SECONDS.clone()))
        .expect("GENAI_REQUEST_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(APP_UPTIME_SECONDS.clone()))
        .expect("APP_UPTIME_SECONDS can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}
