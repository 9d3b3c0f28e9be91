//! Common test utilities for E2E tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};

use axum::{Json, Router, extract::State, http::HeaderMap, http::StatusCode, routing::post};
use publicness::{AppState, config};
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub const TEST_SECRET: &str = "s3cr3t";
pub const TEST_API_KEY: &str = "test-api-key";
pub const TEST_FRONTEND: &str = "https://app.example.com";

static METRICS: Once = Once::new();

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub client: reqwest::Client,
    pub upstream: StubGemini,
}

impl TestServer {
    /// Create a new test server with the shared secret `s3cr3t`
    pub async fn new() -> Self {
        Self::with_secret(Some(TEST_SECRET)).await
    }

    /// Create a test server with an arbitrary (or missing) shared secret
    pub async fn with_secret(secret: Option<&str>) -> Self {
        Self::with_options(secret, Some(TEST_API_KEY)).await
    }

    /// Create a test server whose provider API key is not configured
    pub async fn without_api_key() -> Self {
        Self::with_options(Some(TEST_SECRET), None).await
    }

    /// Create a test server with explicit shared secret and API key
    pub async fn with_options(secret: Option<&str>, api_key: Option<&str>) -> Self {
        // The registry is process-wide and rejects duplicate registration
        METRICS.call_once(publicness::metrics::init_metrics);

        let upstream = StubGemini::start().await;

        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
            },
            auth: config::AuthConfig {
                proxy_key: secret.map(ToString::to_string),
                session_max_age: 86_400,
            },
            cors: config::CorsConfig {
                frontend_url: Some(TEST_FRONTEND.to_string()),
                allowed_origins: Vec::new(),
                allowed_origin_suffixes: vec![".github.io".to_string()],
            },
            genai: config::GenAiConfig {
                api_key: api_key.map(ToString::to_string),
                model: "gemini-test".to_string(),
                base_url: upstream.base_url.clone(),
                timeout_seconds: 10,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "compact".to_string(),
            },
        };

        // Initialize app state
        let state = AppState::new(config).unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = publicness::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: addr_str,
            state,
            client,
            upstream,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// POST /api/login with the given password
    pub async fn login(&self, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/login"))
            .json(&json!({ "password": password }))
            .send()
            .await
            .unwrap()
    }
}

/// Extract the session token from a login response
pub fn session_token(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .find_map(|value| {
            let raw = value.to_str().ok()?;
            let cookie_pair = raw.split(';').next()?;
            let (name, value) = cookie_pair.split_once('=')?;
            (name == "session").then(|| value.to_string())
        })
}

/// Minimal stand-in for the Gemini `generateContent` API
#[derive(Clone)]
pub struct StubGemini {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl StubGemini {
    async fn start() -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));

        let app = Router::new()
            .route("/v1beta/models/:action", post(generate_content))
            .with_state(requests.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            requests,
        }
    }

    /// Request bodies received so far
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

/// Answers with a report for the requested place
///
/// A place named "upstream-error" triggers a provider error.
async fn generate_content(
    State(requests): State<Arc<Mutex<Vec<Value>>>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    requests.lock().unwrap().push(body.clone());

    if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some(TEST_API_KEY) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": { "code": 400, "message": "API key not valid" } })),
        );
    }

    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default();
    if prompt.contains("\"upstream-error\"") {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": { "code": 503, "message": "The model is overloaded" } })),
        );
    }

    let report = json!({
        "placeName": "Tempelhofer Feld",
        "platforms": [
            {
                "platform": "Google Maps",
                "narrativeSummary": "Reviews praise the open space.",
                "tone": "Practical",
                "keyKeywords": ["space", "wind"],
                "publicNature": "Open"
            },
            {
                "platform": "Airbnb",
                "narrativeSummary": "Listings sell proximity to the park.",
                "tone": "Aspirational",
                "keyKeywords": ["lifestyle"],
                "publicNature": "Controlled"
            }
        ],
        "overlaps": ["openness"],
        "tensions": ["development pressure"],
        "publics": { "foregrounded": ["cyclists"], "marginalized": ["elderly"] },
        "conclusion": { "type": "Agonistic", "assessment": "Contested but vibrant." }
    });

    (
        StatusCode::OK,
        Json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": report.to_string() }] },
                "groundingMetadata": {
                    "groundingChunks": [
                        { "web": { "title": "berlin.de", "uri": "https://www.berlin.de/tempelhofer-feld" } }
                    ]
                }
            }]
        })),
    )
}
