//! Place analysis endpoint
//!
//! - POST /genai

use axum::{Json, Router, body::Bytes, extract::State, middleware, routing::post};
use serde::Deserialize;
use serde_json::Value;

use crate::AppState;
use crate::auth::require_proxy_auth;
use crate::error::AppError;
use crate::genai::AnalysisResult;

/// Create analysis router
///
/// Routes:
/// - POST /genai
///
/// The gate only wraps the POST handler, so other methods get 405
/// before credentials are looked at.
pub fn genai_router(state: AppState) -> Router<AppState> {
    Router::new().route(
        "/genai",
        post(analyze)
            .route_layer(middleware::from_fn_with_state(state, require_proxy_auth))
            .fallback(|| async { AppError::MethodNotAllowed { allow: "POST" } }),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest {
    #[serde(default)]
    place_name: Value,
}

/// Place name from a raw body; must be a non-blank JSON string
fn place_name_from_body(body: &[u8]) -> Result<String, AppError> {
    serde_json::from_slice::<AnalyzeRequest>(body)
        .ok()
        .and_then(|request| match request.place_name {
            Value::String(name) if !name.trim().is_empty() => Some(name.trim().to_string()),
            _ => None,
        })
        .ok_or_else(|| {
            AppError::Validation("Missing or invalid `placeName` in request body".to_string())
        })
}

/// POST /genai
///
/// Body: `{"placeName": "..."}`. Returns the analysis report.
async fn analyze(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AnalysisResult>, AppError> {
    let place_name = place_name_from_body(&body)?;
    let report = state.genai.analyze_place(&place_name).await?;
    Ok(Json(report))
}
