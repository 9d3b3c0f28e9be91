//! Password login and session status
//!
//! There is no logout route: clearing the cookie is up to the client.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::gate::is_authenticated;
use super::session::{credential_matches, issue_session_token_at, session_cookie};
use crate::AppState;
use crate::error::AppError;
use crate::metrics::LOGINS_TOTAL;

/// Create authentication router
///
/// Routes:
/// - POST /login - Exchange the password for a session cookie
/// - GET /auth-status - Report whether the session cookie is valid
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            post(login).fallback(|| async { AppError::MethodNotAllowed { allow: "POST" } }),
        )
        .route(
            "/auth-status",
            get(auth_status).fallback(|| async { AppError::MethodNotAllowed { allow: "GET" } }),
        )
}

/// Login request body
#[derive(Debug, Default, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    password: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    ok: bool,
}

#[derive(Debug, Serialize)]
struct AuthStatusResponse {
    authenticated: bool,
}

/// POST /login
///
/// # Steps
/// 1. Fail with 500 if the shared secret is missing
/// 2. Compare password with the shared secret
/// 3. Issue session token and set cookie
///
/// A body that is not a JSON object with a string `password` is treated
/// the same as a wrong password.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let secret = state
        .config
        .auth
        .shared_secret()
        .ok_or(AppError::Misconfigured)?;

    let request: LoginRequest = serde_json::from_slice(&body).unwrap_or_default();
    let password = request.password.unwrap_or_default();

    if !credential_matches(password.as_bytes(), secret) {
        LOGINS_TOTAL.with_label_values(&["rejected"]).inc();
        tracing::info!("Login rejected");
        return Err(AppError::Unauthorized);
    }

    let max_age = state.config.auth.session_max_age;
    let token = issue_session_token_at(secret, Utc::now(), max_age)?;

    LOGINS_TOTAL.with_label_values(&["accepted"]).inc();
    tracing::info!(max_age, "Session issued");

    Ok((
        jar.add(session_cookie(token, max_age)),
        Json(LoginResponse { ok: true }),
    ))
}

/// GET /auth-status
///
/// Always 200 when configured; a missing or bad cookie is `false`.
async fn auth_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AuthStatusResponse>, AppError> {
    let secret = state
        .config
        .auth
        .shared_secret()
        .ok_or(AppError::Misconfigured)?;

    Ok(Json(AuthStatusResponse {
        authenticated: is_authenticated(&headers, secret, Utc::now()),
    }))
}
