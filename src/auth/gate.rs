//! Authorization gate
//!
//! Decides whether a request may reach a protected route. Credentials are
//! pulled from the request into an ordered list, then judged by a pure
//! function that knows nothing about headers or cookies.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};

use super::session::{SESSION_COOKIE_NAME, credential_matches, verify_session_token_at};
use crate::AppState;
use crate::error::AppError;
use crate::metrics::AUTH_DECISIONS_TOTAL;

/// Headers that may carry the shared secret directly
pub const PROXY_KEY_HEADERS: [&str; 2] = ["x-proxy-key", "x-proxy-token"];

/// A single proof of access offered by a request
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Raw shared secret from a proxy header, byte for byte
    ProxyKey(Vec<u8>),
    /// Session token from the `session` cookie
    SessionToken(String),
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::ProxyKey(_) => f.write_str("ProxyKey(..)"),
            Credential::SessionToken(_) => f.write_str("SessionToken(..)"),
        }
    }
}

impl Credential {
    fn kind(&self) -> &'static str {
        match self {
            Credential::ProxyKey(_) => "proxy_key",
            Credential::SessionToken(_) => "session",
        }
    }

    /// Whether this credential proves access under `secret` at `now`
    fn proves_access(&self, secret: &str, now: DateTime<Utc>) -> bool {
        match self {
            Credential::ProxyKey(candidate) => credential_matches(candidate, secret),
            Credential::SessionToken(token) => verify_session_token_at(token, secret, now),
        }
    }
}

/// Collect candidate credentials in precedence order
///
/// Proxy headers come first, then the session cookie. Proxy header values
/// are kept as raw bytes so a non-ASCII secret works the same as at login.
pub fn extract_credentials(headers: &HeaderMap) -> Vec<Credential> {
    let mut credentials: Vec<Credential> = PROXY_KEY_HEADERS
        .iter()
        .filter_map(|name| headers.get(*name))
        .map(|value| Credential::ProxyKey(value.as_bytes().to_vec()))
        .collect();

    if let Some(token) = session_token(headers) {
        credentials.push(Credential::SessionToken(token));
    }

    credentials
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    jar.get(SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty())
}

/// Decide whether any credential grants access
///
/// # Errors
/// - `AppError::Misconfigured` if no shared secret is provisioned
/// - `AppError::Unauthorized` if no credential proves access
pub fn authorize(
    credentials: &[Credential],
    secret: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let secret = secret.ok_or(AppError::Misconfigured)?;

    match credentials
        .iter()
        .find(|credential| credential.proves_access(secret, now))
    {
        Some(credential) => {
            tracing::debug!(credential = credential.kind(), "Request authorized");
            Ok(())
        }
        None => {
            tracing::debug!(offered = credentials.len(), "No credential proved access");
            Err(AppError::Unauthorized)
        }
    }
}

/// Whether the request's session cookie is currently valid
///
/// Only the cookie is consulted: this backs the status check, which reports
/// the browser's session rather than server-to-server keys.
pub fn is_authenticated(headers: &HeaderMap, secret: &str, now: DateTime<Utc>) -> bool {
    session_token(headers).is_some_and(|token| verify_session_token_at(&token, secret, now))
}

/// Middleware to require a proxy key or a valid session
///
/// # Usage
/// ```ignore
/// let protected_routes = Router::new()
///     .route("/genai", ...)
///     .route_layer(middleware::from_fn_with_state(state, require_proxy_auth));
/// ```
pub async fn require_proxy_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let credentials = extract_credentials(request.headers());
    let decision = authorize(&credentials, state.config.auth.shared_secret(), Utc::now());

    let outcome = match &decision {
        Ok(()) => "allowed",
        Err(AppError::Misconfigured) => "misconfigured",
        Err(_) => "denied",
    };
    AUTH_DECISIONS_TOTAL.with_label_values(&[outcome]).inc();

    if let Err(AppError::Misconfigured) = &decision {
        tracing::warn!(path = %request.uri().path(), "Rejected request: shared secret not configured");
    }
    decision?;

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::issue_session_token_at;
    use axum::http::HeaderValue;

    const SECRET: &str = "s3cr3t";

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn extracts_headers_before_cookie() {
        let map = headers(&[
            ("cookie", "theme=dark; session=tok"),
            ("x-proxy-token", "b"),
            ("x-proxy-key", "a"),
        ]);

        assert_eq!(
            extract_credentials(&map),
            vec![
                Credential::ProxyKey(b"a".to_vec()),
                Credential::ProxyKey(b"b".to_vec()),
                Credential::SessionToken("tok".to_string()),
            ]
        );
    }

    #[test]
    fn extracts_nothing_from_bare_request() {
        assert!(extract_credentials(&HeaderMap::new()).is_empty());
        assert!(extract_credentials(&headers(&[("cookie", "session=")])).is_empty());
    }

    #[test]
    fn missing_secret_is_misconfigured_even_with_credentials() {
        let credentials = vec![Credential::ProxyKey(SECRET.into())];
        let result = authorize(&credentials, None, Utc::now());
        assert!(matches!(result, Err(AppError::Misconfigured)));
    }

    #[test]
    fn raw_secret_header_allows_without_cookie() {
        let credentials = vec![Credential::ProxyKey(SECRET.into())];
        assert!(authorize(&credentials, Some(SECRET), Utc::now()).is_ok());
    }

    #[test]
    fn valid_cookie_allows_without_header() {
        let now = Utc::now();
        let token = issue_session_token_at(SECRET, now, 86_400).unwrap();
        let credentials = vec![Credential::SessionToken(token)];
        assert!(authorize(&credentials, Some(SECRET), now).is_ok());
    }

    #[test]
    fn wrong_header_falls_through_to_valid_cookie() {
        let now = Utc::now();
        let token = issue_session_token_at(SECRET, now, 86_400).unwrap();
        let credentials = vec![
            Credential::ProxyKey(b"wrong".to_vec()),
            Credential::SessionToken(token),
        ];
        assert!(authorize(&credentials, Some(SECRET), now).is_ok());
    }

    #[test]
    fn neither_credential_is_denied() {
        let result = authorize(&[], Some(SECRET), Utc::now());
        assert!(matches!(result, Err(AppError::Unauthorized)));

        let credentials = vec![Credential::ProxyKey(b"wrong".to_vec())];
        let result = authorize(&credentials, Some(SECRET), Utc::now());
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn session_token_is_not_accepted_as_proxy_key() {
        let now = Utc::now();
        let token = issue_session_token_at(SECRET, now, 86_400).unwrap();
        let credentials = vec![Credential::ProxyKey(token.into_bytes())];
        assert!(authorize(&credentials, Some(SECRET), now).is_err());
    }

    #[test]
    fn non_ascii_header_secret_allows() {
        let secret = "pässwort";
        let mut map = HeaderMap::new();
        map.insert(
            "x-proxy-key",
            HeaderValue::from_bytes(secret.as_bytes()).unwrap(),
        );

        let credentials = extract_credentials(&map);
        assert_eq!(credentials, vec![Credential::ProxyKey(secret.into())]);
        assert!(authorize(&credentials, Some(secret), Utc::now()).is_ok());
        assert!(authorize(&credentials, Some("passwort"), Utc::now()).is_err());
    }

    #[test]
    fn status_ignores_proxy_headers() {
        let map = headers(&[("x-proxy-key", SECRET)]);
        assert!(!is_authenticated(&map, SECRET, Utc::now()));
    }

    #[test]
    fn status_reports_valid_cookie() {
        let now = Utc::now();
        let token = issue_session_token_at(SECRET, now, 86_400).unwrap();
        let cookie = format!("session={token}");
        let map = headers(&[("cookie", cookie.as_str())]);

        assert!(is_authenticated(&map, SECRET, now));
        assert!(!is_authenticated(&map, "rotated", now));
    }

    #[test]
    fn debug_output_hides_credential_values() {
        let rendered = format!("{:?}", Credential::ProxyKey(SECRET.into()));
        assert!(!rendered.contains(SECRET));
    }
}
