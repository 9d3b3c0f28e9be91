//! Cross-origin allow-list
//!
//! Only listed origins get `Access-Control-Allow-Origin` echoed back.
//! An origin is listed when it equals a configured origin exactly, or when
//! it is a bare `https://` origin whose host ends with a configured suffix.

use axum::http::{HeaderName, HeaderValue, Method, header::CONTENT_TYPE};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::auth::gate::PROXY_KEY_HEADERS;
use crate::config::CorsConfig;

/// Origins permitted to call the API with credentials
#[derive(Debug, Clone, Default)]
pub struct OriginAllowList {
    exact: Vec<String>,
    host_suffixes: Vec<String>,
}

impl OriginAllowList {
    pub fn from_config(config: &CorsConfig) -> Self {
        let exact = config
            .frontend_url
            .iter()
            .chain(config.allowed_origins.iter())
            .map(|origin| origin.trim().trim_end_matches('/').to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Self {
            exact,
            host_suffixes: config.allowed_origin_suffixes.clone(),
        }
    }

    /// Check an `Origin` header value
    pub fn allows(&self, origin: &str) -> bool {
        if self.exact.iter().any(|allowed| allowed == origin) {
            return true;
        }

        let Ok(url) = url::Url::parse(origin) else {
            return false;
        };
        let Some(host) = url.host_str() else {
            return false;
        };

        // Reject anything that is not exactly `https://<host>`
        if url.scheme() != "https" || origin != format!("https://{host}") {
            return false;
        }

        self.host_suffixes
            .iter()
            .any(|suffix| host.len() > suffix.len() && host.ends_with(suffix.as_str()))
    }
}

/// Build the CORS layer for all routes
///
/// Preflight `OPTIONS` requests are answered here with an empty 200.
pub fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let allow_list = OriginAllowList::from_config(config);
    tracing::debug!(?allow_list, "CORS allow-list configured");

    let mut allowed_headers = vec![CONTENT_TYPE];
    allowed_headers.extend(PROXY_KEY_HEADERS.into_iter().map(HeaderName::from_static));

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _request| {
                origin
                    .to_str()
                    .map(|origin| allow_list.allows(origin))
                    .unwrap_or(false)
            },
        ))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(allowed_headers)
}
