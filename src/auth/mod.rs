//! Shared-secret authentication
//!
//! Handles:
//! - Password login issuing signed session cookies
//! - Session status checks
//! - The authorization gate in front of proxied operations

pub mod gate;
mod handlers;
pub mod session;

pub use gate::{Credential, authorize, extract_credentials, require_proxy_auth};
pub use handlers::auth_router;
pub use session::{issue_session_token, verify_session_token};
