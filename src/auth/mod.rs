//! GitHub OAuth authentication
//!
//! Handles:
//! - GitHub OAuth flow
//! - Session management
//! - Authentication middleware

pub mod flow;
mod middleware;
pub mod oauth;
pub mod session;

pub use flow::{AuthState, LoginFlow, LoginRedirect};
pub use middleware::{CurrentSession, require_session};
pub use oauth::auth_router;
pub use session::{SESSION_COOKIE_NAME, Session, SessionCodec};

/// Where failed logins, logouts and unauthenticated requests land
pub const ROOT_PATH: &str = "/";

/// Where a successful login lands
pub const PROTECTED_HOME_PATH: &str = "/static/";
