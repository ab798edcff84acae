//! Authentication middleware
//!
//! Protects routes that require an authenticated session.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use super::ROOT_PATH;
use super::session::Session;
use crate::AppState;

/// Middleware to require an authenticated session
///
/// Decodes the session cookie. Unauthenticated requests are redirected
/// to the root without reaching the inner handler; authenticated ones
/// continue with the `Session` in request extensions.
///
/// # Usage
/// ```ignore
/// let protected_routes = Router::new()
///     .route("/api/v0/list/*rest", ...)
///     .route_layer(middleware::from_fn_with_state(state, require_session));
/// ```
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(session) = state
        .sessions
        .from_jar(&jar)
        .filter(|session| session.authenticated)
    else {
        tracing::debug!(path = %request.uri().path(), "Redirecting unauthenticated request");
        return Redirect::temporary(ROOT_PATH).into_response();
    };

    request.extensions_mut().insert(session);
    next.run(request).await
}

/// Extractor for the current authenticated session
///
/// Only valid behind [`require_session`]; anywhere else it redirects
/// to the root.
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentSession(session): CurrentSession,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", session.principal_name)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(CurrentSession)
            .ok_or_else(|| Redirect::temporary(ROOT_PATH))
    }
}
