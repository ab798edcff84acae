//! GitHub OAuth flow
//!
//! Implements the OAuth 2.0 authorization code flow with GitHub.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};

use super::flow::{AuthState, LoginFlow};
use super::{PROTECTED_HOME_PATH, ROOT_PATH};
use crate::AppState;
use crate::error::LoginError;
use crate::metrics::LOGIN_ATTEMPTS_TOTAL;

pub const LOGIN_PATH: &str = "/api/v0/login/";
pub const CALLBACK_PATH: &str = "/api/v0/github_oauth_cb/";
pub const LOGOUT_PATH: &str = "/api/v0/logout/";
pub const AUTH_STATUS_PATH: &str = "/api/v0/auth/";

/// Cookie holding the state token of the login attempt in flight
pub const OAUTH_STATE_COOKIE_NAME: &str = "oauth_state";
const OAUTH_STATE_TTL_MINUTES: i64 = 10;

/// Create authentication router
///
/// Routes:
/// - GET /api/v0/login/ - Redirect to GitHub
/// - GET /api/v0/github_oauth_cb/ - OAuth callback
/// - GET /api/v0/logout/ - Logout
/// - GET /api/v0/auth/ - Authentication status
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route(LOGIN_PATH, get(github_redirect))
        .route(CALLBACK_PATH, get(github_callback))
        .route(LOGOUT_PATH, get(logout))
        .route(AUTH_STATUS_PATH, get(auth_status))
}

// =============================================================================
// GitHub OAuth
// =============================================================================

/// GET /api/v0/login/
///
/// Redirects user to GitHub authorization page.
///
/// # Steps
/// 1. Generate CSRF state token
/// 2. Store state in cookie
/// 3. Redirect to GitHub with client_id, scope, state
async fn github_redirect(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let redirect = LoginFlow::new(state.provider.as_ref(), &state.sessions).start_login();
    LOGIN_ATTEMPTS_TOTAL.with_label_values(&["started"]).inc();
    tracing::debug!("Starting GitHub login");

    let secure = state.config.should_use_secure_cookies();
    let jar = jar.add(oauth_state_cookie(redirect.state_token, secure));
    (jar, Redirect::temporary(&redirect.url))
}

/// Query parameters from GitHub callback
#[derive(Debug, Deserialize)]
struct GitHubCallbackQuery {
    /// Authorization code
    code: Option<String>,
    /// CSRF state token
    state: Option<String>,
}

/// GET /api/v0/github_oauth_cb/
///
/// Handles OAuth callback from GitHub.
///
/// # Steps
/// 1. Verify CSRF state against the cookie set at login
/// 2. Exchange code for access token
/// 3. Fetch user info from GitHub
/// 4. Create session and set cookie
/// 5. Redirect to the protected area
///
/// Any failure is logged and sends the browser back to the root.
async fn github_callback(
    State(state): State<AppState>,
    Query(query): Query<GitHubCallbackQuery>,
    jar: CookieJar,
) -> Response {
    let expected_state = jar
        .get(OAUTH_STATE_COOKIE_NAME)
        .map(|cookie| cookie.value().to_owned());
    let jar = jar.add(clear_oauth_state_cookie());

    match complete_login(&state, expected_state.as_deref(), &query).await {
        Ok((principal, token)) => {
            LOGIN_ATTEMPTS_TOTAL.with_label_values(&["succeeded"]).inc();
            tracing::info!(principal = %principal, "User logged in");

            let secure = state.config.should_use_secure_cookies();
            let jar = jar.add(state.sessions.session_cookie(token, secure));
            (jar, Redirect::temporary(PROTECTED_HOME_PATH)).into_response()
        }
        Err(error) => {
            LOGIN_ATTEMPTS_TOTAL
                .with_label_values(&[error.outcome()])
                .inc();
            tracing::warn!(%error, "Login callback rejected");
            (jar, Redirect::temporary(ROOT_PATH)).into_response()
        }
    }
}

async fn complete_login(
    state: &AppState,
    expected_state: Option<&str>,
    query: &GitHubCallbackQuery,
) -> Result<(String, String), LoginError> {
    let session = LoginFlow::new(state.provider.as_ref(), &state.sessions)
        .complete_login(
            expected_state,
            query.state.as_deref(),
            query.code.as_deref(),
        )
        .await?;
    let token = state
        .sessions
        .encode(&session)
        .map_err(|e| LoginError::Session(e.to_string()))?;
    Ok((session.principal_name, token))
}

// =============================================================================
// Logout
// =============================================================================

/// GET /api/v0/logout/
///
/// Clears session cookie and redirects to the root. Idempotent.
async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(session) = state.sessions.from_jar(&jar) {
        tracing::info!(principal = %session.principal_name, "User logged out");
    }
    (
        jar.add(state.sessions.clear_session_cookie()),
        Redirect::to(ROOT_PATH),
    )
}

// =============================================================================
// Status
// =============================================================================

#[derive(Debug, Serialize)]
struct AuthStatus {
    auth: bool,
}

/// GET /api/v0/auth/
///
/// Reports whether the session cookie is authenticated. Unauthenticated
/// callers get 401 alongside `{"auth":false}`.
async fn auth_status(State(state): State<AppState>, jar: CookieJar) -> Response {
    let session = state.sessions.from_jar(&jar);
    let pending = jar.get(OAUTH_STATE_COOKIE_NAME).is_some();

    match AuthState::of(session.as_ref(), pending) {
        AuthState::Authenticated => Json(AuthStatus { auth: true }).into_response(),
        AuthState::Anonymous | AuthState::PendingProviderCallback => {
            (StatusCode::UNAUTHORIZED, Json(AuthStatus { auth: false })).into_response()
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn oauth_state_cookie(state_token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((OAUTH_STATE_COOKIE_NAME, state_token))
        .path(CALLBACK_PATH)
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(OAUTH_STATE_TTL_MINUTES))
        .build()
}

fn clear_oauth_state_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build((OAUTH_STATE_COOKIE_NAME, ""))
        .path(CALLBACK_PATH)
        .http_only(true)
        .build();
    cookie.make_removal();
    cookie
}
