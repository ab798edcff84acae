//! Repository listing proxy
//!
//! Lists a GitHub user's repositories and star counts on behalf of an
//! authenticated session.

use axum::{
    Json,
    extract::State,
    http::{Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};

use crate::AppState;
use crate::auth::CurrentSession;
use crate::error::AppError;

pub const LIST_PREFIX: &str = "/api/v0/list/";
pub const LIST_WILDCARD_PATH: &str = "/api/v0/list/*rest";

const METHOD_ERROR: &str = "Allowed method: GET";
const URL_PARSE_ERROR: &str = "url could not be parsed";

/// What a request path under [`LIST_PREFIX`] asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListTarget {
    /// List repositories of this login
    Login(String),
    /// Path lacks its trailing slash; redirect permanently here
    AddTrailingSlash(String),
}

impl ListTarget {
    /// Parse the path remainder after [`LIST_PREFIX`]
    ///
    /// The first raw segment, percent-decoded and trimmed, is the login.
    /// An encoded `/` stays part of the login.
    ///
    /// # Errors
    /// `BadRequest` when the login is empty or does not decode
    pub fn parse(remainder: &str) -> Result<Self, AppError> {
        let segment = remainder.split('/').next().unwrap_or_default();
        let decoded = urlencoding::decode(segment)
            .map_err(|_| AppError::BadRequest(URL_PARSE_ERROR.to_string()))?;
        let login = decoded.trim();
        if login.is_empty() {
            return Err(AppError::BadRequest(URL_PARSE_ERROR.to_string()));
        }

        if !remainder.ends_with('/') {
            return Ok(ListTarget::AddTrailingSlash(format!(
                "{LIST_PREFIX}{remainder}/"
            )));
        }

        Ok(ListTarget::Login(login.to_string()))
    }
}

/// ANY /api/v0/list/{login}/
///
/// Only GET is served; other methods get a structured 400. Paths without
/// the trailing slash are redirected before GitHub is contacted.
pub async fn list_repositories(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    method: Method,
    uri: Uri,
) -> Result<Response, AppError> {
    if method != Method::GET {
        return Err(AppError::BadRequest(METHOD_ERROR.to_string()));
    }

    let remainder = uri.path().strip_prefix(LIST_PREFIX).unwrap_or_default();
    match ListTarget::parse(remainder)? {
        ListTarget::AddTrailingSlash(mut location) => {
            if let Some(query) = uri.query() {
                location.push('?');
                location.push_str(query);
            }
            Ok((StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response())
        }
        ListTarget::Login(login) => {
            tracing::debug!(
                principal = %session.principal_name,
                login = %login,
                "Listing repositories"
            );
            let items = state
                .provider
                .list_repositories(&login, state.config.github.api_token.as_deref())
                .await?;
            Ok(Json(items).into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_login_with_trailing_slash() {
        assert_eq!(
            ListTarget::parse("alice/").unwrap(),
            ListTarget::Login("alice".to_string())
        );
    }

    #[test]
    fn extra_segments_are_ignored() {
        assert_eq!(
            ListTarget::parse("alice/anything/").unwrap(),
            ListTarget::Login("alice".to_string())
        );
    }

    #[test]
    fn missing_trailing_slash_redirects() {
        assert_eq!(
            ListTarget::parse("alice").unwrap(),
            ListTarget::AddTrailingSlash("/api/v0/list/alice/".to_string())
        );
    }

    #[test]
    fn empty_login_is_rejected() {
        for remainder in ["", "/", "%20", " /", "%20%09/"] {
            let error = ListTarget::parse(remainder).expect_err(remainder);
            assert!(matches!(error, AppError::BadRequest(message) if message == URL_PARSE_ERROR));
        }
    }

    #[test]
    fn encoded_slash_stays_in_login() {
        assert_eq!(
            ListTarget::parse("a%2Fb/").unwrap(),
            ListTarget::Login("a/b".to_string())
        );
        assert_eq!(
            ListTarget::parse("a%2Fb").unwrap(),
            ListTarget::AddTrailingSlash("/api/v0/list/a%2Fb/".to_string())
        );
    }

    #[test]
    fn login_is_percent_decoded_and_trimmed() {
        assert_eq!(
            ListTarget::parse("%20bob%20/").unwrap(),
            ListTarget::Login("bob".to_string())
        );
    }
}
