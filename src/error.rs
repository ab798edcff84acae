//! Error types for starz
//!
//! All request-level errors are converted to `AppError`,
//! which implements `IntoResponse` for structured JSON error responses.
//! Provider and login-flow errors have their own types so the callers
//! can decide whether to surface or swallow them.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
///
/// Every variant renders as `{"success": false, "error": "..."}` so
/// programmatic clients can tell failures apart from payloads without
/// looking at the status code.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found (404)
    #[error("Resource not found")]
    NotFound,

    /// Malformed request: wrong method, empty path segment (400)
    #[error("{0}")]
    BadRequest(String),

    /// Provider could not list repositories for the requested login (400)
    #[error("user could not be found")]
    UserNotFound,

    /// HTTP client error (502)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Signing error (500)
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::UserNotFound(_) => AppError::UserNotFound,
            other => AppError::Internal(other.into()),
        }
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to appropriate HTTP status code
    /// and the structured failure body.
    fn into_response(self) -> Response {
        use axum::Json;

        let (status, error_message, error_type) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string(), "not_found"),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), "bad_request"),
            AppError::UserNotFound => (StatusCode::BAD_REQUEST, self.to_string(), "user_not_found"),
            AppError::HttpClient(_) => (StatusCode::BAD_GATEWAY, self.to_string(), "http_client"),
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone(), "config"),
            AppError::Encryption(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                "encryption",
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                "internal",
            ),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[error_type]).inc();

        let body = Json(serde_json::json!({
            "success": false,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Failures reported by the identity provider client.
///
/// None of these are retried; the caller decides whether to restart
/// the flow or surface the failure.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Authorization code could not be exchanged for an access token
    #[error("token exchange failed: {0}")]
    ExchangeFailed(String),

    /// The access token could not be resolved to a principal
    #[error("profile fetch failed: {0}")]
    ProfileFetchFailed(String),

    /// Repository listing failed for the requested login
    #[error("user could not be found: {0}")]
    UserNotFound(String),
}

/// Reasons a login callback is rejected.
///
/// These never reach the end user; the callback handler logs them and
/// redirects back to the root.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("oauth state mismatch")]
    CsrfStateMismatch,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("failed to mint session: {0}")]
    Session(String),
}

impl LoginError {
    /// Metric label for the login outcome
    pub fn outcome(&self) -> &'static str {
        match self {
            LoginError::CsrfStateMismatch => "csrf_mismatch",
            LoginError::Provider(ProviderError::ExchangeFailed(_)) => "exchange_failed",
            LoginError::Provider(ProviderError::ProfileFetchFailed(_)) => "profile_fetch_failed",
            LoginError::Provider(ProviderError::UserNotFound(_)) => "profile_fetch_failed",
            LoginError::Session(_) => "session_error",
        }
    }
}

/// Why a session cookie was not accepted.
///
/// Only ever logged; the request is treated as anonymous.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionDecodeError {
    #[error("session token is malformed")]
    Malformed,

    #[error("session signature is invalid")]
    InvalidSignature,

    #[error("session payload could not be decoded")]
    InvalidPayload,

    #[error("session has expired")]
    Expired,
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn bad_request_renders_structured_failure() {
        let response = AppError::BadRequest("Allowed method: GET".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(
            body,
            serde_json::json!({"success": false, "error": "Allowed method: GET"})
        );
    }

    #[tokio::test]
    async fn not_found_renders_structured_failure() {
        let response = AppError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(
            body,
            serde_json::json!({"success": false, "error": "Resource not found"})
        );
    }

    #[tokio::test]
    async fn user_not_found_is_a_client_error() {
        let response = AppError::from(ProviderError::UserNotFound("404".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "user could not be found");
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak_details() {
        let response = AppError::Internal(anyhow::anyhow!("secret detail")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Internal server error");
    }

    #[test]
    fn login_error_outcomes() {
        assert_eq!(LoginError::CsrfStateMismatch.outcome(), "csrf_mismatch");
        assert_eq!(
            LoginError::from(ProviderError::ExchangeFailed("x".into())).outcome(),
            "exchange_failed"
        );
        assert_eq!(
            LoginError::from(ProviderError::ProfileFetchFailed("x".into())).outcome(),
            "profile_fetch_failed"
        );
    }
}
