//! Identity provider
//!
//! The OAuth code exchange, principal lookup and repository listing
//! sit behind [`IdentityProvider`] so handlers receive the provider
//! through `AppState` instead of reaching for a global client.

mod github;

pub use github::GitHubClient;

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// One repository and its star count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryItem {
    pub name: String,
    #[serde(rename = "stargazers_count")]
    pub star_count: u64,
}

impl RepositoryItem {
    pub fn new(name: impl Into<String>, star_count: u64) -> Self {
        Self {
            name: name.into(),
            star_count,
        }
    }
}

/// Operations the login flow and the proxy query need from the provider
#[axum::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Authorization URL the browser is redirected to. No network call.
    fn authorization_url(&self, state_token: &str) -> String;

    /// Exchange an authorization code for an access token
    async fn exchange_code(&self, code: &str) -> Result<String, ProviderError>;

    /// Resolve the login the access token belongs to
    async fn fetch_principal(&self, access_token: &str) -> Result<String, ProviderError>;

    /// List the public repositories of `login`, in provider order
    ///
    /// Anonymous when `credential` is `None`; otherwise sent as a bearer token.
    async fn list_repositories(
        &self,
        login: &str,
        credential: Option<&str>,
    ) -> Result<Vec<RepositoryItem>, ProviderError>;
}
