//! GitHub OAuth and REST client

use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::header::ACCEPT;
use serde::Deserialize;
use url::Url;

use super::{IdentityProvider, RepositoryItem};
use crate::config::GitHubConfig;
use crate::error::{AppError, ProviderError};
use crate::metrics::observe_provider_call;

const OAUTH_SCOPE: &str = "user:email";
const GITHUB_JSON: &str = "application/vnd.github+json";

/// GitHub token response
///
/// GitHub answers a bad code with 200 and an `error` field, so both
/// shapes are optional here.
#[derive(Debug, Deserialize)]
struct GitHubTokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// GitHub user info
#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
}

/// GitHub repository, reduced to the fields we project
#[derive(Debug, Deserialize)]
struct GitHubRepo {
    name: String,
    #[serde(default)]
    stargazers_count: u64,
}

/// GitHub implementation of [`IdentityProvider`]
///
/// Built once from immutable configuration; holds a shared HTTP client.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client_id: String,
    client_secret: String,
    redirect_url: Option<String>,
    authorize_url: Url,
    token_url: Url,
    api_base_url: String,
    http: reqwest::Client,
}

impl GitHubClient {
    /// Create a client
    ///
    /// # Errors
    /// Returns a configuration error if an endpoint URL does not parse,
    /// or an HTTP client error if the client cannot be built.
    pub fn new(config: &GitHubConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("starz/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_url: config.redirect_url.clone(),
            authorize_url: parse_endpoint("github.authorize_url", &config.authorize_url)?,
            token_url: parse_endpoint("github.token_url", &config.token_url)?,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn repos_url(&self, login: &str) -> String {
        format!(
            "{}/users/{}/repos",
            self.api_base_url,
            urlencoding::encode(login)
        )
    }

    async fn request_token(&self, code: &str) -> Result<String, String> {
        let mut form = vec![
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
        ];
        if let Some(redirect_url) = &self.redirect_url {
            form.push(("redirect_uri", redirect_url.as_str()));
        }

        let response = self
            .http
            .post(self.token_url.clone())
            .header(ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("token endpoint returned {status}"));
        }

        let body: GitHubTokenResponse = response.json().await.map_err(|e| e.to_string())?;
        match body {
            GitHubTokenResponse {
                access_token: Some(token),
                ..
            } if !token.is_empty() => Ok(token),
            GitHubTokenResponse {
                error,
                error_description,
                ..
            } => Err(format!(
                "{}: {}",
                error.unwrap_or_else(|| "missing_access_token".to_string()),
                error_description.unwrap_or_default()
            )),
        }
    }

    async fn request_user(&self, access_token: &str) -> Result<String, String> {
        let response = self
            .http
            .get(format!("{}/user", self.api_base_url))
            .header(ACCEPT, GITHUB_JSON)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("user endpoint returned {status}"));
        }

        let user: GitHubUser = response.json().await.map_err(|e| e.to_string())?;
        Ok(user.login)
    }

    async fn request_repositories(
        &self,
        login: &str,
        credential: Option<&str>,
    ) -> Result<Vec<RepositoryItem>, String> {
        let mut request = self
            .http
            .get(self.repos_url(login))
            .header(ACCEPT, GITHUB_JSON);
        if let Some(token) = credential {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("repos endpoint returned {status}"));
        }

        let repos: Vec<GitHubRepo> = response.json().await.map_err(|e| e.to_string())?;
        Ok(repos
            .into_iter()
            .map(|repo| RepositoryItem::new(repo.name, repo.stargazers_count))
            .collect())
    }
}

#[axum::async_trait]
impl IdentityProvider for GitHubClient {
    fn authorization_url(&self, state_token: &str) -> String {
        let mut url = self.authorize_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.client_id)
                .append_pair("response_type", "code")
                .append_pair("scope", OAUTH_SCOPE)
                .append_pair("state", state_token);
            if let Some(redirect_url) = &self.redirect_url {
                query.append_pair("redirect_uri", redirect_url);
            }
        }
        url.to_string()
    }

    async fn exchange_code(&self, code: &str) -> Result<String, ProviderError> {
        observed("exchange_code", self.request_token(code))
            .await
            .map_err(ProviderError::ExchangeFailed)
    }

    async fn fetch_principal(&self, access_token: &str) -> Result<String, ProviderError> {
        observed("fetch_principal", self.request_user(access_token))
            .await
            .map_err(ProviderError::ProfileFetchFailed)
    }

    async fn list_repositories(
        &self,
        login: &str,
        credential: Option<&str>,
    ) -> Result<Vec<RepositoryItem>, ProviderError> {
        observed(
            "list_repositories",
            self.request_repositories(login, credential),
        )
        .await
        .map_err(ProviderError::UserNotFound)
    }
}

/// Run one provider call, recording its outcome and latency.
async fn observed<T, F>(operation: &'static str, call: F) -> Result<T, String>
where
    F: Future<Output = Result<T, String>>,
{
    let started = Instant::now();
    let result = call.await;
    observe_provider_call(operation, result.is_ok(), started.elapsed());
    if let Err(error) = &result {
        tracing::warn!(operation, %error, "GitHub request failed");
    }
    result
}

fn parse_endpoint(key: &str, value: &str) -> Result<Url, AppError> {
    Url::parse(value).map_err(|e| AppError::Config(format!("{key} is not a valid URL: {e}")))
}
