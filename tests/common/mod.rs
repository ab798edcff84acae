//! Common test utilities for E2E tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use starz::error::ProviderError;
use starz::provider::{IdentityProvider, RepositoryItem};
use starz::{AppState, config};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const AUTHORIZE_URL: &str = "https://github.test/login/oauth/authorize";
pub const VALID_CODE: &str = "valid-code";
pub const PRINCIPAL: &str = "octocat";
pub const API_TOKEN: &str = "static-api-token";

/// In-memory identity provider that records every network-shaped call
#[derive(Default)]
pub struct FakeProvider {
    pub repos: HashMap<String, Vec<RepositoryItem>>,
    pub exchange_calls: AtomicUsize,
    pub profile_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub last_credential: Mutex<Option<String>>,
    pub last_login: Mutex<Option<String>>,
}

impl FakeProvider {
    pub fn with_repos(mut self, login: &str, repos: Vec<RepositoryItem>) -> Self {
        self.repos.insert(login.to_string(), repos);
        self
    }

    pub fn total_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
            + self.profile_calls.load(Ordering::SeqCst)
            + self.list_calls.load(Ordering::SeqCst)
    }
}

#[axum::async_trait]
impl IdentityProvider for FakeProvider {
    fn authorization_url(&self, state_token: &str) -> String {
        format!("{AUTHORIZE_URL}?client_id=test-client-id&scope=user%3Aemail&state={state_token}")
    }

    async fn exchange_code(&self, code: &str) -> Result<String, ProviderError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        if code == VALID_CODE {
            Ok("gho_test_access_token".to_string())
        } else {
            Err(ProviderError::ExchangeFailed("bad_verification_code".to_string()))
        }
    }

    async fn fetch_principal(&self, access_token: &str) -> Result<String, ProviderError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        if access_token == "gho_test_access_token" {
            Ok(PRINCIPAL.to_string())
        } else {
            Err(ProviderError::ProfileFetchFailed("401 Unauthorized".to_string()))
        }
    }

    async fn list_repositories(
        &self,
        login: &str,
        credential: Option<&str>,
    ) -> Result<Vec<RepositoryItem>, ProviderError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_credential.lock().unwrap() = credential.map(ToString::to_string);
        *self.last_login.lock().unwrap() = Some(login.to_string());
        self.repos
            .get(login)
            .cloned()
            .ok_or_else(|| ProviderError::UserNotFound("404 Not Found".to_string()))
    }
}

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub provider: Arc<FakeProvider>,
    pub _assets_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        Self::with_provider(FakeProvider::default()).await
    }

    /// Create a test server backed by `provider`
    pub async fn with_provider(provider: FakeProvider) -> Self {
        let assets_dir = create_assets_dir();
        let config = test_config(assets_dir.path().to_path_buf());

        let provider = Arc::new(provider);
        let state = AppState::with_provider(config, provider.clone());

        // Redirects are asserted on, never followed
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = starz::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: addr_str,
            state,
            provider,
            _assets_dir: assets_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// `Cookie` header value carrying a valid authenticated session
    pub fn session_cookie(&self, principal: &str) -> String {
        let session = self.state.sessions.issue(principal);
        let token = self
            .state
            .sessions
            .encode(&session)
            .expect("Failed to create test session");
        format!("session={token}")
    }
}

/// Test configuration
pub fn test_config(assets_dir: PathBuf) -> config::AppConfig {
    config::AppConfig {
        server: config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            domain: "localhost".to_string(),
            protocol: "http".to_string(),
        },
        github: config::GitHubConfig {
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
            api_token: Some(API_TOKEN.to_string()),
            redirect_url: None,
            authorize_url: AUTHORIZE_URL.to_string(),
            token_url: "https://github.test/login/oauth/access_token".to_string(),
            api_base_url: "https://api.github.test".to_string(),
        },
        session: config::SessionConfig {
            cookie_secret: Some("test-secret-key-32-bytes-long!!!".to_string()),
            max_age: 604_800,
        },
        assets: config::AssetsConfig { dir: assets_dir },
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}

fn create_assets_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("s")).unwrap();
    std::fs::write(
        dir.path().join("s").join("index.html"),
        "<html><body>landing</body></html>",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("s").join("app.js"),
        "console.log('starz');",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("list.html"),
        "<html><body>protected list</body></html>",
    )
    .unwrap();
    dir
}

/// All `Set-Cookie` header values of a response
pub fn set_cookies(response: &reqwest::Response) -> Vec<String> {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(ToString::to_string))
        .collect()
}

/// Value of the `name` cookie set by a response, if any
pub fn cookie_value(response: &reqwest::Response, name: &str) -> Option<String> {
    set_cookies(response).into_iter().find_map(|raw| {
        let pair = raw.split(';').next()?;
        let (cookie_name, value) = pair.split_once('=')?;
        (cookie_name.trim() == name).then(|| value.to_string())
    })
}

/// `Location` header of a redirect response
pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("location header")
        .to_string()
}
