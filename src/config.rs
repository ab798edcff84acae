//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration files (config/default.toml, config/local.toml, or an explicit file)
//! 3. Environment variables (STARZ__*)
//! 4. Command-line overrides

use serde::Deserialize;
use std::{net::IpAddr, path::PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub github: GitHubConfig,
    pub session: SessionConfig,
    pub assets: AssetsConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8000)
    pub port: u16,
    /// Public domain (e.g., "starz.example.com")
    pub domain: String,
    /// Protocol ("http" or "https")
    pub protocol: String,
}

impl ServerConfig {
    /// Get the public base URL
    ///
    /// # Returns
    /// Full URL like "https://starz.example.com"
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }
}

/// GitHub OAuth and API configuration
///
/// Immutable for the lifetime of the process; handed to the GitHub
/// client once at construction.
#[derive(Clone, Deserialize)]
pub struct GitHubConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Static credential attached to repository listing calls
    pub api_token: Option<String>,
    /// Explicit OAuth redirect URI (falls back to the one registered with the app)
    pub redirect_url: Option<String>,
    pub authorize_url: String,
    pub token_url: String,
    pub api_base_url: String,
}

impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("redirect_url", &self.redirect_url)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

/// Session cookie configuration
#[derive(Clone, Deserialize)]
pub struct SessionConfig {
    /// HMAC key for session cookies (32+ bytes).
    ///
    /// When unset a random key is generated at startup, so sessions
    /// do not survive a restart.
    pub cookie_secret: Option<String>,
    /// Session max age in seconds (default: 604800 = 7 days)
    pub max_age: i64,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field(
                "cookie_secret",
                &self.cookie_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("max_age", &self.max_age)
            .finish()
    }
}

/// Static asset configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AssetsConfig {
    /// Root directory holding `s/` (public assets) and `list.html` (protected page)
    pub dir: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

/// Values that take precedence over every other configuration source.
///
/// Filled from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub api_token: Option<String>,
    pub cookie_secret: Option<String>,
    pub static_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from file, environment and overrides
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists), or the explicit config file
    /// 4. Environment variables (STARZ__*)
    /// 5. Overrides
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load(overrides: ConfigOverrides) -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let mut builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("server.domain", "localhost")?
            .set_default("server.protocol", "http")?
            .set_default("github.client_id", "")?
            .set_default("github.client_secret", "")?
            .set_default("github.authorize_url", DEFAULT_AUTHORIZE_URL)?
            .set_default("github.token_url", DEFAULT_TOKEN_URL)?
            .set_default("github.api_base_url", DEFAULT_API_BASE_URL)?
            .set_default("session.max_age", 604800)?
            .set_default("assets.dir", "static")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false));

        builder = match &overrides.config_file {
            Some(path) => builder.add_source(File::from(path.as_path()).required(true)),
            None => builder.add_source(File::with_name("config/local").required(false)),
        };

        let config = builder
            .add_source(
                Environment::with_prefix("STARZ")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.host", overrides.host)?
            .set_override_option("server.port", overrides.port.map(i64::from))?
            .set_override_option("github.client_id", overrides.client_id)?
            .set_override_option("github.client_secret", overrides.client_secret)?
            .set_override_option("github.api_token", overrides.api_token)?
            .set_override_option("session.cookie_secret", overrides.cookie_secret)?
            .set_override_option(
                "assets.dir",
                overrides
                    .static_dir
                    .map(|dir| dir.to_string_lossy().into_owned()),
            )?
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub fn should_use_secure_cookies(&self) -> bool {
        self.server.protocol.eq_ignore_ascii_case("https")
            || !is_local_server_domain(&self.server.domain)
    }

    /// Host part of the public domain, normalized for comparison
    pub fn public_host(&self) -> String {
        normalized_server_host(&self.server.domain)
    }

    /// Address to bind the HTTP listener to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn validate(&self) -> Result<(), crate::error::AppError> {
        if self.github.client_id.trim().is_empty() || self.github.client_secret.trim().is_empty() {
            return Err(crate::error::AppError::Config(
                "github.client_id and github.client_secret must both be provided".to_string(),
            ));
        }

        if let Some(secret) = &self.session.cookie_secret {
            if secret.len() < MIN_COOKIE_SECRET_BYTES {
                return Err(crate::error::AppError::Config(format!(
                    "session.cookie_secret must be at least {} bytes",
                    MIN_COOKIE_SECRET_BYTES
                )));
            }
        }

        if self.session.max_age <= 0 {
            return Err(crate::error::AppError::Config(
                "session.max_age must be greater than 0".to_string(),
            ));
        }

        if self.should_use_secure_cookies() && !self.server.protocol.eq_ignore_ascii_case("https") {
            return Err(crate::error::AppError::Config(
                "server.protocol must be https for non-local server domains".to_string(),
            ));
        }

        Ok(())
    }
}

pub const DEFAULT_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

const MIN_COOKIE_SECRET_BYTES: usize = 32;

fn normalized_server_host(domain: &str) -> String {
    let trimmed = domain.trim();
    let parsed_host = url::Url::parse(&format!("http://{trimmed}"))
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_string()));
    let host = parsed_host.unwrap_or_else(|| trimmed.to_string());
    host.trim_end_matches('.').to_ascii_lowercase()
}

fn is_local_server_domain(domain: &str) -> bool {
    let host = normalized_server_host(domain);
    if host == "localhost" || host.ends_with(".localhost") {
        return true;
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        return ip.is_loopback() || ip.is_unspecified();
    }

    false
}
