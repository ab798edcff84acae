//! starz - GitHub login and an authenticated repository star-count proxy
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - OAuth login / callback / logout / status                 │
//! │  - Repository listing proxy                                 │
//! │  - Health, info, metrics, static assets                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Auth Layer                              │
//! │  - Session gate middleware                                  │
//! │  - Login flow (CSRF state, code exchange)                   │
//! │  - HMAC-signed session cookies                              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Provider Layer                            │
//! │  - GitHub OAuth + REST client (reqwest)                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers for the proxy query, info and assets
//! - `auth`: GitHub OAuth flow, sessions and the session gate
//! - `provider`: Identity provider trait and GitHub client
//! - `config`: Configuration management
//! - `cli`: Command-line interface
//! - `error`: Error types
//! - `metrics`: Prometheus instruments

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod metrics;
pub mod provider;

use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Application state shared across all handlers
///
/// Cloned for each request. Everything in it is immutable after startup,
/// so handlers never coordinate with each other.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Session cookie signer/verifier
    pub sessions: Arc<auth::SessionCodec>,

    /// Identity provider (GitHub)
    pub provider: Arc<dyn provider::IdentityProvider>,

    /// Process start time
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Initialize application state with the GitHub provider
    ///
    /// # Errors
    /// Returns error if the GitHub client cannot be built
    pub fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        let github = provider::GitHubClient::new(&config.github)?;
        Ok(Self::with_provider(config, Arc::new(github)))
    }

    /// Initialize application state with an explicit provider
    pub fn with_provider(
        config: config::AppConfig,
        provider: Arc<dyn provider::IdentityProvider>,
    ) -> Self {
        let max_age = config.session.max_age;
        let sessions = match &config.session.cookie_secret {
            Some(secret) => auth::SessionCodec::new(secret.as_bytes(), max_age),
            None => {
                tracing::warn!(
                    "No session.cookie_secret configured; generated a random one, sessions will not survive a restart"
                );
                auth::SessionCodec::with_random_secret(max_age)
            }
        };

        tracing::info!("Application state initialized");

        Self {
            config: Arc::new(config),
            sessions: Arc::new(sessions),
            provider,
            started_at: Utc::now(),
        }
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::{
        Router, middleware,
        routing::{any, get},
    };
    use tower_http::{compression::CompressionLayer, trace::TraceLayer};

    let cors_layer = build_cors_layer(&state.config.server);
    let assets_dir = state.config.assets.dir.clone();

    let protected = Router::new()
        .route(api::LIST_PREFIX, any(api::list_repositories))
        .route(api::LIST_WILDCARD_PATH, any(api::list_repositories))
        .route_service(
            auth::PROTECTED_HOME_PATH,
            api::assets::protected_page(&assets_dir),
        )
        .route("/metrics", get(api::metrics_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    Router::new()
        .route("/healthz", get(api::health))
        .route("/info/", get(api::server_info))
        .merge(auth::auth_router())
        .merge(protected)
        .nest_service(
            api::assets::PUBLIC_ASSETS_PATH,
            api::assets::public_assets(&assets_dir),
        )
        .route_service(auth::ROOT_PATH, api::assets::landing_page(&assets_dir))
        .fallback(api::not_found)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

fn build_cors_layer(server: &config::ServerConfig) -> tower_http::cors::CorsLayer {
    use axum::http::HeaderValue;
    use tower_http::cors::{Any, CorsLayer};

    if !server.protocol.eq_ignore_ascii_case("https") {
        return CorsLayer::permissive();
    }

    let allowed_origin = server.base_url();
    match HeaderValue::from_str(&allowed_origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin([origin])
            .allow_methods(Any)
            .allow_headers(Any),
        Err(error) => {
            tracing::error!(
                %error,
                origin = %allowed_origin,
                "Failed to parse CORS origin from server base URL; denying cross-origin requests"
            );
            CorsLayer::new().allow_methods(Any).allow_headers(Any)
        }
    }
}
