//! API layer
//!
//! HTTP handlers for:
//! - Repository listing proxy
//! - Health and server info
//! - Static assets
//! - Metrics (Prometheus)

pub mod assets;
mod info;
mod list;
pub mod metrics;

pub use info::{ServerInfo, health, not_found, server_info};
pub use list::{LIST_PREFIX, LIST_WILDCARD_PATH, ListTarget, list_repositories};
pub use metrics::metrics_handler;
