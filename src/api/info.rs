//! Health and server info endpoints

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use serde::Serialize;

use crate::AppState;
use crate::error::AppError;
use crate::metrics::APP_UPTIME_SECONDS;

/// GET /healthz
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        r#"{"alive": true}"#,
    )
}

#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub version: &'static str,
    pub start: String,
    pub uptime: String,
}

/// GET /info/
///
/// Build version, process start time and uptime.
pub async fn server_info(State(state): State<AppState>) -> Json<ServerInfo> {
    let uptime = record_uptime(&state);
    Json(ServerInfo {
        version: env!("CARGO_PKG_VERSION"),
        start: state.started_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        uptime: format_uptime(uptime),
    })
}

/// Fallback for unknown routes
pub async fn not_found() -> AppError {
    AppError::NotFound
}

pub(crate) fn record_uptime(state: &AppState) -> Duration {
    let uptime = Utc::now() - state.started_at;
    APP_UPTIME_SECONDS.set(uptime.num_milliseconds() as f64 / 1000.0);
    uptime
}

fn format_uptime(uptime: Duration) -> String {
    let total = uptime.num_seconds().max(0);
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    match (hours, minutes) {
        (0, 0) => format!("{seconds}s"),
        (0, _) => format!("{minutes}m{seconds}s"),
        _ => format!("{hours}h{minutes}m{seconds}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_formats_like_a_duration() {
        assert_eq!(format_uptime(Duration::seconds(7)), "7s");
        assert_eq!(format_uptime(Duration::seconds(125)), "2m5s");
        assert_eq!(format_uptime(Duration::seconds(3 * 3600 + 61)), "3h1m1s");
        assert_eq!(format_uptime(Duration::seconds(-4)), "0s");
    }
}
