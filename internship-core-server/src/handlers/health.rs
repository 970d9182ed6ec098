use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use internship_core_db::repository::PoolStats;
use serde::Serialize;

use crate::state::AppState;

const PING_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub success: bool,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub pool: PoolStats,
}

/// GET /health
///
/// 200 when the store answers its ping in time, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> Response {
    let pool = state.store.stats();
    match state.store.health(PING_TIMEOUT).await {
        Ok(latency) => Json(HealthBody {
            success: true,
            status: "ok",
            latency_ms: Some(u64::try_from(latency.as_millis()).unwrap_or(u64::MAX)),
            error: None,
            pool,
        })
        .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            let body = HealthBody {
                success: false,
                status: "unavailable",
                latency_ms: None,
                error: Some("store unavailable".to_string()),
                pool,
            };
            (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
        }
    }
}
