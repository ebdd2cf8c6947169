//! Health check endpoints for Kubernetes probes

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tracing::warn;

use super::state::AppState;

/// Name of the only dependency `/ready` checks
const KEY_STORE_CHECK: &str = "api_key_store";

/// Message reported when the key store ping fails; the cause is only logged
const KEY_STORE_UNREACHABLE: &str = "key store unreachable";

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreCheck>,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Result of pinging the key store
#[derive(Serialize)]
pub struct StoreCheck {
    pub name: &'static str,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub latency_ms: u64,
}

impl HealthResponse {
    fn new(status: HealthStatus, store: Option<StoreCheck>) -> Self {
        Self {
            status,
            version: env!("CARGO_PKG_VERSION"),
            store,
        }
    }
}

/// GET /health - the process is up
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse::new(HealthStatus::Healthy, None))
}

/// GET /ready - 503 while the key store cannot be reached
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let check = ping_key_store(&state).await;
    let status = check.status;

    let code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (code, Json(HealthResponse::new(status, Some(check))))
}

/// GET /live
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

async fn ping_key_store(state: &AppState) -> StoreCheck {
    let start = Instant::now();
    let result = state.api_key_service.store().ping().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(()) => StoreCheck {
            name: KEY_STORE_CHECK,
            status: HealthStatus::Healthy,
            message: None,
            latency_ms,
        },
        Err(e) => {
            warn!(error = %e, latency_ms, "API key store readiness check failed");
            StoreCheck {
                name: KEY_STORE_CHECK,
                status: HealthStatus::Unhealthy,
                message: Some(KEY_STORE_UNREACHABLE),
                latency_ms,
            }
        }
    }
}
