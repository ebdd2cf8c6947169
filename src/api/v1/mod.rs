//! Internal v1 API endpoints

pub mod provision;

use axum::{routing::post, Router};

use super::state::AppState;

/// Create v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/apikey", post(provision::api_key))
        .route("/provision", post(provision::provision))
}
