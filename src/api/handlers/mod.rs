//! HTTP handlers module

mod locks;

pub use self::locks::*;

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

use crate::api::ApiState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub locks: usize,
}

/// Health check handler
pub async fn health_check(State(state): State<ApiState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: state.info.name.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        locks: state.registry.len(),
    })
}
