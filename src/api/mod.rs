//! API module - HTTP handlers and routes for the host platform

pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::config::IntegrationInfo;
use crate::lock::LockRegistry;

#[derive(Clone)]
pub struct ApiState {
    pub registry: Arc<LockRegistry>,
    pub info: IntegrationInfo,
}

pub fn routes() -> Router<ApiState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/api/health", get(handlers::health_check))
        // Locks
        .route("/api/locks", get(handlers::list_locks))
        .route("/api/locks/:unique_id", get(handlers::get_lock))
        .route("/api/locks/:unique_id/lock", post(handlers::lock_device))
        .route("/api/locks/:unique_id/unlock", post(handlers::unlock_device))
        .route("/api/locks/:unique_id/refresh", post(handlers::refresh_device))
}
