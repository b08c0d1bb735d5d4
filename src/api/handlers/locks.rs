//! Lock handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use futures::future::join_all;

use crate::api::ApiState;
use crate::error::AppError;
use crate::lock::LockEntity;

fn find_lock(state: &ApiState, unique_id: &str) -> Result<Arc<dyn LockEntity>, AppError> {
    state
        .registry
        .get(unique_id)
        .ok_or_else(|| AppError::NotFound(format!("Lock {} not found", unique_id)))
}

/// GET /api/locks - List all locks
pub async fn list_locks(State(state): State<ApiState>) -> impl IntoResponse {
    let entities = state.registry.all();
    let snapshots = join_all(entities.iter().map(|e| e.snapshot())).await;
    Json(snapshots)
}

/// GET /api/locks/:unique_id - Get a single lock
pub async fn get_lock(
    State(state): State<ApiState>,
    Path(unique_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let entity = find_lock(&state, &unique_id)?;
    Ok(Json(entity.snapshot().await))
}

/// POST /api/locks/:unique_id/lock
pub async fn lock_device(
    State(state): State<ApiState>,
    Path(unique_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let entity = find_lock(&state, &unique_id)?;
    tracing::info!("Lock requested for {}", entity.name());
    entity.lock().await;
    Ok(Json(entity.snapshot().await))
}

/// POST /api/locks/:unique_id/unlock
pub async fn unlock_device(
    State(state): State<ApiState>,
    Path(unique_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let entity = find_lock(&state, &unique_id)?;
    tracing::info!("Unlock requested for {}", entity.name());
    entity.unlock().await;
    Ok(Json(entity.snapshot().await))
}

/// POST /api/locks/:unique_id/refresh - Poll the device now
pub async fn refresh_device(
    State(state): State<ApiState>,
    Path(unique_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let entity = find_lock(&state, &unique_id)?;
    entity.update().await;
    Ok(Json(entity.snapshot().await))
}
