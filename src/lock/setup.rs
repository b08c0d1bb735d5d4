//! Credential check and lock platform setup

use std::sync::Arc;

use futures::future::join_all;

use super::entity::{CuboLock, LockEntity};
use super::registry::LockRegistry;
use crate::config::{CuboConfig, IntegrationInfo, PlatformOptions};
use crate::cubo::models::device_ids;
use crate::cubo::{CuboClient, Transport};

/// Return true if the token is accepted by the cloud.
/// Anything other than a clean 200 counts as invalid.
pub async fn test_credentials<T: Transport>(client: &CuboClient<T>) -> bool {
    match client.list_devices().await {
        Ok(Some(resp)) if resp.status == 200 => true,
        Ok(Some(resp)) if resp.status == 403 => false,
        Ok(Some(resp)) => {
            tracing::error!(
                "[Setup] Unknown case while checking credentials: {} {}",
                resp.status,
                resp.body
            );
            false
        }
        Ok(None) => {
            tracing::error!("[Setup] Cubo cloud unreachable while checking credentials");
            false
        }
        Err(e) => {
            tracing::error!("[Setup] Credential check failed: {}", e);
            false
        }
    }
}

/// Create one lock per remote device and refresh each before returning
pub async fn setup_locks<T: Transport + 'static>(
    client: Arc<CuboClient<T>>,
    cubo: &CuboConfig,
    info: &IntegrationInfo,
) -> Vec<Arc<CuboLock<T>>> {
    let resp = match client.list_devices().await {
        Ok(Some(resp)) => resp,
        Ok(None) => {
            tracing::error!("[Setup] Error getting devices: no response from cloud");
            return Vec::new();
        }
        Err(e) => {
            tracing::error!("[Setup] Error getting devices: {}", e);
            return Vec::new();
        }
    };

    let ids = match device_ids(&resp.body) {
        Some(ids) if resp.is_ok() => ids,
        _ => {
            tracing::error!(
                "[Setup] Error getting devices: {} {}",
                resp.status,
                resp.body
            );
            return Vec::new();
        }
    };

    let locks: Vec<Arc<CuboLock<T>>> = ids
        .into_iter()
        .map(|id| {
            Arc::new(
                CuboLock::new(client.clone(), id, info).with_pending_timeout(cubo.pending_timeout()),
            )
        })
        .collect();

    join_all(locks.iter().map(|lock| lock.update())).await;

    tracing::info!("[Setup] {} locks discovered", locks.len());
    locks
}

/// Set up every enabled platform and hand the entities to a registry
pub async fn setup_entry<T: Transport + 'static>(
    client: Arc<CuboClient<T>>,
    cubo: &CuboConfig,
    platforms: &PlatformOptions,
    info: &IntegrationInfo,
) -> LockRegistry {
    let mut registry = LockRegistry::new();

    if !platforms.lock {
        tracing::info!("[Setup] Lock platform disabled");
        return registry;
    }

    let locks = setup_locks(client, cubo, info).await;
    registry.register(
        locks
            .into_iter()
            .map(|lock| lock as Arc<dyn LockEntity>)
            .collect(),
    );

    registry
}
