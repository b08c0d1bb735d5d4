//! LockPoller: periodic state refresh for every registered lock
//!
//! Each lock gets its own tokio task, so a lock stuck in retry backoff does
//! not delay the others.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::entity::LockEntity;

pub struct LockPoller {
    entities: Vec<Arc<dyn LockEntity>>,
    period: Duration,
}

impl LockPoller {
    pub fn new(entities: Vec<Arc<dyn LockEntity>>, period: Duration) -> Self {
        Self { entities, period }
    }

    /// Spawn one poll loop per entity. The loops run until the runtime shuts down.
    pub fn start(self) -> Vec<JoinHandle<()>> {
        tracing::info!(
            "[LockPoller] Polling {} locks every {:?}",
            self.entities.len(),
            self.period
        );

        let period = self.period;
        self.entities
            .into_iter()
            .map(|entity| tokio::spawn(poll_entity(entity, period)))
            .collect()
    }
}

async fn poll_entity(entity: Arc<dyn LockEntity>, period: Duration) {
    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // First tick fires immediately; setup already refreshed the entity
    timer.tick().await;

    loop {
        timer.tick().await;
        tracing::trace!("[LockPoller] Updating {}", entity.unique_id());
        entity.update().await;
    }
}
