//! Registered lock entities, keyed by unique id

use std::collections::BTreeMap;
use std::sync::Arc;

use super::entity::LockEntity;

#[derive(Default, Clone)]
pub struct LockRegistry {
    entities: BTreeMap<String, Arc<dyn LockEntity>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add entities. A repeated unique id replaces the earlier entity.
    pub fn register(&mut self, entities: Vec<Arc<dyn LockEntity>>) {
        for entity in entities {
            let id = entity.unique_id().to_string();
            if self.entities.insert(id.clone(), entity).is_some() {
                tracing::warn!("[LockRegistry] Replaced duplicate entity {}", id);
            }
        }
    }

    pub fn get(&self, unique_id: &str) -> Option<Arc<dyn LockEntity>> {
        self.entities.get(unique_id).cloned()
    }

    /// All entities, ordered by unique id
    pub fn all(&self) -> Vec<Arc<dyn LockEntity>> {
        self.entities.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
