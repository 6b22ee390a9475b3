use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;

use crate::project::ResourceId;

type ResourceMutex = Arc<tokio::sync::Mutex<()>>;

/// Serialises access to shared mutable build state.
///
/// Locks for a set of resources are always taken in ascending [`ResourceId`] order,
/// so two tasks can never wait on each other in a cycle.
#[derive(Debug, Clone, Default)]
pub struct ResourceLockCoordinator {
    locks: Arc<Mutex<HashMap<ResourceId, ResourceMutex>>>,
}

impl ResourceLockCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, resources: &[ResourceId]) -> ResourceLock {
        let mut ids = resources.to_vec();
        ids.sort();
        ids.dedup();

        let mutexes: Vec<ResourceMutex> = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            ids.iter()
                .map(|id| Arc::clone(locks.entry(id.clone()).or_default()))
                .collect()
        };

        let mut guards = Vec::with_capacity(mutexes.len());
        for mutex in mutexes {
            guards.push(mutex.lock_owned().await);
        }
        if !ids.is_empty() {
            tracing::trace!(resources = ?ids, "resources locked");
        }
        ResourceLock { ids, guards }
    }
}

/// Held resources; released in reverse acquisition order on drop.
#[derive(Debug)]
pub struct ResourceLock {
    ids: Vec<ResourceId>,
    guards: Vec<OwnedMutexGuard<()>>,
}

impl ResourceLock {
    pub fn resources(&self) -> &[ResourceId] {
        &self.ids
    }
}

impl Drop for ResourceLock {
    fn drop(&mut self) {
        while let Some(guard) = self.guards.pop() {
            drop(guard);
        }
    }
}
