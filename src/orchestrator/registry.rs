use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::docker::ContainerHandle;

/// One in-flight container and the task it runs.
pub struct RegistryEntry<T> {
    pub handle: ContainerHandle,
    pub task: Arc<T>,
}

/// Authoritative set of in-flight (container, task) pairs, keyed by task
/// label. A single coarse lock guards the whole map: the launcher inserts,
/// the poller sweeps and removes, forced shutdown bulk-drains. Poll
/// intervals are seconds-scale, so contention is not a concern.
pub struct Registry<T> {
    entries: Mutex<HashMap<String, RegistryEntry<T>>>,
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Register a freshly started container. At most one live entry per
    /// label; a duplicate label replaces the previous entry (label
    /// uniqueness is the caller's contract).
    pub fn insert(&self, entry: RegistryEntry<T>)
    where
        T: super::Task,
    {
        let label = entry.task.label().to_string();
        self.lock().insert(label, entry);
    }

    /// Lock the map for a sweep. Held across the whole inspection pass.
    pub fn lock(&self) -> MutexGuard<'_, HashMap<String, RegistryEntry<T>>> {
        self.entries.lock().expect("registry lock poisoned")
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Take every remaining entry for forced removal, leaving the map empty.
    pub fn drain(&self) -> Vec<RegistryEntry<T>> {
        let mut entries = self.lock();
        entries.drain().map(|(_, entry)| entry).collect()
    }
}
