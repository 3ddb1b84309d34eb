//! The process-wide cache of compiler instances.

use crate::host::{BuildId, BuildIdentity};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Instances keyed by build identity, then by configured instance name.
///
/// Each identity gets an index the first time it is seen, and instance keys
/// are `"{name}_{index}"`, so two builds that both use the name `default`
/// never share an instance. Failed creations are not cached.
pub struct InstanceRegistry<T> {
    state: Mutex<RegistryState<T>>,
}

struct RegistryState<T> {
    next_build: u64,
    next_index: usize,
    slots: HashMap<BuildIdentity, BuildSlot<T>>,
}

struct BuildSlot<T> {
    index: usize,
    instances: HashMap<String, Arc<Mutex<T>>>,
}

impl<T> RegistryState<T> {
    fn slot(&mut self, identity: BuildIdentity) -> &mut BuildSlot<T> {
        let next_index = &mut self.next_index;
        self.slots.entry(identity).or_insert_with(|| {
            let index = *next_index;
            *next_index += 1;
            BuildSlot {
                index,
                instances: HashMap::new(),
            }
        })
    }
}

impl<T> Default for InstanceRegistry<T> {
    fn default() -> Self {
        Self {
            state: Mutex::new(RegistryState {
                next_build: 0,
                next_index: 0,
                slots: HashMap::new(),
            }),
        }
    }
}

impl<T> InstanceRegistry<T> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mints a new build identity.
    pub fn register_build(&self) -> BuildId {
        let mut state = self.lock();
        let id = BuildId(state.next_build);
        state.next_build += 1;
        id
    }

    /// Drops every instance of a build, returning how many were dropped.
    pub fn unregister_build(&self, id: BuildId) -> usize {
        let removed = self
            .lock()
            .slots
            .remove(&BuildIdentity::Build(id))
            .map_or(0, |slot| slot.instances.len());
        tracing::debug!(build = %id, instances = removed, "build unregistered");
        removed
    }

    /// Returns the cached instance or creates it with `factory`.
    ///
    /// The factory receives the instance key and runs at most once per key.
    /// The registry lock is held while it runs, so concurrent callers for the
    /// same key wait instead of creating a duplicate. If it fails, nothing is
    /// cached and the next call retries.
    pub fn get_or_create<E>(
        &self,
        identity: BuildIdentity,
        name: &str,
        factory: impl FnOnce(&str) -> Result<T, E>,
    ) -> Result<Arc<Mutex<T>>, E> {
        let mut state = self.lock();
        let slot = state.slot(identity);
        if let Some(instance) = slot.instances.get(name) {
            return Ok(Arc::clone(instance));
        }
        let key = format!("{name}_{}", slot.index);
        let instance = Arc::new(Mutex::new(factory(&key)?));
        slot.instances.insert(name.to_string(), Arc::clone(&instance));
        tracing::debug!(%identity, key = %key, "instance created");
        Ok(instance)
    }

    /// Returns the cached instance, if any.
    pub fn get(&self, identity: BuildIdentity, name: &str) -> Option<Arc<Mutex<T>>> {
        self.lock()
            .slots
            .get(&identity)
            .and_then(|slot| slot.instances.get(name))
            .cloned()
    }

    /// All instances of a build, ordered by instance name.
    pub fn instances_for(&self, identity: BuildIdentity) -> Vec<Arc<Mutex<T>>> {
        let state = self.lock();
        let Some(slot) = state.slots.get(&identity) else {
            return Vec::new();
        };
        let mut named: Vec<_> = slot.instances.iter().collect();
        named.sort_by(|a, b| a.0.cmp(b.0));
        named.into_iter().map(|(_, i)| Arc::clone(i)).collect()
    }

    /// Total number of cached instances across all builds.
    pub fn len(&self) -> usize {
        self.lock().slots.values().map(|s| s.instances.len()).sum()
    }

    /// Returns `true` if no instance is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
