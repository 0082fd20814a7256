use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use super::{read, write, InstanceError};

/// Holder for named shared instances of `T`, one per key.
#[derive(Debug)]
pub struct Multiton<T> {
    instances: RwLock<BTreeMap<String, Arc<T>>>,
}

impl<T> Multiton<T> {
    pub const fn new() -> Self {
        Self {
            instances: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        read(&self.instances).get(key).cloned()
    }

    /// Returns the instance for `key`, creating it with `init` on first use.
    pub fn get_or_try_init<F, E>(&self, key: &str, init: F) -> Result<Arc<T>, InstanceError>
    where
        F: FnOnce() -> Result<T, E>,
        E: std::error::Error + Send + Sync + 'static,
    {
        if let Some(instance) = self.get(key) {
            return Ok(instance);
        }

        let mut instances = write(&self.instances);
        if let Some(instance) = instances.get(key) {
            return Ok(Arc::clone(instance));
        }
        let instance = Arc::new(init().map_err(InstanceError::new::<T, E>)?);
        instances.insert(key.to_string(), Arc::clone(&instance));
        Ok(instance)
    }

    /// Stores `value` under `key`, returning the instance it replaced.
    pub fn insert(&self, key: impl Into<String>, value: T) -> Option<Arc<T>> {
        write(&self.instances).insert(key.into(), Arc::new(value))
    }

    pub fn remove(&self, key: &str) -> Option<Arc<T>> {
        write(&self.instances).remove(key)
    }

    /// Keys of all live instances, in sorted order.
    pub fn keys(&self) -> Vec<String> {
        read(&self.instances).keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        read(&self.instances).len()
    }

    pub fn is_empty(&self) -> bool {
        read(&self.instances).is_empty()
    }
}

impl<T> Default for Multiton<T> {
    fn default() -> Self {
        Self::new()
    }
}
