use std::sync::{Arc, RwLock};

use super::{read, write, InstanceError};

/// Holder for a single shared instance of `T`.
#[derive(Debug)]
pub struct Singleton<T> {
    slot: RwLock<Option<Arc<T>>>,
}

impl<T> Singleton<T> {
    pub const fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// Returns the instance if one has been created.
    pub fn get(&self) -> Option<Arc<T>> {
        read(&self.slot).clone()
    }

    /// Returns the instance, creating it with `init` on first use.
    ///
    /// `init` runs at most once while no instance exists; concurrent callers
    /// wait for it and then share its result.
    pub fn get_or_try_init<F, E>(&self, init: F) -> Result<Arc<T>, InstanceError>
    where
        F: FnOnce() -> Result<T, E>,
        E: std::error::Error + Send + Sync + 'static,
    {
        if let Some(instance) = self.get() {
            return Ok(instance);
        }

        let mut slot = write(&self.slot);
        if let Some(instance) = slot.as_ref() {
            return Ok(Arc::clone(instance));
        }
        let instance = Arc::new(init().map_err(InstanceError::new::<T, E>)?);
        *slot = Some(Arc::clone(&instance));
        Ok(instance)
    }

    /// Installs `value` as the instance, returning the previous one.
    ///
    /// Handles obtained earlier keep pointing at the old instance.
    pub fn replace(&self, value: T) -> Option<Arc<T>> {
        write(&self.slot).replace(Arc::new(value))
    }

    /// Installs `value` as the instance and returns a handle to it.
    pub fn set(&self, value: T) -> Arc<T> {
        let instance = Arc::new(value);
        *write(&self.slot) = Some(Arc::clone(&instance));
        instance
    }

    /// Drops the held instance so the next access re-initializes.
    pub fn reset(&self) -> Option<Arc<T>> {
        write(&self.slot).take()
    }
}

impl<T> Default for Singleton<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Counter(usize);

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn test_init_runs_once() {
        let singleton = Singleton::new();
        let calls = AtomicUsize::new(0);
        let init = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Infallible>(Counter(7))
        };

        let a = singleton.get_or_try_init(init).unwrap();
        let b = singleton.get_or_try_init(init).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.0, 7);
    }

    #[test]
    fn test_replace_forces_new_instance() {
        let singleton = Singleton::new();
        let old = singleton
            .get_or_try_init(|| Ok::<_, Infallible>(Counter(1)))
            .unwrap();

        let previous = singleton.replace(Counter(2)).unwrap();

        assert!(Arc::ptr_eq(&old, &previous));
        assert_eq!(singleton.get().unwrap().0, 2);
        assert_eq!(old.0, 1);
    }

    #[test]
    fn test_failed_init_leaves_slot_empty() {
        let singleton: Singleton<Counter> = Singleton::new();
        let err = singleton.get_or_try_init(|| Err(Boom)).unwrap_err();

        assert!(err.type_name.ends_with("Counter"));
        assert!(err.to_string().contains("boom"));
        assert!(singleton.get().is_none());
    }

    #[test]
    fn test_set_returns_installed_handle() {
        let singleton = Singleton::new();
        let handle = singleton.set(Counter(5));
        assert!(Arc::ptr_eq(&handle, &singleton.get().unwrap()));
    }

    #[test]
    fn test_reset() {
        let singleton = Singleton::new();
        singleton.replace(Counter(3));
        assert!(singleton.reset().is_some());
        assert!(singleton.get().is_none());
    }
}
