//! Shared-instance holders.
//!
//! [`Singleton`] keeps at most one instance of a type and [`Multiton`] keeps
//! one instance per string key. Both are usable as `static` items and hand
//! out `Arc` handles, so an instance is never duplicated by value.
//!
//! ```
//! use bluewater::instance::Singleton;
//!
//! #[derive(Debug)]
//! struct Registry { name: &'static str }
//!
//! static REGISTRY: Singleton<Registry> = Singleton::new();
//!
//! let first = REGISTRY
//!     .get_or_try_init(|| Ok::<_, std::convert::Infallible>(Registry { name: "main" }))?;
//! let again = REGISTRY.get().unwrap();
//! assert!(std::sync::Arc::ptr_eq(&first, &again));
//! # Ok::<(), bluewater::instance::InstanceError>(())
//! ```

mod multiton;
mod singleton;

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

pub use multiton::Multiton;
pub use singleton::Singleton;

/// Failure to construct a shared instance.
#[derive(Debug, Error)]
#[error("failed to create an instance of {type_name}: {source}")]
pub struct InstanceError {
    pub type_name: &'static str,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl InstanceError {
    fn new<T, E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            type_name: std::any::type_name::<T>(),
            source: Box::new(source),
        }
    }
}

// A panic inside an init closure poisons the lock; the guarded data is
// still consistent because it is only assigned after init succeeds.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
