use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::sync::Arc;

/// A handle to a named lock that can be stored and reused.
#[derive(Clone)]
pub struct LockHandle {
    lock: Arc<Mutex<()>>,
}

impl LockHandle {
    /// Acquires the lock, blocking until it is available.
    pub fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock()
    }
}

/// Registry of named mutual-exclusion locks.
///
/// Registrations against the same view name and collection setup for the same
/// collection name are serialized through the lock registered under that
/// name, while work on different names proceeds in parallel.
///
/// # Examples
///
/// ```
/// use arango_odm::common::LockRegistry;
/// let lock_registry = LockRegistry::new();
/// let handle = lock_registry.get_lock("commonView");
/// {
///     let _guard = handle.lock();
/// } // lock is held while _guard is in scope
/// ```
#[derive(Clone)]
pub struct LockRegistry {
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl LockRegistry {
    /// Creates a new empty lock registry.
    pub fn new() -> Self {
        LockRegistry {
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Gets the lock registered under `name`, creating it on first use.
    pub fn get_lock(&self, name: &str) -> LockHandle {
        let lock = {
            let mut locks = self.locks.lock();
            locks
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        LockHandle { lock }
    }

    /// Returns the number of locks currently registered.
    pub fn lock_count(&self) -> usize {
        self.locks.lock().len()
    }
}

impl Default for LockRegistry {
    fn default() -> Self {
        Self::new()
    }
}
