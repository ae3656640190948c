//! Synchronization utilities for lock poisoning
//!
//! A poisoned queue lock means a thread panicked mid-mutation, typically an
//! accounting invariant failure. These helpers turn the poison into an error
//! value so callers surface it instead of unwrapping.

use std::sync::{LockResult, RwLockReadGuard, RwLockWriteGuard};

/// Convert a poisoned RwLock read into an application error
///
/// # Examples
/// ```
/// use std::sync::RwLock;
/// use listqueue::core::sync::handle_rwlock_read;
/// use listqueue::queue::QueueError;
///
/// let lock = RwLock::new(42);
/// let guard = handle_rwlock_read(lock.read(), |message| QueueError::LockPoisoned { message })
///     .unwrap();
/// assert_eq!(*guard, 42);
/// ```
pub fn handle_rwlock_read<T, E>(
    result: LockResult<RwLockReadGuard<T>>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<RwLockReadGuard<T>, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "RwLock read poisoned; a thread panicked while holding the write lock. PoisonError: {:?}",
            poison_err
        ))
    })
}

/// Convert a poisoned RwLock write into an application error
pub fn handle_rwlock_write<T, E>(
    result: LockResult<RwLockWriteGuard<T>>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<RwLockWriteGuard<T>, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "RwLock write poisoned; a thread panicked while holding the lock. PoisonError: {:?}",
            poison_err
        ))
    })
}
