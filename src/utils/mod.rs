pub mod constants;
pub mod errors;

pub use errors::SimError;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks in this crate are held only for short copy-in/copy-out sections;
/// a poisoned lock still holds usable data, so recover it instead of
/// propagating the panic across threads
pub(crate) fn lock_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
