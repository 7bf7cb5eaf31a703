//! Per-user serialisation of cache writes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::UserId;

/// One mutex per user id.
///
/// Writers that replace a user's rows hold that user's lock for the whole
/// replacement. Different users never contend. A poisoned lock is recovered,
/// since the guarded state is `()` and carries no invariant.
///
/// # Examples
/// ```
/// use homerank_core::{UserId, UserLocks};
///
/// let locks = UserLocks::new();
/// let total = locks.with_lock(UserId(1), || 2 + 2);
/// assert_eq!(total, 4);
/// ```
#[derive(Debug, Default)]
pub struct UserLocks {
    inner: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl UserLocks {
    /// Create an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, user: UserId) -> Arc<Mutex<()>> {
        let mut table = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(table.entry(user).or_default())
    }

    /// Run `f` while holding `user`'s lock.
    pub fn with_lock<R>(&self, user: UserId, f: impl FnOnce() -> R) -> R {
        let lock = self.lock_for(user);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }
}
