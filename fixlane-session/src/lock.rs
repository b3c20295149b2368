/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! Send-in-progress critical section.
//!
//! The session engine holds the [`SendLock`] while it stamps and writes an
//! outgoing message. Sequence corrections are applied only through a
//! [`SendGuard`], so they can never interleave with a send. The guard
//! releases the lock when dropped, on every exit path.

use parking_lot::{Mutex, MutexGuard};

/// Per-session send lock.
#[derive(Debug, Default)]
pub struct SendLock {
    inner: Mutex<()>,
}

impl SendLock {
    /// Creates an unlocked send lock.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(()),
        }
    }

    /// Blocks until the lock is acquired.
    pub fn lock(&self) -> SendGuard<'_> {
        SendGuard {
            _guard: self.inner.lock(),
        }
    }

    /// Acquires the lock if it is free.
    pub fn try_lock(&self) -> Option<SendGuard<'_>> {
        self.inner.try_lock().map(|guard| SendGuard { _guard: guard })
    }

    /// Runs `f` inside the critical section.
    pub fn with<R>(&self, f: impl FnOnce(&SendGuard<'_>) -> R) -> R {
        let guard = self.lock();
        f(&guard)
    }

    /// Returns true while a guard is alive.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }
}

/// Proof that the send lock is held.
#[derive(Debug)]
pub struct SendGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_releases_on_drop() {
        let lock = SendLock::new();
        {
            let _guard = lock.lock();
            assert!(lock.is_locked());
            assert!(lock.try_lock().is_none());
        }
        assert!(!lock.is_locked());
        assert!(lock.try_lock().is_some());
    }

    #[test]
    fn test_with_releases_after_closure() {
        let lock = SendLock::new();
        let value = lock.with(|_| {
            assert!(lock.is_locked());
            7
        });
        assert_eq!(value, 7);
        assert!(!lock.is_locked());
    }
}
