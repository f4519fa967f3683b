//! Page scroll lock held while a modal is open.
//!
//! Every open modal holds a [`ScrollLockGuard`]; scrolling stays locked while
//! at least one guard is alive and unlocks when the last one is dropped, so
//! closing the modal and tearing down the view both release it.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

#[derive(Debug, Clone, Default)]
pub struct ScrollLock {
    holders: Arc<AtomicUsize>,
}

impl ScrollLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self) -> ScrollLockGuard {
        self.holders.fetch_add(1, Ordering::AcqRel);
        ScrollLockGuard {
            holders: Arc::clone(&self.holders),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.holders.load(Ordering::Acquire) > 0
    }
}

#[must_use = "the scroll lock is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ScrollLockGuard {
    holders: Arc<AtomicUsize>,
}

impl Drop for ScrollLockGuard {
    fn drop(&mut self) {
        self.holders.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_when_last_guard_drops() {
        let lock = ScrollLock::new();
        assert!(!lock.is_locked());

        let outer = lock.acquire();
        let inner = lock.clone().acquire();
        assert!(lock.is_locked());

        drop(outer);
        assert!(lock.is_locked());
        drop(inner);
        assert!(!lock.is_locked());
    }

    #[test]
    fn released_on_unwind() {
        let lock = ScrollLock::new();
        let handle = lock.clone();
        let result = std::panic::catch_unwind(move || {
            let _guard = handle.acquire();
            panic!("modal teardown");
        });
        assert!(result.is_err());
        assert!(!lock.is_locked());
    }
}
