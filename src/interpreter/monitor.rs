use parking_lot::{Mutex, ReentrantMutex};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Re-entrant locks keyed by object identity, backing `synchronized`.
#[derive(Default)]
pub(crate) struct Monitors {
    locks: Mutex<FxHashMap<usize, Arc<ReentrantMutex<()>>>>,
}

impl Monitors {
    pub(crate) fn monitor(&self, id: usize) -> Arc<ReentrantMutex<()>> {
        self.locks.lock().entry(id).or_default().clone()
    }

    /// Drops the caller's handle and forgets the monitor once nobody else holds it.
    pub(crate) fn release(&self, id: usize, monitor: Arc<ReentrantMutex<()>>) {
        drop(monitor);
        let mut locks = self.locks.lock();
        if locks.get(&id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&id);
        }
    }

    /// Forgets monitors nobody is holding.
    pub(crate) fn prune(&self) {
        self.locks.lock().retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monitors_are_reentrant_per_identity() {
        let monitors = Monitors::default();
        let a = monitors.monitor(1);
        let outer = a.lock();
        let again = monitors.monitor(1);
        let inner = again.lock();
        assert!(Arc::ptr_eq(&a, &again));
        drop(inner);
        drop(outer);
        assert!(!Arc::ptr_eq(&a, &monitors.monitor(2)));
        drop(a);
        drop(again);
        monitors.prune();
        assert!(monitors.locks.lock().is_empty());
    }

    #[test]
    fn released_monitors_are_forgotten_once_idle() {
        let monitors = Monitors::default();
        let outer = monitors.monitor(7);
        let inner = monitors.monitor(7);
        monitors.release(7, inner);
        assert_eq!(monitors.locks.lock().len(), 1);
        monitors.release(7, outer);
        assert!(monitors.locks.lock().is_empty());
    }
}
