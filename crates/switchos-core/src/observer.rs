// ── Refresh observers ──
//
// Non-owning registry of consumers that want a nudge after every refresh
// cycle. Observers pull the new state themselves through the coordinator.

use std::sync::{Arc, Weak};

use dashmap::DashMap;

/// Callback invoked once per completed refresh cycle, success or failure.
///
/// Carries no payload: implementations read `Coordinator::current_snapshot`
/// or `Coordinator::state` to see what changed. Must not block.
pub trait Observer: Send + Sync {
    fn handle_refresh(&self);
}

/// Observers keyed by allocation address, held weakly.
///
/// Registering the same `Arc` twice is a no-op; dropping the last strong
/// reference is equivalent to unregistering.
pub(crate) struct ObserverSet {
    entries: DashMap<usize, Weak<dyn Observer>>,
}

fn key_of<O: Observer + ?Sized>(observer: &Arc<O>) -> usize {
    Arc::as_ptr(observer).cast::<()>().addr()
}

impl ObserverSet {
    pub(crate) fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Returns `true` if the observer was not already registered.
    pub(crate) fn register<O: Observer + 'static>(&self, observer: &Arc<O>) -> bool {
        let as_dyn: Arc<dyn Observer> = Arc::clone(observer) as Arc<dyn Observer>;
        let weak = Arc::downgrade(&as_dyn);
        let previous = self.entries.insert(key_of(observer), weak);
        // A dead entry at the same address belonged to a dropped observer.
        !previous.is_some_and(|w| w.strong_count() > 0)
    }

    /// Returns `true` if the observer was registered.
    pub(crate) fn unregister<O: Observer + ?Sized>(&self, observer: &Arc<O>) -> bool {
        self.entries.remove(&key_of(observer)).is_some()
    }

    /// Invoke every live observer. Dead entries are pruned.
    ///
    /// The weak list is copied out before any callback runs, so callbacks
    /// may register or unregister (themselves included) without deadlocking
    /// on the map's shard locks.
    pub(crate) fn notify(&self) -> usize {
        let targets: Vec<(usize, Weak<dyn Observer>)> = self
            .entries
            .iter()
            .map(|e| (*e.key(), Weak::clone(e.value())))
            .collect();

        let mut notified = 0;
        for (key, weak) in targets {
            if let Some(observer) = weak.upgrade() {
                observer.handle_refresh();
                notified += 1;
            } else {
                self.entries.remove_if(&key, |_, w| w.strong_count() == 0);
            }
        }
        notified
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.value().strong_count() > 0)
            .count()
    }

    pub(crate) fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl Observer for Counter {
        fn handle_refresh(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn register_is_idempotent() {
        let set = ObserverSet::new();
        let counter = Arc::new(Counter::default());
        assert!(set.register(&counter));
        assert!(!set.register(&counter));
        assert_eq!(set.notify(), 1);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unregister_is_idempotent() {
        let set = ObserverSet::new();
        let counter = Arc::new(Counter::default());
        set.register(&counter);
        assert!(set.unregister(&counter));
        assert!(!set.unregister(&counter));
        assert_eq!(set.notify(), 0);
    }

    #[test]
    fn dropped_observers_are_not_kept_alive() {
        let set = ObserverSet::new();
        let counter = Arc::new(Counter::default());
        set.register(&counter);
        drop(counter);
        assert_eq!(set.len(), 0);
        assert_eq!(set.notify(), 0);
        assert!(set.entries.is_empty());
    }

    struct SelfRemoving {
        set: Arc<ObserverSet>,
        me: std::sync::Mutex<Option<Weak<SelfRemoving>>>,
        calls: AtomicUsize,
    }

    impl Observer for SelfRemoving {
        fn handle_refresh(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let me = self.me.lock().ok().and_then(|m| m.as_ref().and_then(Weak::upgrade));
            if let Some(me) = me {
                self.set.unregister(&me);
            }
        }
    }

    #[test]
    fn observer_may_unregister_itself_during_notification() {
        let set = Arc::new(ObserverSet::new());
        let observer = Arc::new(SelfRemoving {
            set: Arc::clone(&set),
            me: std::sync::Mutex::new(None),
            calls: AtomicUsize::new(0),
        });
        if let Ok(mut me) = observer.me.lock() {
            *me = Some(Arc::downgrade(&observer));
        }
        set.register(&observer);

        assert_eq!(set.notify(), 1);
        assert_eq!(set.notify(), 0);
        assert_eq!(observer.calls.load(Ordering::SeqCst), 1);
    }
}
