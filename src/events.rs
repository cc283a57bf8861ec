//! Process-local publish/subscribe for ledger events.
//!
//! Delivery is synchronous, best-effort, and at-most-once: subscribers treat
//! events as a hint to refresh, never as a source of truth. Nothing here is
//! persisted, and emission never affects the outcome of a committed
//! transaction.

use std::{
    collections::HashMap,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{Arc, Mutex},
};

use log::warn;

/// Emitted after a vote transaction commits (cast, re-vote, or retraction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteCast {
    pub session_id: String,
    pub session_owner_id: String,
}

/// Handle returned by [`EventBus::subscribe`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Arc<dyn Fn(&VoteCast) + Send + Sync + 'static>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: HashMap<u64, Callback>,
}

#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&VoteCast) + Send + Sync + 'static,
    {
        let mut registry = self.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.subscribers.insert(id, Arc::new(callback));
        SubscriptionId(id)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.lock().subscribers.remove(&id.0);
    }

    /// Delivers `event` to every live subscriber. A panicking subscriber is
    /// caught, logged, and skipped so it cannot disturb the caller or the
    /// remaining subscribers.
    pub fn emit(&self, event: &VoteCast) {
        // Snapshot the subscriber list so callbacks run without the registry
        // lock held; a subscriber may itself subscribe or unsubscribe.
        let callbacks: Vec<Callback> = self.lock().subscribers.values().cloned().collect();
        for callback in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                warn!(
                    "vote-cast subscriber panicked for session {}; skipping",
                    event.session_id
                );
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
