//! Mutual exclusion keyed by patron and book identifiers.
//!
//! Borrow and return hold the lock of the patron and of the book for the whole
//! check-then-mutate sequence. Unrelated patrons and books never contend.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;

/// Keys are always acquired in `Ord` order, so two callers can never wait on
/// each other in a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LockKey {
    Patron(String),
    Book(i64),
}

type Slot = Arc<Mutex<()>>;

#[derive(Debug, Default)]
pub struct KeyedLocks {
    slots: DashMap<LockKey, Slot>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for every key in `keys`.
    pub fn with_locked<R>(&self, keys: &[LockKey], f: impl FnOnce() -> R) -> R {
        let mut keys = keys.to_vec();
        keys.sort();
        keys.dedup();

        let slots: Vec<Slot> = keys.iter().map(|key| self.slot(key)).collect();
        let result = {
            let _guards: Vec<MutexGuard<'_, ()>> = slots
                .iter()
                .map(|slot| slot.lock().unwrap_or_else(PoisonError::into_inner))
                .collect();
            f()
        };
        drop(slots);
        self.release(&keys);
        result
    }

    /// Number of keys currently tracked. Idle keys are dropped on release.
    pub fn tracked(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, key: &LockKey) -> Slot {
        Arc::clone(self.slots.entry(key.clone()).or_default().value())
    }

    fn release(&self, keys: &[LockKey]) {
        for key in keys {
            // Only the map itself still references an idle slot.
            self.slots.remove_if(key, |_, slot| Arc::strong_count(slot) == 1);
        }
    }
}
