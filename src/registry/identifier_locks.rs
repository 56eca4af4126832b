use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

struct LockEntry {
    lock: Arc<AsyncMutex<()>>,
    /// Holders plus waiters
    users: usize,
}

type LockMap = Arc<Mutex<HashMap<String, LockEntry>>>;

/// Hands out one async lock per key, so runs for the same resource never
/// interleave their DELETE and INSERT phases. Runs for different keys proceed
/// in parallel. Entries are dropped once nobody holds or waits on them.
#[derive(Clone, Default)]
pub struct IdentifierLocks {
    locks: LockMap,
}

/// One holder or waiter on a key. Dropping it, including when an `acquire`
/// future is cancelled mid-wait, releases the key's entry if it was the last.
struct Registration {
    key: String,
    locks: LockMap,
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = locks.get_mut(&self.key) {
            entry.users = entry.users.saturating_sub(1);
            if entry.users == 0 {
                locks.remove(&self.key);
            }
        }
    }
}

/// Held for the duration of one run. Releases the key on drop.
pub struct IdentifierGuard {
    // Field order matters: the lock is released before the entry is.
    _guard: OwnedMutexGuard<()>,
    _registration: Registration,
}

impl IdentifierLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other run holds `key`, then hold it.
    pub async fn acquire(&self, key: &str) -> IdentifierGuard {
        let (lock, registration) = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            let entry = locks
                .entry(key.to_string())
                .or_insert_with(|| LockEntry { lock: Arc::default(), users: 0 });
            entry.users += 1;
            let registration =
                Registration { key: key.to_string(), locks: Arc::clone(&self.locks) };
            (Arc::clone(&entry.lock), registration)
        };

        let guard = lock.lock_owned().await;
        IdentifierGuard { _guard: guard, _registration: registration }
    }

    /// Number of keys currently held or waited on.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
