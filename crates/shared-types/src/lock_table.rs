//! # Keyed Row Locking
//!
//! Emulates database row-level locking for stores that live outside a
//! relational engine. Each (customer, group) or (shop, group) key maps to
//! an async-aware mutex; holding the guard serializes every
//! read-modify-write on that row while operations on other keys proceed
//! independently.
//!
//! Lock waits are bounded: a caller that cannot acquire the row within its
//! deadline gets `WaitExpired` and may retry. A timeout never force-releases
//! the current holder's guard.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Errors from row lock acquisition.
#[derive(Debug, Error)]
pub enum LockTableError {
    /// The bounded wait elapsed while another operation held the row.
    #[error("row lock wait expired after {waited_ms}ms")]
    WaitExpired {
        /// How long the caller waited before giving up.
        waited_ms: u64,
    },

    /// The table's own registry mutex was poisoned by a panicking thread.
    #[error("lock table poisoned")]
    Poisoned,
}

/// Exclusive hold on one row. Released on drop.
#[derive(Debug)]
pub struct RowGuard {
    _guard: OwnedMutexGuard<()>,
}

/// Map from row key to an async mutex.
///
/// Entries are created on first contact and retained for the life of the
/// table, matching the stores it guards: ledger rows are never deleted.
pub struct KeyedLockTable<K> {
    entries: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K> KeyedLockTable<K>
where
    K: Eq + Hash + Clone,
{
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the row lock for `key`, waiting at most `wait`.
    ///
    /// The registry mutex is held only long enough to fetch or insert the
    /// row's entry; the (potentially long) wait happens on the row mutex
    /// itself, so acquiring one key never blocks traffic on another.
    pub async fn acquire(&self, key: &K, wait: Duration) -> Result<RowGuard, LockTableError> {
        let entry = {
            let mut entries = self.entries.lock().map_err(|_| LockTableError::Poisoned)?;
            entries
                .entry(key.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        match tokio::time::timeout(wait, entry.lock_owned()).await {
            Ok(guard) => Ok(RowGuard { _guard: guard }),
            Err(_) => Err(LockTableError::WaitExpired {
                waited_ms: wait.as_millis() as u64,
            }),
        }
    }

    /// Number of keys ever locked (for diagnostics).
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// True if no key has been locked yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K> Default for KeyedLockTable<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
