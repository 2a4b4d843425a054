//! Per-vault write serialisation.
//!
//! Mutating operations on one vault (`save`, a transform batch) hold that
//! vault's lock for their whole duration. Operations on different vaults
//! never contend. The guard releases on drop, on success and error paths alike.
//!
//! The lock is in-process only; two processes sharing a data root are not
//! coordinated.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of per-vault async mutexes keyed by vault identity.
#[derive(Default)]
pub struct VaultLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl VaultLocks {
    /// Create an empty lock registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to the vault identified by `key`.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
