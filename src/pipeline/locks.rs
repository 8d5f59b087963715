use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use rocket::tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::model::common::GroupId;

type LockMap = HashMap<GroupId, Arc<AsyncMutex<()>>>;

/// One exclusive lock per group.
///
/// Anything that loads, modifies and saves a group must hold that group's lock
/// for the whole sequence. Different groups never contend with each other.
#[derive(Debug, Clone, Default)]
pub struct GroupLocks {
    locks: Arc<Mutex<LockMap>>,
}

/// Exclusive access to one group, released on drop.
#[derive(Debug)]
pub struct GroupGuard {
    _guard: OwnedMutexGuard<()>,
}

impl GroupLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to the given group.
    pub async fn lock(&self, group_id: &str) -> GroupGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries only referenced by the map are neither held nor awaited.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(group_id.to_string())
                .or_insert_with(Default::default)
                .clone()
        };
        GroupGuard {
            _guard: lock.lock_owned().await,
        }
    }

    /// Number of groups with a lock currently held or awaited.
    #[cfg(test)]
    fn active(&self) -> usize {
        let locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }
}
