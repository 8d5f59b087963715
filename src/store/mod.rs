//! Persistence of group snapshots.
//!
//! Every write is a whole-group overwrite guarded by the group's `version`:
//! a save only lands if nobody else has saved the group since it was loaded.

use std::ops::Deref;
use std::sync::Arc;

use mongodb::error::Error as DbError;
use thiserror::Error;

use crate::model::{common::GroupId, db::Group};

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoGroupStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Group {0} not found")]
    NotFound(GroupId),
    #[error("Group {group_id} was modified concurrently (expected version {expected})")]
    Conflict { group_id: GroupId, expected: i64 },
    #[error("A group with ID {0} already exists")]
    Duplicate(GroupId),
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Somewhere group snapshots live.
#[rocket::async_trait]
pub trait GroupStore: Send + Sync {
    /// Fetch the latest snapshot of a group.
    async fn load_group(&self, id: &str) -> Result<Option<Group>, StoreError>;

    /// Overwrite the stored group with `group`, provided the stored version still
    /// equals `group.version`. Returns the new version.
    async fn save_group(&self, group: &Group) -> Result<i64, StoreError>;

    /// Store a brand new group.
    async fn insert_group(&self, group: &Group) -> Result<(), StoreError>;

    /// Remove a group. Returns false if there was nothing to remove.
    async fn delete_group(&self, id: &str) -> Result<bool, StoreError>;

    async fn list_groups(&self) -> Result<Vec<Group>, StoreError>;

    /// Timer-mode groups that are still in the suggestion phase.
    async fn timed_suggestion_groups(&self) -> Result<Vec<Group>, StoreError>;
}

/// Shared handle on the configured [`GroupStore`].
#[derive(Clone)]
pub struct Store(Arc<dyn GroupStore>);

impl Store {
    pub fn new(store: impl GroupStore + 'static) -> Self {
        Self(Arc::new(store))
    }
}

impl Deref for Store {
    type Target = dyn GroupStore;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}
