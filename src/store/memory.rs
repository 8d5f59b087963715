use std::collections::HashMap;
use std::sync::Arc;

use rocket::tokio::sync::Mutex;

use crate::model::{
    common::{GroupId, GroupState},
    db::Group,
};

use super::{GroupStore, StoreError};

/// A process-local store, used when no database is configured and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    groups: Arc<Mutex<HashMap<GroupId, Group>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored groups.
    pub async fn len(&self) -> usize {
        self.groups.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[rocket::async_trait]
impl GroupStore for MemoryStore {
    async fn load_group(&self, id: &str) -> Result<Option<Group>, StoreError> {
        Ok(self.groups.lock().await.get(id).cloned())
    }

    async fn save_group(&self, group: &Group) -> Result<i64, StoreError> {
        let mut groups = self.groups.lock().await;
        let stored = groups
            .get_mut(&group.id)
            .ok_or_else(|| StoreError::NotFound(group.id.clone()))?;
        if stored.version != group.version {
            return Err(StoreError::Conflict {
                group_id: group.id.clone(),
                expected: group.version,
            });
        }
        *stored = group.clone();
        stored.version = group.version + 1;
        Ok(stored.version)
    }

    async fn insert_group(&self, group: &Group) -> Result<(), StoreError> {
        let mut groups = self.groups.lock().await;
        if groups.contains_key(&group.id) {
            return Err(StoreError::Duplicate(group.id.clone()));
        }
        groups.insert(group.id.clone(), group.clone());
        Ok(())
    }

    async fn delete_group(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.groups.lock().await.remove(id).is_some())
    }

    async fn list_groups(&self) -> Result<Vec<Group>, StoreError> {
        let mut groups: Vec<_> = self.groups.lock().await.values().cloned().collect();
        groups.sort_by(|a, b| a.creation_time.cmp(&b.creation_time).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn timed_suggestion_groups(&self) -> Result<Vec<Group>, StoreError> {
        Ok(self
            .list_groups()
            .await?
            .into_iter()
            .filter(|g| g.timer_mode && g.state == GroupState::Suggestion)
            .collect())
    }
}
