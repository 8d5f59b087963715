use mongodb::{
    bson::doc,
    error::{Error as DbError, ErrorKind, WriteFailure},
    Database,
};
use rocket::futures::TryStreamExt;

use crate::model::{common::GroupState, db::Group, mongodb::Coll};

use super::{GroupStore, StoreError};

/// Groups stored as whole documents in the `groups` collection.
#[derive(Clone)]
pub struct MongoGroupStore {
    groups: Coll<Group>,
}

impl MongoGroupStore {
    pub fn new(db: &Database) -> Self {
        Self {
            groups: Coll::from_db(db),
        }
    }
}

#[rocket::async_trait]
impl GroupStore for MongoGroupStore {
    async fn load_group(&self, id: &str) -> Result<Option<Group>, StoreError> {
        Ok(self.groups.find_one(doc! { "_id": id }, None).await?)
    }

    async fn save_group(&self, group: &Group) -> Result<i64, StoreError> {
        let mut replacement = group.clone();
        replacement.version = group.version + 1;
        let filter = doc! {
            "_id": &group.id,
            "version": group.version,
        };
        let result = self.groups.replace_one(filter, &replacement, None).await?;
        if result.matched_count == 1 {
            return Ok(replacement.version);
        }
        // Work out why nothing matched.
        let exists = self
            .groups
            .count_documents(doc! { "_id": &group.id }, None)
            .await?
            > 0;
        if exists {
            Err(StoreError::Conflict {
                group_id: group.id.clone(),
                expected: group.version,
            })
        } else {
            Err(StoreError::NotFound(group.id.clone()))
        }
    }

    async fn insert_group(&self, group: &Group) -> Result<(), StoreError> {
        match self.groups.insert_one(group, None).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Duplicate(group.id.clone())),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_group(&self, id: &str) -> Result<bool, StoreError> {
        let result = self.groups.delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count == 1)
    }

    async fn list_groups(&self) -> Result<Vec<Group>, StoreError> {
        Ok(self.groups.find(None, None).await?.try_collect().await?)
    }

    async fn timed_suggestion_groups(&self) -> Result<Vec<Group>, StoreError> {
        let filter = doc! {
            "timer_mode": true,
            "state": GroupState::Suggestion,
        };
        Ok(self.groups.find(filter, None).await?.try_collect().await?)
    }
}

/// Whether the write failed because the `_id` was already taken.
fn is_duplicate_key(err: &DbError) -> bool {
    matches!(&*err.kind, ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == 11000)
}
