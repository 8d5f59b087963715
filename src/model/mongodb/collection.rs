use std::ops::Deref;

use mongodb::{bson::doc, error::Error as DbError, Collection, Database, IndexModel};

use crate::model::db::Group;

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Group collection
const GROUPS: &str = "groups";
impl MongoCollection for Group {
    const NAME: &'static str = GROUPS;
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    // The phase scheduler sweeps timer-mode groups still in the suggestion phase.
    let sweep_index = IndexModel::builder()
        .keys(doc! {"timer_mode": 1, "state": 1})
        .build();
    Coll::<Group>::from_db(db)
        .create_index(sweep_index, None)
        .await?;

    Ok(())
}
