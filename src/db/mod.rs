//! Persistence for user records.
//!
//! Handlers and services talk to [`UserStore`]; `MongoStore` is the production
//! backend and `MemoryStore` backs the tests.

#[cfg(test)]
pub mod memory;
pub mod mongo;
pub mod user_doc;

use bson::oid::ObjectId;

use crate::models::user_record::UserRecord;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store operation timed out")]
    Timeout,

    #[error("a record with this username already exists")]
    Duplicate,

    #[error("record has no identity and must be inserted first")]
    IdentityUnassigned,

    #[error("record already has an identity and must be replaced")]
    IdentityAssigned,

    #[error("no document with _id {0}")]
    Missing(ObjectId),

    #[error("failed to encode document: {0}")]
    Encode(#[from] bson::ser::Error),

    #[error("mongodb: {0}")]
    Mongo(#[from] mongodb::error::Error),
}

/// Document-per-user storage keyed by username.
///
/// `insert` takes an `Unassigned` record and returns the identity it was
/// stored under. `replace` overwrites the whole document addressed by an
/// `Assigned` identity; there is no narrower update, so concurrent replaces
/// of the same record are last-writer-wins.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Absent and undecodable documents both yield `None`.
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn insert(&self, record: &UserRecord) -> Result<ObjectId, StoreError>;

    async fn replace(&self, record: &UserRecord) -> Result<(), StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
