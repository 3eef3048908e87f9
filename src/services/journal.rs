//! Journal operations over a [`UserStore`].
//!
//! Every store call is bounded by the configured timeout. Nothing here locks
//! a user's record: `append` is fetch, mutate in memory, replace, so two
//! concurrent appends for the same user can lose one of the ratings.

use std::{future::Future, sync::Arc, time::Duration};

use tracing::{debug, info};

use crate::db::{StoreError, UserStore};
use crate::models::rating::Rating;
use crate::models::user_record::{Identity, UserRecord};

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("no user data for {0}")]
    NotFound(String),

    #[error("user data already exists for {0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct Journal {
    store: Arc<dyn UserStore>,
    timeout: Duration,
}

impl Journal {
    pub fn new(store: Arc<dyn UserStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        tokio::time::timeout(self.timeout, op)
            .await
            .map_err(|_| StoreError::Timeout)?
    }

    pub async fn fetch(&self, username: &str) -> Result<UserRecord, JournalError> {
        match self.bounded(self.store.find_by_username(username)).await? {
            Some(record) => {
                debug!(username, "User data found");
                Ok(record)
            }
            None => {
                info!(username, "No user data found");
                Err(JournalError::NotFound(username.to_string()))
            }
        }
    }

    /// Insert an empty record for `username` unless one already exists.
    pub async fn create(&self, username: &str) -> Result<UserRecord, JournalError> {
        match self.fetch(username).await {
            Ok(_) => {
                info!(username, "User data already exists");
                return Err(JournalError::Conflict(username.to_string()));
            }
            Err(JournalError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let mut record = UserRecord::new(username);
        let id = match self.bounded(self.store.insert(&record)).await {
            Ok(id) => id,
            Err(StoreError::Duplicate) => {
                return Err(JournalError::Conflict(username.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        record.identity = Identity::Assigned(id);

        info!(username, "New user data created");
        Ok(record)
    }

    /// Append `rating` to a fetched record and overwrite the stored document.
    pub async fn append(
        &self,
        mut record: UserRecord,
        rating: Rating,
    ) -> Result<UserRecord, JournalError> {
        record.push_rating(rating);
        self.bounded(self.store.replace(&record)).await?;
        Ok(record)
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.bounded(self.store.ping()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::models::rating_date::RatingDate;
    use bson::{doc, oid::ObjectId};

    fn journal(store: &MemoryStore) -> Journal {
        Journal::new(Arc::new(store.clone()), Duration::from_secs(5))
    }

    fn rating(day: u32, feeling: &str, tags: &[&str]) -> Rating {
        Rating {
            date: RatingDate::from_ymd(2024, 1, day).unwrap(),
            description: format!("day {day}"),
            feeling: feeling.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_fetch_absent_user_is_not_found() {
        let store = MemoryStore::new();
        let result = journal(&store).fetch("nobody").await;
        assert!(matches!(result, Err(JournalError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_then_duplicate_conflicts() {
        let store = MemoryStore::new();
        let journal = journal(&store);

        let created = journal.create("alice").await.unwrap();
        assert!(matches!(created.identity, Identity::Assigned(_)));
        assert!(created.ratings.is_empty());
        assert!(created.tags.is_empty());

        let again = journal.create("alice").await;
        assert!(matches!(again, Err(JournalError::Conflict(_))));
        assert_eq!(store.len().await, 1);
        assert_eq!(journal.fetch("alice").await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_append_accumulates_in_order() {
        let store = MemoryStore::new();
        let journal = journal(&store);
        journal.create("alice").await.unwrap();

        let record = journal.fetch("alice").await.unwrap();
        journal
            .append(record, rating(1, "Good", &["work"]))
            .await
            .unwrap();

        let record = journal.fetch("alice").await.unwrap();
        journal
            .append(record, rating(2, "Sad", &["work", "home"]))
            .await
            .unwrap();

        let stored = journal.fetch("alice").await.unwrap();
        assert_eq!(stored.ratings.len(), 2);
        assert_eq!(stored.ratings[0], rating(1, "Good", &["work"]));
        assert_eq!(stored.ratings[1], rating(2, "Sad", &["work", "home"]));
        assert_eq!(stored.tags, vec!["work", "home"]);
    }

    #[tokio::test]
    async fn test_append_keeps_identity() {
        let store = MemoryStore::new();
        let journal = journal(&store);
        let created = journal.create("bob").await.unwrap();

        let updated = journal
            .append(created.clone(), rating(3, "Bored", &[]))
            .await
            .unwrap();
        assert_eq!(updated.identity, created.identity);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_append_requires_assigned_identity() {
        let store = MemoryStore::new();
        let result = journal(&store)
            .append(UserRecord::new("ghost"), rating(1, "Good", &[]))
            .await;
        assert!(matches!(
            result,
            Err(JournalError::Store(StoreError::IdentityUnassigned))
        ));
    }

    #[tokio::test]
    async fn test_undecodable_record_reads_as_not_found() {
        let store = MemoryStore::new();
        let id = ObjectId::new();
        store
            .insert_raw(id, doc! { "_id": id, "Username": "eve", "Ratings": "oops" })
            .await;

        let result = journal(&store).fetch("eve").await;
        assert!(matches!(result, Err(JournalError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_over_undecodable_record_conflicts() {
        let store = MemoryStore::new();
        let id = ObjectId::new();
        store
            .insert_raw(id, doc! { "_id": id, "Username": "eve", "Tags": 7 })
            .await;

        let result = journal(&store).create("eve").await;
        assert!(matches!(result, Err(JournalError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_slow_store_times_out() {
        let store = MemoryStore::new().with_latency(Duration::from_millis(250));
        let journal = Journal::new(Arc::new(store), Duration::from_millis(20));

        let result = journal.fetch("alice").await;
        assert!(matches!(result, Err(JournalError::Store(StoreError::Timeout))));
        assert!(matches!(journal.ping().await, Err(StoreError::Timeout)));
    }

    /// Concurrent appends on the same fetched record race on the full-document
    /// replace; only last-writer-wins is guaranteed.
    #[tokio::test]
    async fn test_concurrent_appends_keep_at_least_one_rating() {
        let store = MemoryStore::new();
        let journal = journal(&store);
        let created = journal.create("alice").await.unwrap();
        let record = journal.fetch("alice").await.unwrap();

        let (a, b) = tokio::join!(
            journal.append(record.clone(), rating(1, "Good", &["x"])),
            journal.append(record, rating(2, "Sad", &["y"])),
        );
        a.unwrap();
        b.unwrap();

        let stored = journal.fetch("alice").await.unwrap();
        assert!(!stored.ratings.is_empty());
        assert!(stored.ratings.len() <= 2);
        assert_eq!(stored.identity, created.identity);
    }
}
