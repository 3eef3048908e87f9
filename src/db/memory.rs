//! In-process user store for tests.
//!
//! Keeps raw BSON documents so decoding runs through the same path as the
//! MongoDB backend, and enforces the unique-username rule the Mongo index does.

use std::{collections::HashMap, sync::Arc, time::Duration};

use bson::{oid::ObjectId, Document};
use tokio::sync::RwLock;

use super::user_doc::{self, UserDoc};
use super::{StoreError, UserStore};
use crate::models::user_record::{Identity, UserRecord};

#[derive(Clone, Default)]
pub struct MemoryStore {
    docs: Arc<RwLock<HashMap<ObjectId, Document>>>,
    latency: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every operation, to exercise timeouts.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Store a document verbatim, bypassing encoding.
    pub async fn insert_raw(&self, id: ObjectId, document: Document) {
        self.docs.write().await.insert(id, document);
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

fn username_of(document: &Document) -> Option<&str> {
    document.get_str("Username").ok()
}

#[async_trait::async_trait]
impl UserStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        self.simulate_latency().await;
        let docs = self.docs.read().await;
        let found = docs
            .values()
            .find(|d| username_of(d) == Some(username))
            .cloned();
        Ok(found.and_then(|document| user_doc::decode_user(document, username)))
    }

    async fn insert(&self, record: &UserRecord) -> Result<ObjectId, StoreError> {
        self.simulate_latency().await;
        if record.identity != Identity::Unassigned {
            return Err(StoreError::IdentityAssigned);
        }

        let mut docs = self.docs.write().await;
        if docs
            .values()
            .any(|d| username_of(d) == Some(record.username.as_str()))
        {
            return Err(StoreError::Duplicate);
        }

        let id = ObjectId::new();
        let mut new_doc = UserDoc::from(record);
        new_doc.id = Some(id);
        docs.insert(id, bson::to_document(&new_doc)?);
        Ok(id)
    }

    async fn replace(&self, record: &UserRecord) -> Result<(), StoreError> {
        self.simulate_latency().await;
        let id = record
            .identity
            .object_id()
            .ok_or(StoreError::IdentityUnassigned)?;
        let document = bson::to_document(&UserDoc::from(record))?;

        let mut docs = self.docs.write().await;
        match docs.get_mut(&id) {
            Some(slot) => {
                *slot = document;
                Ok(())
            }
            None => Err(StoreError::Missing(id)),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.simulate_latency().await;
        Ok(())
    }
}
