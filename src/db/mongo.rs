//! MongoDB-backed user store

use std::time::Duration;

use bson::{doc, oid::ObjectId, Document};
use mongodb::{
    error::{ErrorKind, WriteFailure},
    options::{ClientOptions, Credential},
    Client, Collection,
};
use tracing::info;

use super::user_doc::{self, UserDoc, RATINGS_COLLECTION};
use super::{StoreError, UserStore};
use crate::config::MongoConfig;
use crate::models::user_record::{Identity, UserRecord};

const APP_NAME: &str = "myday-service";
const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    db_name: String,
    collection: Collection<Document>,
}

impl MongoStore {
    /// Connect, verify the server answers a ping, and ensure the username index.
    pub async fn connect(
        config: &MongoConfig,
        connect_timeout: Duration,
    ) -> Result<Self, StoreError> {
        info!("Connecting to MongoDB at {}", config.uri);

        let mut options = ClientOptions::parse(&config.uri).await?;
        options.app_name = Some(APP_NAME.to_string());
        options.connect_timeout = Some(connect_timeout);
        options.server_selection_timeout = Some(connect_timeout);
        if let Some(username) = &config.username {
            let mut credential = Credential::default();
            credential.username = Some(username.clone());
            credential.password = config.password.clone();
            options.credential = Some(credential);
        }

        let client = Client::with_options(options)?;
        let database = client.database(&config.database);

        tokio::time::timeout(connect_timeout, database.run_command(doc! { "ping": 1 }))
            .await
            .map_err(|_| StoreError::Timeout)??;

        let collection = database.collection::<Document>(RATINGS_COLLECTION);
        collection.create_index(user_doc::username_index()).await?;

        info!("Connected to MongoDB database '{}'", config.database);

        Ok(Self {
            client,
            db_name: config.database.clone(),
            collection,
        })
    }

    pub async fn shutdown(self) {
        self.client.shutdown().await;
        info!("Closed MongoDB connection");
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

#[async_trait::async_trait]
impl UserStore for MongoStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let found = self
            .collection
            .find_one(doc! { "Username": username })
            .await?;

        Ok(found.and_then(|document| user_doc::decode_user(document, username)))
    }

    async fn insert(&self, record: &UserRecord) -> Result<ObjectId, StoreError> {
        if record.identity != Identity::Unassigned {
            return Err(StoreError::IdentityAssigned);
        }

        let id = ObjectId::new();
        let mut new_doc = UserDoc::from(record);
        new_doc.id = Some(id);
        let document = bson::to_document(&new_doc)?;

        match self.collection.insert_one(document).await {
            Ok(_) => Ok(id),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Duplicate),
            Err(e) => Err(e.into()),
        }
    }

    async fn replace(&self, record: &UserRecord) -> Result<(), StoreError> {
        let id = record
            .identity
            .object_id()
            .ok_or(StoreError::IdentityUnassigned)?;
        let document = bson::to_document(&UserDoc::from(record))?;

        let result = self
            .collection
            .replace_one(doc! { "_id": id }, document)
            .await?;

        if result.matched_count == 0 {
            return Err(StoreError::Missing(id));
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .database(&self.db_name)
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }
}

