//! MongoDB-backed document store.
//!
//! Writes use `replace_one` with `upsert(true)`, so each call atomically
//! swaps the whole document matching the lookup filter or inserts the
//! record when nothing matches.

use mongodb::bson::{self, Document, doc};
use mongodb::sync::{Client, Collection, Database};
use pitlane_core::{DocumentStore, LookupKey, Record, StoreError, WriteOutcome};
use thiserror::Error;

use super::redact_credentials;

/// Errors raised while connecting to MongoDB.
#[derive(Debug, Error)]
pub enum MongoStoreError {
    /// The connection string was rejected by the driver.
    #[error("failed to configure MongoDB client for {uri}: {source}")]
    Configure {
        /// Connection string with credentials redacted.
        uri: String,
        /// Driver error.
        #[source]
        source: Box<mongodb::error::Error>,
    },
    /// The deployment did not answer a `ping`.
    #[error("MongoDB at {uri} is unreachable: {source}")]
    Unreachable {
        /// Connection string with credentials redacted.
        uri: String,
        /// Driver error.
        #[source]
        source: Box<mongodb::error::Error>,
    },
}

/// Document store writing into one MongoDB database.
#[derive(Debug, Clone)]
pub struct MongoDocumentStore {
    database: Database,
}

impl MongoDocumentStore {
    /// Connect to the deployment at `uri` and select `database`.
    ///
    /// The deployment is pinged once so that an unreachable server is
    /// reported here rather than on the first write.
    ///
    /// # Errors
    ///
    /// Returns [`MongoStoreError::Configure`] when the connection string is
    /// invalid and [`MongoStoreError::Unreachable`] when the ping fails.
    pub fn connect(uri: &str, database: &str) -> Result<Self, MongoStoreError> {
        let client =
            Client::with_uri_str(uri).map_err(|source| MongoStoreError::Configure {
                uri: redact_credentials(uri),
                source: Box::new(source),
            })?;
        let store = Self::from_database(client.database(database));
        store
            .database
            .run_command(doc! { "ping": 1 })
            .run()
            .map_err(|source| MongoStoreError::Unreachable {
                uri: redact_credentials(uri),
                source: Box::new(source),
            })?;
        log::debug!("connected to MongoDB database {database}");
        Ok(store)
    }

    /// Wrap an existing database handle.
    #[must_use]
    pub const fn from_database(database: Database) -> Self {
        Self { database }
    }

    /// Name of the database the store writes into.
    #[must_use]
    pub fn database_name(&self) -> &str {
        self.database.name()
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection(name)
    }
}

impl DocumentStore for MongoDocumentStore {
    fn replace_or_insert(
        &mut self,
        collection: &str,
        key: &LookupKey,
        record: &Record,
    ) -> Result<WriteOutcome, StoreError> {
        let encode = |err: bson::ser::Error| StoreError::Encode {
            collection: collection.to_owned(),
            message: err.to_string(),
        };
        let filter = lookup_filter(key).map_err(encode)?;
        let replacement = record_document(record).map_err(encode)?;

        let result = self
            .collection(collection)
            .replace_one(filter, replacement)
            .upsert(true)
            .run()
            .map_err(|err| StoreError::write(collection, err))?;

        Ok(if result.upserted_id.is_some() {
            WriteOutcome::Inserted
        } else {
            WriteOutcome::Replaced
        })
    }
}

/// Equality filter over every unique-key field.
fn lookup_filter(key: &LookupKey) -> Result<Document, bson::ser::Error> {
    bson::to_document(&key.to_filter())
}

fn record_document(record: &Record) -> Result<Document, bson::ser::Error> {
    bson::to_document(record)
}
