//! SQLite-backed document store.
//!
//! Every collection lives in a single `documents` table. Rows are keyed by
//! the collection name and the canonical rendering of the record's lookup
//! key; the record itself is stored as a JSON object in `body`.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use pitlane_core::{DocumentStore, LookupKey, Record, StoreError, WriteOutcome};
use rusqlite::{Connection, params};
use thiserror::Error;

const CREATE_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS documents (
        collection TEXT NOT NULL,
        lookup_key TEXT NOT NULL,
        body TEXT NOT NULL,
        PRIMARY KEY (collection, lookup_key)
    );
";

const UPDATE_DOCUMENT: &str =
    "UPDATE documents SET body = ?3 WHERE collection = ?1 AND lookup_key = ?2";
const INSERT_DOCUMENT: &str =
    "INSERT INTO documents (collection, lookup_key, body) VALUES (?1, ?2, ?3)";

/// Errors raised when opening or reading a [`SqliteDocumentStore`].
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the SQLite database.
        path: String,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A stored body was not a JSON object.
    #[error("stored document in collection {collection} is not valid JSON: {source}")]
    InvalidDocument {
        /// Collection holding the document.
        collection: String,
        /// JSON decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// Generic SQLite error when creating the schema or reading rows.
    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

/// Document store persisting collections in a SQLite database.
pub struct SqliteDocumentStore {
    connection: Connection,
    path: Option<Utf8PathBuf>,
}

impl fmt::Debug for SqliteDocumentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteDocumentStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteDocumentStore {
    /// Open or create the database file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::OpenDatabase`] when the file cannot be
    /// opened and [`SqliteStoreError::Database`] when the schema cannot be
    /// created.
    pub fn open(path: impl AsRef<Utf8Path>) -> Result<Self, SqliteStoreError> {
        let path = path.as_ref();
        let connection =
            Connection::open(path).map_err(|source| SqliteStoreError::OpenDatabase {
                path: path.to_string(),
                source,
            })?;
        Self::initialise(connection, Some(path.to_path_buf()))
    }

    /// Open a transient database that lives as long as the store.
    ///
    /// # Errors
    ///
    /// Returns an error when SQLite cannot allocate the database.
    pub fn open_in_memory() -> Result<Self, SqliteStoreError> {
        let connection =
            Connection::open_in_memory().map_err(|source| SqliteStoreError::OpenDatabase {
                path: ":memory:".to_owned(),
                source,
            })?;
        Self::initialise(connection, None)
    }

    fn initialise(
        connection: Connection,
        path: Option<Utf8PathBuf>,
    ) -> Result<Self, SqliteStoreError> {
        connection.execute_batch(CREATE_SCHEMA)?;
        Ok(Self { connection, path })
    }

    /// Database file backing the store, or `None` when held in memory.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8Path> {
        self.path.as_deref()
    }

    /// Documents stored in `collection`, in first-insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error when the query fails or a stored body is not a JSON
    /// object.
    pub fn documents(&self, collection: &str) -> Result<Vec<Record>, SqliteStoreError> {
        let mut statement = self
            .connection
            .prepare("SELECT body FROM documents WHERE collection = ?1 ORDER BY rowid")?;
        let bodies = statement
            .query_map([collection], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        bodies
            .iter()
            .map(|body| {
                serde_json::from_str(body).map_err(|source| SqliteStoreError::InvalidDocument {
                    collection: collection.to_owned(),
                    source,
                })
            })
            .collect()
    }

    /// Number of documents stored in `collection`.
    ///
    /// # Errors
    ///
    /// Returns an error when the query fails.
    pub fn count(&self, collection: &str) -> Result<usize, SqliteStoreError> {
        let count = self.connection.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            [collection],
            |row| row.get::<_, usize>(0),
        )?;
        Ok(count)
    }

    /// Names of collections holding at least one document, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error when the query fails.
    pub fn collections(&self) -> Result<Vec<String>, SqliteStoreError> {
        let mut statement = self
            .connection
            .prepare("SELECT DISTINCT collection FROM documents ORDER BY collection")?;
        let names = statement
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn replace_or_insert(
        &mut self,
        collection: &str,
        key: &LookupKey,
        record: &Record,
    ) -> Result<WriteOutcome, StoreError> {
        let body = serde_json::to_string(record).map_err(|err| StoreError::Encode {
            collection: collection.to_owned(),
            message: err.to_string(),
        })?;
        let lookup = key.canonical();

        let tx = self
            .connection
            .transaction()
            .map_err(|err| StoreError::write(collection, err))?;
        let updated = tx
            .execute(UPDATE_DOCUMENT, params![collection, lookup, body])
            .map_err(|err| StoreError::write(collection, err))?;
        let outcome = if updated == 0 {
            tx.execute(INSERT_DOCUMENT, params![collection, lookup, body])
                .map_err(|err| StoreError::write(collection, err))?;
            WriteOutcome::Inserted
        } else {
            WriteOutcome::Replaced
        };
        tx.commit().map_err(|err| StoreError::write(collection, err))?;
        Ok(outcome)
    }
}
