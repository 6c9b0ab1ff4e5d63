//! Write access to a document store.
//!
//! The `DocumentStore` trait is deliberately narrow: the collector only ever
//! replaces a document by its lookup key or inserts it when no match exists.

use std::error::Error as StdError;

use thiserror::Error;

use crate::{LookupKey, Record};

/// Result of a single [`DocumentStore::replace_or_insert`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// No document matched the key; the record was inserted.
    Inserted,
    /// A document matched the key and its fields were replaced.
    Replaced,
}

/// Errors from [`DocumentStore::replace_or_insert`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record or key could not be converted into the store's format.
    #[error("failed to encode document for collection {collection}: {message}")]
    Encode {
        /// Target collection.
        collection: String,
        /// Error description.
        message: String,
    },
    /// The backend rejected the write.
    #[error("failed to write to collection {collection}: {source}")]
    Write {
        /// Target collection.
        collection: String,
        /// Backend error.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl StoreError {
    /// Wrap a backend error raised while writing to `collection`.
    pub fn write(
        collection: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self::Write {
            collection: collection.into(),
            source: source.into(),
        }
    }
}

/// Persist records into named collections.
///
/// Implementations must make each call an atomic point operation: after it
/// returns `Ok`, exactly one document in `collection` matches `key` and its
/// fields equal `record`'s fields.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use pitlane_core::{DocumentStore, LookupKey, Record, StoreError, UniqueKey, WriteOutcome};
/// use serde_json::json;
///
/// #[derive(Default)]
/// struct MapStore(HashMap<(String, String), Record>);
///
/// impl DocumentStore for MapStore {
///     fn replace_or_insert(
///         &mut self,
///         collection: &str,
///         key: &LookupKey,
///         record: &Record,
///     ) -> Result<WriteOutcome, StoreError> {
///         let slot = (collection.to_owned(), key.canonical());
///         Ok(match self.0.insert(slot, record.clone()) {
///             Some(_) => WriteOutcome::Replaced,
///             None => WriteOutcome::Inserted,
///         })
///     }
/// }
///
/// let record = Record::try_from(json!({"session_key": 9476})).expect("object");
/// let key = UniqueKey::session().lookup_key(&record).expect("key present");
/// let mut store = MapStore::default();
/// assert_eq!(store.replace_or_insert("sessions", &key, &record)?, WriteOutcome::Inserted);
/// assert_eq!(store.replace_or_insert("sessions", &key, &record)?, WriteOutcome::Replaced);
/// # Ok::<(), StoreError>(())
/// ```
pub trait DocumentStore {
    /// Replace the document in `collection` matching `key`, or insert `record`
    /// when none matches.
    fn replace_or_insert(
        &mut self,
        collection: &str,
        key: &LookupKey,
        record: &Record,
    ) -> Result<WriteOutcome, StoreError>;
}

impl<T: DocumentStore + ?Sized> DocumentStore for &mut T {
    fn replace_or_insert(
        &mut self,
        collection: &str,
        key: &LookupKey,
        record: &Record,
    ) -> Result<WriteOutcome, StoreError> {
        (**self).replace_or_insert(collection, key, record)
    }
}

impl<T: DocumentStore + ?Sized> DocumentStore for Box<T> {
    fn replace_or_insert(
        &mut self,
        collection: &str,
        key: &LookupKey,
        record: &Record,
    ) -> Result<WriteOutcome, StoreError> {
        (**self).replace_or_insert(collection, key, record)
    }
}
