//! Document store backends and URI-based selection.
//!
//! The collector writes through [`pitlane_core::DocumentStore`]. This module
//! provides two backends and picks one from a connection URI:
//!
//! - `mongodb://` and `mongodb+srv://` open a [`MongoDocumentStore`]
//!   (feature `store-mongodb`).
//! - `sqlite://<path>` and `sqlite::memory:` open a [`SqliteDocumentStore`]
//!   (feature `store-sqlite`).

use std::fmt;

use camino::Utf8PathBuf;
use pitlane_core::DocumentStore;
use thiserror::Error;

#[cfg(feature = "store-mongodb")]
mod mongo;
#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-mongodb")]
pub use mongo::{MongoDocumentStore, MongoStoreError};
#[cfg(feature = "store-sqlite")]
pub use sqlite::{SqliteDocumentStore, SqliteStoreError};

const SQLITE_MEMORY_URI: &str = "sqlite::memory:";
const SQLITE_PREFIX: &str = "sqlite://";
const MONGO_SCHEMES: [&str; 2] = ["mongodb://", "mongodb+srv://"];

/// Errors raised while opening a document store.
#[derive(Debug, Error)]
pub enum OpenStoreError {
    /// The URI scheme does not name a known backend.
    #[error("unsupported document store URI {uri}; expected mongodb://, mongodb+srv:// or sqlite://")]
    UnsupportedScheme {
        /// URI with credentials redacted.
        uri: String,
    },
    /// The URI names a known backend but is malformed.
    #[error("invalid document store URI {uri}: {reason}")]
    InvalidUri {
        /// URI with credentials redacted.
        uri: String,
        /// Description of the problem.
        reason: String,
    },
    /// The backend for this URI was compiled out.
    #[error("document store URI {uri} requires the `{feature}` feature")]
    FeatureDisabled {
        /// URI with credentials redacted.
        uri: String,
        /// Cargo feature enabling the backend.
        feature: &'static str,
    },
    /// Connecting to MongoDB failed.
    #[cfg(feature = "store-mongodb")]
    #[error(transparent)]
    Mongo(#[from] MongoStoreError),
    /// Opening the SQLite database failed.
    #[cfg(feature = "store-sqlite")]
    #[error(transparent)]
    Sqlite(#[from] SqliteStoreError),
}

/// Parsed location of a document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// A MongoDB deployment reached through its connection string.
    Mongo {
        /// Connection string, passed verbatim to the driver.
        uri: String,
    },
    /// A SQLite database file.
    SqliteFile(Utf8PathBuf),
    /// A transient in-memory SQLite database.
    SqliteMemory,
}

impl StoreLocation {
    /// Parse a connection URI.
    ///
    /// # Errors
    ///
    /// Returns [`OpenStoreError::UnsupportedScheme`] for unknown schemes and
    /// [`OpenStoreError::InvalidUri`] when a `sqlite://` URI has no path.
    ///
    /// # Examples
    /// ```
    /// use pitlane_data::store::StoreLocation;
    ///
    /// let location = StoreLocation::parse("sqlite://openf1.db")?;
    /// assert_eq!(location, StoreLocation::SqliteFile("openf1.db".into()));
    /// # Ok::<(), pitlane_data::store::OpenStoreError>(())
    /// ```
    pub fn parse(uri: &str) -> Result<Self, OpenStoreError> {
        let trimmed = uri.trim();
        if MONGO_SCHEMES.iter().any(|scheme| trimmed.starts_with(scheme)) {
            return Ok(Self::Mongo {
                uri: trimmed.to_owned(),
            });
        }
        if trimmed == SQLITE_MEMORY_URI {
            return Ok(Self::SqliteMemory);
        }
        if let Some(path) = trimmed.strip_prefix(SQLITE_PREFIX) {
            if path.is_empty() {
                return Err(OpenStoreError::InvalidUri {
                    uri: redact_credentials(trimmed),
                    reason: "missing database path".to_owned(),
                });
            }
            return Ok(Self::SqliteFile(Utf8PathBuf::from(path)));
        }
        Err(OpenStoreError::UnsupportedScheme {
            uri: redact_credentials(trimmed),
        })
    }
}

impl fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mongo { uri } => f.write_str(&redact_credentials(uri)),
            Self::SqliteFile(path) => write!(f, "{SQLITE_PREFIX}{path}"),
            Self::SqliteMemory => f.write_str(SQLITE_MEMORY_URI),
        }
    }
}

/// Open the document store at `location`.
///
/// `database` names the MongoDB database; SQLite stores keep every collection
/// in the file named by the location and ignore it.
///
/// # Errors
///
/// Returns [`OpenStoreError::FeatureDisabled`] when the backend was compiled
/// out, or the backend's own error when it cannot be opened.
pub fn open_document_store(
    location: &StoreLocation,
    database: &str,
) -> Result<Box<dyn DocumentStore>, OpenStoreError> {
    match location {
        StoreLocation::Mongo { uri } => open_mongo(uri, database),
        StoreLocation::SqliteFile(path) => open_sqlite(Some(path)),
        StoreLocation::SqliteMemory => open_sqlite(None),
    }
}

#[cfg(feature = "store-mongodb")]
fn open_mongo(uri: &str, database: &str) -> Result<Box<dyn DocumentStore>, OpenStoreError> {
    let store = MongoDocumentStore::connect(uri, database)?;
    Ok(Box::new(store))
}

#[cfg(not(feature = "store-mongodb"))]
fn open_mongo(uri: &str, _database: &str) -> Result<Box<dyn DocumentStore>, OpenStoreError> {
    Err(OpenStoreError::FeatureDisabled {
        uri: redact_credentials(uri),
        feature: "store-mongodb",
    })
}

#[cfg(feature = "store-sqlite")]
fn open_sqlite(path: Option<&Utf8PathBuf>) -> Result<Box<dyn DocumentStore>, OpenStoreError> {
    let store = match path {
        Some(file) => SqliteDocumentStore::open(file)?,
        None => SqliteDocumentStore::open_in_memory()?,
    };
    Ok(Box::new(store))
}

#[cfg(not(feature = "store-sqlite"))]
fn open_sqlite(path: Option<&Utf8PathBuf>) -> Result<Box<dyn DocumentStore>, OpenStoreError> {
    let uri = path.map_or_else(
        || SQLITE_MEMORY_URI.to_owned(),
        |file| format!("{SQLITE_PREFIX}{file}"),
    );
    Err(OpenStoreError::FeatureDisabled {
        uri,
        feature: "store-sqlite",
    })
}

/// Replace the user-info part of a URI with `***`.
///
/// Connection strings commonly embed passwords; they must not reach logs.
pub(crate) fn redact_credentials(uri: &str) -> String {
    let Some((scheme, rest)) = uri.split_once("://") else {
        return uri.to_owned();
    };
    let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);
    match authority.rsplit_once('@') {
        Some((_, hosts)) => format!("{scheme}://***@{hosts}{tail}"),
        None => uri.to_owned(),
    }
}
