//! Retrieve batches of records from a remote API.
//!
//! The `RecordSource` trait abstracts a single GET against a named endpoint.
//! Implementations return the decoded records unchanged or a [`FetchError`];
//! deciding whether a failure should stop a run is left to the caller.

use std::fmt;

use thiserror::Error;

use crate::Record;

/// Query-string parameters sent with a fetch, in insertion order.
///
/// # Examples
///
/// ```
/// use pitlane_core::QueryParams;
///
/// let params = QueryParams::new().with("year", 2024).with("meeting_key", 1230);
/// assert_eq!(params.to_string(), "year=2024&meeting_key=1230");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Create an empty parameter list.
    #[must_use]
    pub const fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Append a parameter.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.pairs.push((name.into(), value.to_string()));
        self
    }

    /// Return the value for `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Parameters as `(name, value)` pairs.
    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Whether no parameters are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in &self.pairs {
            if !first {
                f.write_str("&")?;
            }
            write!(f, "{name}={value}")?;
            first = false;
        }
        Ok(())
    }
}

/// Errors from [`RecordSource::fetch`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request did not complete within the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Request URL.
        url: String,
        /// Timeout that elapsed, in seconds.
        timeout_secs: u64,
    },
    /// The server answered with a non-success status.
    #[error("request to {url} failed with status {status}: {message}")]
    Http {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
    },
    /// The request failed before a response was received.
    #[error("network error contacting {url}: {message}")]
    Network {
        /// Request URL.
        url: String,
        /// Error description.
        message: String,
    },
    /// The body was not a JSON array of objects.
    #[error("failed to decode response from {url}: {message}")]
    Decode {
        /// Request URL.
        url: String,
        /// Error description.
        message: String,
    },
}

/// Fetch records for a named API endpoint.
///
/// # Examples
///
/// ```
/// use pitlane_core::{FetchError, QueryParams, Record, RecordSource};
///
/// struct EmptySource;
///
/// impl RecordSource for EmptySource {
///     fn fetch(&self, _endpoint: &str, _params: &QueryParams) -> Result<Vec<Record>, FetchError> {
///         Ok(Vec::new())
///     }
/// }
///
/// let records = EmptySource.fetch("sessions", &QueryParams::new())?;
/// assert!(records.is_empty());
/// # Ok::<(), FetchError>(())
/// ```
pub trait RecordSource {
    /// Issue a single request for `endpoint` and return the decoded records.
    fn fetch(&self, endpoint: &str, params: &QueryParams) -> Result<Vec<Record>, FetchError>;
}

impl<T: RecordSource + ?Sized> RecordSource for &T {
    fn fetch(&self, endpoint: &str, params: &QueryParams) -> Result<Vec<Record>, FetchError> {
        (**self).fetch(endpoint, params)
    }
}

impl<T: RecordSource + ?Sized> RecordSource for Box<T> {
    fn fetch(&self, endpoint: &str, params: &QueryParams) -> Result<Vec<Record>, FetchError> {
        (**self).fetch(endpoint, params)
    }
}
