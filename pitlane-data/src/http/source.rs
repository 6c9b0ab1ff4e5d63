//! `RecordSource` backed by an HTTP JSON API.
//!
//! The [`RecordSource`] trait is synchronous to keep the collector usable from
//! plain `main` functions. This source bridges the async reqwest client to the
//! sync interface by blocking on a Tokio runtime internally.

use std::time::Duration;

use pitlane_core::{FetchError, QueryParams, Record, RecordSource};
use reqwest::Client;
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use url::Url;

/// Base URL of the public OpenF1 API.
pub const DEFAULT_BASE_URL: &str = "https://api.openf1.org/v1";

/// Default user agent for API requests.
pub const DEFAULT_USER_AGENT: &str = "pitlane-collector/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Error type for [`HttpRecordSource`] construction failures.
#[derive(Debug, Error)]
pub enum SourceBuildError {
    /// The configured base URL could not be parsed.
    #[error("invalid API base URL {url:?}: {source}")]
    InvalidBaseUrl {
        /// Base URL as configured.
        url: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },
    /// The configured base URL does not use `http` or `https`.
    #[error("API base URL {url:?} must use http or https")]
    UnsupportedScheme {
        /// Base URL as configured.
        url: String,
    },
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Configuration for [`HttpRecordSource`].
#[derive(Debug, Clone)]
pub struct HttpRecordSourceConfig {
    /// Base URL for the API (e.g., `"https://api.openf1.org/v1"`).
    pub base_url: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for HttpRecordSourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpRecordSourceConfig {
    /// Create a new configuration with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Record source issuing `GET {base_url}/{endpoint}?{params}` requests.
///
/// The source owns a Tokio runtime that is reused across calls.
///
/// # Runtime behaviour
///
/// When called from outside any Tokio runtime, the source uses its own
/// stored runtime. When called from within an existing multi-threaded Tokio
/// runtime (detected via [`Handle::try_current()`] and
/// [`RuntimeFlavor::MultiThread`]), it uses that runtime's handle with
/// [`tokio::task::block_in_place`] to avoid nested runtime panics.
///
/// A `current_thread` runtime cannot block in place, so inside one the
/// request runs on a scoped helper thread that drives the internal runtime.
/// The caller's runtime stays blocked until the response arrives.
///
/// The internal runtime is dropped with the source, which Tokio forbids from
/// async contexts: drop the source outside them or inside `block_in_place`.
pub struct HttpRecordSource {
    client: Client,
    config: HttpRecordSourceConfig,
    runtime: Runtime,
}

impl std::fmt::Debug for HttpRecordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRecordSource")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish()
    }
}

impl HttpRecordSource {
    /// Create a new source with default timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client or
    /// Tokio runtime fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, SourceBuildError> {
        Self::with_config(HttpRecordSourceConfig::new(base_url))
    }

    /// Create a new source with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client or
    /// Tokio runtime fails to build.
    pub fn with_config(config: HttpRecordSourceConfig) -> Result<Self, SourceBuildError> {
        validate_base_url(&config.base_url)?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(SourceBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(SourceBuildError::Runtime)?;
        Ok(Self {
            client,
            config,
            runtime,
        })
    }

    /// Configuration the source was built with.
    #[must_use]
    pub const fn config(&self) -> &HttpRecordSourceConfig {
        &self.config
    }

    /// Build the request URL for `endpoint` with `params` as the query string.
    fn endpoint_url(&self, endpoint: &str, params: &QueryParams) -> Result<Url, FetchError> {
        let raw = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );
        let mut url = Url::parse(&raw).map_err(|err| FetchError::Network {
            url: raw.clone(),
            message: format!("invalid request URL: {err}"),
        })?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.pairs());
        }
        Ok(url)
    }

    async fn fetch_async(&self, url: &Url) -> Result<Vec<Record>, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, url))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, url))?;

        let body = response
            .bytes()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, url))?;

        decode_records(&body).map_err(|err| FetchError::Decode {
            url: url.to_string(),
            message: err.to_string(),
        })
    }

    /// Convert a reqwest error to a `FetchError`.
    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &Url) -> FetchError {
        if error.is_timeout() {
            return FetchError::Timeout {
                url: url.to_string(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        FetchError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

impl RecordSource for HttpRecordSource {
    /// Fetch every record the endpoint returns for `params`.
    ///
    /// # Runtime requirements
    ///
    /// Inside a multi-threaded Tokio runtime the request runs on that runtime
    /// via `block_in_place`. Inside any other runtime flavour it runs on a
    /// helper thread, so the request must not depend on IO driven by the
    /// caller's runtime.
    fn fetch(&self, endpoint: &str, params: &QueryParams) -> Result<Vec<Record>, FetchError> {
        let url = self.endpoint_url(endpoint, params)?;
        log::debug!("GET {url}");

        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(self.fetch_async(&url)))
            }
            Ok(_) => self.fetch_on_helper_thread(&url),
            Err(_) => self.runtime.block_on(self.fetch_async(&url)),
        }
    }
}

impl HttpRecordSource {
    /// Drive the request on the internal runtime from a thread outside the
    /// caller's runtime context.
    fn fetch_on_helper_thread(&self, url: &Url) -> Result<Vec<Record>, FetchError> {
        std::thread::scope(|scope| {
            scope
                .spawn(|| self.runtime.block_on(self.fetch_async(url)))
                .join()
                .unwrap_or_else(|_| {
                    Err(FetchError::Network {
                        url: url.to_string(),
                        message: "request thread panicked".to_owned(),
                    })
                })
        })
    }
}

fn validate_base_url(base_url: &str) -> Result<(), SourceBuildError> {
    let parsed = Url::parse(base_url).map_err(|source| SourceBuildError::InvalidBaseUrl {
        url: base_url.to_owned(),
        source,
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(SourceBuildError::UnsupportedScheme {
            url: base_url.to_owned(),
        }),
    }
}

/// Decode a response body that must be a JSON array of objects.
fn decode_records(body: &[u8]) -> Result<Vec<Record>, serde_json::Error> {
    serde_json::from_slice(body)
}
