//! HTTP record source for the OpenF1 API.
//!
//! [`HttpRecordSource`] implements [`pitlane_core::RecordSource`] by issuing a
//! GET request to `{base_url}/{endpoint}` with the stage's query parameters
//! and decoding the JSON array in the response body.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use pitlane_core::{QueryParams, RecordSource};
//! use pitlane_data::http::{HttpRecordSource, HttpRecordSourceConfig};
//!
//! let config = HttpRecordSourceConfig::new("https://api.openf1.org/v1")
//!     .with_timeout(Duration::from_secs(10))
//!     .with_user_agent("my-app/1.0");
//! let source = HttpRecordSource::with_config(config)?;
//!
//! let laps = source.fetch("laps", &QueryParams::new().with("session_key", 9476))?;
//! println!("fetched {} laps", laps.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod source;

pub use source::{
    DEFAULT_BASE_URL, DEFAULT_USER_AGENT, HttpRecordSource, HttpRecordSourceConfig,
    SourceBuildError,
};
