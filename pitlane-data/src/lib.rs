//! Adapters connecting the Pitlane collector to the outside world.
//!
//! Responsibilities:
//! - Fetch records from the OpenF1 HTTP API ([`http::HttpRecordSource`]).
//! - Persist records into a document store selected by URI
//!   ([`store::open_document_store`]).
//!
//! Boundaries:
//! - Do not encode domain rules (live in `pitlane-core`).
//! - Present synchronous interfaces; async clients are driven internally.
//!
//! Invariants:
//! - No global mutable state.
#![forbid(unsafe_code)]

pub mod http;
pub mod store;
