//! # Ringside Caller Info
//!
//! Client for the remote caller-info lookup service used by the Ringside
//! dialer. A lookup is a single POST of the phone number; the server
//! answers with a `{status, data, error}` envelope carrying the caller's
//! record (name, campus, lead status, remark) when it knows the number.
//!
//! Lookups are advisory: the call UI renders whatever arrives in time and
//! ignores stale results. There is no retry and no caching here; the
//! 5-second connect and 7-second request timeouts bound how long a call
//! screen can be left waiting.

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::CallerInfoClient;
pub use config::{LookupConfig, DEFAULT_BASE_URL};
pub use error::{LookupError, Result};
pub use types::CallerInfo;
