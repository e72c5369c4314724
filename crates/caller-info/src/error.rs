//! Error types for caller-info lookups

use thiserror::Error;

/// Failure modes of a lookup request.
///
/// Every request resolves to exactly one terminal outcome: a parsed
/// [`CallerInfo`](crate::types::CallerInfo) or one of these. Timeout and
/// network errors are distinguished so the UI can say "still waiting on the
/// server" instead of a generic failure.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, LookupError>;
