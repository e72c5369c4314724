//! Error types for call-core operations

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CallCoreError {
    #[error("No current call")]
    NoCurrentCall,

    #[error("No waiting call")]
    NoWaitingCall,

    #[error("Invalid state for operation: {0}")]
    InvalidState(String),

    #[error("Telecom action failed: {0}")]
    TelecomAction(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CallCoreResult<T> = std::result::Result<T, CallCoreError>;
