//! Error types for the HVX runtime.

use hvx_protocol::ResultCode;
use thiserror::Error;

use crate::registry::{Handle, ObjectKind};

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the HVX runtime.
#[derive(Debug, Error)]
pub enum Error {
    /// Handle is unknown, already released, or of an unexpected kind.
    #[error("invalid handle {handle}{}", expected.map(|k| format!(" (expected {k})")).unwrap_or_default())]
    InvalidHandle {
        handle: Handle,
        expected: Option<ObjectKind>,
    },

    /// The dispatcher link is down.
    #[error("not connected to the dispatcher")]
    NotConnected,

    /// Requested data is not available, e.g. reading a pending job.
    #[error("no data available")]
    NoData,

    /// Timeout waiting for an operation.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Internal channel closed unexpectedly.
    #[error("channel closed unexpectedly")]
    ChannelClosed,

    /// Invalid argument provided to an operation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The object does not support the requested operation.
    #[error("unimplemented")]
    Unimplemented,

    /// Protocol-level violation.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Maps every failure onto the closed [`ResultCode`] set callers see at
    /// the API boundary.
    pub fn result_code(&self) -> ResultCode {
        match self {
            Error::InvalidHandle { .. } => ResultCode::InvalidHandle,
            Error::NotConnected | Error::ChannelClosed => ResultCode::NotConnected,
            Error::NoData => ResultCode::NoData,
            Error::InvalidArgument(_) => ResultCode::InvalidArgument,
            Error::Unimplemented => ResultCode::Unimplemented,
            Error::Timeout(_) | Error::Protocol(_) | Error::Json(_) => ResultCode::Failure,
        }
    }
}
