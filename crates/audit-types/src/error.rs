//! Error types for audit event decoding.

use thiserror::Error;

/// Errors that can occur while decoding audit records.
#[derive(Debug, Error)]
pub enum TypesError {
    /// The audit line itself is not a valid event.
    #[error("invalid audit event: {0}")]
    InvalidEvent(#[source] serde_json::Error),

    /// The event carries no response body to decode.
    #[error("event has no response object")]
    MissingResponseObject,

    /// The response body could not be decoded as the requested snapshot.
    #[error("invalid {kind} snapshot: {source}")]
    InvalidSnapshot {
        /// Snapshot kind being decoded ("pod", "job").
        kind: &'static str,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for decoding operations.
pub type Result<T> = std::result::Result<T, TypesError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn json_error() -> serde_json::Error {
        serde_json::from_str::<serde_json::Value>("{").unwrap_err()
    }

    #[test]
    fn error_display_messages() {
        let err = TypesError::MissingResponseObject;
        assert_eq!(err.to_string(), "event has no response object");

        let err = TypesError::InvalidSnapshot {
            kind: "pod",
            source: json_error(),
        };
        assert!(err.to_string().starts_with("invalid pod snapshot:"));

        let err = TypesError::InvalidEvent(json_error());
        assert!(err.to_string().starts_with("invalid audit event:"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TypesError>();
    }
}
