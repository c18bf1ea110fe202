//! Error types for log tailing.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while tailing a log file.
#[derive(Debug, Error)]
pub enum TailError {
    /// Stat, open, seek or read failed. Retried on the next poll.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File being tailed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A newline-terminated line is not a JSON object.
    #[error("corrupt record at offset {offset}: {preview:?}")]
    Corrupt {
        /// Byte offset where the record starts.
        offset: u64,
        /// Leading bytes of the record, lossily decoded.
        preview: String,
    },
}

impl TailError {
    /// Wraps an I/O error with the path it occurred on.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true if this error indicates corrupted file content.
    #[must_use]
    pub const fn is_corruption(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}

/// Result type alias for tail operations.
pub type Result<T> = std::result::Result<T, TailError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = TailError::io(
            "/var/log/audit.log",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        assert_eq!(
            err.to_string(),
            "I/O error on /var/log/audit.log: no such file"
        );
        assert!(!err.is_corruption());

        let err = TailError::Corrupt {
            offset: 42,
            preview: "garbage".to_string(),
        };
        assert_eq!(err.to_string(), "corrupt record at offset 42: \"garbage\"");
        assert!(err.is_corruption());
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TailError>();
    }
}
