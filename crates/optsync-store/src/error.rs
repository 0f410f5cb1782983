//! Error types for storage backends
//!
//! Backend failures are surfaced unchanged to the caller of the engine
//! operation that triggered them; nothing at this layer retries.

use std::path::PathBuf;

/// Errors reported by a storage backend
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Write would exceed a storage quota
    #[error("quota exceeded for '{key}': {bytes} bytes (limit: {limit})")]
    QuotaExceeded {
        /// Key being written
        key: String,
        /// Size the write would occupy
        bytes: usize,
        /// Applicable limit
        limit: usize,
    },

    /// Backend is not reachable or refused the call
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// IO error in a file-backed area
    #[error("io error on {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Persisted area could not be decoded
    #[error("corrupt storage file {path}: {reason}")]
    Corrupt {
        /// File involved
        path: PathBuf,
        /// Decoder message
        reason: String,
    },
}

impl BackendError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Check if error is a quota violation
    #[inline]
    #[must_use]
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

/// Result type alias for backend calls
pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_error_display() {
        let err = BackendError::QuotaExceeded {
            key: "options".into(),
            bytes: 9000,
            limit: 8192,
        };
        assert_eq!(
            err.to_string(),
            "quota exceeded for 'options': 9000 bytes (limit: 8192)"
        );
        assert!(err.is_quota());
    }

    #[test]
    fn io_error_keeps_source() {
        let err = BackendError::io_error(
            "/tmp/area.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/tmp/area.json"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_quota());
    }
}
