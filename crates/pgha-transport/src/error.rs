//! Error classification for monitor RPCs (spec.md §7 class 1, 3, 4):
//! transient I/O and SQL conflicts are retryable; version mismatches and
//! configuration conflicts are fatal for the current process.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("request timed out")]
    Timeout,

    #[error("object in use, retry")]
    ObjectInUse,

    #[error("serialization failure, retry")]
    SerializationFailure,

    #[error("monitor schema version {found} does not match required {expected}")]
    VersionMismatch { found: String, expected: String },

    #[error("malformed notification payload: {0}")]
    MalformedPayload(String),

    #[error("retry budget exhausted after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

impl TransportError {
    /// Whether the active retry policy should retry this error (spec.md
    /// §6, §7 class 1): `OBJECT_IN_USE` and `SERIALIZATION_FAILURE` are
    /// retryable, as are plain connection/timeout errors. A version
    /// mismatch is fatal for this process (spec.md §7 class 4) and a
    /// malformed payload is logged and skipped by the caller rather than
    /// retried (spec.md §7 class 5).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::Connection(_) | TransportError::Timeout | TransportError::ObjectInUse | TransportError::SerializationFailure
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_in_use_and_serialization_failure_are_retryable() {
        assert!(TransportError::ObjectInUse.is_retryable());
        assert!(TransportError::SerializationFailure.is_retryable());
    }

    #[test]
    fn version_mismatch_is_not_retryable() {
        let err = TransportError::VersionMismatch {
            found: "1.5".into(),
            expected: "1.6".into(),
        };
        assert!(!err.is_retryable());
    }
}
