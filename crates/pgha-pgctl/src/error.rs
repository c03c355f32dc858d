use thiserror::Error;

/// Errors raised by the local database driver.
///
/// These are spec.md §7 class-2 ("DB engine transient") errors unless
/// otherwise noted; the keeper decides whether a given error tolerates
/// retry.
#[derive(Debug, Error)]
pub enum PgCtlError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("postgres did not start within the expected window")]
    StartTimeout,

    #[error("postgres is not running")]
    NotRunning,

    #[error("postgres is already running")]
    AlreadyRunning,

    #[error("base backup from {host}:{port} failed: {reason}")]
    BaseBackupFailed { host: String, port: u16, reason: String },

    #[error("promote failed: {0}")]
    PromoteFailed(String),

    #[error("rewind failed: {0}")]
    RewindFailed(String),

    #[error("replication slot {0} already exists")]
    SlotAlreadyExists(String),

    #[error("replication slot {0} does not exist")]
    SlotNotFound(String),

    #[error("identify_system against {host}:{port} failed: {reason}")]
    IdentifySystemFailed { host: String, port: u16, reason: String },

    #[error("control data unreadable at {path}: {reason}")]
    ControlDataUnreadable { path: String, reason: String },

    #[error("administrative command failed: {0}")]
    AdminCommandFailed(String),
}

impl PgCtlError {
    /// Whether the caller should retry this error per its active retry
    /// policy, rather than surface it immediately (spec.md §7).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PgCtlError::StartTimeout
                | PgCtlError::BaseBackupFailed { .. }
                | PgCtlError::IdentifySystemFailed { .. }
                | PgCtlError::AdminCommandFailed(_)
        )
    }
}
