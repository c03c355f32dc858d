use std::path::PathBuf;

use pgha_types::NodeState;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeeperError {
    #[error("io error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("failed to (de)serialize state file at {path}: {source}")]
    Codec {
        path: PathBuf,
        source: postcard::Error,
    },

    #[error("failed to (de)serialize JSON record at {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("state file at {path} has version {found}, expected {expected}")]
    VersionMismatch {
        path: PathBuf,
        found: u16,
        expected: u16,
    },

    #[error("no transition defined from {from} to {to}")]
    NoSuchTransition { from: NodeState, to: NodeState },

    #[error("transition from {from} to {to} failed")]
    TransitionFailed { from: NodeState, to: NodeState },

    #[error("local database driver error: {0}")]
    PgCtl(#[from] pgha_pgctl::PgCtlError),

    #[error("system identifier mismatch: local={local} peer={peer}")]
    SystemIdentifierMismatch { local: u64, peer: u64 },

    #[error("init file present but state file also present; refusing to resume init")]
    InconsistentInitState,
}
