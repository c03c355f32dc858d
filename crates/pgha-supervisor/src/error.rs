use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("io error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("child {0} panicked or was dropped before reporting an exit")]
    ChildLost(&'static str),

    #[error("timed out waiting {0:?} for children to stop")]
    StopTimeout(std::time::Duration),

    #[error("local database driver error: {0}")]
    PgCtl(#[from] pgha_pgctl::PgCtlError),

    #[error("keeper error: {0}")]
    Keeper(#[from] pgha_keeper::KeeperError),
}
