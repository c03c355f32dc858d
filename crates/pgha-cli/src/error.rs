//! Exit-code mapping for the CLI surface (spec.md §6): every command
//! returns one of a small set of documented codes rather than Rust's
//! default panic-on-error behavior.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("bad arguments: {0}")]
    BadArgs(String),

    #[error("bad configuration: {0}")]
    BadConfig(#[from] pgha_config::ConfigError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("database error: {0}")]
    Database(#[from] pgha_pgctl::PgCtlError),

    #[error("keeper error: {0}")]
    Keeper(#[from] pgha_keeper::KeeperError),

    #[error("supervisor error: {0}")]
    Supervisor(#[from] pgha_supervisor::SupervisorError),

    #[error("monitor error: {0}")]
    Monitor(String),

    #[error("quit requested")]
    QuitRequested,
}

impl CliError {
    /// The exit code documented for this command surface (spec.md §6).
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::BadArgs(_) => 11,
            CliError::BadConfig(_) => 12,
            CliError::Internal(_) => 13,
            CliError::Database(_) => 14,
            CliError::Keeper(_) => 14,
            CliError::Supervisor(_) => 13,
            CliError::Monitor(_) => 15,
            CliError::QuitRequested => 17,
        }
    }
}
