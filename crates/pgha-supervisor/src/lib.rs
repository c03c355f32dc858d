//! Per-node process supervision (spec.md §4.2, §5): owns the keeper's
//! three long-lived children, restarts them on abnormal exit with
//! exponential backoff, and the `ExpectedPostgresStatus`-driven DB
//! controller loop that is the only process ever allowed to start or
//! stop the local database directly.

mod db_controller;
mod error;
mod pid_file;
mod restart;
mod supervisor;

pub use db_controller::{CancelFlag, DbController};
pub use error::SupervisorError;
pub use pid_file::PidFile;
pub use restart::{backoff_for_attempt, RestartCounter};
pub use supervisor::{ChildKind, Supervisor};

#[cfg(unix)]
pub use supervisor::run_signal_loop;
