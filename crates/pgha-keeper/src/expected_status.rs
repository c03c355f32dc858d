//! `ExpectedPostgresStatus`: the sole channel by which the keeper's FSM
//! driver tells the DB controller what it should be doing to postgres
//! right now. Recreated fresh on every keeper start (spec.md §3: "not
//! durable across a keeper restart — a restarting keeper always begins
//! by writing UNKNOWN and lets the controller re-derive reality").

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::atomic::{read_file, write_atomic};
use crate::error::KeeperError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpectedPostgresStatus {
    Unknown,
    Stopped,
    Running,
    /// Running as a restarted child the supervisor is still watching,
    /// distinct from a steady-state `Running` so the controller does not
    /// double-count a restart-in-progress as a failure.
    RunningAsSubprocess,
}

impl Default for ExpectedPostgresStatus {
    fn default() -> Self {
        ExpectedPostgresStatus::Unknown
    }
}

impl ExpectedPostgresStatus {
    pub fn load_or_default(path: &Path) -> Result<Self, KeeperError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let bytes = read_file(path)?;
        postcard::from_bytes(&bytes).map_err(|source| KeeperError::Codec {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), KeeperError> {
        let bytes = postcard::to_allocvec(self).map_err(|source| KeeperError::Codec {
            path: path.to_path_buf(),
            source,
        })?;
        write_atomic(path, &bytes)
    }

    /// Whether the controller should have a live postmaster right now.
    pub fn wants_running(&self) -> bool {
        matches!(self, Self::Running | Self::RunningAsSubprocess)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_to_unknown_when_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pgha.status");
        assert_eq!(
            ExpectedPostgresStatus::load_or_default(&path).unwrap(),
            ExpectedPostgresStatus::Unknown
        );
    }

    #[test]
    fn roundtrips_through_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pgha.status");

        ExpectedPostgresStatus::Running.save(&path).unwrap();
        assert_eq!(
            ExpectedPostgresStatus::load_or_default(&path).unwrap(),
            ExpectedPostgresStatus::Running
        );
    }

    #[test]
    fn wants_running_matches_running_variants() {
        assert!(!ExpectedPostgresStatus::Unknown.wants_running());
        assert!(!ExpectedPostgresStatus::Stopped.wants_running());
        assert!(ExpectedPostgresStatus::Running.wants_running());
        assert!(ExpectedPostgresStatus::RunningAsSubprocess.wants_running());
    }
}
