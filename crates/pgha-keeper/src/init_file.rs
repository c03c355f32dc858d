//! `KeeperInitState`: records what PGDATA looked like when `create
//! postgres` began, so a keeper restarted mid-init can resume idempotently
//! instead of re-running initialization (spec.md §3, §8).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::atomic::{read_file, write_atomic};
use crate::error::KeeperError;

/// The state of the PGDATA directory observed when init began.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeeperInitState {
    PgDataEmpty,
    PgDataExists,
    PgIsRunning,
    PgIsPrimary,
}

impl KeeperInitState {
    pub fn load(path: &Path) -> Result<Self, KeeperError> {
        let bytes = read_file(path)?;
        postcard::from_bytes(&bytes).map_err(|source| KeeperError::Codec {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load_if_exists(path: &Path) -> Result<Option<Self>, KeeperError> {
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    pub fn save(&self, path: &Path) -> Result<(), KeeperError> {
        let bytes = postcard::to_allocvec(self).map_err(|source| KeeperError::Codec {
            path: path.to_path_buf(),
            source,
        })?;
        write_atomic(path, &bytes)
    }

    pub fn clear(path: &Path) -> std::io::Result<()> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Decides whether a keeper process restarting should resume a
/// crashed init or start one fresh, per spec.md §8's boundary behavior:
/// "a keeper restarted mid-init (init file present, state file absent)
/// resumes without attempting to reinitialize PGDATA".
pub fn resume_decision(
    init_path: &Path,
    state_path: &Path,
) -> Result<ResumeDecision, KeeperError> {
    let init = KeeperInitState::load_if_exists(init_path)?;
    let state_exists = state_path.exists();

    Ok(match (init, state_exists) {
        (None, false) => ResumeDecision::FreshInit,
        (None, true) => ResumeDecision::AlreadyInitialized,
        (Some(_), false) => ResumeDecision::ResumeCrashedInit,
        (Some(_), true) => ResumeDecision::AlreadyInitialized,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeDecision {
    FreshInit,
    ResumeCrashedInit,
    AlreadyInitialized,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn init_state_roundtrips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pgha.init");

        KeeperInitState::PgDataExists.save(&path).unwrap();
        assert_eq!(KeeperInitState::load(&path).unwrap(), KeeperInitState::PgDataExists);
    }

    #[test]
    fn resume_decision_matches_spec_boundary_behavior() {
        let dir = tempdir().unwrap();
        let init_path = dir.path().join("pgha.init");
        let state_path = dir.path().join("pgha.state");

        assert_eq!(resume_decision(&init_path, &state_path).unwrap(), ResumeDecision::FreshInit);

        KeeperInitState::PgDataExists.save(&init_path).unwrap();
        assert_eq!(
            resume_decision(&init_path, &state_path).unwrap(),
            ResumeDecision::ResumeCrashedInit
        );

        std::fs::write(&state_path, b"not a real state file, just a presence marker").unwrap();
        assert_eq!(
            resume_decision(&init_path, &state_path).unwrap(),
            ResumeDecision::AlreadyInitialized
        );
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pgha.init");
        KeeperInitState::clear(&path).unwrap();
        KeeperInitState::PgDataExists.save(&path).unwrap();
        KeeperInitState::clear(&path).unwrap();
        KeeperInitState::clear(&path).unwrap();
        assert!(!path.exists());
    }
}
