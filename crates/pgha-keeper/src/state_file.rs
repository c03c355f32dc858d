//! `KeeperState`: the keeper's own persisted view of its role, written with
//! an atomic replace and read back bit-for-bit (spec.md §3, §8).

use std::path::{Path, PathBuf};

use pgha_types::{GroupId, Lsn, NodeId, NodeState, SystemIdentifier, TimelineId};
use serde::{Deserialize, Serialize};

use crate::atomic::{read_file, write_atomic};
use crate::error::KeeperError;

/// On-disk format version. Bumped whenever the record's shape changes so a
/// keeper upgraded in place can detect and refuse an incompatible file
/// rather than silently misreading it.
const STATE_FILE_VERSION: u16 = 1;

/// Per-node keeper state (spec.md §3 DATA MODEL). Owned exclusively by the
/// keeper's FSM driver; the DB controller never writes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeeperState {
    pub current_node_id: NodeId,
    pub current_group: GroupId,
    pub current_role: NodeState,
    pub assigned_role: NodeState,
    /// Unix seconds of the last successful contact with the monitor.
    pub last_monitor_contact: i64,
    pub system_identifier: SystemIdentifier,
    pub pg_control_version: u32,
    pub catalog_version_no: u32,
    pub xlog_lsn_last_reported: Lsn,
    pub timeline_id: TimelineId,
}

impl KeeperState {
    pub fn new(node_id: NodeId, group_id: GroupId, initial_role: NodeState) -> Self {
        Self {
            current_node_id: node_id,
            current_group: group_id,
            current_role: initial_role,
            assigned_role: initial_role,
            last_monitor_contact: 0,
            system_identifier: SystemIdentifier::unset(),
            pg_control_version: 0,
            catalog_version_no: 0,
            xlog_lsn_last_reported: Lsn::ZERO,
            timeline_id: TimelineId::INITIAL,
        }
    }

    pub fn load(path: &Path) -> Result<Self, KeeperError> {
        let bytes = read_file(path)?;
        decode(&bytes, path)
    }

    pub fn load_if_exists(path: &Path) -> Result<Option<Self>, KeeperError> {
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    pub fn save(&self, path: &Path) -> Result<(), KeeperError> {
        let bytes = encode(self, path)?;
        write_atomic(path, &bytes)
    }

    /// Records only the caller-succeeded case of `last_monitor_contact`
    /// (spec.md §9: "set only when the caller succeeded in reaching the
    /// monitor" — the historically inconsistent behavior this spec fixes).
    pub fn record_monitor_contact(&mut self, now_unix_seconds: i64) {
        self.last_monitor_contact = now_unix_seconds;
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    version: u16,
    state: Vec<u8>,
}

fn encode(state: &KeeperState, path: &Path) -> Result<Vec<u8>, KeeperError> {
    let payload = postcard::to_allocvec(state).map_err(|source| KeeperError::Codec {
        path: path.to_path_buf(),
        source,
    })?;
    let envelope = Envelope {
        version: STATE_FILE_VERSION,
        state: payload,
    };
    postcard::to_allocvec(&envelope).map_err(|source| KeeperError::Codec {
        path: path.to_path_buf(),
        source,
    })
}

fn decode(bytes: &[u8], path: &Path) -> Result<KeeperState, KeeperError> {
    let envelope: Envelope = postcard::from_bytes(bytes).map_err(|source| KeeperError::Codec {
        path: path.to_path_buf(),
        source,
    })?;
    if envelope.version != STATE_FILE_VERSION {
        return Err(KeeperError::VersionMismatch {
            path: path.to_path_buf(),
            found: envelope.version,
            expected: STATE_FILE_VERSION,
        });
    }
    postcard::from_bytes(&envelope.state).map_err(|source| KeeperError::Codec {
        path: path.to_path_buf(),
        source,
    })
}

/// Helper used by callers that only have a `data_dir`, matching
/// `pgha_config::Paths::keeper_state_file`.
pub fn default_state_path(data_dir: &Path) -> PathBuf {
    data_dir.join("pgha.state")
}

/// Current time as Unix seconds, the unit `last_monitor_contact` and the
/// restart-tracker windows are measured in throughout this crate.
pub fn now_unix_seconds() -> i64 {
    chrono::Utc::now().timestamp()
}
