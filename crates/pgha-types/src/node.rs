use std::fmt::{self, Display};

use crate::{Formation, GroupId, NodeId, NodeState, SystemIdentifier};

/// How eligible a node is to be promoted; higher is more eligible. Zero
/// means "never promote this node" (spec.md §4.3 item 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct CandidatePriority(i32);

impl CandidatePriority {
    pub const NEVER_PROMOTE: CandidatePriority = CandidatePriority(0);
    pub const DEFAULT: CandidatePriority = CandidatePriority(100);

    pub fn new(priority: i32) -> Self {
        Self(priority)
    }

    pub fn get(self) -> i32 {
        self.0
    }

    pub fn is_eligible(self) -> bool {
        self.0 > 0
    }
}

impl Default for CandidatePriority {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The database engine's own `sync_state` for a streaming standby, as
/// reported by `pg_stat_replication`. An empty value means the standby is
/// momentarily disconnected — spec.md §9 mandates this be treated as a
/// warning on a primary, not a hard failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SyncState {
    Empty,
    Async,
    Potential,
    Sync,
    Quorum,
}

impl SyncState {
    pub fn is_connected(self) -> bool {
        !matches!(self, SyncState::Empty)
    }
}

impl Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncState::Empty => "",
            SyncState::Async => "async",
            SyncState::Potential => "potential",
            SyncState::Sync => "sync",
            SyncState::Quorum => "quorum",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for SyncState {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "async" => SyncState::Async,
            "potential" => SyncState::Potential,
            "sync" => SyncState::Sync,
            "quorum" => SyncState::Quorum,
            _ => SyncState::Empty,
        })
    }
}

/// Identity and registration metadata for one node (spec.md §3 DATA MODEL).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Node {
    pub node_id: NodeId,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub group_id: GroupId,
    pub formation: Formation,
    pub candidate_priority: CandidatePriority,
    pub replication_quorum: bool,
    pub system_identifier: SystemIdentifier,
}

impl Node {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A peer's address and state as returned by `get_other_nodes` /
/// `get_primary` / `get_most_advanced_standby` (spec.md §4.3).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NodeAddress {
    pub node_id: NodeId,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub state: NodeState,
}
