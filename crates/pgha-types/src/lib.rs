//! # pgha-types: shared identity and state types
//!
//! Types shared between the keeper, the supervisor, and the monitor:
//! - Node/group identity ([`NodeId`], [`GroupId`])
//! - The replication role state machine ([`NodeState`])
//! - Log-sequence positions ([`Lsn`]) and timelines ([`TimelineId`])
//! - Node metadata ([`Node`], [`Formation`], [`CandidatePriority`])
//! - Reported health ([`Health`])

mod engine;
mod health;
mod ids;
mod lsn;
mod node;
mod state;

pub use engine::EngineVersion;
pub use health::Health;
pub use ids::{Formation, GroupId, NodeId, SystemIdentifier};
pub use lsn::{Lsn, LsnParseError, TimelineId};
pub use node::{CandidatePriority, Node, NodeAddress, SyncState};
pub use state::NodeState;
