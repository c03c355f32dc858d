//! The monitor RPC surface (spec.md §4.3, §6): every call a keeper makes
//! against the monitor, issued "via SQL function calls over a pooled
//! connection" in the original system. This crate specifies the calls
//! and their retry policy; the pooled-connection transport itself is out
//! of scope (spec.md Non-goals).

use pgha_types::{CandidatePriority, Formation, GroupId, Lsn, NodeAddress, NodeId, NodeState, SystemIdentifier, TimelineId};

use crate::error::TransportError;

#[derive(Debug, Clone, PartialEq)]
pub struct RegisterNodeRequest {
    pub formation: Formation,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub system_identifier: SystemIdentifier,
    pub dbname: String,
    pub node_id_hint: Option<NodeId>,
    pub group_id_hint: Option<GroupId>,
    pub desired_initial_role: NodeState,
    pub candidate_priority: CandidatePriority,
    pub replication_quorum: bool,
    pub cluster_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterNodeResponse {
    pub node_id: NodeId,
    pub group_id: GroupId,
    pub assigned_state: NodeState,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeActiveRequest {
    pub formation_hash: u64,
    pub node_id: NodeId,
    pub group_id: GroupId,
    pub reported_state: NodeState,
    pub pg_is_running: bool,
    pub timeline_id: TimelineId,
    pub lsn: Lsn,
}

/// Every call surfaced by this trait corresponds 1:1 to an operation
/// named in spec.md §4.3; implementations must apply the caller-side
/// retry policy themselves (typically via [`crate::retry::with_retry`]).
#[async_trait::async_trait]
pub trait MonitorClient: Send + Sync {
    async fn register_node(&self, request: RegisterNodeRequest) -> Result<RegisterNodeResponse, TransportError>;

    async fn node_active(&self, request: NodeActiveRequest) -> Result<NodeState, TransportError>;

    async fn get_other_nodes(&self, node_id: NodeId, state_filter: Option<NodeState>) -> Result<Vec<NodeAddress>, TransportError>;

    async fn get_primary(&self, formation: &Formation, group_id: GroupId) -> Result<NodeAddress, TransportError>;

    async fn get_most_advanced_standby(&self, formation: &Formation, group_id: GroupId) -> Result<NodeAddress, TransportError>;

    async fn remove_node(&self, node_id: NodeId) -> Result<(), TransportError>;

    async fn set_group_system_identifier(&self, group_id: GroupId, system_identifier: SystemIdentifier) -> Result<(), TransportError>;

    async fn update_node_metadata(&self, node_id: NodeId, name: &str, host: &str, port: u16) -> Result<(), TransportError>;

    async fn find_node_by_nodeid(&self, node_id: NodeId) -> Result<NodeAddress, TransportError>;
}
