use pgha_types::{Formation, GroupId, NodeId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("no primary in formation {formation} group {group}")]
    NoPrimary { formation: Formation, group: GroupId },

    #[error("no eligible standby in formation {formation} group {group}")]
    NoEligibleStandby { formation: Formation, group: GroupId },

    #[error("group {0} already has a system identifier assigned")]
    SystemIdentifierAlreadySet(GroupId),

    #[error("registration retried past its budget due to repeated OBJECT_IN_USE conflicts")]
    RegistrationConflict,
}
