use std::fmt::{self, Display};

use pgha_types::{Lsn, NodeId};

/// A replication slot's name, derived deterministically from the node it
/// protects so the primary and every standby agree on it without a
/// registry lookup (spec.md §4.4: "application name = this node's
/// replication slot name").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotName(String);

impl SlotName {
    pub fn for_node(node_id: NodeId) -> Self {
        Self(format!("pgha_{}", node_id.get()))
    }

    /// Wraps an already-rendered slot name, e.g. one read back from the
    /// database rather than derived from a [`NodeId`].
    pub fn raw(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A replication slot as reported by the local database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationSlot {
    pub name: SlotName,
    pub active: bool,
    pub restart_lsn: Lsn,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_name_is_deterministic_per_node() {
        let a = SlotName::for_node(NodeId::from(3));
        let b = SlotName::for_node(NodeId::from(3));
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "pgha_3");
    }
}
