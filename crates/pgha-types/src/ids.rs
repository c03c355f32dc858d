use std::fmt::{self, Display};

/// Identity of a node, assigned by the monitor at registration.
///
/// Stable for the life of the node; never reused after `drop node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// The monitor assigns ids starting at 1; 0 is never a valid node id.
    pub const FIRST: NodeId = NodeId(1);

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<NodeId> for u64 {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// Identity of a replication group: one primary plus its standbys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct GroupId(u64);

impl GroupId {
    /// The first group created within a formation.
    pub const FIRST: GroupId = GroupId(0);

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for GroupId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Name of a formation: a set of groups sharing one logical application
/// database configuration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct Formation(String);

impl Formation {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The formation every `create postgres` targets unless told otherwise.
    pub fn default_formation() -> Self {
        Self("default".to_string())
    }
}

impl Display for Formation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Formation {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A large integer uniquely identifying a physical database cluster.
///
/// Read from the database's control file at init; constant for the life of
/// a group. A mismatch between two nodes that claim to be in the same group
/// is a hard error (spec.md §3 invariants).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SystemIdentifier(u64);

impl SystemIdentifier {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// A group's system identifier is unset until its first node finishes
    /// init; `NodeState::NoState`/`Init` nodes report this value.
    pub fn unset() -> Self {
        Self(0)
    }

    pub fn is_set(self) -> bool {
        self.0 != 0
    }
}

impl Display for SystemIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_roundtrips_through_u64() {
        let id = NodeId::from(42);
        assert_eq!(u64::from(id), 42);
        assert_eq!(id.next(), NodeId::from(43));
    }

    #[test]
    fn group_id_first_is_zero() {
        assert_eq!(GroupId::FIRST.get(), 0);
        assert_eq!(GroupId::FIRST.next(), GroupId::new(1));
    }

    #[test]
    fn system_identifier_unset_is_not_set() {
        assert!(!SystemIdentifier::unset().is_set());
        assert!(SystemIdentifier::new(123456).is_set());
    }
}
