//! Node/group registry: the monitor's durable view of who is registered
//! in which formation/group and what each last reported (spec.md §3, §4.3).

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use pgha_types::{CandidatePriority, Formation, GroupId, Lsn, Node, NodeId, NodeState, SystemIdentifier, TimelineId};
use serde::{Deserialize, Serialize};

use crate::error::MonitorError;

/// Everything the monitor knows about one node beyond its static
/// [`Node`] identity: its reported replication state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub node: Node,
    pub reported_state: NodeState,
    pub assigned_state: NodeState,
    pub pg_is_running: bool,
    pub reported_lsn: Lsn,
    pub timeline_id: TimelineId,
    /// Unix seconds of the last successful `node_active` from this node.
    pub last_contact: i64,
}

impl NodeEntry {
    /// A node whose last contact exceeds `network_partition_timeout` is
    /// treated as DOWN (spec.md §4.3 item 3), regardless of its last
    /// reported `pg_is_running`.
    pub fn is_down(&self, now_unix_seconds: i64, network_partition_timeout_seconds: i64) -> bool {
        !self.pg_is_running || now_unix_seconds - self.last_contact > network_partition_timeout_seconds
    }
}

/// The registry for a single formation: groups of nodes, keyed by
/// `(group_id, node_id)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registry {
    nodes: HashMap<NodeId, NodeEntry>,
    groups: HashMap<GroupId, Vec<NodeId>>,
    group_system_identifiers: HashMap<GroupId, SystemIdentifier>,
    next_node_id: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            next_node_id: 1,
            ..Default::default()
        }
    }

    /// Registers a new node. The first node in a group enters SINGLE; any
    /// subsequent node enters WAIT_STANDBY (spec.md §4.3).
    #[allow(clippy::too_many_arguments)]
    pub fn register_node(
        &mut self,
        formation: Formation,
        name: String,
        host: String,
        port: u16,
        group_id: GroupId,
        system_identifier: SystemIdentifier,
        candidate_priority: CandidatePriority,
        replication_quorum: bool,
    ) -> (NodeId, NodeState) {
        let node_id = NodeId::from(self.next_node_id);
        self.next_node_id += 1;

        let members = self.groups.entry(group_id).or_default();
        members.push(node_id);

        let initial_reported = NodeState::Init;
        let assigned = if self.groups[&group_id].len() == 1 {
            NodeState::Single
        } else {
            NodeState::WaitStandby
        };

        self.nodes.insert(
            node_id,
            NodeEntry {
                node: Node {
                    node_id,
                    name,
                    host,
                    port,
                    group_id,
                    formation,
                    candidate_priority,
                    replication_quorum,
                    system_identifier,
                },
                reported_state: initial_reported,
                assigned_state: assigned,
                pg_is_running: false,
                reported_lsn: Lsn::ZERO,
                timeline_id: TimelineId::INITIAL,
                last_contact: now_unix_seconds(),
            },
        );

        (node_id, assigned)
    }

    pub fn remove_node(&mut self, node_id: NodeId) -> Result<(), MonitorError> {
        let entry = self.nodes.remove(&node_id).ok_or(MonitorError::NodeNotFound(node_id))?;
        if let Some(members) = self.groups.get_mut(&entry.node.group_id) {
            members.retain(|&id| id != node_id);
        }
        Ok(())
    }

    pub fn find_node_by_nodeid(&self, node_id: NodeId) -> Result<&NodeEntry, MonitorError> {
        self.nodes.get(&node_id).ok_or(MonitorError::NodeNotFound(node_id))
    }

    pub fn find_node_by_nodeid_mut(&mut self, node_id: NodeId) -> Result<&mut NodeEntry, MonitorError> {
        self.nodes.get_mut(&node_id).ok_or(MonitorError::NodeNotFound(node_id))
    }

    pub fn update_node_metadata(&mut self, node_id: NodeId, name: String, host: String, port: u16) -> Result<(), MonitorError> {
        let entry = self.find_node_by_nodeid_mut(node_id)?;
        entry.node.name = name;
        entry.node.host = host;
        entry.node.port = port;
        Ok(())
    }

    pub fn set_group_system_identifier(&mut self, group_id: GroupId, system_identifier: SystemIdentifier) -> Result<(), MonitorError> {
        if self.group_system_identifiers.contains_key(&group_id) {
            return Err(MonitorError::SystemIdentifierAlreadySet(group_id));
        }
        self.group_system_identifiers.insert(group_id, system_identifier);
        Ok(())
    }

    pub fn group_system_identifier(&self, group_id: GroupId) -> Option<SystemIdentifier> {
        self.group_system_identifiers.get(&group_id).copied()
    }

    /// Peers of `node_id`, optionally filtered by `state_filter`, ordered
    /// by node_id (spec.md §4.3).
    pub fn get_other_nodes(&self, node_id: NodeId, state_filter: Option<NodeState>) -> Result<Vec<&NodeEntry>, MonitorError> {
        let entry = self.find_node_by_nodeid(node_id)?;
        let group_id = entry.node.group_id;
        let mut peers: Vec<&NodeEntry> = self
            .nodes
            .values()
            .filter(|n| n.node.group_id == group_id && n.node.node_id != node_id)
            .filter(|n| match state_filter {
                Some(s) => n.reported_state == s,
                None => true,
            })
            .collect();
        peers.sort_by_key(|n| n.node.node_id);
        Ok(peers)
    }

    pub fn get_primary(&self, group_id: GroupId) -> Result<&NodeEntry, MonitorError> {
        self.nodes
            .values()
            .find(|n| n.node.group_id == group_id && n.assigned_state == NodeState::Primary)
            .ok_or(MonitorError::NoPrimary {
                formation: self.any_formation_in_group(group_id),
                group: group_id,
            })
    }

    /// The standby with the numerically largest reported LSN; ties
    /// broken by node_id (spec.md §4.3).
    pub fn get_most_advanced_standby(&self, group_id: GroupId) -> Result<&NodeEntry, MonitorError> {
        self.nodes
            .values()
            .filter(|n| n.node.group_id == group_id && n.reported_state.is_standby())
            .max_by(|a, b| {
                a.reported_lsn
                    .cmp(&b.reported_lsn)
                    .then(a.node.node_id.cmp(&b.node.node_id))
            })
            .ok_or(MonitorError::NoEligibleStandby {
                formation: self.any_formation_in_group(group_id),
                group: group_id,
            })
    }

    pub fn group_members(&self, group_id: GroupId) -> Vec<&NodeEntry> {
        self.groups
            .get(&group_id)
            .map(|ids| ids.iter().filter_map(|id| self.nodes.get(id)).collect())
            .unwrap_or_default()
    }

    fn any_formation_in_group(&self, group_id: GroupId) -> Formation {
        self.nodes
            .values()
            .find(|n| n.node.group_id == group_id)
            .map(|n| n.node.formation.clone())
            .unwrap_or_else(Formation::default_formation)
    }
}

fn now_unix_seconds() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formation() -> Formation {
        Formation::default_formation()
    }

    #[test]
    fn first_node_in_a_group_gets_single_second_gets_wait_standby() {
        let mut registry = Registry::new();
        let (_id_a, state_a) = registry.register_node(
            formation(),
            "node-a".into(),
            "10.0.0.1".into(),
            5432,
            GroupId::FIRST,
            SystemIdentifier::unset(),
            CandidatePriority::DEFAULT,
            true,
        );
        assert_eq!(state_a, NodeState::Single);

        let (_id_b, state_b) = registry.register_node(
            formation(),
            "node-b".into(),
            "10.0.0.2".into(),
            5432,
            GroupId::FIRST,
            SystemIdentifier::unset(),
            CandidatePriority::DEFAULT,
            true,
        );
        assert_eq!(state_b, NodeState::WaitStandby);
    }

    #[test]
    fn get_other_nodes_excludes_self_and_sorts_by_node_id() {
        let mut registry = Registry::new();
        let (id_a, _) = registry.register_node(
            formation(),
            "a".into(),
            "h1".into(),
            1,
            GroupId::FIRST,
            SystemIdentifier::unset(),
            CandidatePriority::DEFAULT,
            true,
        );
        let (id_b, _) = registry.register_node(
            formation(),
            "b".into(),
            "h2".into(),
            2,
            GroupId::FIRST,
            SystemIdentifier::unset(),
            CandidatePriority::DEFAULT,
            true,
        );

        let peers = registry.get_other_nodes(id_a, None).unwrap();
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].node.node_id, id_b);
    }

    #[test]
    fn most_advanced_standby_breaks_ties_by_node_id() {
        let mut registry = Registry::new();
        let (id_a, _) = registry.register_node(
            formation(),
            "a".into(),
            "h1".into(),
            1,
            GroupId::FIRST,
            SystemIdentifier::unset(),
            CandidatePriority::DEFAULT,
            true,
        );
        let (id_b, _) = registry.register_node(
            formation(),
            "b".into(),
            "h2".into(),
            2,
            GroupId::FIRST,
            SystemIdentifier::unset(),
            CandidatePriority::DEFAULT,
            true,
        );

        for id in [id_a, id_b] {
            let entry = registry.find_node_by_nodeid_mut(id).unwrap();
            entry.reported_state = NodeState::Secondary;
            entry.reported_lsn = "0/3000000".parse().unwrap();
        }

        let most_advanced = registry.get_most_advanced_standby(GroupId::FIRST).unwrap();
        assert_eq!(most_advanced.node.node_id, id_b);
    }

    #[test]
    fn remove_node_drops_it_from_its_group() {
        let mut registry = Registry::new();
        let (id_a, _) = registry.register_node(
            formation(),
            "a".into(),
            "h1".into(),
            1,
            GroupId::FIRST,
            SystemIdentifier::unset(),
            CandidatePriority::DEFAULT,
            true,
        );

        registry.remove_node(id_a).unwrap();
        assert!(registry.find_node_by_nodeid(id_a).is_err());
        assert!(registry.group_members(GroupId::FIRST).is_empty());
    }

    #[test]
    fn group_system_identifier_can_only_be_set_once() {
        let mut registry = Registry::new();
        registry.set_group_system_identifier(GroupId::FIRST, SystemIdentifier::new(1)).unwrap();
        assert!(registry.set_group_system_identifier(GroupId::FIRST, SystemIdentifier::new(2)).is_err());
    }
}
