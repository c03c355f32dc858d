//! The orchestration algorithm (spec.md §4.3): given a freshly reported
//! node state, decides the node's next assigned state, and — when the
//! primary is down — drives the failover sequence across the whole group.

use pgha_types::{GroupId, Lsn, NodeId, NodeState, TimelineId};

use crate::error::MonitorError;
use crate::registry::Registry;

/// Inputs a `node_active` call reports about itself (spec.md §4.3).
#[derive(Debug, Clone, Copy)]
pub struct ReportedStatus {
    pub reported_state: NodeState,
    pub pg_is_running: bool,
    pub lsn: Lsn,
    pub timeline_id: TimelineId,
}

/// Applies a `node_active` report and computes the node's next assigned
/// state (spec.md §4.3 items 1-4), triggering a failover sequence across
/// the group if the primary has just been found down.
pub fn node_active(
    registry: &mut Registry,
    node_id: NodeId,
    status: ReportedStatus,
    now_unix_seconds: i64,
    network_partition_timeout_seconds: i64,
) -> Result<NodeState, MonitorError> {
    let group_id = registry.find_node_by_nodeid(node_id)?.node.group_id;

    {
        let entry = registry.find_node_by_nodeid_mut(node_id)?;
        entry.reported_state = status.reported_state;
        entry.pg_is_running = status.pg_is_running;
        entry.reported_lsn = status.lsn;
        entry.timeline_id = status.timeline_id;
        entry.last_contact = now_unix_seconds;
    }

    maybe_trigger_failover(registry, group_id, now_unix_seconds, network_partition_timeout_seconds)?;

    Ok(registry.find_node_by_nodeid(node_id)?.assigned_state)
}

/// The old primary's demotion sequence (spec.md §4.3): `PRIMARY ->
/// DRAINING -> DEMOTE_TIMEOUT`.
const PRIMARY_DEMOTE_PATH: [NodeState; 3] = [NodeState::Primary, NodeState::Draining, NodeState::DemoteTimeout];

/// The winning standby's promotion sequence (spec.md §4.3): `SECONDARY ->
/// PREP_PROMOTION -> STOP_REPLICATION -> WAIT_PRIMARY -> PRIMARY`.
const PROMOTION_PATH: [NodeState; 5] = [
    NodeState::Secondary,
    NodeState::PrepPromotion,
    NodeState::StopReplication,
    NodeState::WaitPrimary,
    NodeState::Primary,
];

/// States on [`PRIMARY_DEMOTE_PATH`] / [`PROMOTION_PATH`] that only ever
/// occur mid-failover, never in either node's steady state. A node found
/// in one of these states is proof a failover is already under way,
/// independent of whether the old primary still looks like a `PRIMARY` to
/// [`Registry::get_primary`] (once demoted, it no longer does).
const DEMOTING_STATES: [NodeState; 2] = [NodeState::Draining, NodeState::DemoteTimeout];
const PROMOTING_STATES: [NodeState; 3] = [NodeState::PrepPromotion, NodeState::StopReplication, NodeState::WaitPrimary];

/// Drives the group's failover sequence (spec.md §4.3) one step at a time.
///
/// The keeper's FSM only executes single-step transitions (`fsm_step`), so
/// a node can never be assigned more than one step ahead of what it has
/// last reported reaching; [`advance_one_step`] only advances a node once
/// its `reported_state` has caught up with its current `assigned_state`,
/// i.e. once the node has confirmed the previous step. A node that stops
/// reporting (the old primary, by definition) simply stalls wherever it
/// was last assigned.
///
/// Whether a failover is already in progress is read off the nodes'
/// current `assigned_state`s ([`DEMOTING_STATES`] / [`PROMOTING_STATES`])
/// rather than re-derived via [`Registry::get_primary`] on every call:
/// once the old primary's `assigned_state` leaves `PRIMARY`, it would
/// otherwise no longer be found by that lookup, and the in-progress
/// sequence would be abandoned after its very first step.
fn maybe_trigger_failover(
    registry: &mut Registry,
    group_id: GroupId,
    now_unix_seconds: i64,
    network_partition_timeout_seconds: i64,
) -> Result<(), MonitorError> {
    let members = registry.group_members(group_id);
    let demoting_id = members.iter().find(|m| DEMOTING_STATES.contains(&m.assigned_state)).map(|m| m.node.node_id);
    let promoting_id = members.iter().find(|m| PROMOTING_STATES.contains(&m.assigned_state)).map(|m| m.node.node_id);

    if demoting_id.is_some() || promoting_id.is_some() {
        if let Some(id) = demoting_id {
            advance_one_step(registry, id, &PRIMARY_DEMOTE_PATH)?;
        }
        if let Some(id) = promoting_id {
            advance_one_step(registry, id, &PROMOTION_PATH)?;
        }
        return Ok(());
    }

    let primary = match registry.get_primary(group_id) {
        Ok(primary) if primary.is_down(now_unix_seconds, network_partition_timeout_seconds) => primary,
        _ => return Ok(()),
    };
    let primary_id = primary.node.node_id;
    let winner_id = pick_failover_winner(registry, group_id, primary_id)?;

    advance_one_step(registry, primary_id, &PRIMARY_DEMOTE_PATH)?;
    advance_one_step(registry, winner_id, &PROMOTION_PATH)?;

    let to_fast_forward: Vec<NodeId> = registry
        .group_members(group_id)
        .into_iter()
        .filter(|m| m.node.node_id != primary_id && m.node.node_id != winner_id && m.assigned_state.is_standby())
        .map(|m| m.node.node_id)
        .collect();
    for id in to_fast_forward {
        set_assigned(registry, id, NodeState::FastForward)?;
    }

    Ok(())
}

/// Advances `node_id`'s `assigned_state` to the next state in `path`
/// beyond its current `assigned_state`, but only if `reported_state`
/// already equals `assigned_state` (the node has confirmed the previous
/// step). Otherwise, or if the node's `assigned_state` is not on `path`
/// at all, this is a no-op.
fn advance_one_step(registry: &mut Registry, node_id: NodeId, path: &[NodeState]) -> Result<(), MonitorError> {
    let entry = registry.find_node_by_nodeid_mut(node_id)?;
    if entry.reported_state != entry.assigned_state {
        return Ok(());
    }
    if let Some(idx) = path.iter().position(|&s| s == entry.assigned_state) {
        if let Some(&next) = path.get(idx + 1) {
            entry.assigned_state = next;
        }
    }
    Ok(())
}

/// Picks the standby with the highest reported LSN among those eligible
/// to be promoted (`candidate_priority > 0`), breaking ties by priority
/// then node_id (spec.md §4.3 item 4).
fn pick_failover_winner(registry: &Registry, group_id: GroupId, primary_id: NodeId) -> Result<NodeId, MonitorError> {
    let mut candidates: Vec<_> = registry
        .group_members(group_id)
        .into_iter()
        .filter(|m| m.node.node_id != primary_id)
        .filter(|m| m.node.candidate_priority.is_eligible())
        .collect();

    candidates.sort_by(|a, b| {
        a.reported_lsn
            .cmp(&b.reported_lsn)
            .then(a.node.candidate_priority.cmp(&b.node.candidate_priority))
            .then(a.node.node_id.cmp(&b.node.node_id))
    });

    candidates
        .last()
        .map(|m| m.node.node_id)
        .ok_or(MonitorError::NoEligibleStandby {
            formation: registry.find_node_by_nodeid(primary_id)?.node.formation.clone(),
            group: group_id,
        })
}

fn set_assigned(registry: &mut Registry, node_id: NodeId, state: NodeState) -> Result<(), MonitorError> {
    registry.find_node_by_nodeid_mut(node_id)?.assigned_state = state;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgha_types::{CandidatePriority, Formation, SystemIdentifier};

    fn build_primary_and_standby(registry: &mut Registry) -> (NodeId, NodeId) {
        let (primary_id, _) = registry.register_node(
            Formation::default_formation(),
            "a".into(),
            "h1".into(),
            1,
            GroupId::FIRST,
            SystemIdentifier::unset(),
            CandidatePriority::DEFAULT,
            true,
        );
        let (standby_id, _) = registry.register_node(
            Formation::default_formation(),
            "b".into(),
            "h2".into(),
            2,
            GroupId::FIRST,
            SystemIdentifier::unset(),
            CandidatePriority::DEFAULT,
            true,
        );
        registry.find_node_by_nodeid_mut(primary_id).unwrap().assigned_state = NodeState::Primary;
        registry.find_node_by_nodeid_mut(primary_id).unwrap().reported_state = NodeState::Primary;
        registry.find_node_by_nodeid_mut(standby_id).unwrap().assigned_state = NodeState::Secondary;
        registry.find_node_by_nodeid_mut(standby_id).unwrap().reported_state = NodeState::Secondary;
        registry.find_node_by_nodeid_mut(primary_id).unwrap().pg_is_running = true;
        registry.find_node_by_nodeid_mut(primary_id).unwrap().last_contact = 1_000;
        registry.find_node_by_nodeid_mut(standby_id).unwrap().pg_is_running = true;
        registry.find_node_by_nodeid_mut(standby_id).unwrap().last_contact = 1_000;
        (primary_id, standby_id)
    }

    #[test]
    fn primary_reporting_not_running_advances_both_nodes_by_one_step() {
        let mut registry = Registry::new();
        let (primary_id, standby_id) = build_primary_and_standby(&mut registry);

        let status = ReportedStatus {
            reported_state: NodeState::Primary,
            pg_is_running: false,
            lsn: "0/1000000".parse().unwrap(),
            timeline_id: TimelineId::INITIAL,
        };
        node_active(&mut registry, primary_id, status, 1_010, 20).unwrap();

        assert_eq!(registry.find_node_by_nodeid(primary_id).unwrap().assigned_state, NodeState::Draining);
        assert_eq!(registry.find_node_by_nodeid(standby_id).unwrap().assigned_state, NodeState::PrepPromotion);
    }

    #[test]
    fn winner_only_advances_further_once_it_reports_reaching_the_prior_goal() {
        let mut registry = Registry::new();
        let (primary_id, standby_id) = build_primary_and_standby(&mut registry);

        let primary_down = ReportedStatus {
            reported_state: NodeState::Primary,
            pg_is_running: false,
            lsn: "0/1000000".parse().unwrap(),
            timeline_id: TimelineId::INITIAL,
        };
        node_active(&mut registry, primary_id, primary_down, 1_010, 20).unwrap();
        assert_eq!(registry.find_node_by_nodeid(standby_id).unwrap().assigned_state, NodeState::PrepPromotion);

        // The primary never reports again: it stalls at DRAINING rather
        // than being pushed straight to DEMOTE_TIMEOUT.
        let still_prep_promotion = ReportedStatus {
            reported_state: NodeState::Secondary,
            pg_is_running: true,
            lsn: "0/1000000".parse().unwrap(),
            timeline_id: TimelineId::INITIAL,
        };
        node_active(&mut registry, standby_id, still_prep_promotion, 1_015, 20).unwrap();
        assert_eq!(registry.find_node_by_nodeid(standby_id).unwrap().assigned_state, NodeState::PrepPromotion);
        assert_eq!(registry.find_node_by_nodeid(primary_id).unwrap().assigned_state, NodeState::Draining);

        let reached_prep_promotion = ReportedStatus {
            reported_state: NodeState::PrepPromotion,
            pg_is_running: true,
            lsn: "0/1000000".parse().unwrap(),
            timeline_id: TimelineId::INITIAL,
        };
        node_active(&mut registry, standby_id, reached_prep_promotion, 1_020, 20).unwrap();
        assert_eq!(registry.find_node_by_nodeid(standby_id).unwrap().assigned_state, NodeState::StopReplication);

        let reached_stop_replication = ReportedStatus {
            reported_state: NodeState::StopReplication,
            pg_is_running: true,
            lsn: "0/1000000".parse().unwrap(),
            timeline_id: TimelineId::INITIAL,
        };
        node_active(&mut registry, standby_id, reached_stop_replication, 1_030, 20).unwrap();
        assert_eq!(registry.find_node_by_nodeid(standby_id).unwrap().assigned_state, NodeState::WaitPrimary);

        let reached_wait_primary = ReportedStatus {
            reported_state: NodeState::WaitPrimary,
            pg_is_running: true,
            lsn: "0/1000000".parse().unwrap(),
            timeline_id: TimelineId::INITIAL,
        };
        node_active(&mut registry, standby_id, reached_wait_primary, 1_040, 20).unwrap();
        assert_eq!(registry.find_node_by_nodeid(standby_id).unwrap().assigned_state, NodeState::Primary);

        // primary never stopped reporting as anything but Primary/down, so it
        // is still exactly where it stalled, never skipped ahead.
        assert_eq!(registry.find_node_by_nodeid(primary_id).unwrap().assigned_state, NodeState::Draining);
    }

    #[test]
    fn a_silent_primary_past_partition_timeout_also_triggers_failover() {
        let mut registry = Registry::new();
        let (primary_id, standby_id) = build_primary_and_standby(&mut registry);

        let status = ReportedStatus {
            reported_state: NodeState::Secondary,
            pg_is_running: true,
            lsn: "0/1000000".parse().unwrap(),
            timeline_id: TimelineId::INITIAL,
        };
        node_active(&mut registry, standby_id, status, 1_100, 20).unwrap();

        assert_eq!(registry.find_node_by_nodeid(standby_id).unwrap().assigned_state, NodeState::PrepPromotion);
    }

    #[test]
    fn zero_priority_standby_is_never_picked_as_failover_winner() {
        let mut registry = Registry::new();
        let (primary_id, standby_id) = build_primary_and_standby(&mut registry);
        registry.find_node_by_nodeid_mut(standby_id).unwrap().node.candidate_priority = CandidatePriority::NEVER_PROMOTE;

        let status = ReportedStatus {
            reported_state: NodeState::Primary,
            pg_is_running: false,
            lsn: "0/1000000".parse().unwrap(),
            timeline_id: TimelineId::INITIAL,
        };
        assert!(node_active(&mut registry, primary_id, status, 1_010, 20).is_err());
    }
}
