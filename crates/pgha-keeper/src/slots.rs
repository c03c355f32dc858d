//! Replication slot reconciliation (spec.md §4.4): creates missing slots,
//! drops slots for nodes removed from the group, and advances each slot up
//! to the LSN last reported by that peer, capped at the local LSN.
//! `CATCHINGUP` explicitly skips this to avoid out-of-range advance errors.

use pgha_pgctl::{LocalPostgres, PgCtlError, SlotName};
use pgha_types::{Lsn, NodeId, NodeState};

/// A peer this node should hold a replication slot for, and the LSN it
/// last reported to the monitor.
#[derive(Debug, Clone, Copy)]
pub struct PeerLsn {
    pub node_id: NodeId,
    pub reported_lsn: Lsn,
}

/// Reconciles local replication slots against `peers`. No-ops entirely
/// when `role` does not maintain slots (spec.md §4.4).
pub fn reconcile_slots(
    driver: &dyn LocalPostgres,
    role: NodeState,
    peers: &[PeerLsn],
    local_lsn: Lsn,
) -> Result<(), PgCtlError> {
    if !role.maintains_slots() {
        return Ok(());
    }

    let existing = driver.list_slots()?;
    let wanted: Vec<SlotName> = peers.iter().map(|p| SlotName::for_node(p.node_id)).collect();

    for slot in &existing {
        if !wanted.contains(&slot.name) {
            driver.drop_slot(&slot.name)?;
        }
    }

    for peer in peers {
        let slot_name = SlotName::for_node(peer.node_id);
        if !existing.iter().any(|s| s.name == slot_name) {
            driver.create_slot(&slot_name)?;
        }
        let target = peer.reported_lsn.min(local_lsn);
        driver.advance_slot(&slot_name, target)?;
    }

    Ok(())
}
