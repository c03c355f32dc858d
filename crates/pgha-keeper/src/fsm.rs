//! The transition table and driving loop (spec.md §4.1): given
//! `(current_role, assigned_role)`, look up and execute the transition,
//! then atomically advance `current_role` only on success.

use pgha_types::NodeState;

use crate::error::KeeperError;
use crate::transitions::{self, TransitionContext};

/// Looks up whether a transition from `from` to `to` is defined.
///
/// The table in spec.md §4.1 lists the essential transitions; everything
/// not named there (including any transition into `DROPPED`, which the
/// table marks `any -> DROPPED`) either matches a wildcard arm or is
/// rejected.
pub fn is_defined(from: NodeState, to: NodeState) -> bool {
    if to == NodeState::Dropped {
        return true;
    }
    matches!(
        (from, to),
        (NodeState::Init, NodeState::Single)
            | (NodeState::Init, NodeState::WaitStandby)
            | (NodeState::WaitStandby, NodeState::CatchingUp)
            | (NodeState::CatchingUp, NodeState::Secondary)
            | (NodeState::Single, NodeState::WaitPrimary)
            | (NodeState::WaitPrimary, NodeState::Primary)
            | (NodeState::Primary, NodeState::PrepareMaintenance)
            | (NodeState::PrepareMaintenance, NodeState::WaitMaintenance)
            | (NodeState::WaitMaintenance, NodeState::Maintenance)
            | (NodeState::Primary, NodeState::Draining)
            | (NodeState::Draining, NodeState::DemoteTimeout)
            | (NodeState::DemoteTimeout, NodeState::Demoted)
            | (NodeState::Secondary, NodeState::PrepPromotion)
            | (NodeState::PrepPromotion, NodeState::StopReplication)
            | (NodeState::StopReplication, NodeState::WaitPrimary)
            | (NodeState::Secondary, NodeState::ReportLsn)
            | (NodeState::ReportLsn, NodeState::Secondary)
            | (NodeState::Demoted, NodeState::CatchingUp)
    )
}

/// The "ensure current state before transition" policy (spec.md §4.1):
/// postgres must not be started before a transition whose source or
/// target is a split-brain hazard state (DRAINING / DEMOTED /
/// DEMOTE_TIMEOUT); otherwise it must be ensured running first.
pub fn should_ensure_running_before(from: NodeState, to: NodeState) -> bool {
    !(from.is_split_brain_hazard() || to.is_split_brain_hazard())
}

/// Executes one `fsm_step`: if `current_role != assigned_role`, runs the
/// transition and, only on success, returns the new role to persist.
/// Returns `Ok(None)` when there is nothing to do.
pub fn fsm_step(
    current_role: NodeState,
    assigned_role: NodeState,
    ctx: &mut TransitionContext<'_>,
) -> Result<Option<NodeState>, KeeperError> {
    if current_role == assigned_role {
        return Ok(None);
    }
    if !is_defined(current_role, assigned_role) {
        return Err(KeeperError::NoSuchTransition {
            from: current_role,
            to: assigned_role,
        });
    }

    if should_ensure_running_before(current_role, assigned_role) {
        ctx.ensure_running()?;
    }

    transitions::execute(current_role, assigned_role, ctx)?;
    Ok(Some(assigned_role))
}
