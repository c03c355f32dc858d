use std::fmt::{self, Display};

/// The closed set of states a node's replication role can be in.
///
/// `AnyState` is not a real node state — it only appears as a wildcard
/// target in the keeper's transition table (spec.md §4.1) and is rejected
/// anywhere a concrete `current_role`/`assigned_role` is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum NodeState {
    NoState,
    Init,
    Single,
    WaitPrimary,
    Primary,
    JoinPrimary,
    ApplySettings,
    WaitStandby,
    CatchingUp,
    Secondary,
    PrepPromotion,
    StopReplication,
    PrepareMaintenance,
    WaitMaintenance,
    Maintenance,
    JoinSecondary,
    FastForward,
    Draining,
    DemoteTimeout,
    Demoted,
    ReportLsn,
    Dropped,
    AnyState,
}

impl NodeState {
    /// `PRIMARY`/`SINGLE` are the only states where the node is expected to
    /// hold a writable database (spec.md §3 single-writer invariant).
    pub fn is_write_capable(self) -> bool {
        matches!(self, NodeState::Primary | NodeState::Single)
    }

    /// States that require the local database to be stopped (spec.md §3:
    /// `current_role ∈ {DEMOTED, DEMOTE_TIMEOUT, DRAINING} ⇒ ¬running`).
    pub fn requires_db_stopped(self) -> bool {
        matches!(
            self,
            NodeState::Demoted | NodeState::DemoteTimeout | NodeState::Draining
        )
    }

    /// The "ensure current state before transition" policy (spec.md §4.1):
    /// postgres must not be started before a transition whose source or
    /// target is one of these hazard states.
    pub fn is_split_brain_hazard(self) -> bool {
        matches!(
            self,
            NodeState::Draining | NodeState::Demoted | NodeState::DemoteTimeout
        )
    }

    /// A node reports as a standby (read-only, streaming) in these states.
    pub fn is_standby(self) -> bool {
        matches!(
            self,
            NodeState::WaitStandby
                | NodeState::CatchingUp
                | NodeState::Secondary
                | NodeState::PrepPromotion
                | NodeState::StopReplication
                | NodeState::JoinSecondary
                | NodeState::FastForward
                | NodeState::ReportLsn
        )
    }

    /// Whether a node in this state participates in slot maintenance
    /// reconciliation (spec.md §4.4: `CATCHINGUP` explicitly skips it).
    pub fn maintains_slots(self) -> bool {
        matches!(self, NodeState::Primary | NodeState::Secondary)
    }
}

impl Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeState::NoState => "no_state",
            NodeState::Init => "init",
            NodeState::Single => "single",
            NodeState::WaitPrimary => "wait_primary",
            NodeState::Primary => "primary",
            NodeState::JoinPrimary => "join_primary",
            NodeState::ApplySettings => "apply_settings",
            NodeState::WaitStandby => "wait_standby",
            NodeState::CatchingUp => "catchingup",
            NodeState::Secondary => "secondary",
            NodeState::PrepPromotion => "prep_promotion",
            NodeState::StopReplication => "stop_replication",
            NodeState::PrepareMaintenance => "prepare_maintenance",
            NodeState::WaitMaintenance => "wait_maintenance",
            NodeState::Maintenance => "maintenance",
            NodeState::JoinSecondary => "join_secondary",
            NodeState::FastForward => "fast_forward",
            NodeState::Draining => "draining",
            NodeState::DemoteTimeout => "demote_timeout",
            NodeState::Demoted => "demoted",
            NodeState::ReportLsn => "report_lsn",
            NodeState::Dropped => "dropped",
            NodeState::AnyState => "any_state",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_primary_and_single_are_write_capable() {
        for state in [NodeState::Primary, NodeState::Single] {
            assert!(state.is_write_capable());
        }
        for state in [NodeState::Secondary, NodeState::CatchingUp, NodeState::Demoted] {
            assert!(!state.is_write_capable());
        }
    }

    #[test]
    fn shutdown_states_require_db_stopped() {
        assert!(NodeState::Demoted.requires_db_stopped());
        assert!(NodeState::DemoteTimeout.requires_db_stopped());
        assert!(NodeState::Draining.requires_db_stopped());
        assert!(!NodeState::Primary.requires_db_stopped());
    }

    #[test]
    fn catchingup_does_not_maintain_slots() {
        assert!(!NodeState::CatchingUp.maintains_slots());
        assert!(NodeState::Primary.maintains_slots());
        assert!(NodeState::Secondary.maintains_slots());
    }
}
