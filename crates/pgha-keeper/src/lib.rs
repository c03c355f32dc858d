//! The per-node keeper: the FSM driver that owns `KeeperState` and drives
//! the local database through the transition table (spec.md §4.1), plus
//! the supporting on-disk records (init state, expected status) and the
//! replication-source/slot maintenance logic (spec.md §4.4).
//!
//! The keeper does not itself manage OS processes or talk to the monitor
//! over the network; those responsibilities belong to `pgha-supervisor`
//! and `pgha-transport` respectively. This crate is the pure, testable
//! core: given facts about the world, decide what the local database
//! should look like next.

mod atomic;
mod error;
mod expected_status;
mod fsm;
mod init_file;
mod nodes_cache;
mod replication_source;
mod restart_policy;
mod slots;
mod state_file;
mod transitions;

pub use error::KeeperError;
pub use expected_status::ExpectedPostgresStatus;
pub use fsm::{fsm_step, is_defined, should_ensure_running_before};
pub use init_file::{resume_decision, KeeperInitState, ResumeDecision};
pub use nodes_cache::NodesCache;
pub use replication_source::ReplicationSource;
pub use restart_policy::{RestartPolicy, RestartTracker};
pub use slots::{reconcile_slots, PeerLsn};
pub use state_file::{default_state_path, now_unix_seconds, KeeperState};
pub use transitions::{PrimaryAddress, TransitionContext};
