//! `perform failover` (spec.md §6): triggering a manual failover runs on
//! the monitor, reachable only through a [`pgha_transport::MonitorClient`]
//! this binary does not implement (the pooled SQL connection is out of
//! scope per spec.md §1).

use crate::error::CliError;

pub fn failover(formation: &str, group: u64) -> Result<(), CliError> {
    Err(CliError::Monitor(format!(
        "perform failover for formation={formation} group={group} requires a MonitorClient backend not built into this binary"
    )))
}
