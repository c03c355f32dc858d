//! `set node candidate-priority` / `set node replication-quorum`
//! (spec.md §6): these update the monitor's registry over
//! [`pgha_transport::MonitorClient::update_node_metadata`], which this
//! binary does not implement a concrete backend for.

use crate::error::CliError;

pub fn candidate_priority(node_id: u64, priority: i32) -> Result<(), CliError> {
    Err(CliError::Monitor(format!(
        "setting candidate_priority={priority} for node {node_id} requires a MonitorClient backend not built into this binary"
    )))
}

pub fn replication_quorum(node_id: u64, quorum: bool) -> Result<(), CliError> {
    Err(CliError::Monitor(format!(
        "setting replication_quorum={quorum} for node {node_id} requires a MonitorClient backend not built into this binary"
    )))
}
