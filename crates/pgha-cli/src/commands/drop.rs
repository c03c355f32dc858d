//! `drop node` (spec.md §6): removing a node from the monitor's registry
//! requires a [`pgha_transport::MonitorClient`]; only the local `--destroy`
//! cleanup is implemented here (see [`crate::commands::create`]).

use std::path::Path;

use pgha_config::Paths;

use crate::error::CliError;

pub fn node(pgdata: &Path, destroy: bool) -> Result<(), CliError> {
    if !Paths::is_initialized(pgdata) {
        return Err(CliError::BadArgs(format!("{} is not initialized", pgdata.display())));
    }

    if !destroy {
        return Err(CliError::Monitor(
            "removing this node from the monitor's registry requires a MonitorClient backend not built into this binary; pass --destroy to wipe local state only".to_string(),
        ));
    }

    for path in [
        Paths::node_config_file(pgdata),
        Paths::local_config_file(pgdata),
        Paths::keeper_state_file(pgdata),
        Paths::keeper_init_file(pgdata),
        Paths::pid_file(pgdata),
    ] {
        if path.exists() {
            std::fs::remove_file(&path).map_err(|source| CliError::Internal(source.to_string()))?;
        }
    }
    tracing::warn!(pgdata = %pgdata.display(), "removed local keeper state; PGDATA itself was left in place");
    Ok(())
}
