//! `show state` / `show uri` (spec.md §6): read-only local introspection,
//! no monitor connection required.

use std::path::Path;

use pgha_config::{KeeperConfig, ConfigLoader, Paths};
use pgha_keeper::KeeperState;

use crate::error::CliError;

pub fn state(pgdata: &Path) -> Result<(), CliError> {
    let path = Paths::keeper_state_file(pgdata);
    let state = KeeperState::load(&path)?;

    println!("node_id:           {}", state.current_node_id);
    println!("group_id:          {}", state.current_group);
    println!("current_role:      {}", state.current_role);
    println!("assigned_role:     {}", state.assigned_role);
    println!("system_identifier: {}", state.system_identifier);
    println!("timeline_id:       {}", state.timeline_id.get());
    println!("last_reported_lsn: {}", state.xlog_lsn_last_reported);
    println!("last_monitor_contact: {}", state.last_monitor_contact);
    Ok(())
}

pub fn uri(pgdata: &Path) -> Result<(), CliError> {
    let config: KeeperConfig = ConfigLoader::new().with_data_dir(pgdata).load()?;
    println!(
        "postgres://{}:{}/postgres?sslmode={}",
        config.hostname, config.pg_port, config.ssl_mode
    );
    Ok(())
}
