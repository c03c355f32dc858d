//! `enable monitor` / `disable monitor` (spec.md §6): toggles whether
//! this node reports to a monitor, by clearing or requiring the local
//! `monitor_uri` override. Does not itself contact the monitor — actual
//! registration happens the next time `run` starts the FSM driver.

use std::path::Path;

use pgha_config::{ConfigLoader, KeeperConfig, Paths};

use crate::error::CliError;

pub fn enable(pgdata: &Path) -> Result<(), CliError> {
    let config: KeeperConfig = ConfigLoader::new().with_data_dir(pgdata).load()?;
    if config.monitor_uri.is_empty() {
        return Err(CliError::BadArgs(
            "no monitor URI on record; run `create postgres --monitor <uri>` first".to_string(),
        ));
    }
    tracing::info!(monitor = %config.monitor_uri, "monitor reporting enabled");
    Ok(())
}

pub fn disable(pgdata: &Path) -> Result<(), CliError> {
    let mut config: KeeperConfig = ConfigLoader::new().with_data_dir(pgdata).load()?;
    config.monitor_uri.clear();
    let contents = toml::to_string_pretty(&config).map_err(|source| CliError::Internal(source.to_string()))?;
    std::fs::write(Paths::local_config_file(pgdata), contents)
        .map_err(|source| CliError::Internal(source.to_string()))?;
    tracing::info!("monitor reporting disabled, node will run standalone");
    Ok(())
}
