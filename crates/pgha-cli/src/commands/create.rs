//! `create postgres` / `create monitor` (spec.md §6): local
//! initialization. Registration against a live monitor requires a
//! [`pgha_transport::MonitorClient`] implementation, which this build does
//! not carry (the pooled SQL connection is explicitly out of scope); a
//! `--monitor` URI is accepted and persisted, but registration itself is
//! reported as unavailable rather than faked.

use std::path::{Path, PathBuf};

use pgha_config::{KeeperConfig, MonitorConfig, Paths};
use pgha_keeper::{resume_decision, KeeperInitState, ResumeDecision};
use pgha_pgctl::{LocalPostgres, ProcessPostgres};
use pgha_types::Formation;

use crate::error::CliError;

pub fn postgres(
    pgdata: &Path,
    formation: &str,
    hostname: &str,
    pg_port: u16,
    monitor_uri: Option<&str>,
    pg_bin_dir: &str,
) -> Result<(), CliError> {
    if Paths::is_initialized(pgdata) {
        return Err(CliError::BadArgs(format!(
            "{} is already initialized (pgha.toml exists)",
            pgdata.display()
        )));
    }

    let init_path = Paths::keeper_init_file(pgdata);
    let state_path = Paths::keeper_state_file(pgdata);
    let decision = resume_decision(&init_path, &state_path)?;

    let driver = ProcessPostgres::new(pgdata.to_path_buf(), PathBuf::from(pg_bin_dir), pg_port);

    match decision {
        ResumeDecision::AlreadyInitialized => {
            return Err(CliError::BadArgs("a keeper state file already exists here".to_string()));
        }
        ResumeDecision::FreshInit => {
            KeeperInitState::PgDataEmpty.save(&init_path)?;
            driver.initdb(pgdata)?;
            KeeperInitState::PgDataExists.save(&init_path)?;
            tracing::info!(pgdata = %pgdata.display(), "initialized a fresh PGDATA");
        }
        ResumeDecision::ResumeCrashedInit => {
            tracing::info!(pgdata = %pgdata.display(), "resuming an init that was interrupted");
        }
    }

    let config = KeeperConfig {
        pgdata: pgdata.to_path_buf(),
        formation: Formation::new(formation),
        monitor_uri: monitor_uri.unwrap_or_default().to_string(),
        hostname: hostname.to_string(),
        pg_port,
        ..KeeperConfig::default()
    };
    write_config(pgdata, &config)?;

    if let Some(uri) = monitor_uri {
        tracing::warn!(
            monitor = uri,
            "monitor URI recorded, but registering with a live monitor requires a MonitorClient backend not built into this binary"
        );
    } else {
        tracing::info!("no --monitor given; this node will run standalone (SINGLE) until one is configured");
    }

    Ok(())
}

pub fn monitor(pgdata: &Path, listen_address: &str, pg_port: u16) -> Result<(), CliError> {
    if Paths::is_initialized(pgdata) {
        return Err(CliError::BadArgs(format!(
            "{} is already initialized",
            pgdata.display()
        )));
    }

    std::fs::create_dir_all(pgdata).map_err(|source| CliError::Internal(source.to_string()))?;

    let config = MonitorConfig {
        listen_address: listen_address.to_string(),
        pg_port,
        ..MonitorConfig::default()
    };
    let contents = toml::to_string_pretty(&config).map_err(|source| CliError::Internal(source.to_string()))?;
    std::fs::write(Paths::node_config_file(pgdata), contents)
        .map_err(|source| CliError::Internal(source.to_string()))?;

    tracing::info!(pgdata = %pgdata.display(), "wrote monitor configuration");
    Ok(())
}

fn write_config(pgdata: &Path, config: &KeeperConfig) -> Result<(), CliError> {
    std::fs::create_dir_all(pgdata).map_err(|source| CliError::Internal(source.to_string()))?;
    let contents = toml::to_string_pretty(config).map_err(|source| CliError::Internal(source.to_string()))?;
    std::fs::write(Paths::node_config_file(pgdata), contents)
        .map_err(|source| CliError::Internal(source.to_string()))
}
