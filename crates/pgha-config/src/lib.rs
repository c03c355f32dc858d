//! Configuration loading for pgha keeper and monitor processes.
//!
//! Loads hierarchically from multiple sources, in precedence order:
//! 1. Environment variables (`PGHA_*`)
//! 2. `<data_dir>/pgha.local.toml` (gitignored local overrides)
//! 3. `<data_dir>/pgha.toml` (tracked node config)
//! 4. `~/.config/pgha/config.toml` (user defaults)
//! 5. Built-in defaults (lowest precedence)
//!
//! The on-disk file *format* is outside the core's scope (spec.md §1); this
//! loader only specifies the ambient loading mechanics.

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

use std::path::PathBuf;
use std::time::Duration;

use pgha_types::Formation;
use serde::{Deserialize, Serialize};

/// Tuning knobs shared by keeper and monitor (spec.md §5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    /// `node_active` polling cadence, default 5s (spec.md §4.1).
    pub node_active_period: Duration,
    /// A node whose last contact exceeds this is treated as DOWN
    /// (spec.md §4.3 item 3).
    pub network_partition_timeout: Duration,
    /// Restart-under-failure tolerance window on PRIMARY (spec.md §4.1).
    pub postgresql_restart_failure_timeout: Duration,
    /// Restart-under-failure retry budget on PRIMARY (spec.md §4.1).
    pub postgresql_restart_failure_max_retries: u32,
    /// DB controller poll interval, default 100ms (spec.md §4.2).
    pub db_controller_poll_interval: Duration,
    /// Supervisor graceful-stop budget before SIGKILL (spec.md §5).
    pub supervisor_stop_timeout: Duration,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            node_active_period: Duration::from_secs(5),
            network_partition_timeout: Duration::from_secs(20),
            postgresql_restart_failure_timeout: Duration::from_secs(20),
            postgresql_restart_failure_max_retries: 3,
            db_controller_poll_interval: Duration::from_millis(100),
            supervisor_stop_timeout: Duration::from_secs(30),
        }
    }
}

/// Interactive vs. main-loop retry policy (spec.md §5, §6).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicyConfig {
    pub initial_backoff: Duration,
    pub multiplier: f64,
    pub max_backoff: Duration,
    /// `None` means unbounded (the keeper's main loop policy).
    pub deadline: Option<Duration>,
}

impl RetryPolicyConfig {
    /// The interactive policy used for `create`/`drop`/CLI-driven calls:
    /// bounded at 30s total (spec.md §5).
    pub fn interactive() -> Self {
        Self {
            initial_backoff: Duration::from_millis(350),
            multiplier: 1.5,
            max_backoff: Duration::from_secs(3),
            deadline: Some(Duration::from_secs(30)),
        }
    }

    /// The main-loop policy used by `node_active`: same backoff shape,
    /// unbounded deadline (spec.md §5).
    pub fn main_loop() -> Self {
        Self {
            deadline: None,
            ..Self::interactive()
        }
    }
}

impl Default for RetryPolicyConfig {
    fn default() -> Self {
        Self::main_loop()
    }
}

/// Fields that MUST NOT change across a SIGHUP reload (spec.md §5, §7
/// class 3). Kept separate from [`KeeperConfig`] so the reload path can
/// diff just these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIdentity {
    pub pgdata: PathBuf,
    pub formation: Formation,
}

/// Per-node keeper configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeeperConfig {
    pub pgdata: PathBuf,
    pub formation: Formation,
    pub monitor_uri: String,
    pub hostname: String,
    pub pg_port: u16,
    pub listen_address: String,
    pub timeouts: TimeoutsConfig,
    pub ssl_mode: String,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            pgdata: PathBuf::from("./pgdata"),
            formation: Formation::default_formation(),
            monitor_uri: String::new(),
            hostname: "127.0.0.1".to_string(),
            pg_port: 5432,
            listen_address: "*".to_string(),
            timeouts: TimeoutsConfig::default(),
            ssl_mode: "prefer".to_string(),
        }
    }
}

impl KeeperConfig {
    pub fn identity(&self) -> NodeIdentity {
        NodeIdentity {
            pgdata: self.pgdata.clone(),
            formation: self.formation.clone(),
        }
    }

    /// Applies a reloaded configuration, refusing any change to node
    /// identity (spec.md §5 SIGHUP semantics). The monitor URI, timeouts,
    /// and SSL settings MAY change.
    pub fn apply_reload(&mut self, reloaded: KeeperConfig) -> Result<(), ConfigError> {
        if reloaded.pgdata != self.pgdata {
            return Err(ConfigError::ImmutableFieldChanged {
                field: "pgdata",
                old: self.pgdata.display().to_string(),
                new: reloaded.pgdata.display().to_string(),
            });
        }
        if reloaded.formation != self.formation {
            return Err(ConfigError::ImmutableFieldChanged {
                field: "formation",
                old: self.formation.to_string(),
                new: reloaded.formation.to_string(),
            });
        }

        self.monitor_uri = reloaded.monitor_uri;
        self.timeouts = reloaded.timeouts;
        self.ssl_mode = reloaded.ssl_mode;
        Ok(())
    }
}

/// Monitor-process configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub listen_address: String,
    pub pg_port: u16,
    pub timeouts: TimeoutsConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            listen_address: "*".to_string(),
            pg_port: 5433,
            timeouts: TimeoutsConfig::default(),
        }
    }
}
