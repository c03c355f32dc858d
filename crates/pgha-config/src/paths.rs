//! Path utilities and XDG directory discovery.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::ConfigError;

/// XDG-compliant paths for pgha.
pub struct Paths {
    project_dirs: Option<ProjectDirs>,
}

impl Paths {
    pub fn new() -> Self {
        Self {
            project_dirs: ProjectDirs::from("io", "pgha", "pgha"),
        }
    }

    /// `~/.config/pgha/`
    pub fn user_config_dir(&self) -> Result<PathBuf, ConfigError> {
        self.project_dirs
            .as_ref()
            .map(|p| p.config_dir().to_path_buf())
            .ok_or_else(|| ConfigError::XdgError("failed to determine user config directory".to_string()))
    }

    /// `~/.config/pgha/config.toml`
    pub fn user_config_file(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.user_config_dir()?.join("config.toml"))
    }

    /// `<data_dir>/pgha.toml`
    pub fn node_config_file(data_dir: impl AsRef<Path>) -> PathBuf {
        data_dir.as_ref().join("pgha.toml")
    }

    /// `<data_dir>/pgha.local.toml` (gitignored local overrides)
    pub fn local_config_file(data_dir: impl AsRef<Path>) -> PathBuf {
        data_dir.as_ref().join("pgha.local.toml")
    }

    /// `<data_dir>/pgha.state`: the keeper's persisted state.
    pub fn keeper_state_file(data_dir: impl AsRef<Path>) -> PathBuf {
        data_dir.as_ref().join("pgha.state")
    }

    /// `<data_dir>/pgha.init`: the in-progress init marker.
    pub fn keeper_init_file(data_dir: impl AsRef<Path>) -> PathBuf {
        data_dir.as_ref().join("pgha.init")
    }

    /// `<data_dir>/pgha.pid`: the supervisor's PID file.
    pub fn pid_file(data_dir: impl AsRef<Path>) -> PathBuf {
        data_dir.as_ref().join("pgha.pid")
    }

    /// `<data_dir>/pgha.nodes`: the offline peer cache.
    pub fn nodes_cache_file(data_dir: impl AsRef<Path>) -> PathBuf {
        data_dir.as_ref().join("pgha.nodes")
    }

    pub fn is_initialized(data_dir: impl AsRef<Path>) -> bool {
        Self::node_config_file(data_dir).exists()
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}
