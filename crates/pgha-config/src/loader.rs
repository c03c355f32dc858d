//! Configuration loader with multi-source merging.

use std::env;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::{ConfigError, Paths};

/// Builder-style configuration loader, generic over the config struct being
/// loaded (`KeeperConfig` or `MonitorConfig`).
pub struct ConfigLoader {
    data_dir: PathBuf,
    env_prefix: String,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            data_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "PGHA".to_string(),
        }
    }

    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Loads `T` from all sources with proper precedence, falling back to
    /// `T::default()` wherever a layer doesn't set a field.
    pub fn load<T>(self) -> Result<T, ConfigError>
    where
        T: Default + serde::Serialize + DeserializeOwned,
    {
        let mut builder = config::Config::builder();

        let defaults = T::default();
        builder = builder
            .add_source(config::Config::try_from(&defaults).map_err(|e| ConfigError::BuildError(e.to_string()))?);

        let paths = Paths::new();
        if let Ok(user_config_file) = paths.user_config_file() {
            if user_config_file.exists() {
                builder = builder.add_source(
                    config::File::from(user_config_file)
                        .required(false)
                        .format(config::FileFormat::Toml),
                );
            }
        }

        let node_config_file = Paths::node_config_file(&self.data_dir);
        if node_config_file.exists() {
            builder = builder.add_source(
                config::File::from(node_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        let local_config_file = Paths::local_config_file(&self.data_dir);
        if local_config_file.exists() {
            builder = builder.add_source(
                config::File::from(local_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .separator("_")
                .try_parsing(true),
        );

        let built = builder
            .build()
            .map_err(|e| ConfigError::BuildError(e.to_string()))?;

        built
            .try_deserialize()
            .map_err(|e| ConfigError::BuildError(e.to_string()))
    }

    pub fn load_or_default<T>(self) -> T
    where
        T: Default + serde::Serialize + DeserializeOwned,
    {
        self.load().unwrap_or_default()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeeperConfig;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn loads_defaults_with_no_files_present() {
        let temp = tempdir().unwrap();
        let cfg: KeeperConfig = ConfigLoader::new()
            .with_data_dir(temp.path())
            .load()
            .unwrap();

        assert_eq!(cfg.pg_port, 5432);
    }

    #[test]
    fn node_config_overrides_defaults() {
        let temp = tempdir().unwrap();
        fs::write(
            Paths::node_config_file(temp.path()),
            "pg_port = 6000\nhostname = \"db-1\"\n",
        )
        .unwrap();

        let cfg: KeeperConfig = ConfigLoader::new()
            .with_data_dir(temp.path())
            .load()
            .unwrap();

        assert_eq!(cfg.pg_port, 6000);
        assert_eq!(cfg.hostname, "db-1");
    }

    #[test]
    fn local_overrides_take_precedence_over_node_config() {
        let temp = tempdir().unwrap();
        fs::write(Paths::node_config_file(temp.path()), "pg_port = 6000\n").unwrap();
        fs::write(Paths::local_config_file(temp.path()), "pg_port = 6001\n").unwrap();

        let cfg: KeeperConfig = ConfigLoader::new()
            .with_data_dir(temp.path())
            .load()
            .unwrap();

        assert_eq!(cfg.pg_port, 6001);
    }
}
