//! The supervisor's PID file (spec.md §4.2): "holds a PID file whose
//! first lines contain supervisor PID, data directory, agent version,
//! extension-version requirement, and a shared semaphore id used to
//! serialize log lines across children."

use std::path::{Path, PathBuf};

use crate::error::SupervisorError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidFile {
    pub supervisor_pid: u32,
    pub data_directory: PathBuf,
    pub agent_version: String,
    pub extension_version_requirement: String,
    pub log_semaphore_id: String,
}

impl PidFile {
    pub fn render(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}\n{}\n",
            self.supervisor_pid,
            self.data_directory.display(),
            self.agent_version,
            self.extension_version_requirement,
            self.log_semaphore_id,
        )
    }

    pub fn write(&self, path: &Path) -> Result<(), SupervisorError> {
        std::fs::write(path, self.render()).map_err(|source| SupervisorError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn read(path: &Path) -> Result<Self, SupervisorError> {
        let contents = std::fs::read_to_string(path).map_err(|source| SupervisorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, path)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, SupervisorError> {
        let mut lines = contents.lines();
        let io_err = |msg: &str| SupervisorError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, msg.to_string()),
        };

        let supervisor_pid = lines
            .next()
            .ok_or_else(|| io_err("missing pid line"))?
            .parse()
            .map_err(|_| io_err("pid line is not a number"))?;
        let data_directory = PathBuf::from(lines.next().ok_or_else(|| io_err("missing data directory line"))?);
        let agent_version = lines.next().ok_or_else(|| io_err("missing agent version line"))?.to_string();
        let extension_version_requirement = lines
            .next()
            .ok_or_else(|| io_err("missing extension version line"))?
            .to_string();
        let log_semaphore_id = lines.next().ok_or_else(|| io_err("missing semaphore id line"))?.to_string();

        Ok(Self {
            supervisor_pid,
            data_directory,
            agent_version,
            extension_version_requirement,
            log_semaphore_id,
        })
    }

    /// Whether the process recorded in this PID file is still alive, used
    /// to detect a stale PID file left by a crashed supervisor.
    #[cfg(unix)]
    pub fn process_is_alive(&self) -> bool {
        // Sending signal 0 checks for existence/permission without
        // actually signaling the process.
        std::process::Command::new("kill")
            .args(["-0", &self.supervisor_pid.to_string()])
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> PidFile {
        PidFile {
            supervisor_pid: 4242,
            data_directory: PathBuf::from("/var/lib/pgha/data"),
            agent_version: "0.1.0".to_string(),
            extension_version_requirement: "1.6".to_string(),
            log_semaphore_id: "pgha-sem-4242".to_string(),
        }
    }

    #[test]
    fn write_then_read_roundtrips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pgha.pid");
        let pid_file = sample();

        pid_file.write(&path).unwrap();
        assert_eq!(PidFile::read(&path).unwrap(), pid_file);
    }

    #[test]
    fn rejects_a_truncated_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pgha.pid");
        std::fs::write(&path, "4242\n/var/lib/pgha/data\n").unwrap();

        assert!(PidFile::read(&path).is_err());
    }
}
