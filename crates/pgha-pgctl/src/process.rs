//! Real [`LocalPostgres`] implementation, driving `pg_ctl`/`postgres`
//! binaries as child processes: spawn, check liveness, and shell out to
//! the matching `pg_ctl` subcommand for each administrative operation.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use pgha_types::{Lsn, SystemIdentifier};

use crate::{ControlData, IdentifySystem, LocalPostgres, PgCtlError, ReplicationSlot, SlotName};

/// Drives a real Postgres-compatible engine installed at `pg_bin_dir`
/// against the data directory at `pgdata`.
pub struct ProcessPostgres {
    pgdata: PathBuf,
    pg_bin_dir: PathBuf,
    port: u16,
}

impl ProcessPostgres {
    pub fn new(pgdata: PathBuf, pg_bin_dir: PathBuf, port: u16) -> Self {
        Self {
            pgdata,
            pg_bin_dir,
            port,
        }
    }

    fn bin(&self, name: &str) -> PathBuf {
        self.pg_bin_dir.join(name)
    }

    fn pg_ctl(&self, action: &str, extra: &[&str]) -> Result<std::process::Output, PgCtlError> {
        let mut cmd = Command::new(self.bin("pg_ctl"));
        cmd.arg(action)
            .arg("-D")
            .arg(&self.pgdata)
            .arg("-s")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for arg in extra {
            cmd.arg(arg);
        }
        Ok(cmd.output()?)
    }

    /// Runs one SQL statement against the local instance via `psql`,
    /// tuples-only and unaligned so the output is easy to parse back out.
    fn psql(&self, sql: &str) -> Result<std::process::Output, PgCtlError> {
        Ok(Command::new(self.bin("psql"))
            .arg("-p")
            .arg(self.port.to_string())
            .arg("-d")
            .arg("postgres")
            .arg("-tA")
            .arg("-c")
            .arg(sql)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?)
    }
}

impl LocalPostgres for ProcessPostgres {
    fn initdb(&self, pgdata: &std::path::Path) -> Result<(), PgCtlError> {
        let status = Command::new(self.bin("initdb"))
            .arg("-D")
            .arg(pgdata)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(PgCtlError::StartTimeout)
        }
    }

    fn start(&self) -> Result<(), PgCtlError> {
        if self.is_running() {
            return Ok(());
        }
        let output = self.pg_ctl("start", &["-w"])?;
        if output.status.success() {
            tracing::info!(port = self.port, "postgres started");
            Ok(())
        } else {
            Err(PgCtlError::StartTimeout)
        }
    }

    fn stop(&self) -> Result<(), PgCtlError> {
        if !self.is_running() {
            return Ok(());
        }
        let output = self.pg_ctl("stop", &["-m", "fast", "-w"])?;
        if output.status.success() {
            tracing::info!(port = self.port, "postgres stopped");
            Ok(())
        } else {
            Err(PgCtlError::NotRunning)
        }
    }

    fn reload(&self) -> Result<(), PgCtlError> {
        let output = self.pg_ctl("reload", &[])?;
        if output.status.success() {
            Ok(())
        } else {
            Err(PgCtlError::NotRunning)
        }
    }

    fn is_running(&self) -> bool {
        self.pg_ctl("status", &[])
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn read_control_data(&self) -> Result<ControlData, PgCtlError> {
        let output = Command::new(self.bin("pg_controldata"))
            .arg(&self.pgdata)
            .output()?;
        if !output.status.success() {
            return Err(PgCtlError::ControlDataUnreadable {
                path: self.pgdata.display().to_string(),
                reason: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        parse_control_data(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
            PgCtlError::ControlDataUnreadable {
                path: self.pgdata.display().to_string(),
                reason: "unrecognized pg_controldata output".to_string(),
            }
        })
    }

    fn base_backup(&self, primary_host: &str, primary_port: u16) -> Result<(), PgCtlError> {
        let status = Command::new(self.bin("pg_basebackup"))
            .arg("-D")
            .arg(&self.pgdata)
            .arg("-h")
            .arg(primary_host)
            .arg("-p")
            .arg(primary_port.to_string())
            .arg("-X")
            .arg("stream")
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(PgCtlError::BaseBackupFailed {
                host: primary_host.to_string(),
                port: primary_port,
                reason: "pg_basebackup exited non-zero".to_string(),
            })
        }
    }

    fn promote(&self) -> Result<(), PgCtlError> {
        let output = self.pg_ctl("promote", &["-w"])?;
        if output.status.success() {
            Ok(())
        } else {
            Err(PgCtlError::PromoteFailed(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ))
        }
    }

    fn rewind(&self, new_primary_host: &str, new_primary_port: u16) -> Result<(), PgCtlError> {
        let source = format!("host={new_primary_host} port={new_primary_port}");
        let status = Command::new(self.bin("pg_rewind"))
            .arg("--target-pgdata")
            .arg(&self.pgdata)
            .arg("--source-server")
            .arg(&source)
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(PgCtlError::RewindFailed(source))
        }
    }

    fn write_hba_entry(&self, user: &str, cidr: &str, auth_method: &str) -> Result<(), PgCtlError> {
        use std::io::Write;
        let hba_path = self.pgdata.join("pg_hba.conf");
        let line = format!("host replication {user} {cidr} {auth_method}\n");
        let mut file = std::fs::OpenOptions::new().append(true).open(&hba_path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    fn write_replication_source(&self, rendered: &str, path_hint: &str) -> Result<bool, PgCtlError> {
        let path = self.pgdata.join(path_hint);
        let previous = std::fs::read_to_string(&path).unwrap_or_default();
        if previous == rendered {
            return Ok(false);
        }
        std::fs::write(&path, rendered)?;
        Ok(true)
    }

    fn identify_system(&self, host: &str, port: u16) -> Result<IdentifySystem, PgCtlError> {
        // A real implementation speaks the replication protocol's
        // IDENTIFY_SYSTEM command over a replication-mode connection; out
        // of scope here per spec.md §1 ("the database engine itself and
        // its streaming-replication wire protocol").
        Err(PgCtlError::IdentifySystemFailed {
            host: host.to_string(),
            port,
            reason: "replication protocol not implemented by this driver".to_string(),
        })
    }

    fn create_slot(&self, slot_name: &SlotName) -> Result<(), PgCtlError> {
        if self.list_slots()?.iter().any(|s| &s.name == slot_name) {
            return Err(PgCtlError::SlotAlreadyExists(slot_name.to_string()));
        }
        let sql = format!("SELECT pg_create_physical_replication_slot('{slot_name}')");
        let output = self.psql(&sql)?;
        if output.status.success() {
            Ok(())
        } else {
            Err(PgCtlError::AdminCommandFailed(String::from_utf8_lossy(&output.stderr).into_owned()))
        }
    }

    fn drop_slot(&self, slot_name: &SlotName) -> Result<(), PgCtlError> {
        if !self.list_slots()?.iter().any(|s| &s.name == slot_name) {
            return Err(PgCtlError::SlotNotFound(slot_name.to_string()));
        }
        let sql = format!("SELECT pg_drop_replication_slot('{slot_name}')");
        let output = self.psql(&sql)?;
        if output.status.success() {
            Ok(())
        } else {
            Err(PgCtlError::AdminCommandFailed(String::from_utf8_lossy(&output.stderr).into_owned()))
        }
    }

    fn advance_slot(&self, slot_name: &SlotName, target_lsn: Lsn) -> Result<(), PgCtlError> {
        if !self.list_slots()?.iter().any(|s| &s.name == slot_name) {
            return Err(PgCtlError::SlotNotFound(slot_name.to_string()));
        }
        let sql = format!("SELECT pg_replication_slot_advance('{slot_name}', '{target_lsn}')");
        let output = self.psql(&sql)?;
        if output.status.success() {
            Ok(())
        } else {
            Err(PgCtlError::AdminCommandFailed(String::from_utf8_lossy(&output.stderr).into_owned()))
        }
    }

    fn list_slots(&self) -> Result<Vec<ReplicationSlot>, PgCtlError> {
        let output = self.psql("SELECT slot_name, active, restart_lsn FROM pg_replication_slots WHERE slot_type = 'physical'")?;
        if !output.status.success() {
            return Err(PgCtlError::AdminCommandFailed(String::from_utf8_lossy(&output.stderr).into_owned()));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let slots = stdout
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| {
                let mut fields = line.split('|');
                let name = fields.next().unwrap_or_default();
                let active = fields.next().unwrap_or_default();
                let restart_lsn = fields.next().unwrap_or_default();
                ReplicationSlot {
                    name: SlotName::raw(name),
                    active: active == "t",
                    restart_lsn: restart_lsn.parse().unwrap_or(Lsn::ZERO),
                }
            })
            .collect();
        Ok(slots)
    }

    fn create_replication_role(&self, role: &str, password: &str) -> Result<(), PgCtlError> {
        let sql = format!(
            "DO $do$ BEGIN IF NOT EXISTS (SELECT FROM pg_roles WHERE rolname = '{role}') THEN \
             CREATE ROLE \"{role}\" WITH REPLICATION LOGIN PASSWORD '{password}'; END IF; END $do$;"
        );
        let output = self.psql(&sql)?;
        if output.status.success() {
            Ok(())
        } else {
            Err(PgCtlError::AdminCommandFailed(String::from_utf8_lossy(&output.stderr).into_owned()))
        }
    }
}

fn parse_control_data(output: &str) -> Option<ControlData> {
    let mut pg_control_version = None;
    let mut catalog_version_no = None;
    let mut system_identifier = None;

    for line in output.lines() {
        let (key, value) = line.split_once(':')?;
        let value = value.trim();
        match key.trim() {
            "pg_control version number" => pg_control_version = value.parse().ok(),
            "Catalog version number" => catalog_version_no = value.parse().ok(),
            "Database system identifier" => system_identifier = value.parse().ok(),
            _ => {}
        }
    }

    Some(ControlData {
        pg_control_version: pg_control_version?,
        catalog_version_no: catalog_version_no?,
        system_identifier: SystemIdentifier::new(system_identifier?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pg_controldata_output() {
        let sample = "\
pg_control version number:            1300
Catalog version number:               202307071
Database system identifier:           7291234567890123456
";
        let parsed = parse_control_data(sample).unwrap();
        assert_eq!(parsed.pg_control_version, 1300);
        assert_eq!(parsed.catalog_version_no, 202307071);
        assert_eq!(parsed.system_identifier.get(), 7291234567890123456);
    }

    #[test]
    fn parse_control_data_rejects_empty_output() {
        assert!(parse_control_data("").is_none());
    }
}
