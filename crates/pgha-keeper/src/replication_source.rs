//! Renders the standby-side replication configuration (spec.md §4.4):
//! `recovery.conf` for engines before 12, the post-12 auxiliary standby
//! file for engines from 12 onward.

use pgha_types::{EngineVersion, Lsn};

#[derive(Debug, Clone, PartialEq)]
pub struct ReplicationSource {
    pub primary_host: String,
    pub primary_port: u16,
    pub replication_user: String,
    pub replication_password: String,
    pub slot_name: String,
    /// `max_wal_size`-style backup rate cap, e.g. `100M`. Empty means
    /// unlimited.
    pub backup_rate_cap: String,
    pub ssl_mode: String,
    pub target_lsn: Option<Lsn>,
}

impl ReplicationSource {
    /// This node's own slot name doubles as its replication
    /// `application_name`, so the primary's `pg_stat_replication` view can
    /// be joined back to a specific node (spec.md §4.4).
    pub fn application_name(&self) -> &str {
        &self.slot_name
    }

    fn primary_conninfo(&self) -> String {
        let mut conninfo = format!(
            "host={} port={} user={} password={} sslmode={} application_name={}",
            self.primary_host,
            self.primary_port,
            self.replication_user,
            self.replication_password,
            self.ssl_mode,
            self.application_name(),
        );
        if !self.backup_rate_cap.is_empty() {
            conninfo.push_str(&format!(" options='-c max_wal_size={}'", self.backup_rate_cap));
        }
        conninfo
    }

    /// Renders the config for the given engine version: `recovery.conf`
    /// body (engines under 12) or the post-12 auxiliary standby file body.
    pub fn render(&self, engine: EngineVersion) -> String {
        let mut out = String::new();
        out.push_str(&format!("primary_conninfo = '{}'\n", self.primary_conninfo()));
        out.push_str(&format!("primary_slot_name = '{}'\n", self.slot_name));
        if let Some(target_lsn) = self.target_lsn {
            out.push_str(&format!("recovery_target_lsn = '{target_lsn}'\n"));
            out.push_str("recovery_target_action = 'promote'\n");
        }
        if engine.uses_recovery_conf() {
            out.push_str("standby_mode = 'on'\n");
        }
        out
    }

    /// The filename the rendered content belongs in, relative to PGDATA.
    pub fn target_file_name(&self, engine: EngineVersion) -> &'static str {
        if engine.uses_recovery_conf() {
            "recovery.conf"
        } else {
            "postgresql.auto.conf.d/pgha-standby.conf"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ReplicationSource {
        ReplicationSource {
            primary_host: "node-a".to_string(),
            primary_port: 5432,
            replication_user: "pgautofailover_replicator".to_string(),
            replication_password: "s3cret".to_string(),
            slot_name: "pgautofailover_standby_2".to_string(),
            backup_rate_cap: String::new(),
            ssl_mode: "require".to_string(),
            target_lsn: None,
        }
    }

    #[test]
    fn pre_12_engines_use_recovery_conf_and_standby_mode() {
        let engine = EngineVersion::Major(11);
        let source = sample();
        assert_eq!(source.target_file_name(engine), "recovery.conf");
        assert!(source.render(engine).contains("standby_mode = 'on'"));
    }

    #[test]
    fn post_12_engines_use_the_auxiliary_file_without_standby_mode() {
        let engine = EngineVersion::Major(14);
        let source = sample();
        assert_ne!(source.target_file_name(engine), "recovery.conf");
        assert!(!source.render(engine).contains("standby_mode"));
    }

    #[test]
    fn application_name_matches_slot_name() {
        let source = sample();
        assert_eq!(source.application_name(), "pgautofailover_standby_2");
        assert!(source.render(EngineVersion::Major(14)).contains("pgautofailover_standby_2"));
    }

    #[test]
    fn target_lsn_adds_recovery_target_directives() {
        let mut source = sample();
        source.target_lsn = Some("0/3000060".parse().unwrap());
        let rendered = source.render(EngineVersion::Major(14));
        assert!(rendered.contains("recovery_target_lsn"));
        assert!(rendered.contains("recovery_target_action = 'promote'"));
    }
}
