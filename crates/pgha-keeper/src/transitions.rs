//! Implements the transition actions named in spec.md §4.1's table.
//! Each function takes a [`TransitionContext`] bundling the local
//! database driver and the facts the transition needs (primary address,
//! replication credentials, rendered replication source) and returns an
//! error on any failure — per spec.md §4.1, a failed transition must
//! leave `current_role` untouched so the caller retries next loop.

use std::path::{Path, PathBuf};

use pgha_pgctl::LocalPostgres;
use pgha_types::{EngineVersion, NodeState, SyncState};

use crate::error::KeeperError;
use crate::replication_source::ReplicationSource;

/// The peer a standby-bound transition streams from.
#[derive(Debug, Clone)]
pub struct PrimaryAddress {
    pub host: String,
    pub port: u16,
}

/// Everything a transition might need, gathered up front by the FSM
/// driver so the transition functions stay pure with respect to I/O
/// beyond the database driver itself.
pub struct TransitionContext<'a> {
    pub driver: &'a dyn LocalPostgres,
    pub pgdata: PathBuf,
    pub engine_version: EngineVersion,
    pub replication_user: String,
    pub replication_password: String,
    pub primary: Option<PrimaryAddress>,
    pub replication_source: Option<ReplicationSource>,
    pub standby_sync_state: SyncState,
}

impl<'a> TransitionContext<'a> {
    /// Starts the local database if it is not already running. Called by
    /// `fsm_step` before any transition that is not a split-brain hazard
    /// (spec.md §4.1 policy).
    pub fn ensure_running(&self) -> Result<(), KeeperError> {
        if !self.driver.is_running() {
            self.driver.start()?;
        }
        Ok(())
    }

    fn primary(&self) -> Result<&PrimaryAddress, KeeperError> {
        self.primary.as_ref().ok_or(KeeperError::TransitionFailed {
            from: NodeState::Init,
            to: NodeState::WaitStandby,
        })
    }

    fn replication_source(&self) -> Result<&ReplicationSource, KeeperError> {
        self.replication_source
            .as_ref()
            .ok_or(KeeperError::TransitionFailed {
                from: NodeState::WaitStandby,
                to: NodeState::CatchingUp,
            })
    }
}

pub fn execute(from: NodeState, to: NodeState, ctx: &mut TransitionContext<'_>) -> Result<(), KeeperError> {
    let outcome = match (from, to) {
        (NodeState::Init, NodeState::Single) => init_to_single(ctx),
        (NodeState::Init, NodeState::WaitStandby) => init_to_wait_standby(ctx),
        (NodeState::WaitStandby, NodeState::CatchingUp) => wait_standby_to_catchingup(ctx),
        (NodeState::CatchingUp, NodeState::Secondary) => Ok(()),
        (NodeState::Single, NodeState::WaitPrimary) => Ok(()),
        (NodeState::WaitPrimary, NodeState::Primary) => wait_primary_to_primary(ctx),
        (NodeState::Primary, NodeState::PrepareMaintenance) => Ok(()),
        (NodeState::PrepareMaintenance, NodeState::WaitMaintenance) => Ok(()),
        (NodeState::WaitMaintenance, NodeState::Maintenance) => stop_database(ctx),
        (NodeState::Primary, NodeState::Draining) => Ok(()),
        (NodeState::Draining, NodeState::DemoteTimeout) => stop_database(ctx),
        (NodeState::DemoteTimeout, NodeState::Demoted) => stop_database(ctx),
        (NodeState::Secondary, NodeState::PrepPromotion) => Ok(()),
        (NodeState::PrepPromotion, NodeState::StopReplication) => Ok(()),
        (NodeState::StopReplication, NodeState::WaitPrimary) => promote(ctx),
        (NodeState::Secondary, NodeState::ReportLsn) => Ok(()),
        (NodeState::ReportLsn, NodeState::Secondary) => Ok(()),
        (NodeState::Demoted, NodeState::CatchingUp) => demoted_to_catchingup(ctx),
        (_, NodeState::Dropped) => drop_node(from, ctx),
        _ => {
            return Err(KeeperError::NoSuchTransition { from, to });
        }
    };
    outcome.map_err(|_| KeeperError::TransitionFailed { from, to })
}

fn init_to_single(ctx: &TransitionContext<'_>) -> Result<(), KeeperError> {
    if pgdata_is_empty(&ctx.pgdata) {
        ctx.driver.initdb(&ctx.pgdata)?;
    }
    ctx.driver.start()?;
    ctx.driver.write_hba_entry(&ctx.replication_user, "0.0.0.0/0", "md5")?;
    ctx.driver
        .create_replication_role(&ctx.replication_user, &ctx.replication_password)?;
    Ok(())
}

fn init_to_wait_standby(ctx: &TransitionContext<'_>) -> Result<(), KeeperError> {
    let primary = ctx.primary()?;
    ctx.driver.base_backup(&primary.host, primary.port)?;
    let source = ctx.replication_source()?;
    let rendered = source.render(ctx.engine_version);
    let file_name = source.target_file_name(ctx.engine_version);
    ctx.driver.write_replication_source(&rendered, file_name)?;
    ctx.driver.start()?;
    Ok(())
}

fn wait_standby_to_catchingup(ctx: &TransitionContext<'_>) -> Result<(), KeeperError> {
    if !ctx.driver.is_running() {
        ctx.driver.start()?;
    }
    Ok(())
}

fn wait_primary_to_primary(ctx: &TransitionContext<'_>) -> Result<(), KeeperError> {
    if !ctx.standby_sync_state.is_connected() {
        return Err(KeeperError::TransitionFailed {
            from: NodeState::WaitPrimary,
            to: NodeState::Primary,
        });
    }
    Ok(())
}

fn promote(ctx: &TransitionContext<'_>) -> Result<(), KeeperError> {
    ctx.driver.promote()?;
    Ok(())
}

fn demoted_to_catchingup(ctx: &TransitionContext<'_>) -> Result<(), KeeperError> {
    let primary = ctx.primary()?;
    ctx.driver.rewind(&primary.host, primary.port)?;
    let source = ctx.replication_source()?;
    let rendered = source.render(ctx.engine_version);
    let file_name = source.target_file_name(ctx.engine_version);
    ctx.driver.write_replication_source(&rendered, file_name)?;
    ctx.driver.start()?;
    Ok(())
}

fn stop_database(ctx: &TransitionContext<'_>) -> Result<(), KeeperError> {
    if ctx.driver.is_running() {
        ctx.driver.stop()?;
    }
    Ok(())
}

fn drop_node(from: NodeState, ctx: &TransitionContext<'_>) -> Result<(), KeeperError> {
    if from.is_write_capable() || !from.requires_db_stopped() {
        stop_database(ctx)?;
    }
    Ok(())
}

fn pgdata_is_empty(pgdata: &Path) -> bool {
    std::fs::read_dir(pgdata).map(|mut d| d.next().is_none()).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgha_pgctl::fake::FakePostgres;
    use pgha_types::SystemIdentifier;
    use tempfile::tempdir;

    fn ctx(driver: &FakePostgres, pgdata: PathBuf) -> TransitionContext<'_> {
        TransitionContext {
            driver,
            pgdata,
            engine_version: EngineVersion::Major(14),
            replication_user: "pgautofailover_replicator".to_string(),
            replication_password: "s3cret".to_string(),
            primary: Some(PrimaryAddress {
                host: "node-a".to_string(),
                port: 5432,
            }),
            replication_source: Some(ReplicationSource {
                primary_host: "node-a".to_string(),
                primary_port: 5432,
                replication_user: "pgautofailover_replicator".to_string(),
                replication_password: "s3cret".to_string(),
                slot_name: "pgha_2".to_string(),
                backup_rate_cap: String::new(),
                ssl_mode: "require".to_string(),
                target_lsn: None,
            }),
            standby_sync_state: SyncState::Async,
        }
    }

    #[test]
    fn init_to_single_starts_the_database() {
        let driver = FakePostgres::new(SystemIdentifier::new(1));
        let dir = tempdir().unwrap();
        let mut context = ctx(&driver, dir.path().to_path_buf());

        execute(NodeState::Init, NodeState::Single, &mut context).unwrap();
        assert!(driver.is_running());
    }

    #[test]
    fn init_to_wait_standby_writes_replication_source() {
        let driver = FakePostgres::new(SystemIdentifier::new(1));
        let dir = tempdir().unwrap();
        let mut context = ctx(&driver, dir.path().to_path_buf());

        execute(NodeState::Init, NodeState::WaitStandby, &mut context).unwrap();
        assert!(driver.written_source().is_some());
        assert!(driver.is_running());
    }

    #[test]
    fn wait_primary_to_primary_requires_connected_standby() {
        let driver = FakePostgres::new(SystemIdentifier::new(1));
        let dir = tempdir().unwrap();
        let mut context = ctx(&driver, dir.path().to_path_buf());
        context.standby_sync_state = SyncState::Empty;

        assert!(execute(NodeState::WaitPrimary, NodeState::Primary, &mut context).is_err());

        context.standby_sync_state = SyncState::Sync;
        assert!(execute(NodeState::WaitPrimary, NodeState::Primary, &mut context).is_ok());
    }

    #[test]
    fn demote_timeout_to_demoted_stops_the_database() {
        let driver = FakePostgres::new(SystemIdentifier::new(1));
        driver.start().unwrap();
        let dir = tempdir().unwrap();
        let mut context = ctx(&driver, dir.path().to_path_buf());

        execute(NodeState::DemoteTimeout, NodeState::Demoted, &mut context).unwrap();
        assert!(!driver.is_running());
    }

    #[test]
    fn demoted_to_catchingup_rewinds_and_resumes_streaming() {
        let driver = FakePostgres::new(SystemIdentifier::new(1));
        let dir = tempdir().unwrap();
        let mut context = ctx(&driver, dir.path().to_path_buf());

        execute(NodeState::Demoted, NodeState::CatchingUp, &mut context).unwrap();
        assert!(driver.is_running());
        assert!(driver.written_source().is_some());
    }

    #[test]
    fn stop_replication_to_wait_primary_promotes() {
        let driver = FakePostgres::new(SystemIdentifier::new(1));
        let dir = tempdir().unwrap();
        let mut context = ctx(&driver, dir.path().to_path_buf());

        execute(NodeState::StopReplication, NodeState::WaitPrimary, &mut context).unwrap();
        assert_eq!(driver.timeline(), pgha_types::TimelineId::new(2));
    }

    #[test]
    fn undefined_transition_is_rejected() {
        let driver = FakePostgres::new(SystemIdentifier::new(1));
        let dir = tempdir().unwrap();
        let mut context = ctx(&driver, dir.path().to_path_buf());

        assert!(execute(NodeState::Init, NodeState::Primary, &mut context).is_err());
    }

    #[test]
    fn pgdata_empty_detection() {
        let dir = tempdir().unwrap();
        assert!(pgdata_is_empty(dir.path()));
        std::fs::write(dir.path().join("PG_VERSION"), b"14\n").unwrap();
        assert!(!pgdata_is_empty(dir.path()));
    }
}
