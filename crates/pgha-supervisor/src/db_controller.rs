//! The DB controller loop (spec.md §4.2): reads `ExpectedPostgresStatus`
//! every 100ms and reconciles the local database against it. This is the
//! only writer of the database PID file and the only process that ever
//! starts or stops the database subprocess directly.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pgha_keeper::{ExpectedPostgresStatus, RestartPolicy, RestartTracker};
use pgha_pgctl::LocalPostgres;
use pgha_types::NodeState;
use tracing::{info, warn};

use crate::error::SupervisorError;

/// Cooperative cancellation flag, set by the supervisor's signal handler
/// and polled by every loop at iteration boundaries (spec.md §5).
pub type CancelFlag = Arc<AtomicBool>;

pub struct DbController<'a> {
    driver: &'a dyn LocalPostgres,
    status_path: PathBuf,
    poll_interval: Duration,
    restart_tracker: RestartTracker,
    restart_policy: RestartPolicy,
    started_by_controller: bool,
}

impl<'a> DbController<'a> {
    pub fn new(driver: &'a dyn LocalPostgres, status_path: PathBuf, poll_interval: Duration, restart_policy: RestartPolicy) -> Self {
        Self {
            driver,
            status_path,
            poll_interval,
            restart_tracker: RestartTracker::default(),
            restart_policy,
            started_by_controller: false,
        }
    }

    /// Runs until `cancel` is set. On a cancellation observed while the
    /// expected status is STOPPED, stops the database before returning
    /// (spec.md §5: "DB controller stops the DB only if the current
    /// expected status is STOPPED").
    pub async fn run(&mut self, role: NodeState, cancel: &CancelFlag, now_unix_seconds: fn() -> i64) -> Result<(), SupervisorError> {
        loop {
            if cancel.load(Ordering::SeqCst) {
                let expected = ExpectedPostgresStatus::load_or_default(&self.status_path)?;
                if matches!(expected, ExpectedPostgresStatus::Stopped) && self.driver.is_running() {
                    self.driver.stop()?;
                }
                return Ok(());
            }

            self.reconcile_once(role, now_unix_seconds())?;
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    fn reconcile_once(&mut self, role: NodeState, now_unix_seconds: i64) -> Result<(), SupervisorError> {
        let expected = ExpectedPostgresStatus::load_or_default(&self.status_path)?;

        match expected {
            ExpectedPostgresStatus::Unknown => {}
            ExpectedPostgresStatus::Stopped => {
                if self.driver.is_running() {
                    self.driver.stop()?;
                    self.started_by_controller = false;
                }
            }
            ExpectedPostgresStatus::Running => {
                self.ensure_running(role, now_unix_seconds)?;
            }
            ExpectedPostgresStatus::RunningAsSubprocess => {
                if self.driver.is_running() && !self.started_by_controller {
                    self.driver.stop()?;
                }
                self.ensure_running(role, now_unix_seconds)?;
            }
        }
        Ok(())
    }

    fn ensure_running(&mut self, role: NodeState, now_unix_seconds: i64) -> Result<(), SupervisorError> {
        if self.driver.is_running() {
            return Ok(());
        }
        match self.driver.start() {
            Ok(()) => {
                self.started_by_controller = true;
                self.restart_tracker.record_success();
                info!("database started");
                Ok(())
            }
            Err(err) => {
                self.restart_tracker.record_failure(now_unix_seconds);
                if self.restart_tracker.tolerates(role, self.restart_policy, now_unix_seconds) {
                    warn!(%err, "database failed to start, tolerating under restart policy");
                    Ok(())
                } else {
                    Err(err.into())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgha_pgctl::fake::FakePostgres;
    use pgha_types::SystemIdentifier;
    use tempfile::tempdir;

    fn status_path(dir: &std::path::Path) -> PathBuf {
        dir.join("pgha.status")
    }

    #[test]
    fn unknown_status_takes_no_action() {
        let driver = FakePostgres::new(SystemIdentifier::new(1));
        let dir = tempdir().unwrap();
        let mut controller = DbController::new(&driver, status_path(dir.path()), Duration::from_millis(100), RestartPolicy::new(3, 20));

        controller.reconcile_once(NodeState::Primary, 1_000).unwrap();
        assert!(!driver.is_running());
    }

    #[test]
    fn running_status_starts_a_stopped_database() {
        let driver = FakePostgres::new(SystemIdentifier::new(1));
        let dir = tempdir().unwrap();
        let path = status_path(dir.path());
        ExpectedPostgresStatus::Running.save(&path).unwrap();
        let mut controller = DbController::new(&driver, path, Duration::from_millis(100), RestartPolicy::new(3, 20));

        controller.reconcile_once(NodeState::Primary, 1_000).unwrap();
        assert!(driver.is_running());
    }

    #[test]
    fn stopped_status_stops_a_running_database() {
        let driver = FakePostgres::new(SystemIdentifier::new(1));
        driver.start().unwrap();
        let dir = tempdir().unwrap();
        let path = status_path(dir.path());
        ExpectedPostgresStatus::Stopped.save(&path).unwrap();
        let mut controller = DbController::new(&driver, path, Duration::from_millis(100), RestartPolicy::new(3, 20));

        controller.reconcile_once(NodeState::Primary, 1_000).unwrap();
        assert!(!driver.is_running());
    }

    #[test]
    fn primary_tolerates_start_failures_within_policy_then_reports() {
        let driver = FakePostgres::new(SystemIdentifier::new(1));
        driver.fail_next_start(10);
        let dir = tempdir().unwrap();
        let path = status_path(dir.path());
        ExpectedPostgresStatus::Running.save(&path).unwrap();
        let mut controller = DbController::new(&driver, path, Duration::from_millis(100), RestartPolicy::new(2, 20));

        controller.reconcile_once(NodeState::Primary, 1_000).unwrap();
        controller.reconcile_once(NodeState::Primary, 1_005).unwrap();
        assert!(controller.reconcile_once(NodeState::Primary, 1_010).is_err());
    }

    #[test]
    fn running_as_subprocess_restarts_an_externally_running_database() {
        let driver = FakePostgres::new(SystemIdentifier::new(1));
        driver.start().unwrap();
        let dir = tempdir().unwrap();
        let path = status_path(dir.path());
        ExpectedPostgresStatus::RunningAsSubprocess.save(&path).unwrap();
        let mut controller = DbController::new(&driver, path, Duration::from_millis(100), RestartPolicy::new(3, 20));

        controller.reconcile_once(NodeState::Primary, 1_000).unwrap();
        assert!(driver.is_running());
        assert!(controller.started_by_controller);
    }
}
