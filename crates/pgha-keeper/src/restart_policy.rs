//! Restart-failure tolerance for the PRIMARY role (spec.md §4.1): "on
//! PRIMARY, tolerate up to `postgresql_restart_failure_max_retries`
//! restarts within `postgresql_restart_failure_timeout` seconds before
//! reporting 'not running' to the monitor... on any other role, report
//! 'not running' immediately."

use pgha_types::NodeState;

#[derive(Debug, Clone, Copy)]
pub struct RestartPolicy {
    pub max_retries: u32,
    pub timeout_seconds: i64,
}

impl RestartPolicy {
    pub fn new(max_retries: u32, timeout_seconds: i64) -> Self {
        Self {
            max_retries,
            timeout_seconds,
        }
    }
}

/// Tracks consecutive restart attempts of the local database, shared
/// between the DB controller (which records failures) and the FSM driver
/// (which consults it before reporting `pg_is_running=false`).
#[derive(Debug, Clone, Copy, Default)]
pub struct RestartTracker {
    first_failure_at: Option<i64>,
    retry_count: u32,
}

impl RestartTracker {
    pub fn record_failure(&mut self, now_unix_seconds: i64) {
        if self.first_failure_at.is_none() {
            self.first_failure_at = Some(now_unix_seconds);
        }
        self.retry_count += 1;
    }

    pub fn record_success(&mut self) {
        self.first_failure_at = None;
        self.retry_count = 0;
    }

    /// Whether the controller should still report the DB as (transiently)
    /// up despite the last observed crash, given `role` and `policy`.
    pub fn tolerates(&self, role: NodeState, policy: RestartPolicy, now_unix_seconds: i64) -> bool {
        if role != NodeState::Primary {
            return false;
        }
        let Some(first_failure_at) = self.first_failure_at else {
            return true;
        };
        if now_unix_seconds - first_failure_at > policy.timeout_seconds {
            return false;
        }
        self.retry_count <= policy.max_retries
    }
}
