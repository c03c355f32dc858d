//! `run` (spec.md §5): supervises the local database under the node's
//! `ExpectedPostgresStatus` and installs the SIGTERM/SIGHUP handlers.
//!
//! The FSM driver and the notification listener additionally need a
//! [`pgha_transport::MonitorClient`] to talk to the monitor over the
//! network; this binary does not carry a concrete implementation of that
//! trait (out of scope per spec.md §1), so only the DB controller child
//! is actually supervised here. A full build would register all three
//! children with the same [`pgha_supervisor::Supervisor`].

use std::path::Path;
use std::sync::Arc;

use pgha_config::{ConfigLoader, KeeperConfig, Paths};
use pgha_pgctl::ProcessPostgres;
use pgha_supervisor::{ChildKind, DbController, PidFile, Supervisor};

use crate::error::CliError;

pub fn run(pgdata: &Path) -> Result<(), CliError> {
    let config: KeeperConfig = ConfigLoader::new().with_data_dir(pgdata).load()?;
    let rt = tokio::runtime::Runtime::new().map_err(|source| CliError::Internal(source.to_string()))?;
    rt.block_on(run_async(pgdata, &config))
}

async fn run_async(pgdata: &Path, config: &KeeperConfig) -> Result<(), CliError> {
    let pid_file = PidFile {
        supervisor_pid: std::process::id(),
        data_directory: pgdata.to_path_buf(),
        agent_version: env!("CARGO_PKG_VERSION").to_string(),
        extension_version_requirement: "1.6".to_string(),
        log_semaphore_id: format!("pgha-{}", std::process::id()),
    };
    pid_file.write(&Paths::pid_file(pgdata))?;

    let supervisor = Arc::new(Supervisor::new(config.timeouts.supervisor_stop_timeout));
    let driver = ProcessPostgres::new(pgdata.to_path_buf(), std::path::PathBuf::from("/usr/lib/postgresql/16/bin"), config.pg_port);
    let status_path = pgdata.join("pgha.status");
    let poll_interval = config.timeouts.db_controller_poll_interval;
    let restart_policy = pgha_keeper::RestartPolicy::new(
        config.timeouts.postgresql_restart_failure_max_retries,
        config.timeouts.postgresql_restart_failure_timeout.as_secs() as i64,
    );

    let signal_supervisor = supervisor.clone();
    let signal_task = tokio::spawn(async move {
        pgha_supervisor::run_signal_loop(signal_supervisor, || {
            tracing::info!("SIGHUP reload requested, but config reload is not wired into this command yet");
        })
        .await;
    });

    let cancel = supervisor.cancel_flag();
    let role = pgha_types::NodeState::Single;
    supervisor
        .supervise(ChildKind::DbController, || {
            let cancel = cancel.clone();
            let status_path = status_path.clone();
            async {
                let mut controller = DbController::new(&driver, status_path, poll_interval, restart_policy);
                controller
                    .run(role, &cancel, pgha_keeper::now_unix_seconds)
                    .await
                    .map_err(|err| err.to_string())
            }
        })
        .await;

    let _ = signal_task.await;
    Ok(())
}
