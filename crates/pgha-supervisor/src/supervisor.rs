//! Owns the keeper's three long-lived children — FSM driver, DB
//! controller, notification listener — restarting each independently on
//! abnormal exit with exponential backoff, and propagating SIGTERM/SIGHUP
//! (spec.md §4.2, §5).
//!
//! A target-language reimplementation may collapse the three children
//! into cooperatively scheduled tasks within one process (spec.md §5);
//! this crate does exactly that, running each child as its own tokio
//! task rather than a separate OS process.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::restart::RestartCounter;

pub type CancelFlag = Arc<AtomicBool>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildKind {
    FsmDriver,
    DbController,
    NotificationListener,
}

impl ChildKind {
    fn name(self) -> &'static str {
        match self {
            ChildKind::FsmDriver => "fsm-driver",
            ChildKind::DbController => "db-controller",
            ChildKind::NotificationListener => "notification-listener",
        }
    }
}

/// Coordinates cancellation and graceful-stop timing across a node's
/// children. Does not itself hold the children — callers spawn each via
/// [`Supervisor::supervise`] and await the returned handles.
pub struct Supervisor {
    cancel: CancelFlag,
    stop_timeout: Duration,
}

impl Supervisor {
    pub fn new(stop_timeout: Duration) -> Self {
        Self {
            cancel: Arc::new(AtomicBool::new(false)),
            stop_timeout,
        }
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Sets the cooperative-cancellation flag every loop polls at its
    /// iteration boundary (spec.md §5).
    pub fn request_stop(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn stop_requested(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    pub fn stop_timeout(&self) -> Duration {
        self.stop_timeout
    }

    /// Drives `spawn_child` (a factory that produces one attempt's
    /// future) under exponential-backoff restart until a stop is
    /// requested. A successful return from `spawn_child` resets the
    /// backoff counter rather than ending supervision — all three
    /// children are meant to run for the keeper's entire lifetime.
    pub async fn supervise<F, Fut, E>(&self, kind: ChildKind, mut spawn_child: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: std::fmt::Display,
    {
        let mut backoff = RestartCounter::default();

        loop {
            if self.stop_requested() {
                info!(child = kind.name(), "stopping, no restart");
                return;
            }

            match spawn_child().await {
                Ok(()) => {
                    if self.stop_requested() {
                        return;
                    }
                    backoff.reset();
                }
                Err(err) => {
                    let delay = backoff.next_delay();
                    error!(child = kind.name(), %err, attempt = backoff.attempts(), ?delay, "child exited abnormally, restarting");
                    self.sleep_unless_stopping(delay).await;
                }
            }
        }
    }

    async fn sleep_unless_stopping(&self, delay: Duration) {
        let poll = Duration::from_millis(100).min(delay);
        let mut remaining = delay;
        while remaining > Duration::ZERO {
            if self.stop_requested() {
                return;
            }
            let step = poll.min(remaining);
            tokio::time::sleep(step).await;
            remaining = remaining.saturating_sub(step);
        }
    }
}

/// Installs SIGTERM/SIGHUP handlers (spec.md §5): SIGTERM requests an
/// orderly stop; SIGHUP invokes `on_reload` for a config re-read.
#[cfg(unix)]
pub async fn run_signal_loop<R>(supervisor: Arc<Supervisor>, mut on_reload: R)
where
    R: FnMut(),
{
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(err) => {
            warn!(%err, "failed to install SIGTERM handler");
            return;
        }
    };
    let mut sighup = match signal(SignalKind::hangup()) {
        Ok(s) => s,
        Err(err) => {
            warn!(%err, "failed to install SIGHUP handler");
            return;
        }
    };

    loop {
        tokio::select! {
            _ = sigterm.recv() => {
                info!("received SIGTERM, requesting orderly stop");
                supervisor.request_stop();
                return;
            }
            _ = sighup.recv() => {
                info!("received SIGHUP, reloading configuration");
                on_reload();
            }
        }
    }
}
