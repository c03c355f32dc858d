//! The local database driver: a thin capability used by the keeper to issue
//! administrative operations against the local database process.
//!
//! This crate specifies *what* must be commanded of the database (spec.md
//! §1, §4 layer 1); the database engine and its streaming-replication wire
//! protocol are explicitly out of scope. [`LocalPostgres`] is implemented
//! by [`ProcessPostgres`] against a real `pg_ctl`/`postgres` install, and by
//! a fake in tests.

mod control_data;
mod error;
pub mod fake;
mod process;
mod slot;

pub use control_data::ControlData;
pub use error::PgCtlError;
pub use process::ProcessPostgres;
pub use slot::{ReplicationSlot, SlotName};

use std::path::Path;

use pgha_types::{Lsn, SystemIdentifier, TimelineId};

/// Result of the replication-protocol "identify system" call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifySystem {
    pub system_identifier: SystemIdentifier,
    pub timeline_id: TimelineId,
    pub xlog_position: Lsn,
}

/// The administrative surface the keeper drives the local database through.
///
/// Implementations must be safe to call repeatedly with the same
/// arguments: `ensure_current_state` (spec.md §4.1) calls `start`/`stop`
/// whenever the expected status disagrees with reality, so every method
/// here is idempotent from the caller's point of view.
pub trait LocalPostgres: Send + Sync {
    /// Initializes an empty PGDATA directory.
    fn initdb(&self, pgdata: &Path) -> Result<(), PgCtlError>;

    /// Starts the database if it is not already running.
    fn start(&self) -> Result<(), PgCtlError>;

    /// Stops the database if it is running. Idempotent.
    fn stop(&self) -> Result<(), PgCtlError>;

    /// Stops then starts the database.
    fn restart(&self) -> Result<(), PgCtlError> {
        self.stop()?;
        self.start()
    }

    /// Asks a running database to reread its configuration (SIGHUP).
    fn reload(&self) -> Result<(), PgCtlError>;

    /// Whether the database process is currently running and accepting
    /// connections.
    fn is_running(&self) -> bool;

    /// Reads the engine's control-file header (version, catalog version,
    /// system identifier).
    fn read_control_data(&self) -> Result<ControlData, PgCtlError>;

    /// Takes a base backup of `primary` into this node's PGDATA, to be
    /// followed by `write_replication_source`.
    fn base_backup(&self, primary_host: &str, primary_port: u16) -> Result<(), PgCtlError>;

    /// Promotes a standby to primary. Bumps the timeline.
    fn promote(&self) -> Result<(), PgCtlError>;

    /// Rewinds this node's data directory onto the new primary's timeline
    /// after a failed-over demotion (spec.md §4.1: `DEMOTED -> CATCHINGUP`).
    fn rewind(&self, new_primary_host: &str, new_primary_port: u16) -> Result<(), PgCtlError>;

    /// Adds an HBA entry granting `user`@`cidr` the given auth method.
    fn write_hba_entry(&self, user: &str, cidr: &str, auth_method: &str) -> Result<(), PgCtlError>;

    /// Writes the rendered replication-source configuration (either
    /// `recovery.conf` or the post-12 auxiliary file, per
    /// [`pgha_types::EngineVersion`]). Returns whether the on-disk content
    /// actually changed, so the caller can skip an unneeded restart
    /// (spec.md §8 idempotence law).
    fn write_replication_source(&self, rendered: &str, path_hint: &str) -> Result<bool, PgCtlError>;

    /// Performs the replication-protocol IDENTIFY_SYSTEM call against a
    /// peer (used to discover a primary's current LSN/timeline before
    /// basebackup, and by the monitor's standby-freshness checks).
    fn identify_system(&self, host: &str, port: u16) -> Result<IdentifySystem, PgCtlError>;

    /// Creates a physical replication slot for `slot_name` if absent.
    fn create_slot(&self, slot_name: &SlotName) -> Result<(), PgCtlError>;

    /// Drops a replication slot if present. Idempotent.
    fn drop_slot(&self, slot_name: &SlotName) -> Result<(), PgCtlError>;

    /// Advances `slot_name` up to `target_lsn`, capped at the local
    /// current LSN by the caller (spec.md §4.4).
    fn advance_slot(&self, slot_name: &SlotName, target_lsn: Lsn) -> Result<(), PgCtlError>;

    /// Lists replication slots currently present on this node.
    fn list_slots(&self) -> Result<Vec<ReplicationSlot>, PgCtlError>;

    /// Creates the replication role used by standbys, if it doesn't exist.
    fn create_replication_role(&self, role: &str, password: &str) -> Result<(), PgCtlError>;
}
