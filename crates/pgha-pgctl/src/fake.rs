//! An in-memory [`LocalPostgres`] double for keeper/supervisor tests.
//!
//! Tracks running state, LSN, and slots without touching a real engine.
//! Every method can be made to fail for a configurable number of calls via
//! [`FakePostgres::fail_next_start`], exercising the restart-retry paths in
//! spec.md §4.1.

use std::sync::Mutex;

use pgha_types::{Lsn, SystemIdentifier, TimelineId};

use crate::{ControlData, IdentifySystem, LocalPostgres, PgCtlError, ReplicationSlot, SlotName};

struct Inner {
    running: bool,
    lsn: Lsn,
    timeline: TimelineId,
    system_identifier: SystemIdentifier,
    slots: Vec<ReplicationSlot>,
    fail_starts_remaining: u32,
    written_source: Option<String>,
}

pub struct FakePostgres {
    inner: Mutex<Inner>,
}

impl FakePostgres {
    pub fn new(system_identifier: SystemIdentifier) -> Self {
        Self {
            inner: Mutex::new(Inner {
                running: false,
                lsn: Lsn::ZERO,
                timeline: TimelineId::INITIAL,
                system_identifier,
                slots: Vec::new(),
                fail_starts_remaining: 0,
                written_source: None,
            }),
        }
    }

    pub fn set_lsn(&self, lsn: Lsn) {
        self.inner.lock().unwrap().lsn = lsn;
    }

    pub fn lsn(&self) -> Lsn {
        self.inner.lock().unwrap().lsn
    }

    pub fn timeline(&self) -> TimelineId {
        self.inner.lock().unwrap().timeline
    }

    /// Forces the next `n` calls to `start()` to fail, to exercise the
    /// restart-failure tolerance in spec.md §4.1.
    pub fn fail_next_start(&self, n: u32) {
        self.inner.lock().unwrap().fail_starts_remaining = n;
    }

    pub fn written_source(&self) -> Option<String> {
        self.inner.lock().unwrap().written_source.clone()
    }
}

impl LocalPostgres for FakePostgres {
    fn initdb(&self, _pgdata: &std::path::Path) -> Result<(), PgCtlError> {
        Ok(())
    }

    fn start(&self) -> Result<(), PgCtlError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_starts_remaining > 0 {
            inner.fail_starts_remaining -= 1;
            return Err(PgCtlError::StartTimeout);
        }
        inner.running = true;
        Ok(())
    }

    fn stop(&self) -> Result<(), PgCtlError> {
        self.inner.lock().unwrap().running = false;
        Ok(())
    }

    fn reload(&self) -> Result<(), PgCtlError> {
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.inner.lock().unwrap().running
    }

    fn read_control_data(&self) -> Result<ControlData, PgCtlError> {
        let inner = self.inner.lock().unwrap();
        Ok(ControlData {
            pg_control_version: 1300,
            catalog_version_no: 202307071,
            system_identifier: inner.system_identifier,
        })
    }

    fn base_backup(&self, _primary_host: &str, _primary_port: u16) -> Result<(), PgCtlError> {
        Ok(())
    }

    fn promote(&self) -> Result<(), PgCtlError> {
        let mut inner = self.inner.lock().unwrap();
        inner.timeline = inner.timeline.next();
        inner.running = true;
        Ok(())
    }

    fn rewind(&self, _new_primary_host: &str, _new_primary_port: u16) -> Result<(), PgCtlError> {
        Ok(())
    }

    fn write_hba_entry(&self, _user: &str, _cidr: &str, _auth_method: &str) -> Result<(), PgCtlError> {
        Ok(())
    }

    fn write_replication_source(&self, rendered: &str, _path_hint: &str) -> Result<bool, PgCtlError> {
        let mut inner = self.inner.lock().unwrap();
        let changed = inner.written_source.as_deref() != Some(rendered);
        inner.written_source = Some(rendered.to_string());
        Ok(changed)
    }

    fn identify_system(&self, _host: &str, _port: u16) -> Result<IdentifySystem, PgCtlError> {
        let inner = self.inner.lock().unwrap();
        Ok(IdentifySystem {
            system_identifier: inner.system_identifier,
            timeline_id: inner.timeline,
            xlog_position: inner.lsn,
        })
    }

    fn create_slot(&self, slot_name: &SlotName) -> Result<(), PgCtlError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.slots.iter().any(|s| &s.name == slot_name) {
            return Err(PgCtlError::SlotAlreadyExists(slot_name.to_string()));
        }
        inner.slots.push(ReplicationSlot {
            name: SlotName::raw(slot_name.as_str()),
            active: true,
            restart_lsn: Lsn::ZERO,
        });
        Ok(())
    }

    fn drop_slot(&self, slot_name: &SlotName) -> Result<(), PgCtlError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.slots.len();
        inner.slots.retain(|s| &s.name != slot_name);
        if inner.slots.len() == before {
            return Err(PgCtlError::SlotNotFound(slot_name.to_string()));
        }
        Ok(())
    }

    fn advance_slot(&self, slot_name: &SlotName, target_lsn: Lsn) -> Result<(), PgCtlError> {
        let mut inner = self.inner.lock().unwrap();
        let slot = inner
            .slots
            .iter_mut()
            .find(|s| &s.name == slot_name)
            .ok_or_else(|| PgCtlError::SlotNotFound(slot_name.to_string()))?;
        slot.restart_lsn = target_lsn;
        Ok(())
    }

    fn list_slots(&self) -> Result<Vec<ReplicationSlot>, PgCtlError> {
        Ok(self.inner.lock().unwrap().slots.clone())
    }

    fn create_replication_role(&self, _role: &str, _password: &str) -> Result<(), PgCtlError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_fails_the_configured_number_of_times() {
        let pg = FakePostgres::new(SystemIdentifier::new(1));
        pg.fail_next_start(2);

        assert!(pg.start().is_err());
        assert!(pg.start().is_err());
        assert!(pg.start().is_ok());
        assert!(pg.is_running());
    }

    #[test]
    fn promote_bumps_timeline() {
        let pg = FakePostgres::new(SystemIdentifier::new(1));
        assert_eq!(pg.timeline(), TimelineId::INITIAL);
        pg.promote().unwrap();
        assert_eq!(pg.timeline(), TimelineId::new(2));
    }

    #[test]
    fn write_replication_source_reports_change_only_once() {
        let pg = FakePostgres::new(SystemIdentifier::new(1));
        assert!(pg.write_replication_source("content-a", "standby.conf").unwrap());
        assert!(!pg.write_replication_source("content-a", "standby.conf").unwrap());
        assert!(pg.write_replication_source("content-b", "standby.conf").unwrap());
    }

    #[test]
    fn slot_lifecycle_create_advance_drop() {
        let pg = FakePostgres::new(SystemIdentifier::new(1));
        let slot = SlotName::for_node(pgha_types::NodeId::from(7));

        pg.create_slot(&slot).unwrap();
        assert!(pg.create_slot(&slot).is_err());

        pg.advance_slot(&slot, Lsn::from_u64(100)).unwrap();
        let slots = pg.list_slots().unwrap();
        assert_eq!(slots[0].restart_lsn, Lsn::from_u64(100));

        pg.drop_slot(&slot).unwrap();
        assert!(pg.list_slots().unwrap().is_empty());
        assert!(pg.drop_slot(&slot).is_err());
    }
}
