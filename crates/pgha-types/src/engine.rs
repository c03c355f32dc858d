/// Which standby-configuration mechanism the database engine uses.
///
/// Engines before major version 12 take replication settings in
/// `recovery.conf`; 12 and later fold them into the main configuration plus
/// a `standby.signal` marker. The keeper renders the same
/// [`crate::Node`]-derived settings either way (spec.md §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EngineVersion {
    Major(u32),
}

impl EngineVersion {
    pub fn uses_recovery_conf(self) -> bool {
        match self {
            EngineVersion::Major(v) => v < 12,
        }
    }

    pub fn major(self) -> u32 {
        match self {
            EngineVersion::Major(v) => v,
        }
    }

    /// Whether this engine/minor combination supports `pg_replication_slot_advance`
    /// without the known-buggy-minor caveat from spec.md §4.4.
    pub fn supports_slot_advance(self) -> bool {
        self.major() >= 11
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pre_12_uses_recovery_conf() {
        assert!(EngineVersion::Major(11).uses_recovery_conf());
        assert!(!EngineVersion::Major(12).uses_recovery_conf());
        assert!(!EngineVersion::Major(16).uses_recovery_conf());
    }
}
