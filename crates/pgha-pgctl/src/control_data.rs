use pgha_types::SystemIdentifier;

/// The small header record the database engine keeps listing its own
/// version, catalog version, and system identifier (spec.md GLOSSARY:
/// "Control data").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlData {
    pub pg_control_version: u32,
    pub catalog_version_no: u32,
    pub system_identifier: SystemIdentifier,
}
