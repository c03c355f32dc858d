/// Reported health of a node, as tracked by the monitor.
///
/// `Unknown` covers a node that has never reported in, or whose last report
/// is older than `network_partition_timeout` (spec.md §4.3 item 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Health {
    Unknown,
    Yes,
    No,
}

impl Health {
    pub fn is_down(self) -> bool {
        matches!(self, Health::No | Health::Unknown)
    }
}
