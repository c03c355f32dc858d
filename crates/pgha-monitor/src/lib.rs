//! The monitor: the central coordinator that serializes and arbitrates
//! role assignment per group (spec.md §4.3). Owns the node/group
//! registry, the failover orchestration algorithm, and the notification
//! channel keepers subscribe to for prompt (sub-polling-interval) updates.

mod error;
mod notify;
mod orchestrator;
mod registry;

pub use error::MonitorError;
pub use notify::{NotificationChannel, StateChangeEvent};
pub use orchestrator::{node_active, ReportedStatus};
pub use registry::{NodeEntry, Registry};
