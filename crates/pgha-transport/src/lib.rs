//! Monitor RPC client surface (spec.md §4.3, §6): the call shapes,
//! retry policies, and notification-channel wire format the keeper uses
//! to talk to the monitor. The pooled SQL connection itself and the
//! monitor's server-side implementation are out of scope.

mod client;
mod error;
mod notification;
mod retry;

pub use client::{MonitorClient, NodeActiveRequest, RegisterNodeRequest, RegisterNodeResponse};
pub use error::TransportError;
pub use notification::StateNotification;
pub use retry::with_retry;
