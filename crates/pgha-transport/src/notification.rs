//! The `state` notification channel's wire payload (spec.md §6): "a
//! named pub/sub channel `state` carries JSON payloads ... keepers
//! subscribe and use receipts to tighten the `node_active` loop latency."

use pgha_types::{Formation, GroupId, Health, Lsn, NodeId, NodeState, TimelineId};
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateNotification {
    pub node_id: NodeId,
    pub group_id: GroupId,
    pub formation: Formation,
    pub reported_state: NodeState,
    pub goal_state: NodeState,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub lsn: Lsn,
    pub timeline: TimelineId,
    pub health: Health,
}

impl StateNotification {
    pub fn to_json(&self) -> Result<String, TransportError> {
        serde_json::to_string(self).map_err(|err| TransportError::MalformedPayload(err.to_string()))
    }

    /// Parses a raw notification payload. Per spec.md §7 class 5, a
    /// malformed payload is the caller's responsibility to log at WARN
    /// and skip — this only produces the error to log.
    pub fn from_json(raw: &str) -> Result<Self, TransportError> {
        serde_json::from_str(raw).map_err(|err| TransportError::MalformedPayload(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StateNotification {
        StateNotification {
            node_id: NodeId::from(1),
            group_id: GroupId::FIRST,
            formation: Formation::default_formation(),
            reported_state: NodeState::Primary,
            goal_state: NodeState::Primary,
            name: "node-a".into(),
            host: "10.0.0.1".into(),
            port: 5432,
            lsn: "0/3000060".parse().unwrap(),
            timeline: TimelineId::INITIAL,
            health: Health::Yes,
        }
    }

    #[test]
    fn roundtrips_through_json() {
        let notification = sample();
        let json = notification.to_json().unwrap();
        assert_eq!(StateNotification::from_json(&json).unwrap(), notification);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(StateNotification::from_json("{not json").is_err());
    }

    #[test]
    fn rejects_json_missing_required_fields() {
        assert!(StateNotification::from_json(r#"{"node_id": 1}"#).is_err());
    }
}
