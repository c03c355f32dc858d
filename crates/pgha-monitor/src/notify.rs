//! Asynchronous notification publication (spec.md §4.3): "every state
//! change emits a notification to a named channel; keepers subscribe."

use pgha_types::{GroupId, NodeId, NodeState};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// A state-change event published to every subscribed keeper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateChangeEvent {
    NodeAssignedState {
        node_id: NodeId,
        group_id: GroupId,
        assigned_state: NodeState,
    },
    NodeRemoved {
        node_id: NodeId,
        group_id: GroupId,
    },
}

/// Broadcasts monitor state-change notifications to connected keepers.
#[derive(Debug, Clone)]
pub struct NotificationChannel {
    tx: broadcast::Sender<StateChangeEvent>,
}

impl NotificationChannel {
    pub fn new(buffer_size: usize) -> Self {
        let (tx, _rx) = broadcast::channel(buffer_size);
        Self { tx }
    }

    /// Publishes `event` to all current subscribers. Returns the number
    /// of keepers that received it.
    pub fn publish(&self, event: StateChangeEvent) -> usize {
        self.tx.send(event).unwrap_or_default()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChangeEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for NotificationChannel {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_reaches_every_subscriber() {
        let channel = NotificationChannel::new(16);
        let mut a = channel.subscribe();
        let mut b = channel.subscribe();

        let event = StateChangeEvent::NodeAssignedState {
            node_id: NodeId::from(1),
            group_id: GroupId::FIRST,
            assigned_state: NodeState::Primary,
        };
        assert_eq!(channel.publish(event.clone()), 2);

        assert_eq!(a.try_recv().unwrap(), event);
        assert_eq!(b.try_recv().unwrap(), event);
    }

    #[test]
    fn a_lagging_subscriber_observes_a_lagged_error() {
        let channel = NotificationChannel::new(2);
        let mut rx = channel.subscribe();

        for i in 0..5u64 {
            channel.publish(StateChangeEvent::NodeRemoved {
                node_id: NodeId::from(i),
                group_id: GroupId::FIRST,
            });
        }

        assert!(matches!(rx.try_recv(), Err(broadcast::error::TryRecvError::Lagged(_))));
    }
}
