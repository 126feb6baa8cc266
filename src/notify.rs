// ABOUTME: Fire-and-forget publication of admission events to the audit/notification pipeline
// ABOUTME: Broadcast-channel implementation; publish failures never roll back an admission
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Admission event publishing.
//!
//! The external audit/notification pipeline subscribes to admission events.
//! Publication is strictly best-effort: an admission that already committed
//! to the repository stands regardless of whether anyone heard about it.

use crate::models::{Direction, PresenceState};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// An accepted admission, as published to subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionEvent {
    /// Ticket that transitioned
    pub ticket_id: Uuid,
    /// Event the ticket belongs to
    pub event_id: Uuid,
    /// Gate that processed the scan
    pub gate_id: String,
    /// Direction the operator selected
    pub direction: Direction,
    /// Presence state after the transition
    pub new_state: PresenceState,
    /// When the transition committed
    pub occurred_at: DateTime<Utc>,
}

/// Publisher abstraction for admission events
#[async_trait]
pub trait AdmissionPublisher: Send + Sync {
    /// Publish one admission event, best-effort
    ///
    /// # Errors
    ///
    /// Returns an error if delivery failed; callers log and move on.
    async fn publish(&self, event: AdmissionEvent) -> anyhow::Result<()>;
}

/// In-process publisher backed by a tokio broadcast channel
pub struct BroadcastPublisher {
    sender: broadcast::Sender<AdmissionEvent>,
}

impl BroadcastPublisher {
    /// Create a publisher with the given channel capacity
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to the admission event stream
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AdmissionEvent> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl AdmissionPublisher for BroadcastPublisher {
    async fn publish(&self, event: AdmissionEvent) -> anyhow::Result<()> {
        // A send error only means there is no subscriber right now; that is
        // a legal state for a fire-and-forget stream
        if self.sender.send(event).is_err() {
            tracing::debug!("Admission event dropped: no active subscribers");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_published_event() {
        let publisher = BroadcastPublisher::new(16);
        let mut receiver = publisher.subscribe();

        let event = AdmissionEvent {
            ticket_id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            gate_id: "gate-1".into(),
            direction: Direction::Inside,
            new_state: PresenceState::Inside,
            occurred_at: Utc::now(),
        };
        publisher.publish(event.clone()).await.unwrap();

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.ticket_id, event.ticket_id);
        assert_eq!(received.gate_id, "gate-1");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let publisher = BroadcastPublisher::new(16);
        let event = AdmissionEvent {
            ticket_id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            gate_id: "gate-1".into(),
            direction: Direction::Outside,
            new_state: PresenceState::Outside,
            occurred_at: Utc::now(),
        };
        assert!(publisher.publish(event).await.is_ok());
    }
}
