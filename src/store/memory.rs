// ABOUTME: In-memory ticket repository for tests and the development server
// ABOUTME: HashMaps behind an async RwLock, with the version-guarded update done under the write lock
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use super::TicketRepository;
use crate::errors::{AdmissionError, AdmissionResult};
use crate::models::{PresenceState, Ticket};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory reference implementation of [`TicketRepository`]
///
/// The compare-and-update runs under a single write lock, which gives the
/// same atomicity a production backend provides with a conditional UPDATE.
#[derive(Default)]
pub struct MemoryTicketStore {
    tickets: RwLock<HashMap<Uuid, Ticket>>,
    reentry_policies: RwLock<HashMap<Uuid, bool>>,
}

impl MemoryTicketStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an event with its re-entry policy
    pub async fn insert_event(&self, event_id: Uuid, allow_reentry: bool) {
        self.reentry_policies
            .write()
            .await
            .insert(event_id, allow_reentry);
    }

    /// Change an event's re-entry policy after tokens may already be issued
    pub async fn set_reentry(&self, event_id: Uuid, allow_reentry: bool) {
        self.reentry_policies
            .write()
            .await
            .insert(event_id, allow_reentry);
    }

    /// Add a ticket
    pub async fn insert_ticket(&self, ticket: Ticket) {
        self.tickets.write().await.insert(ticket.id, ticket);
    }

    /// Mark a ticket revoked
    pub async fn revoke_ticket(&self, ticket_id: Uuid) {
        if let Some(ticket) = self.tickets.write().await.get_mut(&ticket_id) {
            ticket.revoked = true;
        }
    }

    /// Remove a ticket entirely
    pub async fn remove_ticket(&self, ticket_id: Uuid) {
        self.tickets.write().await.remove(&ticket_id);
    }
}

#[async_trait]
impl TicketRepository for MemoryTicketStore {
    async fn get_ticket(&self, ticket_id: Uuid) -> AdmissionResult<Option<Ticket>> {
        Ok(self.tickets.read().await.get(&ticket_id).cloned())
    }

    async fn event_allows_reentry(&self, event_id: Uuid) -> AdmissionResult<bool> {
        self.reentry_policies
            .read()
            .await
            .get(&event_id)
            .copied()
            .ok_or_else(|| AdmissionError::Storage(format!("Unknown event: {event_id}")))
    }

    async fn compare_and_update(
        &self,
        ticket_id: Uuid,
        expected_version: u64,
        new_state: PresenceState,
        device_bound_key: Option<String>,
    ) -> AdmissionResult<Option<Ticket>> {
        let mut tickets = self.tickets.write().await;
        let ticket = tickets
            .get_mut(&ticket_id)
            .ok_or(AdmissionError::TicketNotFound { ticket_id })?;

        if ticket.version != expected_version {
            return Ok(None);
        }

        ticket.current_state = new_state;
        ticket.device_bound_key = device_bound_key;
        ticket.version += 1;
        Ok(Some(ticket.clone()))
    }

    async fn unbind_device(&self, ticket_id: Uuid) -> AdmissionResult<()> {
        let mut tickets = self.tickets.write().await;
        let ticket = tickets
            .get_mut(&ticket_id)
            .ok_or(AdmissionError::TicketNotFound { ticket_id })?;
        ticket.device_bound_key = None;
        Ok(())
    }
}
