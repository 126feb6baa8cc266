// ABOUTME: Ticket repository abstraction with pluggable backend implementations
// ABOUTME: Persistent storage is an external collaborator reached only through this trait
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Ticket Repository
//!
//! Tickets, events, and invitations are owned by an external system; the
//! admission core only reads tickets and applies version-guarded updates
//! through this trait. The in-memory backend is the reference implementation
//! used by tests and the development server.

/// In-memory repository implementation
pub mod memory;

use crate::errors::AdmissionResult;
use crate::models::{PresenceState, Ticket};
use async_trait::async_trait;
use uuid::Uuid;

pub use memory::MemoryTicketStore;

/// Core ticket storage abstraction
///
/// All backends must implement this trait to provide a consistent interface
/// for the admission pipeline.
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Fetch a ticket by id
    async fn get_ticket(&self, ticket_id: Uuid) -> AdmissionResult<Option<Ticket>>;

    /// Read the live re-entry policy for an event
    ///
    /// Read per admission, never trusted from the token's issuance-time
    /// snapshot, because the policy may change between issuance and scan.
    async fn event_allows_reentry(&self, event_id: Uuid) -> AdmissionResult<bool>;

    /// Atomically apply a presence transition if the version still matches
    ///
    /// Persists `new_state` and `device_bound_key` and increments the
    /// version, but only when the stored version equals `expected_version`.
    /// Returns the updated ticket, or `None` when a concurrent writer won.
    async fn compare_and_update(
        &self,
        ticket_id: Uuid,
        expected_version: u64,
        new_state: PresenceState,
        device_bound_key: Option<String>,
    ) -> AdmissionResult<Option<Ticket>>;

    /// Clear a ticket's device binding
    ///
    /// Administrative escape hatch for holders who rotated their device
    /// secret; the admission pipeline itself never calls this.
    async fn unbind_device(&self, ticket_id: Uuid) -> AdmissionResult<()>;
}
