// ABOUTME: Core data structures for tickets, presence state, and admission decisions
// ABOUTME: Shared between the admission pipeline, the ticket repository, and HTTP routes
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Data model for the admission core.
//!
//! `Ticket` is owned by the external ticket repository; this crate only reads
//! it and asks the repository to apply version-guarded updates. Everything
//! else here is ephemeral request/response state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a ticket holder currently is, as far as the gates know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceState {
    /// Holder has not been admitted, or has left through an exit gate
    Outside,
    /// Holder is inside the venue
    Inside,
}

impl std::fmt::Display for PresenceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Outside => write!(f, "outside"),
            Self::Inside => write!(f, "inside"),
        }
    }
}

/// Direction toggle selected by the gate operator for a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Entry gate: holder wants to go inside
    Inside,
    /// Exit gate: holder wants to go outside
    Outside,
}

impl Direction {
    /// The presence state a scan in this direction is requesting.
    #[must_use]
    pub const fn target_state(self) -> PresenceState {
        match self {
            Self::Inside => PresenceState::Inside,
            Self::Outside => PresenceState::Outside,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inside => write!(f, "inside"),
            Self::Outside => write!(f, "outside"),
        }
    }
}

/// A ticket as stored by the external repository.
///
/// `version` is a monotonic counter used as an optimistic-concurrency guard:
/// every accepted presence transition increments it, and updates are only
/// applied when the caller's expected version still matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique ticket identifier
    pub id: Uuid,
    /// Event this ticket admits to
    pub event_id: Uuid,
    /// Seat label, if the event is seated
    pub seat_id: Option<String>,
    /// Invitation this ticket was created from, if any
    pub invitation_id: Option<Uuid>,
    /// Hash of the one device this ticket is locked to; `None` until the
    /// first successful admission binds it
    pub device_bound_key: Option<String>,
    /// Current presence state
    pub current_state: PresenceState,
    /// Revoked tickets never transition again
    pub revoked: bool,
    /// Optimistic-concurrency version counter
    pub version: u64,
}

impl Ticket {
    /// Create a fresh, unbound ticket for an event.
    #[must_use]
    pub fn new(event_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            seat_id: None,
            invitation_id: None,
            device_bound_key: None,
            current_state: PresenceState::Outside,
            revoked: false,
            version: 0,
        }
    }

    /// Builder-style seat assignment, used when seeding test and demo data.
    #[must_use]
    pub fn with_seat(mut self, seat_id: impl Into<String>) -> Self {
        self.seat_id = Some(seat_id.into());
        self
    }
}

/// Outcome of a successful admission, also returned verbatim for replay-
/// suppressed duplicates so a continuously scanning gate shows a stable
/// confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionDecision {
    /// Ticket that was admitted
    pub ticket_id: Uuid,
    /// Event the ticket belongs to
    pub event_id: Uuid,
    /// Seat label, if any
    pub seat_id: Option<String>,
    /// Presence state after the transition
    pub current_state: PresenceState,
    /// Revocation flag at decision time (always false on the success path)
    pub revoked: bool,
    /// When the decision was made
    pub decided_at: DateTime<Utc>,
}

impl AdmissionDecision {
    /// Build a decision from the ticket state the repository returned after
    /// an accepted transition.
    #[must_use]
    pub fn from_ticket(ticket: &Ticket) -> Self {
        Self {
            ticket_id: ticket.id,
            event_id: ticket.event_id,
            seat_id: ticket.seat_id.clone(),
            current_state: ticket.current_state,
            revoked: ticket.revoked,
            decided_at: Utc::now(),
        }
    }
}
