// ABOUTME: Admission orchestrator running verify, binding, replay, state machine, and the update
// ABOUTME: Single entry point gates call; owns the last-decision cache for suppressed duplicates
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Admission Service
//!
//! The one pipeline every gate scan goes through:
//!
//! verify token -> look up ticket -> revocation check -> device binding ->
//! replay guard -> live policy read -> presence transition -> version-guarded
//! repository update (one retry) -> best-effort publish.
//!
//! Replay-suppressed duplicates return the last known decision for the
//! ticket instead of an error, so a gate UI scanning continuously shows a
//! stable confirmation rather than flickering errors while the holder walks
//! through.

use crate::binding::DeviceBindingPolicy;
use crate::errors::{AdmissionError, AdmissionResult};
use crate::models::{AdmissionDecision, Direction, Ticket};
use crate::notify::{AdmissionEvent, AdmissionPublisher};
use crate::presence;
use crate::replay::ReplayGuard;
use crate::store::TicketRepository;
use crate::token::{AdmissionClaims, IssuedToken, TokenIssuer, TokenVerifier};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A decision retained for replay-suppressed duplicates of the same scan
struct CachedDecision {
    decision: AdmissionDecision,
    cached_at: Instant,
}

/// Orchestrates the full admission pipeline
///
/// Shared across scan-handling workers behind an `Arc`. The only mutable
/// state it owns is the replay fingerprint cache and the per-ticket
/// last-decision cache; tickets themselves always live in the repository.
pub struct AdmissionService {
    issuer: TokenIssuer,
    verifier: TokenVerifier,
    replay: ReplayGuard,
    repository: Arc<dyn TicketRepository>,
    publisher: Arc<dyn AdmissionPublisher>,
    last_decisions: DashMap<Uuid, CachedDecision>,
    // Cached decisions are only reachable while the replay guard still
    // suppresses the token, so they share its window
    decision_ttl: Duration,
}

impl AdmissionService {
    /// Assemble the service from its collaborators
    #[must_use]
    pub fn new(
        issuer: TokenIssuer,
        verifier: TokenVerifier,
        replay: ReplayGuard,
        repository: Arc<dyn TicketRepository>,
        publisher: Arc<dyn AdmissionPublisher>,
    ) -> Self {
        let decision_ttl = replay.window();
        Self {
            issuer,
            verifier,
            replay,
            repository,
            publisher,
            last_decisions: DashMap::new(),
            decision_ttl,
        }
    }

    /// Issue a fresh admission token for a ticket+device pair
    ///
    /// Resolves the ticket and its event's current re-entry policy, then
    /// delegates to the stateless issuer. No repository writes happen here.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::TicketNotFound`] when the ticket is
    /// unknown, or a storage/internal error.
    pub async fn issue_token(
        &self,
        ticket_id: Uuid,
        device_hash: &str,
        requested_ttl_seconds: u64,
    ) -> AdmissionResult<IssuedToken> {
        let ticket = self
            .repository
            .get_ticket(ticket_id)
            .await?
            .ok_or(AdmissionError::TicketNotFound { ticket_id })?;
        let allow_reentry = self.repository.event_allows_reentry(ticket.event_id).await?;

        self.issuer.issue(
            ticket.id,
            ticket.event_id,
            ticket.seat_id,
            device_hash,
            requested_ttl_seconds,
            allow_reentry,
        )
    }

    /// Process one gate scan
    ///
    /// # Errors
    ///
    /// Any variant of the typed taxonomy; see the module docs for the
    /// pipeline order. Replay suppression is not an error.
    pub async fn admit(
        &self,
        token: &str,
        direction: Direction,
        gate_id: &str,
    ) -> AdmissionResult<AdmissionDecision> {
        let claims = self.verifier.verify(token)?;
        let ticket_id = claims.sub;

        let mut ticket = self
            .repository
            .get_ticket(ticket_id)
            .await?
            .ok_or(AdmissionError::TicketNotFound { ticket_id })?;

        if ticket.revoked {
            tracing::warn!(ticket_id = %ticket_id, gate_id, "Scan of revoked ticket rejected");
            return Err(AdmissionError::TicketRevoked { ticket_id });
        }

        DeviceBindingPolicy::check_and_bind(&mut ticket, &claims.device_hash)?;

        if !self.replay.should_process(token) {
            if let Some(previous) = self.last_decision(ticket_id) {
                tracing::debug!(
                    ticket_id = %ticket_id,
                    gate_id,
                    "Duplicate frame suppressed, returning prior decision"
                );
                return Ok(previous);
            }
            // Fingerprint recorded by an attempt that never completed;
            // process this sighting normally
        }

        // Live policy, not the token's issuance-time snapshot
        let allow_reentry = self.repository.event_allows_reentry(ticket.event_id).await?;
        let next_state = presence::transition(
            ticket.id,
            ticket.current_state,
            direction,
            allow_reentry,
        )?;

        let updated = match self
            .repository
            .compare_and_update(
                ticket.id,
                ticket.version,
                next_state,
                ticket.device_bound_key.clone(),
            )
            .await?
        {
            Some(updated) => updated,
            None => {
                self.retry_once(&claims, direction, allow_reentry).await?
            }
        };

        let decision = AdmissionDecision::from_ticket(&updated);
        self.cache_decision(ticket_id, decision.clone());

        tracing::info!(
            ticket_id = %ticket_id,
            gate_id,
            direction = %direction,
            new_state = %decision.current_state,
            "Admission accepted"
        );

        self.publish_best_effort(&updated, direction, gate_id).await;

        Ok(decision)
    }

    /// Re-run the checks against the fresh ticket after losing the
    /// version-guarded update once
    async fn retry_once(
        &self,
        claims: &AdmissionClaims,
        direction: Direction,
        allow_reentry: bool,
    ) -> AdmissionResult<Ticket> {
        let ticket_id = claims.sub;
        tracing::debug!(ticket_id = %ticket_id, "Version conflict, retrying against fresh state");

        let mut fresh = self
            .repository
            .get_ticket(ticket_id)
            .await?
            .ok_or(AdmissionError::TicketNotFound { ticket_id })?;

        if fresh.revoked {
            return Err(AdmissionError::TicketRevoked { ticket_id });
        }
        DeviceBindingPolicy::check_and_bind(&mut fresh, &claims.device_hash)?;
        let next_state =
            presence::transition(fresh.id, fresh.current_state, direction, allow_reentry)?;

        self.repository
            .compare_and_update(
                fresh.id,
                fresh.version,
                next_state,
                fresh.device_bound_key.clone(),
            )
            .await?
            .ok_or(AdmissionError::ConcurrentModification { ticket_id })
    }

    /// Publish the admission event; failure never rolls back the admission
    async fn publish_best_effort(&self, ticket: &Ticket, direction: Direction, gate_id: &str) {
        let event = AdmissionEvent {
            ticket_id: ticket.id,
            event_id: ticket.event_id,
            gate_id: gate_id.to_owned(),
            direction,
            new_state: ticket.current_state,
            occurred_at: Utc::now(),
        };
        if let Err(e) = self.publisher.publish(event).await {
            tracing::warn!(
                ticket_id = %ticket.id,
                error = %e,
                "Failed to publish admission event"
            );
        }
    }

    /// Record a decision and drop every entry too old for a duplicate frame
    /// to ever reach, so the cache stays bounded by recent admissions
    fn cache_decision(&self, ticket_id: Uuid, decision: AdmissionDecision) {
        let now = Instant::now();
        self.last_decisions
            .retain(|_, cached| now.duration_since(cached.cached_at) < self.decision_ttl);
        self.last_decisions.insert(
            ticket_id,
            CachedDecision {
                decision,
                cached_at: now,
            },
        );
    }

    /// Last successful decision for a ticket, if one is still within the
    /// replay suppression window
    #[must_use]
    pub fn last_decision(&self, ticket_id: Uuid) -> Option<AdmissionDecision> {
        let stale = match self.last_decisions.get(&ticket_id) {
            Some(cached) if cached.cached_at.elapsed() < self.decision_ttl => {
                return Some(cached.decision.clone());
            }
            Some(_) => true,
            None => false,
        };
        if stale {
            self.last_decisions.remove(&ticket_id);
        }
        None
    }
}
