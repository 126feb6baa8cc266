// ABOUTME: Shared fixtures for integration tests
// ABOUTME: Builds an admission service over the in-memory store with HS256 test keys
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![allow(dead_code)]

use rand::RngCore;
use std::sync::Arc;
use std::time::Duration;
use turnstile_server::{
    admission::AdmissionService,
    config::{ReplayConfig, TokenConfig},
    crypto::KeyStore,
    models::Ticket,
    notify::BroadcastPublisher,
    replay::ReplayGuard,
    store::{MemoryTicketStore, TicketRepository},
    token::{TokenIssuer, TokenVerifier},
};
use uuid::Uuid;

/// Everything an admission test needs to drive the pipeline
pub struct TestHarness {
    pub service: Arc<AdmissionService>,
    pub store: Arc<MemoryTicketStore>,
    pub publisher: Arc<BroadcastPublisher>,
}

/// Token settings used across the test suite
pub fn test_token_config() -> TokenConfig {
    TokenConfig {
        issuer: "turnstile-test".into(),
        audience: "turnstile-test-gates".into(),
        min_ttl_seconds: 10,
        max_ttl_seconds: 300,
        leeway_seconds: 0,
    }
}

/// Fresh random HS256 key store
pub fn test_keystore() -> Arc<KeyStore> {
    let mut secret = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut secret);
    Arc::new(KeyStore::from_hs256_secret(&secret).expect("test secret is long enough"))
}

/// Harness with the default 3 second replay window
pub fn build_harness() -> TestHarness {
    build_harness_with_replay(Duration::from_secs(3))
}

/// Harness with a caller-chosen replay window; the background sweep is
/// disabled so tests control time explicitly
pub fn build_harness_with_replay(window: Duration) -> TestHarness {
    let keys = test_keystore();
    let token_config = test_token_config();

    let issuer = TokenIssuer::new(Arc::clone(&keys), &token_config);
    let verifier = TokenVerifier::new(Arc::clone(&keys), &token_config);
    let replay = ReplayGuard::new(&ReplayConfig {
        window,
        sweep_interval: Duration::from_millis(50),
        enable_background_sweep: false,
    });

    let store = Arc::new(MemoryTicketStore::new());
    let publisher = Arc::new(BroadcastPublisher::new(64));

    let repository: Arc<dyn TicketRepository> = Arc::clone(&store) as Arc<dyn TicketRepository>;
    let service = Arc::new(AdmissionService::new(
        issuer,
        verifier,
        replay,
        repository,
        Arc::clone(&publisher) as Arc<dyn turnstile_server::notify::AdmissionPublisher>,
    ));

    TestHarness {
        service,
        store,
        publisher,
    }
}

impl TestHarness {
    /// Create an event with the given re-entry policy and one ticket for it
    pub async fn seed_ticket(&self, allow_reentry: bool) -> Ticket {
        let event_id = Uuid::new_v4();
        self.store.insert_event(event_id, allow_reentry).await;

        let ticket = Ticket::new(event_id).with_seat("A-12");
        self.store.insert_ticket(ticket.clone()).await;
        ticket
    }

    /// Current repository view of a ticket
    pub async fn ticket(&self, ticket_id: Uuid) -> Ticket {
        self.store
            .get_ticket(ticket_id)
            .await
            .expect("store is in-memory")
            .expect("ticket was seeded")
    }
}
