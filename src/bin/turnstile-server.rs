// ABOUTME: Server binary wiring configuration, keys, storage, and the gate HTTP API together
// ABOUTME: Fails fast on configuration or key errors before binding the port
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Turnstile Server Binary
//!
//! Starts the gate admission API with environment-driven configuration. Key
//! material problems are fatal here, before the port binds: a gate fleet
//! with bad keys must not come up half-working.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use turnstile_server::{
    admission::AdmissionService,
    config::ServerConfig,
    crypto::KeyStore,
    logging,
    notify::BroadcastPublisher,
    replay::ReplayGuard,
    store::MemoryTicketStore,
    token::{TokenIssuer, TokenVerifier},
};

/// Capacity of the admission event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::from_env()?;

    logging::init_from_env()?;

    info!("Starting Turnstile gate admission server");
    info!("{}", config.summary());

    // Fatal if key material is missing or malformed
    let keys = Arc::new(
        KeyStore::from_config(&config.keys)
            .context("Failed to load signing key material")?,
    );
    info!("Key material loaded for algorithm {}", config.keys.algorithm);

    let issuer = TokenIssuer::new(Arc::clone(&keys), &config.token);
    let verifier = TokenVerifier::new(Arc::clone(&keys), &config.token);
    let replay = ReplayGuard::new(&config.replay);

    // The in-memory store is the reference backend; production deployments
    // plug the venue's ticket system in behind TicketRepository
    let repository = Arc::new(MemoryTicketStore::new());
    let publisher = Arc::new(BroadcastPublisher::new(EVENT_CHANNEL_CAPACITY));

    let service = Arc::new(AdmissionService::new(
        issuer, verifier, replay, repository, publisher,
    ));

    let app = turnstile_server::routes::router(service);
    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Gate API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Turnstile server shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install shutdown signal handler: {}", e);
    }
}
