// ABOUTME: Main library entry point for the Turnstile gate admission server
// ABOUTME: Issues device-bound admission tokens and tracks presence state across gate scans
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![deny(unsafe_code)]

//! # Turnstile Server
//!
//! Turnstile grants and checks time-limited, device-bound admission
//! credentials for a physical event, and tracks each credential's presence
//! state (inside/outside the venue) as gate scanners process it repeatedly
//! over the event's duration.
//!
//! ## Architecture
//!
//! - **`KeyStore`**: signing/verification key material, loaded once at
//!   startup and immutable afterwards
//! - **`TokenIssuer` / `TokenVerifier`**: short-lived signed tokens proving
//!   possession of a specific ticket on a specific device
//! - **`ReplayGuard`**: suppresses the duplicate frames a continuously
//!   scanning gate camera produces
//! - **`DeviceBindingPolicy`**: locks a ticket to the first device that
//!   redeems it
//! - **presence state machine**: advances inside/outside under the event's
//!   re-entry policy
//! - **`AdmissionService`**: orchestrates the whole pipeline; the single
//!   entry point gates call
//!
//! Ticket storage and the notification pipeline are external collaborators
//! behind the `TicketRepository` and `AdmissionPublisher` traits.
//!
//! ## Example
//!
//! ```rust,no_run
//! use turnstile_server::config::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Turnstile configured: {}", config.summary());
//!     Ok(())
//! }
//! ```

/// Admission pipeline orchestration
pub mod admission;

/// Device binding policy
pub mod binding;

/// Configuration management
pub mod config;

/// Application constants and environment accessors
pub mod constants;

/// Cryptographic key management
pub mod crypto;

/// Frame decode pipeline (untrusted, outside the token trust boundary)
pub mod decode;

/// Typed error taxonomy with stable codes
pub mod errors;

/// Logging configuration and setup
pub mod logging;

/// Core data structures
pub mod models;

/// Admission event publishing
pub mod notify;

/// Presence state machine
pub mod presence;

/// Replay suppression for duplicate scan frames
pub mod replay;

/// HTTP routes for the gate API
pub mod routes;

/// Ticket repository abstraction and in-memory backend
pub mod store;

/// Admission token issuance and verification
pub mod token;
