// ABOUTME: Cryptographic utilities module for admission token signing
// ABOUTME: Wraps key loading and Ed25519 key generation behind an immutable KeyStore
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Cryptographic key management

/// Signing and verification key material
pub mod keys;

pub use keys::KeyStore;
