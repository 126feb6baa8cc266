// ABOUTME: Signing and verification key material for admission tokens
// ABOUTME: Loads key files once at startup; the KeyStore is immutable for the process lifetime
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Immutable key store for the configured signing algorithm.
//!
//! Key material is read exactly once, before the server binds its port.
//! Missing or malformed files are fatal configuration errors, never runtime
//! errors: a gate fleet with bad keys must not start at all.

use crate::config::{KeyMaterialConfig, SigningAlgorithm};
use crate::constants::limits::MIN_HS256_SECRET_BYTES;
use anyhow::{Context, Result};
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::{EncodePrivateKey, EncodePublicKey};
use ed25519_dalek::SigningKey;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use rand::rngs::OsRng;
use zeroize::Zeroize;

/// Loaded signing/verification key material
///
/// Constructed once at startup and shared behind an `Arc`; there is no
/// rotation path while the process runs.
pub struct KeyStore {
    algorithm: SigningAlgorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyStore {
    /// Load key material for the configured algorithm
    ///
    /// # Errors
    ///
    /// Returns an error if a required key file is missing, unreadable, or
    /// malformed, or if an HS256 secret is shorter than 32 bytes. All of
    /// these are fatal configuration errors.
    pub fn from_config(config: &KeyMaterialConfig) -> Result<Self> {
        match config.algorithm {
            SigningAlgorithm::Hs256 => {
                let mut secret = std::fs::read(&config.secret_path).with_context(|| {
                    format!(
                        "Failed to read HS256 secret file: {}",
                        config.secret_path.display()
                    )
                })?;
                let store = Self::from_hs256_secret(&secret);
                secret.zeroize();
                store
            }
            SigningAlgorithm::EdDsa => {
                let private_pem =
                    std::fs::read_to_string(&config.private_key_path).with_context(|| {
                        format!(
                            "Failed to read Ed25519 private key PEM: {}",
                            config.private_key_path.display()
                        )
                    })?;
                let public_pem =
                    std::fs::read_to_string(&config.public_key_path).with_context(|| {
                        format!(
                            "Failed to read Ed25519 public key PEM: {}",
                            config.public_key_path.display()
                        )
                    })?;
                Self::from_ed25519_pem(&private_pem, &public_pem)
            }
        }
    }

    /// Build an HS256 key store from raw secret bytes
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is shorter than 32 bytes.
    pub fn from_hs256_secret(secret: &[u8]) -> Result<Self> {
        if secret.len() < MIN_HS256_SECRET_BYTES {
            anyhow::bail!(
                "HS256 secret must be at least {MIN_HS256_SECRET_BYTES} bytes, got {}",
                secret.len()
            );
        }
        Ok(Self {
            algorithm: SigningAlgorithm::Hs256,
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        })
    }

    /// Build an Ed25519 key store from PEM-encoded key material
    ///
    /// # Errors
    ///
    /// Returns an error if either PEM fails to parse as an Ed25519 key.
    pub fn from_ed25519_pem(private_pem: &str, public_pem: &str) -> Result<Self> {
        let encoding = EncodingKey::from_ed_pem(private_pem.as_bytes())
            .context("Invalid Ed25519 private key PEM")?;
        let decoding = DecodingKey::from_ed_pem(public_pem.as_bytes())
            .context("Invalid Ed25519 public key PEM")?;
        Ok(Self {
            algorithm: SigningAlgorithm::EdDsa,
            encoding,
            decoding,
        })
    }

    /// Configured signing algorithm
    #[must_use]
    pub const fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    /// The JWT algorithm identifier for headers and validation
    #[must_use]
    pub const fn jwt_algorithm(&self) -> Algorithm {
        match self.algorithm {
            SigningAlgorithm::Hs256 => Algorithm::HS256,
            SigningAlgorithm::EdDsa => Algorithm::EdDSA,
        }
    }

    /// Key used for signing issued tokens
    #[must_use]
    pub const fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    /// Key used for verifying presented tokens
    #[must_use]
    pub const fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }
}

/// Generate a fresh Ed25519 key pair as (private PKCS#8 PEM, public SPKI PEM)
///
/// Used by deployment tooling and tests to bootstrap asymmetric key files.
///
/// # Errors
///
/// Returns an error if PEM encoding fails.
pub fn generate_ed25519_pem_pair() -> Result<(String, String)> {
    let signing_key = SigningKey::generate(&mut OsRng);

    let private_pem = signing_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| anyhow::anyhow!("Failed to encode Ed25519 private key: {e}"))?;
    let public_pem = signing_key
        .verifying_key()
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| anyhow::anyhow!("Failed to encode Ed25519 public key: {e}"))?;

    Ok((private_pem.to_string(), public_pem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hs256_secret_length_enforced() {
        assert!(KeyStore::from_hs256_secret(&[0u8; 16]).is_err());
        assert!(KeyStore::from_hs256_secret(&[0u8; 32]).is_ok());
    }

    #[test]
    fn test_generated_ed25519_pair_loads() {
        let (private_pem, public_pem) = generate_ed25519_pem_pair().unwrap();
        let store = KeyStore::from_ed25519_pem(&private_pem, &public_pem).unwrap();
        assert_eq!(store.jwt_algorithm(), Algorithm::EdDSA);
    }

    #[test]
    fn test_garbage_pem_rejected() {
        assert!(KeyStore::from_ed25519_pem("not a pem", "also not a pem").is_err());
    }
}
