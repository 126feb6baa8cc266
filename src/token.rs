// ABOUTME: Admission token issuance and verification built on signed JWTs
// ABOUTME: Issuance is stateless; verification maps JWT failures onto the typed error taxonomy
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Admission Tokens
//!
//! A holder's device periodically requests a fresh token and renders it as a
//! QR code; gates decode the string and present it for verification. Tokens
//! are deliberately short-lived (clamped to a configured range) so a
//! screenshot leaks at most a few minutes of admissibility.
//!
//! Token validity and business validity are separate concerns: the verifier
//! only proves the token is authentic, timely, and meant for this venue.
//! Ticket state, revocation, and device binding are checked afterwards by the
//! admission service against the repository.

use crate::config::TokenConfig;
use crate::crypto::KeyStore;
use crate::errors::{AdmissionError, AdmissionResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Claims carried inside every admission token
///
/// Ephemeral: signed, transmitted, verified, discarded. `allow_reentry` is a
/// snapshot of the event policy at issuance time; the admission service
/// re-reads the live policy at scan time and never trusts this field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionClaims {
    /// Ticket id this token proves possession of
    pub sub: Uuid,
    /// Unique id for this issuance, fresh per call
    pub jti: Uuid,
    /// Event the ticket admits to
    pub event_id: Uuid,
    /// Seat label, if the event is seated
    pub seat: Option<String>,
    /// Re-entry policy snapshot at issuance time (informational only)
    pub allow_reentry: bool,
    /// Hash identifying the device that requested the token
    pub device_hash: String,
    /// Issued-at timestamp (unix seconds)
    pub iat: i64,
    /// Not-before timestamp (unix seconds)
    pub nbf: i64,
    /// Expiry timestamp (unix seconds)
    pub exp: i64,
    /// Issuer identity
    pub iss: String,
    /// Audience identity
    pub aud: String,
}

/// A freshly signed token plus the lifetime actually granted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    /// Compact signed token string, ready for QR display
    pub token: String,
    /// Granted lifetime after clamping, seconds
    pub ttl_seconds: u64,
}

/// Clamp a requested lifetime into the configured bounds
const fn clamp_ttl(requested: u64, min: u64, max: u64) -> u64 {
    if requested < min {
        min
    } else if requested > max {
        max
    } else {
        requested
    }
}

/// Stateless producer of signed admission tokens
///
/// Issuance is a pure function of its inputs plus key material: no repository
/// access, no side effects, safe to call from any number of workers.
pub struct TokenIssuer {
    keys: Arc<KeyStore>,
    issuer: String,
    audience: String,
    min_ttl_seconds: u64,
    max_ttl_seconds: u64,
}

impl TokenIssuer {
    /// Create an issuer bound to the process key store and token config
    #[must_use]
    pub fn new(keys: Arc<KeyStore>, config: &TokenConfig) -> Self {
        Self {
            keys,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            min_ttl_seconds: config.min_ttl_seconds,
            max_ttl_seconds: config.max_ttl_seconds,
        }
    }

    /// Issue a signed token for a ticket+device pair
    ///
    /// The requested lifetime is clamped to the configured range regardless
    /// of caller input. A fresh `jti` is generated per call and never reused.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::Internal`] if signing fails; there are no
    /// ticket-related errors because issuance does not consult the
    /// repository.
    pub fn issue(
        &self,
        ticket_id: Uuid,
        event_id: Uuid,
        seat: Option<String>,
        device_hash: &str,
        requested_ttl_seconds: u64,
        allow_reentry: bool,
    ) -> AdmissionResult<IssuedToken> {
        let ttl_seconds = clamp_ttl(
            requested_ttl_seconds,
            self.min_ttl_seconds,
            self.max_ttl_seconds,
        );
        let now = Utc::now();
        let expiry = now + Duration::seconds(i64::try_from(ttl_seconds).unwrap_or(i64::MAX));

        let claims = AdmissionClaims {
            sub: ticket_id,
            jti: Uuid::new_v4(),
            event_id,
            seat,
            allow_reentry,
            device_hash: device_hash.to_owned(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expiry.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        let header = Header::new(self.keys.jwt_algorithm());
        let token = encode(&header, &claims, self.keys.encoding_key())
            .map_err(|e| AdmissionError::Internal(format!("Token signing failed: {e}")))?;

        tracing::debug!(
            ticket_id = %ticket_id,
            jti = %claims.jti,
            ttl_seconds,
            "Issued admission token"
        );

        Ok(IssuedToken { token, ttl_seconds })
    }
}

/// Verifier for presented admission tokens
///
/// Checks, in order: structural parse, signature against the configured key,
/// issuer/audience match, and the `nbf <= now <= exp` timing window. Knows
/// nothing about ticket state or revocation.
pub struct TokenVerifier {
    keys: Arc<KeyStore>,
    validation: Validation,
}

impl TokenVerifier {
    /// Create a verifier bound to the process key store and token config
    #[must_use]
    pub fn new(keys: Arc<KeyStore>, config: &TokenConfig) -> Self {
        let mut validation = Validation::new(keys.jwt_algorithm());
        validation.leeway = config.leeway_seconds;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_audience(&[config.audience.clone()]);
        validation.set_issuer(&[config.issuer.clone()]);
        Self { keys, validation }
    }

    /// Verify a token string and return its claims
    ///
    /// # Errors
    ///
    /// Returns `Malformed`, `BadSignature`, `Expired`, `NotYetValid`, or
    /// `WrongAudience`; the claims are only returned when every check passed.
    pub fn verify(&self, token: &str) -> AdmissionResult<AdmissionClaims> {
        let data = decode::<AdmissionClaims>(token, self.keys.decoding_key(), &self.validation)
            .map_err(|e| convert_jwt_error(&e))?;
        Ok(data.claims)
    }
}

/// Map JWT library errors onto the typed taxonomy
fn convert_jwt_error(e: &jsonwebtoken::errors::Error) -> AdmissionError {
    use jsonwebtoken::errors::ErrorKind;

    match e.kind() {
        ErrorKind::ExpiredSignature => AdmissionError::Expired,
        ErrorKind::ImmatureSignature => AdmissionError::NotYetValid,
        ErrorKind::InvalidAudience | ErrorKind::InvalidIssuer => AdmissionError::WrongAudience,
        // A header claiming a different algorithm is treated as a forged
        // signature, not a malformed token
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AdmissionError::BadSignature,
        ErrorKind::InvalidToken => AdmissionError::Malformed {
            details: "Token format is invalid".into(),
        },
        ErrorKind::Base64(base64_err) => AdmissionError::Malformed {
            details: format!("Token contains invalid base64: {base64_err}"),
        },
        ErrorKind::Json(json_err) => AdmissionError::Malformed {
            details: format!("Token claims are invalid JSON: {json_err}"),
        },
        ErrorKind::Utf8(utf8_err) => AdmissionError::Malformed {
            details: format!("Token contains invalid UTF-8: {utf8_err}"),
        },
        ErrorKind::MissingRequiredClaim(claim) => AdmissionError::Malformed {
            details: format!("Token is missing required claim: {claim}"),
        },
        _ => AdmissionError::Malformed {
            details: format!("Token validation failed: {e}"),
        },
    }
}
