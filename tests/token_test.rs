// ABOUTME: Integration tests for token issuance, verification, and key loading
// ABOUTME: Covers ttl clamping, timing windows, audience checks, and signature failures
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::Utc;
use jsonwebtoken::{encode, Header};
use std::sync::Arc;
use turnstile_server::{
    config::{KeyMaterialConfig, SigningAlgorithm},
    crypto::{self, KeyStore},
    errors::AdmissionError,
    token::{AdmissionClaims, TokenIssuer, TokenVerifier},
};
use uuid::Uuid;

fn issuer_and_verifier(keys: &Arc<KeyStore>) -> (TokenIssuer, TokenVerifier) {
    let config = common::test_token_config();
    (
        TokenIssuer::new(Arc::clone(keys), &config),
        TokenVerifier::new(Arc::clone(keys), &config),
    )
}

/// Claims template signed directly, bypassing the issuer's clamping
fn raw_claims(keys: &Arc<KeyStore>, nbf: i64, exp: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = AdmissionClaims {
        sub: Uuid::new_v4(),
        jti: Uuid::new_v4(),
        event_id: Uuid::new_v4(),
        seat: None,
        allow_reentry: true,
        device_hash: "device-hash".into(),
        iat: now - 60,
        nbf,
        exp,
        iss: "turnstile-test".into(),
        aud: "turnstile-test-gates".into(),
    };
    encode(&Header::new(keys.jwt_algorithm()), &claims, keys.encoding_key()).unwrap()
}

#[test]
fn test_issue_then_verify_roundtrip() {
    let keys = common::test_keystore();
    let (issuer, verifier) = issuer_and_verifier(&keys);

    let ticket_id = Uuid::new_v4();
    let event_id = Uuid::new_v4();
    let issued = issuer
        .issue(ticket_id, event_id, Some("B-7".into()), "device-abc", 60, true)
        .unwrap();
    assert_eq!(issued.ttl_seconds, 60);

    let claims = verifier.verify(&issued.token).unwrap();
    assert_eq!(claims.sub, ticket_id);
    assert_eq!(claims.event_id, event_id);
    assert_eq!(claims.seat.as_deref(), Some("B-7"));
    assert_eq!(claims.device_hash, "device-abc");
    assert!(claims.allow_reentry);
    assert!(claims.exp > Utc::now().timestamp());
}

#[test]
fn test_requested_ttl_is_clamped() {
    let keys = common::test_keystore();
    let (issuer, _) = issuer_and_verifier(&keys);
    let ticket_id = Uuid::new_v4();
    let event_id = Uuid::new_v4();

    let too_short = issuer
        .issue(ticket_id, event_id, None, "d", 1, false)
        .unwrap();
    assert_eq!(too_short.ttl_seconds, 10);

    let too_long = issuer
        .issue(ticket_id, event_id, None, "d", 86_400, false)
        .unwrap();
    assert_eq!(too_long.ttl_seconds, 300);
}

#[test]
fn test_every_issuance_gets_a_fresh_jti() {
    let keys = common::test_keystore();
    let (issuer, verifier) = issuer_and_verifier(&keys);
    let ticket_id = Uuid::new_v4();
    let event_id = Uuid::new_v4();

    let first = issuer.issue(ticket_id, event_id, None, "d", 60, true).unwrap();
    let second = issuer.issue(ticket_id, event_id, None, "d", 60, true).unwrap();

    let jti_a = verifier.verify(&first.token).unwrap().jti;
    let jti_b = verifier.verify(&second.token).unwrap().jti;
    assert_ne!(jti_a, jti_b);
}

#[test]
fn test_expired_token_yields_expired_and_nothing_else() {
    let keys = common::test_keystore();
    let (_, verifier) = issuer_and_verifier(&keys);
    let now = Utc::now().timestamp();

    let token = raw_claims(&keys, now - 120, now - 60);
    let err = verifier.verify(&token).unwrap_err();
    assert!(matches!(err, AdmissionError::Expired));
}

#[test]
fn test_future_token_yields_not_yet_valid() {
    let keys = common::test_keystore();
    let (_, verifier) = issuer_and_verifier(&keys);
    let now = Utc::now().timestamp();

    let token = raw_claims(&keys, now + 120, now + 240);
    let err = verifier.verify(&token).unwrap_err();
    assert!(matches!(err, AdmissionError::NotYetValid));
}

#[test]
fn test_wrong_audience_rejected() {
    let keys = common::test_keystore();
    let (_, verifier) = issuer_and_verifier(&keys);
    let now = Utc::now().timestamp();

    let claims = AdmissionClaims {
        sub: Uuid::new_v4(),
        jti: Uuid::new_v4(),
        event_id: Uuid::new_v4(),
        seat: None,
        allow_reentry: false,
        device_hash: "d".into(),
        iat: now,
        nbf: now,
        exp: now + 60,
        iss: "turnstile-test".into(),
        aud: "some-other-venue".into(),
    };
    let token = encode(
        &Header::new(keys.jwt_algorithm()),
        &claims,
        keys.encoding_key(),
    )
    .unwrap();

    let err = verifier.verify(&token).unwrap_err();
    assert!(matches!(err, AdmissionError::WrongAudience));
}

#[test]
fn test_token_signed_with_different_key_rejected() {
    let keys = common::test_keystore();
    let other_keys = common::test_keystore();
    let (_, verifier) = issuer_and_verifier(&keys);
    let (other_issuer, _) = issuer_and_verifier(&other_keys);

    let forged = other_issuer
        .issue(Uuid::new_v4(), Uuid::new_v4(), None, "d", 60, true)
        .unwrap();
    let err = verifier.verify(&forged.token).unwrap_err();
    assert!(matches!(err, AdmissionError::BadSignature));
}

#[test]
fn test_garbage_token_is_malformed() {
    let keys = common::test_keystore();
    let (_, verifier) = issuer_and_verifier(&keys);

    let err = verifier.verify("definitely-not-a-token").unwrap_err();
    assert!(matches!(err, AdmissionError::Malformed { .. }));
}

#[test]
fn test_keystore_loads_hs256_secret_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let secret_path = dir.path().join("turnstile.secret");
    std::fs::write(&secret_path, [7u8; 48]).unwrap();

    let config = KeyMaterialConfig {
        algorithm: SigningAlgorithm::Hs256,
        secret_path,
        private_key_path: dir.path().join("unused.pem"),
        public_key_path: dir.path().join("unused.pub.pem"),
    };
    assert!(KeyStore::from_config(&config).is_ok());
}

#[test]
fn test_keystore_missing_secret_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = KeyMaterialConfig {
        algorithm: SigningAlgorithm::Hs256,
        secret_path: dir.path().join("missing.secret"),
        private_key_path: dir.path().join("unused.pem"),
        public_key_path: dir.path().join("unused.pub.pem"),
    };
    assert!(KeyStore::from_config(&config).is_err());
}

#[test]
fn test_eddsa_roundtrip_via_key_files() {
    let dir = tempfile::tempdir().unwrap();
    let (private_pem, public_pem) = crypto::keys::generate_ed25519_pem_pair().unwrap();

    let private_key_path = dir.path().join("turnstile_ed25519.pem");
    let public_key_path = dir.path().join("turnstile_ed25519.pub.pem");
    std::fs::write(&private_key_path, private_pem).unwrap();
    std::fs::write(&public_key_path, public_pem).unwrap();

    let config = KeyMaterialConfig {
        algorithm: SigningAlgorithm::EdDsa,
        secret_path: dir.path().join("unused.secret"),
        private_key_path,
        public_key_path,
    };
    let keys = Arc::new(KeyStore::from_config(&config).unwrap());
    let (issuer, verifier) = issuer_and_verifier(&keys);

    let ticket_id = Uuid::new_v4();
    let issued = issuer
        .issue(ticket_id, Uuid::new_v4(), None, "device-ed", 30, false)
        .unwrap();
    let claims = verifier.verify(&issued.token).unwrap();
    assert_eq!(claims.sub, ticket_id);
    assert_eq!(claims.device_hash, "device-ed");
}
