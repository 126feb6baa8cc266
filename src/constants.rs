// ABOUTME: Application constants and environment variable accessors
// ABOUTME: Limits, defaults, route paths, and env-backed configuration helpers
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Application constants organized by domain

use std::env;

/// Environment-based configuration
pub mod env_config {
    use super::env;

    /// Get HTTP server port from environment or default
    #[must_use]
    pub fn http_port() -> u16 {
        env::var("HTTP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(super::ports::DEFAULT_HTTP_PORT)
    }

    /// Get log level from environment or default
    #[must_use]
    pub fn log_level() -> String {
        env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
    }

    /// Get signing algorithm selector from environment or default
    #[must_use]
    pub fn algorithm() -> String {
        env::var("TURNSTILE_ALGORITHM").unwrap_or_else(|_| "hs256".to_string())
    }

    /// Get HS256 shared-secret file path from environment or default
    #[must_use]
    pub fn secret_path() -> String {
        env::var("TURNSTILE_SECRET_PATH")
            .unwrap_or_else(|_| super::defaults::DEFAULT_SECRET_PATH.to_string())
    }

    /// Get Ed25519 private key PEM path from environment or default
    #[must_use]
    pub fn private_key_path() -> String {
        env::var("TURNSTILE_PRIVATE_KEY_PATH")
            .unwrap_or_else(|_| super::defaults::DEFAULT_PRIVATE_KEY_PATH.to_string())
    }

    /// Get Ed25519 public key PEM path from environment or default
    #[must_use]
    pub fn public_key_path() -> String {
        env::var("TURNSTILE_PUBLIC_KEY_PATH")
            .unwrap_or_else(|_| super::defaults::DEFAULT_PUBLIC_KEY_PATH.to_string())
    }

    /// Get token issuer string from environment or default
    #[must_use]
    pub fn issuer() -> String {
        env::var("TURNSTILE_ISSUER").unwrap_or_else(|_| super::defaults::DEFAULT_ISSUER.to_string())
    }

    /// Get token audience string from environment or default
    #[must_use]
    pub fn audience() -> String {
        env::var("TURNSTILE_AUDIENCE")
            .unwrap_or_else(|_| super::defaults::DEFAULT_AUDIENCE.to_string())
    }
}

/// Default limits and protocol bounds
pub mod limits {
    /// Shortest token lifetime a caller can request, seconds
    pub const DEFAULT_MIN_TTL_SECS: u64 = 10;
    /// Longest token lifetime a caller can request, seconds
    pub const DEFAULT_MAX_TTL_SECS: u64 = 300;
    /// Window within which the identical token string is a duplicate scan
    pub const DEFAULT_REPLAY_WINDOW_SECS: u64 = 3;
    /// How often the replay guard evicts stale fingerprints
    pub const DEFAULT_REPLAY_SWEEP_INTERVAL_SECS: u64 = 1;
    /// Clock-skew leeway applied to token timing checks, seconds
    pub const DEFAULT_TIMING_LEEWAY_SECS: u64 = 0;
    /// Minimum byte length for an HS256 shared secret
    pub const MIN_HS256_SECRET_BYTES: usize = 32;
}

/// Default configuration values
pub mod defaults {
    /// Default HS256 shared-secret location
    pub const DEFAULT_SECRET_PATH: &str = "data/turnstile.secret";
    /// Default Ed25519 private key location
    pub const DEFAULT_PRIVATE_KEY_PATH: &str = "data/turnstile_ed25519.pem";
    /// Default Ed25519 public key location
    pub const DEFAULT_PUBLIC_KEY_PATH: &str = "data/turnstile_ed25519.pub.pem";
    /// Default token issuer identity
    pub const DEFAULT_ISSUER: &str = "turnstile";
    /// Default token audience identity
    pub const DEFAULT_AUDIENCE: &str = "turnstile-gates";
}

/// Default ports
pub mod ports {
    /// Default HTTP port for the gate API
    pub const DEFAULT_HTTP_PORT: u16 = 8080;
}

/// HTTP route paths
pub mod routes {
    /// Health check endpoint
    pub const HEALTH: &str = "/health";
    /// Token issuance endpoint
    pub const TOKENS: &str = "/api/tokens";
    /// Gate admission endpoint
    pub const ADMISSIONS: &str = "/api/admissions";
}
