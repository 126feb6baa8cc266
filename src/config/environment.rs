// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables, deployment modes, and runtime configuration parsing
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Environment-based configuration management for production deployment

use crate::constants::{env_config, limits};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Strongly typed log level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
            Self::Trace => tracing::Level::TRACE,
        }
    }

    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Environment type for security and logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Signing algorithm for admission tokens
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SigningAlgorithm {
    /// Symmetric HMAC-SHA256 with a shared secret file
    #[default]
    Hs256,
    /// Asymmetric Ed25519 with a PEM key pair
    EdDsa,
}

impl SigningAlgorithm {
    /// Parse from the configured selector string
    ///
    /// # Errors
    ///
    /// Returns an error for any selector other than `hs256` or `eddsa`;
    /// an unsupported algorithm is a fatal configuration error.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "hs256" => Ok(Self::Hs256),
            "eddsa" | "ed25519" => Ok(Self::EdDsa),
            other => anyhow::bail!("Unsupported signing algorithm: {other}"),
        }
    }
}

impl std::fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hs256 => write!(f, "hs256"),
            Self::EdDsa => write!(f, "eddsa"),
        }
    }
}

/// Key material locations for the configured algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyMaterialConfig {
    /// Selected signing algorithm
    pub algorithm: SigningAlgorithm,
    /// HS256 shared-secret file (raw bytes, min 32)
    pub secret_path: PathBuf,
    /// Ed25519 private key PEM (PKCS#8)
    pub private_key_path: PathBuf,
    /// Ed25519 public key PEM (SPKI)
    pub public_key_path: PathBuf,
}

/// Token issuance and verification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Issuer string embedded in and required from every token
    pub issuer: String,
    /// Audience string embedded in and required from every token
    pub audience: String,
    /// Lower clamp for requested token lifetimes, seconds
    pub min_ttl_seconds: u64,
    /// Upper clamp for requested token lifetimes, seconds
    pub max_ttl_seconds: u64,
    /// Clock-skew leeway for timing checks, seconds
    pub leeway_seconds: u64,
}

/// Replay suppression settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Window within which a repeated token string is a duplicate scan
    pub window: Duration,
    /// Interval between background eviction sweeps
    pub sweep_interval: Duration,
    /// Whether to spawn the background sweep task
    pub enable_background_sweep: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(limits::DEFAULT_REPLAY_WINDOW_SECS),
            sweep_interval: Duration::from_secs(limits::DEFAULT_REPLAY_SWEEP_INTERVAL_SECS),
            enable_background_sweep: true,
        }
    }
}

/// Complete server configuration, loaded once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP port for the gate API
    pub http_port: u16,
    /// Log verbosity
    pub log_level: LogLevel,
    /// Deployment environment
    pub environment: Environment,
    /// Key material configuration
    pub keys: KeyMaterialConfig,
    /// Token protocol configuration
    pub token: TokenConfig,
    /// Replay guard configuration
    pub replay: ReplayConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but unparseable, or if the
    /// algorithm selector names an unsupported algorithm.
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        // Load .env file if it exists
        if let Err(e) = dotenvy::dotenv() {
            warn!("No .env file found or failed to load: {}", e);
        }

        let config = Self {
            http_port: env_config::http_port(),
            log_level: LogLevel::from_str_or_default(&env_config::log_level()),
            environment: Environment::from_str_or_default(&env_var_or("ENVIRONMENT", "development")?),

            keys: KeyMaterialConfig {
                algorithm: SigningAlgorithm::parse(&env_config::algorithm())?,
                secret_path: PathBuf::from(env_config::secret_path()),
                private_key_path: PathBuf::from(env_config::private_key_path()),
                public_key_path: PathBuf::from(env_config::public_key_path()),
            },

            token: TokenConfig {
                issuer: env_config::issuer(),
                audience: env_config::audience(),
                min_ttl_seconds: env_var_or(
                    "TOKEN_TTL_MIN_SECS",
                    &limits::DEFAULT_MIN_TTL_SECS.to_string(),
                )?
                .parse()
                .context("Invalid TOKEN_TTL_MIN_SECS value")?,
                max_ttl_seconds: env_var_or(
                    "TOKEN_TTL_MAX_SECS",
                    &limits::DEFAULT_MAX_TTL_SECS.to_string(),
                )?
                .parse()
                .context("Invalid TOKEN_TTL_MAX_SECS value")?,
                leeway_seconds: env_var_or(
                    "TOKEN_LEEWAY_SECS",
                    &limits::DEFAULT_TIMING_LEEWAY_SECS.to_string(),
                )?
                .parse()
                .context("Invalid TOKEN_LEEWAY_SECS value")?,
            },

            replay: ReplayConfig {
                window: Duration::from_secs(
                    env_var_or(
                        "REPLAY_WINDOW_SECS",
                        &limits::DEFAULT_REPLAY_WINDOW_SECS.to_string(),
                    )?
                    .parse()
                    .context("Invalid REPLAY_WINDOW_SECS value")?,
                ),
                sweep_interval: Duration::from_secs(
                    env_var_or(
                        "REPLAY_SWEEP_INTERVAL_SECS",
                        &limits::DEFAULT_REPLAY_SWEEP_INTERVAL_SECS.to_string(),
                    )?
                    .parse()
                    .context("Invalid REPLAY_SWEEP_INTERVAL_SECS value")?,
                ),
                enable_background_sweep: true,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Sanity checks beyond per-field parsing
    fn validate(&self) -> Result<()> {
        if self.token.min_ttl_seconds == 0 {
            anyhow::bail!("TOKEN_TTL_MIN_SECS must be at least 1");
        }
        if self.token.min_ttl_seconds > self.token.max_ttl_seconds {
            anyhow::bail!(
                "TOKEN_TTL_MIN_SECS ({}) exceeds TOKEN_TTL_MAX_SECS ({})",
                self.token.min_ttl_seconds,
                self.token.max_ttl_seconds
            );
        }
        if self.token.issuer.is_empty() || self.token.audience.is_empty() {
            anyhow::bail!("TURNSTILE_ISSUER and TURNSTILE_AUDIENCE must be non-empty");
        }
        if self.replay.window.is_zero() {
            anyhow::bail!("REPLAY_WINDOW_SECS must be at least 1");
        }
        Ok(())
    }

    /// One-line startup summary for operators
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "port={} env={} alg={} issuer={} audience={} ttl={}..{}s replay_window={}s",
            self.http_port,
            self.environment,
            self.keys.algorithm,
            self.token.issuer,
            self.token.audience,
            self.token.min_ttl_seconds,
            self.token.max_ttl_seconds,
            self.replay.window.as_secs(),
        )
    }
}

/// Read an environment variable with a default fallback
fn env_var_or(name: &str, default: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) => Ok(value),
        Err(env::VarError::NotPresent) => Ok(default.to_string()),
        Err(e) => Err(e).with_context(|| format!("Failed to read environment variable {name}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str_or_default("debug"), LogLevel::Debug);
        assert_eq!(LogLevel::from_str_or_default("WARN"), LogLevel::Warn);
        assert_eq!(LogLevel::from_str_or_default("nonsense"), LogLevel::Info);
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            Environment::from_str_or_default("prod"),
            Environment::Production
        );
        assert_eq!(
            Environment::from_str_or_default("unknown"),
            Environment::Development
        );
    }

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!(
            SigningAlgorithm::parse("hs256").unwrap(),
            SigningAlgorithm::Hs256
        );
        assert_eq!(
            SigningAlgorithm::parse("Ed25519").unwrap(),
            SigningAlgorithm::EdDsa
        );
        assert!(SigningAlgorithm::parse("rs256").is_err());
    }

    #[test]
    fn test_ttl_bounds_validation() {
        let mut config = ServerConfig {
            http_port: 8080,
            log_level: LogLevel::Info,
            environment: Environment::Testing,
            keys: KeyMaterialConfig {
                algorithm: SigningAlgorithm::Hs256,
                secret_path: PathBuf::from("secret"),
                private_key_path: PathBuf::from("priv"),
                public_key_path: PathBuf::from("pub"),
            },
            token: TokenConfig {
                issuer: "turnstile".into(),
                audience: "turnstile-gates".into(),
                min_ttl_seconds: 10,
                max_ttl_seconds: 300,
                leeway_seconds: 0,
            },
            replay: ReplayConfig::default(),
        };
        assert!(config.validate().is_ok());

        config.token.min_ttl_seconds = 600;
        assert!(config.validate().is_err());
    }
}
