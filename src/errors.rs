// ABOUTME: Typed error taxonomy for the admission pipeline with stable error codes
// ABOUTME: Gate UIs branch on error kind, so every rejection is discriminated, never a raw string
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Admission Error Handling
//!
//! Every rejection the admission pipeline can produce is a variant of
//! [`AdmissionError`], grouped into a token layer (the client reacts by
//! re-issuing), a business layer (terminal, surfaced verbatim to the gate
//! operator), and a concurrency layer. Replay suppression is deliberately
//! *not* an error: suppressed duplicates return the prior decision.
//!
//! Nothing in this module crashes the process on bad input; rejections are
//! ordinary return values with stable codes and HTTP status mappings.

use crate::models::PresenceState;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Stable error codes surfaced to gate clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Token layer (1000-1999)
    #[serde(rename = "TOKEN_MALFORMED")]
    TokenMalformed = 1000,
    #[serde(rename = "TOKEN_BAD_SIGNATURE")]
    TokenBadSignature = 1001,
    #[serde(rename = "TOKEN_EXPIRED")]
    TokenExpired = 1002,
    #[serde(rename = "TOKEN_NOT_YET_VALID")]
    TokenNotYetValid = 1003,
    #[serde(rename = "TOKEN_WRONG_AUDIENCE")]
    TokenWrongAudience = 1004,

    // Business layer (2000-2999)
    #[serde(rename = "TICKET_NOT_FOUND")]
    TicketNotFound = 2000,
    #[serde(rename = "TICKET_REVOKED")]
    TicketRevoked = 2001,
    #[serde(rename = "DEVICE_MISMATCH")]
    DeviceMismatch = 2002,
    #[serde(rename = "ALREADY_ADMITTED")]
    AlreadyAdmitted = 2003,
    #[serde(rename = "WRONG_DIRECTION")]
    WrongDirection = 2004,

    // Concurrency (3000-3999)
    #[serde(rename = "CONCURRENT_MODIFICATION")]
    ConcurrentModification = 3000,

    // Infrastructure (9000-9999)
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 9000,
    #[serde(rename = "STORAGE_ERROR")]
    StorageError = 9001,
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9002,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            // 400 Bad Request
            Self::TokenMalformed => 400,

            // 401 Unauthorized
            Self::TokenBadSignature | Self::TokenExpired | Self::TokenNotYetValid => 401,

            // 403 Forbidden
            Self::TokenWrongAudience
            | Self::TicketRevoked
            | Self::DeviceMismatch => 403,

            // 404 Not Found
            Self::TicketNotFound => 404,

            // 409 Conflict
            Self::AlreadyAdmitted | Self::WrongDirection | Self::ConcurrentModification => 409,

            // 500 Internal Server Error
            Self::ConfigError | Self::StorageError | Self::InternalError => 500,
        }
    }

    /// Get an operator-facing description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::TokenMalformed => "The admission token could not be parsed",
            Self::TokenBadSignature => "The admission token signature is invalid",
            Self::TokenExpired => "The admission token has expired, ask the holder to rescan",
            Self::TokenNotYetValid => "The admission token is not valid yet",
            Self::TokenWrongAudience => "The admission token was issued for a different venue",
            Self::TicketNotFound => "No ticket matches this token",
            Self::TicketRevoked => "This ticket has been revoked",
            Self::DeviceMismatch => "This ticket is locked to a different device",
            Self::AlreadyAdmitted => "This ticket has already been admitted",
            Self::WrongDirection => "The holder is already on that side of the gate",
            Self::ConcurrentModification => "Another gate processed this ticket first, rescan",
            Self::ConfigError => "Server configuration error",
            Self::StorageError => "Ticket storage is unavailable",
            Self::InternalError => "An internal server error occurred",
        }
    }
}

/// Unified error type for the admission pipeline
#[derive(Debug, Clone, Error)]
pub enum AdmissionError {
    /// Token failed structural parsing
    #[error("admission token is malformed: {details}")]
    Malformed {
        /// What exactly failed to parse
        details: String,
    },
    /// Token signature did not verify against the configured key
    #[error("admission token signature verification failed")]
    BadSignature,
    /// Token presented after its expiry instant
    #[error("admission token has expired")]
    Expired,
    /// Token presented before its not-before instant
    #[error("admission token is not valid yet")]
    NotYetValid,
    /// Token issuer or audience does not match this venue
    #[error("admission token was issued for a different issuer or audience")]
    WrongAudience,
    /// Token references a ticket the repository does not know
    #[error("ticket {ticket_id} not found")]
    TicketNotFound {
        /// Ticket id from the token's `sub` claim
        ticket_id: Uuid,
    },
    /// Ticket is revoked; revocation is terminal
    #[error("ticket {ticket_id} is revoked")]
    TicketRevoked {
        /// Revoked ticket id
        ticket_id: Uuid,
    },
    /// Claimed device hash does not match the bound one
    #[error("ticket {ticket_id} is bound to a different device")]
    DeviceMismatch {
        /// Ticket whose binding was violated
        ticket_id: Uuid,
    },
    /// Single-use ticket scanned again after admission
    #[error("ticket {ticket_id} was already admitted")]
    AlreadyAdmitted {
        /// Ticket that is already inside
        ticket_id: Uuid,
    },
    /// Scan requested the state the ticket is already in
    #[error("ticket {ticket_id} is already {current}, wrong gate direction")]
    WrongDirection {
        /// Ticket that was mis-scanned
        ticket_id: Uuid,
        /// State the ticket is already in
        current: PresenceState,
    },
    /// Version-guarded update lost twice in a row
    #[error("concurrent modification of ticket {ticket_id}")]
    ConcurrentModification {
        /// Contended ticket id
        ticket_id: Uuid,
    },
    /// Fatal configuration problem, only produced at startup
    #[error("configuration error: {0}")]
    Config(String),
    /// Ticket repository failure
    #[error("storage error: {0}")]
    Storage(String),
    /// Anything that should never happen during normal operation
    #[error("internal error: {0}")]
    Internal(String),
}

impl AdmissionError {
    /// The stable code for this error
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Malformed { .. } => ErrorCode::TokenMalformed,
            Self::BadSignature => ErrorCode::TokenBadSignature,
            Self::Expired => ErrorCode::TokenExpired,
            Self::NotYetValid => ErrorCode::TokenNotYetValid,
            Self::WrongAudience => ErrorCode::TokenWrongAudience,
            Self::TicketNotFound { .. } => ErrorCode::TicketNotFound,
            Self::TicketRevoked { .. } => ErrorCode::TicketRevoked,
            Self::DeviceMismatch { .. } => ErrorCode::DeviceMismatch,
            Self::AlreadyAdmitted { .. } => ErrorCode::AlreadyAdmitted,
            Self::WrongDirection { .. } => ErrorCode::WrongDirection,
            Self::ConcurrentModification { .. } => ErrorCode::ConcurrentModification,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Storage(_) => ErrorCode::StorageError,
            Self::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code().http_status()
    }

    /// Whether this error belongs to the token layer, where the correct
    /// client reaction is re-issuing a fresh token
    #[must_use]
    pub const fn is_token_layer(&self) -> bool {
        matches!(
            self,
            Self::Malformed { .. }
                | Self::BadSignature
                | Self::Expired
                | Self::NotYetValid
                | Self::WrongAudience
        )
    }
}

/// Result type alias for the admission pipeline
pub type AdmissionResult<T> = Result<T, AdmissionError>;

/// HTTP error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error payload
    pub error: ErrorResponseDetails,
}

/// Error payload carried in HTTP error responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    /// Stable code for client branching
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
}

impl From<&AdmissionError> for ErrorResponse {
    fn from(error: &AdmissionError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.code(),
                message: error.to_string(),
            },
        }
    }
}
