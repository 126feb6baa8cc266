// ABOUTME: Device binding policy locking a ticket to the first device that redeems it
// ABOUTME: First use binds, later mismatches are hard rejections, never a silent re-bind
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Device Binding
//!
//! A ticket, once used from a device, stays bound to that device's
//! identifying hash. A mismatch is always a hard rejection: silently
//! re-binding would let a forwarded ticket screenshot travel between phones,
//! which is exactly what binding exists to prevent.
//!
//! A holder who intentionally rotates their device secret (app reinstall,
//! cleared storage) produces a new hash and therefore a mismatch; recovery is
//! an explicit administrative unbind, never an automated path.

use crate::errors::{AdmissionError, AdmissionResult};
use crate::models::Ticket;
use subtle::ConstantTimeEq;

/// What the binding check did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    /// Ticket was unbound; this call bound it to the claimed hash
    Bound,
    /// Claimed hash matched the existing binding
    Matched,
}

/// Enforces first-use device binding on tickets
pub struct DeviceBindingPolicy;

impl DeviceBindingPolicy {
    /// Check the claimed device hash against the ticket's binding, binding
    /// on first use
    ///
    /// Mutates only the in-memory ticket; the binding is persisted together
    /// with the presence transition, so rejected admissions never leave a
    /// stray binding behind.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::DeviceMismatch`] when the ticket is bound
    /// to a different hash.
    pub fn check_and_bind(ticket: &mut Ticket, claimed_hash: &str) -> AdmissionResult<BindOutcome> {
        match &ticket.device_bound_key {
            None => {
                ticket.device_bound_key = Some(claimed_hash.to_owned());
                tracing::debug!(ticket_id = %ticket.id, "Bound ticket to first-use device");
                Ok(BindOutcome::Bound)
            }
            Some(bound) => {
                if hashes_match(bound, claimed_hash) {
                    Ok(BindOutcome::Matched)
                } else {
                    tracing::warn!(ticket_id = %ticket.id, "Device hash mismatch on bound ticket");
                    Err(AdmissionError::DeviceMismatch {
                        ticket_id: ticket.id,
                    })
                }
            }
        }
    }
}

/// Constant-time equality over device hashes
fn hashes_match(bound: &str, claimed: &str) -> bool {
    // ct_eq requires equal lengths; differing lengths are an immediate
    // mismatch and leak nothing useful
    bound.len() == claimed.len() && bound.as_bytes().ct_eq(claimed.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_first_use_binds() {
        let mut ticket = Ticket::new(Uuid::new_v4());
        let outcome = DeviceBindingPolicy::check_and_bind(&mut ticket, "device-a").unwrap();
        assert_eq!(outcome, BindOutcome::Bound);
        assert_eq!(ticket.device_bound_key.as_deref(), Some("device-a"));
    }

    #[test]
    fn test_same_device_matches() {
        let mut ticket = Ticket::new(Uuid::new_v4());
        DeviceBindingPolicy::check_and_bind(&mut ticket, "device-a").unwrap();
        let outcome = DeviceBindingPolicy::check_and_bind(&mut ticket, "device-a").unwrap();
        assert_eq!(outcome, BindOutcome::Matched);
    }

    #[test]
    fn test_different_device_is_hard_rejection() {
        let mut ticket = Ticket::new(Uuid::new_v4());
        DeviceBindingPolicy::check_and_bind(&mut ticket, "device-a").unwrap();

        let err = DeviceBindingPolicy::check_and_bind(&mut ticket, "device-b").unwrap_err();
        assert!(matches!(err, AdmissionError::DeviceMismatch { .. }));
        // Never silently re-bound
        assert_eq!(ticket.device_bound_key.as_deref(), Some("device-a"));
    }

    #[test]
    fn test_length_difference_mismatches() {
        let mut ticket = Ticket::new(Uuid::new_v4());
        DeviceBindingPolicy::check_and_bind(&mut ticket, "device-a").unwrap();
        assert!(DeviceBindingPolicy::check_and_bind(&mut ticket, "device-a-longer").is_err());
    }
}
