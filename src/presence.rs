// ABOUTME: Presence state machine deciding whether a scan may transition a ticket
// ABOUTME: Pure function of (current state, requested direction, re-entry policy)
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Presence State Machine
//!
//! Two states, `Outside` and `Inside`, and two policies:
//!
//! - re-entry allowed: the holder may toggle in and out; a scan requesting
//!   the state the ticket is already in is rejected as a wrong gate
//!   direction, so operators get immediate feedback on mis-scans instead of
//!   a silent accept.
//! - re-entry disallowed: strictly single-use; the only transition ever
//!   permitted is `Outside -> Inside`, and every later scan is rejected as
//!   already admitted.
//!
//! The function is pure: applying the accepted transition (state plus
//! version increment) is the repository's job, and rejections never mutate
//! anything.

use crate::errors::{AdmissionError, AdmissionResult};
use crate::models::{Direction, PresenceState};
use uuid::Uuid;

/// Compute the next presence state for a scan, or the typed rejection
///
/// # Errors
///
/// - [`AdmissionError::AlreadyAdmitted`] when a single-use ticket is scanned
///   again after entering.
/// - [`AdmissionError::WrongDirection`] when the scan requests the state the
///   ticket is already in.
pub fn transition(
    ticket_id: Uuid,
    current: PresenceState,
    direction: Direction,
    allow_reentry: bool,
) -> AdmissionResult<PresenceState> {
    let requested = direction.target_state();

    if allow_reentry {
        if requested == current {
            return Err(AdmissionError::WrongDirection { ticket_id, current });
        }
        return Ok(requested);
    }

    // Single-use policy: only the first entry is ever permitted
    match (current, requested) {
        (PresenceState::Outside, PresenceState::Inside) => Ok(PresenceState::Inside),
        (PresenceState::Inside, _) => Err(AdmissionError::AlreadyAdmitted { ticket_id }),
        (PresenceState::Outside, PresenceState::Outside) => {
            Err(AdmissionError::WrongDirection { ticket_id, current })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> Uuid {
        Uuid::new_v4()
    }

    #[test]
    fn test_reentry_allows_toggling() {
        let next = transition(id(), PresenceState::Outside, Direction::Inside, true).unwrap();
        assert_eq!(next, PresenceState::Inside);

        let next = transition(id(), PresenceState::Inside, Direction::Outside, true).unwrap();
        assert_eq!(next, PresenceState::Outside);
    }

    #[test]
    fn test_reentry_rejects_same_direction() {
        let err = transition(id(), PresenceState::Inside, Direction::Inside, true).unwrap_err();
        assert!(matches!(err, AdmissionError::WrongDirection { .. }));

        let err = transition(id(), PresenceState::Outside, Direction::Outside, true).unwrap_err();
        assert!(matches!(err, AdmissionError::WrongDirection { .. }));
    }

    #[test]
    fn test_single_use_permits_exactly_one_entry() {
        let next = transition(id(), PresenceState::Outside, Direction::Inside, false).unwrap();
        assert_eq!(next, PresenceState::Inside);
    }

    #[test]
    fn test_single_use_rejects_everything_after_entry() {
        let err = transition(id(), PresenceState::Inside, Direction::Inside, false).unwrap_err();
        assert!(matches!(err, AdmissionError::AlreadyAdmitted { .. }));

        let err = transition(id(), PresenceState::Inside, Direction::Outside, false).unwrap_err();
        assert!(matches!(err, AdmissionError::AlreadyAdmitted { .. }));
    }

    #[test]
    fn test_single_use_exit_scan_while_outside_is_wrong_direction() {
        let err = transition(id(), PresenceState::Outside, Direction::Outside, false).unwrap_err();
        assert!(matches!(err, AdmissionError::WrongDirection { .. }));
    }
}
