// libs/booking-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{BookingError, BookingStatus};

pub struct BookingLifecycleService;

impl BookingLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: &BookingStatus,
        new_status: &BookingStatus,
    ) -> Result<(), BookingError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(BookingError::InvalidStatusTransition(*current_status));
        }

        Ok(())
    }

    pub fn get_valid_transitions(&self, current_status: &BookingStatus) -> Vec<BookingStatus> {
        match current_status {
            BookingStatus::Booked => vec![BookingStatus::Completed, BookingStatus::Cancelled],
            // Terminal
            BookingStatus::Completed => vec![],
            BookingStatus::Cancelled => vec![],
        }
    }
}

impl Default for BookingLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booked_can_complete_or_cancel() {
        let lifecycle = BookingLifecycleService::new();
        assert!(lifecycle
            .validate_status_transition(&BookingStatus::Booked, &BookingStatus::Completed)
            .is_ok());
        assert!(lifecycle
            .validate_status_transition(&BookingStatus::Booked, &BookingStatus::Cancelled)
            .is_ok());
    }

    #[test]
    fn terminal_states_are_final() {
        let lifecycle = BookingLifecycleService::new();
        for terminal in [BookingStatus::Completed, BookingStatus::Cancelled] {
            assert!(lifecycle.get_valid_transitions(&terminal).is_empty());
            for target in [BookingStatus::Booked, BookingStatus::Completed, BookingStatus::Cancelled] {
                assert!(matches!(
                    lifecycle.validate_status_transition(&terminal, &target),
                    Err(BookingError::InvalidStatusTransition(s)) if s == terminal
                ));
            }
        }
    }

    #[test]
    fn booked_cannot_rebook() {
        let lifecycle = BookingLifecycleService::new();
        assert!(lifecycle
            .validate_status_transition(&BookingStatus::Booked, &BookingStatus::Booked)
            .is_err());
    }
}
