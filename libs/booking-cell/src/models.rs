// libs/booking-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use doctor_cell::models::DoctorError;
use shared_database::DatabaseError;

/// Stored when a cancellation arrives without a reason.
pub const DEFAULT_CANCEL_REASON: &str = "No reason provided";
/// Stored when a consultation is completed without notes. Existing records carry this exact text.
pub const DEFAULT_COMPLETION_NOTES: &str = "no nots";

// ==============================================================================
// CORE BOOKING MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_date: NaiveDate,
    #[serde(with = "shared_utils::hhmm")]
    pub time_slot: NaiveTime,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn slot_label(&self) -> String {
        shared_utils::hhmm::format(&self.time_slot)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Booked,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Booked => "booked",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Projection used when only the occupied slot of a booking matters.
#[derive(Debug, Clone, Deserialize)]
pub struct BookedSlotRow {
    #[serde(with = "shared_utils::hhmm")]
    pub time_slot: NaiveTime,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Raw booking submission. Fields stay optional so a missing one is reported
/// as a validation error rather than a deserialisation failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
    pub appointment_date: Option<String>,
    pub time_slot: Option<String>,
    pub notes: Option<String>,
    /// Spacing the slot was offered under, when the client overrode the default.
    pub interval_minutes: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBookingRequest {
    pub appointment_date: Option<String>,
    pub time_slot: Option<String>,
    pub notes: Option<String>,
    pub reason: Option<String>,
    pub interval_minutes: Option<f64>,
}

impl UpdateBookingRequest {
    /// True when nothing would be written. `interval_minutes` only qualifies a move.
    pub fn is_empty(&self) -> bool {
        self.appointment_date.is_none()
            && self.time_slot.is_none()
            && self.notes.is_none()
            && self.reason.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelBookingRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompleteBookingRequest {
    pub notes: Option<String>,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSlotsResponse {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub slots: Vec<String>,
    pub total_slots: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCountResponse {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub status: BookingStatus,
    pub count: usize,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum BookingError {
    #[error("Booking not found")]
    NotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Time slot {time_slot} on {date} is not available")]
    SlotUnavailable { date: NaiveDate, time_slot: String },

    #[error("Booking is already {0} and cannot change status")]
    InvalidStatusTransition(BookingStatus),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DatabaseError> for BookingError {
    fn from(err: DatabaseError) -> Self {
        BookingError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for BookingError {
    fn from(err: serde_json::Error) -> Self {
        BookingError::DatabaseError(format!("Malformed booking record: {}", err))
    }
}

impl From<DoctorError> for BookingError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => BookingError::DoctorNotFound,
            DoctorError::ValidationError(msg) => BookingError::ValidationError(msg),
            DoctorError::DatabaseError(msg) => BookingError::DatabaseError(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn booking_reads_postgres_row() {
        let booking: Booking = serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "patient_id": Uuid::new_v4(),
            "doctor_id": Uuid::new_v4(),
            "appointment_date": "2024-06-03",
            "time_slot": "09:20:00",
            "status": "booked",
            "notes": null,
            "reason": null,
            "created_at": "2024-06-01T08:00:00Z",
            "updated_at": "2024-06-01T08:00:00Z"
        }))
        .unwrap();

        assert_eq!(booking.slot_label(), "09:20");
        assert_eq!(booking.status, BookingStatus::Booked);
        assert_eq!(serde_json::to_value(&booking).unwrap()["time_slot"], "09:20");
    }

    #[test]
    fn terminal_statuses() {
        assert!(!BookingStatus::Booked.is_terminal());
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert_eq!(BookingStatus::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn doctor_errors_translate() {
        assert!(matches!(BookingError::from(DoctorError::NotFound), BookingError::DoctorNotFound));
        assert!(matches!(
            BookingError::from(DoctorError::ValidationError("bad".into())),
            BookingError::ValidationError(_)
        ));
    }
}
