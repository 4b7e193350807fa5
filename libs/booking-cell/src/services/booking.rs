// libs/booking-cell/src/services/booking.rs
use std::collections::HashSet;

use chrono::{Local, NaiveDate, NaiveTime, Utc};
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::services::{generate_slots, interval_from_minutes, AvailabilityService};
use shared_config::AppConfig;
use shared_database::{supabase::SupabaseClient, DatabaseError};
use shared_utils::hhmm;

use crate::models::{
    BookedSlotRow, Booking, BookingError, BookingStatus, CreateBookingRequest,
    UpdateBookingRequest, DEFAULT_CANCEL_REASON, DEFAULT_COMPLETION_NOTES,
};
use crate::services::lifecycle::BookingLifecycleService;

const BOOKINGS_PATH: &str = "/rest/v1/bookings";

/// Validated fields of a booking submission.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_date: NaiveDate,
    pub time_slot: NaiveTime,
    pub notes: Option<String>,
    /// Slot spacing the client picked `time_slot` under; `None` means the configured default.
    pub interval_minutes: Option<f64>,
}

impl NewBooking {
    pub fn from_request(request: CreateBookingRequest) -> Result<Self, BookingError> {
        let patient_id = required(request.patient_id, "patient_id")?;
        let doctor_id = required(request.doctor_id, "doctor_id")?;
        let appointment_date = required(request.appointment_date, "appointment_date")?;
        let time_slot = required(request.time_slot, "time_slot")?;

        Ok(Self {
            patient_id: parse_id(&patient_id, "patient")?,
            doctor_id: parse_id(&doctor_id, "doctor")?,
            appointment_date: parse_date(&appointment_date, "appointment_date")?,
            time_slot: parse_slot(&time_slot)?,
            notes: non_blank(request.notes),
            interval_minutes: request.interval_minutes,
        })
    }
}

pub struct BookingService {
    supabase: SupabaseClient,
    availability_service: AvailabilityService,
    lifecycle_service: BookingLifecycleService,
    default_interval_minutes: f64,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            availability_service: AvailabilityService::new(config),
            lifecycle_service: BookingLifecycleService::new(),
            default_interval_minutes: config.slot_interval_minutes,
        }
    }

    // ==========================================================================
    // SLOT QUERIES
    // ==========================================================================

    /// Free slots for a doctor on a date, in generator order.
    ///
    /// Recomputed on every call from the doctor's weekly window and the
    /// currently `booked` records; nothing is cached.
    pub async fn get_available_slots(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        interval_minutes: Option<f64>,
        auth_token: Option<&str>,
    ) -> Result<Vec<String>, BookingError> {
        let doctor_uuid = parse_id(doctor_id, "doctor")?;
        let interval = interval_from_minutes(interval_minutes.unwrap_or(self.default_interval_minutes))?;

        let window = match self
            .availability_service
            .availability_for(doctor_id, date, auth_token)
            .await?
        {
            Some(window) => window,
            None => return Ok(Vec::new()),
        };

        let candidates = generate_slots(window.start_time, window.end_time, interval);
        let taken = self.booked_slots(doctor_uuid, date, auth_token).await?;

        let available: Vec<String> = candidates
            .iter()
            .map(hhmm::format)
            .filter(|slot| !taken.contains(slot))
            .collect();

        debug!(
            "Doctor {} on {}: {} candidate slots, {} taken, {} free",
            doctor_uuid,
            date,
            candidates.len(),
            taken.len(),
            available.len()
        );

        Ok(available)
    }

    async fn booked_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<HashSet<String>, BookingError> {
        let path = format!(
            "{}?doctor_id=eq.{}&appointment_date=eq.{}&status=eq.booked&select=time_slot",
            BOOKINGS_PATH, doctor_id, date
        );
        let rows: Vec<BookedSlotRow> = self.supabase.request(Method::GET, &path, auth_token, None).await?;

        Ok(rows.iter().map(|row| hhmm::format(&row.time_slot)).collect())
    }

    // ==========================================================================
    // ADMISSION
    // ==========================================================================

    /// Admit a booking if its slot is currently free.
    ///
    /// The insert is the final arbiter: the `bookings_active_slot_key` unique
    /// index rejects a second `booked` row for the same doctor/date/slot, which
    /// is reported as `SlotUnavailable` like a failed pre-check.
    pub async fn create_booking(
        &self,
        request: CreateBookingRequest,
        auth_token: Option<&str>,
    ) -> Result<Booking, BookingError> {
        let booking = NewBooking::from_request(request)?;
        let slot = hhmm::format(&booking.time_slot);

        info!(
            "Booking slot {} on {} with doctor {} for patient {}",
            slot, booking.appointment_date, booking.doctor_id, booking.patient_id
        );

        let available = self
            .get_available_slots(
                &booking.doctor_id.to_string(),
                booking.appointment_date,
                booking.interval_minutes,
                auth_token,
            )
            .await?;

        if !available.contains(&slot) {
            warn!(
                "Rejected booking: slot {} on {} is not available for doctor {}",
                slot, booking.appointment_date, booking.doctor_id
            );
            return Err(BookingError::SlotUnavailable {
                date: booking.appointment_date,
                time_slot: slot,
            });
        }

        let booking_data = json!({
            "patient_id": booking.patient_id,
            "doctor_id": booking.doctor_id,
            "appointment_date": booking.appointment_date,
            "time_slot": slot,
            "status": BookingStatus::Booked,
            "notes": booking.notes,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                BOOKINGS_PATH,
                auth_token,
                Some(booking_data),
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(|e| slot_conflict_or(e, booking.appointment_date, &slot))?;

        let created: Booking = single_booking(result)
            .ok_or_else(|| BookingError::DatabaseError("Failed to create booking".to_string()))??;

        info!("Booking {} created for slot {} on {}", created.id, slot, created.appointment_date);
        Ok(created)
    }

    // ==========================================================================
    // READ-ONLY PROJECTIONS
    // ==========================================================================

    pub async fn get_all_bookings(&self, auth_token: Option<&str>) -> Result<Vec<Booking>, BookingError> {
        let path = format!("{}?order=appointment_date.desc,time_slot.desc", BOOKINGS_PATH);
        self.fetch_bookings(&path, auth_token).await
    }

    pub async fn get_booking_by_id(
        &self,
        booking_id: &str,
        auth_token: Option<&str>,
    ) -> Result<Booking, BookingError> {
        let booking_id = parse_id(booking_id, "booking")?;
        let path = format!("{}?id=eq.{}", BOOKINGS_PATH, booking_id);

        self.fetch_bookings(&path, auth_token)
            .await?
            .into_iter()
            .next()
            .ok_or(BookingError::NotFound)
    }

    pub async fn get_bookings_by_patient(
        &self,
        patient_id: &str,
        auth_token: Option<&str>,
    ) -> Result<Vec<Booking>, BookingError> {
        let patient_id = parse_id(patient_id, "patient")?;
        let path = format!(
            "{}?patient_id=eq.{}&order=appointment_date.desc,time_slot.desc",
            BOOKINGS_PATH, patient_id
        );
        self.fetch_bookings(&path, auth_token).await
    }

    pub async fn get_bookings_by_doctor(
        &self,
        doctor_id: &str,
        auth_token: Option<&str>,
    ) -> Result<Vec<Booking>, BookingError> {
        let doctor_id = parse_id(doctor_id, "doctor")?;
        let path = format!(
            "{}?doctor_id=eq.{}&order=appointment_date.desc,time_slot.desc",
            BOOKINGS_PATH, doctor_id
        );
        self.fetch_bookings(&path, auth_token).await
    }

    /// Open (`booked`) appointments for a doctor, soonest first.
    pub async fn get_active_bookings_by_doctor(
        &self,
        doctor_id: &str,
        auth_token: Option<&str>,
    ) -> Result<Vec<Booking>, BookingError> {
        let doctor_id = parse_id(doctor_id, "doctor")?;
        let path = format!(
            "{}?doctor_id=eq.{}&status=eq.booked&order=appointment_date.asc,time_slot.asc",
            BOOKINGS_PATH, doctor_id
        );
        self.fetch_bookings(&path, auth_token).await
    }

    pub async fn get_todays_bookings_count_by_doctor(
        &self,
        doctor_id: &str,
        auth_token: Option<&str>,
    ) -> Result<usize, BookingError> {
        self.count_for_date(doctor_id, today(), BookingStatus::Booked, auth_token).await
    }

    pub async fn get_todays_completed_count_by_doctor(
        &self,
        doctor_id: &str,
        auth_token: Option<&str>,
    ) -> Result<usize, BookingError> {
        self.count_for_date(doctor_id, today(), BookingStatus::Completed, auth_token).await
    }

    pub async fn count_for_date(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        status: BookingStatus,
        auth_token: Option<&str>,
    ) -> Result<usize, BookingError> {
        let doctor_id = parse_id(doctor_id, "doctor")?;
        let path = format!(
            "{}?doctor_id=eq.{}&appointment_date=eq.{}&status=eq.{}&select=id",
            BOOKINGS_PATH, doctor_id, date, status
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, auth_token, None).await?;
        Ok(rows.len())
    }

    // ==========================================================================
    // LIFECYCLE
    // ==========================================================================

    pub async fn cancel_booking(
        &self,
        booking_id: &str,
        reason: Option<String>,
        auth_token: Option<&str>,
    ) -> Result<Booking, BookingError> {
        let booking = self.get_booking_by_id(booking_id, auth_token).await?;
        let reason = non_blank(reason).unwrap_or_else(|| DEFAULT_CANCEL_REASON.to_string());

        let mut fields = Map::new();
        fields.insert("reason".to_string(), json!(reason));

        let cancelled = self
            .transition(booking, BookingStatus::Cancelled, fields, auth_token)
            .await?;

        info!("Booking {} cancelled: {}", cancelled.id, reason);
        Ok(cancelled)
    }

    pub async fn complete_booking_by_id(
        &self,
        booking_id: &str,
        notes: Option<String>,
        auth_token: Option<&str>,
    ) -> Result<Booking, BookingError> {
        let booking = self.get_booking_by_id(booking_id, auth_token).await?;
        self.complete(booking, notes, auth_token).await
    }

    /// Complete the patient's most recently created `booked` appointment.
    pub async fn complete_latest_booking_for_patient(
        &self,
        patient_id: &str,
        notes: Option<String>,
        auth_token: Option<&str>,
    ) -> Result<Booking, BookingError> {
        let patient_id = parse_id(patient_id, "patient")?;
        let path = format!(
            "{}?patient_id=eq.{}&status=eq.booked&order=created_at.desc&limit=1",
            BOOKINGS_PATH, patient_id
        );

        let booking = self
            .fetch_bookings(&path, auth_token)
            .await?
            .into_iter()
            .next()
            .ok_or(BookingError::NotFound)?;

        self.complete(booking, notes, auth_token).await
    }

    /// Complete by booking id, falling back to the patient's latest open booking
    /// when `id` names no booking. Callers that know which id they hold should
    /// use the explicit operations instead.
    pub async fn complete_booking(
        &self,
        id: &str,
        notes: Option<String>,
        auth_token: Option<&str>,
    ) -> Result<Booking, BookingError> {
        match self.complete_booking_by_id(id, notes.clone(), auth_token).await {
            Err(BookingError::NotFound) => {
                warn!("No booking with id {}; completing latest open booking for patient {}", id, id);
                self.complete_latest_booking_for_patient(id, notes, auth_token).await
            }
            other => other,
        }
    }

    async fn complete(
        &self,
        booking: Booking,
        notes: Option<String>,
        auth_token: Option<&str>,
    ) -> Result<Booking, BookingError> {
        let notes = non_blank(notes).unwrap_or_else(|| DEFAULT_COMPLETION_NOTES.to_string());

        let mut fields = Map::new();
        fields.insert("notes".to_string(), json!(notes));

        let completed = self
            .transition(booking, BookingStatus::Completed, fields, auth_token)
            .await?;

        info!("Booking {} completed", completed.id);
        Ok(completed)
    }

    /// Apply a guarded status change. The patch only matches while the row is
    /// still in the status we validated against.
    async fn transition(
        &self,
        booking: Booking,
        target: BookingStatus,
        mut fields: Map<String, Value>,
        auth_token: Option<&str>,
    ) -> Result<Booking, BookingError> {
        self.lifecycle_service
            .validate_status_transition(&booking.status, &target)?;

        fields.insert("status".to_string(), json!(target));
        fields.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!(
            "{}?id=eq.{}&status=eq.{}",
            BOOKINGS_PATH, booking.id, booking.status
        );
        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                auth_token,
                Some(Value::Object(fields)),
                Some(SupabaseClient::representation_headers()),
            )
            .await?;

        match single_booking(result) {
            Some(updated) => Ok(updated?),
            None => {
                // Lost a race: report what the row looks like now.
                let current = self.get_booking_by_id(&booking.id.to_string(), auth_token).await?;
                warn!(
                    "Booking {} moved to {} before it could become {}",
                    current.id, current.status, target
                );
                Err(BookingError::InvalidStatusTransition(current.status))
            }
        }
    }

    // ==========================================================================
    // GENERIC UPDATE / DELETE
    // ==========================================================================

    /// Partial update of date, slot, notes or reason. Status is only changed
    /// through the lifecycle operations.
    pub async fn update_booking(
        &self,
        booking_id: &str,
        patch: UpdateBookingRequest,
        auth_token: Option<&str>,
    ) -> Result<Booking, BookingError> {
        let booking = self.get_booking_by_id(booking_id, auth_token).await?;
        debug!("Updating booking {}", booking.id);

        if patch.is_empty() {
            return Ok(booking);
        }

        let new_date = patch
            .appointment_date
            .as_deref()
            .map(|raw| parse_date(raw, "appointment_date"))
            .transpose()?;
        let new_slot = patch.time_slot.as_deref().map(parse_slot).transpose()?;

        let target_date = new_date.unwrap_or(booking.appointment_date);
        let target_slot = hhmm::format(&new_slot.unwrap_or(booking.time_slot));
        let moves = target_date != booking.appointment_date || target_slot != booking.slot_label();

        if moves && booking.status == BookingStatus::Booked {
            let available = self
                .get_available_slots(
                    &booking.doctor_id.to_string(),
                    target_date,
                    patch.interval_minutes,
                    auth_token,
                )
                .await?;
            if !available.contains(&target_slot) {
                warn!(
                    "Rejected move of booking {} to {} {}: slot not available",
                    booking.id, target_date, target_slot
                );
                return Err(BookingError::SlotUnavailable {
                    date: target_date,
                    time_slot: target_slot,
                });
            }
        }

        let mut update_data = Map::new();
        if new_date.is_some() {
            update_data.insert("appointment_date".to_string(), json!(target_date));
        }
        if new_slot.is_some() {
            update_data.insert("time_slot".to_string(), json!(target_slot));
        }
        if let Some(notes) = patch.notes {
            update_data.insert("notes".to_string(), json!(notes));
        }
        if let Some(reason) = patch.reason {
            update_data.insert("reason".to_string(), json!(reason));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("{}?id=eq.{}", BOOKINGS_PATH, booking.id);
        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                auth_token,
                Some(Value::Object(update_data)),
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(|e| slot_conflict_or(e, target_date, &target_slot))?;

        single_booking(result).ok_or(BookingError::NotFound)?
    }

    pub async fn delete_booking(
        &self,
        booking_id: &str,
        auth_token: Option<&str>,
    ) -> Result<(), BookingError> {
        let booking_id = parse_id(booking_id, "booking")?;
        let path = format!("{}?id=eq.{}", BOOKINGS_PATH, booking_id);

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                auth_token,
                None,
                Some(SupabaseClient::representation_headers()),
            )
            .await?;

        if result.is_empty() {
            return Err(BookingError::NotFound);
        }

        info!("Booking {} deleted", booking_id);
        Ok(())
    }

    async fn fetch_bookings(
        &self,
        path: &str,
        auth_token: Option<&str>,
    ) -> Result<Vec<Booking>, BookingError> {
        let rows: Vec<Value> = self.supabase.request(Method::GET, path, auth_token, None).await?;

        let bookings = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Booking>, _>>()?;

        Ok(bookings)
    }
}

// ==============================================================================
// HELPERS
// ==============================================================================

/// The server's local calendar date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, BookingError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| BookingError::ValidationError(format!("Invalid {} id: {}", what, raw)))
}

pub fn parse_date(raw: &str, field: &str) -> Result<NaiveDate, BookingError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        BookingError::ValidationError(format!("{} must be YYYY-MM-DD, got '{}'", field, raw))
    })
}

fn parse_slot(raw: &str) -> Result<NaiveTime, BookingError> {
    hhmm::parse(raw)
        .map_err(|_| BookingError::ValidationError(format!("time_slot must be HH:MM, got '{}'", raw)))
}

fn required(value: Option<String>, field: &str) -> Result<String, BookingError> {
    non_blank(value).ok_or_else(|| BookingError::ValidationError(format!("{} is required", field)))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn single_booking(rows: Vec<Value>) -> Option<Result<Booking, BookingError>> {
    rows.into_iter()
        .next()
        .map(|row| serde_json::from_value(row).map_err(BookingError::from))
}

fn slot_conflict_or(err: DatabaseError, date: NaiveDate, slot: &str) -> BookingError {
    if err.is_unique_violation() {
        warn!("Slot {} on {} was taken concurrently", slot, date);
        BookingError::SlotUnavailable {
            date,
            time_slot: slot.to_string(),
        }
    } else {
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn request(patient: &str, doctor: &str, date: &str, slot: &str) -> CreateBookingRequest {
        CreateBookingRequest {
            patient_id: Some(patient.to_string()),
            doctor_id: Some(doctor.to_string()),
            appointment_date: Some(date.to_string()),
            time_slot: Some(slot.to_string()),
            notes: None,
            interval_minutes: None,
        }
    }

    #[test]
    fn every_required_field_is_checked() {
        let patient = Uuid::new_v4().to_string();
        let doctor = Uuid::new_v4().to_string();

        let mut missing_patient = request(&patient, &doctor, "2024-06-03", "09:00");
        missing_patient.patient_id = None;
        assert_matches!(
            NewBooking::from_request(missing_patient),
            Err(BookingError::ValidationError(msg)) if msg.contains("patient_id")
        );

        let mut blank_slot = request(&patient, &doctor, "2024-06-03", "09:00");
        blank_slot.time_slot = Some("  ".to_string());
        assert_matches!(
            NewBooking::from_request(blank_slot),
            Err(BookingError::ValidationError(msg)) if msg.contains("time_slot")
        );

        let mut missing_date = request(&patient, &doctor, "2024-06-03", "09:00");
        missing_date.appointment_date = None;
        assert_matches!(
            NewBooking::from_request(missing_date),
            Err(BookingError::ValidationError(msg)) if msg.contains("appointment_date")
        );
    }

    #[test]
    fn malformed_values_are_validation_errors() {
        let doctor = Uuid::new_v4().to_string();
        assert_matches!(
            NewBooking::from_request(request("p-1", &doctor, "2024-06-03", "09:00")),
            Err(BookingError::ValidationError(_))
        );
        let patient = Uuid::new_v4().to_string();
        assert_matches!(
            NewBooking::from_request(request(&patient, &doctor, "03/06/2024", "09:00")),
            Err(BookingError::ValidationError(_))
        );
        assert_matches!(
            NewBooking::from_request(request(&patient, &doctor, "2024-06-03", "9am")),
            Err(BookingError::ValidationError(_))
        );
    }

    #[test]
    fn valid_request_parses() {
        let patient = Uuid::new_v4();
        let doctor = Uuid::new_v4();
        let booking = NewBooking::from_request(request(
            &patient.to_string(),
            &doctor.to_string(),
            "2024-06-03",
            "09:20",
        ))
        .unwrap();

        assert_eq!(booking.patient_id, patient);
        assert_eq!(booking.doctor_id, doctor);
        assert_eq!(hhmm::format(&booking.time_slot), "09:20");
        assert!(booking.notes.is_none());
    }

    #[test]
    fn unique_violation_becomes_slot_unavailable() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        assert_matches!(
            slot_conflict_or(DatabaseError::UniqueViolation("dup".into()), date, "09:00"),
            BookingError::SlotUnavailable { time_slot, .. } if time_slot == "09:00"
        );
        assert_matches!(
            slot_conflict_or(DatabaseError::NotFound("x".into()), date, "09:00"),
            BookingError::DatabaseError(_)
        );
    }
}
