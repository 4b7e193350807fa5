use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use tracing::debug;

use shared_config::AppConfig;

use crate::models::{DoctorError, WeekdayName, WorkingWindow};
use crate::services::doctor::DoctorService;

pub const MIN_SLOT_INTERVAL_MINUTES: f64 = 1.0;
pub const MAX_SLOT_INTERVAL_MINUTES: f64 = 24.0 * 60.0;

/// Candidate slot start times from `start`, stepping by `interval`, strictly before `end`.
///
/// Slots never wrap past midnight. A non-positive interval yields nothing.
pub fn generate_slots(start: NaiveTime, end: NaiveTime, interval: Duration) -> Vec<NaiveTime> {
    let mut slots = Vec::new();
    if interval <= Duration::zero() {
        return slots;
    }

    let mut current = start;
    while current < end {
        slots.push(current);
        let (next, overflow_secs) = current.overflowing_add_signed(interval);
        if overflow_secs != 0 {
            break;
        }
        current = next;
    }

    slots
}

/// Slot spacing from a (possibly fractional) number of minutes.
pub fn interval_from_minutes(minutes: f64) -> Result<Duration, DoctorError> {
    if !minutes.is_finite()
        || minutes < MIN_SLOT_INTERVAL_MINUTES
        || minutes > MAX_SLOT_INTERVAL_MINUTES
    {
        return Err(DoctorError::ValidationError(format!(
            "Slot interval must be between {} and {} minutes, got {}",
            MIN_SLOT_INTERVAL_MINUTES, MAX_SLOT_INTERVAL_MINUTES, minutes
        )));
    }

    Ok(Duration::milliseconds((minutes * 60_000.0).round() as i64))
}

pub struct AvailabilityService {
    doctor_service: DoctorService,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            doctor_service: DoctorService::new(config),
        }
    }

    /// Working window for the doctor on `date`, or `None` when there is no clinic that day.
    pub async fn availability_for(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Option<WorkingWindow>, DoctorError> {
        let doctor = self.doctor_service.get_doctor(doctor_id, auth_token).await?;
        let day = WeekdayName::from(date.weekday());

        let window = doctor.window_for(day).map(|w| w.working_window());
        match &window {
            Some(w) => debug!(
                "Doctor {} works {} {}-{} on {}",
                doctor_id, day, w.start_time, w.end_time, date
            ),
            None => debug!("Doctor {} has no clinic on {} ({})", doctor_id, date, day),
        }

        Ok(window)
    }
}
