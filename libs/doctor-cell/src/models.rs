use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::DatabaseError;

// ==============================================================================
// DOCTOR RECORDS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub specialization: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub available_slots: Vec<WeeklyWindow>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Doctor {
    /// First weekly window registered for `day`. Later duplicates are ignored.
    pub fn window_for(&self, day: WeekdayName) -> Option<&WeeklyWindow> {
        self.available_slots.iter().find(|window| window.day == day)
    }
}

/// Day names as stored on the doctor record ("Monday" ... "Sunday").
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WeekdayName {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<Weekday> for WeekdayName {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => WeekdayName::Monday,
            Weekday::Tue => WeekdayName::Tuesday,
            Weekday::Wed => WeekdayName::Wednesday,
            Weekday::Thu => WeekdayName::Thursday,
            Weekday::Fri => WeekdayName::Friday,
            Weekday::Sat => WeekdayName::Saturday,
            Weekday::Sun => WeekdayName::Sunday,
        }
    }
}

impl fmt::Display for WeekdayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WeekdayName::Monday => "Monday",
            WeekdayName::Tuesday => "Tuesday",
            WeekdayName::Wednesday => "Wednesday",
            WeekdayName::Thursday => "Thursday",
            WeekdayName::Friday => "Friday",
            WeekdayName::Saturday => "Saturday",
            WeekdayName::Sunday => "Sunday",
        };
        write!(f, "{}", name)
    }
}

/// Recurring working hours for one weekday.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeeklyWindow {
    pub day: WeekdayName,
    #[serde(with = "shared_utils::hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "shared_utils::hhmm")]
    pub end_time: NaiveTime,
}

impl WeeklyWindow {
    pub fn working_window(&self) -> WorkingWindow {
        WorkingWindow {
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

/// Working hours resolved for a concrete date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WorkingWindow {
    #[serde(with = "shared_utils::hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "shared_utils::hhmm")]
    pub end_time: NaiveTime,
}

// ==============================================================================
// REQUEST / RESPONSE DTOS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDoctorRequest {
    pub name: String,
    pub specialization: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub available_slots: Vec<WeeklyWindow>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDoctorRequest {
    pub name: Option<String>,
    pub specialization: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub available_slots: Option<Vec<WeeklyWindow>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorAvailabilityResponse {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub day: WeekdayName,
    /// `None` when the doctor holds no clinic that day.
    pub window: Option<WorkingWindow>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DatabaseError> for DoctorError {
    fn from(err: DatabaseError) -> Self {
        DoctorError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DoctorError {
    fn from(err: serde_json::Error) -> Self {
        DoctorError::DatabaseError(format!("Malformed doctor record: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn weekday_names_round_trip_through_json() {
        let window: WeeklyWindow = serde_json::from_value(json!({
            "day": "Wednesday",
            "start_time": "09:00",
            "end_time": "13:30"
        }))
        .unwrap();

        assert_eq!(window.day, WeekdayName::Wednesday);
        assert_eq!(window.end_time, NaiveTime::from_hms_opt(13, 30, 0).unwrap());
        assert_eq!(serde_json::to_value(&window).unwrap()["day"], "Wednesday");
    }

    #[test]
    fn first_window_for_a_day_wins() {
        let doctor: Doctor = serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "name": "Dr. Mehta",
            "specialization": null,
            "phone": null,
            "email": null,
            "available_slots": [
                {"day": "Monday", "start_time": "09:00", "end_time": "12:00"},
                {"day": "Monday", "start_time": "14:00", "end_time": "18:00"}
            ],
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        let window = doctor.window_for(WeekdayName::Monday).unwrap();
        assert_eq!(window.start_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert!(doctor.window_for(WeekdayName::Tuesday).is_none());
    }

    #[test]
    fn chrono_weekday_maps_to_name() {
        assert_eq!(WeekdayName::from(Weekday::Sun), WeekdayName::Sunday);
        assert_eq!(WeekdayName::from(Weekday::Thu).to_string(), "Thursday");
    }
}
