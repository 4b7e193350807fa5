use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{CreateDoctorRequest, Doctor, DoctorError, UpdateDoctorRequest, WeeklyWindow};

pub struct DoctorService {
    supabase: SupabaseClient,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_doctor(
        &self,
        request: CreateDoctorRequest,
        auth_token: Option<&str>,
    ) -> Result<Doctor, DoctorError> {
        debug!("Creating doctor profile for: {}", request.name);

        if request.name.trim().is_empty() {
            return Err(DoctorError::ValidationError("Doctor name is required".to_string()));
        }
        validate_windows(&request.available_slots)?;

        let doctor_data = json!({
            "name": request.name.trim(),
            "specialization": request.specialization,
            "phone": request.phone,
            "email": request.email,
            "available_slots": request.available_slots,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/doctors",
            auth_token,
            Some(doctor_data),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        let row = first_row(result)
            .ok_or_else(|| DoctorError::DatabaseError("Failed to create doctor profile".to_string()))?;
        let doctor: Doctor = serde_json::from_value(row)?;

        info!("Doctor profile created with ID: {}", doctor.id);
        Ok(doctor)
    }

    pub async fn get_doctor(
        &self,
        doctor_id: &str,
        auth_token: Option<&str>,
    ) -> Result<Doctor, DoctorError> {
        let doctor_id = parse_doctor_id(doctor_id)?;
        debug!("Fetching doctor profile: {}", doctor_id);

        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            auth_token,
            None,
        ).await?;

        let row = first_row(result).ok_or(DoctorError::NotFound)?;
        Ok(serde_json::from_value(row)?)
    }

    pub async fn list_doctors(&self, auth_token: Option<&str>) -> Result<Vec<Doctor>, DoctorError> {
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            "/rest/v1/doctors?order=name.asc",
            auth_token,
            None,
        ).await?;

        let doctors = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Doctor>, _>>()?;

        Ok(doctors)
    }

    pub async fn update_doctor(
        &self,
        doctor_id: &str,
        request: UpdateDoctorRequest,
        auth_token: Option<&str>,
    ) -> Result<Doctor, DoctorError> {
        let doctor_id = parse_doctor_id(doctor_id)?;
        debug!("Updating doctor profile: {}", doctor_id);

        let mut update_data = serde_json::Map::new();

        if let Some(name) = request.name {
            if name.trim().is_empty() {
                return Err(DoctorError::ValidationError("Doctor name cannot be blank".to_string()));
            }
            update_data.insert("name".to_string(), json!(name.trim()));
        }
        if let Some(specialization) = request.specialization {
            update_data.insert("specialization".to_string(), json!(specialization));
        }
        if let Some(phone) = request.phone {
            update_data.insert("phone".to_string(), json!(phone));
        }
        if let Some(email) = request.email {
            update_data.insert("email".to_string(), json!(email));
        }
        if let Some(windows) = request.available_slots {
            validate_windows(&windows)?;
            update_data.insert("available_slots".to_string(), json!(windows));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            auth_token,
            Some(Value::Object(update_data)),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        let row = first_row(result).ok_or(DoctorError::NotFound)?;
        Ok(serde_json::from_value(row)?)
    }

    pub async fn delete_doctor(
        &self,
        doctor_id: &str,
        auth_token: Option<&str>,
    ) -> Result<(), DoctorError> {
        let doctor_id = parse_doctor_id(doctor_id)?;
        debug!("Deleting doctor profile: {}", doctor_id);

        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::DELETE,
            &path,
            auth_token,
            None,
            Some(SupabaseClient::representation_headers()),
        ).await?;

        if result.is_empty() {
            return Err(DoctorError::NotFound);
        }

        info!("Doctor profile deleted: {}", doctor_id);
        Ok(())
    }
}

pub fn parse_doctor_id(raw: &str) -> Result<Uuid, DoctorError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| DoctorError::ValidationError(format!("Invalid doctor id: {}", raw)))
}

fn validate_windows(windows: &[WeeklyWindow]) -> Result<(), DoctorError> {
    for window in windows {
        if window.start_time >= window.end_time {
            return Err(DoctorError::ValidationError(format!(
                "{} window must start before it ends",
                window.day
            )));
        }
    }
    Ok(())
}

fn first_row(rows: Vec<Value>) -> Option<Value> {
    rows.into_iter().next()
}
