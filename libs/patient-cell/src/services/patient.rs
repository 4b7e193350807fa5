use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;
use chrono::Utc;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{CreatePatientRequest, Patient, PatientError, PatientSearchQuery, UpdatePatientRequest};

const DEFAULT_PAGE_SIZE: i32 = 50;

pub struct PatientService {
    supabase: SupabaseClient,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_patient(
        &self,
        request: CreatePatientRequest,
        auth_token: Option<&str>,
    ) -> Result<Patient, PatientError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(PatientError::ValidationError("Patient name is required".to_string()));
        }
        debug!("Creating patient record for: {}", name);

        let patient_data = json!({
            "name": name,
            "age": request.age,
            "gender": request.gender,
            "phone": request.phone,
            "address": request.address,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/patients",
            auth_token,
            Some(patient_data),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| PatientError::DatabaseError("Failed to create patient record".to_string()))?;
        let patient: Patient = serde_json::from_value(row)?;

        info!("Patient record created with ID: {}", patient.id);
        Ok(patient)
    }

    pub async fn get_patient(
        &self,
        patient_id: &str,
        auth_token: Option<&str>,
    ) -> Result<Patient, PatientError> {
        let patient_id = parse_patient_id(patient_id)?;
        debug!("Fetching patient record: {}", patient_id);

        let path = format!("/rest/v1/patients?id=eq.{}", patient_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            auth_token,
            None,
        ).await?;

        let row = result.into_iter().next().ok_or(PatientError::NotFound)?;
        Ok(serde_json::from_value(row)?)
    }

    pub async fn list_patients(&self, auth_token: Option<&str>) -> Result<Vec<Patient>, PatientError> {
        self.search_patients(PatientSearchQuery::default(), auth_token).await
    }

    /// Case-insensitive match of `q` against name or phone, newest first.
    pub async fn search_patients(
        &self,
        query: PatientSearchQuery,
        auth_token: Option<&str>,
    ) -> Result<Vec<Patient>, PatientError> {
        debug!("Searching patients with query: {:?}", query);

        let mut query_parts = vec!["order=created_at.desc".to_string()];

        if let Some(term) = query.q.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let term = urlencoding::encode(term);
            query_parts.push(format!("or=(name.ilike.*{}*,phone.ilike.*{}*)", term, term));
        }

        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        let offset = query.offset.unwrap_or(0);
        if limit <= 0 || offset < 0 {
            return Err(PatientError::ValidationError(
                "limit must be positive and offset non-negative".to_string(),
            ));
        }
        query_parts.push(format!("limit={}", limit));
        query_parts.push(format!("offset={}", offset));

        let path = format!("/rest/v1/patients?{}", query_parts.join("&"));
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            auth_token,
            None,
        ).await?;

        let patients = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Patient>, _>>()?;

        Ok(patients)
    }

    pub async fn update_patient(
        &self,
        patient_id: &str,
        request: UpdatePatientRequest,
        auth_token: Option<&str>,
    ) -> Result<Patient, PatientError> {
        let patient_id = parse_patient_id(patient_id)?;
        debug!("Updating patient record: {}", patient_id);

        let mut update_data = serde_json::Map::new();

        if let Some(name) = request.name {
            if name.trim().is_empty() {
                return Err(PatientError::ValidationError("Patient name cannot be blank".to_string()));
            }
            update_data.insert("name".to_string(), json!(name.trim()));
        }
        if let Some(age) = request.age {
            update_data.insert("age".to_string(), json!(age));
        }
        if let Some(gender) = request.gender {
            update_data.insert("gender".to_string(), json!(gender));
        }
        if let Some(phone) = request.phone {
            update_data.insert("phone".to_string(), json!(phone));
        }
        if let Some(address) = request.address {
            update_data.insert("address".to_string(), json!(address));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/patients?id=eq.{}", patient_id);
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            auth_token,
            Some(Value::Object(update_data)),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        let row = result.into_iter().next().ok_or(PatientError::NotFound)?;
        Ok(serde_json::from_value(row)?)
    }

    pub async fn delete_patient(
        &self,
        patient_id: &str,
        auth_token: Option<&str>,
    ) -> Result<(), PatientError> {
        let patient_id = parse_patient_id(patient_id)?;

        let path = format!("/rest/v1/patients?id=eq.{}", patient_id);
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::DELETE,
            &path,
            auth_token,
            None,
            Some(SupabaseClient::representation_headers()),
        ).await?;

        if result.is_empty() {
            return Err(PatientError::NotFound);
        }

        info!("Patient record deleted: {}", patient_id);
        Ok(())
    }
}

fn parse_patient_id(raw: &str) -> Result<Uuid, PatientError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| PatientError::ValidationError(format!("Invalid patient id: {}", raw)))
}
