use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use chrono::{Datelike, NaiveDate};
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    CreateDoctorRequest, DoctorAvailabilityResponse, DoctorError, UpdateDoctorRequest, WeekdayName,
};
use crate::services::{
    availability::AvailabilityService,
    doctor::{parse_doctor_id, DoctorService},
};

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
}

pub fn doctor_error_to_app_error(err: DoctorError) -> AppError {
    match err {
        DoctorError::NotFound => AppError::NotFound(err.to_string()),
        DoctorError::ValidationError(msg) => AppError::ValidationError(msg),
        DoctorError::DatabaseError(msg) => AppError::Database(msg),
    }
}

fn require_admin(user: &User, action: &str) -> Result<(), AppError> {
    if !user.has_role("admin") {
        return Err(AppError::Auth(format!("Only administrators can {}", action)));
    }
    Ok(())
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_doctor_availability(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let availability_service = AvailabilityService::new(&state);

    let window = availability_service
        .availability_for(&doctor_id, query.date, None)
        .await
        .map_err(doctor_error_to_app_error)?;

    let response = DoctorAvailabilityResponse {
        doctor_id: parse_doctor_id(&doctor_id).map_err(doctor_error_to_app_error)?,
        date: query.date,
        day: WeekdayName::from(query.date.weekday()),
        window,
    };

    Ok(Json(json!(response)))
}

// ==============================================================================
// PROTECTED HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(&state);

    let doctors = doctor_service
        .list_doctors(Some(auth.token()))
        .await
        .map_err(doctor_error_to_app_error)?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(&state);

    let doctor = doctor_service
        .get_doctor(&doctor_id, Some(auth.token()))
        .await
        .map_err(doctor_error_to_app_error)?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_admin(&user, "create doctor profiles")?;

    let doctor_service = DoctorService::new(&state);

    let doctor = doctor_service
        .create_doctor(request, Some(auth.token()))
        .await
        .map_err(doctor_error_to_app_error)?;

    Ok((StatusCode::CREATED, Json(json!(doctor))))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<String>,
    Json(request): Json<UpdateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user, "update doctor profiles")?;

    let doctor_service = DoctorService::new(&state);

    let doctor = doctor_service
        .update_doctor(&doctor_id, request, Some(auth.token()))
        .await
        .map_err(doctor_error_to_app_error)?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn delete_doctor(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<String>,
) -> Result<StatusCode, AppError> {
    require_admin(&user, "delete doctor profiles")?;

    let doctor_service = DoctorService::new(&state);

    doctor_service
        .delete_doctor(&doctor_id, Some(auth.token()))
        .await
        .map_err(doctor_error_to_app_error)?;

    Ok(StatusCode::NO_CONTENT)
}
