// libs/booking-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    AvailableSlotsResponse, BookingCountResponse, BookingError, BookingStatus,
    CancelBookingRequest, CompleteBookingRequest, CreateBookingRequest, UpdateBookingRequest,
};
use crate::services::booking::{parse_date, parse_id, today, BookingService};

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct AvailableSlotsQuery {
    pub doctor_id: String,
    pub date: String,
    pub interval_minutes: Option<f64>,
}

pub fn booking_error_to_app_error(err: BookingError) -> AppError {
    match err {
        BookingError::NotFound | BookingError::DoctorNotFound => AppError::NotFound(err.to_string()),
        BookingError::ValidationError(msg) => AppError::ValidationError(msg),
        BookingError::SlotUnavailable { .. } | BookingError::InvalidStatusTransition(_) => {
            AppError::Conflict(err.to_string())
        }
        BookingError::DatabaseError(msg) => AppError::Database(msg),
    }
}

fn require_any_role(user: &User, roles: &[&str], action: &str) -> Result<(), AppError> {
    if !roles.iter().any(|role| user.has_role(role)) {
        return Err(AppError::Auth(format!("Not authorized to {}", action)));
    }
    Ok(())
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<AvailableSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let date = parse_date(&query.date, "date").map_err(booking_error_to_app_error)?;
    let booking_service = BookingService::new(&state);

    let slots = booking_service
        .get_available_slots(&query.doctor_id, date, query.interval_minutes, None)
        .await
        .map_err(booking_error_to_app_error)?;

    let response = AvailableSlotsResponse {
        doctor_id: parse_id(&query.doctor_id, "doctor").map_err(booking_error_to_app_error)?,
        date,
        total_slots: slots.len(),
        slots,
    };

    Ok(Json(json!(response)))
}

// ==============================================================================
// BOOKING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_booking(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let booking_service = BookingService::new(&state);

    let booking = booking_service
        .create_booking(request, Some(auth.token()))
        .await
        .map_err(booking_error_to_app_error)?;

    Ok((StatusCode::CREATED, Json(json!(booking))))
}

#[axum::debug_handler]
pub async fn list_bookings(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let bookings = booking_service
        .get_all_bookings(Some(auth.token()))
        .await
        .map_err(booking_error_to_app_error)?;

    Ok(Json(json!({
        "bookings": bookings,
        "total": bookings.len()
    })))
}

#[axum::debug_handler]
pub async fn get_booking(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(booking_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let booking = booking_service
        .get_booking_by_id(&booking_id, Some(auth.token()))
        .await
        .map_err(booking_error_to_app_error)?;

    Ok(Json(json!(booking)))
}

#[axum::debug_handler]
pub async fn update_booking(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(booking_id): Path<String>,
    Json(request): Json<UpdateBookingRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let booking = booking_service
        .update_booking(&booking_id, request, Some(auth.token()))
        .await
        .map_err(booking_error_to_app_error)?;

    Ok(Json(json!(booking)))
}

#[axum::debug_handler]
pub async fn delete_booking(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(booking_id): Path<String>,
) -> Result<StatusCode, AppError> {
    require_any_role(&user, &["admin"], "delete bookings")?;

    let booking_service = BookingService::new(&state);

    booking_service
        .delete_booking(&booking_id, Some(auth.token()))
        .await
        .map_err(booking_error_to_app_error)?;

    Ok(StatusCode::NO_CONTENT)
}

// ==============================================================================
// LIFECYCLE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn cancel_booking(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(booking_id): Path<String>,
    request: Option<Json<CancelBookingRequest>>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);
    let reason = request.and_then(|Json(body)| body.reason);

    let booking = booking_service
        .cancel_booking(&booking_id, reason, Some(auth.token()))
        .await
        .map_err(booking_error_to_app_error)?;

    Ok(Json(json!(booking)))
}

/// Accepts either a booking id or a patient id in the path.
#[axum::debug_handler]
pub async fn complete_booking(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
    request: Option<Json<CompleteBookingRequest>>,
) -> Result<Json<Value>, AppError> {
    require_any_role(&user, &["doctor", "admin"], "complete consultations")?;

    let booking_service = BookingService::new(&state);
    let notes = request.and_then(|Json(body)| body.notes);

    let booking = booking_service
        .complete_booking(&id, notes, Some(auth.token()))
        .await
        .map_err(booking_error_to_app_error)?;

    Ok(Json(json!(booking)))
}

#[axum::debug_handler]
pub async fn complete_latest_for_patient(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<String>,
    request: Option<Json<CompleteBookingRequest>>,
) -> Result<Json<Value>, AppError> {
    require_any_role(&user, &["doctor", "admin"], "complete consultations")?;

    let booking_service = BookingService::new(&state);
    let notes = request.and_then(|Json(body)| body.notes);

    let booking = booking_service
        .complete_latest_booking_for_patient(&patient_id, notes, Some(auth.token()))
        .await
        .map_err(booking_error_to_app_error)?;

    Ok(Json(json!(booking)))
}

// ==============================================================================
// PATIENT / DOCTOR VIEWS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_patient_bookings(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let bookings = booking_service
        .get_bookings_by_patient(&patient_id, Some(auth.token()))
        .await
        .map_err(booking_error_to_app_error)?;

    Ok(Json(json!({
        "bookings": bookings,
        "total": bookings.len()
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_bookings(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let bookings = booking_service
        .get_bookings_by_doctor(&doctor_id, Some(auth.token()))
        .await
        .map_err(booking_error_to_app_error)?;

    Ok(Json(json!({
        "bookings": bookings,
        "total": bookings.len()
    })))
}

#[axum::debug_handler]
pub async fn get_active_doctor_bookings(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let bookings = booking_service
        .get_active_bookings_by_doctor(&doctor_id, Some(auth.token()))
        .await
        .map_err(booking_error_to_app_error)?;

    Ok(Json(json!({
        "bookings": bookings,
        "total": bookings.len()
    })))
}

#[axum::debug_handler]
pub async fn get_todays_booked_count(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    todays_count(&state, auth.token(), &doctor_id, BookingStatus::Booked).await
}

#[axum::debug_handler]
pub async fn get_todays_completed_count(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    todays_count(&state, auth.token(), &doctor_id, BookingStatus::Completed).await
}

async fn todays_count(
    config: &AppConfig,
    token: &str,
    doctor_id: &str,
    status: BookingStatus,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(config);

    let count = match status {
        BookingStatus::Completed => {
            booking_service
                .get_todays_completed_count_by_doctor(doctor_id, Some(token))
                .await
        }
        _ => {
            booking_service
                .get_todays_bookings_count_by_doctor(doctor_id, Some(token))
                .await
        }
    }
    .map_err(booking_error_to_app_error)?;

    let response = BookingCountResponse {
        doctor_id: parse_id(doctor_id, "doctor").map_err(booking_error_to_app_error)?,
        date: today(),
        status,
        count,
    };

    Ok(Json(json!(response)))
}
