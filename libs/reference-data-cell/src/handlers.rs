use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{CreateEntryRequest, ReferenceDataError, ReferenceKind, UpdateEntryRequest};
use crate::services::ReferenceDataService;

fn reference_error_to_app_error(err: ReferenceDataError) -> AppError {
    match err {
        ReferenceDataError::NotFound(_) => AppError::NotFound(err.to_string()),
        ReferenceDataError::Duplicate { .. } => AppError::Conflict(err.to_string()),
        ReferenceDataError::ValidationError(msg) => AppError::ValidationError(msg),
        ReferenceDataError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn list_entries(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(kind): Path<ReferenceKind>,
) -> Result<Json<Value>, AppError> {
    let service = ReferenceDataService::new(&state);

    let entries = service
        .list_entries(kind, Some(auth.token()))
        .await
        .map_err(reference_error_to_app_error)?;

    Ok(Json(json!({
        "kind": kind,
        "entries": entries,
        "total": entries.len()
    })))
}

#[axum::debug_handler]
pub async fn create_entry(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(kind): Path<ReferenceKind>,
    Json(request): Json<CreateEntryRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = ReferenceDataService::new(&state);

    let entry = service
        .create_entry(kind, request, Some(auth.token()))
        .await
        .map_err(reference_error_to_app_error)?;

    Ok((StatusCode::CREATED, Json(json!(entry))))
}

#[axum::debug_handler]
pub async fn update_entry(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path((kind, entry_id)): Path<(ReferenceKind, String)>,
    Json(request): Json<UpdateEntryRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ReferenceDataService::new(&state);

    let entry = service
        .update_entry(kind, &entry_id, request, Some(auth.token()))
        .await
        .map_err(reference_error_to_app_error)?;

    Ok(Json(json!(entry)))
}

#[axum::debug_handler]
pub async fn delete_entry(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path((kind, entry_id)): Path<(ReferenceKind, String)>,
) -> Result<StatusCode, AppError> {
    let service = ReferenceDataService::new(&state);

    service
        .delete_entry(kind, &entry_id, Some(auth.token()))
        .await
        .map_err(reference_error_to_app_error)?;

    Ok(StatusCode::NO_CONTENT)
}
