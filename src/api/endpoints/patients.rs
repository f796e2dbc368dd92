//! Patient CRUD handlers.
//!
//! Each handler: parse → validate → open one connection → repository →
//! envelope. Repository `NotFound` renders as 404; any other storage
//! failure logs the detail and renders the operation-specific 500
//! message, never the internal error text.

use axum::body::Bytes;
use axum::extract::{Path, State};
use serde_json::{Map, Value};

use crate::api::error::ApiError;
use crate::api::response::ApiResponse;
use crate::api::types::ApiContext;
use crate::api::validation;
use crate::db::{repository, DatabaseError};
use crate::models::Patient;

const PATIENT_NOT_FOUND: &str = "Patient not found";

/// `GET /api/patients` — all patients, newest first.
pub async fn list(State(ctx): State<ApiContext>) -> Result<ApiResponse, ApiError> {
    let conn = ctx.open_db()?;
    let patients = repository::list_patients(&conn)
        .map_err(|e| storage_failure(e, "Failed to retrieve patients"))?;

    let data = serde_json::to_value(&patients)
        .map_err(|e| serialize_failure(e, "Failed to retrieve patients"))?;
    Ok(ApiResponse::success(
        "Patients retrieved successfully",
        Some(data),
    ))
}

/// `GET /api/patients/:id` — a single patient.
pub async fn show(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<ApiResponse, ApiError> {
    let id = parse_patient_id(&id)?;
    let conn = ctx.open_db()?;

    let patient = repository::get_patient(&conn, id)
        .map_err(|e| storage_failure(e, "Failed to retrieve patient"))?
        .ok_or_else(|| ApiError::NotFound(PATIENT_NOT_FOUND.into()))?;

    Ok(ApiResponse::success(
        "Patient retrieved successfully",
        Some(patient_data(&patient)?),
    ))
}

/// `POST /api/patients` — create, then re-fetch the stored row so the
/// response carries the generated id and timestamp.
pub async fn create(
    State(ctx): State<ApiContext>,
    body: Bytes,
) -> Result<ApiResponse, ApiError> {
    let input = parse_json_object(&body)?;
    let new_patient = validation::validate_create(&input)?;

    let conn = ctx.open_db()?;
    let id = repository::insert_patient(&conn, &new_patient)
        .map_err(|e| storage_failure(e, "Failed to create patient"))?;

    let patient = repository::get_patient(&conn, id)
        .map_err(|e| storage_failure(e, "Failed to create patient"))?
        .ok_or_else(|| ApiError::Internal("Failed to create patient".into()))?;

    Ok(ApiResponse::created(
        "Patient created successfully",
        Some(patient_data(&patient)?),
    ))
}

/// `PUT /api/patients/:id` — full replace; all four fields required.
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<ApiResponse, ApiError> {
    let id = parse_patient_id(&id)?;
    let input = parse_json_object(&body)?;
    let fields = validation::validate_create(&input)?;

    let conn = ctx.open_db()?;
    match repository::update_patient(&conn, id, &fields) {
        Ok(()) => {}
        Err(DatabaseError::NotFound { .. }) => {
            return Err(ApiError::NotFound(PATIENT_NOT_FOUND.into()))
        }
        Err(e) => return Err(storage_failure(e, "Failed to update patient")),
    }

    updated_response(&conn, id)
}

/// `PATCH /api/patients/:id` — write only the supplied fields.
pub async fn patch(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<ApiResponse, ApiError> {
    let id = parse_patient_id(&id)?;
    let input = parse_json_object(&body)?;
    let fields = validation::validate_patch(&input)?;

    let conn = ctx.open_db()?;
    match repository::update_patient_partial(&conn, id, &fields) {
        Ok(()) => {}
        Err(DatabaseError::NotFound { .. }) => {
            return Err(ApiError::NotFound(PATIENT_NOT_FOUND.into()))
        }
        Err(e) => return Err(storage_failure(e, "Failed to update patient")),
    }

    updated_response(&conn, id)
}

/// `DELETE /api/patients/:id` — permanent removal, no data payload.
pub async fn destroy(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<ApiResponse, ApiError> {
    let id = parse_patient_id(&id)?;
    let conn = ctx.open_db()?;

    match repository::delete_patient(&conn, id) {
        Ok(()) => Ok(ApiResponse::success("Patient deleted successfully", None)),
        Err(DatabaseError::NotFound { .. }) => Err(ApiError::NotFound(PATIENT_NOT_FOUND.into())),
        Err(e) => Err(storage_failure(e, "Failed to delete patient")),
    }
}

fn updated_response(
    conn: &rusqlite::Connection,
    id: i64,
) -> Result<ApiResponse, ApiError> {
    let patient = repository::get_patient(conn, id)
        .map_err(|e| storage_failure(e, "Failed to update patient"))?
        .ok_or_else(|| ApiError::NotFound(PATIENT_NOT_FOUND.into()))?;

    Ok(ApiResponse::success(
        "Patient updated successfully",
        Some(patient_data(&patient)?),
    ))
}

/// The id segment must be a positive integer.
fn parse_patient_id(raw: &str) -> Result<i64, ApiError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::BadRequest("Invalid patient ID".into())),
    }
}

/// The body must parse as a non-empty JSON object.
fn parse_json_object(body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|_| ApiError::BadRequest("Invalid JSON input".into()))?;
    match value {
        Value::Object(map) if !map.is_empty() => Ok(map),
        _ => Err(ApiError::BadRequest("Invalid JSON input".into())),
    }
}

fn patient_data(patient: &Patient) -> Result<Value, ApiError> {
    serde_json::to_value(patient).map_err(|e| serialize_failure(e, "Failed to load patient"))
}

fn storage_failure(err: DatabaseError, message: &str) -> ApiError {
    tracing::error!(error = %err, "storage operation failed");
    ApiError::Internal(message.into())
}

fn serialize_failure(err: serde_json::Error, message: &str) -> ApiError {
    tracing::error!(error = %err, "response serialization failed");
    ApiError::Internal(message.into())
}
