//! Field validation for patient payloads.
//!
//! Two deliberate policies coexist: field-presence checks (create/full
//! update) and field-shape checks (partial update) accumulate every
//! error into one "Validation failed" list, while the age and gender
//! checks short-circuit on the first violation.

use std::str::FromStr;

use serde_json::{Map, Value};

use crate::api::error::ApiError;
use crate::models::{Gender, NewPatient, PatientPatch};

/// The only fields a client may supply.
pub const PATIENT_FIELDS: [&str; 4] = ["name", "age", "gender", "phone"];

const INVALID_AGE: &str = "Invalid age value";
const INVALID_GENDER: &str = "Gender must be Male, Female, or Other";

/// Validate a create / full-update body. All four fields are required.
pub fn validate_create(input: &Map<String, Value>) -> Result<NewPatient, ApiError> {
    let mut errors = Vec::new();
    for field in PATIENT_FIELDS {
        if input.get(field).and_then(text_value).is_none() {
            errors.push(format!("{field} is required"));
        }
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let age = validate_age(input.get("age"))?;
    let gender = validate_gender(input.get("gender"))?;

    Ok(NewPatient {
        name: input.get("name").and_then(text_value).unwrap_or_default(),
        age,
        gender,
        phone: input.get("phone").and_then(text_value).unwrap_or_default(),
    })
}

/// Validate a partial-update body. Any subset of the four fields is
/// allowed; unknown keys and blank values are collected together.
pub fn validate_patch(input: &Map<String, Value>) -> Result<PatientPatch, ApiError> {
    let mut errors = Vec::new();
    for (field, value) in input {
        match field.as_str() {
            "name" | "phone" => {
                if text_value(value).is_none() {
                    errors.push(format!("{field} cannot be empty"));
                }
            }
            "age" | "gender" => {
                if is_blank(value) {
                    errors.push(format!("{field} cannot be empty"));
                }
            }
            _ => errors.push(format!("Invalid field: {field}")),
        }
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let age = match input.get("age") {
        Some(value) => Some(validate_age(Some(value))?),
        None => None,
    };
    let gender = match input.get("gender") {
        Some(value) => Some(validate_gender(Some(value))?),
        None => None,
    };

    Ok(PatientPatch {
        name: input.get("name").and_then(text_value),
        age,
        gender,
        phone: input.get("phone").and_then(text_value),
    })
}

/// Age must be an integer (JSON number or numeric string) in [0, 150].
fn validate_age(value: Option<&Value>) -> Result<i64, ApiError> {
    value
        .and_then(integer_value)
        .filter(|age| (0..=150).contains(age))
        .ok_or_else(|| ApiError::BadRequest(INVALID_AGE.into()))
}

fn validate_gender(value: Option<&Value>) -> Result<Gender, ApiError> {
    value
        .and_then(Value::as_str)
        .and_then(|s| Gender::from_str(s).ok())
        .ok_or_else(|| ApiError::BadRequest(INVALID_GENDER.into()))
}

/// Extract a text value. Strings must be non-blank after trimming;
/// numbers are accepted and rendered as text so clients may send a
/// numeric phone field. Anything else counts as absent.
fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Accept JSON integers and numeric strings; reject fractions.
fn integer_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
