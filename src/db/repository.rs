use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, ToSql};

use super::DatabaseError;
use crate::models::{Gender, NewPatient, Patient, PatientPatch};

const PATIENT_COLUMNS: &str = "id, name, age, gender, phone, created_at";

/// List all patients, newest first. The id tiebreaker keeps the order
/// deterministic when several rows share a `created_at` second.
pub fn list_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY created_at DESC, id DESC"
    ))?;

    let rows = stmt.query_map([], |row| {
        Ok(PatientRow {
            id: row.get(0)?,
            name: row.get(1)?,
            age: row.get(2)?,
            gender: row.get(3)?,
            phone: row.get(4)?,
            created_at: row.get(5)?,
        })
    })?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(row?)?);
    }
    Ok(patients)
}

/// Fetch a single patient. `Ok(None)` means the row does not exist.
pub fn get_patient(conn: &Connection, id: i64) -> Result<Option<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"
    ))?;

    let result = stmt.query_row(params![id], |row| {
        Ok(PatientRow {
            id: row.get(0)?,
            name: row.get(1)?,
            age: row.get(2)?,
            gender: row.get(3)?,
            phone: row.get(4)?,
            created_at: row.get(5)?,
        })
    });

    match result {
        Ok(row) => Ok(Some(patient_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Insert a new patient and return the generated id. `created_at` is
/// assigned by the table default.
pub fn insert_patient(conn: &Connection, patient: &NewPatient) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO patients (name, age, gender, phone) VALUES (?1, ?2, ?3, ?4)",
        params![
            patient.name,
            patient.age,
            patient.gender.as_str(),
            patient.phone,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Replace all mutable fields of an existing patient. `id` and
/// `created_at` are never touched.
pub fn update_patient(
    conn: &Connection,
    id: i64,
    fields: &NewPatient,
) -> Result<(), DatabaseError> {
    ensure_patient_exists(conn, id)?;

    conn.execute(
        "UPDATE patients SET name = ?1, age = ?2, gender = ?3, phone = ?4 WHERE id = ?5",
        params![
            fields.name,
            fields.age,
            fields.gender.as_str(),
            fields.phone,
            id,
        ],
    )?;
    Ok(())
}

/// Write only the fields present in the patch. The SET clause is built
/// from a fixed column list; every value is bound as a parameter. An
/// empty patch is a no-op, but the row still has to exist.
pub fn update_patient_partial(
    conn: &Connection,
    id: i64,
    patch: &PatientPatch,
) -> Result<(), DatabaseError> {
    ensure_patient_exists(conn, id)?;

    if patch.is_empty() {
        return Ok(());
    }

    let mut assignments: Vec<String> = Vec::new();
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(name) = &patch.name {
        values.push(Box::new(name.clone()));
        assignments.push(format!("name = ?{}", values.len()));
    }
    if let Some(age) = patch.age {
        values.push(Box::new(age));
        assignments.push(format!("age = ?{}", values.len()));
    }
    if let Some(gender) = patch.gender {
        values.push(Box::new(gender.as_str()));
        assignments.push(format!("gender = ?{}", values.len()));
    }
    if let Some(phone) = &patch.phone {
        values.push(Box::new(phone.clone()));
        assignments.push(format!("phone = ?{}", values.len()));
    }

    values.push(Box::new(id));
    let sql = format!(
        "UPDATE patients SET {} WHERE id = ?{}",
        assignments.join(", "),
        values.len()
    );

    let params: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
    conn.execute(&sql, &params[..])?;
    Ok(())
}

/// Delete a patient permanently.
pub fn delete_patient(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    ensure_patient_exists(conn, id)?;

    conn.execute("DELETE FROM patients WHERE id = ?1", params![id])?;
    Ok(())
}

fn ensure_patient_exists(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    if get_patient(conn, id)?.is_none() {
        return Err(DatabaseError::NotFound {
            entity_type: "patient".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

// Internal row type for Patient mapping
struct PatientRow {
    id: i64,
    name: String,
    age: i64,
    gender: String,
    phone: String,
    created_at: String,
}

fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    Ok(Patient {
        id: row.id,
        name: row.name,
        age: row.age,
        gender: Gender::from_str(&row.gender)?,
        phone: row.phone,
        created_at: NaiveDateTime::parse_from_str(&row.created_at, "%Y-%m-%d %H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(&row.created_at, "%Y-%m-%dT%H:%M:%S"))
            .unwrap_or_default(),
    })
}
