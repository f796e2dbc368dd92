use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::db::DatabaseError;

/// Gender values accepted by the API and enforced by the table's
/// CHECK constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Male" => Ok(Self::Male),
            "Female" => Ok(Self::Female),
            "Other" => Ok(Self::Other),
            _ => Err(DatabaseError::InvalidEnum {
                field: "gender".into(),
                value: s.into(),
            }),
        }
    }
}

/// A persisted patient row. `id` and `created_at` are assigned by the
/// storage layer and never change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub gender: Gender,
    pub phone: String,
    pub created_at: NaiveDateTime,
}

/// The mutable fields of a patient, used for create and full update.
#[derive(Debug, Clone)]
pub struct NewPatient {
    pub name: String,
    pub age: i64,
    pub gender: Gender,
    pub phone: String,
}

/// A partial update: only the provided fields are written.
#[derive(Debug, Clone, Default)]
pub struct PatientPatch {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
}

impl PatientPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.age.is_none() && self.gender.is_none() && self.phone.is_none()
    }
}
