//! Patient record models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Gender {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            _ => Err(format!("unknown gender: {}", value)),
        }
    }
}

/// Patient record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Patient {
    pub id: i64,
    pub name: String,
    pub age: i32,
    #[sqlx(try_from = "String")]
    pub gender: Gender,
    pub address: String,
    pub phone_number: String,
    pub medical_history: String,
    pub diagnosis: String,
    pub treatment: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    // Soft delete marker, never exposed
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Create / update request body
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PatientRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub name: String,
    #[validate(range(min = 0, max = 150, message = "must be between 0 and 150"))]
    pub age: i32,
    pub gender: Gender,
    #[validate(length(min = 1, message = "is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "is required"))]
    pub phone_number: String,
    #[serde(default)]
    pub medical_history: String,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub treatment: String,
    #[serde(default)]
    pub notes: String,
}

/// Fields written by create and update
pub type NewPatient = PatientRequest;

/// Query string for the patient list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Query string for name search
#[derive(Debug, Clone, Deserialize)]
pub struct PatientSearchQuery {
    pub name: Option<String>,
}

/// Paginated patient list
#[derive(Debug, Serialize)]
pub struct PatientPage {
    pub patients: Vec<Patient>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}
