//! Patient repository (数据库访问层)

use crate::{
    error::AppError,
    models::patient::{NewPatient, Patient},
};
use async_trait::async_trait;
use sqlx::PgPool;

/// Persistence boundary for patient records.
///
/// Soft-deleted rows are invisible to every read and cannot be updated or
/// deleted again.
#[async_trait]
pub trait PatientStore: Send + Sync {
    async fn create(&self, patient: &NewPatient) -> Result<Patient, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Patient>, AppError>;

    /// Case-insensitive exact match on the name; lowest id wins
    async fn find_by_name(&self, name: &str) -> Result<Option<Patient>, AppError>;

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Patient>, AppError>;

    async fn count(&self) -> Result<i64, AppError>;

    async fn update(&self, id: i64, patient: &NewPatient) -> Result<Option<Patient>, AppError>;

    /// Returns false when nothing was deleted
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}

pub struct PgPatientStore {
    db: PgPool,
}

impl PgPatientStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PatientStore for PgPatientStore {
    async fn create(&self, patient: &NewPatient) -> Result<Patient, AppError> {
        let created = sqlx::query_as::<_, Patient>(
            r#"
            INSERT INTO patients
                (name, age, gender, address, phone_number, medical_history, diagnosis, treatment, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&patient.name)
        .bind(patient.age)
        .bind(patient.gender.as_str())
        .bind(&patient.address)
        .bind(&patient.phone_number)
        .bind(&patient.medical_history)
        .bind(&patient.diagnosis)
        .bind(&patient.treatment)
        .bind(&patient.notes)
        .fetch_one(&self.db)
        .await?;

        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Patient>, AppError> {
        let patient = sqlx::query_as::<_, Patient>(
            "SELECT * FROM patients WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(patient)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Patient>, AppError> {
        let patient = sqlx::query_as::<_, Patient>(
            r#"
            SELECT * FROM patients
            WHERE LOWER(name) = LOWER($1) AND deleted_at IS NULL
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.db)
        .await?;

        Ok(patient)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Patient>, AppError> {
        let patients = sqlx::query_as::<_, Patient>(
            r#"
            SELECT * FROM patients
            WHERE deleted_at IS NULL
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(patients)
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM patients WHERE deleted_at IS NULL")
                .fetch_one(&self.db)
                .await?;

        Ok(count.0)
    }

    async fn update(&self, id: i64, patient: &NewPatient) -> Result<Option<Patient>, AppError> {
        let updated = sqlx::query_as::<_, Patient>(
            r#"
            UPDATE patients
            SET
                name = $2,
                age = $3,
                gender = $4,
                address = $5,
                phone_number = $6,
                medical_history = $7,
                diagnosis = $8,
                treatment = $9,
                notes = $10,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&patient.name)
        .bind(patient.age)
        .bind(patient.gender.as_str())
        .bind(&patient.address)
        .bind(&patient.phone_number)
        .bind(&patient.medical_history)
        .bind(&patient.diagnosis)
        .bind(&patient.treatment)
        .bind(&patient.notes)
        .fetch_optional(&self.db)
        .await?;

        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE patients SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
