//! 患者服务：增删改查与分页

use crate::{
    error::AppError,
    models::patient::{NewPatient, Patient, PatientListQuery, PatientPage},
    repository::PatientStore,
};
use std::sync::Arc;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

pub struct PatientService {
    patients: Arc<dyn PatientStore>,
}

impl PatientService {
    pub fn new(patients: Arc<dyn PatientStore>) -> Self {
        Self { patients }
    }

    pub async fn create(&self, req: NewPatient) -> Result<Patient, AppError> {
        let patient = self.patients.create(&req).await?;
        tracing::info!(patient_id = patient.id, "Patient created");
        Ok(patient)
    }

    pub async fn get(&self, id: i64) -> Result<Patient, AppError> {
        self.patients
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Patient"))
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Patient, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Name parameter is required".to_string()));
        }

        self.patients
            .find_by_name(name)
            .await?
            .ok_or_else(|| AppError::not_found("Patient"))
    }

    pub async fn list(&self, query: &PatientListQuery) -> Result<PatientPage, AppError> {
        let (page, page_size) = resolve_pagination(query)?;
        let offset = i64::from(page - 1) * i64::from(page_size);

        let total = self.patients.count().await?;
        let patients = self.patients.list(i64::from(page_size), offset).await?;

        Ok(PatientPage {
            patients,
            total,
            page,
            page_size,
            total_pages: total_pages(total, page_size),
        })
    }

    pub async fn update(&self, id: i64, req: NewPatient) -> Result<Patient, AppError> {
        let patient = self
            .patients
            .update(id, &req)
            .await?
            .ok_or_else(|| AppError::not_found("Patient"))?;

        tracing::info!(patient_id = id, "Patient updated");
        Ok(patient)
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        if !self.patients.delete(id).await? {
            return Err(AppError::not_found("Patient"));
        }

        tracing::info!(patient_id = id, "Patient deleted");
        Ok(())
    }
}

/// 解析分页参数：page >= 1，page_size 1..=100
pub fn resolve_pagination(query: &PatientListQuery) -> Result<(u32, u32), AppError> {
    let page = query.page.unwrap_or(1);
    let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE);

    if page == 0 {
        return Err(AppError::BadRequest("page must be >= 1".to_string()));
    }
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(AppError::BadRequest(format!(
            "page_size must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }

    Ok((page, page_size))
}

fn total_pages(total: i64, page_size: u32) -> u32 {
    let page_size = i64::from(page_size);
    ((total.max(0) + page_size - 1) / page_size) as u32
}
