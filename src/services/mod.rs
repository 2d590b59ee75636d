//! Business logic services layer

pub mod auth_service;
pub mod patient_service;

pub use auth_service::AuthService;
pub use patient_service::PatientService;
