//! Database repository layer

pub mod memory;
pub mod patient_repo;
pub mod user_repo;

pub use memory::{MemoryPatientStore, MemoryUserStore};
pub use patient_repo::{PatientStore, PgPatientStore};
pub use user_repo::{PgUserStore, UserStore};
