//! In-process stores backed by `DashMap`
//!
//! Used by tests and local runs without PostgreSQL. Ids come from an atomic
//! counter, timestamps from the wall clock.

use crate::{
    error::AppError,
    models::{
        patient::{NewPatient, Patient},
        user::{NewUser, User},
    },
    repository::{PatientStore, UserStore},
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::atomic::{AtomicI64, Ordering};

#[derive(Default)]
pub struct MemoryUserStore {
    users: DashMap<i64, User>,
    // email -> id; the entry lock makes create atomic per email
    emails: DashMap<String, i64>,
    next_id: AtomicI64,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let Some(id) = self.emails.get(email).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn create(&self, user: &NewUser) -> Result<User, AppError> {
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AppError::DuplicateEmail(user.email.clone())),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                let now = Utc::now();
                let created = User {
                    id,
                    name: user.name.clone(),
                    email: user.email.clone(),
                    password_hash: user.password_hash.clone(),
                    role: user.role,
                    created_at: now,
                    updated_at: now,
                };
                self.users.insert(id, created.clone());
                slot.insert(id);
                Ok(created)
            }
        }
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.users.iter().map(|e| e.value().clone()).collect();
        users.sort_by_key(|u| u.id);
        Ok(page(users, limit, offset))
    }
}

#[derive(Default)]
pub struct MemoryPatientStore {
    patients: DashMap<i64, Patient>,
    next_id: AtomicI64,
}

impl MemoryPatientStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn live(&self) -> Vec<Patient> {
        let mut patients: Vec<Patient> = self
            .patients
            .iter()
            .filter(|e| e.value().deleted_at.is_none())
            .map(|e| e.value().clone())
            .collect();
        patients.sort_by_key(|p| p.id);
        patients
    }
}

#[async_trait]
impl PatientStore for MemoryPatientStore {
    async fn create(&self, patient: &NewPatient) -> Result<Patient, AppError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        let created = Patient {
            id,
            name: patient.name.clone(),
            age: patient.age,
            gender: patient.gender,
            address: patient.address.clone(),
            phone_number: patient.phone_number.clone(),
            medical_history: patient.medical_history.clone(),
            diagnosis: patient.diagnosis.clone(),
            treatment: patient.treatment.clone(),
            notes: patient.notes.clone(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.patients.insert(id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Patient>, AppError> {
        Ok(self
            .patients
            .get(&id)
            .filter(|e| e.value().deleted_at.is_none())
            .map(|e| e.value().clone()))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Patient>, AppError> {
        let needle = name.to_lowercase();
        Ok(self
            .live()
            .into_iter()
            .find(|p| p.name.to_lowercase() == needle))
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Patient>, AppError> {
        Ok(page(self.live(), limit, offset))
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self
            .patients
            .iter()
            .filter(|e| e.value().deleted_at.is_none())
            .count() as i64)
    }

    async fn update(&self, id: i64, patient: &NewPatient) -> Result<Option<Patient>, AppError> {
        let Some(mut entry) = self.patients.get_mut(&id) else {
            return Ok(None);
        };
        let existing = entry.value_mut();
        if existing.deleted_at.is_some() {
            return Ok(None);
        }

        existing.name = patient.name.clone();
        existing.age = patient.age;
        existing.gender = patient.gender;
        existing.address = patient.address.clone();
        existing.phone_number = patient.phone_number.clone();
        existing.medical_history = patient.medical_history.clone();
        existing.diagnosis = patient.diagnosis.clone();
        existing.treatment = patient.treatment.clone();
        existing.notes = patient.notes.clone();
        existing.updated_at = Utc::now();

        Ok(Some(existing.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        match self.patients.get_mut(&id) {
            Some(mut entry) if entry.value().deleted_at.is_none() => {
                entry.value_mut().deleted_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

fn page<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::Role, models::patient::Gender};
    use std::sync::Arc;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "A".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role: Role::Doctor,
        }
    }

    fn new_patient(name: &str) -> NewPatient {
        NewPatient {
            name: name.to_string(),
            age: 40,
            gender: Gender::Female,
            address: "1 Main St".to_string(),
            phone_number: "555-0100".to_string(),
            medical_history: String::new(),
            diagnosis: String::new(),
            treatment: String::new(),
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn test_user_create_and_find() {
        let store = MemoryUserStore::new();
        let created = store.create(&new_user("a@x.com")).await.unwrap();
        assert_eq!(created.id, 1);

        let by_email = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
        assert!(store.find_by_id(created.id).await.unwrap().is_some());
        assert!(store.find_by_email("A@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_user_duplicate_email() {
        let store = MemoryUserStore::new();
        store.create(&new_user("a@x.com")).await.unwrap();

        let result = store.create(&new_user("a@x.com")).await;
        assert!(matches!(result, Err(AppError::DuplicateEmail(_))));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_user_concurrent_create_single_winner() {
        let store = Arc::new(MemoryUserStore::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.create(&new_user("race@x.com")).await })
            })
            .collect();

        let mut ok = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                ok += 1;
            }
        }

        assert_eq!(ok, 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_patient_soft_delete_hides_record() {
        let store = MemoryPatientStore::new();
        let p = store.create(&new_patient("John Doe")).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);

        assert!(store.delete(p.id).await.unwrap());
        assert!(!store.delete(p.id).await.unwrap());
        assert!(store.find_by_id(p.id).await.unwrap().is_none());
        assert!(store.update(p.id, &new_patient("X")).await.unwrap().is_none());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_patient_find_by_name_case_insensitive() {
        let store = MemoryPatientStore::new();
        store.create(&new_patient("John Doe")).await.unwrap();

        let found = store.find_by_name("john doe").await.unwrap();
        assert_eq!(found.map(|p| p.name), Some("John Doe".to_string()));
        assert!(store.find_by_name("john").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_patient_list_pagination() {
        let store = MemoryPatientStore::new();
        for i in 0..5 {
            store.create(&new_patient(&format!("P{}", i))).await.unwrap();
        }

        let first = store.list(2, 0).await.unwrap();
        let last = store.list(2, 4).await.unwrap();
        assert_eq!(first.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(last.len(), 1);
    }
}
