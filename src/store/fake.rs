//! In-memory stand-in for the remote record service.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use super::{EmployeeStore, StoreError};
use crate::models::{Employee, EmploymentType};

#[derive(Debug, Default)]
pub struct FakeRemote {
    rows: Mutex<Vec<Employee>>,
    failing: AtomicBool,
    hide_existing: AtomicBool,
}

impl FakeRemote {
    /// Makes every following call fail like a dropped connection.
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Makes `exists` answer false, as if another client inserted the row
    /// between the check and the insert.
    pub fn hide_existing(&self, hide: bool) {
        self.hide_existing.store(hide, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Remote(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl EmployeeStore for FakeRemote {
    async fn find_by_id(&self, id: &str) -> Result<Option<Employee>, StoreError> {
        self.check()?;
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|emp| emp.id == id).cloned())
    }

    async fn exists(&self, id: &str) -> Result<bool, StoreError> {
        self.check()?;
        if self.hide_existing.load(Ordering::SeqCst) {
            return Ok(false);
        }
        Ok(self.rows.lock().unwrap().iter().any(|emp| emp.id == id))
    }

    async fn insert(&self, employee: &Employee) -> Result<(), StoreError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|emp| emp.id == employee.id) {
            return Err(StoreError::DuplicateId(employee.id.clone()));
        }
        rows.push(employee.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Employee>, StoreError> {
        self.check()?;
        Ok(self.rows.lock().unwrap().iter().rev().cloned().collect())
    }
}

pub fn employee(id: &str, password: &str) -> Employee {
    Employee {
        id: id.to_string(),
        name: format!("Employee {}", id),
        employment_type: EmploymentType::Regular,
        birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
        gender: None,
        address: "1 Main St".to_string(),
        phone: "010-1234-5678".to_string(),
        email: format!("{}@example.com", id.to_lowercase()),
        department: "engineering".to_string(),
        position: None,
        job_title: "developer".to_string(),
        start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        edu_level: Some("bachelor".to_string()),
        career_years: Some(3),
        career_summary: None,
        certificates: None,
        emergency_contact: None,
        note: None,
        password: password.to_string(),
        created_at: Utc::now(),
    }
}
