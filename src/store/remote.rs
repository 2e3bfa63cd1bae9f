use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::{EmployeeStore, StoreError};
use crate::models::{Employee, EmploymentType, Gender};

const UNIQUE_VIOLATION: &str = "23505";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

/// The `employees` table of the hosted record service.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    pool: PgPool,
}

impl RemoteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Builds the pool without connecting, so an unreachable service only
    /// fails the calls that need it.
    pub fn connect_lazy(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy(url)?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl EmployeeStore for RemoteStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Employee>, StoreError> {
        let row = sqlx::query_as::<_, EmployeeRow>(
            "SELECT * FROM employees WHERE employee_id = $1 LIMIT 1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Employee::from))
    }

    async fn exists(&self, id: &str) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM employees WHERE employee_id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert(&self, employee: &Employee) -> Result<(), StoreError> {
        let res = sqlx::query(
            "INSERT INTO employees (employee_id, name, employment_type, birth_date, gender, \
             address, phone, email, department, position, job_title, start_date, edu_level, \
             career_years, career_summary, certificates, emergency_contact, note, password, \
             inserted_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
             $17, $18, $19, $20)",
        )
        .bind(&employee.id)
        .bind(&employee.name)
        .bind(employee.employment_type.as_str())
        .bind(employee.birth_date)
        .bind(employee.gender.map(|g| g.as_str()))
        .bind(&employee.address)
        .bind(&employee.phone)
        .bind(&employee.email)
        .bind(&employee.department)
        .bind(&employee.position)
        .bind(&employee.job_title)
        .bind(employee.start_date)
        .bind(&employee.edu_level)
        .bind(employee.career_years)
        .bind(&employee.career_summary)
        .bind(&employee.certificates)
        .bind(&employee.emergency_contact)
        .bind(&employee.note)
        .bind(&employee.password)
        .bind(employee.created_at)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                StoreError::DuplicateId(employee.id.clone())
            } else {
                StoreError::Remote(err)
            }
        })?;

        if res.rows_affected() < 1 {
            log::error!("Insert of employee `{}` affected no rows", employee.id);
            return Err(StoreError::Remote(sqlx::Error::RowNotFound));
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Employee>, StoreError> {
        let rows = sqlx::query_as::<_, EmployeeRow>(
            "SELECT * FROM employees ORDER BY inserted_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Employee::from).collect())
    }
}

/// Column layout of the `employees` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EmployeeRow {
    pub employee_id: String,
    pub name: Option<String>,
    pub employment_type: Option<String>,
    pub birth_date: NaiveDate,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub job_title: Option<String>,
    pub start_date: NaiveDate,
    pub edu_level: Option<String>,
    pub career_years: Option<i32>,
    pub career_summary: Option<String>,
    pub certificates: Option<String>,
    pub emergency_contact: Option<String>,
    pub note: Option<String>,
    pub password: String,
    pub inserted_at: DateTime<Utc>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        // rows written by other clients may carry values we do not model
        let employment_type = row
            .employment_type
            .as_deref()
            .and_then(|t| t.parse::<EmploymentType>().ok())
            .unwrap_or_default();
        let gender = row.gender.as_deref().and_then(|g| g.parse::<Gender>().ok());

        Employee {
            id: row.employee_id,
            name: row.name.unwrap_or_default(),
            employment_type,
            birth_date: row.birth_date,
            gender,
            address: row.address.unwrap_or_default(),
            phone: row.phone.unwrap_or_default(),
            email: row.email.unwrap_or_default(),
            department: row.department.unwrap_or_default(),
            position: non_empty(row.position),
            job_title: row.job_title.unwrap_or_default(),
            start_date: row.start_date,
            edu_level: non_empty(row.edu_level),
            career_years: row.career_years,
            career_summary: non_empty(row.career_summary),
            certificates: non_empty(row.certificates),
            emergency_contact: non_empty(row.emergency_contact),
            note: non_empty(row.note),
            password: row.password,
            created_at: row.inserted_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    /// A driver error carrying only a SQLSTATE.
    #[derive(Debug)]
    struct CodedError(&'static str);

    impl fmt::Display for CodedError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "database error {}", self.0)
        }
    }

    impl StdError for CodedError {}

    impl DatabaseError for CodedError {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.0))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    #[test]
    fn only_sqlstate_23505_is_a_unique_violation() {
        let duplicate = sqlx::Error::Database(Box::new(CodedError("23505")));
        assert!(is_unique_violation(&duplicate));

        let foreign_key = sqlx::Error::Database(Box::new(CodedError("23503")));
        assert!(!is_unique_violation(&foreign_key));
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }

    fn row() -> EmployeeRow {
        EmployeeRow {
            employee_id: "E100".to_string(),
            name: Some("Lee".to_string()),
            employment_type: Some("freelance".to_string()),
            birth_date: NaiveDate::from_ymd_opt(1988, 5, 17).unwrap(),
            gender: Some("".to_string()),
            address: Some("Busan".to_string()),
            phone: None,
            email: Some("lee@example.com".to_string()),
            department: Some("design".to_string()),
            position: Some("  ".to_string()),
            job_title: None,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            edu_level: Some("master".to_string()),
            career_years: Some(7),
            career_summary: Some("".to_string()),
            certificates: None,
            emergency_contact: None,
            note: None,
            password: "p1".to_string(),
            inserted_at: Utc::now(),
        }
    }

    #[test]
    fn row_maps_onto_employee() {
        let employee = Employee::from(row());
        assert_eq!(employee.id, "E100");
        assert_eq!(employee.employment_type, EmploymentType::Freelance);
        assert_eq!(employee.gender, None);
        assert_eq!(employee.phone, "");
        assert_eq!(employee.department, "design");
        assert_eq!(employee.position, None);
        assert_eq!(employee.career_summary, None);
        assert_eq!(employee.edu_level.as_deref(), Some("master"));
        assert_eq!(employee.career_years, Some(7));
    }

    #[test]
    fn unknown_employment_type_defaults_to_regular() {
        let mut row = row();
        row.employment_type = Some("contract".to_string());
        assert_eq!(Employee::from(row).employment_type, EmploymentType::Regular);
    }

    #[tokio::test]
    async fn lazy_pool_accepts_url_without_connecting() {
        let store = RemoteStore::connect_lazy("postgres://user:pw@127.0.0.1:1/directory", 1);
        assert!(store.is_ok());
        assert!(RemoteStore::connect_lazy("not a url", 1).is_err());
    }
}
