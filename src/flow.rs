//! Registration and login decisions on top of the [`Directory`].
//!
//! The remote store is authoritative whenever it answers. Registration never
//! falls back to the mirror once a remote is configured; login falls back only
//! when the remote lookup itself fails, never after a remote not-found or
//! wrong-password answer.

use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Employee, EmploymentType, Gender};
use crate::store::{Directory, EmployeeStore, Source, StoreError};

/// Which registration form is in use. Decides whether job title or education
/// level is mandatory.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum FormVariant {
    Minimal,
    #[default]
    Extended,
}

impl FromStr for FormVariant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimal" => Ok(FormVariant::Minimal),
            "extended" => Ok(FormVariant::Extended),
            other => anyhow::bail!("Unknown form variant `{}`", other),
        }
    }
}

/// Raw registration input, one string per form control.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub id: String,
    pub name: String,
    pub employment_type: String,
    pub birth_date: String,
    pub gender: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub department: String,
    pub position: String,
    pub job_title: String,
    pub start_date: String,
    pub edu_level: String,
    pub career_years: String,
    pub career_summary: String,
    pub certificates: String,
    pub emergency_contact: String,
    pub note: String,
    pub password: String,
    pub password_confirm: String,
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum RegisterRejection {
    #[error("required fields are missing: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("`{field}` is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("password and confirmation do not match")]
    PasswordMismatch,
    #[error("employee id `{0}` is already in use")]
    DuplicateId(String),
    #[error("{0}")]
    RegistrationFailed(String),
    #[error("local mirror failed: {0}")]
    StorageFailure(String),
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum LoginRejection {
    #[error("both id and password are required")]
    MissingCredentials,
    #[error("no employee with id `{0}`")]
    NotFound(String),
    #[error("password does not match")]
    WrongPassword,
    #[error("local mirror failed: {0}")]
    StorageFailure(String),
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Registered {
    pub employee_id: String,
    pub source: Source,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct LoggedIn {
    pub employee_id: String,
    pub name: String,
    pub source: Source,
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, RegisterRejection> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|err| {
        RegisterRejection::InvalidField {
            field,
            reason: err.to_string(),
        }
    })
}

impl RegistrationForm {
    /// Checks the form and builds the record to insert.
    pub fn validate(&self, variant: FormVariant) -> Result<Employee, RegisterRejection> {
        let id = self.id.trim();
        let name = self.name.trim();
        let address = self.address.trim();
        let phone = self.phone.trim();
        let email = self.email.trim();
        let department = self.department.trim();
        let job_title = self.job_title.trim();
        let edu_level = self.edu_level.trim();

        let mut required = vec![
            ("id", id),
            ("name", name),
            ("birth_date", self.birth_date.as_str()),
            ("address", address),
            ("phone", phone),
            ("email", email),
            ("department", department),
            ("start_date", self.start_date.as_str()),
        ];
        match variant {
            FormVariant::Minimal => required.push(("job_title", job_title)),
            FormVariant::Extended => required.push(("edu_level", edu_level)),
        }
        required.push(("password", self.password.as_str()));
        required.push(("password_confirm", self.password_confirm.as_str()));

        let missing: Vec<&'static str> = required
            .into_iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(field, _)| field)
            .collect();
        if !missing.is_empty() {
            return Err(RegisterRejection::MissingFields(missing));
        }

        if self.password != self.password_confirm {
            return Err(RegisterRejection::PasswordMismatch);
        }

        let employment_type = match self.employment_type.trim() {
            "" => EmploymentType::default(),
            raw => raw
                .parse::<EmploymentType>()
                .map_err(|reason| RegisterRejection::InvalidField {
                    field: "employment_type",
                    reason,
                })?,
        };
        let gender = match self.gender.trim() {
            "" => None,
            raw => Some(raw.parse::<Gender>().map_err(|reason| {
                RegisterRejection::InvalidField {
                    field: "gender",
                    reason,
                }
            })?),
        };

        Ok(Employee {
            id: id.to_string(),
            name: name.to_string(),
            employment_type,
            birth_date: parse_date("birth_date", &self.birth_date)?,
            gender,
            address: address.to_string(),
            phone: phone.to_string(),
            email: email.to_string(),
            department: department.to_string(),
            position: optional(&self.position),
            job_title: job_title.to_string(),
            start_date: parse_date("start_date", &self.start_date)?,
            edu_level: optional(edu_level),
            career_years: self.career_years.trim().parse::<i32>().ok(),
            career_summary: optional(&self.career_summary),
            certificates: optional(&self.certificates),
            emergency_contact: optional(&self.emergency_contact),
            note: optional(&self.note),
            password: self.password.clone(),
            created_at: Utc::now(),
        })
    }
}

pub async fn register(
    directory: &Directory,
    form: &RegistrationForm,
    variant: FormVariant,
) -> Result<Registered, RegisterRejection> {
    let employee = form.validate(variant)?;

    let source = match directory.remote() {
        Ok(remote) => {
            register_remote(remote, &employee).await?;
            Source::Remote
        }
        Err(_) => {
            register_local(directory, &employee).await?;
            Source::Local
        }
    };

    log::info!("Registered employee `{}` ({:?})", employee.id, source);
    Ok(Registered {
        employee_id: employee.id,
        source,
    })
}

async fn register_remote(
    remote: &dyn EmployeeStore,
    employee: &Employee,
) -> Result<(), RegisterRejection> {
    match remote.exists(&employee.id).await {
        Ok(true) => return Err(RegisterRejection::DuplicateId(employee.id.clone())),
        Ok(false) => {}
        Err(err) => {
            log::error!("Employee id check failed: {}", err);
            return Err(RegisterRejection::RegistrationFailed(
                "Server error while checking the employee id. Try again later.".to_string(),
            ));
        }
    }

    match remote.insert(employee).await {
        Ok(()) => Ok(()),
        Err(StoreError::DuplicateId(id)) => Err(RegisterRejection::DuplicateId(id)),
        Err(err) => {
            log::error!("Employee registration failed: {}", err);
            Err(RegisterRejection::RegistrationFailed(
                "Server error while registering the employee. Try again later.".to_string(),
            ))
        }
    }
}

async fn register_local(directory: &Directory, employee: &Employee) -> Result<(), RegisterRejection> {
    let mirror = directory.mirror();
    let storage_failure = |err: StoreError| {
        log::error!("Local mirror write failed: {}", err);
        RegisterRejection::StorageFailure(err.to_string())
    };

    if mirror.exists(&employee.id).await.map_err(storage_failure)? {
        return Err(RegisterRejection::DuplicateId(employee.id.clone()));
    }
    match mirror.insert(employee).await {
        Ok(()) => Ok(()),
        Err(StoreError::DuplicateId(id)) => Err(RegisterRejection::DuplicateId(id)),
        Err(err) => Err(storage_failure(err)),
    }
}

pub async fn login(
    directory: &Directory,
    id: &str,
    password: &str,
) -> Result<LoggedIn, LoginRejection> {
    let id = id.trim();
    if id.is_empty() || password.is_empty() {
        return Err(LoginRejection::MissingCredentials);
    }

    match directory.remote() {
        Ok(remote) => match remote.find_by_id(id).await {
            Ok(found) => return check_password(found, id, password, Source::Remote),
            Err(err) => log::warn!(
                "Remote lookup for `{}` failed, falling back to local mirror: {}",
                id,
                err
            ),
        },
        Err(_) => log::debug!("No remote configured, checking local mirror for `{}`", id),
    }

    let found = directory.mirror().find_by_id(id).await.map_err(|err| {
        log::error!("Local mirror read failed: {}", err);
        LoginRejection::StorageFailure(err.to_string())
    })?;
    check_password(found, id, password, Source::Local)
}

fn check_password(
    found: Option<Employee>,
    id: &str,
    password: &str,
    source: Source,
) -> Result<LoggedIn, LoginRejection> {
    let employee = found.ok_or_else(|| LoginRejection::NotFound(id.to_string()))?;
    if employee.password != password {
        return Err(LoginRejection::WrongPassword);
    }
    Ok(LoggedIn {
        name: employee.display_name().to_string(),
        employee_id: employee.id,
        source,
    })
}
