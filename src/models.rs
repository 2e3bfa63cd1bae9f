use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmploymentType {
    #[default]
    Regular,
    Freelance,
}

impl EmploymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentType::Regular => "regular",
            EmploymentType::Freelance => "freelance",
        }
    }
}

impl FromStr for EmploymentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular" => Ok(EmploymentType::Regular),
            "freelance" => Ok(EmploymentType::Freelance),
            other => Err(format!("unknown employment type `{}`", other)),
        }
    }
}

impl fmt::Display for EmploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
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

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(format!("unknown gender `{}`", other)),
        }
    }
}

/// A registered employee, as stored in either backend.
///
/// Serializes with the camelCase keys of the local mirror blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_employment_type")]
    pub employment_type: EmploymentType,
    pub birth_date: NaiveDate,
    #[serde(default, deserialize_with = "lenient_gender")]
    pub gender: Option<Gender>,
    pub address: String,
    pub phone: String,
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub department: String,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub job_title: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub edu_level: Option<String>,
    #[serde(default, deserialize_with = "lenient_years")]
    pub career_years: Option<i32>,
    #[serde(default)]
    pub career_summary: Option<String>,
    #[serde(default)]
    pub certificates: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    pub password: String,
    pub created_at: DateTime<Utc>,
}

// Mirror blobs written by older front ends store these fields loosely: nulls
// for text, fractional or quoted numbers for years, free-form enum values.

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_employment_type<'de, D>(deserializer: D) -> Result<EmploymentType, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .and_then(|t| t.parse().ok())
        .unwrap_or_default())
}

fn lenient_gender<'de, D>(deserializer: D) -> Result<Option<Gender>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.and_then(|g| g.parse().ok()))
}

fn lenient_years<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let years = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    Ok(years.and_then(|y| i32::try_from(y).ok()))
}

impl Employee {
    /// Name to greet the employee with, falling back to the id.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Everything about an employee except the password.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeProfile {
    pub employee_id: String,
    pub name: String,
    pub employment_type: EmploymentType,
    pub birth_date: NaiveDate,
    pub gender: Option<Gender>,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub department: String,
    pub position: Option<String>,
    pub job_title: String,
    pub start_date: NaiveDate,
    pub edu_level: Option<String>,
    pub career_years: Option<i32>,
    pub career_summary: Option<String>,
    pub certificates: Option<String>,
    pub emergency_contact: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Employee> for EmployeeProfile {
    fn from(employee: Employee) -> Self {
        Self {
            employee_id: employee.id,
            name: employee.name,
            employment_type: employee.employment_type,
            birth_date: employee.birth_date,
            gender: employee.gender,
            address: employee.address,
            phone: employee.phone,
            email: employee.email,
            department: employee.department,
            position: employee.position,
            job_title: employee.job_title,
            start_date: employee.start_date,
            edu_level: employee.edu_level,
            career_years: employee.career_years,
            career_summary: employee.career_summary,
            certificates: employee.certificates,
            emergency_contact: employee.emergency_contact,
            note: employee.note,
            created_at: employee.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMarker {
    pub id: String,
    pub name: String,
    pub login_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_mirror_record_with_blank_optionals() {
        let raw = r#"{
            "id": "E7",
            "name": "Kim",
            "employmentType": "freelance",
            "birthDate": "1990-04-01",
            "gender": null,
            "address": "Seoul",
            "phone": "010-0000-0000",
            "email": "kim@example.com",
            "department": "dev",
            "jobTitle": "backend",
            "startDate": "2024-03-02",
            "password": "pw",
            "createdAt": "2024-03-01T09:00:00.000Z"
        }"#;
        let employee: Employee = serde_json::from_str(raw).unwrap();
        assert_eq!(employee.employment_type, EmploymentType::Freelance);
        assert_eq!(employee.gender, None);
        assert_eq!(employee.department, "dev");
        assert_eq!(employee.edu_level, None);
        assert_eq!(employee.career_years, None);
    }

    #[test]
    fn profile_has_no_password() {
        let raw = r#"{
            "id": "E8", "name": "", "birthDate": "1990-04-01", "address": "a",
            "phone": "p", "email": "e", "startDate": "2024-03-02",
            "password": "secret", "createdAt": "2024-03-01T09:00:00Z"
        }"#;
        let employee: Employee = serde_json::from_str(raw).unwrap();
        assert_eq!(employee.display_name(), "E8");

        let json = serde_json::to_value(EmployeeProfile::from(employee)).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["employee_id"], "E8");
        assert_eq!(json["employment_type"], "regular");
    }

    #[test]
    fn reads_loosely_typed_mirror_fields() {
        let raw = r#"{
            "id": "B2", "name": "Yoon", "employmentType": "intern", "birthDate": "1990-04-01",
            "gender": "unspecified", "address": "a", "phone": "p", "email": "e",
            "department": null, "startDate": "2024-03-02", "careerYears": 1.5,
            "password": "pw", "createdAt": "2024-03-01T09:00:00Z"
        }"#;
        let employee: Employee = serde_json::from_str(raw).unwrap();
        assert_eq!(employee.employment_type, EmploymentType::Regular);
        assert_eq!(employee.gender, None);
        assert_eq!(employee.department, "");
        assert_eq!(employee.career_years, Some(1));

        let quoted = raw.replace("1.5", "\" 4 \"");
        let employee: Employee = serde_json::from_str(&quoted).unwrap();
        assert_eq!(employee.career_years, Some(4));
    }

    #[test]
    fn parses_enums_from_wire_text() {
        assert_eq!("regular".parse::<EmploymentType>(), Ok(EmploymentType::Regular));
        assert!("contract".parse::<EmploymentType>().is_err());
        assert_eq!("female".parse::<Gender>(), Ok(Gender::Female));
    }
}
