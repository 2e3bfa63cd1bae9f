#![allow(non_snake_case)]

use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;

use serde::Serialize;

use crate::flow::{LoginRejection, RegisterRejection};
use crate::store::StoreError;

pub async fn handler404(path: Uri) -> Error {
    Error::InvalidPath {
        message: format!("Invalid path: {}", path),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Maybe<T> {
    Nothing(Error),
    Fine(Success<T>),
}

pub fn Fine<V>(v: V) -> Maybe<V>
where
    V: Serialize,
{
    Maybe::Fine(Success::of(v))
}

pub fn Nothing<V>(err: Error) -> Maybe<V> {
    Maybe::Nothing(err)
}

#[derive(Debug, Clone, Serialize)]
pub struct Success<V> {
    success: bool,
    #[serde(flatten)]
    value: V,
}

impl<T> IntoResponse for Maybe<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        match self {
            Maybe::Nothing(err) => err.into_response(),
            Maybe::Fine(success) => Json(success).into_response(),
        }
    }
}

impl<V: Serialize> Success<V> {
    pub fn of(value: V) -> Self {
        Self {
            success: true,
            value,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "error")]
pub enum Error {
    InvalidPath { message: String },
    MissingFields { message: String, fields: Vec<&'static str> },
    InvalidField { message: String, field: &'static str },
    PasswordMismatch { message: String },
    DuplicateId { message: String },
    RegistrationFailed { message: String },
    MissingCredentials { message: String },
    EmployeeNotFound { message: String },
    WrongPassword { message: String },
    NoSession { message: String },
    RemoteError { message: String },
    InternalError { kind: &'static str, message: String },
    Unknown { message: String },
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::InvalidPath { .. }
            | Error::EmployeeNotFound { .. }
            | Error::NoSession { .. } => StatusCode::NOT_FOUND,
            Error::MissingFields { .. }
            | Error::InvalidField { .. }
            | Error::PasswordMismatch { .. }
            | Error::MissingCredentials { .. } => StatusCode::BAD_REQUEST,
            Error::DuplicateId { .. } => StatusCode::CONFLICT,
            Error::WrongPassword { .. } => StatusCode::UNAUTHORIZED,
            Error::RegistrationFailed { .. } | Error::RemoteError { .. } => StatusCode::BAD_GATEWAY,
            Error::InternalError { .. } | Error::Unknown { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<RegisterRejection> for Error {
    fn from(rejection: RegisterRejection) -> Self {
        let message = rejection.to_string();
        match rejection {
            RegisterRejection::MissingFields(fields) => Self::MissingFields { message, fields },
            RegisterRejection::InvalidField { field, .. } => Self::InvalidField { message, field },
            RegisterRejection::PasswordMismatch => Self::PasswordMismatch { message },
            RegisterRejection::DuplicateId(_) => Self::DuplicateId { message },
            RegisterRejection::RegistrationFailed(_) => Self::RegistrationFailed { message },
            RegisterRejection::StorageFailure(_) => Self::InternalError {
                kind: "StorageError",
                message,
            },
        }
    }
}

impl From<LoginRejection> for Error {
    fn from(rejection: LoginRejection) -> Self {
        let message = rejection.to_string();
        match rejection {
            LoginRejection::MissingCredentials => Self::MissingCredentials { message },
            LoginRejection::NotFound(_) => Self::EmployeeNotFound { message },
            LoginRejection::WrongPassword => Self::WrongPassword { message },
            LoginRejection::StorageFailure(_) => Self::InternalError {
                kind: "StorageError",
                message,
            },
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        let message = err.to_string();
        match err {
            StoreError::NoRemote | StoreError::Remote(_) => Self::RemoteError { message },
            StoreError::DuplicateId(_) => Self::DuplicateId { message },
            StoreError::Mirror(_) => Self::InternalError {
                kind: "StorageError",
                message,
            },
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Unknown {
            message: err.to_string(),
        }
    }
}
