use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::flow::{self, FormVariant, LoggedIn, Registered, RegistrationForm};
use crate::models::SessionMarker;
use crate::session::SessionSlot;
use crate::store::{Directory, Source};
use crate::{breaks, proceeds, Error, Payload};

pub async fn register_employee(
    Extension(directory): Extension<Directory>,
    Extension(variant): Extension<FormVariant>,
    Json(form): Json<RegistrationForm>,
) -> Payload<Registered> {
    let registered = flow::register(&directory, &form, variant)
        .await
        .map_err(Error::from)?;

    proceeds(registered)
}

pub async fn login_employee(
    Extension(directory): Extension<Directory>,
    Extension(sessions): Extension<SessionSlot>,
    Json(login): Json<LoginEmployee>,
) -> Payload<LoggedInEmployee> {
    let logged_in = flow::login(&directory, &login.id, &login.password)
        .await
        .map_err(Error::from)?;

    // a local match proves nothing to the remote: it gets no session, and an
    // earlier remote session must not outlive it
    let session = if logged_in.source == Source::Remote {
        match sessions
            .establish(logged_in.employee_id.as_str(), logged_in.name.as_str())
            .await
        {
            Ok(marker) => Some(marker),
            Err(err) => {
                log::warn!("Failed to store session marker: {}", err);
                None
            }
        }
    } else {
        if let Err(err) = sessions.clear().await {
            log::warn!("Failed to clear session marker: {}", err);
        }
        None
    };

    proceeds(LoggedInEmployee {
        logged_in,
        session,
    })
}

pub async fn current_session(Extension(sessions): Extension<SessionSlot>) -> Payload<CurrentSession> {
    match sessions.current().await? {
        Some(session) => proceeds(CurrentSession { session }),
        None => breaks(Error::NoSession {
            message: "Nobody is logged in".to_string(),
        }),
    }
}

pub async fn logout(Extension(sessions): Extension<SessionSlot>) -> Payload<SessionDropped> {
    let dropped = sessions.clear().await?;
    proceeds(SessionDropped { dropped })
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginEmployee {
    #[serde(default)]
    id: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoggedInEmployee {
    #[serde(flatten)]
    logged_in: LoggedIn,
    session: Option<SessionMarker>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentSession {
    session: SessionMarker,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionDropped {
    dropped: bool,
}
