pub mod auth;
pub mod config;
pub mod err;
pub mod flow;
pub mod io;
pub mod models;
pub mod session;
pub mod store;

use std::sync::Arc;

use axum::{routing::get, routing::post, Extension, Router};
use serde::Serialize;

use crate::config::Config;
use crate::err::{Error, Fine, Maybe, Nothing};
use crate::flow::FormVariant;
use crate::io::{FileStorage, MemoryStorage};
use crate::models::EmployeeProfile;
use crate::session::SessionSlot;
use crate::store::{Directory, LocalMirror, RemoteStore, Source};

pub type Payload<T> = Result<Maybe<T>, Error>;

pub fn proceeds<V>(value: V) -> Payload<V>
where
    V: Serialize,
{
    Ok(Fine(value))
}

pub fn breaks<V>(err: Error) -> Payload<V>
where
    V: Serialize,
{
    Ok(Nothing(err))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let storage = FileStorage::open(config.data_dir.clone()).await?;
    log::info!(
        "Local mirror at {}, {:?} registration form",
        storage.root().display(),
        config.form_variant
    );
    let mirror = LocalMirror::new(Arc::new(storage));

    let directory = match &config.database_url {
        Some(url) => {
            let remote = RemoteStore::connect_lazy(url, config.db_max_connections)?;
            log::info!("Using remote record service for employees");
            Directory::new(Some(Arc::new(remote)), mirror)
        }
        None => {
            log::warn!("DATABASE_URL is not set, employees are kept in the local mirror only");
            Directory::local_only(mirror)
        }
    };
    let sessions = SessionSlot::new(Arc::new(MemoryStorage::new()));
    let app = router(directory, sessions, config.form_variant);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    log::info!("Starting Employee Directory HTTP Server on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn router(directory: Directory, sessions: SessionSlot, variant: FormVariant) -> Router {
    Router::new()
        .route("/employee/register", post(auth::register_employee))
        .route("/employee/login", post(auth::login_employee))
        .route("/employee/list", get(list_employees))
        .route("/session", get(auth::current_session))
        .route("/session/logout", post(auth::logout))
        .fallback(err::handler404)
        .layer(Extension(directory))
        .layer(Extension(sessions))
        .layer(Extension(variant))
}

async fn list_employees(Extension(directory): Extension<Directory>) -> Payload<EmployeeListing> {
    let listing = directory.list().await.map_err(|err| {
        log::error!("Failed to list employees: {}", err);
        Error::from(err)
    })?;

    let employees: Vec<EmployeeProfile> = listing
        .employees
        .into_iter()
        .map(EmployeeProfile::from)
        .collect();
    proceeds(EmployeeListing {
        count: employees.len(),
        source: listing.source,
        employees,
    })
}

#[derive(Debug, Clone, Serialize)]
struct EmployeeListing {
    count: usize,
    source: Source,
    employees: Vec<EmployeeProfile>,
}
