//! Where employee records live: the remote record service when one is
//! configured, and the local mirror otherwise.

pub mod mirror;
pub mod remote;

#[cfg(test)]
pub mod fake;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::models::Employee;

pub use mirror::LocalMirror;
pub use remote::RemoteStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no remote record service is configured")]
    NoRemote,
    #[error("employee id `{0}` is already registered")]
    DuplicateId(String),
    #[error("remote record service failed: {0}")]
    Remote(#[from] sqlx::Error),
    #[error("local mirror failed: {0}")]
    Mirror(#[from] anyhow::Error),
}

/// Which backend answered.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Remote,
    Local,
}

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Looks an employee up by id. Absence is `Ok(None)`, never an error.
    async fn find_by_id(&self, id: &str) -> Result<Option<Employee>, StoreError>;

    async fn exists(&self, id: &str) -> Result<bool, StoreError>;

    /// Stores a new record. Callers check `exists` first; the check and the
    /// insert are not atomic.
    async fn insert(&self, employee: &Employee) -> Result<(), StoreError>;

    async fn list(&self) -> Result<Vec<Employee>, StoreError>;
}

#[derive(Debug, Clone)]
pub struct Listing {
    pub source: Source,
    pub employees: Vec<Employee>,
}

/// Backends chosen once at startup.
#[derive(Clone)]
pub struct Directory {
    remote: Option<Arc<dyn EmployeeStore>>,
    mirror: LocalMirror,
}

impl Directory {
    pub fn new(remote: Option<Arc<dyn EmployeeStore>>, mirror: LocalMirror) -> Self {
        Self { remote, mirror }
    }

    pub fn local_only(mirror: LocalMirror) -> Self {
        Self::new(None, mirror)
    }

    pub fn remote(&self) -> Result<&dyn EmployeeStore, StoreError> {
        self.remote.as_deref().ok_or(StoreError::NoRemote)
    }

    pub fn mirror(&self) -> &LocalMirror {
        &self.mirror
    }

    /// Remote listing (newest first) when a remote is configured, the mirror
    /// in insertion order otherwise.
    pub async fn list(&self) -> Result<Listing, StoreError> {
        match self.remote() {
            Ok(remote) => Ok(Listing {
                source: Source::Remote,
                employees: remote.list().await?,
            }),
            Err(StoreError::NoRemote) => Ok(Listing {
                source: Source::Local,
                employees: self.mirror.list().await?,
            }),
            Err(err) => Err(err),
        }
    }
}
