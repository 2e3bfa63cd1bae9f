use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::Value;

use super::{EmployeeStore, StoreError};
use crate::io::BlobStorage;
use crate::models::Employee;

pub const MIRROR_KEY: &str = "hr_employees";

/// The offline copy of the directory: one JSON array under a single blob key,
/// read and rewritten whole on every operation.
#[derive(Clone)]
pub struct LocalMirror {
    storage: Arc<dyn BlobStorage>,
    key: String,
}

impl LocalMirror {
    pub fn new(storage: Arc<dyn BlobStorage>) -> Self {
        Self::with_key(storage, MIRROR_KEY)
    }

    pub fn with_key<S: Into<String>>(storage: Arc<dyn BlobStorage>, key: S) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(crate::io::MemoryStorage::new()))
    }

    async fn read(&self) -> Result<Contents, StoreError> {
        let raw = match self.storage.get(&self.key).await? {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => return Ok(Contents::Records(Vec::new())),
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(records)) => Ok(Contents::Records(records)),
            Ok(_) => Ok(Contents::Unreadable("not a JSON array".to_string())),
            Err(err) => Ok(Contents::Unreadable(err.to_string())),
        }
    }

    /// Raw records, or an empty list when the blob cannot be parsed at all.
    async fn records(&self) -> Result<Vec<Value>, StoreError> {
        match self.read().await? {
            Contents::Records(records) => Ok(records),
            Contents::Unreadable(reason) => {
                log::error!("Failed to parse employees from `{}`: {}", self.key, reason);
                Ok(Vec::new())
            }
        }
    }

    async fn load(&self) -> Result<Vec<Employee>, StoreError> {
        let records = self.records().await?;
        let employees = records
            .into_iter()
            .filter_map(|record| match serde_json::from_value::<Employee>(record) {
                Ok(employee) => Some(employee),
                Err(err) => {
                    log::warn!("Skipping unreadable employee record in `{}`: {}", self.key, err);
                    None
                }
            })
            .collect();
        Ok(employees)
    }

    async fn save(&self, records: &[Value]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(records).map_err(anyhow::Error::from)?;
        self.storage.set(&self.key, raw).await?;
        Ok(())
    }
}

/// What the mirror blob holds before records are decoded.
enum Contents {
    Records(Vec<Value>),
    Unreadable(String),
}

fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

#[async_trait]
impl EmployeeStore for LocalMirror {
    async fn find_by_id(&self, id: &str) -> Result<Option<Employee>, StoreError> {
        Ok(self.load().await?.into_iter().find(|emp| emp.id == id))
    }

    /// Counts records that no longer decode, so their ids stay taken.
    async fn exists(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self
            .records()
            .await?
            .iter()
            .any(|record| record_id(record) == Some(id)))
    }

    /// Appends to the stored records as they are; records this build cannot
    /// decode are written back untouched. A blob that is not a JSON array is
    /// never overwritten.
    async fn insert(&self, employee: &Employee) -> Result<(), StoreError> {
        let mut records = match self.read().await? {
            Contents::Records(records) => records,
            Contents::Unreadable(reason) => {
                log::error!("Refusing to overwrite unreadable mirror `{}`: {}", self.key, reason);
                return Err(StoreError::Mirror(anyhow!(
                    "refusing to overwrite unreadable blob `{}`: {}",
                    self.key,
                    reason
                )));
            }
        };
        if records.iter().any(|record| record_id(record) == Some(employee.id.as_str())) {
            return Err(StoreError::DuplicateId(employee.id.clone()));
        }
        records.push(serde_json::to_value(employee).map_err(anyhow::Error::from)?);
        self.save(&records).await
    }

    async fn list(&self) -> Result<Vec<Employee>, StoreError> {
        self.load().await
    }
}
