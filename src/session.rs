use std::sync::Arc;

use chrono::Utc;

use crate::io::BlobStorage;
use crate::models::SessionMarker;

pub const SESSION_KEY: &str = "hr_current_employee";

/// Remembers who is logged in for as long as the backing storage lives.
#[derive(Clone)]
pub struct SessionSlot {
    storage: Arc<dyn BlobStorage>,
}

impl SessionSlot {
    pub fn new(storage: Arc<dyn BlobStorage>) -> Self {
        Self { storage }
    }

    pub async fn establish<I, N>(&self, id: I, name: N) -> anyhow::Result<SessionMarker>
    where
        I: Into<String>,
        N: Into<String>,
    {
        let marker = SessionMarker {
            id: id.into(),
            name: name.into(),
            login_at: Utc::now(),
        };
        self.storage
            .set(SESSION_KEY, serde_json::to_string(&marker)?)
            .await?;
        Ok(marker)
    }

    pub async fn current(&self) -> anyhow::Result<Option<SessionMarker>> {
        let raw = match self.storage.get(SESSION_KEY).await? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        match serde_json::from_str(&raw) {
            Ok(marker) => Ok(Some(marker)),
            Err(err) => {
                log::warn!("Discarding unreadable session marker: {}", err);
                Ok(None)
            }
        }
    }

    /// Returns whether a marker was present.
    pub async fn clear(&self) -> anyhow::Result<bool> {
        self.storage.remove(SESSION_KEY).await
    }
}
