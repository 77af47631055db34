//! Directory-backed document store.
//!
//! Documents are stored as pretty-printed JSON, one file per key:
//! ```text
//! <DATA_DIR>/
//!   family_2024-06-03.json
//!   family_2024-06-10.json
//! ```

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use super::poll::{spawn_polling, DEFAULT_POLL_INTERVAL};
use super::{DocumentStore, StoreError, Subscription};
use crate::document_key::DocumentKey;
use crate::models::Schedule;

/// Stores each document as a JSON file in a local directory.
///
/// Several processes may share a directory; subscriptions poll the file.
#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
    poll_interval: Duration,
}

impl FileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, every: Duration) -> Self {
        self.poll_interval = every;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Returns the full path for a document.
    pub fn path(&self, key: &DocumentKey) -> PathBuf {
        self.data_dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn get(&self, key: &DocumentKey) -> Result<Option<Schedule>, StoreError> {
        let path = self.path(key);

        match fs::read(&path).await {
            Ok(bytes) => {
                let schedule = serde_json::from_slice(&bytes)
                    .map_err(|e| StoreError::Decode(key.to_string(), e.to_string()))?;
                Ok(Some(schedule))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(path, e)),
        }
    }

    async fn set(&self, key: &DocumentKey, schedule: &Schedule) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| StoreError::Io(self.data_dir.clone(), e))?;

        let path = self.path(key);
        let bytes = serde_json::to_vec_pretty(schedule)
            .map_err(|e| StoreError::Decode(key.to_string(), e.to_string()))?;

        // Write atomically using temp file + rename so pollers never see a
        // half-written document.
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &bytes)
            .await
            .map_err(|e| StoreError::Io(temp_path.clone(), e))?;
        fs::rename(&temp_path, &path)
            .await
            .map_err(|e| StoreError::Io(path, e))?;

        Ok(())
    }

    async fn subscribe(&self, key: &DocumentKey) -> Result<Subscription, StoreError> {
        Ok(spawn_polling(self.clone(), key.clone(), self.poll_interval))
    }
}
