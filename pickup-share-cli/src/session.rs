//! Opening the configured store and running a sync engine against it.

use pickup_share_core::{
    DocumentStore, EngineConfig, EngineHandle, EngineState, FileStore, FirestoreStore,
    MemoryStore, SyncEngine, WeekKey,
};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::config::{Config, StoreBackend};

/// How long to wait for a week's document before giving up.
pub const OPEN_TIMEOUT: Duration = Duration::from_secs(10);

/// How long to wait for an outstanding write before exiting.
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the document store selected by the configuration.
pub fn open_store(config: &Config) -> Result<Arc<dyn DocumentStore>, Box<dyn Error>> {
    let store: Arc<dyn DocumentStore> = match config.store.value {
        StoreBackend::File => {
            let mut store = FileStore::new(config.data_dir.value.clone());
            if let Some(ms) = config.file.poll_interval_ms {
                store = store.with_poll_interval(Duration::from_millis(ms));
            }
            tracing::debug!("using file store at {}", store.data_dir().display());
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store; changes are not shared or kept");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Firestore => {
            let firestore = &config.firestore;
            let project_id = firestore.project_id.clone().ok_or(
                "Firestore store needs firestore.project_id (or PICKUP_FIRESTORE_PROJECT)",
            )?;

            let mut store = FirestoreStore::new(project_id);
            if let Some(api_key) = &firestore.api_key {
                store = store.with_api_key(api_key);
            }
            if let Some(collection) = &firestore.collection {
                store = store.with_collection(collection);
            }
            if let Some(base_url) = &firestore.base_url {
                store = store.with_base_url(base_url);
            }
            if let Some(ms) = firestore.poll_interval_ms {
                store = store.with_poll_interval(Duration::from_millis(ms));
            }
            Arc::new(store)
        }
    };
    Ok(store)
}

/// A running sync engine for the configured room.
pub struct Session {
    handle: EngineHandle,
    task: JoinHandle<()>,
}

impl Session {
    /// Starts an engine and loads `week`.
    pub async fn open(config: &Config, week: WeekKey) -> Result<Self, Box<dyn Error>> {
        let store = open_store(config)?;
        let engine_config = EngineConfig::new(config.room_id.value.clone());
        let (engine, handle) = SyncEngine::new(engine_config, store);
        let session = Self {
            handle,
            task: tokio::spawn(engine.run()),
        };
        session.show_week(week).await?;
        Ok(session)
    }

    pub fn handle(&self) -> &EngineHandle {
        &self.handle
    }

    /// Switches to `week` and waits until its document has been loaded.
    pub async fn show_week(&self, week: WeekKey) -> Result<EngineState, Box<dyn Error>> {
        self.handle.activate(week)?;
        let state = timeout(
            OPEN_TIMEOUT,
            self.handle.wait_until(|state| state.is_showing(week)),
        )
        .await
        .map_err(|_| format!("Timed out loading week {}", week))??;
        Ok(state)
    }

    /// Waits until every queued command was handled and its write, if
    /// any, has gone out.
    pub async fn settle(&self) -> Result<EngineState, Box<dyn Error>> {
        self.handle.barrier().await?;
        let state = timeout(
            WRITE_TIMEOUT,
            self.handle.wait_until(|state| !state.write_pending),
        )
        .await
        .map_err(|_| "Timed out saving changes")??;
        Ok(state)
    }

    /// Stops the engine. Unsent writes are dropped.
    pub async fn close(self) {
        let _ = self.handle.shutdown();
        if let Err(e) = self.task.await {
            tracing::warn!("sync engine task failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigSource, ConfigValue};
    use pickup_share_core::{Assignee, DaySlot, Duty};
    use tempfile::tempdir;

    fn file_config(dir: &std::path::Path) -> Config {
        let mut config = Config::load(Some(dir.join("missing.yaml"))).unwrap();
        config.data_dir = ConfigValue::new(dir.join("docs"), ConfigSource::File);
        config.store = ConfigValue::new(StoreBackend::File, ConfigSource::File);
        config
    }

    #[test]
    fn test_firestore_requires_project() {
        let temp_dir = tempdir().unwrap();
        let mut config = file_config(temp_dir.path());
        config.store = ConfigValue::new(StoreBackend::Firestore, ConfigSource::File);
        config.firestore.project_id = None;

        let err = open_store(&config).err().unwrap();
        assert!(err.to_string().contains("project_id"));
    }

    #[tokio::test]
    async fn test_edit_is_saved_to_file_store() {
        let temp_dir = tempdir().unwrap();
        let config = file_config(temp_dir.path());
        let week: WeekKey = "2024-06-05".parse().unwrap();

        let session = Session::open(&config, week).await.unwrap();
        session
            .handle()
            .set_assignee(DaySlot::Wed, Duty::Morning, Assignee::B)
            .unwrap();
        let state = session.settle().await.unwrap();
        assert_eq!(state.writes_sent, 1);
        session.close().await;

        let reopened = Session::open(&config, week).await.unwrap();
        let state = reopened.handle().state();
        assert_eq!(
            state.schedule.day(DaySlot::Wed).morning_assignee,
            Assignee::B
        );
        reopened.close().await;

        assert!(temp_dir.path().join("docs/family_2024-06-03.json").exists());
    }
}
