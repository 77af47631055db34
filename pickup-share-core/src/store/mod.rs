//! Remote document storage.
//!
//! A store holds one [`Schedule`] per [`DocumentKey`] and offers three
//! operations: point read, full overwrite, and a live subscription that
//! delivers the current contents immediately and again after every change
//! (the subscriber's own writes included). There are no transactions and no
//! partial updates.
//!
//! Implementations:
//! - [`MemoryStore`]: in-process, push-based; used by tests and demos
//! - [`FileStore`]: one JSON file per document in a local directory
//! - [`FirestoreStore`]: Cloud Firestore over its REST API

mod file;
mod firestore;
mod memory;
mod poll;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::document_key::DocumentKey;
use crate::models::Schedule;

pub use file::FileStore;
pub use firestore::FirestoreStore;
pub use memory::MemoryStore;
pub use poll::{spawn_polling, DEFAULT_POLL_INTERVAL};

/// Errors that can occur talking to a document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Request could not be sent or the response could not be read.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The store answered with an unexpected status.
    #[error("Store returned status {status} for {key}")]
    Status { key: String, status: u16 },

    /// I/O error reading or writing a document file.
    #[error("I/O error for {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    /// The stored payload is not a schedule.
    #[error("Failed to decode document {0}: {1}")]
    Decode(String, String),
}

/// The contents of a document at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub key: DocumentKey,
    /// `None` when the document does not exist.
    pub data: Option<Schedule>,
}

impl DocumentSnapshot {
    pub fn exists(&self) -> bool {
        self.data.is_some()
    }
}

/// A live feed of snapshots for one document.
///
/// Dropping the subscription cancels it: producers notice the closed
/// channel and stop.
#[derive(Debug)]
pub struct Subscription {
    key: DocumentKey,
    receiver: mpsc::UnboundedReceiver<DocumentSnapshot>,
}

impl Subscription {
    /// Creates a subscription and the sender its producer feeds.
    pub fn channel(key: DocumentKey) -> (mpsc::UnboundedSender<DocumentSnapshot>, Self) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (sender, Self { key, receiver })
    }

    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    /// Waits for the next snapshot. Returns `None` once the producer is gone.
    pub async fn next(&mut self) -> Option<DocumentSnapshot> {
        self.receiver.recv().await
    }
}

/// Keyed storage of schedule documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads a document. `Ok(None)` means it doesn't exist.
    async fn get(&self, key: &DocumentKey) -> Result<Option<Schedule>, StoreError>;

    /// Creates or fully replaces a document.
    async fn set(&self, key: &DocumentKey, schedule: &Schedule) -> Result<(), StoreError>;

    /// Opens a live subscription to a document.
    async fn subscribe(&self, key: &DocumentKey) -> Result<Subscription, StoreError>;
}

#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    async fn get(&self, key: &DocumentKey) -> Result<Option<Schedule>, StoreError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &DocumentKey, schedule: &Schedule) -> Result<(), StoreError> {
        (**self).set(key, schedule).await
    }

    async fn subscribe(&self, key: &DocumentKey) -> Result<Subscription, StoreError> {
        (**self).subscribe(key).await
    }
}
