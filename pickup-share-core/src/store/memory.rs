//! In-process document store with push notifications.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::Mutex;

use super::{DocumentSnapshot, DocumentStore, StoreError, Subscription};
use crate::document_key::DocumentKey;
use crate::models::Schedule;

/// Buffered updates per document before slow subscribers start skipping.
const CHANNEL_CAPACITY: usize = 16;

/// A document store held entirely in memory.
///
/// Every write is broadcast to all subscribers of that document, including
/// the writer's own subscription.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    documents: HashMap<DocumentKey, Schedule>,
    /// Broadcast channels per document key
    channels: HashMap<DocumentKey, broadcast::Sender<Option<Schedule>>>,
}

impl Inner {
    fn notify(&mut self, key: &DocumentKey, data: Option<Schedule>) {
        // Sending fails only when every subscriber is gone
        let abandoned = match self.channels.get(key) {
            Some(sender) => sender.send(data).is_err(),
            None => false,
        };
        if abandoned {
            self.channels.remove(key);
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes a document. Subscribers receive a missing-document snapshot.
    ///
    /// Returns whether the document existed.
    pub async fn delete(&self, key: &DocumentKey) -> bool {
        let mut inner = self.inner.lock().await;
        let existed = inner.documents.remove(key).is_some();
        if existed {
            inner.notify(key, None);
        }
        existed
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, key: &DocumentKey) -> Result<Option<Schedule>, StoreError> {
        Ok(self.inner.lock().await.documents.get(key).cloned())
    }

    async fn set(&self, key: &DocumentKey, schedule: &Schedule) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.documents.insert(key.clone(), schedule.clone());
        inner.notify(key, Some(schedule.clone()));
        Ok(())
    }

    async fn subscribe(&self, key: &DocumentKey) -> Result<Subscription, StoreError> {
        // Read the current value and join the channel under one lock so no
        // write can slip in between.
        let (current, mut updates) = {
            let mut inner = self.inner.lock().await;
            let current = inner.documents.get(key).cloned();
            inner.channels.retain(|_, sender| sender.receiver_count() > 0);
            let updates = inner
                .channels
                .entry(key.clone())
                .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
                .subscribe();
            (current, updates)
        };

        let (sender, subscription) = Subscription::channel(key.clone());
        let _ = sender.send(DocumentSnapshot {
            key: key.clone(),
            data: current,
        });

        let key = key.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = sender.closed() => break,
                    update = updates.recv() => match update {
                        Ok(data) => {
                            let snapshot = DocumentSnapshot { key: key.clone(), data };
                            if sender.send(snapshot).is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            // Snapshots carry whole documents, so the next one catches up.
                            tracing::debug!(%key, "subscriber skipped {} updates", skipped);
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
        });

        Ok(subscription)
    }
}
