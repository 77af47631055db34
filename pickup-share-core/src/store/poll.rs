//! Subscriptions for stores that can only be read, not watched.

use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};

use super::{DocumentSnapshot, DocumentStore, Subscription};
use crate::document_key::DocumentKey;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Emulates a live subscription by re-reading a document on a fixed interval.
///
/// The first read is delivered immediately; after that a snapshot is only
/// delivered when the contents differ from the last one delivered. Read
/// errors are logged and polling carries on. The task exits once the
/// returned [`Subscription`] is dropped.
pub fn spawn_polling<S>(store: S, key: DocumentKey, every: Duration) -> Subscription
where
    S: DocumentStore + 'static,
{
    let (sender, subscription) = Subscription::channel(key.clone());

    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last = None;

        loop {
            tokio::select! {
                _ = sender.closed() => break,
                _ = ticker.tick() => {
                    let data = match store.get(&key).await {
                        Ok(data) => data,
                        Err(e) => {
                            tracing::debug!(%key, "poll failed: {}", e);
                            continue;
                        }
                    };
                    if last.as_ref() == Some(&data) {
                        continue;
                    }
                    last = Some(data.clone());
                    let snapshot = DocumentSnapshot { key: key.clone(), data };
                    if sender.send(snapshot).is_err() {
                        break;
                    }
                }
            }
        }
        tracing::debug!(%key, "polling stopped");
    });

    subscription
}
