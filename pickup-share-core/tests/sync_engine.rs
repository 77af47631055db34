//! End-to-end behaviour of the sync engine against in-memory stores, both
//! push-based and polled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pickup_share_core::store::spawn_polling;
use pickup_share_core::{
    Assignee, DaySlot, DocumentKey, DocumentStore, Duty, EngineConfig, EngineHandle, EngineState,
    MemoryStore, RoomId, Schedule, StoreError, Subscription, SyncEngine, WeekKey,
};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

/// Wraps a [`MemoryStore`], recording every write the engine makes.
///
/// Writes through `remote` stand in for another device and are not recorded.
/// With `poll_every` set, subscriptions re-read the document on that interval
/// instead of being pushed every change.
#[derive(Default)]
struct RecordingStore {
    remote: Arc<MemoryStore>,
    writes: Mutex<Vec<(DocumentKey, Schedule)>>,
    fail_writes: AtomicBool,
    poll_every: Option<Duration>,
}

impl RecordingStore {
    fn polling(every: Duration) -> Self {
        Self {
            poll_every: Some(every),
            ..Self::default()
        }
    }

    fn writes(&self) -> Vec<(DocumentKey, Schedule)> {
        self.writes.lock().unwrap().clone()
    }

    fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn get(&self, key: &DocumentKey) -> Result<Option<Schedule>, StoreError> {
        self.remote.get(key).await
    }

    async fn set(&self, key: &DocumentKey, schedule: &Schedule) -> Result<(), StoreError> {
        self.writes
            .lock()
            .unwrap()
            .push((key.clone(), schedule.clone()));
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Http("connection reset".to_string()));
        }
        self.remote.set(key, schedule).await
    }

    async fn subscribe(&self, key: &DocumentKey) -> Result<Subscription, StoreError> {
        match self.poll_every {
            Some(every) => Ok(spawn_polling(self.remote.clone(), key.clone(), every)),
            None => self.remote.subscribe(key).await,
        }
    }
}

fn room() -> RoomId {
    RoomId::new("family").unwrap()
}

fn week(s: &str) -> WeekKey {
    s.parse().unwrap()
}

fn key(s: &str) -> DocumentKey {
    DocumentKey::new(room(), week(s))
}

fn start(store: Arc<RecordingStore>) -> (EngineHandle, JoinHandle<()>) {
    let (engine, handle) = SyncEngine::new(EngineConfig::new(room()), store);
    (handle, tokio::spawn(engine.run()))
}

async fn wait(handle: &EngineHandle, condition: impl FnMut(&EngineState) -> bool) -> EngineState {
    timeout(Duration::from_secs(30), handle.wait_until(condition))
        .await
        .expect("engine state never matched")
        .unwrap()
}

async fn open(handle: &EngineHandle, s: &str) -> EngineState {
    let w = week(s);
    handle.activate(w).unwrap();
    wait(handle, |state| state.is_showing(w)).await
}

/// Lets every timer that is due within the next second fire.
async fn settle() {
    sleep(Duration::from_secs(1)).await;
}

#[tokio::test(start_paused = true)]
async fn test_activation_creates_default_document() {
    let store = Arc::new(RecordingStore::default());
    let (handle, _task) = start(store.clone());

    let state = open(&handle, "2024-06-03").await;

    assert_eq!(state.schedule, Schedule::default());
    assert!(!state.can_undo);
    assert_eq!(store.writes(), vec![(key("2024-06-03"), Schedule::default())]);
    assert_eq!(
        store.remote.get(&key("2024-06-03")).await.unwrap(),
        Some(Schedule::default())
    );
}

#[tokio::test(start_paused = true)]
async fn test_activation_keeps_existing_document() {
    let store = Arc::new(RecordingStore::default());
    let existing = Schedule::default().with_assignee(DaySlot::Thu, Duty::Evening, Assignee::C);
    store.remote.set(&key("2024-06-03"), &existing).await.unwrap();
    let (handle, _task) = start(store.clone());

    let state = open(&handle, "2024-06-03").await;

    assert_eq!(state.schedule, existing);
    assert_eq!(store.write_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_single_edit_writes_once_after_quiet_period() {
    let store = Arc::new(RecordingStore::default());
    let (handle, _task) = start(store.clone());
    open(&handle, "2024-06-03").await;

    handle
        .set_assignee(DaySlot::Mon, Duty::Morning, Assignee::B)
        .unwrap();
    handle.barrier().await.unwrap();
    assert!(handle.state().write_pending);

    sleep(Duration::from_millis(300)).await;
    assert_eq!(store.write_count(), 1);

    settle().await;
    let expected = Schedule::default().with_assignee(DaySlot::Mon, Duty::Morning, Assignee::B);
    assert_eq!(
        store.writes(),
        vec![
            (key("2024-06-03"), Schedule::default()),
            (key("2024-06-03"), expected.clone()),
        ]
    );

    let state = handle.state();
    assert!(!state.write_pending);
    assert_eq!(state.writes_sent, 1);
    assert_eq!(state.schedule, expected);
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_edits_is_coalesced() {
    let store = Arc::new(RecordingStore::default());
    let (handle, _task) = start(store.clone());
    open(&handle, "2024-06-03").await;

    for (day, who) in [
        (DaySlot::Mon, Assignee::A),
        (DaySlot::Tue, Assignee::B),
        (DaySlot::Wed, Assignee::C),
        (DaySlot::Thu, Assignee::D),
    ] {
        handle.set_assignee(day, Duty::Evening, who).unwrap();
        sleep(Duration::from_millis(200)).await;
    }
    handle
        .set_note(DaySlot::Fri, Duty::Morning, "half day")
        .unwrap();
    settle().await;

    let writes = store.writes();
    assert_eq!(writes.len(), 2);
    let latest = &writes[1].1;
    assert_eq!(latest.day(DaySlot::Thu).evening_assignee, Assignee::D);
    assert_eq!(latest.day(DaySlot::Mon).evening_assignee, Assignee::A);
    assert_eq!(latest.day(DaySlot::Fri).note(Duty::Morning), Some("half day"));
}

#[tokio::test(start_paused = true)]
async fn test_remote_snapshot_is_not_written_back() {
    let store = Arc::new(RecordingStore::default());
    let (handle, _task) = start(store.clone());
    open(&handle, "2024-06-03").await;

    let remote = Schedule::default().with_assignee(DaySlot::Wed, Duty::Morning, Assignee::D);
    store.remote.set(&key("2024-06-03"), &remote).await.unwrap();
    let state = wait(&handle, |state| state.schedule == remote).await;
    assert!(!state.write_pending);
    assert!(!state.can_undo);

    settle().await;
    assert_eq!(store.write_count(), 1);

    // the next local edit goes out, exactly once
    handle
        .set_assignee(DaySlot::Fri, Duty::Evening, Assignee::A)
        .unwrap();
    settle().await;

    let writes = store.writes();
    assert_eq!(writes.len(), 2);
    assert_eq!(
        writes[1].1,
        remote.with_assignee(DaySlot::Fri, Duty::Evening, Assignee::A)
    );
}

#[tokio::test(start_paused = true)]
async fn test_navigating_drops_pending_write() {
    let store = Arc::new(RecordingStore::default());
    let (handle, _task) = start(store.clone());
    open(&handle, "2024-06-03").await;

    handle
        .set_assignee(DaySlot::Mon, Duty::Morning, Assignee::B)
        .unwrap();
    handle.next_week().unwrap();
    let state = wait(&handle, |state| state.is_showing(week("2024-06-10"))).await;
    assert_eq!(state.schedule, Schedule::default());
    assert!(!state.can_undo);

    settle().await;

    assert_eq!(
        store.writes(),
        vec![
            (key("2024-06-03"), Schedule::default()),
            (key("2024-06-10"), Schedule::default()),
        ]
    );
    assert_eq!(handle.state().writes_sent, 0);
}

#[tokio::test(start_paused = true)]
async fn test_previous_week_and_snapshots_of_old_week() {
    let store = Arc::new(RecordingStore::default());
    let (handle, _task) = start(store.clone());
    open(&handle, "2024-06-10").await;

    handle.previous_week().unwrap();
    wait(&handle, |state| state.is_showing(week("2024-06-03"))).await;

    // the week left behind is no longer followed
    let elsewhere = Schedule::default().with_assignee(DaySlot::Mon, Duty::Morning, Assignee::C);
    store.remote.set(&key("2024-06-10"), &elsewhere).await.unwrap();
    settle().await;

    let state = handle.state();
    assert_eq!(state.week, Some(week("2024-06-03")));
    assert_eq!(state.schedule, Schedule::default());
}

#[tokio::test(start_paused = true)]
async fn test_reactivating_same_week_is_noop() {
    let store = Arc::new(RecordingStore::default());
    let (handle, _task) = start(store.clone());
    open(&handle, "2024-06-03").await;

    handle
        .set_assignee(DaySlot::Tue, Duty::Morning, Assignee::A)
        .unwrap();
    handle.activate(week("2024-06-05")).unwrap();
    handle.barrier().await.unwrap();

    let state = handle.state();
    assert!(state.loaded);
    assert!(state.can_undo);
    assert!(state.write_pending);

    settle().await;
    assert_eq!(store.write_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_undo_schedules_write_of_restored_state() {
    let store = Arc::new(RecordingStore::default());
    let (handle, _task) = start(store.clone());
    open(&handle, "2024-06-03").await;

    handle
        .set_assignee(DaySlot::Mon, Duty::Evening, Assignee::D)
        .unwrap();
    handle.undo().unwrap();
    handle.barrier().await.unwrap();
    let state = handle.state();
    assert!(state.can_redo);
    assert!(state.write_pending);

    settle().await;
    let writes = store.writes();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[1].1, Schedule::default());

    // nothing to undo any more: no write is scheduled
    handle.undo().unwrap();
    handle.barrier().await.unwrap();
    assert!(!handle.state().write_pending);
}

#[tokio::test(start_paused = true)]
async fn test_redo_schedules_write() {
    let store = Arc::new(RecordingStore::default());
    let (handle, _task) = start(store.clone());
    open(&handle, "2024-06-03").await;

    handle
        .set_assignee(DaySlot::Wed, Duty::Evening, Assignee::B)
        .unwrap();
    handle.undo().unwrap();
    handle.redo().unwrap();
    settle().await;

    let writes = store.writes();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[1].1.day(DaySlot::Wed).evening_assignee, Assignee::B);
}

#[tokio::test(start_paused = true)]
async fn test_remote_delete_leaves_local_state() {
    let store = Arc::new(RecordingStore::default());
    let (handle, _task) = start(store.clone());
    open(&handle, "2024-06-03").await;

    let remote = Schedule::default().with_note(DaySlot::Tue, Duty::Morning, "doctor");
    store.remote.set(&key("2024-06-03"), &remote).await.unwrap();
    wait(&handle, |state| state.schedule == remote).await;

    assert!(store.remote.delete(&key("2024-06-03")).await);
    settle().await;

    let state = handle.state();
    assert_eq!(state.schedule, remote);
    assert!(state.loaded);
    assert_eq!(store.write_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_drops_pending_write() {
    let store = Arc::new(RecordingStore::default());
    let (handle, task) = start(store.clone());
    open(&handle, "2024-06-03").await;

    handle
        .set_assignee(DaySlot::Fri, Duty::Morning, Assignee::C)
        .unwrap();
    handle.shutdown().unwrap();
    task.await.unwrap();
    settle().await;

    assert_eq!(store.write_count(), 1);
    assert!(handle.set_note(DaySlot::Mon, Duty::Morning, "late").is_err());
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handles_stops_engine() {
    let store = Arc::new(RecordingStore::default());
    let (handle, task) = start(store.clone());
    open(&handle, "2024-06-03").await;

    drop(handle);
    timeout(Duration::from_secs(5), task)
        .await
        .expect("engine kept running")
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_write_failure_is_swallowed() {
    let store = Arc::new(RecordingStore::default());
    let (handle, _task) = start(store.clone());
    open(&handle, "2024-06-03").await;
    store.fail_writes.store(true, Ordering::SeqCst);

    handle
        .set_assignee(DaySlot::Mon, Duty::Morning, Assignee::A)
        .unwrap();
    settle().await;

    let state = handle.state();
    assert_eq!(state.writes_sent, 1);
    assert!(!state.write_pending);
    assert_eq!(state.schedule.day(DaySlot::Mon).morning_assignee, Assignee::A);

    // still accepting work
    store.fail_writes.store(false, Ordering::SeqCst);
    handle
        .set_assignee(DaySlot::Mon, Duty::Evening, Assignee::B)
        .unwrap();
    settle().await;

    assert_eq!(handle.state().writes_sent, 2);
    let stored = store.remote.get(&key("2024-06-03")).await.unwrap().unwrap();
    assert_eq!(stored.day(DaySlot::Mon).morning_assignee, Assignee::A);
    assert_eq!(stored.day(DaySlot::Mon).evening_assignee, Assignee::B);
}

#[tokio::test(start_paused = true)]
async fn test_commands_before_activation_are_local_only() {
    let store = Arc::new(RecordingStore::default());
    let (handle, _task) = start(store.clone());

    handle
        .set_assignee(DaySlot::Mon, Duty::Morning, Assignee::A)
        .unwrap();
    handle.next_week().unwrap();
    handle.barrier().await.unwrap();
    settle().await;

    let state = handle.state();
    assert_eq!(state.week, None);
    assert!(state.can_undo);
    assert_eq!(store.write_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_remote_change_during_quiet_period_is_overwritten_by_local_edit() {
    let store = Arc::new(RecordingStore::default());
    let (handle, _task) = start(store.clone());
    open(&handle, "2024-06-03").await;

    handle
        .set_assignee(DaySlot::Mon, Duty::Morning, Assignee::B)
        .unwrap();
    handle.barrier().await.unwrap();

    // another device writes before the quiet period is over
    let foreign = Schedule::default().with_assignee(DaySlot::Wed, Duty::Evening, Assignee::D);
    store.remote.set(&key("2024-06-03"), &foreign).await.unwrap();
    let state = wait(&handle, |state| state.schedule == foreign).await;
    assert!(state.write_pending);

    settle().await;

    // last writer wins: the local edit as it was made
    let local = Schedule::default().with_assignee(DaySlot::Mon, Duty::Morning, Assignee::B);
    let writes = store.writes();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[1].1, local);
    assert_eq!(
        store.remote.get(&key("2024-06-03")).await.unwrap(),
        Some(local.clone())
    );
    // and its echo brings this device back in line
    assert_eq!(handle.state().schedule, local);
    assert!(!handle.state().write_pending);
}

#[tokio::test(start_paused = true)]
async fn test_late_echo_from_polling_store_keeps_newer_edit() {
    let store = Arc::new(RecordingStore::polling(Duration::from_secs(2)));
    let (handle, _task) = start(store.clone());
    open(&handle, "2024-06-03").await;

    handle
        .set_assignee(DaySlot::Mon, Duty::Morning, Assignee::A)
        .unwrap();
    sleep(Duration::from_millis(1900)).await;
    assert_eq!(store.write_count(), 2);

    // still inside this edit's quiet period when the poll returns the first one
    handle
        .set_assignee(DaySlot::Tue, Duty::Evening, Assignee::B)
        .unwrap();
    sleep(Duration::from_millis(200)).await;
    let state = handle.state();
    assert_eq!(state.schedule.day(DaySlot::Tue).evening_assignee, Assignee::B);
    assert!(state.write_pending);

    sleep(Duration::from_secs(5)).await;

    let both = Schedule::default()
        .with_assignee(DaySlot::Mon, Duty::Morning, Assignee::A)
        .with_assignee(DaySlot::Tue, Duty::Evening, Assignee::B);
    let writes = store.writes();
    assert_eq!(writes.len(), 3);
    assert_eq!(writes[2].1, both);
    assert_eq!(
        store.remote.get(&key("2024-06-03")).await.unwrap(),
        Some(both.clone())
    );
    let state = handle.state();
    assert_eq!(state.schedule, both);
    assert!(!state.write_pending);
}
