//! The sync engine task.

use std::collections::VecDeque;
use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, Sleep};

use super::handle::{Command, EngineHandle};
use super::state::EngineState;
use crate::document_key::{DocumentKey, RoomId};
use crate::history::History;
use crate::models::{Edit, Schedule};
use crate::store::{DocumentSnapshot, DocumentStore, Subscription};
use crate::week::WeekKey;

/// Quiet period after the last local edit before it is written remotely.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(350);

/// Static settings of a sync engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub room: RoomId,
    pub debounce: Duration,
}

impl EngineConfig {
    pub fn new(room: RoomId) -> Self {
        Self {
            room,
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

/// An armed outbound write: the schedule as it was when the timer started.
struct PendingWrite {
    timer: Pin<Box<Sleep>>,
    schedule: Schedule,
}

/// Follow-up work that runs after the current event has been fully handled
/// and before the next event is taken.
#[derive(Debug)]
enum Deferred {
    ClearSuppression,
}

/// Owns the schedule history of one session and synchronizes it with the
/// store.
///
/// Build one with [`SyncEngine::new`], drive it with [`SyncEngine::run`]
/// (usually on its own task), and talk to it through the returned
/// [`EngineHandle`].
pub struct SyncEngine {
    config: EngineConfig,
    store: Arc<dyn DocumentStore>,
    history: History<Schedule>,
    active_week: Option<WeekKey>,
    subscription: Option<Subscription>,
    /// Raised while a remote snapshot is being applied.
    suppress_outbound_write: bool,
    pending_write: Option<PendingWrite>,
    /// Last schedule successfully written for the active week.
    last_written: Option<Schedule>,
    write_in_flight: bool,
    writes_sent: u64,
    loaded: bool,
    deferred: VecDeque<Deferred>,
    commands: mpsc::UnboundedReceiver<Command>,
    state: watch::Sender<EngineState>,
}

impl SyncEngine {
    pub fn new(config: EngineConfig, store: Arc<dyn DocumentStore>) -> (Self, EngineHandle) {
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (state, state_rx) = watch::channel(EngineState::default());

        let engine = Self {
            config,
            store,
            history: History::new(Schedule::default()),
            active_week: None,
            subscription: None,
            suppress_outbound_write: false,
            pending_write: None,
            last_written: None,
            write_in_flight: false,
            writes_sent: 0,
            loaded: false,
            deferred: VecDeque::new(),
            commands,
            state,
        };

        (engine, EngineHandle::new(command_tx, state_rx))
    }

    /// Processes events until shut down or until every handle is dropped.
    pub async fn run(mut self) {
        tracing::debug!(room = %self.config.room, "sync engine started");

        loop {
            self.run_deferred();

            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command).await,
                },
                snapshot = next_snapshot(&mut self.subscription) => match snapshot {
                    Some(snapshot) => self.apply_snapshot(snapshot),
                    None => {
                        tracing::warn!("document subscription ended");
                        self.subscription = None;
                    }
                },
                () = debounce_elapsed(&mut self.pending_write) => {
                    if let Some(pending) = self.pending_write.take() {
                        self.write_schedule(pending.schedule).await;
                    }
                }
            }
        }

        self.teardown();
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Activate(week) => self.activate_week(week).await,
            Command::ShiftWeeks(weeks) => match self.active_week {
                Some(week) => match week.offset_weeks(weeks) {
                Some(target) => self.activate_week(target).await,
                None => tracing::warn!(%week, weeks, "cannot move past the end of the calendar"),
            },
                None => tracing::debug!("no active week to move from"),
            },
            Command::Edit(edit) => self.apply_edit(&edit),
            Command::Undo => {
                if self.history.undo() {
                    self.schedule_changed();
                }
            }
            Command::Redo => {
                if self.history.redo() {
                    self.schedule_changed();
                }
            }
            Command::Barrier(reply) => {
                let _ = reply.send(());
            }
            // handled by the run loop
            Command::Shutdown => {}
        }
    }

    fn document_key(&self, week: WeekKey) -> DocumentKey {
        DocumentKey::new(self.config.room.clone(), week)
    }

    async fn activate_week(&mut self, week: WeekKey) {
        if self.active_week == Some(week) {
            return;
        }

        self.subscription = None;
        if self.pending_write.take().is_some() {
            // Navigating inside the debounce window loses that edit.
            tracing::debug!("discarding unsent write for previous week");
        }

        self.active_week = Some(week);
        self.last_written = None;
        self.loaded = false;
        self.history.reset(Schedule::default());
        self.publish();

        let key = self.document_key(week);
        match self.store.get(&key).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::info!(%key, "creating default document");
                if let Err(e) = self.store.set(&key, &Schedule::default()).await {
                    tracing::warn!(%key, "failed to create document: {}", e);
                }
            }
            Err(e) => tracing::warn!(%key, "failed to read document: {}", e),
        }

        match self.store.subscribe(&key).await {
            Ok(subscription) => {
                tracing::debug!(%key, "subscribed");
                self.subscription = Some(subscription);
            }
            Err(e) => tracing::warn!(%key, "failed to subscribe: {}", e),
        }
    }

    fn apply_snapshot(&mut self, snapshot: DocumentSnapshot) {
        let Some(schedule) = snapshot.data else {
            tracing::debug!(key = %snapshot.key, "ignoring snapshot of missing document");
            return;
        };

        // Polling stores can deliver an earlier write of ours after a newer
        // local edit; applying it would throw that edit away.
        if self.pending_write.is_some() && self.last_written.as_ref() == Some(&schedule) {
            tracing::debug!(key = %snapshot.key, "ignoring late echo of own write");
            return;
        }

        self.suppress_outbound_write = true;
        self.history.reset(schedule);
        self.loaded = true;
        self.schedule_changed();
        self.deferred.push_back(Deferred::ClearSuppression);
    }

    fn apply_edit(&mut self, edit: &Edit) {
        tracing::debug!("local edit: {}", edit);
        let next = self.history.current().apply(edit);
        self.history.push(next);
        self.schedule_changed();
    }

    /// Reaction to any change of the current schedule: arms the outbound
    /// write unless the change came from the store itself.
    fn schedule_changed(&mut self) {
        if !self.suppress_outbound_write && self.active_week.is_some() {
            // Replacing the timer cancels the previous one.
            self.pending_write = Some(PendingWrite {
                timer: Box::pin(sleep(self.config.debounce)),
                schedule: self.history.current().clone(),
            });
        }
        self.publish();
    }

    fn run_deferred(&mut self) {
        while let Some(task) = self.deferred.pop_front() {
            match task {
                Deferred::ClearSuppression => self.suppress_outbound_write = false,
            }
        }
    }

    async fn write_schedule(&mut self, schedule: Schedule) {
        let Some(week) = self.active_week else {
            return;
        };
        let key = self.document_key(week);

        self.write_in_flight = true;
        self.publish();

        // No retry: the next edit writes again.
        match self.store.set(&key, &schedule).await {
            Ok(()) => {
                tracing::debug!(%key, "schedule written");
                self.last_written = Some(schedule);
            }
            Err(e) => tracing::warn!(%key, "failed to write schedule: {}", e),
        }

        self.write_in_flight = false;
        self.writes_sent += 1;
        self.publish();
    }

    fn teardown(&mut self) {
        self.subscription = None;
        if self.pending_write.take().is_some() {
            tracing::debug!("dropping unsent write on shutdown");
        }
        self.publish();
        tracing::debug!(room = %self.config.room, "sync engine stopped");
    }

    fn publish(&self) {
        self.state.send_replace(EngineState {
            week: self.active_week,
            schedule: self.history.current().clone(),
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
            loaded: self.loaded,
            write_pending: self.pending_write.is_some() || self.write_in_flight,
            writes_sent: self.writes_sent,
        });
    }
}

async fn next_snapshot(subscription: &mut Option<Subscription>) -> Option<DocumentSnapshot> {
    match subscription {
        Some(subscription) => subscription.next().await,
        None => pending().await,
    }
}

async fn debounce_elapsed(pending: &mut Option<PendingWrite>) {
    match pending {
        Some(pending) => pending.timer.as_mut().await,
        None => std::future::pending().await,
    }
}
