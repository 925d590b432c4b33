//! Task collection with stale-response discard.
//!
//! Every read takes a sequence number when it is issued. A response is only
//! applied if no newer read or invalidation was issued while it was in
//! flight, so the retained collection always belongs to the most recently
//! issued query regardless of response arrival order.
//!
//! Only the last good result is retained. It stays visible while the next
//! read is pending, but every `list` goes to the server. Any change of the
//! token epoch drops it.

use crate::error::{SyncError, SyncResult};
use crate::service::TaskService;
use futures_signals::signal::{Mutable, Signal};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tasklane_http::{ApiClient, Notification};
use tasklane_types::{Task, TaskDraft, TaskId, TaskQuery};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// The retained collection no longer reflects the server
    Invalidated,
}

/// What a list view renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskListState {
    pub query: TaskQuery,
    /// Last successfully loaded collection; kept while a newer read is
    /// pending or after a failed read.
    pub tasks: Option<Arc<Vec<Task>>>,
    /// `tasks` were loaded for a different query than `query`.
    pub previous: bool,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Default)]
struct Ledger {
    issued: u64,
    /// Token epoch the retained tasks were loaded under
    epoch: u64,
    /// Query the retained tasks in [`TaskListState::tasks`] belong to
    retained: Option<TaskQuery>,
}

impl Ledger {
    /// Forget everything loaded under an older session.
    fn reset_session(&mut self, epoch: u64, state: &mut TaskListState) {
        debug!(from = self.epoch, to = epoch, "Session changed, dropping retained tasks");
        self.epoch = epoch;
        self.retained = None;
        state.tasks = None;
        state.previous = false;
        state.error = None;
    }
}

pub struct TaskSync {
    service: TaskService,
    ledger: Mutex<Ledger>,
    state: Mutable<TaskListState>,
    events: broadcast::Sender<SyncEvent>,
}

impl TaskSync {
    pub fn new(api: ApiClient) -> Self {
        Self::with_service(TaskService::new(api))
    }

    pub fn with_service(service: TaskService) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let ledger = Ledger {
            epoch: service.api().tokens().epoch(),
            ..Ledger::default()
        };
        Self {
            service,
            ledger: Mutex::new(ledger),
            state: Mutable::new(TaskListState::default()),
            events,
        }
    }

    pub fn service(&self) -> &TaskService {
        &self.service
    }

    pub fn state(&self) -> TaskListState {
        self.state.get_cloned()
    }

    pub fn signal(&self) -> impl Signal<Item = TaskListState> + use<> {
        self.state.signal_cloned()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Query of the retained collection, if any.
    pub fn retained_query(&self) -> Option<TaskQuery> {
        self.ledger().retained.clone()
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `query` current and load its collection.
    ///
    /// The last good collection stays in [`TaskListState::tasks`] until the
    /// response lands. Returns [`SyncError::Superseded`] when the read
    /// sequence or the token epoch moved before the response arrived; the
    /// response is then dropped.
    pub async fn list(&self, query: TaskQuery) -> SyncResult<Arc<Vec<Task>>> {
        let tokens = self.service.api().tokens();

        let (seq, epoch) = {
            let mut ledger = self.ledger();
            let mut state = self.state.lock_mut();

            let epoch = tokens.epoch();
            if ledger.epoch != epoch {
                ledger.reset_session(epoch, &mut state);
            }

            ledger.issued += 1;
            state.previous = ledger
                .retained
                .as_ref()
                .is_some_and(|retained| *retained != query);
            state.query = query.clone();
            state.loading = true;
            (ledger.issued, epoch)
        };

        let result = self.service.list(&query).await;

        let mut ledger = self.ledger();
        if ledger.issued != seq {
            debug!(seq, current = ledger.issued, "Discarding superseded task list response");
            return Err(SyncError::Superseded);
        }

        let mut state = self.state.lock_mut();
        state.loading = false;

        let current_epoch = tokens.epoch();
        if current_epoch != epoch {
            ledger.reset_session(current_epoch, &mut state);
            if result.is_ok() {
                debug!(seq, "Discarding task list loaded under a previous session");
                return Err(SyncError::Superseded);
            }
        }

        match result {
            Ok(tasks) => {
                let tasks = Arc::new(tasks);
                debug!(seq, count = tasks.len(), "Task list loaded");
                ledger.retained = Some(query);
                state.tasks = Some(tasks.clone());
                state.previous = false;
                state.error = None;
                Ok(tasks)
            }
            Err(e) => {
                // Previous tasks stay visible next to the error.
                state.error = Some(e.user_message(&self.service.api().config().fallback_message));
                Err(e.into())
            }
        }
    }

    /// Switch to a new query. Same as [`Self::list`].
    pub async fn set_query(&self, query: TaskQuery) -> SyncResult<Arc<Vec<Task>>> {
        self.list(query).await
    }

    /// Re-read the current query.
    pub async fn refresh(&self) -> SyncResult<Arc<Vec<Task>>> {
        let query = self.state.lock_ref().query.clone();
        self.list(query).await
    }

    /// Supersede in-flight reads and tell subscribers to re-read.
    pub fn invalidate(&self) {
        {
            let mut ledger = self.ledger();
            ledger.issued += 1;
            // Nothing in flight counts any more.
            self.state.lock_mut().loading = false;
        }
        debug!("Task list invalidated");
        // No subscribers is fine.
        let _ = self.events.send(SyncEvent::Invalidated);
    }

    fn notify_success(&self, message: &str) {
        self.service
            .api()
            .notifier()
            .notify(Notification::success(message));
    }

    pub async fn create(&self, draft: &TaskDraft) -> SyncResult<Task> {
        draft.validate()?;
        let task = self.service.create(draft).await?;
        self.invalidate();
        info!(id = task.id, "Task created");
        self.notify_success("Task created");
        Ok(task)
    }

    pub async fn update(&self, id: TaskId, draft: &TaskDraft) -> SyncResult<Task> {
        draft.validate()?;
        let task = self.service.update(id, draft).await?;
        self.invalidate();
        info!(id, "Task updated");
        self.notify_success("Task updated");
        Ok(task)
    }

    pub async fn delete(&self, id: TaskId) -> SyncResult<()> {
        self.service.delete(id).await?;
        self.invalidate();
        info!(id, "Task deleted");
        self.notify_success("Task deleted");
        Ok(())
    }

    /// Re-read the current query after each invalidation.
    ///
    /// The task holds only a weak reference and ends once the sync is dropped.
    pub fn spawn_refresh_on_invalidate(self: &Arc<Self>) -> JoinHandle<()> {
        let sync = Arc::downgrade(self);
        let mut events = self.subscribe();

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SyncEvent::Invalidated) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Refresh loop lagged behind invalidations");
                    }
                    Err(RecvError::Closed) => break,
                }

                let Some(sync) = sync.upgrade() else {
                    break;
                };
                match sync.refresh().await {
                    Ok(_) | Err(SyncError::Superseded) => {}
                    Err(e) => warn!("Background refresh failed: {}", e),
                }
            }
            debug!("Refresh loop stopped");
        })
    }
}
