/*
[INPUT]:  Task Service handle, project/user ids, timer settings, user commands
[OUTPUT]: Active task list, live timer, today's total, notices
[POS]:    Orchestration - start/stop/review flow around the timer engine
[UPDATE]: When changing reconciliation order, pending-operation rules, or refetch timing
*/

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use taskdeck_adapter::{ProjectId, Task, TaskId, TaskService, TaskStatus, TaskdeckError, UserId};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::notice::Notifier;
use crate::timer::{DEFAULT_TICK_INTERVAL, TaskTimer, TimerError, TimerState};

pub const DEFAULT_HOURS_REFRESH_DELAY: Duration = Duration::from_millis(600);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("task {active} is already running, stop it first")]
    AnotherTaskActive { active: TaskId },

    #[error("a start or stop request is already in flight")]
    OperationInFlight,

    #[error("no user id configured, cannot query worked hours")]
    MissingUser,

    #[error(transparent)]
    Service(#[from] TaskdeckError),

    #[error(transparent)]
    Timer(#[from] TimerError),
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub tick_interval: Duration,
    /// Delay before refetching today's hours after a stop or review
    pub hours_refresh_delay: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            hours_refresh_delay: DEFAULT_HOURS_REFRESH_DELAY,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum PendingOp {
    Start(TaskId),
    Stop(TaskId),
}

struct SessionState {
    tasks: Vec<Task>,
    timer: TaskTimer,
    hours_today_seconds: u64,
    pending: Option<PendingOp>,
    hours_refresh: Option<AbortHandle>,
}

struct Shared {
    service: Arc<dyn TaskService>,
    project_id: ProjectId,
    user_id: Option<UserId>,
    settings: SessionSettings,
    notifier: Notifier,
    shutdown: CancellationToken,
    timer_rx: watch::Receiver<TimerState>,
    state: Mutex<SessionState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the pending marker even when the owning future is dropped mid-request
struct PendingGuard<'a> {
    shared: &'a Shared,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.shared.lock().pending = None;
    }
}

/// The user's active tickets and the timer for the one being worked on.
///
/// Cheap to clone; clones share state. The lock is never held across a
/// request, so every fetch overwrites local state with whatever the service
/// reported last.
#[derive(Clone)]
pub struct TimerSession {
    shared: Arc<Shared>,
}

impl TimerSession {
    pub fn new(
        service: Arc<dyn TaskService>,
        project_id: ProjectId,
        user_id: Option<UserId>,
        settings: SessionSettings,
        notifier: Notifier,
    ) -> Self {
        let timer = TaskTimer::new(settings.tick_interval);
        let timer_rx = timer.subscribe();
        let state = SessionState {
            tasks: Vec::new(),
            timer,
            hours_today_seconds: 0,
            pending: None,
            hours_refresh: None,
        };

        Self {
            shared: Arc::new(Shared {
                service,
                project_id,
                user_id,
                settings,
                notifier,
                shutdown: CancellationToken::new(),
                timer_rx,
                state: Mutex::new(state),
            }),
        }
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.shared.project_id
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.shared.lock().tasks.clone()
    }

    pub fn timer_state(&self) -> TimerState {
        self.shared.timer_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.shared.timer_rx.clone()
    }

    pub fn hours_today_seconds(&self) -> u64 {
        self.shared.lock().hours_today_seconds
    }

    /// Server-reported seconds worked today plus the live count of the active task
    pub fn today_total(&self) -> u64 {
        let base = self.hours_today_seconds();
        let timer = self.timer_state();
        if timer.is_running() {
            base + timer.elapsed_seconds
        } else {
            base
        }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shared.shutdown.clone()
    }

    /// Fetch the user's tasks and resume the timer from the running one.
    ///
    /// Tasks already in review or done are dropped from the list.
    pub async fn refresh_tasks(&self) -> Result<Vec<Task>, SessionError> {
        let shared = &self.shared;
        let fetched = match shared.service.active_tasks(&shared.project_id).await {
            Ok(tasks) => tasks,
            Err(err) => {
                error!(project_id = %shared.project_id, error = %err, "failed to fetch active tasks");
                shared.notifier.error("Failed to fetch tasks");
                return Err(err.into());
            }
        };

        let visible: Vec<Task> = fetched
            .into_iter()
            .filter(|task| !matches!(task.status, TaskStatus::Review | TaskStatus::Done))
            .collect();

        let mut state = shared.lock();
        let running = visible.iter().find(|task| task.is_in_progress());
        state.timer.reconcile(running, Utc::now());
        state.tasks = visible.clone();
        debug!(count = visible.len(), "active tasks refreshed");
        Ok(visible)
    }

    /// Query today's worked seconds for the configured user
    pub async fn refresh_hours(&self) -> Result<u64, SessionError> {
        let shared = &self.shared;
        let Some(user_id) = &shared.user_id else {
            return Err(SessionError::MissingUser);
        };

        let hours = shared.service.hours_today(user_id).await.map_err(|err| {
            warn!(user_id = %user_id, error = %err, "failed to fetch work hours");
            SessionError::from(err)
        })?;

        let seconds = hours.total_seconds();
        shared.lock().hours_today_seconds = seconds;
        debug!(user_id = %user_id, seconds, "work hours refreshed");
        Ok(seconds)
    }

    /// Start a task on the service, then begin timing it locally from the
    /// seconds it has already tracked.
    ///
    /// Refused without a request while another task runs or a start/stop is
    /// still in flight.
    pub async fn start(&self, task_id: &TaskId) -> Result<(), SessionError> {
        let guard = self.begin(PendingOp::Start(task_id.clone()))?;

        if let Err(err) = self.shared.service.start_task(task_id).await {
            error!(task_id = %task_id, error = %err, "start request failed");
            self.shared.notifier.error(format!("Failed to start task: {err}"));
            return Err(err.into());
        }

        let started = {
            let mut state = self.shared.lock();
            let baseline = state
                .tasks
                .iter()
                .find(|task| &task.id == task_id)
                .and_then(Task::tracked_seconds)
                .unwrap_or(0);
            state.timer.start(task_id.clone(), baseline)
        };
        drop(guard);
        started?;
        info!(task_id = %task_id, "task started");

        self.refetch_tasks().await;
        Ok(())
    }

    /// End a task on the service; the local timer stops only once the service accepts.
    pub async fn stop(&self, task_id: &TaskId) -> Result<(), SessionError> {
        let guard = self.begin(PendingOp::Stop(task_id.clone()))?;

        if let Err(err) = self.shared.service.end_task(task_id).await {
            error!(task_id = %task_id, error = %err, "end request failed, timer keeps running");
            self.shared.notifier.error(format!("Failed to stop task: {err}"));
            return Err(err.into());
        }

        {
            let mut state = self.shared.lock();
            if state.timer.snapshot().is_active(task_id) {
                state.timer.stop();
            }
        }
        drop(guard);
        info!(task_id = %task_id, "task stopped");

        self.refetch_tasks().await;
        self.schedule_hours_refresh();
        Ok(())
    }

    /// Hand a task over for review
    pub async fn send_to_review(&self, task_id: &TaskId) -> Result<(), SessionError> {
        if let Err(err) = self
            .shared
            .service
            .update_status(task_id, TaskStatus::Review)
            .await
        {
            error!(task_id = %task_id, error = %err, "review request failed");
            self.shared
                .notifier
                .error(format!("Failed to send task to review: {err}"));
            return Err(err.into());
        }
        info!(task_id = %task_id, "task sent to review");

        self.refetch_tasks().await;
        self.schedule_hours_refresh();
        Ok(())
    }

    /// Refetch today's hours after the configured delay.
    ///
    /// A newer schedule replaces an older one that has not fired yet; shutdown
    /// cancels it.
    pub fn schedule_hours_refresh(&self) -> JoinHandle<()> {
        let session = self.clone();
        let delay = self.shared.settings.hours_refresh_delay;
        let shutdown = self.shared.shutdown.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    match session.refresh_hours().await {
                        Ok(_) | Err(SessionError::MissingUser) => {}
                        Err(err) => debug!(error = %err, "delayed hours refresh failed"),
                    }
                }
            }
        });

        let previous = self
            .shared
            .lock()
            .hours_refresh
            .replace(handle.abort_handle());
        if let Some(previous) = previous {
            previous.abort();
        }
        handle
    }

    /// Halt the ticker and cancel any delayed refetch
    pub fn shutdown(&self) {
        self.shared.shutdown.cancel();
        let mut state = self.shared.lock();
        state.timer.stop();
        if let Some(pending) = state.hours_refresh.take() {
            pending.abort();
        }
        info!(project_id = %self.shared.project_id, "timer session shut down");
    }

    fn begin(&self, op: PendingOp) -> Result<PendingGuard<'_>, SessionError> {
        let mut state = self.shared.lock();
        if let Some(pending) = &state.pending {
            debug!(?pending, requested = ?op, "operation already in flight");
            self.shared
                .notifier
                .warning("Please wait for the previous request to finish");
            return Err(SessionError::OperationInFlight);
        }

        if let PendingOp::Start(task_id) = &op {
            if let Some(active) = state.timer.snapshot().active {
                if &active != task_id {
                    warn!(active = %active, requested = %task_id, "start refused, another task is running");
                    self.shared
                        .notifier
                        .warning(format!("Task {active} is already running, stop it first"));
                    return Err(SessionError::AnotherTaskActive { active });
                }
            }
        }

        state.pending = Some(op);
        Ok(PendingGuard {
            shared: &self.shared,
        })
    }

    async fn refetch_tasks(&self) {
        if let Err(err) = self.refresh_tasks().await {
            debug!(error = %err, "refetch after command failed");
        }
    }
}
