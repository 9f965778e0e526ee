/*
[INPUT]:  Start/stop/resume commands for one task, tick interval, wall clock
[OUTPUT]: Live `TimerState` via `watch` (active task + elapsed seconds)
[POS]:    Core - client-side timer for the single active task
[UPDATE]: When changing tick semantics, resume rules, or ticker lifecycle
*/

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use taskdeck_adapter::{Task, TaskId};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::timestamp::StartedAt;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Snapshot of the local timer.
///
/// `active` is a single optional id, so two tasks can never be running at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerState {
    pub active: Option<TaskId>,
    pub elapsed_seconds: u64,
}

impl TimerState {
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_active(&self, task_id: &TaskId) -> bool {
        self.active.as_ref() == Some(task_id)
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TimerError {
    #[error("task {active} is already running, stop it first")]
    AlreadyActive { active: TaskId },
}

#[derive(Debug)]
struct Ticker {
    task_id: TaskId,
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl Ticker {
    fn cancel(self) {
        self.shutdown.cancel();
        self.handle.abort();
    }
}

/// Timer for the active task.
///
/// Owns at most one ticker; every transition that changes the active task
/// cancels the previous ticker before spawning a new one. Must be driven from
/// inside a tokio runtime.
#[derive(Debug)]
pub struct TaskTimer {
    state: Arc<watch::Sender<TimerState>>,
    tick_interval: Duration,
    ticker: Option<Ticker>,
}

impl TaskTimer {
    pub fn new(tick_interval: Duration) -> Self {
        let (state, _rx) = watch::channel(TimerState::default());
        Self {
            state: Arc::new(state),
            tick_interval,
            ticker: None,
        }
    }

    pub fn snapshot(&self) -> TimerState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.state.subscribe()
    }

    /// Begin timing `task_id` from `baseline` seconds.
    ///
    /// Restarting the task that is already active only re-seeds the counter.
    pub fn start(&mut self, task_id: TaskId, baseline: u64) -> Result<(), TimerError> {
        let current = self.snapshot();
        if let Some(active) = current.active {
            if active != task_id {
                return Err(TimerError::AlreadyActive { active });
            }
        }

        info!(task_id = %task_id, baseline, "timer started");
        self.run(task_id, baseline);
        Ok(())
    }

    /// Halt the ticker and clear the active task, keeping the displayed value
    pub fn stop(&mut self) -> Option<TaskId> {
        self.cancel_ticker();
        let mut stopped = None;
        self.state.send_modify(|state| stopped = state.active.take());
        if let Some(task_id) = &stopped {
            info!(
                task_id = %task_id,
                elapsed_seconds = self.state.borrow().elapsed_seconds,
                "timer stopped"
            );
        }
        stopped
    }

    /// Adopt the server's view of the running task.
    ///
    /// `running` is the task the service reports as in-progress, if any. Its
    /// elapsed time is `now - startedAt`. Without a usable timestamp the local
    /// count is kept for the task already being timed, otherwise the task's
    /// tracked `hoursTaken` seeds the counter, and zero when that is missing
    /// too. With nothing running the timer freezes on its last value.
    pub fn reconcile(&mut self, running: Option<&Task>, now: DateTime<Utc>) {
        let Some(task) = running else {
            if self.snapshot().is_running() {
                debug!("service reports no running task, freezing timer");
            }
            self.stop();
            return;
        };

        let current = self.snapshot();
        let elapsed = match task.started_at_raw().and_then(StartedAt::parse) {
            Some(started_at) => started_at.elapsed_at(now),
            None if current.is_active(&task.id) => current.elapsed_seconds,
            None => match task.tracked_seconds() {
                Some(tracked) => tracked,
                None => {
                    warn!(
                        task_id = %task.id,
                        raw = task.started_at_raw().unwrap_or(""),
                        "running task has no usable start timestamp or tracked time, resetting timer"
                    );
                    0
                }
            },
        };

        if let Some(active) = current.active.as_ref().filter(|active| **active != task.id) {
            info!(local = %active, server = %task.id, "service reports a different running task");
        }
        self.run(task.id.clone(), elapsed);
    }

    fn run(&mut self, task_id: TaskId, elapsed_seconds: u64) {
        let keep_ticker = self
            .ticker
            .as_ref()
            .is_some_and(|ticker| ticker.task_id == task_id && !ticker.handle.is_finished());

        self.state.send_replace(TimerState {
            active: Some(task_id.clone()),
            elapsed_seconds,
        });

        if !keep_ticker {
            self.cancel_ticker();
            self.ticker = Some(self.spawn_ticker(task_id));
        }
    }

    fn spawn_ticker(&self, task_id: TaskId) -> Ticker {
        let shutdown = CancellationToken::new();
        let state = Arc::clone(&self.state);
        let period = self.tick_interval;
        let token = shutdown.clone();
        let owner = task_id.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        state.send_modify(|current| {
                            if current.active.as_ref() == Some(&owner) {
                                current.elapsed_seconds += 1;
                            }
                        });
                    }
                }
            }
            debug!(task_id = %owner, "ticker exited");
        });

        Ticker {
            task_id,
            shutdown,
            handle,
        }
    }

    fn cancel_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }
}

impl Default for TaskTimer {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL)
    }
}

impl Drop for TaskTimer {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use taskdeck_adapter::{EntityId, Priority, TaskStatus};

    fn running_task(id: i64, start_time: Option<String>) -> Task {
        tracked_task(id, start_time, None)
    }

    fn tracked_task(id: i64, start_time: Option<String>, tracked: Option<f64>) -> Task {
        Task {
            id: EntityId::Number(id),
            title: format!("task {id}"),
            description: None,
            code: None,
            priority: Priority::Medium,
            status: TaskStatus::InProgress,
            assignee_id: None,
            accumulated_seconds: tracked,
            start_time,
            updated_at: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_second_and_freezes_on_stop() {
        let mut timer = TaskTimer::default();
        timer.start(EntityId::Number(1), 0).unwrap();
        assert_eq!(timer.snapshot().elapsed_seconds, 0);

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(timer.snapshot().elapsed_seconds, 3);

        assert_eq!(timer.stop(), Some(EntityId::Number(1)));
        tokio::time::sleep(Duration::from_secs(5)).await;

        let frozen = timer.snapshot();
        assert_eq!(frozen.elapsed_seconds, 3);
        assert!(!frozen.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_task_is_refused() {
        let mut timer = TaskTimer::default();
        timer.start(EntityId::Number(1), 0).unwrap();

        let err = timer.start(EntityId::Number(2), 0).unwrap_err();
        assert_eq!(
            err,
            TimerError::AlreadyActive {
                active: EntityId::Number(1)
            }
        );
        assert!(timer.snapshot().is_active(&EntityId::Number(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_same_task_does_not_double_tick() {
        let mut timer = TaskTimer::default();
        timer.start(EntityId::Number(1), 10).unwrap();
        timer.start(EntityId::Number(1), 10).unwrap();

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(timer.snapshot().elapsed_seconds, 12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconcile_resumes_from_timestamp() {
        let mut timer = TaskTimer::default();
        let now = Utc::now();
        let started = (now - ChronoDuration::seconds(125)).to_rfc3339();

        timer.reconcile(Some(&running_task(7, Some(started))), now);

        let state = timer.snapshot();
        assert!(state.is_active(&EntityId::Number(7)));
        assert_eq!(state.elapsed_seconds, 125);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconcile_with_bad_timestamp_still_marks_active() {
        for raw in [None, Some("0".to_string()), Some("garbage".to_string())] {
            let mut timer = TaskTimer::default();
            timer.reconcile(Some(&running_task(7, raw)), Utc::now());

            let state = timer.snapshot();
            assert!(state.is_active(&EntityId::Number(7)));
            assert_eq!(state.elapsed_seconds, 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconcile_keeps_local_count_for_same_task() {
        let mut timer = TaskTimer::default();
        timer.start(EntityId::Number(7), 0).unwrap();
        tokio::time::sleep(Duration::from_millis(4_500)).await;

        timer.reconcile(Some(&running_task(7, None)), Utc::now());
        assert_eq!(timer.snapshot().elapsed_seconds, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconcile_server_wins_over_local() {
        let mut timer = TaskTimer::default();
        timer.start(EntityId::Number(1), 50).unwrap();

        let now = Utc::now();
        let started = (now - ChronoDuration::seconds(20)).to_rfc3339();
        timer.reconcile(Some(&running_task(2, Some(started))), now);

        let state = timer.snapshot();
        assert!(state.is_active(&EntityId::Number(2)));
        assert_eq!(state.elapsed_seconds, 20);

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(timer.snapshot().elapsed_seconds, 21);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconcile_without_running_task_freezes() {
        let mut timer = TaskTimer::default();
        timer.start(EntityId::Number(1), 30).unwrap();
        tokio::time::sleep(Duration::from_millis(2_500)).await;

        timer.reconcile(None, Utc::now());
        let frozen = timer.snapshot();
        assert!(!frozen.is_running());
        assert_eq!(frozen.elapsed_seconds, 32);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(timer.snapshot().elapsed_seconds, 32);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconcile_falls_back_to_tracked_seconds() {
        let mut timer = TaskTimer::default();
        timer.reconcile(Some(&tracked_task(3, None, Some(3600.7))), Utc::now());

        let state = timer.snapshot();
        assert!(state.is_active(&EntityId::Number(3)));
        assert_eq!(state.elapsed_seconds, 3600);

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(timer.snapshot().elapsed_seconds, 3601);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconcile_prefers_timestamp_over_tracked_seconds() {
        let mut timer = TaskTimer::default();
        let now = Utc::now();
        let started = (now - ChronoDuration::seconds(40)).to_rfc3339();

        timer.reconcile(Some(&tracked_task(3, Some(started), Some(3600.0))), now);
        assert_eq!(timer.snapshot().elapsed_seconds, 40);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_ticks() {
        let mut timer = TaskTimer::default();
        let mut rx = timer.subscribe();
        timer.start(EntityId::Number(1), 0).unwrap();

        rx.changed().await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().elapsed_seconds, 1);
    }
}
