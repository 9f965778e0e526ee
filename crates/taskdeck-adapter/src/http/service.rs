/*
[INPUT]:  Task Service operations consumed by the tracker
[OUTPUT]: Object-safe async trait + HTTP and in-memory implementations
[POS]:    HTTP layer - seam between transport and client-side state
[UPDATE]: When the tracker needs a new Task Service operation
*/

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};

use crate::http::{Result, TaskdeckClient, TaskdeckError};
use crate::types::{ProjectId, Task, TaskId, TaskStatus, UserId, WorkHours};

/// Operations the timer and board depend on
///
/// Implemented by [`TaskdeckClient`] for the real service and by
/// [`MockTaskService`] for tests and offline demos.
#[async_trait]
pub trait TaskService: Send + Sync {
    /// Tasks of the current user in a project
    async fn active_tasks(&self, project_id: &ProjectId) -> Result<Vec<Task>>;

    /// One board column
    async fn tasks_by_status(&self, status: TaskStatus, project_id: &ProjectId)
    -> Result<Vec<Task>>;

    async fn start_task(&self, task_id: &TaskId) -> Result<()>;

    async fn end_task(&self, task_id: &TaskId) -> Result<()>;

    async fn update_status(&self, task_id: &TaskId, status: TaskStatus) -> Result<()>;

    /// Seconds worked today by a user
    async fn hours_today(&self, user_id: &UserId) -> Result<WorkHours>;
}

#[async_trait]
impl TaskService for TaskdeckClient {
    async fn active_tasks(&self, project_id: &ProjectId) -> Result<Vec<Task>> {
        self.my_active_tasks(project_id).await
    }

    async fn tasks_by_status(
        &self,
        status: TaskStatus,
        project_id: &ProjectId,
    ) -> Result<Vec<Task>> {
        TaskdeckClient::tasks_by_status(self, status, project_id).await
    }

    async fn start_task(&self, task_id: &TaskId) -> Result<()> {
        TaskdeckClient::start_task(self, task_id).await
    }

    async fn end_task(&self, task_id: &TaskId) -> Result<()> {
        TaskdeckClient::end_task(self, task_id).await
    }

    async fn update_status(&self, task_id: &TaskId, status: TaskStatus) -> Result<()> {
        TaskdeckClient::update_status(self, task_id, status).await
    }

    async fn hours_today(&self, user_id: &UserId) -> Result<WorkHours> {
        self.user_hours_today(user_id).await
    }
}

/// Operation kinds, used to inject failures into [`MockTaskService`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceOp {
    ActiveTasks,
    TasksByStatus,
    Start,
    End,
    UpdateStatus,
    HoursToday,
}

/// A call recorded by [`MockTaskService`]
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceCall {
    ActiveTasks(ProjectId),
    TasksByStatus(TaskStatus, ProjectId),
    Start(TaskId),
    End(TaskId),
    UpdateStatus(TaskId, TaskStatus),
    HoursToday(UserId),
}

/// In-memory Task Service for testing
///
/// Behaves like a single-project server: start/end/status calls mutate the
/// stored tasks, and every call is recorded.
#[derive(Debug, Default)]
pub struct MockTaskService {
    tasks: Mutex<Vec<Task>>,
    hours: Mutex<WorkHours>,
    failing: Mutex<HashSet<ServiceOp>>,
    calls: Mutex<Vec<ServiceCall>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockTaskService {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            ..Self::default()
        }
    }

    /// Replace the stored tasks
    pub fn set_tasks(&self, tasks: Vec<Task>) {
        *lock(&self.tasks) = tasks;
    }

    pub fn tasks(&self) -> Vec<Task> {
        lock(&self.tasks).clone()
    }

    pub fn set_hours_today(&self, seconds: f64) {
        *lock(&self.hours) = WorkHours {
            total_hours: seconds,
        };
    }

    /// Make every call of `op` fail with a 503
    pub fn fail(&self, op: ServiceOp) {
        lock(&self.failing).insert(op);
    }

    pub fn recover(&self, op: ServiceOp) {
        lock(&self.failing).remove(&op);
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        lock(&self.calls).clone()
    }

    /// Number of recorded calls matching a predicate
    pub fn count_calls(&self, predicate: impl Fn(&ServiceCall) -> bool) -> usize {
        lock(&self.calls).iter().filter(|call| predicate(call)).count()
    }

    fn record(&self, op: ServiceOp, call: ServiceCall) -> Result<()> {
        lock(&self.calls).push(call);
        if lock(&self.failing).contains(&op) {
            return Err(TaskdeckError::Api {
                code: 503,
                message: format!("{op:?} unavailable"),
            });
        }
        Ok(())
    }

    fn with_task(&self, task_id: &TaskId, update: impl FnOnce(&mut Task)) -> Result<()> {
        let mut tasks = lock(&self.tasks);
        let task = tasks
            .iter_mut()
            .find(|task| &task.id == task_id)
            .ok_or_else(|| TaskdeckError::Api {
                code: 404,
                message: format!("task {task_id} not found"),
            })?;
        update(task);
        Ok(())
    }
}

#[async_trait]
impl TaskService for MockTaskService {
    async fn active_tasks(&self, project_id: &ProjectId) -> Result<Vec<Task>> {
        self.record(
            ServiceOp::ActiveTasks,
            ServiceCall::ActiveTasks(project_id.clone()),
        )?;
        Ok(self.tasks())
    }

    async fn tasks_by_status(
        &self,
        status: TaskStatus,
        project_id: &ProjectId,
    ) -> Result<Vec<Task>> {
        self.record(
            ServiceOp::TasksByStatus,
            ServiceCall::TasksByStatus(status, project_id.clone()),
        )?;
        Ok(self
            .tasks()
            .into_iter()
            .filter(|task| task.status == status)
            .collect())
    }

    async fn start_task(&self, task_id: &TaskId) -> Result<()> {
        self.record(ServiceOp::Start, ServiceCall::Start(task_id.clone()))?;
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        self.with_task(task_id, |task| {
            task.status = TaskStatus::InProgress;
            task.start_time = Some(now);
        })
    }

    async fn end_task(&self, task_id: &TaskId) -> Result<()> {
        self.record(ServiceOp::End, ServiceCall::End(task_id.clone()))?;
        self.with_task(task_id, |task| {
            task.status = TaskStatus::Todo;
            task.start_time = None;
        })
    }

    async fn update_status(&self, task_id: &TaskId, status: TaskStatus) -> Result<()> {
        self.record(
            ServiceOp::UpdateStatus,
            ServiceCall::UpdateStatus(task_id.clone(), status),
        )?;
        self.with_task(task_id, |task| task.status = status)
    }

    async fn hours_today(&self, user_id: &UserId) -> Result<WorkHours> {
        self.record(ServiceOp::HoursToday, ServiceCall::HoursToday(user_id.clone()))?;
        Ok(*lock(&self.hours))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntityId, Priority};

    fn task(id: i64, status: TaskStatus) -> Task {
        Task {
            id: EntityId::Number(id),
            title: format!("task {id}"),
            description: None,
            code: None,
            priority: Priority::Medium,
            status,
            assignee_id: None,
            accumulated_seconds: None,
            start_time: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_mock_start_and_end_mutate_status() {
        let service = MockTaskService::new(vec![task(1, TaskStatus::Todo)]);
        let id = EntityId::Number(1);

        service.start_task(&id).await.unwrap();
        let started = service.tasks().remove(0);
        assert_eq!(started.status, TaskStatus::InProgress);
        assert!(started.start_time.is_some());

        service.end_task(&id).await.unwrap();
        let ended = service.tasks().remove(0);
        assert_eq!(ended.status, TaskStatus::Todo);
        assert!(ended.start_time.is_none());

        assert_eq!(
            service.calls(),
            vec![ServiceCall::Start(id.clone()), ServiceCall::End(id)]
        );
    }

    #[tokio::test]
    async fn test_mock_failure_injection() {
        let service = MockTaskService::new(vec![task(1, TaskStatus::Todo)]);
        service.fail(ServiceOp::UpdateStatus);

        let err = service
            .update_status(&EntityId::Number(1), TaskStatus::InProgress)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(service.tasks()[0].status, TaskStatus::Todo);

        service.recover(ServiceOp::UpdateStatus);
        service
            .update_status(&EntityId::Number(1), TaskStatus::InProgress)
            .await
            .unwrap();
        assert_eq!(service.tasks()[0].status, TaskStatus::InProgress);
    }

    #[tokio::test]
    async fn test_mock_filters_columns() {
        let service = MockTaskService::new(vec![
            task(1, TaskStatus::Todo),
            task(2, TaskStatus::Review),
            task(3, TaskStatus::Todo),
        ]);
        let todo = service
            .tasks_by_status(TaskStatus::Todo, &EntityId::Number(1))
            .await
            .unwrap();
        assert_eq!(todo.len(), 2);
    }
}
