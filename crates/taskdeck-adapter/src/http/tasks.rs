/*
[INPUT]:  Task and project identifiers, bearer token
[OUTPUT]: Task lists, start/end acknowledgements, status patches
[POS]:    HTTP layer - task endpoints (require bearer auth)
[UPDATE]: When adding new task endpoints or changing payloads
*/

use futures_util::future::join_all;
use reqwest::Method;
use tracing::info;

use crate::http::{Result, TaskdeckClient};
use crate::types::{
    ActiveTasksResponse, NewTaskRequest, ProjectId, StatusPatchRequest, Task, TaskId, TaskStatus,
    UserTaskCounts,
};

impl TaskdeckClient {
    /// Tasks assigned to the current user in a project
    ///
    /// GET /tasks/my-active-tasks/{projectId}
    pub async fn my_active_tasks(&self, project_id: &ProjectId) -> Result<Vec<Task>> {
        let project = project_id.to_string();
        let url = self.endpoint_url(&["tasks", "my-active-tasks", &project])?;
        let response: ActiveTasksResponse = self.get_json(url).await?;
        Ok(response.tasks)
    }

    /// One board column
    ///
    /// GET /tasks/status/{status}/{projectId}
    pub async fn tasks_by_status(
        &self,
        status: TaskStatus,
        project_id: &ProjectId,
    ) -> Result<Vec<Task>> {
        let project = project_id.to_string();
        let url = self.endpoint_url(&["tasks", "status", status.as_str(), &project])?;
        self.get_json(url).await
    }

    /// Backlog of a project
    ///
    /// GET /tasks/backlog/{projectId}
    pub async fn backlog(&self, project_id: &ProjectId) -> Result<Vec<Task>> {
        let project = project_id.to_string();
        let url = self.endpoint_url(&["tasks", "backlog", &project])?;
        self.get_json(url).await
    }

    /// Per-status counters for the current user
    ///
    /// GET /tasks/user-tasks/{projectId}
    pub async fn user_task_counts(&self, project_id: &ProjectId) -> Result<UserTaskCounts> {
        let project = project_id.to_string();
        let url = self.endpoint_url(&["tasks", "user-tasks", &project])?;
        self.get_json(url).await
    }

    /// Mark a task in-progress and begin server-side tracking
    ///
    /// POST /tasks/start/{taskId}
    pub async fn start_task(&self, task_id: &TaskId) -> Result<()> {
        let id = task_id.to_string();
        let url = self.endpoint_url(&["tasks", "start", &id])?;
        let builder = self
            .authorized_request(Method::POST, url)?
            .json(&serde_json::json!({}));
        self.send_ack(builder).await?;
        info!(task_id = %task_id, "task start accepted");
        Ok(())
    }

    /// Stop a task and finalize its elapsed time server-side
    ///
    /// POST /tasks/end/{taskId}
    pub async fn end_task(&self, task_id: &TaskId) -> Result<()> {
        let id = task_id.to_string();
        let url = self.endpoint_url(&["tasks", "end", &id])?;
        let builder = self
            .authorized_request(Method::POST, url)?
            .json(&serde_json::json!({}));
        self.send_ack(builder).await?;
        info!(task_id = %task_id, "task end accepted");
        Ok(())
    }

    /// Set a task's status
    ///
    /// PATCH /tasks/status
    pub async fn update_status(&self, task_id: &TaskId, status: TaskStatus) -> Result<()> {
        let url = self.endpoint_url(&["tasks", "status"])?;
        let body = StatusPatchRequest {
            id: task_id.clone(),
            status,
        };
        let builder = self.authorized_request(Method::PATCH, url)?.json(&body);
        self.send_ack(builder).await?;
        info!(task_id = %task_id, %status, "task status updated");
        Ok(())
    }

    /// Create a task
    ///
    /// POST /tasks/
    pub async fn create_task(&self, request: &NewTaskRequest) -> Result<()> {
        let url = self.endpoint_url(&["tasks", ""])?;
        let builder = self.authorized_request(Method::POST, url)?.json(request);
        self.send_ack(builder).await?;
        info!(title = %request.title, "task created");
        Ok(())
    }

    /// Move backlog tasks onto the board, all requests issued concurrently
    pub async fn start_sprint(&self, task_ids: &[TaskId]) -> Result<()> {
        let updates = task_ids
            .iter()
            .map(|task_id| self.update_status(task_id, TaskStatus::Todo));
        for result in join_all(updates).await {
            result?;
        }
        Ok(())
    }
}
