/*
[INPUT]:  Task Service schema definitions and serde requirements
[OUTPUT]: Typed Rust request structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize};

use super::enums::{Priority, TaskStatus};
use super::models::{ProjectId, TaskId, UserId};

/// Body of `PATCH /tasks/status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusPatchRequest {
    pub id: TaskId,
    pub status: TaskStatus,
}

/// Body of `POST /tasks/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: Priority,
    #[serde(rename = "type")]
    pub kind: String,
    pub assignee_id: Option<UserId>,
    pub project_id: Option<ProjectId>,
    pub status: TaskStatus,
}

impl NewTaskRequest {
    /// New tasks always land in the backlog
    pub fn backlog(title: impl Into<String>, project_id: Option<ProjectId>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            priority: Priority::Medium,
            kind: "task".to_string(),
            assignee_id: None,
            project_id,
            status: TaskStatus::Backlog,
        }
    }
}

/// Query parameters of `GET /tasks/monthly`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReportQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
}

impl MonthlyReportQuery {
    /// Query pairs in wire order, skipping unset filters
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(from) = &self.from {
            pairs.push(("from", from.clone()));
        }
        if let Some(to) = &self.to {
            pairs.push(("to", to.clone()));
        }
        if let Some(user_id) = &self.user_id {
            pairs.push(("userId", user_id.to_string()));
        }
        if let Some(project_id) = &self.project_id {
            pairs.push(("projectId", project_id.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityId;

    #[test]
    fn test_status_patch_body() {
        let body = StatusPatchRequest {
            id: EntityId::Number(12),
            status: TaskStatus::InProgress,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "id": 12, "status": "in-progress" })
        );
    }

    #[test]
    fn test_new_task_defaults_to_backlog() {
        let request = NewTaskRequest::backlog("Write docs", Some(EntityId::Number(3)));
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["status"], "backlog");
        assert_eq!(body["type"], "task");
        assert_eq!(body["priority"], "medium");
        assert_eq!(body["projectId"], 3);
    }

    #[test]
    fn test_monthly_query_pairs_skip_unset() {
        let query = MonthlyReportQuery {
            from: Some("2024-05-01".to_string()),
            user_id: Some(EntityId::Number(9)),
            ..Default::default()
        };
        assert_eq!(
            query.pairs(),
            vec![("from", "2024-05-01".to_string()), ("userId", "9".to_string())]
        );
    }
}
