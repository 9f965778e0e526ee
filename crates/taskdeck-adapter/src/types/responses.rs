/*
[INPUT]:  Task Service schema definitions and serde requirements
[OUTPUT]: Typed Rust response structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize};

use super::models::Task;

/// Response of `GET /tasks/my-active-tasks/{projectId}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveTasksResponse {
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// Per-status task counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    #[serde(default)]
    pub backlog: u32,
    #[serde(default)]
    pub todo: u32,
    #[serde(default)]
    pub in_progress: u32,
    #[serde(default)]
    pub review: u32,
    #[serde(default)]
    pub done: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeReport {
    pub employee: String,
    #[serde(default)]
    pub total_tasks: u32,
    #[serde(default)]
    pub hours_worked: f64,
}

/// Response of `GET /tasks/monthly`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReport {
    #[serde(default)]
    pub employees: Vec<EmployeeReport>,
    #[serde(default)]
    pub summary: StatusSummary,
}

impl MonthlyReport {
    /// Rows belonging to a single employee, matched by display name
    pub fn for_employee(&self, name: &str) -> Vec<&EmployeeReport> {
        self.employees
            .iter()
            .filter(|row| row.employee == name)
            .collect()
    }
}

/// Response of `GET /tasks/user-tasks/{projectId}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserTaskCounts {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub counts: StatusSummary,
}
