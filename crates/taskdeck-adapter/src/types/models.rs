/*
[INPUT]:  Task Service schema definitions and serde requirements
[OUTPUT]: Typed Rust structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::enums::{Priority, TaskStatus};

/// Opaque server identifier; the service emits integers for some records and
/// strings for others, and the original representation is sent back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

pub type TaskId = EntityId;
pub type UserId = EntityId;
pub type ProjectId = EntityId;

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Number(value) => f.pad(&value.to_string()),
            EntityId::Text(value) => f.pad(value),
        }
    }
}

impl FromStr for EntityId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(match trimmed.parse::<i64>() {
            Ok(value) => EntityId::Number(value),
            Err(_) => EntityId::Text(trimmed.to_string()),
        })
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        EntityId::Number(value)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        EntityId::Text(value.to_string())
    }
}

/// A task as reported by the Task Service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: Priority,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<UserId>,
    /// Accumulated tracked seconds (`hoursTaken` on the wire)
    #[serde(
        rename = "hoursTaken",
        default,
        deserialize_with = "lenient_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub accumulated_seconds: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<String>,
}

impl Task {
    /// Raw timestamp of the last transition into `in-progress`.
    ///
    /// `startTime` wins over `updatedAt`; blank strings count as missing.
    pub fn started_at_raw(&self) -> Option<&str> {
        [self.start_time.as_deref(), self.updated_at.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|raw| !raw.is_empty())
    }

    /// Whole seconds already tracked on the service, floored
    pub fn tracked_seconds(&self) -> Option<u64> {
        self.accumulated_seconds.map(|seconds| seconds.floor() as u64)
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == TaskStatus::InProgress
    }
}

/// Aggregate time worked by a user today
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkHours {
    /// Despite the wire name the service reports seconds
    #[serde(rename = "totalHours", default, deserialize_with = "lenient_seconds_or_zero")]
    pub total_hours: f64,
}

impl WorkHours {
    pub fn total_seconds(&self) -> u64 {
        self.total_hours.floor() as u64
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Numbers or numeric strings; anything else (or negative/non-finite) is unknown.
fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|value| match value {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        })
        .filter(|seconds| seconds.is_finite() && *seconds >= 0.0))
}

fn lenient_seconds_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_seconds(deserializer)?.unwrap_or(0.0))
}

/// Timestamps arrive as strings or epoch numbers; both are kept as text and
/// validated later by the consumer.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }))
}
