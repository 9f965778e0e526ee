/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared fixtures for board and timer session tests
[POS]:    Test infrastructure - shared across tracker test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for taskdeck-tracker tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use taskdeck_adapter::{
    ClientConfig, EntityId, MockTaskService, Priority, RetryPolicy, Task, TaskStatus,
    TaskdeckClient,
};
use taskdeck_tracker::{Notice, Notifier, SessionSettings, TimerSession};
use tokio::sync::mpsc::UnboundedReceiver;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PROJECT_ID: i64 = 3;
pub const USER_ID: i64 = 4;

/// Client for the mock server with a token and no read retries
pub fn client_for(server: &MockServer) -> TaskdeckClient {
    let config = ClientConfig {
        retry: RetryPolicy::none(),
        ..ClientConfig::default()
    };
    let client =
        TaskdeckClient::with_config_and_base_url(config, &server.uri()).expect("client init");
    client.set_token("test-token", Some(EntityId::Number(USER_ID)));
    client
}

pub fn test_settings() -> SessionSettings {
    SessionSettings {
        tick_interval: Duration::from_secs(1),
        hours_refresh_delay: Duration::from_millis(600),
    }
}

pub fn task(id: i64, status: TaskStatus) -> Task {
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

pub fn task_json(id: i64, status: &str) -> Value {
    json!({
        "id": id,
        "title": format!("task {id}"),
        "priority": "medium",
        "status": status,
        "assigneeId": USER_ID
    })
}

/// Session over an in-memory service, with notices captured
pub fn mock_session(service: Arc<MockTaskService>) -> (TimerSession, UnboundedReceiver<Notice>) {
    let (notifier, rx) = Notifier::channel();
    let session = TimerSession::new(
        service,
        EntityId::Number(PROJECT_ID),
        Some(EntityId::Number(USER_ID)),
        test_settings(),
        notifier,
    );
    (session, rx)
}

/// Serve the four board columns of `PROJECT_ID`
pub async fn mount_columns(server: &MockServer, columns: [Vec<Value>; 4]) {
    for (status, tasks) in ["todo", "in-progress", "review", "done"].into_iter().zip(columns) {
        Mock::given(method("GET"))
            .and(path(format!("/tasks/status/{status}/{PROJECT_ID}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(tasks)))
            .mount(server)
            .await;
    }
}

/// Drain notices raised so far
pub fn drain(rx: &mut UnboundedReceiver<Notice>) -> Vec<Notice> {
    let mut notices = Vec::new();
    while let Ok(notice) = rx.try_recv() {
        notices.push(notice);
    }
    notices
}
