/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for taskdeck-adapter tests

use std::time::Duration;

use taskdeck_adapter::{ClientConfig, RetryPolicy, TaskdeckClient};
use wiremock::MockServer;

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Mock bearer token for testing
pub fn mock_token() -> String {
    "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.test.signature".to_string()
}

/// Client pointed at the mock server with fast retries
#[allow(dead_code)]
pub fn fast_retry_client(server: &MockServer) -> TaskdeckClient {
    let config = ClientConfig {
        retry: RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
        },
        ..ClientConfig::default()
    };
    let client = TaskdeckClient::with_config_and_base_url(config, &server.uri())
        .expect("client init");
    client.set_token(mock_token(), None);
    client
}
