/*
[INPUT]:  HTTP client configuration and Task Service endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod client;
pub mod error;
pub mod reports;
pub mod service;
pub mod tasks;
pub mod time;

pub use error::{Result, TaskdeckError};
pub use service::{MockTaskService, ServiceCall, ServiceOp, TaskService};

pub use client::{ClientConfig, RetryPolicy, TaskdeckClient};
