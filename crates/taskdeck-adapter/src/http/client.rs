/*
[INPUT]:  HTTP configuration (base URL, timeouts, retry budget, bearer token)
[OUTPUT]: Configured reqwest client ready for Task Service calls
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::TokenStore;
use crate::http::{Result, TaskdeckError};
use crate::types::UserId;

/// Base URL of a locally running Task Service
const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Backoff settings for idempotent reads
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Never retry
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Exponential delay for the given zero-based attempt, capped at `max_delay`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let delay = self.base_delay * 2_u32.pow(attempt.min(5));
        delay.min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

/// Main HTTP client for the Task Service
#[derive(Debug, Clone)]
pub struct TaskdeckClient {
    http_client: Client,
    base_url: Url,
    tokens: TokenStore,
    timeout: Duration,
    retry: RetryPolicy,
}

impl TaskdeckClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Self::with_config_and_base_url(config, DEFAULT_BASE_URL)
    }

    /// Create a new client pointed at an explicit API root
    pub fn with_config_and_base_url(config: ClientConfig, base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        let mut base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(TaskdeckError::Config(format!(
                "base URL cannot carry a path: {base_url}"
            )));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http_client,
            base_url,
            tokens: TokenStore::new(),
            timeout: config.timeout,
            retry: config.retry,
        })
    }

    /// Share an existing token store with this client
    pub fn with_tokens(mut self, tokens: TokenStore) -> Self {
        self.tokens = tokens;
        self
    }

    /// Store the bearer token used for every request
    pub fn set_token(&self, token: impl Into<String>, user_id: Option<UserId>) {
        self.tokens.set_token(token, user_id);
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build full URL from path segments; each segment is percent-encoded
    pub(crate) fn endpoint_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                TaskdeckError::Config(format!("base URL cannot carry a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build a request carrying `Authorization: Bearer <token>`
    ///
    /// Without a token nothing is sent.
    pub(crate) fn authorized_request(&self, method: Method, url: Url) -> Result<RequestBuilder> {
        let Some(token) = self.tokens.get_token() else {
            debug!(%url, "no bearer token, suppressing request");
            return Err(TaskdeckError::MissingToken);
        };
        if self.tokens.is_expired() {
            return Err(TaskdeckError::TokenExpired);
        }

        debug!(%method, %url, "sending request");
        Ok(self.http_client.request(method, url).bearer_auth(token))
    }

    /// Send and decode a JSON body
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.execute(builder).await?;
        let body = response
            .text()
            .await
            .map_err(|err| self.transport_error(err))?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Send and only check the status code
    pub(crate) async fn send_ack(&self, builder: RequestBuilder) -> Result<()> {
        self.execute(builder).await?;
        Ok(())
    }

    /// Authorized GET with retry and backoff on transient failures
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let mut attempt = 0;
        loop {
            let builder = self.authorized_request(Method::GET, url.clone())?;
            match self.send_json(builder).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.retry.max_retries => {
                    let delay = err
                        .retry_delay()
                        .map(Duration::from_secs)
                        .unwrap_or_else(|| self.retry.backoff(attempt))
                        .min(self.retry.max_delay);
                    warn!(
                        %url,
                        attempt = attempt + 1,
                        error = %err,
                        delay_ms = delay.as_millis() as u64,
                        "retrying request"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;
        check_status(response).await
    }

    fn transport_error(&self, err: reqwest::Error) -> TaskdeckError {
        if err.is_timeout() {
            TaskdeckError::Timeout {
                duration: self.timeout.as_secs(),
            }
        } else {
            TaskdeckError::Http(err)
        }
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(1);
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body, status);

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            TaskdeckError::Authentication { message }
        }
        StatusCode::TOO_MANY_REQUESTS => TaskdeckError::RateLimit { retry_after },
        _ => TaskdeckError::api_error(status, message),
    })
}

/// Prefer `message`/`error` from a JSON body, then the raw body, then the reason phrase
fn error_message(body: &str, status: StatusCode) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error"].iter().find_map(|key| {
                value
                    .get(*key)
                    .and_then(|message| message.as_str())
                    .map(str::to_string)
            })
        })
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        })
}
