/*
[INPUT]:  YAML configuration file, token environment variable
[OUTPUT]: Parsed tracker configuration and derived client/session settings
[POS]:    Configuration layer - API endpoint, credentials, timer tuning
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use taskdeck_adapter::{ClientConfig, EntityId, ProjectId, RetryPolicy, UserId};

use crate::session::SessionSettings;

/// Top-level configuration for the tracker
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    /// Project whose tasks are shown; `--project` overrides it
    #[serde(default)]
    pub project_id: Option<EntityId>,
    #[serde(default)]
    pub timer: TimerConfig,
}

/// Task Service connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Retries for idempotent reads
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

/// Bearer token and the user it belongs to
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Inline token; takes precedence over `token_env`
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token: None,
            token_env: default_token_env(),
            user_id: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimerConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_hours_refresh_delay_ms")]
    pub hours_refresh_delay_ms: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            hours_refresh_delay_ms: default_hours_refresh_delay_ms(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    2
}

fn default_token_env() -> String {
    "TASKDECK_TOKEN".to_string()
}

fn default_tick_interval_ms() -> u64 {
    1_000
}

fn default_hours_refresh_delay_ms() -> u64 {
    600
}

impl TrackerConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(content).context("parse config yaml")?;
        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/taskdeck/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("taskdeck").join("config.yaml"))
    }

    /// Load `path`, or the default location when it exists, or built-in defaults
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Inline token, else the configured environment variable; blank counts as unset
    pub fn resolve_token(&self) -> Option<String> {
        self.auth
            .token
            .clone()
            .or_else(|| std::env::var(&self.auth.token_env).ok())
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }

    pub fn project(&self, overridden: Option<ProjectId>) -> anyhow::Result<ProjectId> {
        overridden
            .or_else(|| self.project_id.clone())
            .context("no project id: pass --project or set project_id in the config file")
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.api.timeout_secs),
            connect_timeout: Duration::from_secs(self.api.connect_timeout_secs),
            retry: RetryPolicy {
                max_retries: self.api.max_retries,
                ..RetryPolicy::default()
            },
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            tick_interval: Duration::from_millis(self.timer.tick_interval_ms),
            hours_refresh_delay: Duration::from_millis(self.timer.hours_refresh_delay_ms),
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.timer.tick_interval_ms > 0,
            "timer.tick_interval_ms must be positive"
        );
        anyhow::ensure!(self.api.timeout_secs > 0, "api.timeout_secs must be positive");
        Ok(())
    }
}
