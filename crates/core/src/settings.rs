//! Layered settings: defaults, then a settings file, then `STOCKROOM__*` environment variables

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::error::{CoreError, CoreResult};
use crate::state_dir::StateDir;

/// Top-level settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Backing API settings
    #[serde(default)]
    pub api: ApiSettings,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Backing API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// API root every request path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Endpoint that exchanges the refresh cookie for a new access cookie
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    /// Route the user is sent to once the session cannot be recovered
    #[serde(default = "default_login_route")]
    pub login_route: String,
    /// Statuses the API uses to say "access credential expired, refresh and retry"
    #[serde(default = "default_auth_expired_statuses")]
    pub auth_expired_statuses: Vec<u16>,
    /// Per-request timeout in seconds (0 = no timeout)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines
    #[serde(default)]
    pub json: bool,
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_refresh_path() -> String {
    "/auth/refresh".to_string()
}

fn default_login_route() -> String {
    "/login".to_string()
}

fn default_auth_expired_statuses() -> Vec<u16> {
    vec![403]
}

const fn default_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            refresh_path: default_refresh_path(),
            login_route: default_login_route(),
            auth_expired_statuses: default_auth_expired_statuses(),
            timeout_secs: default_timeout_secs(),
            user_agent: None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl ApiSettings {
    /// Request timeout, `None` when disabled
    pub const fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }
}

impl Settings {
    /// Load settings from the user settings file, then files in the working
    /// directory, then the environment
    pub fn load(state_dir: &StateDir) -> CoreResult<Self> {
        let user_file = state_dir.settings_path();
        let mut builder = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::from(user_file.as_path()).required(false));

        for path in ["stockroom.toml", "stockroom.yaml", "config/stockroom.toml"] {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path).required(false));
            }
        }

        let settings: Self = builder.add_source(env_source()).build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a specific file, with the environment layered on top
    pub fn load_from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let settings: Self = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::from(path.as_ref()))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the gateway cannot work with
    pub fn validate(&self) -> CoreResult<()> {
        let api = &self.api;

        if api.base_url.trim().is_empty() {
            return Err(CoreError::invalid_config("api.base_url is required"));
        }
        let url = Url::parse(&api.base_url).map_err(|e| {
            CoreError::invalid_config(format!("api.base_url '{}' is invalid: {e}", api.base_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CoreError::invalid_config(format!(
                "api.base_url must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if !api.refresh_path.starts_with('/') {
            return Err(CoreError::invalid_config(
                "api.refresh_path must start with '/'",
            ));
        }

        if api.auth_expired_statuses.is_empty() {
            return Err(CoreError::invalid_config(
                "api.auth_expired_statuses must name at least one status",
            ));
        }
        if let Some(status) = api
            .auth_expired_statuses
            .iter()
            .find(|s| !(400..=499).contains(*s))
        {
            return Err(CoreError::invalid_config(format!(
                "api.auth_expired_statuses: {status} is not a client error status"
            )));
        }

        Ok(())
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("STOCKROOM")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("api.auth_expired_statuses")
        .try_parsing(true)
}
