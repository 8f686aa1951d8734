use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::gateway::RouteStyle;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HuddleConfig {
    pub gateway: GatewayConfig,
    pub polling: PollingConfig,
    pub logging: LoggingConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub routes: RouteStyle,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Agent discussion rounds wait on model output and get their own budget.
    #[serde(default = "default_discuss_timeout")]
    pub discuss_timeout_secs: u64,

    #[serde(default)]
    pub show_hidden_agents: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json_format: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_sender")]
    pub default_sender: String,
}

fn default_base_url() -> String {
    "http://localhost:1337".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_connect_timeout() -> u64 {
    2000
}

fn default_discuss_timeout() -> u64 {
    120
}

fn default_poll_interval() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_sender() -> String {
    "user".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            routes: RouteStyle::default(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_ms: default_connect_timeout(),
            discuss_timeout_secs: default_discuss_timeout(),
            show_hidden_agents: false,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_sender: default_sender(),
        }
    }
}

impl GatewayConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn discuss_timeout(&self) -> Duration {
        Duration::from_secs(self.discuss_timeout_secs)
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl HuddleConfig {
    pub fn load() -> Result<Self, ConfigLoadError> {
        Self::load_from_paths(get_config_paths())
    }

    pub fn load_from_paths(paths: Vec<PathBuf>) -> Result<Self, ConfigLoadError> {
        load_dotenv_files();

        let mut builder = ConfigBuilder::builder();

        for path in paths {
            if path.exists() {
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("HUDDLE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut huddle_config: HuddleConfig = builder.build()?.try_deserialize()?;

        if let Ok(url) = std::env::var("HUDDLE_GATEWAY_URL") {
            huddle_config.gateway.base_url = url;
        }

        if let Ok(level) = std::env::var("HUDDLE_LOG_LEVEL") {
            huddle_config.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            huddle_config.logging.level = level;
        }

        if let Ok(interval) = std::env::var("HUDDLE_POLL_INTERVAL_MS") {
            if let Ok(ms) = interval.parse() {
                huddle_config.polling.interval_ms = ms;
            }
        }

        huddle_config.validate()?;

        Ok(huddle_config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        let url = self.gateway.base_url.trim();
        if url.is_empty() {
            return Err(ConfigLoadError::MissingRequired(
                "gateway.base_url".to_string(),
            ));
        }

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigLoadError::InvalidValue {
                key: "gateway.base_url".to_string(),
                message: "Must start with http:// or https://".to_string(),
            });
        }

        if self.polling.interval_ms == 0 {
            return Err(ConfigLoadError::InvalidValue {
                key: "polling.interval_ms".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        for (key, value) in [
            ("gateway.request_timeout_secs", self.gateway.request_timeout_secs),
            ("gateway.connect_timeout_ms", self.gateway.connect_timeout_ms),
            ("gateway.discuss_timeout_secs", self.gateway.discuss_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigLoadError::InvalidValue {
                    key: key.to_string(),
                    message: "Must be greater than 0".to_string(),
                });
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        let level_lower = self.logging.level.to_lowercase();
        if !valid_levels.contains(&level_lower.as_str()) && !level_lower.contains('=') {
            return Err(ConfigLoadError::InvalidValue {
                key: "logging.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Must be one of: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        if self.chat.default_sender.trim().is_empty() {
            return Err(ConfigLoadError::InvalidValue {
                key: "chat.default_sender".to_string(),
                message: "Must not be blank".to_string(),
            });
        }

        Ok(())
    }

    pub fn base_url(&self) -> &str {
        &self.gateway.base_url
    }

    pub fn log_level(&self) -> &str {
        &self.logging.level
    }

    pub fn poll_interval(&self) -> Duration {
        self.polling.interval()
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join("config").join("default.toml"));
        paths.push(cwd.join("config").join("local.toml"));
        paths.push(cwd.join("huddle.toml"));
    }

    if let Some(config_dir) = get_config_dir() {
        paths.push(config_dir.join("config.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".huddle").join("config.toml"));
    }

    paths
}

fn load_dotenv_files() {
    for path in get_dotenv_paths() {
        if path.exists() {
            let _ = dotenvy::from_path(&path);
        }
    }
}

fn get_dotenv_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".env"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".huddle").join(".env"));
    }

    paths
}

pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("huddle"))
}
