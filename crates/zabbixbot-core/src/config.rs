//! Configuration management for zabbixbot
//!
//! Configuration is read once at startup from an optional dotenv file
//! (`data.env` by default) and the process environment. Variables already
//! set in the environment win over the file.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{GroupId, MAX_SEVERITY};

/// Dotenv file read when no other path is given
pub const DEFAULT_ENV_FILE: &str = "data.env";

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Telegram Bot API configuration
    pub telegram: TelegramConfig,

    /// Zabbix JSON-RPC backend configuration
    pub backend: BackendConfig,

    /// Host groups and severity filter
    pub groups: GroupsConfig,

    /// Scheduled push configuration
    pub push: PushConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Telegram Bot API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot credential
    pub bot_token: String,
    /// Chats allowed to talk to the bot (empty = everyone)
    pub allowed_chat_ids: Vec<i64>,
    /// Bot API base URL
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            allowed_chat_ids: Vec::new(),
            api_base: "https://api.telegram.org".to_string(),
        }
    }
}

impl TelegramConfig {
    /// Fail unless a bot credential is configured
    pub fn ensure_token(&self) -> Result<()> {
        if self.bot_token.is_empty() {
            return Err(Error::config("BOT_TOKEN is not set"));
        }
        Ok(())
    }
}

/// Zabbix backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// JSON-RPC endpoint, e.g. `https://zabbix.example.com/zabbix/api_jsonrpc.php`
    pub url: String,
    /// Static API token placed in the envelope's `auth` field
    pub auth_token: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            auth_token: String::new(),
            timeout_ms: 30_000,
        }
    }
}

impl BackendConfig {
    /// Request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Host groups queried by the bot commands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupsConfig {
    /// Minimum severity a problem needs to be shown
    pub min_severity: u8,
    /// Group queried by `/getcurrentproblemsilo`
    pub ilo_group: GroupId,
    /// Groups queried by `/agent_problems`, in display order
    pub agent_groups: Vec<GroupId>,
}

impl Default for GroupsConfig {
    fn default() -> Self {
        Self {
            min_severity: 2,
            ilo_group: 41,
            agent_groups: vec![40, 39, 38, 37, 36],
        }
    }
}

/// Scheduled push of problem reports to a fixed chat
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushConfig {
    /// Chat receiving the pushed reports
    pub chat_id: Option<i64>,
    /// Push interval in seconds (0 = disabled)
    pub interval_seconds: u64,
}

impl PushConfig {
    /// Check whether scheduled pushes are configured
    pub fn is_enabled(&self) -> bool {
        self.chat_id.is_some() && self.interval_seconds > 0
    }

    /// Push interval as a `Duration`
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (json or pretty)
    pub format: String,
    /// Optional log file, written in addition to stderr
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load from `data.env` (if present) and the environment
    pub fn from_env() -> Result<Self> {
        Self::from_env_file(DEFAULT_ENV_FILE)
    }

    /// Load from the given dotenv file (if present) and the environment
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_sources(Some(path.as_ref()), |key| std::env::var(key).ok())
    }

    /// Load from an optional dotenv file and an environment lookup.
    ///
    /// The process environment is never modified.
    pub fn from_sources<F>(env_file: Option<&Path>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file_vars = match env_file {
            Some(path) => read_env_file(path)?,
            None => HashMap::new(),
        };

        let lookup = |key: &str| -> Option<String> {
            env(key)
                .or_else(|| file_vars.get(key).cloned())
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self::from_lookup(lookup)
    }

    /// Build and validate a configuration from a key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        // Checked by `TelegramConfig::ensure_token` when the bot starts
        config.telegram.bot_token = lookup("BOT_TOKEN").unwrap_or_default();
        config.backend.url = required(&lookup, &["API_URL", "api_url"])?;
        config.backend.auth_token = required(&lookup, &["API_TOKEN", "api_token"])?;

        if let Some(raw) = lookup("TELEGRAM_API_BASE") {
            config.telegram.api_base = raw.trim_end_matches('/').to_string();
        }
        if let Some(raw) = lookup("ALLOWED_CHAT_IDS") {
            config.telegram.allowed_chat_ids = parse_list("ALLOWED_CHAT_IDS", &raw)?;
        }
        if let Some(raw) = lookup("API_TIMEOUT") {
            let timeout = parse_duration("API_TIMEOUT", &raw)?;
            config.backend.timeout_ms = u64::try_from(timeout.as_millis())
                .map_err(|_| Error::config(format!("API_TIMEOUT is too large: {raw}")))?;
        }
        if let Some(raw) = lookup("MIN_SEVERITY") {
            config.groups.min_severity = parse_value("MIN_SEVERITY", &raw)?;
        }
        if let Some(raw) = lookup("ILO_GROUP") {
            config.groups.ilo_group = parse_value("ILO_GROUP", &raw)?;
        }
        if let Some(raw) = lookup("AGENT_GROUPS") {
            config.groups.agent_groups = parse_list("AGENT_GROUPS", &raw)?;
        }
        if let Some(raw) = lookup("PUSH_CHAT_ID") {
            config.push.chat_id = Some(parse_value("PUSH_CHAT_ID", &raw)?);
        }
        if let Some(raw) = lookup("PUSH_INTERVAL") {
            config.push.interval_seconds = parse_duration("PUSH_INTERVAL", &raw)?.as_secs();
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            config.logging.format = format.to_lowercase();
        }
        config.logging.file = lookup("LOG_FILE");

        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.backend.auth_token.is_empty() {
            return Err(Error::config("API_TOKEN must be non-empty"));
        }

        let url = url::Url::parse(&self.backend.url)
            .map_err(|e| Error::config(format!("API_URL is not a valid URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "API_URL must use http or https, got {}",
                url.scheme()
            )));
        }

        if self.backend.timeout_ms == 0 {
            return Err(Error::config("API_TIMEOUT must be > 0"));
        }
        if self.groups.min_severity > MAX_SEVERITY {
            return Err(Error::config(format!(
                "MIN_SEVERITY must be between 0 and {MAX_SEVERITY}, got {}",
                self.groups.min_severity
            )));
        }
        if self.push.chat_id.is_some() && self.push.interval_seconds == 0 {
            return Err(Error::config(
                "PUSH_INTERVAL must be at least 1s when PUSH_CHAT_ID is set",
            ));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(Error::config(format!(
                "LOG_FORMAT must be pretty or json, got {}",
                self.logging.format
            )));
        }

        Ok(())
    }
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => {
            debug!(path = %path.display(), "No env file, using environment only");
            return Ok(HashMap::new());
        }
        Err(e) => {
            return Err(Error::config(format!(
                "failed to read {}: {e}",
                path.display()
            )))
        }
    };

    let mut vars = HashMap::new();
    for item in iter {
        let (key, value) = item.map_err(|e| {
            Error::config(format!("failed to parse {}: {e}", path.display()))
        })?;
        vars.insert(key, value);
    }

    debug!(path = %path.display(), count = vars.len(), "Loaded env file");
    Ok(vars)
}

fn required<F>(lookup: &F, keys: &[&str]) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter()
        .find_map(|key| lookup(key))
        .ok_or_else(|| Error::config(format!("{} is not set", keys[0])))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::config(format!("{key} has invalid value {raw:?}: {e}")))
}

fn parse_list<T>(key: &str, raw: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| parse_value(key, item))
        .collect()
}

fn parse_duration(key: &str, raw: &str) -> Result<Duration> {
    humantime::parse_duration(raw.trim())
        .map_err(|e| Error::config(format!("{key} has invalid duration {raw:?}: {e}")))
}
