use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

pub const DEFAULT_RESPONSE_TEMPLATE: &str =
    "Based on your tweet, here's a meme coin name suggestion: {coinName}\n\nReasoning: {reasoning}";

static HANDLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{1,15}$").unwrap());

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Handle the bot posts under; mentions of this handle trigger replies.
    pub username: String,
    /// Identity component of processed-record keys. Distinct agents sharing
    /// a store must not shadow each other's idempotence markers.
    pub agent_id: String,
    /// Accounts whose fresh original posts are also picked up, at most one
    /// per account per poll cycle.
    pub target_users: Vec<String>,
    pub poll_interval_secs: u64,
    pub mention_fetch_limit: usize,
    pub target_fetch_limit: usize,
    /// Target-user posts older than this are ignored.
    pub freshness_window_secs: u64,
    pub max_thread_depth: usize,
    pub openai_api_key: String,
    pub openai_model: String,
    pub response_template: String,
    /// When set, replies are logged instead of posted.
    pub dry_run: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            agent_id: String::new(),
            target_users: Vec::new(),
            poll_interval_secs: 120,
            mention_fetch_limit: 20,
            target_fetch_limit: 3,
            freshness_window_secs: 2 * 60 * 60,
            max_thread_depth: 10,
            openai_api_key: String::new(),
            openai_model: "gpt-4".to_owned(),
            response_template: DEFAULT_RESPONSE_TEMPLATE.to_owned(),
            dry_run: false,
        }
    }
}

impl BotConfig {
    pub fn config_file_path() -> Result<PathBuf, std::io::Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "no config directory")
        })?;
        let app_dir = config_dir.join("memebot");
        std::fs::create_dir_all(&app_dir)?;
        Ok(app_dir.join("config.json"))
    }

    /// Load the config file, falling back to defaults (and writing them out)
    /// when it is missing or unreadable.
    pub fn load() -> Self {
        match Self::load_from_file() {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, "could not load config, using defaults");
                let default_config = Self::default();
                if let Err(save_err) = default_config.save() {
                    warn!(error = %save_err, "could not save default config");
                }
                default_config
            }
        }
    }

    fn load_from_file() -> Result<Self, Box<dyn std::error::Error>> {
        let path = Self::config_file_path()?;
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let path = Self::config_file_path()?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Startup validation. All violations are aggregated into a single
    /// message so a misconfigured deployment surfaces every problem at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if !HANDLE_RE.is_match(&self.username) {
            problems.push(format!(
                "username: {:?} is not a valid handle (1-15 letters, digits or underscores)",
                self.username
            ));
        }
        for user in &self.target_users {
            if !HANDLE_RE.is_match(user) {
                problems.push(format!(
                    "target_users: {user:?} is not a valid handle (1-15 letters, digits or underscores)"
                ));
            }
        }
        if self.agent_id.is_empty() {
            problems.push("agent_id: must not be empty".to_owned());
        }
        if self.openai_api_key.is_empty() {
            problems.push("openai_api_key: API key is required".to_owned());
        }
        if self.max_thread_depth == 0 {
            problems.push("max_thread_depth: must be at least 1".to_owned());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems.join("\n")))
        }
    }
}
