//! Bot configuration from environment variables

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_STORAGE_TIMEOUT_SECS: u64 = 5;
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has invalid value {value:?}: expected {expected}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Runtime configuration
pub struct BotConfig {
    pub telegram_token: String,
    pub db_path: PathBuf,
    pub storage_timeout: Duration,
    pub poll_timeout: Duration,
    pub seed_words: bool,
}

impl std::fmt::Debug for BotConfig {
    // The token never goes to the logs
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("telegram_token", &"<redacted>")
            .field("db_path", &self.db_path)
            .field("storage_timeout", &self.storage_timeout)
            .field("poll_timeout", &self.poll_timeout)
            .field("seed_words", &self.seed_words)
            .finish()
    }
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let telegram_token = lookup("TELEGRAM_BOT_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;

        let db_path = lookup("WORD_QUEST_DB_PATH").map_or_else(
            || {
                let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(format!("{home}/.word-quest/words.db"))
            },
            PathBuf::from,
        );

        let storage_timeout = parse_secs(
            "WORD_QUEST_STORAGE_TIMEOUT_SECS",
            lookup("WORD_QUEST_STORAGE_TIMEOUT_SECS"),
            DEFAULT_STORAGE_TIMEOUT_SECS,
        )?;
        let poll_timeout = parse_secs(
            "WORD_QUEST_POLL_TIMEOUT_SECS",
            lookup("WORD_QUEST_POLL_TIMEOUT_SECS"),
            DEFAULT_POLL_TIMEOUT_SECS,
        )?;
        let seed_words = parse_bool(
            "WORD_QUEST_SEED_WORDS",
            lookup("WORD_QUEST_SEED_WORDS"),
            true,
        )?;

        Ok(Self {
            telegram_token,
            db_path,
            storage_timeout,
            poll_timeout,
            seed_words,
        })
    }
}

fn parse_secs(
    name: &'static str,
    value: Option<String>,
    default: u64,
) -> Result<Duration, ConfigError> {
    let Some(value) = value else {
        return Ok(Duration::from_secs(default));
    };
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::Invalid {
            name,
            value,
            expected: "a positive number of seconds",
        }),
    }
}

fn parse_bool(
    name: &'static str,
    value: Option<String>,
    default: bool,
) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value,
            expected: "true or false",
        }),
    }
}
