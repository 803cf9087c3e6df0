//! Startup configuration from environment variables

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_CURRENCY: &str = "₹";
const DEFAULT_RECENT_COUNT: usize = 5;
const DEFAULT_SESSION_IDLE_MINUTES: u64 = 12 * 60;
const DEFAULT_MAX_SESSIONS: usize = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Language model settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    /// exe.dev style gateway URL; when set the gateway holds the key
    pub gateway: Option<String>,
    pub model: String,
}

impl LlmConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() || self.gateway.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `.csv` selects the spreadsheet backend, anything else SQLite
    pub ledger_path: PathBuf,
    pub port: u16,
    /// Login password; `None` leaves the app open
    pub password: Option<String>,
    pub currency: String,
    /// Rows shown in the dashboard's recent list
    pub recent_count: usize,
    /// Sessions unused for this long are forgotten
    pub session_idle: Duration,
    pub max_sessions: usize,
    pub llm: LlmConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let ledger_path = get("EXPENSE_LEDGER_PATH").map_or_else(
            || {
                let home = get("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(format!("{home}/.expense-chat/ledger.db"))
            },
            PathBuf::from,
        );

        let idle_minutes: u64 = parse_or(
            "EXPENSE_SESSION_IDLE_MINUTES",
            get("EXPENSE_SESSION_IDLE_MINUTES"),
            DEFAULT_SESSION_IDLE_MINUTES,
        )?;

        Ok(Self {
            ledger_path,
            port: parse_or("EXPENSE_PORT", get("EXPENSE_PORT"), DEFAULT_PORT)?,
            password: get("APP_PASSWORD"),
            currency: get("EXPENSE_CURRENCY").unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            recent_count: parse_or(
                "EXPENSE_RECENT_COUNT",
                get("EXPENSE_RECENT_COUNT"),
                DEFAULT_RECENT_COUNT,
            )?,
            session_idle: Duration::from_secs(idle_minutes.saturating_mul(60)),
            max_sessions: parse_or(
                "EXPENSE_MAX_SESSIONS",
                get("EXPENSE_MAX_SESSIONS"),
                DEFAULT_MAX_SESSIONS,
            )?,
            llm: LlmConfig {
                api_key: get("GOOGLE_API_KEY"),
                gateway: get("LLM_GATEWAY"),
                model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            },
        })
    }
}

fn parse_or<T: FromStr>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}
