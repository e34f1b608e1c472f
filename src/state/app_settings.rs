use fpl_api::client::{DEFAULT_TIMEOUT, FPL_BOOTSTRAP_URL};
use log::LevelFilter;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_DEADLINE_URL: &str = "FPLTUI_DEADLINE_URL";
pub const ENV_TIMEOUT_SECS: &str = "FPLTUI_TIMEOUT_SECS";
pub const ENV_AUTO_REFRESH: &str = "FPLTUI_AUTO_REFRESH";
pub const ENV_LOG_LEVEL: &str = "FPLTUI_LOG_LEVEL";
pub const ENV_TEAM_ID: &str = "FPLTUI_TEAM_ID";

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub full_screen: bool,
    pub log_level: Option<LevelFilter>,
    /// Direct FPL feed or a backend proxy route serving the same payload.
    pub deadline_url: String,
    pub request_timeout: Duration,
    pub auto_refresh: bool,
    pub team_id: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            full_screen: false,
            log_level: Some(LevelFilter::Info),
            deadline_url: FPL_BOOTSTRAP_URL.to_string(),
            request_timeout: DEFAULT_TIMEOUT,
            auto_refresh: true,
            team_id: None,
        }
    }
}

impl AppSettings {
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Unset, blank or unparsable values
    /// keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Self {
            full_screen: false,
            log_level: get(ENV_LOG_LEVEL)
                .and_then(|v| LevelFilter::from_str(&v).ok())
                .or(defaults.log_level),
            deadline_url: get(ENV_DEADLINE_URL).unwrap_or(defaults.deadline_url),
            request_timeout: get(ENV_TIMEOUT_SECS)
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            auto_refresh: get(ENV_AUTO_REFRESH).and_then(|v| parse_flag(&v)).unwrap_or(defaults.auto_refresh),
            team_id: get(ENV_TEAM_ID),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
