//! Runtime configuration from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Configuration errors, fatal at startup only.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is absent.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is present but does not parse.
    #[error("invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}

/// All recognized options, with defaults applied.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token.
    pub bot_token: String,
    /// Google API key for the Drive API.
    pub google_api_key: String,
    /// Root folder of the browsed tree.
    pub root_folder_id: String,
    /// Chat every announcement is broadcast into; also the membership
    /// group for the gate.
    pub broadcast_chat_id: i64,
    /// Listing cache freshness window.
    pub cache_ttl: Duration,
    /// Pause between scan cycles.
    pub scan_interval: Duration,
    /// Depth bound for module subtree scans.
    pub max_scan_depth: u32,
    /// Cap on announcements per module per cycle.
    pub max_notify_per_cycle: usize,
    /// Lowest module key eligible for notification.
    pub min_module_key: u32,
    /// Items per menu page.
    pub page_size: usize,
    /// Port for the liveness endpoint.
    pub health_port: u16,
    /// Path of the state document.
    pub state_path: PathBuf,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            bot_token: required(&lookup, "BOT_TOKEN")?,
            google_api_key: required(&lookup, "GOOGLE_API_KEY")?,
            root_folder_id: required(&lookup, "ROOT_FOLDER_ID")?,
            broadcast_chat_id: parsed(&lookup, "BROADCAST_CHAT_ID", None)?,
            cache_ttl: Duration::from_secs(parsed(&lookup, "CACHE_TTL_SECS", Some(300))?),
            scan_interval: Duration::from_secs(parsed(&lookup, "SCAN_INTERVAL_SECS", Some(600))?),
            max_scan_depth: parsed(&lookup, "MAX_SCAN_DEPTH", Some(3))?,
            max_notify_per_cycle: parsed(&lookup, "MAX_NOTIFY_PER_CYCLE", Some(6))?,
            min_module_key: parsed(&lookup, "MIN_MODULE_KEY", Some(17))?,
            page_size: parsed(&lookup, "PAGE_SIZE", Some(25))?,
            health_port: parsed(&lookup, "HEALTH_PORT", Some(8080))?,
            state_path: PathBuf::from(
                lookup("STATE_PATH").unwrap_or_else(|| "state.json".to_string()),
            ),
        })
    }
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parsed<F, T>(lookup: &F, name: &'static str, default: Option<T>) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid(name, value)),
        None => default.ok_or(ConfigError::Missing(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("BOT_TOKEN", "tok"),
            ("GOOGLE_API_KEY", "key"),
            ("ROOT_FOLDER_ID", "root"),
            ("BROADCAST_CHAT_ID", "-100"),
        ])
    }

    fn config_from(env: &HashMap<&str, &str>) -> Result<Config, ConfigError> {
        Config::from_lookup(|name| env.get(name).map(|v| v.to_string()))
    }

    #[test]
    fn defaults_apply() {
        let config = config_from(&base_env()).unwrap();
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.scan_interval, Duration::from_secs(600));
        assert_eq!(config.max_scan_depth, 3);
        assert_eq!(config.max_notify_per_cycle, 6);
        assert_eq!(config.min_module_key, 17);
        assert_eq!(config.page_size, 25);
        assert_eq!(config.state_path, PathBuf::from("state.json"));
    }

    #[test]
    fn missing_required_variable_fails() {
        let mut env = base_env();
        env.remove("BOT_TOKEN");
        assert!(matches!(
            config_from(&env),
            Err(ConfigError::Missing("BOT_TOKEN"))
        ));
    }

    #[test]
    fn invalid_number_fails() {
        let mut env = base_env();
        env.insert("CACHE_TTL_SECS", "soon");
        assert!(matches!(
            config_from(&env),
            Err(ConfigError::Invalid("CACHE_TTL_SECS", _))
        ));
    }

    #[test]
    fn overrides_win_over_defaults() {
        let mut env = base_env();
        env.insert("MAX_SCAN_DEPTH", "5");
        env.insert("MIN_MODULE_KEY", "1");
        let config = config_from(&env).unwrap();
        assert_eq!(config.max_scan_depth, 5);
        assert_eq!(config.min_module_key, 1);
    }
}
