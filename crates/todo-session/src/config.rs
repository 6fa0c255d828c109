use std::env;

use chrono::Duration as ChronoDuration;
use tracing::warn;

pub const DEFAULT_ADDR: &str = "http://localhost:5208";
pub const DEFAULT_STORAGE_KEY: &str = "authToken";
pub const DEFAULT_REFRESH_SKEW_SECONDS: i64 = 30;
/// One day; anything longer would refresh every token on every call.
pub const MAX_REFRESH_SKEW_SECONDS: i64 = 86_400;

const ADDR_ENV: &str = "TODO_API_URL";
const STORAGE_KEY_ENV: &str = "TODO_STORAGE_KEY";
const REFRESH_SKEW_ENV: &str = "TODO_REFRESH_SKEW_SECONDS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Server origin; API routes live under `{addr}/api`.
    pub addr: String,
    /// Storage slot holding the session token.
    pub storage_key: String,
    /// A token this close to its expiry is refreshed before use.
    pub refresh_skew_seconds: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            refresh_skew_seconds: DEFAULT_REFRESH_SKEW_SECONDS,
        }
    }
}

impl SessionConfig {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let addr = env::var(ADDR_ENV)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.addr);
        let storage_key = match env::var(STORAGE_KEY_ENV) {
            Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
            Ok(value) => {
                warn!(event = "config_invalid", field = STORAGE_KEY_ENV, value = %value);
                defaults.storage_key
            }
            Err(_) => defaults.storage_key,
        };
        let refresh_skew_seconds = match env::var(REFRESH_SKEW_ENV) {
            Ok(value) => match value.trim().parse::<i64>() {
                Ok(seconds) if (0..=MAX_REFRESH_SKEW_SECONDS).contains(&seconds) => seconds,
                _ => {
                    warn!(event = "config_invalid", field = REFRESH_SKEW_ENV, value = %value);
                    defaults.refresh_skew_seconds
                }
            },
            Err(_) => defaults.refresh_skew_seconds,
        };
        Self {
            addr,
            storage_key,
            refresh_skew_seconds,
        }
    }

    #[must_use]
    pub fn api_base(&self) -> String {
        format!("{}/api", self.addr.trim_end_matches('/'))
    }

    #[must_use]
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base(), path.trim_start_matches('/'))
    }

    #[must_use]
    pub fn refresh_skew(&self) -> ChronoDuration {
        let seconds = self.refresh_skew_seconds.clamp(0, MAX_REFRESH_SKEW_SECONDS);
        ChronoDuration::try_seconds(seconds).unwrap_or_else(ChronoDuration::zero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        env::remove_var(ADDR_ENV);
        env::remove_var(STORAGE_KEY_ENV);
        env::remove_var(REFRESH_SKEW_ENV);
    }

    #[test]
    fn api_urls_join_cleanly() {
        let config = SessionConfig::new("http://localhost:5208/");
        assert_eq!(config.api_base(), "http://localhost:5208/api");
        assert_eq!(
            config.api_url("/User/login"),
            "http://localhost:5208/api/User/login"
        );
        assert_eq!(config.api_url("todo/3"), "http://localhost:5208/api/todo/3");
    }

    #[test]
    fn from_env_uses_defaults() {
        let _guard = ENV_LOCK.lock().expect("env lock");
        clear_env();
        assert_eq!(SessionConfig::from_env(), SessionConfig::default());
    }

    #[test]
    fn from_env_reads_overrides() {
        let _guard = ENV_LOCK.lock().expect("env lock");
        clear_env();
        env::set_var(ADDR_ENV, "https://todo.example.com");
        env::set_var(STORAGE_KEY_ENV, "session");
        env::set_var(REFRESH_SKEW_ENV, "5");
        let config = SessionConfig::from_env();
        clear_env();
        assert_eq!(config.addr, "https://todo.example.com");
        assert_eq!(config.storage_key, "session");
        assert_eq!(config.refresh_skew_seconds, 5);
    }

    #[test]
    fn invalid_skew_falls_back() {
        let _guard = ENV_LOCK.lock().expect("env lock");
        clear_env();
        env::set_var(REFRESH_SKEW_ENV, "soon");
        let config = SessionConfig::from_env();
        clear_env();
        assert_eq!(config.refresh_skew_seconds, DEFAULT_REFRESH_SKEW_SECONDS);
    }

    #[test]
    fn out_of_range_skew_falls_back() {
        let _guard = ENV_LOCK.lock().expect("env lock");
        for value in ["10000000000000000", "-1", "86401"] {
            clear_env();
            env::set_var(REFRESH_SKEW_ENV, value);
            let config = SessionConfig::from_env();
            clear_env();
            assert_eq!(config.refresh_skew_seconds, DEFAULT_REFRESH_SKEW_SECONDS, "{value}");
        }
    }

    #[test]
    fn refresh_skew_is_clamped() {
        let mut config = SessionConfig::default();
        config.refresh_skew_seconds = i64::MAX;
        assert_eq!(
            config.refresh_skew(),
            ChronoDuration::seconds(MAX_REFRESH_SKEW_SECONDS)
        );
        config.refresh_skew_seconds = -30;
        assert_eq!(config.refresh_skew(), ChronoDuration::zero());
        config.refresh_skew_seconds = 45;
        assert_eq!(config.refresh_skew(), ChronoDuration::seconds(45));
    }
}
