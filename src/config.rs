//! Runtime configuration from environment variables

use std::str::FromStr;
use std::time::Duration;

use crate::nhl::DEFAULT_API_BASE;

const DEFAULT_PORT: u16 = 4567;
const DEFAULT_POLL_SECS: u64 = 5;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `PORT`
    pub port: u16,
    /// `NHL_API_BASE`
    pub api_base: String,
    /// `POLL_INTERVAL_SECS`
    pub poll_interval: Duration,
    /// `GAME_DELAY_MS`, used when a game is started without a delay
    pub default_delay: Duration,
    /// `COLOR_SEED`; logo clustering uses entropy when unset
    pub color_seed: Option<u64>,
    /// `HTTP_TIMEOUT_SECS`, applied to every upstream request
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            api_base: DEFAULT_API_BASE.to_string(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECS),
            default_delay: Duration::ZERO,
            color_seed: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring unparsable {}={:?}", key, raw);
            None
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; missing or bad values keep the default
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            port: parsed(&lookup, "PORT").unwrap_or(defaults.port),
            api_base: lookup("NHL_API_BASE")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.api_base),
            poll_interval: parsed(&lookup, "POLL_INTERVAL_SECS")
                .filter(|&secs: &u64| secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval),
            default_delay: parsed(&lookup, "GAME_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.default_delay),
            color_seed: parsed(&lookup, "COLOR_SEED"),
            request_timeout: parsed(&lookup, "HTTP_TIMEOUT_SECS")
                .filter(|&secs: &u64| secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[]);
        assert_eq!(config, Config::default());
        assert_eq!(config.port, 4567);
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("PORT", "8080"),
            ("NHL_API_BASE", "http://localhost:9000/v1"),
            ("POLL_INTERVAL_SECS", "2"),
            ("GAME_DELAY_MS", "30000"),
            ("COLOR_SEED", "42"),
            ("HTTP_TIMEOUT_SECS", "3"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.api_base, "http://localhost:9000/v1");
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.default_delay, Duration::from_secs(30));
        assert_eq!(config.color_seed, Some(42));
        assert_eq!(config.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = from_pairs(&[("PORT", "http"), ("POLL_INTERVAL_SECS", "0"), ("GAME_DELAY_MS", "-5")]);
        assert_eq!(config.port, 4567);
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.default_delay, Duration::ZERO);
    }
}
