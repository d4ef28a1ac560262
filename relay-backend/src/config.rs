use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://api.perplexity.ai";
const DEFAULT_MODEL: &str = "sonar-pro";
const DEFAULT_MAX_TOKENS: u32 = 2048;
const DEFAULT_ALLOWED_ORIGIN: &str = "http://127.0.0.1:5500";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key}={value:?} is invalid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub max_tokens: u32,
    pub allowed_origin: String,
    pub bind: SocketAddr,
    pub upstream_timeout: Duration,
}

// keeps the key out of logs
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("allowed_origin", &self.allowed_origin)
            .field("bind", &self.bind)
            .field("upstream_timeout", &self.upstream_timeout)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Reads `RELAY_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_key = get("RELAY_API_KEY").ok_or(ConfigError::Missing("RELAY_API_KEY"))?;

        Ok(Self {
            api_key,
            api_base: get("RELAY_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: get("RELAY_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: parse_or(get("RELAY_MAX_TOKENS"), "RELAY_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            allowed_origin: get("RELAY_ALLOWED_ORIGIN")
                .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string()),
            bind: parse_or(
                get("RELAY_BIND"),
                "RELAY_BIND",
                SocketAddr::from(([127, 0, 0, 1], 3000)),
            )?,
            upstream_timeout: Duration::from_secs(parse_or(
                get("RELAY_UPSTREAM_TIMEOUT_SECS"),
                "RELAY_UPSTREAM_TIMEOUT_SECS",
                DEFAULT_UPSTREAM_TIMEOUT_SECS,
            )?),
        })
    }
}

fn parse_or<T>(value: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("RELAY_API_KEY", "secret")])).unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.api_base, "https://api.perplexity.ai");
        assert_eq!(config.model, "sonar-pro");
        assert_eq!(config.max_tokens, 2048);
        assert_eq!(config.allowed_origin, "http://127.0.0.1:5500");
        assert_eq!(config.bind, "127.0.0.1:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.upstream_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_api_key_is_required() {
        assert_eq!(
            Config::from_lookup(lookup(&[])).unwrap_err(),
            ConfigError::Missing("RELAY_API_KEY")
        );
        assert_eq!(
            Config::from_lookup(lookup(&[("RELAY_API_KEY", "  ")])).unwrap_err(),
            ConfigError::Missing("RELAY_API_KEY")
        );
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("RELAY_API_KEY", "secret"),
            ("RELAY_API_BASE", "http://localhost:9000/v1/"),
            ("RELAY_MODEL", "sonar"),
            ("RELAY_MAX_TOKENS", "512"),
            ("RELAY_ALLOWED_ORIGIN", "http://localhost:8080"),
            ("RELAY_BIND", "0.0.0.0:8081"),
            ("RELAY_UPSTREAM_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.api_base, "http://localhost:9000/v1");
        assert_eq!(config.model, "sonar");
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.allowed_origin, "http://localhost:8080");
        assert_eq!(config.bind.port(), 8081);
        assert_eq!(config.upstream_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_numbers() {
        let err = Config::from_lookup(lookup(&[
            ("RELAY_API_KEY", "secret"),
            ("RELAY_MAX_TOKENS", "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "RELAY_MAX_TOKENS", .. }));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let config = Config::from_lookup(lookup(&[("RELAY_API_KEY", "secret")])).unwrap();
        assert!(!format!("{config:?}").contains("secret"));
    }
}
