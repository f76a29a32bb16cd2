//! Startup configuration from the environment (and `.env`, if present)

use crate::chat::TurnSettings;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything the server needs to start
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub turn: TurnSettings,
    pub port: u16,
    pub request_timeout: Duration,
    pub max_upload_bytes: usize,
    pub session_ttl: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            turn: TurnSettings::default(),
            port: 8000,
            request_timeout: Duration::from_secs(120),
            max_upload_bytes: 20 * 1024 * 1024,
            session_ttl: Duration::from_secs(60 * 60),
        }
    }
}

impl AppConfig {
    /// Load `.env` (missing file is fine) and read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::info!(path = %path.display(), "Loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let temperature: f32 = parse_or(&get, "ATELIER_TEMPERATURE", defaults.turn.temperature)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::Invalid {
                var: "ATELIER_TEMPERATURE",
                value: temperature.to_string(),
                reason: "must be between 0 and 2".to_string(),
            });
        }

        let timeout_secs: u64 = parse_or(
            &get,
            "ATELIER_REQUEST_TIMEOUT_SECS",
            defaults.request_timeout.as_secs(),
        )?;
        let max_upload_mb: usize = parse_or(
            &get,
            "ATELIER_MAX_UPLOAD_MB",
            defaults.max_upload_bytes / (1024 * 1024),
        )?;
        let max_upload_bytes = max_upload_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| ConfigError::Invalid {
                var: "ATELIER_MAX_UPLOAD_MB",
                value: max_upload_mb.to_string(),
                reason: "too large".to_string(),
            })?;
        let session_ttl_secs: u64 = parse_or(
            &get,
            "ATELIER_SESSION_TTL_SECS",
            defaults.session_ttl.as_secs(),
        )?;
        if session_ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "ATELIER_SESSION_TTL_SECS",
                value: session_ttl_secs.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            api_key: get("GROQ_API_KEY"),
            api_base: get("ATELIER_API_BASE").unwrap_or(defaults.api_base),
            model: get("ATELIER_MODEL").unwrap_or(defaults.model),
            turn: TurnSettings {
                temperature,
                max_tokens: parse_or(&get, "ATELIER_MAX_TOKENS", defaults.turn.max_tokens)?,
            },
            port: parse_or(&get, "ATELIER_PORT", defaults.port)?,
            request_timeout: Duration::from_secs(timeout_secs),
            max_upload_bytes,
            session_ttl: Duration::from_secs(session_ttl_secs),
        })
    }
}

fn parse_or<T>(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert!(config.api_key.is_none());
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.turn.max_tokens, 800);
        assert_eq!(config.port, 8000);
        assert_eq!(config.max_upload_bytes, 20 * 1024 * 1024);
        assert_eq!(config.session_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("GROQ_API_KEY", "gsk-test"),
            ("ATELIER_MODEL", "other-model"),
            ("ATELIER_API_BASE", "http://localhost:9000/v1"),
            ("ATELIER_TEMPERATURE", "0.2"),
            ("ATELIER_MAX_TOKENS", "256"),
            ("ATELIER_PORT", "9100"),
            ("ATELIER_REQUEST_TIMEOUT_SECS", "30"),
            ("ATELIER_MAX_UPLOAD_MB", "5"),
            ("ATELIER_SESSION_TTL_SECS", "600"),
        ]))
        .unwrap();

        assert_eq!(config.api_key.as_deref(), Some("gsk-test"));
        assert_eq!(config.model, "other-model");
        assert_eq!(config.api_base, "http://localhost:9000/v1");
        assert!((config.turn.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.turn.max_tokens, 256);
        assert_eq!(config.port, 9100);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.session_ttl, Duration::from_secs(600));
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config =
            AppConfig::from_lookup(lookup(&[("GROQ_API_KEY", "  "), ("ATELIER_PORT", "")]))
                .unwrap();
        assert!(config.api_key.is_none());
        assert_eq!(config.port, 8000);
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[("ATELIER_PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("ATELIER_PORT"));
    }

    #[test]
    fn test_temperature_out_of_range() {
        let err = AppConfig::from_lookup(lookup(&[("ATELIER_TEMPERATURE", "3.5")])).unwrap_err();
        assert!(err.to_string().contains("between 0 and 2"));
    }

    #[test]
    fn test_oversized_upload_limit_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[(
            "ATELIER_MAX_UPLOAD_MB",
            "18446744073709551615",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("ATELIER_MAX_UPLOAD_MB"));
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_zero_session_ttl_is_an_error() {
        let err =
            AppConfig::from_lookup(lookup(&[("ATELIER_SESSION_TTL_SECS", "0")])).unwrap_err();
        assert!(err.to_string().contains("ATELIER_SESSION_TTL_SECS"));
    }
}
