use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

use crate::nutrition::{EstimatorSettings, DEFAULT_BASE_URL, DEFAULT_MODEL};

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Absent means records live in process memory.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub estimator: EstimatorSettings,
    pub seed_sample_data: bool,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| var(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let estimator = EstimatorSettings {
            api_key: var("GEMINI_API_KEY"),
            model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
            base_url: var("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            timeout: Duration::from_secs(parse_or(var("GEMINI_TIMEOUT_SECS"), "GEMINI_TIMEOUT_SECS", 30)?),
        };

        Ok(Self {
            database_url: var("DATABASE_URL"),
            database_max_connections: parse_or(
                var("DATABASE_MAX_CONNECTIONS"),
                "DATABASE_MAX_CONNECTIONS",
                10,
            )?,
            estimator,
            seed_sample_data: match var("SEED_SAMPLE_DATA") {
                Some(v) => parse_flag(&v).with_context(|| format!("SEED_SAMPLE_DATA={v}"))?,
                None => true,
            },
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(var("APP_PORT"), "APP_PORT", 8080)?,
        })
    }

    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            database_url: None,
            database_max_connections: 1,
            estimator: EstimatorSettings {
                api_key: None,
                model: DEFAULT_MODEL.into(),
                base_url: DEFAULT_BASE_URL.into(),
                timeout: Duration::from_secs(1),
            },
            seed_sample_data: false,
            host: "127.0.0.1".into(),
            port: 0,
        }
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(v) => v.parse().with_context(|| format!("invalid {key}: {v:?}")),
        None => Ok(default),
    }
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected a boolean, got {other:?}"),
    }
}
