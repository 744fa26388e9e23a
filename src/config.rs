// src/config.rs
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. Answer clearly and concisely.";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct MistralConfig {
    pub api_key: String,
    pub model: String,
    pub api_url: String,
    pub system_prompt: String,
    pub history_limit: usize,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Empty means any origin.
    pub cors_origins: Vec<String>,
    pub generate_timeout: Duration,
    pub thread_ttl: Duration,
    pub mistral: Option<MistralConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origins: Vec::new(),
            generate_timeout: Duration::from_secs(60),
            thread_ttl: Duration::from_secs(3600),
            mistral: None,
        }
    }
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to
    /// pick up a local `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = get("HOST").unwrap_or(defaults.host);
        let port = parse_or("PORT", get("PORT"), defaults.port)?;
        let cors_origins = get("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let generate_timeout = Duration::from_secs(parse_or(
            "GENERATE_TIMEOUT_SECS",
            get("GENERATE_TIMEOUT_SECS"),
            defaults.generate_timeout.as_secs(),
        )?);
        let thread_ttl = Duration::from_secs(parse_or(
            "THREAD_TTL_SECS",
            get("THREAD_TTL_SECS"),
            defaults.thread_ttl.as_secs(),
        )?);
        if generate_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: "GENERATE_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }

        let mistral = match get("MISTRAL_API_KEY") {
            Some(api_key) => Some(MistralConfig {
                api_key,
                model: get("MISTRAL_MODEL").unwrap_or_else(|| "mistral-small-latest".to_string()),
                api_url: get("MISTRAL_API_URL")
                    .unwrap_or_else(|| "https://api.mistral.ai/v1".to_string()),
                system_prompt: get("SYSTEM_PROMPT")
                    .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
                history_limit: parse_or("HISTORY_LIMIT", get("HISTORY_LIMIT"), 20)?,
            }),
            None => None,
        };

        Ok(Self {
            host,
            port,
            cors_origins,
            generate_timeout,
            thread_ttl,
            mistral,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: FromStr>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}
