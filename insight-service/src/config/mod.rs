use crate::services::providers::gemini::GEMINI_API_BASE;
use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_TEXT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_PROVIDER_TIMEOUT_SECONDS: u64 = 60;
const DEFAULT_RATE_LIMIT_REQUESTS: u32 = 5;
const DEFAULT_RATE_LIMIT_WINDOW_SECONDS: u64 = 60;

#[derive(Debug, Clone)]
pub struct InsightConfig {
    pub common: core_config::Config,
    pub models: ModelConfig,
    pub google: GoogleConfig,
    pub provider: ProviderConfig,
    pub rate_limit: RateLimitConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Model used for both endpoints (e.g., gemini-1.5-flash)
    pub text_model: String,
    /// Base URL of the Gemini REST API
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub api_key: Secret<String>,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Upper bound for one model call
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests allowed per client IP in each window
    pub requests: u32,
    pub window_seconds: u64,
    /// Key on `X-Forwarded-For` instead of the peer address (trusted proxy only)
    pub trust_forwarded_for: bool,
}

#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub log_level: String,
    /// OTLP collector; spans are not exported when unset
    pub otlp_endpoint: Option<String>,
}

impl InsightConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        Self::from_lookup(common_config, |key| env::var(key).ok())
    }

    /// Build the service configuration from an arbitrary variable source.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_prod = lookup("ENVIRONMENT").as_deref() == Some("prod");
        let get = |key: &str, default: Option<&str>| get_env(&lookup, key, default, is_prod);

        Ok(InsightConfig {
            common,
            models: ModelConfig {
                text_model: get("INSIGHT_TEXT_MODEL", Some(DEFAULT_TEXT_MODEL))?,
                api_base: get("GEMINI_API_BASE", Some(GEMINI_API_BASE))?,
            },
            google: GoogleConfig {
                api_key: Secret::new(get("GOOGLE_API_KEY", None)?),
            },
            provider: ProviderConfig {
                timeout: Duration::from_secs(parse_env(
                    "INSIGHT_PROVIDER_TIMEOUT_SECONDS",
                    get(
                        "INSIGHT_PROVIDER_TIMEOUT_SECONDS",
                        Some(&DEFAULT_PROVIDER_TIMEOUT_SECONDS.to_string()),
                    )?,
                )?),
            },
            rate_limit: RateLimitConfig {
                requests: parse_env(
                    "INSIGHT_RATE_LIMIT_REQUESTS",
                    get(
                        "INSIGHT_RATE_LIMIT_REQUESTS",
                        Some(&DEFAULT_RATE_LIMIT_REQUESTS.to_string()),
                    )?,
                )?,
                window_seconds: parse_env(
                    "INSIGHT_RATE_LIMIT_WINDOW_SECONDS",
                    get(
                        "INSIGHT_RATE_LIMIT_WINDOW_SECONDS",
                        Some(&DEFAULT_RATE_LIMIT_WINDOW_SECONDS.to_string()),
                    )?,
                )?,
                trust_forwarded_for: parse_env(
                    "INSIGHT_TRUST_FORWARDED_FOR",
                    get("INSIGHT_TRUST_FORWARDED_FOR", Some("false"))?,
                )?,
            },
            observability: ObservabilityConfig {
                log_level: get("LOG_LEVEL", Some("info"))?,
                otlp_endpoint: lookup("OTLP_ENDPOINT").filter(|v| !v.is_empty()),
            },
        })
    }
}

fn get_env<F>(lookup: &F, key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => Ok(val),
        None => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, raw: String) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("{} has invalid value {:?}: {}", key, raw, e))
    })
}
