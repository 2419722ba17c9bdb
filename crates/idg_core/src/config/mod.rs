use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;
use crate::normalize::BatchParseMode;

pub const DEFAULT_STORAGE_ROOT: &str = "generated_files";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "o1-mini";
pub const DEFAULT_PAGERDUTY_EVENTS_URL: &str = "https://events.pagerduty.com/v2/enqueue";

#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    pub root: PathBuf,
}

/// Settings for the text-generation backend.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub base_url: String,
    /// Fallback credential; a per-request key takes precedence.
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_completion_tokens: u32,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: 1.0,
            max_completion_tokens: 8192,
            timeout: Duration::from_secs(120),
            max_attempts: 3,
            backoff: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchConfig {
    pub endpoint: String,
    pub routing_key: Option<String>,
    pub timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_PAGERDUTY_EVENTS_URL.to_string(),
            routing_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Everything the generator and dispatcher need, resolved once at startup.
///
/// | Env var                       | Default                                   |
/// |-------------------------------|-------------------------------------------|
/// | `IDG_STORAGE_ROOT`            | `generated_files`                         |
/// | `OPENAI_BASE_URL`             | `https://api.openai.com/v1`               |
/// | `OPENAI_API_KEY`              | unset                                     |
/// | `IDG_MODEL`                   | `o1-mini`                                 |
/// | `IDG_TEMPERATURE`             | `1.0`                                     |
/// | `IDG_MAX_COMPLETION_TOKENS`   | `8192`                                    |
/// | `IDG_GENERATION_TIMEOUT_SECS` | `120`                                     |
/// | `IDG_GENERATION_MAX_ATTEMPTS` | `3`                                       |
/// | `IDG_GENERATION_BACKOFF_MS`   | `0`                                       |
/// | `PAGERDUTY_EVENTS_URL`        | `https://events.pagerduty.com/v2/enqueue` |
/// | `PAGERDUTY_ROUTING_KEY`       | unset                                     |
/// | `IDG_DISPATCH_TIMEOUT_SECS`   | `30`                                      |
/// | `IDG_BATCH_PARSE_MODE`        | `lenient`                                 |
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub generation: GenerationConfig,
    pub dispatch: DispatchConfig,
    pub batch_parse_mode: BatchParseMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                root: PathBuf::from(DEFAULT_STORAGE_ROOT),
            },
            generation: GenerationConfig::default(),
            dispatch: DispatchConfig::default(),
            batch_parse_mode: BatchParseMode::default(),
        }
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    match non_empty(lookup, key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| {
            AppError::new("CONFIG_INVALID", format!("{key} has an invalid value"))
                .with_details(format!("value={raw}; err={e}"))
        }),
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = AppConfig::default();

        let root = non_empty(&lookup, "IDG_STORAGE_ROOT")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage.root);

        let max_attempts: u32 = parsed(
            &lookup,
            "IDG_GENERATION_MAX_ATTEMPTS",
            defaults.generation.max_attempts,
        )?;
        if max_attempts == 0 {
            return Err(AppError::new(
                "CONFIG_INVALID",
                "IDG_GENERATION_MAX_ATTEMPTS must be at least 1",
            ));
        }

        let temperature: f32 = parsed(&lookup, "IDG_TEMPERATURE", defaults.generation.temperature)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(AppError::new(
                "CONFIG_INVALID",
                "IDG_TEMPERATURE must be between 0 and 2",
            )
            .with_details(format!("value={temperature}")));
        }

        let generation = GenerationConfig {
            base_url: non_empty(&lookup, "OPENAI_BASE_URL")
                .map(|u| u.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.generation.base_url),
            api_key: non_empty(&lookup, "OPENAI_API_KEY"),
            model: non_empty(&lookup, "IDG_MODEL").unwrap_or(defaults.generation.model),
            temperature,
            max_completion_tokens: parsed(
                &lookup,
                "IDG_MAX_COMPLETION_TOKENS",
                defaults.generation.max_completion_tokens,
            )?,
            timeout: Duration::from_secs(parsed(
                &lookup,
                "IDG_GENERATION_TIMEOUT_SECS",
                defaults.generation.timeout.as_secs(),
            )?),
            max_attempts,
            backoff: Duration::from_millis(parsed(&lookup, "IDG_GENERATION_BACKOFF_MS", 0u64)?),
        };

        let dispatch = DispatchConfig {
            endpoint: non_empty(&lookup, "PAGERDUTY_EVENTS_URL")
                .unwrap_or(defaults.dispatch.endpoint),
            routing_key: non_empty(&lookup, "PAGERDUTY_ROUTING_KEY"),
            timeout: Duration::from_secs(parsed(
                &lookup,
                "IDG_DISPATCH_TIMEOUT_SECS",
                defaults.dispatch.timeout.as_secs(),
            )?),
        };

        let batch_parse_mode = match non_empty(&lookup, "IDG_BATCH_PARSE_MODE") {
            Some(raw) => raw.parse::<BatchParseMode>()?,
            None => defaults.batch_parse_mode,
        };

        Ok(Self {
            storage: StorageConfig { root },
            generation,
            dispatch,
            batch_parse_mode,
        })
    }
}
