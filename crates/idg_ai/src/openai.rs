use std::time::Duration;

use idg_core::config::GenerationConfig;
use idg_core::error::AppError;

/// Connection settings for an OpenAI-compatible chat-completions backend.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    base_url: String,
    timeout: Duration,
}

impl OpenAiClient {
    /// `base_url` is the API root, e.g. `https://api.openai.com/v1`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();

        let rest = base_url
            .strip_prefix("https://")
            .or_else(|| base_url.strip_prefix("http://"));
        let host = rest.and_then(|r| r.split('/').next()).unwrap_or("");
        if host.is_empty() || host.contains('@') || host.contains(' ') {
            return Err(AppError::new(
                "CONFIG_INVALID",
                "Generation backend URL must be an http(s) URL with a host",
            )
            .with_details(format!("base_url={base_url}")));
        }
        if timeout.is_zero() {
            return Err(AppError::new(
                "CONFIG_INVALID",
                "Generation backend timeout must be greater than zero",
            ));
        }

        Ok(Self { base_url, timeout })
    }

    pub fn from_config(cfg: &GenerationConfig) -> Result<Self, AppError> {
        Self::new(&cfg.base_url, cfg.timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}
