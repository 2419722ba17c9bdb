use std::time::Duration;

use idg_core::config::GenerationConfig;
use idg_core::error::AppError;

/// Bounded retry for generation calls that come back blank.
///
/// Only blank output is retried. Backend errors are returned on the attempt that produced
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &GenerationConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            backoff: cfg.backoff,
        }
    }

    /// Call `op` (with the 1-based attempt number) until it returns non-blank text.
    ///
    /// When every attempt is blank the last output is returned unchanged; callers decide
    /// what blank means for them.
    pub fn run<F>(&self, label: &str, mut op: F) -> Result<String, AppError>
    where
        F: FnMut(u32) -> Result<String, AppError>,
    {
        let attempts = self.max_attempts.max(1);
        let mut last = String::new();
        for attempt in 1..=attempts {
            last = op(attempt)?;
            if !last.trim().is_empty() {
                return Ok(last);
            }
            tracing::warn!(%label, attempt, max_attempts = attempts, "generation output blank");
            if attempt < attempts && !self.backoff.is_zero() {
                std::thread::sleep(self.backoff);
            }
        }
        Ok(last)
    }
}
