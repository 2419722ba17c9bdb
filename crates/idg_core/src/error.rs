use serde::{Deserialize, Serialize};
use std::fmt;

/// Single structured error shape shared by the generator, the store and the dispatcher.
///
/// `code` is a stable machine-readable identifier (`BATCH_MALFORMED`,
/// `GEN_BACKEND_FAILED`, ...); `details` carries the underlying cause.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// True for both flavours of unusable event batch file.
    pub fn is_malformed_batch(&self) -> bool {
        self.code.starts_with("BATCH_")
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(details) if f.alternate() => {
                write!(f, "[{}] {} ({})", self.code, self.message, details)
            }
            _ => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

impl std::error::Error for AppError {}
