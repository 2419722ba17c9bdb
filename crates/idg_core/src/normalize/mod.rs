use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::Event;
use crate::error::AppError;

const FENCE: &str = "```";

/// Remove a surrounding triple-backtick fence (and an optional language tag) from model output.
pub fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    if !(trimmed.starts_with(FENCE) && trimmed.ends_with(FENCE)) {
        return trimmed.to_string();
    }
    let inner = trimmed.trim_matches('`').trim();

    // ```json\n[...]\n```
    match inner.split_once('\n') {
        Some((first, rest))
            if !first.trim().is_empty()
                && first.trim().chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            rest.trim().to_string()
        }
        _ => inner.to_string(),
    }
}

/// Copy of `event` without local scheduling hints. Idempotent; the input is untouched.
pub fn prepare_event_payload(event: &Event) -> Event {
    Event {
        timing_metadata: None,
        repeat_schedule: None,
        ..event.clone()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BatchParseMode {
    /// The whole file must be a JSON array.
    Strict,
    /// Recover the array between the first `[` and the last `]`.
    #[default]
    Lenient,
}

impl FromStr for BatchParseMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(BatchParseMode::Strict),
            "lenient" => Ok(BatchParseMode::Lenient),
            other => Err(AppError::new("CONFIG_INVALID", "Unknown batch parse mode")
                .with_details(format!("mode={other}; expected strict|lenient"))),
        }
    }
}

impl fmt::Display for BatchParseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchParseMode::Strict => f.write_str("strict"),
            BatchParseMode::Lenient => f.write_str("lenient"),
        }
    }
}

fn array_slice<'a>(text: &'a str, mode: BatchParseMode, label: &str) -> Result<&'a str, AppError> {
    let trimmed = text.trim();
    match mode {
        BatchParseMode::Strict => Ok(trimmed),
        BatchParseMode::Lenient => {
            let start = trimmed.find('[');
            let end = trimmed.rfind(']');
            match (start, end) {
                (Some(s), Some(e)) if s < e => Ok(&trimmed[s..=e]),
                _ => Err(AppError::new(
                    "BATCH_MALFORMED",
                    "File does not contain a valid JSON array",
                )
                .with_details(format!("file={label}"))),
            }
        }
    }
}

fn decode_batch(text: &str, mode: BatchParseMode, label: &str) -> Result<Vec<Event>, AppError> {
    let slice = array_slice(text, mode, label)?;

    let value: Value = serde_json::from_str(slice).map_err(|e| {
        AppError::new("BATCH_DECODE_FAILED", "Event batch is not valid JSON")
            .with_details(format!("file={label}; err={e}"))
    })?;
    let Value::Array(items) = value else {
        return Err(AppError::new(
            "BATCH_MALFORMED",
            "Event batch JSON is not an array",
        )
        .with_details(format!("file={label}")));
    };

    let mut events = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let event: Event = serde_json::from_value(item).map_err(|e| {
            AppError::new("BATCH_DECODE_FAILED", "Event record is malformed")
                .with_details(format!("file={label}; index={index}; err={e}"))
        })?;
        if let Some(problem) = event.shape_error() {
            return Err(AppError::new("BATCH_DECODE_FAILED", "Event record is malformed")
                .with_details(format!("file={label}; index={index}; err={problem}")));
        }
        events.push(event);
    }
    Ok(events)
}

/// Parse event batch text. `label` names the source in errors and logs.
pub fn parse_event_batch(text: &str, mode: BatchParseMode, label: &str) -> Result<Vec<Event>, AppError> {
    decode_batch(text, mode, label).map_err(|e| {
        tracing::error!(
            file = %label,
            code = %e.code,
            error = e.details.as_deref().unwrap_or(""),
            "failed to parse event batch"
        );
        e
    })
}

pub fn load_event_batch(path: &Path, mode: BatchParseMode) -> Result<Vec<Event>, AppError> {
    let label = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let text = fs::read_to_string(path).map_err(|e| {
        tracing::error!(file = %label, error = %e, "failed to read event batch");
        AppError::new("BATCH_READ_FAILED", "Failed to read event batch file")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;

    let events = parse_event_batch(&text, mode, &label)?;
    tracing::debug!(file = %label, events = events.len(), %mode, "loaded event batch");
    Ok(events)
}
