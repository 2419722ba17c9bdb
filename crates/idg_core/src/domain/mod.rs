use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AppError;

/// Demo incident template. Controls prompt wording, event cardinality and default services.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Major,
    Partial,
    #[serde(rename = "well")]
    WellUnderstood,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Major, Scenario::Partial, Scenario::WellUnderstood];

    /// Slug used in stored filenames.
    pub fn as_str(self) -> &'static str {
        match self {
            Scenario::Major => "major",
            Scenario::Partial => "partial",
            Scenario::WellUnderstood => "well",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Scenario::Major => "MAJOR",
            Scenario::Partial => "PARTIAL",
            Scenario::WellUnderstood => "WELL",
        }
    }

    pub fn default_service_names(self) -> &'static str {
        match self {
            Scenario::Major => "User Authentication, API Nodes, Payment Processing",
            Scenario::Partial => "API Nodes, Database",
            Scenario::WellUnderstood => "Storage",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "major" => Ok(Scenario::Major),
            "partial" => Ok(Scenario::Partial),
            "well" | "well-understood" | "well_understood" => Ok(Scenario::WellUnderstood),
            other => Err(AppError::new("SCENARIO_INVALID", "Unknown scenario")
                .with_details(format!("scenario={other}; expected major|partial|well"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
    Error,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventAction {
    Trigger,
    Resolve,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventPayload {
    pub summary: String,
    pub severity: Severity,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default)]
    pub custom_details: Map<String, Value>,
}

impl EventPayload {
    pub fn service_name(&self) -> Option<&str> {
        self.custom_details
            .get("service_name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn is_major_failure(&self) -> bool {
        self.custom_details.get("major_failure") == Some(&Value::Bool(true))
    }
}

/// Local scheduling hint: seconds after the nominal start (T0).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TimingMetadata {
    pub schedule_offset: f64,
}

/// Upper bound on `repeat_count` for a single repeat entry. A scenario spans 420 seconds,
/// so anything larger cannot describe a usable timeline.
pub const MAX_REPEAT_COUNT: u32 = 1000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RepeatEntry {
    pub repeat_count: u32,
    pub repeat_offset: f64,
}

/// One alert record. `timing_metadata` and `repeat_schedule` never leave the process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub payload: EventPayload,
    pub event_action: EventAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dedup_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing_metadata: Option<TimingMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_schedule: Option<Vec<RepeatEntry>>,
}

impl Event {
    pub fn schedule_offset(&self) -> f64 {
        self.timing_metadata.map(|t| t.schedule_offset).unwrap_or(0.0)
    }

    pub fn has_scheduling_hints(&self) -> bool {
        self.timing_metadata.is_some() || self.repeat_schedule.is_some()
    }

    /// Structural checks serde cannot express. Returns the first problem found.
    pub fn shape_error(&self) -> Option<String> {
        if self.payload.summary.trim().is_empty() {
            return Some("payload.summary is empty".to_string());
        }
        if self.payload.source.trim().is_empty() {
            return Some("payload.source is empty".to_string());
        }
        if let Some(t) = self.timing_metadata {
            if !t.schedule_offset.is_finite() || t.schedule_offset < 0.0 {
                return Some(format!(
                    "timing_metadata.schedule_offset must be >= 0 (got {})",
                    t.schedule_offset
                ));
            }
        }
        for (i, r) in self.repeat_schedule.iter().flatten().enumerate() {
            if r.repeat_count == 0 {
                return Some(format!("repeat_schedule[{i}].repeat_count must be >= 1"));
            }
            if r.repeat_count > MAX_REPEAT_COUNT {
                return Some(format!(
                    "repeat_schedule[{i}].repeat_count must be <= {MAX_REPEAT_COUNT} (got {})",
                    r.repeat_count
                ));
            }
            if !r.repeat_offset.is_finite() || r.repeat_offset < 0.0 {
                return Some(format!(
                    "repeat_schedule[{i}].repeat_offset must be >= 0 (got {})",
                    r.repeat_offset
                ));
            }
        }
        None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationWarning {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl ValidationWarning {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(d) => write!(f, "[{}] {} ({})", self.code, self.message, d),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}
