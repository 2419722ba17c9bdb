use idg_core::domain::{Event, EventAction, EventPayload};
use idg_core::error::AppError;
use serde::{Deserialize, Serialize};

/// Wire body for one enqueue call. Scheduling hints have no field here, so they can never
/// be sent.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnqueueRequest<'a> {
    pub routing_key: &'a str,
    pub event_action: EventAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dedup_key: Option<&'a str>,
    pub payload: &'a EventPayload,
}

impl<'a> EnqueueRequest<'a> {
    pub fn new(event: &'a Event, routing_key: &'a str) -> Self {
        Self {
            routing_key,
            event_action: event.event_action,
            dedup_key: event.dedup_key.as_deref(),
            payload: &event.payload,
        }
    }
}

/// Status and raw body returned by the alerting endpoint, whatever the status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SinkResponse {
    pub status: u16,
    pub body: String,
}

impl SinkResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait AlertSink {
    /// `Err` only for transport failures; HTTP error statuses come back as `Ok`.
    fn send(&self, body: &EnqueueRequest<'_>) -> Result<SinkResponse, AppError>;
}
