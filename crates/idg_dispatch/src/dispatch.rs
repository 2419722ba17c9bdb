use idg_core::domain::Event;
use idg_core::error::AppError;
use idg_core::normalize::{load_event_batch, prepare_event_payload, BatchParseMode};
use idg_core::storage::OrgStore;
use serde::{Deserialize, Serialize};

use crate::sink::{AlertSink, EnqueueRequest};

/// Outcome of sending one event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchResult {
    /// Position in the batch file.
    pub index: usize,
    pub summary: String,
    /// `None` when the request never got a response.
    pub status_code: Option<u16>,
    /// Raw response body, or the transport error text.
    pub response: String,
    pub ok: bool,
}

fn summary_of(event: &Event) -> String {
    let s = event.payload.summary.trim();
    if s.is_empty() {
        "N/A".to_string()
    } else {
        s.to_string()
    }
}

/// Send every event of `batch` in file order, one request at a time.
///
/// Failures are recorded per event and never stop the remaining sends.
pub fn dispatch_batch(
    sink: &dyn AlertSink,
    batch: &[Event],
    routing_key: &str,
) -> Result<Vec<DispatchResult>, AppError> {
    let routing_key = routing_key.trim();
    if routing_key.is_empty() {
        return Err(AppError::new(
            "DISPATCH_ROUTING_KEY_MISSING",
            "A routing key is required to send events",
        ));
    }

    let mut results = Vec::with_capacity(batch.len());
    for (index, event) in batch.iter().enumerate() {
        let prepared = prepare_event_payload(event);
        let body = EnqueueRequest::new(&prepared, routing_key);
        let summary = summary_of(event);

        let result = match sink.send(&body) {
            Ok(resp) => {
                let ok = resp.is_success();
                if ok {
                    tracing::info!(index, status = resp.status, %summary, "event sent");
                } else {
                    tracing::warn!(index, status = resp.status, %summary, body = %resp.body, "event rejected");
                }
                DispatchResult {
                    index,
                    summary,
                    status_code: Some(resp.status),
                    response: resp.body,
                    ok,
                }
            }
            Err(e) => {
                tracing::warn!(index, %summary, error = %e, "event send failed");
                DispatchResult {
                    index,
                    summary,
                    status_code: None,
                    response: match e.details {
                        Some(d) => format!("{}: {}", e.message, d),
                        None => e.message,
                    },
                    ok: false,
                }
            }
        };
        results.push(result);
    }
    Ok(results)
}

/// Load a stored batch and dispatch it. Nothing is sent if the file does not load.
pub fn send_event_file(
    sink: &dyn AlertSink,
    store: &OrgStore,
    organization: &str,
    filename: &str,
    routing_key: &str,
    mode: BatchParseMode,
) -> Result<Vec<DispatchResult>, AppError> {
    let path = store.file_path(organization, filename)?;
    let batch = load_event_batch(&path, mode)?;
    tracing::info!(%organization, file = %filename, events = batch.len(), "dispatching event batch");
    dispatch_batch(sink, &batch, routing_key)
}
