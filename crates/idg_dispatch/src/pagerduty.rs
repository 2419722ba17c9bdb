use std::io::Read;
use std::time::Duration;

use idg_core::config::DispatchConfig;
use idg_core::error::AppError;

use crate::sink::{AlertSink, EnqueueRequest, SinkResponse};

const MAX_RESPONSE_BYTES: u64 = 1024 * 1024;

/// Response body as text. Invalid UTF-8 is replaced; a body that cannot be read at all is
/// recorded as a placeholder so the status still reaches the results.
fn response_text(status: u16, reader: impl Read) -> String {
    let mut buf = Vec::new();
    match reader.take(MAX_RESPONSE_BYTES).read_to_end(&mut buf) {
        Ok(_) => String::from_utf8_lossy(&buf).into_owned(),
        Err(e) => {
            tracing::warn!(status, error = %e, "alerting response body unreadable");
            format!("<unreadable response body: {e}>")
        }
    }
}

/// PagerDuty Events v2 enqueue endpoint over blocking HTTP.
#[derive(Debug, Clone)]
pub struct PagerDutyClient {
    endpoint: String,
    timeout: Duration,
}

impl PagerDutyClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, AppError> {
        let endpoint = endpoint.trim().to_string();
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(AppError::new(
                "CONFIG_INVALID",
                "Alerting endpoint must be an http(s) URL",
            )
            .with_details(format!("endpoint={endpoint}")));
        }
        if timeout.is_zero() {
            return Err(AppError::new(
                "CONFIG_INVALID",
                "Alerting endpoint timeout must be greater than zero",
            ));
        }
        Ok(Self { endpoint, timeout })
    }

    pub fn from_config(cfg: &DispatchConfig) -> Result<Self, AppError> {
        Self::new(&cfg.endpoint, cfg.timeout)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl AlertSink for PagerDutyClient {
    fn send(&self, body: &EnqueueRequest<'_>) -> Result<SinkResponse, AppError> {
        let resp = ureq::post(&self.endpoint)
            .timeout(self.timeout)
            .set("Content-Type", "application/json")
            .send_json(body);

        match resp {
            Ok(r) | Err(ureq::Error::Status(_, r)) => {
                let status = r.status();
                let body = response_text(status, r.into_reader());
                Ok(SinkResponse { status, body })
            }
            Err(e) => Err(AppError::new(
                "DISPATCH_UNREACHABLE",
                "Failed to reach the alerting endpoint",
            )
            .with_details(format!("endpoint={}; err={}", self.endpoint, e))
            .with_retryable(true)),
        }
    }
}
