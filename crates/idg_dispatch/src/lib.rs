pub mod dispatch;
pub mod pagerduty;
pub mod report;
pub mod sink;

pub use dispatch::{dispatch_batch, send_event_file, DispatchResult};
pub use pagerduty::PagerDutyClient;
pub use sink::{AlertSink, EnqueueRequest, SinkResponse};
