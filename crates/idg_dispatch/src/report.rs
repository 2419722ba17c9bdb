use idg_core::error::AppError;
use serde::{Deserialize, Serialize};

use crate::dispatch::DispatchResult;

const SUMMARY_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

pub fn summarize(results: &[DispatchResult]) -> DispatchSummary {
    let succeeded = results.iter().filter(|r| r.ok).count();
    DispatchSummary {
        total: results.len(),
        succeeded,
        failed: results.len() - succeeded,
    }
}

fn clip(s: &str, width: usize) -> String {
    let one_line = s.replace(['\n', '\r'], " ");
    if one_line.chars().count() <= width {
        return one_line;
    }
    let mut out: String = one_line.chars().take(width.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

/// Plain-text results table, one row per event.
pub fn render_results_table(results: &[DispatchResult]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>4}  {:<6}  {:<w$}  {}\n",
        "#",
        "STATUS",
        "SUMMARY",
        "RESPONSE",
        w = SUMMARY_WIDTH
    ));
    for r in results {
        let status = match r.status_code {
            Some(code) => code.to_string(),
            None => "ERR".to_string(),
        };
        out.push_str(&format!(
            "{:>4}  {:<6}  {:<w$}  {}\n",
            r.index + 1,
            status,
            clip(&r.summary, SUMMARY_WIDTH),
            clip(&r.response, 120),
            w = SUMMARY_WIDTH
        ));
    }
    let s = summarize(results);
    out.push_str(&format!(
        "{} sent, {} ok, {} failed\n",
        s.total, s.succeeded, s.failed
    ));
    out
}

pub fn results_csv(results: &[DispatchResult]) -> Result<String, AppError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for r in results {
        wtr.serialize(r).map_err(|e| {
            AppError::new("DISPATCH_REPORT_FAILED", "Failed to encode results CSV")
                .with_details(e.to_string())
        })?;
    }
    let bytes = wtr.into_inner().map_err(|e| {
        AppError::new("DISPATCH_REPORT_FAILED", "Failed to finish results CSV")
            .with_details(e.to_string())
    })?;
    String::from_utf8(bytes).map_err(|e| {
        AppError::new("DISPATCH_REPORT_FAILED", "Results CSV is not UTF-8")
            .with_details(e.to_string())
    })
}
