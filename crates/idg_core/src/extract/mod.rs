//! Pulls the summary line and the incident narrative section out of generated prose.
//!
//! Nothing here fails: an empty string means the fragment is not available.

use std::sync::LazyLock;

use regex::Regex;

pub const OUTAGE_SUMMARY_MARKER: &str = "Outage Summary:";
pub const INCIDENT_NARRATIVE_MARKER: &str = "**Incident Narrative**";
pub const NARRATIVE_END_MARKERS: [&str; 2] = ["**The Response**", "**Talk Track**"];

/// Backslash control words (`\par`, `\b0`, `\fs24`, ...) left behind by rich-text output.
const CONTROL_WORD_PATTERN: &str = r"\\[A-Za-z0-9]+\b";

static CONTROL_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(CONTROL_WORD_PATTERN).expect("valid regex"));

/// Remove control words that end at a word boundary; a run that continues into another
/// word character is left untouched.
pub fn strip_markup(text: &str) -> String {
    CONTROL_WORD_RE.replace_all(text, "").into_owned()
}

/// First line after `Outage Summary:`, with markup removed and whitespace trimmed.
pub fn extract_outage_summary(narrative: &str) -> String {
    let plain = strip_markup(narrative);
    let Some(pos) = plain.find(OUTAGE_SUMMARY_MARKER) else {
        return String::new();
    };
    let remainder = plain[pos + OUTAGE_SUMMARY_MARKER.len()..].trim();
    remainder
        .lines()
        .next()
        .map(|line| line.trim().to_string())
        .unwrap_or_default()
}

/// Text between `**Incident Narrative**` and the earliest following section marker.
pub fn extract_incident_details(narrative: &str) -> String {
    let Some(pos) = narrative.find(INCIDENT_NARRATIVE_MARKER) else {
        return String::new();
    };
    let start = pos + INCIDENT_NARRATIVE_MARKER.len();
    let body = &narrative[start..];
    let end = NARRATIVE_END_MARKERS
        .iter()
        .filter_map(|m| body.find(m))
        .min()
        .unwrap_or(body.len());
    body[..end].trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_control_words_only_at_word_boundary() {
        assert_eq!(strip_markup(r"\b Bold\b0  text\par"), " Bold  text");
        assert_eq!(strip_markup(r"keep \snake_case and \\"), r"keep \snake_case and \\");
        assert_eq!(strip_markup(r"C:\ path"), r"C:\ path");
        assert_eq!(strip_markup(r"\fs24 Outage\par\parémoi"), r" Outage\parémoi");
    }

    #[test]
    fn summary_is_first_non_empty_line_after_marker() {
        let text = "Intro\nOutage Summary:\n\n  Payments down for 20 minutes  \nTrailing";
        assert_eq!(extract_outage_summary(text), "Payments down for 20 minutes");
    }

    #[test]
    fn summary_on_same_line_as_marker() {
        assert_eq!(
            extract_outage_summary("Outage Summary: Login failures\nmore"),
            "Login failures"
        );
    }

    #[test]
    fn summary_marker_at_end_yields_empty() {
        assert_eq!(extract_outage_summary("text\nOutage Summary:   \n"), "");
    }
}
