use idg_core::extract::{extract_incident_details, extract_outage_summary};

const SAMPLE: &str = r"**Scenario Overview**
Acme's checkout is failing.

**Incident Narrative**
At 09:02 the payment gateway began timing out.
Root cause: an expired TLS certificate on the API nodes.

**The Response**
PagerDuty mobilized the payments team.

**Talk Track**
Intro, scenario, results.

Outage Summary:
\b Checkout payments failing due to expired gateway certificate\b0
Secondary line that is not part of the summary
";

#[test]
fn outage_summary_is_first_line_after_marker_without_markup() {
    assert_eq!(
        extract_outage_summary(SAMPLE),
        "Checkout payments failing due to expired gateway certificate"
    );
}

#[test]
fn outage_summary_ignores_surrounding_control_words() {
    for wrapper in ["{x}", r"\par {x}\par", r"\i {x}\i0 "] {
        let text = format!("Outage Summary:\n{}\nY", wrapper.replace("{x}", "X"));
        assert_eq!(extract_outage_summary(&text), "X", "wrapper={wrapper}");
    }
}

#[test]
fn outage_summary_missing_marker_is_empty() {
    assert_eq!(extract_outage_summary("No summary in here.\nOutage:\nnope"), "");
    assert_eq!(extract_outage_summary(""), "");
}

#[test]
fn incident_details_stop_at_first_section_marker() {
    let details = extract_incident_details(SAMPLE);
    assert_eq!(
        details,
        "At 09:02 the payment gateway began timing out.\nRoot cause: an expired TLS certificate on the API nodes."
    );
}

#[test]
fn incident_details_minimal_form() {
    assert_eq!(
        extract_incident_details("**Incident Narrative** A **The Response**B"),
        "A"
    );
}

#[test]
fn incident_details_uses_earliest_end_marker_regardless_of_list_order() {
    let text = "**Incident Narrative**first**Talk Track**second**The Response**third";
    assert_eq!(extract_incident_details(text), "first");
}

#[test]
fn incident_details_without_end_marker_runs_to_end_of_text() {
    let text = "preamble **Incident Narrative**\n  everything after  \n";
    assert_eq!(extract_incident_details(text), "everything after");
}

#[test]
fn incident_details_missing_start_marker_is_empty() {
    assert_eq!(extract_incident_details("Incident Narrative without bold"), "");
}

#[test]
fn end_marker_before_start_marker_is_ignored() {
    let text = "**The Response** early **Incident Narrative** body";
    assert_eq!(extract_incident_details(text), "body");
}
