use idg_core::domain::Scenario;

pub struct EventPromptInput<'a> {
    pub organization: &'a str,
    pub itsm_tools: &'a str,
    pub observability_tools: &'a str,
    pub outage_summary: &'a str,
    pub service_names: &'a str,
    pub incident_details: &'a str,
}

pub fn narrative_prompt(
    scenario: Scenario,
    organization: &str,
    itsm_tools: &str,
    observability_tools: &str,
) -> String {
    let body = match scenario {
        Scenario::Major => major_narrative(organization),
        Scenario::Partial => partial_narrative(organization),
        Scenario::WellUnderstood => well_narrative(organization),
    };
    format!(
        r#"{body}
Context: "{organization}" uses {itsm_tools} for ITSM and {observability_tools} for observability.

Output the final narrative as plain text. Label the incident narrative section exactly as **Incident Narrative** and the following section as **The Response** (or **Talk Track**).
At the end, include a section starting with:

Outage Summary:
Followed by a single line summarizing the incident.
"#
    )
}

fn major_narrative(organization: &str) -> String {
    format!(
        r#"Write a structured, engaging demo story for the organization "{organization}" about a MAJOR, novel incident that reflects the real challenges of a customer in their industry. Use these sections:

1. Scenario Overview: a high-impact incident for "{organization}" with a compelling hook.
2. Incident Narrative: the trigger event, symptoms, diagnostic findings and root cause.
3. The Response: how PagerDuty detects, automates, mobilizes and communicates.
4. The Resolution: speed of resolution, business impact, compliance benefits and prevention.
5. Demo Execution: the key parts of the technical infrastructure to show.
6. Talk Track for the SC (20-Minute Demo Flow): introduction, scenario, results and a closing call to action.
"#
    )
}

fn partial_narrative(organization: &str) -> String {
    format!(
        r#"Write a **Partially Understood** incident scenario for the organization "{organization}".
The incident is realistic but less severe (P3 or P4): the team has some clues but is unsure of the root cause.
Show how PagerDuty supports a human-in-the-loop approach to diagnosis and remediation.

Sections:
1. Scenario Overview
2. Incident Narrative
3. Partial Resolution Strategy
4. Next Steps or Observations
"#
    )
}

fn well_narrative(organization: &str) -> String {
    format!(
        r#"Write a **Well-Understood** incident scenario for the organization "{organization}".
The incident is low severity (P4 or lower) and is resolved almost instantly by automation.
Show how runbooks and PagerDuty automation deliver a zero-touch resolution.

Sections:
1. Scenario Overview
2. Incident Narrative
3. Fully Automated Response
4. Zero-Touch Resolution
"#
    )
}

const EVENT_SHAPE: &str = r#"{
  "payload": {
      "summary": "<string>",
      "severity": "<one of info, warning, critical, error>",
      "source": "<string>",
      "component": "<string>",
      "group": "<string>",
      "class": "<string>",
      "custom_details": { "service_name": "<string>", "<additional_context>": "<value>" }
  },
  "event_action": "<trigger or resolve>",
  "timing_metadata": { "schedule_offset": <seconds from T0> },
  "repeat_schedule": [ { "repeat_count": <number>, "repeat_offset": <seconds> } ]
}"#;

const WELL_EVENT_SHAPE: &str = r#"{
  "payload": {
      "summary": "<string>",
      "severity": "<one of info, warning, critical, error>",
      "source": "<string>",
      "component": "<string>",
      "group": "<string>",
      "class": "<string>",
      "custom_details": { "service_name": "<string>", "<additional_context>": "<value>" }
  },
  "event_action": "<trigger or resolve>",
  "timing_metadata": { "schedule_offset": <seconds from T0> }
}"#;

pub fn events_prompt(scenario: Scenario, input: &EventPromptInput<'_>) -> String {
    let EventPromptInput {
        organization,
        itsm_tools,
        observability_tools,
        outage_summary,
        service_names,
        incident_details,
    } = input;

    let rules = match scenario {
        Scenario::Major => format!(
            r#"Generate a JSON array of events for a MAJOR incident scenario for {organization}. The incident is critical.
Generate 10 unique events over a period of 420 seconds starting from T0. Each unique event is one object shaped like:
{EVENT_SHAPE}
Use repeat_schedule so that the repeats yield a total of between 50 and 70 events. Common failures (connection errors, slow page loads) should repeat.
Exactly one of the 10 unique events must include "major_failure": true in payload.custom_details, with timing_metadata.schedule_offset between 120 and 180 seconds.
Reference the major service names: {service_names}."#
        ),
        Scenario::Partial => format!(
            r#"Generate a JSON array of events for a PARTIALLY UNDERSTOOD incident scenario for {organization}. The incident is moderate and every event has severity "warning".
Generate 10 unique events over a period of 420 seconds starting from T0. Each unique event is one object shaped like:
{EVENT_SHAPE}
Use repeat_schedule so that the repeats yield a total of between 50 and 70 events.
Reference the service names: {service_names}."#
        ),
        Scenario::WellUnderstood => format!(
            r#"Generate a JSON array of events for a WELL-UNDERSTOOD incident scenario for {organization}. The incident is low severity and resolved almost automatically.
Generate between 2 and 3 events over a period of 420 seconds starting from T0. Do not include repeat_schedule. Each event is one object shaped like:
{WELL_EVENT_SHAPE}
Reference the well-known service name: {service_names}."#
        ),
    };

    format!(
        r#"{rules}
Monitoring sources should reflect {observability_tools}; tickets are handled in {itsm_tools}.
Incident Details: {incident_details}
Outage Summary: {outage_summary}
Do not include explicit timestamp values.
Output only a properly formatted JSON array.
"#
    )
}
