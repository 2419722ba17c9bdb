use std::ops::RangeInclusive;

use crate::domain::{Event, Scenario, Severity, ValidationWarning};
use crate::schedule::{latest_offset, total_occurrences, SCENARIO_WINDOW_SECS};

pub const REPEATED_TEMPLATE_COUNT: usize = 10;
pub const REPEATED_OCCURRENCES: RangeInclusive<usize> = 50..=70;
pub const WELL_UNDERSTOOD_EVENTS: RangeInclusive<usize> = 2..=3;
pub const MAJOR_FAILURE_OFFSET: RangeInclusive<f64> = 120.0..=180.0;

/// Check a generated batch against the cardinality rules of its scenario.
///
/// Model output is not trusted to follow the prompt, so violations are reported rather than
/// fixed. An empty result means the batch satisfies every rule.
pub fn check_scenario_rules(scenario: Scenario, batch: &[Event]) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    match scenario {
        Scenario::Major | Scenario::Partial => {
            if batch.len() != REPEATED_TEMPLATE_COUNT {
                warnings.push(
                    ValidationWarning::new(
                        "RULE_TEMPLATE_COUNT",
                        format!("Expected exactly {REPEATED_TEMPLATE_COUNT} event templates"),
                    )
                    .with_details(format!("templates={}", batch.len())),
                );
            }
            check_distinct_templates(batch, &mut warnings);
            let occurrences = total_occurrences(batch);
            if !REPEATED_OCCURRENCES.contains(&occurrences) {
                warnings.push(
                    ValidationWarning::new(
                        "RULE_OCCURRENCE_COUNT",
                        format!(
                            "Expected {}-{} events after repeat expansion",
                            REPEATED_OCCURRENCES.start(),
                            REPEATED_OCCURRENCES.end()
                        ),
                    )
                    .with_details(format!("occurrences={occurrences}")),
                );
            }
        }
        Scenario::WellUnderstood => {
            if !WELL_UNDERSTOOD_EVENTS.contains(&batch.len()) {
                warnings.push(
                    ValidationWarning::new("RULE_TEMPLATE_COUNT", "Expected 2-3 events")
                        .with_details(format!("events={}", batch.len())),
                );
            }
            for (i, e) in batch.iter().enumerate() {
                if e.repeat_schedule.is_some() {
                    warnings.push(
                        ValidationWarning::new(
                            "RULE_REPEAT_NOT_ALLOWED",
                            "Well-understood events must not repeat",
                        )
                        .with_details(format!("index={i}")),
                    );
                }
            }
        }
    }

    if scenario == Scenario::Major {
        check_major_failure(batch, &mut warnings);
    }

    if scenario == Scenario::Partial {
        for (i, e) in batch.iter().enumerate() {
            if e.payload.severity != Severity::Warning {
                warnings.push(
                    ValidationWarning::new("RULE_SEVERITY", "Partial scenario events must be warnings")
                        .with_details(format!("index={i}; severity={:?}", e.payload.severity)),
                );
            }
        }
    }

    let latest = latest_offset(batch);
    if latest > SCENARIO_WINDOW_SECS {
        warnings.push(
            ValidationWarning::new(
                "RULE_WINDOW_EXCEEDED",
                format!("Events extend past the {SCENARIO_WINDOW_SECS}s window"),
            )
            .with_details(format!("latest_offset={latest}")),
        );
    }

    for (i, e) in batch.iter().enumerate() {
        if e.payload.service_name().is_none() {
            warnings.push(
                ValidationWarning::new(
                    "EVENT_SERVICE_NAME_MISSING",
                    "custom_details.service_name is missing",
                )
                .with_details(format!("index={i}")),
            );
        }
    }

    warnings
}

/// Templates that share an action and an identical payload count once.
fn check_distinct_templates(batch: &[Event], warnings: &mut Vec<ValidationWarning>) {
    for (i, e) in batch.iter().enumerate() {
        let first = batch[..i]
            .iter()
            .position(|p| p.event_action == e.event_action && p.payload == e.payload);
        if let Some(first) = first {
            warnings.push(
                ValidationWarning::new(
                    "RULE_TEMPLATE_DUPLICATE",
                    "Event templates must be distinct",
                )
                .with_details(format!("index={i}; duplicate_of={first}")),
            );
        }
    }
}

fn check_major_failure(batch: &[Event], warnings: &mut Vec<ValidationWarning>) {
    let failures: Vec<(usize, &Event)> = batch
        .iter()
        .enumerate()
        .filter(|(_, e)| e.payload.is_major_failure())
        .collect();

    if failures.len() != 1 {
        warnings.push(
            ValidationWarning::new(
                "RULE_MAJOR_FAILURE_COUNT",
                "Expected exactly one event with custom_details.major_failure = true",
            )
            .with_details(format!("found={}", failures.len())),
        );
    }
    for (i, e) in failures {
        let offset = e.timing_metadata.map(|t| t.schedule_offset);
        let in_range = offset
            .map(|o| MAJOR_FAILURE_OFFSET.contains(&o))
            .unwrap_or(false);
        if !in_range {
            warnings.push(
                ValidationWarning::new(
                    "RULE_MAJOR_FAILURE_OFFSET",
                    "Major failure must be scheduled between 120 and 180 seconds",
                )
                .with_details(format!("index={i}; schedule_offset={offset:?}")),
            );
        }
    }
}
