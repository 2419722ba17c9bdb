use serde_json::{json, Value};

use idg_core::domain::{Event, Scenario};
use idg_core::schedule::{
    expand_schedule, last_offset, latest_offset, occurrence_count, total_occurrences,
};
use idg_core::validate::check_scenario_rules;

fn template(i: usize, severity: &str, offset: f64, repeats: Option<u32>) -> Value {
    let mut ev = json!({
        "payload": {
            "summary": format!("Event template {i}"),
            "severity": severity,
            "source": "monitoring",
            "custom_details": { "service_name": "API Nodes" }
        },
        "event_action": "trigger",
        "timing_metadata": { "schedule_offset": offset }
    });
    if let Some(count) = repeats {
        ev["repeat_schedule"] = json!([{ "repeat_count": count, "repeat_offset": 30.0 }]);
    }
    ev
}

fn decode(values: Vec<Value>) -> Vec<Event> {
    serde_json::from_value(Value::Array(values)).expect("decode")
}

fn major_batch() -> Vec<Value> {
    let mut values: Vec<Value> = (0..10)
        .map(|i| template(i, "error", (i * 10) as f64, Some(5)))
        .collect();
    values[4]["timing_metadata"]["schedule_offset"] = json!(150.0);
    values[4]["payload"]["custom_details"]["major_failure"] = json!(true);
    values
}

fn codes(events: &[Event], scenario: Scenario) -> Vec<String> {
    check_scenario_rules(scenario, events)
        .into_iter()
        .map(|w| w.code)
        .collect()
}

#[test]
fn well_formed_major_batch_passes_every_rule() {
    let events = decode(major_batch());
    assert_eq!(events.len(), 10);
    assert_eq!(expand_schedule(&events).len(), 60);
    assert!(codes(&events, Scenario::Major).is_empty());
}

#[test]
fn major_batch_needs_exactly_one_major_failure_in_window() {
    let mut values = major_batch();
    values[7]["payload"]["custom_details"]["major_failure"] = json!(true);
    let got = codes(&decode(values), Scenario::Major);
    assert!(got.contains(&"RULE_MAJOR_FAILURE_COUNT".to_string()));

    let mut values = major_batch();
    values[4]["timing_metadata"]["schedule_offset"] = json!(200.0);
    let got = codes(&decode(values), Scenario::Major);
    assert_eq!(got, vec!["RULE_MAJOR_FAILURE_OFFSET".to_string()]);

    let mut values = major_batch();
    values[4]["payload"]["custom_details"]["major_failure"] = json!("yes");
    let got = codes(&decode(values), Scenario::Major);
    assert_eq!(got, vec!["RULE_MAJOR_FAILURE_COUNT".to_string()]);
}

#[test]
fn repeated_scenarios_need_fifty_to_seventy_occurrences() {
    let values: Vec<Value> = (0..10).map(|i| template(i, "warning", 0.0, Some(2))).collect();
    let events = decode(values);
    assert_eq!(events.iter().map(occurrence_count).sum::<usize>(), 30);
    assert_eq!(
        codes(&events, Scenario::Partial),
        vec!["RULE_OCCURRENCE_COUNT".to_string()]
    );
}

#[test]
fn partial_batch_must_be_all_warnings() {
    let mut values: Vec<Value> = (0..10).map(|i| template(i, "warning", 0.0, Some(5))).collect();
    values[3]["payload"]["severity"] = json!("critical");
    let warnings = check_scenario_rules(Scenario::Partial, &decode(values));
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].code, "RULE_SEVERITY");
    assert!(warnings[0].details.as_deref().unwrap().contains("index=3"));
}

#[test]
fn well_understood_batch_is_small_and_does_not_repeat() {
    let ok = decode(vec![template(0, "info", 0.0, None), template(1, "info", 60.0, None)]);
    assert!(codes(&ok, Scenario::WellUnderstood).is_empty());

    let repeating = decode(vec![
        template(0, "info", 0.0, None),
        template(1, "info", 60.0, Some(1)),
    ]);
    assert_eq!(
        codes(&repeating, Scenario::WellUnderstood),
        vec!["RULE_REPEAT_NOT_ALLOWED".to_string()]
    );

    let too_many = decode((0..4).map(|i| template(i, "info", 0.0, None)).collect());
    assert_eq!(
        codes(&too_many, Scenario::WellUnderstood),
        vec!["RULE_TEMPLATE_COUNT".to_string()]
    );
}

#[test]
fn window_and_service_name_are_checked_for_every_scenario() {
    let mut late = template(1, "info", 400.0, None);
    late["payload"]["custom_details"] = json!({});
    let events = decode(vec![template(0, "info", 0.0, None), late]);
    assert_eq!(
        codes(&events, Scenario::WellUnderstood),
        vec![
            "EVENT_SERVICE_NAME_MISSING".to_string()
        ]
    );

    let events = decode(vec![template(0, "info", 0.0, None), template(1, "info", 421.0, None)]);
    assert_eq!(
        codes(&events, Scenario::WellUnderstood),
        vec!["RULE_WINDOW_EXCEEDED".to_string()]
    );
}

#[test]
fn expansion_is_ordered_by_offset_and_continues_from_last_firing() {
    let mut a = template(0, "info", 100.0, None);
    a["repeat_schedule"] = json!([
        { "repeat_count": 2, "repeat_offset": 10.0 },
        { "repeat_count": 1, "repeat_offset": 50.0 }
    ]);
    let b = template(1, "info", 0.0, None);
    let events = decode(vec![a, b]);

    let timeline: Vec<(usize, f64)> = expand_schedule(&events)
        .into_iter()
        .map(|o| (o.template_index, o.offset))
        .collect();
    assert_eq!(
        timeline,
        vec![(1, 0.0), (0, 100.0), (0, 110.0), (0, 120.0), (0, 170.0)]
    );
}

#[test]
fn duplicated_template_is_reported() {
    let mut values = major_batch();
    values[9] = values[8].clone();
    let warnings = check_scenario_rules(Scenario::Major, &decode(values));
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].code, "RULE_TEMPLATE_DUPLICATE");
    assert_eq!(warnings[0].details.as_deref(), Some("index=9; duplicate_of=8"));

    // Same payload with a different action is a distinct template.
    let mut values = major_batch();
    values[9] = values[8].clone();
    values[9]["event_action"] = json!("resolve");
    assert!(codes(&decode(values), Scenario::Major).is_empty());
}

#[test]
fn huge_repeat_count_is_counted_without_expanding() {
    let mut values = major_batch();
    values[0]["repeat_schedule"] = json!([{ "repeat_count": u32::MAX, "repeat_offset": 30.0 }]);
    let events = decode(values);

    assert_eq!(occurrence_count(&events[0]), u32::MAX as usize + 1);
    assert_eq!(total_occurrences(&events), u32::MAX as usize + 1 + 54);
    assert!(latest_offset(&events) > 1.0e11);
    assert_eq!(
        codes(&events, Scenario::Major),
        vec![
            "RULE_OCCURRENCE_COUNT".to_string(),
            "RULE_WINDOW_EXCEEDED".to_string()
        ]
    );
}

#[test]
fn closed_form_last_offset_matches_expansion() {
    let mut a = template(0, "info", 100.0, None);
    a["repeat_schedule"] = json!([
        { "repeat_count": 2, "repeat_offset": 10.0 },
        { "repeat_count": 1, "repeat_offset": 50.0 }
    ]);
    let events = decode(vec![a, template(1, "info", 0.0, None)]);
    assert_eq!(last_offset(&events[0]), 170.0);
    assert_eq!(latest_offset(&events), 170.0);
    assert_eq!(total_occurrences(&events), expand_schedule(&events).len());
    assert_eq!(latest_offset(&[]), 0.0);
}
