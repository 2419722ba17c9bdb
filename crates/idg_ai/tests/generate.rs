use std::cell::RefCell;
use std::collections::VecDeque;

use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::tempdir;
use time::OffsetDateTime;

use idg_ai::generate::{
    generate_events, generate_narrative, run_generation, GenerationContext, GenerationRequest,
    GenerationSettings,
};
use idg_ai::llm::{GenerateRequest, Llm};
use idg_ai::retry::RetryPolicy;
use idg_core::config::GenerationConfig;
use idg_core::domain::Scenario;
use idg_core::error::AppError;
use idg_core::normalize::{load_event_batch, BatchParseMode};
use idg_core::storage::OrgStore;

/// Replays scripted outputs in order and records every prompt it was given.
struct ScriptedLlm {
    outputs: RefCell<VecDeque<Result<String, AppError>>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedLlm {
    fn new(outputs: Vec<Result<String, AppError>>) -> Self {
        Self {
            outputs: RefCell::new(outputs.into()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.prompts.borrow().len()
    }
}

impl Llm for ScriptedLlm {
    fn generate(&self, req: &GenerateRequest<'_>) -> Result<String, AppError> {
        assert_eq!(req.api_key, "sk-test");
        self.prompts.borrow_mut().push(req.prompt.to_string());
        self.outputs
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }
}

fn settings() -> GenerationSettings {
    GenerationSettings::from(&GenerationConfig::default())
}

fn ctx() -> GenerationContext {
    GenerationContext::new("Acme Corp", "sk-test")
}

const NARRATIVE: &str = "**Scenario Overview**\nAcme checkout.\n\n**Incident Narrative**\nGateway TLS cert expired.\n\n**The Response**\nPagerDuty paged payments.\n\nOutage Summary:\nCheckout failing on expired gateway certificate\n";

fn well_events() -> String {
    json!([
        {
            "payload": {
                "summary": "Disk usage at 91% on storage-02",
                "severity": "warning",
                "source": "newrelic",
                "custom_details": { "service_name": "Storage" }
            },
            "event_action": "trigger",
            "dedup_key": "storage-02-disk",
            "timing_metadata": { "schedule_offset": 0 }
        },
        {
            "payload": {
                "summary": "Disk usage back to 60% on storage-02",
                "severity": "info",
                "source": "newrelic",
                "custom_details": { "service_name": "Storage" }
            },
            "event_action": "resolve",
            "dedup_key": "storage-02-disk",
            "timing_metadata": { "schedule_offset": 90 }
        }
    ])
    .to_string()
}

#[test]
fn settings_follow_config_defaults() {
    let s = settings();
    assert_eq!(s.model, "o1-mini");
    assert_eq!(s.temperature, 1.0);
    assert_eq!(s.max_completion_tokens, 8192);
    assert_eq!(s.retry, RetryPolicy::default());
}

#[test]
fn events_are_retried_until_non_blank_and_unfenced() {
    let llm = ScriptedLlm::new(vec![
        Ok("".to_string()),
        Ok("   \n".to_string()),
        Ok(format!("```json\n{}\n```", well_events())),
    ]);
    let out = generate_events(
        &llm,
        &settings(),
        Scenario::WellUnderstood,
        &ctx(),
        "Disk filling",
        "Storage",
        "details",
    )
    .expect("events");
    assert_eq!(llm.calls(), 3);
    assert!(out.starts_with('['));
    assert!(out.ends_with(']'));
    assert!(llm.prompts.borrow()[0].contains("Outage Summary: Disk filling"));
}

#[test]
fn blank_events_after_all_attempts_are_returned_blank() {
    let llm = ScriptedLlm::new(vec![]);
    let out = generate_events(
        &llm,
        &settings(),
        Scenario::Major,
        &ctx(),
        "",
        "API Nodes",
        "",
    )
    .expect("blank is not an error");
    assert_eq!(out, "");
    assert_eq!(llm.calls(), 3);
}

#[test]
fn backend_failure_propagates_without_retry() {
    let llm = ScriptedLlm::new(vec![Err(AppError::new(
        "GEN_BACKEND_FAILED",
        "Generation request failed",
    )
    .with_details("status=401"))]);
    let err = generate_narrative(&llm, &settings(), Scenario::Major, &ctx()).expect_err("fatal");
    assert_eq!(err.code, "GEN_BACKEND_FAILED");
    assert_eq!(llm.calls(), 1);
}

#[test]
fn run_generation_saves_both_files_and_seeds_events_with_fragments() {
    let tmp = tempdir().unwrap();
    let store = OrgStore::open(tmp.path());
    let llm = ScriptedLlm::new(vec![Ok(NARRATIVE.to_string()), Ok(well_events())]);

    let outcome = run_generation(
        &llm,
        &store,
        &settings(),
        &GenerationRequest {
            scenario: Scenario::WellUnderstood,
            context: ctx(),
            service_names: Some("   ".to_string()),
        },
        OffsetDateTime::UNIX_EPOCH,
    )
    .expect("run");

    assert_eq!(outcome.outage_summary, "Checkout failing on expired gateway certificate");
    assert_eq!(outcome.incident_details, "Gateway TLS cert expired.");
    assert_eq!(outcome.service_names, "Storage");
    assert_eq!(outcome.event_count, Some(2));
    assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);

    assert_eq!(outcome.run.organization, "AcmeCorp");
    assert_eq!(outcome.run.narrative_file, "well_19700101000000.txt");
    assert_eq!(outcome.run.events_file, "well_events_19700101000000.json");
    assert_eq!(store.read_file("AcmeCorp", &outcome.run.narrative_file).unwrap(), NARRATIVE);

    let batch = load_event_batch(&outcome.run.events_path, BatchParseMode::Strict).expect("load");
    assert_eq!(batch.len(), 2);

    let events_prompt = &llm.prompts.borrow()[1];
    assert!(events_prompt.contains("Incident Details: Gateway TLS cert expired."));
    assert!(events_prompt.contains("well-known service name: Storage"));
}

#[test]
fn run_generation_keeps_going_when_model_output_is_unusable() {
    let tmp = tempdir().unwrap();
    let store = OrgStore::open(tmp.path());
    let llm = ScriptedLlm::new(vec![
        Ok("A story with no markers at all.".to_string()),
        Ok("Sorry, I cannot produce JSON today.".to_string()),
    ]);

    let outcome = run_generation(
        &llm,
        &store,
        &settings(),
        &GenerationRequest {
            scenario: Scenario::Major,
            context: ctx(),
            service_names: None,
        },
        OffsetDateTime::UNIX_EPOCH,
    )
    .expect("model mistakes are not fatal");

    let codes: Vec<&str> = outcome.warnings.iter().map(|w| w.code.as_str()).collect();
    assert_eq!(
        codes,
        vec!["GEN_SUMMARY_MISSING", "GEN_DETAILS_MISSING", "GEN_EVENTS_UNPARSEABLE"]
    );
    assert_eq!(outcome.event_count, None);
    assert_eq!(
        outcome.service_names,
        "User Authentication, API Nodes, Payment Processing"
    );
    assert_eq!(
        store.read_file("AcmeCorp", &outcome.run.events_file).unwrap(),
        "Sorry, I cannot produce JSON today."
    );
}

#[test]
fn run_generation_rejects_unusable_organization_before_calling_backend() {
    let tmp = tempdir().unwrap();
    let store = OrgStore::open(tmp.path());
    let llm = ScriptedLlm::new(vec![]);

    let err = run_generation(
        &llm,
        &store,
        &settings(),
        &GenerationRequest {
            scenario: Scenario::Partial,
            context: GenerationContext::new("???", "sk-test"),
            service_names: None,
        },
        OffsetDateTime::UNIX_EPOCH,
    )
    .expect_err("bad org");
    assert_eq!(err.code, "ORG_NAME_INVALID");
    assert_eq!(llm.calls(), 0);
}
