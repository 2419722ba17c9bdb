use idg_core::config::GenerationConfig;
use idg_core::domain::{Scenario, ValidationWarning};
use idg_core::error::AppError;
use idg_core::extract::{extract_incident_details, extract_outage_summary};
use idg_core::normalize::{parse_event_batch, strip_code_fence, BatchParseMode};
use idg_core::storage::{OrgStore, SavedRun};
use idg_core::validate::check_scenario_rules;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::llm::{GenerateRequest, Llm};
use crate::retry::RetryPolicy;

pub mod prompts;

use prompts::{events_prompt, narrative_prompt, EventPromptInput};

pub const DEFAULT_ITSM_TOOLS: &str = "ServiceNOW";
pub const DEFAULT_OBSERVABILITY_TOOLS: &str = "NewRelic, Splunk";

/// Sampling parameters and retry policy shared by every generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    pub max_completion_tokens: u32,
    pub retry: RetryPolicy,
}

impl From<&GenerationConfig> for GenerationSettings {
    fn from(cfg: &GenerationConfig) -> Self {
        Self {
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            max_completion_tokens: cfg.max_completion_tokens,
            retry: RetryPolicy::from_config(cfg),
        }
    }
}

/// Who the demo is for, the credential to generate with, and the customer's tooling.
#[derive(Clone)]
pub struct GenerationContext {
    pub organization: String,
    pub api_key: String,
    pub itsm_tools: String,
    pub observability_tools: String,
}

impl std::fmt::Debug for GenerationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationContext")
            .field("organization", &self.organization)
            .field("api_key", &"<redacted>")
            .field("itsm_tools", &self.itsm_tools)
            .field("observability_tools", &self.observability_tools)
            .finish()
    }
}

impl GenerationContext {
    pub fn new(organization: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            api_key: api_key.into(),
            itsm_tools: DEFAULT_ITSM_TOOLS.to_string(),
            observability_tools: DEFAULT_OBSERVABILITY_TOOLS.to_string(),
        }
    }
}

fn call(
    llm: &dyn Llm,
    settings: &GenerationSettings,
    ctx: &GenerationContext,
    label: &str,
    prompt: &str,
) -> Result<String, AppError> {
    settings.retry.run(label, |attempt| {
        tracing::debug!(%label, attempt, model = %settings.model, "calling generation backend");
        llm.generate(&GenerateRequest {
            model: &settings.model,
            prompt,
            temperature: settings.temperature,
            max_completion_tokens: settings.max_completion_tokens,
            api_key: &ctx.api_key,
        })
    })
}

/// Ask the backend for the incident narrative of `scenario`. May return blank text.
pub fn generate_narrative(
    llm: &dyn Llm,
    settings: &GenerationSettings,
    scenario: Scenario,
    ctx: &GenerationContext,
) -> Result<String, AppError> {
    let prompt = narrative_prompt(
        scenario,
        &ctx.organization,
        &ctx.itsm_tools,
        &ctx.observability_tools,
    );
    let label = format!("{}_narrative", scenario.as_str());
    let content = call(llm, settings, ctx, &label, &prompt)?;
    if !content.trim().is_empty() {
        tracing::info!(
            scenario = scenario.label(),
            outage_summary = %extract_outage_summary(&content),
            "narrative generated"
        );
    }
    Ok(content)
}

/// Ask the backend for the JSON event array of `scenario`, with any code fence removed.
#[allow(clippy::too_many_arguments)]
pub fn generate_events(
    llm: &dyn Llm,
    settings: &GenerationSettings,
    scenario: Scenario,
    ctx: &GenerationContext,
    outage_summary: &str,
    service_names: &str,
    incident_details: &str,
) -> Result<String, AppError> {
    let prompt = events_prompt(
        scenario,
        &EventPromptInput {
            organization: &ctx.organization,
            itsm_tools: &ctx.itsm_tools,
            observability_tools: &ctx.observability_tools,
            outage_summary,
            service_names,
            incident_details,
        },
    );
    let label = format!("{}_events", scenario.as_str());
    let content = call(llm, settings, ctx, &label, &prompt)?;
    Ok(strip_code_fence(&content))
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub scenario: Scenario,
    pub context: GenerationContext,
    /// Comma-separated services; blank falls back to the scenario defaults.
    pub service_names: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutcome {
    pub scenario: Scenario,
    pub run: SavedRun,
    pub outage_summary: String,
    pub incident_details: String,
    pub service_names: String,
    /// `None` when the stored event text could not be parsed.
    pub event_count: Option<usize>,
    pub warnings: Vec<ValidationWarning>,
}

/// Full generation flow: narrative, extraction, events, persistence, rule check.
///
/// Backend and storage errors abort the run. Everything the model gets wrong (blank output,
/// missing fragments, broken JSON, rule violations) is saved as-is and reported in
/// `warnings` so the operator can fix the files by hand.
pub fn run_generation(
    llm: &dyn Llm,
    store: &OrgStore,
    settings: &GenerationSettings,
    request: &GenerationRequest,
    now: OffsetDateTime,
) -> Result<GenerationOutcome, AppError> {
    let scenario = request.scenario;
    let ctx = &request.context;
    let service_names = request
        .service_names
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(scenario.default_service_names())
        .to_string();

    // Fail on a bad organization name before spending tokens.
    store.ensure_org(&ctx.organization)?;

    let mut warnings = Vec::new();

    let narrative = generate_narrative(llm, settings, scenario, ctx)?;
    if narrative.trim().is_empty() {
        warnings.push(ValidationWarning::new(
            "GEN_BLANK_OUTPUT",
            "Narrative generation returned blank output",
        ));
    }

    let outage_summary = extract_outage_summary(&narrative);
    let incident_details = extract_incident_details(&narrative);
    if outage_summary.is_empty() {
        warnings.push(ValidationWarning::new(
            "GEN_SUMMARY_MISSING",
            "Narrative has no Outage Summary line",
        ));
    }
    if incident_details.is_empty() {
        warnings.push(ValidationWarning::new(
            "GEN_DETAILS_MISSING",
            "Narrative has no Incident Narrative section",
        ));
    }

    let events = generate_events(
        llm,
        settings,
        scenario,
        ctx,
        &outage_summary,
        &service_names,
        &incident_details,
    )?;

    let run = store.save_run(&ctx.organization, scenario, &narrative, &events, now)?;
    tracing::info!(
        organization = %run.organization,
        narrative_file = %run.narrative_file,
        events_file = %run.events_file,
        "generation run saved"
    );

    let event_count = if events.trim().is_empty() {
        warnings.push(ValidationWarning::new(
            "GEN_BLANK_OUTPUT",
            "Event generation returned blank output",
        ));
        None
    } else {
        match parse_event_batch(&events, BatchParseMode::Lenient, &run.events_file) {
            Ok(batch) => {
                warnings.extend(check_scenario_rules(scenario, &batch));
                Some(batch.len())
            }
            Err(e) => {
                warnings.push(
                    ValidationWarning::new("GEN_EVENTS_UNPARSEABLE", e.message)
                        .with_details(e.details.unwrap_or_default()),
                );
                None
            }
        }
    };

    for w in &warnings {
        tracing::warn!(code = %w.code, details = w.details.as_deref().unwrap_or(""), "{}", w.message);
    }

    Ok(GenerationOutcome {
        scenario,
        run,
        outage_summary,
        incident_details,
        service_names,
        event_count,
        warnings,
    })
}
