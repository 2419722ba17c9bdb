use std::fs;
use std::io::Write;
use std::path::PathBuf;

use idg_ai::generate::{run_generation, GenerationContext, GenerationRequest, GenerationSettings};
use idg_ai::llm::openai_llm::OpenAiLlm;
use idg_ai::openai::OpenAiClient;
use idg_core::config::AppConfig;
use idg_core::domain::Scenario;
use idg_core::error::AppError;
use idg_core::normalize::load_event_batch;
use idg_core::schedule::expand_schedule;
use idg_core::storage::OrgStore;
use idg_dispatch::report::{render_results_table, results_csv, summarize};
use idg_dispatch::{send_event_file, PagerDutyClient};
use time::OffsetDateTime;

pub const USAGE: &str = "usage: incident-demo <command> [args]

commands:
  generate <scenario> <organization> [--services S] [--itsm T] [--observability T] [--api-key K]
  orgs
  files <organization>
  events <organization>
  show <organization> <file>
  edit <organization> <file> <source-path>
  timeline <organization> <file>
  send <organization> <file> [--routing-key K] [--csv PATH]

scenarios: major, partial, well";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Generate {
        scenario: Scenario,
        organization: String,
        services: Option<String>,
        itsm_tools: Option<String>,
        observability_tools: Option<String>,
        api_key: Option<String>,
    },
    Orgs,
    Files {
        organization: String,
    },
    Events {
        organization: String,
    },
    Show {
        organization: String,
        file: String,
    },
    Edit {
        organization: String,
        file: String,
        source: PathBuf,
    },
    Timeline {
        organization: String,
        file: String,
    },
    Send {
        organization: String,
        file: String,
        routing_key: Option<String>,
        csv: Option<PathBuf>,
    },
    Help,
}

fn usage_error(message: impl Into<String>) -> AppError {
    AppError::new("CLI_USAGE", message).with_details(USAGE)
}

/// Split arguments into positionals and `--flag value` pairs, rejecting unknown flags.
fn split_args<'a>(
    args: &'a [String],
    allowed: &[&str],
) -> Result<(Vec<&'a str>, Vec<(&'a str, &'a str)>), AppError> {
    let mut positionals = Vec::new();
    let mut flags = Vec::new();
    let mut it = args.iter();
    while let Some(arg) = it.next() {
        if let Some(name) = arg.strip_prefix("--") {
            if !allowed.contains(&name) {
                return Err(usage_error(format!("Unknown option --{name}")));
            }
            let value = it
                .next()
                .ok_or_else(|| usage_error(format!("Option --{name} needs a value")))?;
            flags.push((name, value.as_str()));
        } else {
            positionals.push(arg.as_str());
        }
    }
    Ok((positionals, flags))
}

fn flag(flags: &[(&str, &str)], name: &str) -> Option<String> {
    flags
        .iter()
        .rev()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| v.to_string())
}

fn positionals<'a>(got: &[&'a str], want: usize, command: &str) -> Result<Vec<&'a str>, AppError> {
    if got.len() != want {
        return Err(usage_error(format!(
            "{command} takes {want} argument(s), got {}",
            got.len()
        )));
    }
    Ok(got.to_vec())
}

/// Parse the arguments that follow the program name.
pub fn parse_args(args: &[String]) -> Result<Command, AppError> {
    let Some((name, rest)) = args.split_first() else {
        return Ok(Command::Help);
    };

    match name.as_str() {
        "help" | "-h" | "--help" => Ok(Command::Help),
        "generate" => {
            let (pos, flags) =
                split_args(rest, &["services", "itsm", "observability", "api-key"])?;
            let pos = positionals(&pos, 2, "generate")?;
            Ok(Command::Generate {
                scenario: pos[0].parse()?,
                organization: pos[1].to_string(),
                services: flag(&flags, "services"),
                itsm_tools: flag(&flags, "itsm"),
                observability_tools: flag(&flags, "observability"),
                api_key: flag(&flags, "api-key"),
            })
        }
        "orgs" => {
            let (pos, _) = split_args(rest, &[])?;
            positionals(&pos, 0, "orgs")?;
            Ok(Command::Orgs)
        }
        "files" | "events" => {
            let (pos, _) = split_args(rest, &[])?;
            let pos = positionals(&pos, 1, name)?;
            let organization = pos[0].to_string();
            Ok(if name == "files" {
                Command::Files { organization }
            } else {
                Command::Events { organization }
            })
        }
        "show" | "timeline" => {
            let (pos, _) = split_args(rest, &[])?;
            let pos = positionals(&pos, 2, name)?;
            let (organization, file) = (pos[0].to_string(), pos[1].to_string());
            Ok(if name == "show" {
                Command::Show { organization, file }
            } else {
                Command::Timeline { organization, file }
            })
        }
        "edit" => {
            let (pos, _) = split_args(rest, &[])?;
            let pos = positionals(&pos, 3, "edit")?;
            Ok(Command::Edit {
                organization: pos[0].to_string(),
                file: pos[1].to_string(),
                source: PathBuf::from(pos[2]),
            })
        }
        "send" => {
            let (pos, flags) = split_args(rest, &["routing-key", "csv"])?;
            let pos = positionals(&pos, 2, "send")?;
            Ok(Command::Send {
                organization: pos[0].to_string(),
                file: pos[1].to_string(),
                routing_key: flag(&flags, "routing-key"),
                csv: flag(&flags, "csv").map(PathBuf::from),
            })
        }
        other => Err(usage_error(format!("Unknown command {other}"))),
    }
}

fn emit(out: &mut dyn Write, text: &str) -> Result<(), AppError> {
    out.write_all(text.as_bytes()).map_err(|e| {
        AppError::new("CLI_OUTPUT_FAILED", "Failed to write output").with_details(e.to_string())
    })
}

fn emit_lines(out: &mut dyn Write, lines: &[String]) -> Result<(), AppError> {
    for line in lines {
        emit(out, &format!("{line}\n"))?;
    }
    Ok(())
}

/// Run one command. Returns `false` when the command completed but reported failures
/// (some events were not accepted).
pub fn execute(cfg: &AppConfig, command: Command, out: &mut dyn Write) -> Result<bool, AppError> {
    let store = OrgStore::open(cfg.storage.root.clone());

    match command {
        Command::Help => {
            emit(out, USAGE)?;
            emit(out, "\n")?;
        }
        Command::Generate {
            scenario,
            organization,
            services,
            itsm_tools,
            observability_tools,
            api_key,
        } => {
            let api_key = api_key
                .or_else(|| cfg.generation.api_key.clone())
                .ok_or_else(|| {
                    AppError::new(
                        "GEN_REQUEST_INVALID",
                        "An API key is required (set OPENAI_API_KEY or pass --api-key)",
                    )
                })?;
            let mut context = GenerationContext::new(organization, api_key);
            if let Some(t) = itsm_tools {
                context.itsm_tools = t;
            }
            if let Some(t) = observability_tools {
                context.observability_tools = t;
            }

            let llm = OpenAiLlm::new(OpenAiClient::from_config(&cfg.generation)?);
            let settings = GenerationSettings::from(&cfg.generation);
            let outcome = run_generation(
                &llm,
                &store,
                &settings,
                &GenerationRequest {
                    scenario,
                    context,
                    service_names: services,
                },
                OffsetDateTime::now_utc(),
            )?;

            emit(
                out,
                &format!(
                    "organization: {}\nnarrative: {}\nevents: {}\noutage summary: {}\n",
                    outcome.run.organization,
                    outcome.run.narrative_file,
                    outcome.run.events_file,
                    if outcome.outage_summary.is_empty() {
                        "(none)"
                    } else {
                        outcome.outage_summary.as_str()
                    },
                ),
            )?;
            match outcome.event_count {
                Some(n) => emit(out, &format!("event templates: {n}\n"))?,
                None => emit(out, "event templates: (unparseable)\n")?,
            }
            let warnings: Vec<String> = outcome
                .warnings
                .iter()
                .map(|w| format!("warning: {w}"))
                .collect();
            emit_lines(out, &warnings)?;
        }
        Command::Orgs => emit_lines(out, &store.list_organizations()?)?,
        Command::Files { organization } => emit_lines(out, &store.list_files(&organization)?)?,
        Command::Events { organization } => {
            emit_lines(out, &store.list_event_files(&organization)?)?
        }
        Command::Show { organization, file } => {
            let content = store.read_file(&organization, &file)?;
            emit(out, &content)?;
            if !content.ends_with('\n') {
                emit(out, "\n")?;
            }
        }
        Command::Edit {
            organization,
            file,
            source,
        } => {
            let content = fs::read_to_string(&source).map_err(|e| {
                AppError::new("CLI_INPUT_FAILED", "Failed to read replacement content")
                    .with_details(format!("path={}; err={}", source.display(), e))
            })?;
            store.overwrite_file(&organization, &file, &content)?;
            tracing::info!(%organization, %file, bytes = content.len(), "stored file replaced");
            emit(out, &format!("updated {file}\n"))?;
        }
        Command::Timeline { organization, file } => {
            let path = store.file_path(&organization, &file)?;
            let batch = load_event_batch(&path, cfg.batch_parse_mode)?;
            let lines: Vec<String> = expand_schedule(&batch)
                .into_iter()
                .map(|o| {
                    let ev = &batch[o.template_index];
                    format!(
                        "T+{:>6.1}s  #{:<3} {:<8} {:<8} {}",
                        o.offset,
                        o.template_index + 1,
                        format!("{:?}", ev.event_action).to_lowercase(),
                        format!("{:?}", ev.payload.severity).to_lowercase(),
                        ev.payload.summary
                    )
                })
                .collect();
            emit_lines(out, &lines)?;
            emit(
                out,
                &format!("{} templates, {} occurrences\n", batch.len(), lines.len()),
            )?;
        }
        Command::Send {
            organization,
            file,
            routing_key,
            csv,
        } => {
            let routing_key = routing_key
                .or_else(|| cfg.dispatch.routing_key.clone())
                .ok_or_else(|| {
                    AppError::new(
                        "DISPATCH_ROUTING_KEY_MISSING",
                        "A routing key is required (set PAGERDUTY_ROUTING_KEY or pass --routing-key)",
                    )
                })?;
            let sink = PagerDutyClient::from_config(&cfg.dispatch)?;
            let results = send_event_file(
                &sink,
                &store,
                &organization,
                &file,
                &routing_key,
                cfg.batch_parse_mode,
            )?;

            emit(out, &render_results_table(&results))?;
            if let Some(path) = csv {
                let text = results_csv(&results)?;
                fs::write(&path, text).map_err(|e| {
                    AppError::new("CLI_OUTPUT_FAILED", "Failed to write results CSV")
                        .with_details(format!("path={}; err={}", path.display(), e))
                })?;
            }
            return Ok(summarize(&results).failed == 0);
        }
    }
    Ok(true)
}

/// Entry point used by the binary: parse, execute, report.
pub fn run(cfg: &AppConfig, args: &[String]) -> i32 {
    let mut stdout = std::io::stdout();
    let result = parse_args(args).and_then(|cmd| execute(cfg, cmd, &mut stdout));
    match result {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            tracing::error!(code = %e.code, details = e.details.as_deref().unwrap_or(""), "{}", e.message);
            eprintln!("{e:#}");
            if e.code == "CLI_USAGE" {
                2
            } else {
                1
            }
        }
    }
}
