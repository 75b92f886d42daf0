use anyhow::Context;
use careguard_core::config::data_dir_from_env_value;
use careguard_core::fall_risk::{calculate_risk_score, Patient};
use careguard_core::history::{
    export_history_with_timestamps, CareEventType, ExportFormat, HistoryFilter, NewCareEvent,
    SortOrder,
};
use careguard_core::restraint::{
    classify_restraint, evaluate_restraint, get_alternative_strategies, Restraint,
    RestraintDecision, StrategyContext,
};
use careguard_core::validation::{parse_date, DateRange};
use careguard_core::{CareEngine, CoreConfig, RecordId};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "careguard")]
#[command(about = "CareGuard clinical safety rules and audit trail CLI")]
struct Cli {
    /// Data directory (overrides CAREGUARD_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify and validate a restraint read from a JSON file
    ValidateRestraint {
        /// Path to the restraint JSON
        file: PathBuf,
        /// Store the restraint if it is accepted
        #[arg(long)]
        record: bool,
    },
    /// Score a patient's fall risk from a JSON file
    RiskScore {
        /// Path to the patient JSON
        file: PathBuf,
        /// Also generate and store fall-risk alerts
        #[arg(long)]
        alerts: bool,
    },
    /// List non-restrictive alternatives to restraint
    Alternatives,
    /// Record a care event
    RecordEvent {
        #[arg(long)]
        patient_id: String,
        /// Event type, e.g. MEDICATION or VITAL_SIGNS
        #[arg(long)]
        event_type: String,
        #[arg(long)]
        performed_by: String,
        /// When the care was given (RFC 3339 or YYYY-MM-DD; default now)
        #[arg(long)]
        timestamp: Option<String>,
        /// Metadata as a JSON object
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Show the care-event history
    History {
        #[arg(long)]
        patient_id: Option<String>,
        #[arg(long)]
        event_type: Option<String>,
        /// Inclusive start (RFC 3339 or YYYY-MM-DD)
        #[arg(long, requires = "end")]
        start: Option<String>,
        /// Inclusive end (RFC 3339 or YYYY-MM-DD)
        #[arg(long, requires = "start")]
        end: Option<String>,
        /// ASC or DESC
        #[arg(long, default_value = "DESC")]
        order: String,
    },
    /// Export the history as JSON or CSV
    Export {
        /// JSON or CSV
        #[arg(long, default_value = "JSON")]
        format: String,
        #[arg(long)]
        patient_id: Option<String>,
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Summarise the history
    Stats {
        #[arg(long)]
        patient_id: Option<String>,
    },
    /// Delete a care event recorded in the last 24 hours
    DeleteEvent {
        /// Care event id
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("careguard_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| data_dir_from_env_value(std::env::var("CAREGUARD_DATA_DIR").ok()));
    let cfg = CoreConfig::new(data_dir)?;

    let mut stdout = std::io::stdout().lock();
    run(cli.command, &cfg, &mut stdout).await
}

async fn run(command: Commands, cfg: &CoreConfig, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        Commands::ValidateRestraint { file, record } => {
            let mut restraint: Restraint = read_json(&file)?;
            restraint.restraint_type = Some(classify_restraint(&restraint));

            let decision = evaluate_restraint(&restraint);
            writeln!(
                out,
                "{}",
                serde_json::to_string_pretty(&decision.to_validation_result())?
            )?;

            if record && decision == RestraintDecision::Accepted {
                let engine = CareEngine::open(cfg).await?;
                let saved = engine.restraints.record_restraint(restraint).await?;
                writeln!(out, "Recorded restraint with ID: {}", saved.id)?;
            }
        }
        Commands::RiskScore { file, alerts } => {
            let patient: Patient = read_json(&file)?;
            writeln!(
                out,
                "{}",
                serde_json::to_string_pretty(&calculate_risk_score(&patient))?
            )?;

            if alerts {
                let engine = CareEngine::open(cfg).await?;
                for alert in engine.fall_risk.get_risk_alerts(&patient).await? {
                    writeln!(out, "[{:?}] {}", alert.severity, alert.message)?;
                }
            }
        }
        Commands::Alternatives => {
            for strategy in get_alternative_strategies(&StrategyContext::default()) {
                writeln!(out, "{:?}: {}", strategy.category, strategy.title)?;
                writeln!(out, "  {}", strategy.description)?;
                for example in strategy.examples {
                    writeln!(out, "  - {}", example)?;
                }
            }
        }
        Commands::RecordEvent {
            patient_id,
            event_type,
            performed_by,
            timestamp,
            metadata,
        } => {
            let timestamp = match timestamp {
                Some(raw) => {
                    parse_date(&raw).with_context(|| format!("invalid timestamp '{raw}'"))?
                }
                None => Utc::now(),
            };
            let metadata: Map<String, Value> = match metadata {
                Some(raw) => {
                    serde_json::from_str(&raw).context("metadata must be a JSON object")?
                }
                None => Map::new(),
            };

            let engine = CareEngine::open(cfg).await?;
            let event = engine
                .history
                .record_event(NewCareEvent {
                    patient_id,
                    event_type: event_type.parse()?,
                    timestamp,
                    performed_by,
                    sync_status: None,
                    metadata,
                })
                .await?;
            writeln!(out, "Recorded care event with ID: {}", event.id)?;
        }
        Commands::History {
            patient_id,
            event_type,
            start,
            end,
            order,
        } => {
            let date_range = match (start, end) {
                (Some(start), Some(end)) => Some(DateRange::parse(&start, &end)?),
                _ => None,
            };
            let filter = HistoryFilter {
                patient_id,
                event_type: event_type
                    .as_deref()
                    .map(str::parse::<CareEventType>)
                    .transpose()?,
                date_range,
            };

            let engine = CareEngine::open(cfg).await?;
            let events = engine
                .history
                .get_filtered_history(&filter, order.parse::<SortOrder>()?)
                .await?;
            if events.is_empty() {
                writeln!(out, "No care events found.")?;
            }
            for event in events {
                writeln!(
                    out,
                    "ID: {}, Patient: {}, Type: {}, At: {}, By: {}",
                    event.id,
                    event.patient_id,
                    event.event_type,
                    event.timestamp.to_rfc3339(),
                    event.performed_by
                )?;
            }
        }
        Commands::Export {
            format,
            patient_id,
            output,
        } => {
            let format: ExportFormat = format.parse()?;
            let engine = CareEngine::open(cfg).await?;
            let events = engine
                .history
                .get_history(patient_id.as_deref(), SortOrder::Asc)
                .await?;
            let export = export_history_with_timestamps(&events, format)?;

            match output {
                Some(path) => {
                    std::fs::write(&path, &export.data)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    writeln!(
                        out,
                        "Exported {} care event(s) to {}",
                        export.events.len(),
                        path.display()
                    )?;
                }
                None => writeln!(out, "{}", export.data)?,
            }
        }
        Commands::Stats { patient_id } => {
            let engine = CareEngine::open(cfg).await?;
            let stats = engine
                .history
                .get_history_stats(patient_id.as_deref())
                .await?;
            writeln!(out, "{}", serde_json::to_string_pretty(&stats)?)?;
        }
        Commands::DeleteEvent { id } => {
            let id = RecordId::parse(&id)?;
            let engine = CareEngine::open(cfg).await?;
            engine.history.delete_event(&id).await?;
            writeln!(out, "Deleted care event {}", id)?;
        }
    }

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_history_range_needs_both_bounds() {
        let parsed = Cli::try_parse_from(["careguard", "history", "--start", "2026-01-01"]);
        assert!(parsed.is_err());
    }

    async fn run_captured(command: Commands, cfg: &CoreConfig) -> String {
        let mut out = Vec::new();
        run(command, cfg, &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn test_validate_restraint_file() {
        let temp = TempDir::new().unwrap();
        let cfg = CoreConfig::new(temp.path().join("data")).unwrap();
        let file = temp.path().join("restraint.json");
        std::fs::write(
            &file,
            r#"{"patientId":"p-1","specificType":"Sedante lorazepam","justification":"Paciente agitado y no coopera","alternatives":["Música"]}"#,
        )
        .unwrap();

        let output = run_captured(
            Commands::ValidateRestraint {
                file,
                record: true,
            },
            &cfg,
        )
        .await;

        assert!(output.contains("BUSINESS_CHEMICAL_RESTRAINT_BLOCKED"));
        assert!(!output.contains("Recorded restraint"));
    }

    #[tokio::test]
    async fn test_record_then_export_and_delete() {
        let temp = TempDir::new().unwrap();
        let cfg = CoreConfig::new(temp.path().join("data")).unwrap();

        let output = run_captured(
            Commands::RecordEvent {
                patient_id: "p-1".into(),
                event_type: "hygiene".into(),
                performed_by: "nurse-ana".into(),
                timestamp: Some("2026-04-02T07:30:00Z".into()),
                metadata: Some(r#"{"bath": "full"}"#.into()),
            },
            &cfg,
        )
        .await;
        let id = output.trim().rsplit(' ').next().unwrap().to_string();

        let csv = run_captured(
            Commands::Export {
                format: "csv".into(),
                patient_id: Some("p-1".into()),
                output: None,
            },
            &cfg,
        )
        .await;
        assert!(csv.contains(&id));
        assert!(csv.contains("HYGIENE"));

        let output = run_captured(Commands::DeleteEvent { id: id.clone() }, &cfg).await;
        assert!(output.contains(&id));

        let output = run_captured(
            Commands::History {
                patient_id: Some("p-1".into()),
                event_type: None,
                start: None,
                end: None,
                order: "DESC".into(),
            },
            &cfg,
        )
        .await;
        assert!(output.contains("No care events found."));
    }
}
