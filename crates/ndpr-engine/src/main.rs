//! NDPR breach-notification engine CLI.
//!
//! Inspection tooling over the engine: score assessment inputs, classify a
//! breach report, and list upcoming or missed notification deadlines from
//! an exported store snapshot. Operates on JSON files and stdout only.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ndpr_engine::{
    classify_severity, compute_requirement, score_risk, BreachStore, DeadlineMonitor,
    NewBreachReport, RiskInputs, SeverityConfig, StoreSnapshot,
};
use ndpr_types::{BreachId, Timestamp};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "ndpr-engine")]
#[command(version, about = "NDPR breach-notification compliance engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Score risk-assessment inputs (five 1-5 integers)
    Score {
        #[arg(long)]
        confidentiality: u8,
        #[arg(long)]
        integrity: u8,
        #[arg(long)]
        availability: u8,
        #[arg(long)]
        likelihood: u8,
        #[arg(long)]
        severity: u8,
    },

    /// Classify a breach report and compute its notification requirement
    Classify {
        /// Breach report JSON (intake-collaborator format, no id)
        #[arg(short, long)]
        report: PathBuf,

        /// Optional risk-assessment inputs JSON (five 1-5 integers)
        #[arg(short, long)]
        assessment: Option<PathBuf>,
    },

    /// List breaches whose notification deadline falls within a threshold
    Deadlines {
        /// Store snapshot JSON, as exported by the persistence layer
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Threshold in hours
        #[arg(short, long, default_value_t = 72.0)]
        threshold: f64,

        /// Reference time as Unix milliseconds (defaults to now)
        #[arg(long)]
        now: Option<i64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Score {
            confidentiality,
            integrity,
            availability,
            likelihood,
            severity,
        } => score(RiskInputs {
            confidentiality_impact: confidentiality,
            integrity_impact: integrity,
            availability_impact: availability,
            harm_likelihood: likelihood,
            harm_severity: severity,
        }),
        Commands::Classify { report, assessment } => classify(&report, assessment.as_deref()),
        Commands::Deadlines {
            snapshot,
            threshold,
            now,
        } => deadlines(&snapshot, threshold, now),
    }
}

fn score(inputs: RiskInputs) -> Result<()> {
    let assessment = score_risk(BreachId::new(), inputs, Timestamp::now(), None)
        .context("Failed to score assessment inputs")?;

    println!("Overall risk score: {:.1} / 100", assessment.overall_risk_score);
    println!("Risk level:         {}", assessment.risk_level);
    println!(
        "Risk to rights and freedoms:      {}",
        if assessment.risks_to_rights_and_freedoms { "yes" } else { "no" }
    );
    println!(
        "High risk to rights and freedoms: {}",
        if assessment.high_risks_to_rights_and_freedoms { "yes" } else { "no" }
    );
    Ok(())
}

fn classify(report_path: &PathBuf, assessment_path: Option<&std::path::Path>) -> Result<()> {
    let report_json = std::fs::read_to_string(report_path)
        .with_context(|| format!("Failed to read report from {}", report_path.display()))?;
    let new_report: NewBreachReport =
        serde_json::from_str(&report_json).context("Failed to parse breach report JSON")?;

    let store = BreachStore::new();
    let report = store
        .create_report(new_report)
        .context("Breach report failed validation")?;

    let assessment = match assessment_path {
        Some(path) => {
            let inputs_json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read assessment from {}", path.display()))?;
            let inputs: RiskInputs = serde_json::from_str(&inputs_json)
                .context("Failed to parse assessment inputs JSON")?;
            Some(
                score_risk(report.id, inputs, Timestamp::now(), None)
                    .context("Assessment inputs failed validation")?,
            )
        }
        None => None,
    };

    let config = SeverityConfig::default();
    let classification = classify_severity(&report, assessment.as_ref(), &config)
        .context("Failed to classify severity")?;
    let requirement = compute_requirement(&report, assessment.as_ref(), &config)
        .context("Failed to compute notification requirement")?;

    info!(breach = %report.id, "classified breach report");

    println!("Severity:  {}", classification.severity_level);
    if let Some(assessment) = &assessment {
        println!(
            "Risk:      {} (score {:.1})",
            assessment.risk_level, assessment.overall_risk_score
        );
    }
    println!();
    if requirement.nitda_notification_required {
        println!(
            "✓ NITDA notification REQUIRED by {}",
            requirement.nitda_notification_deadline
        );
    } else {
        println!("○ No NITDA notification required");
    }
    if requirement.data_subject_notification_required {
        println!("⚠ Data subjects must be informed without undue delay");
    }
    println!();
    println!("Justification: {}", requirement.justification);
    Ok(())
}

fn deadlines(snapshot_path: &PathBuf, threshold: f64, now: Option<i64>) -> Result<()> {
    let snapshot_json = std::fs::read_to_string(snapshot_path)
        .with_context(|| format!("Failed to read snapshot from {}", snapshot_path.display()))?;
    let snapshot: StoreSnapshot =
        serde_json::from_str(&snapshot_json).context("Failed to parse store snapshot JSON")?;
    let store = BreachStore::from_snapshot(snapshot).context("Snapshot failed validation")?;

    let now = now.map_or_else(Timestamp::now, Timestamp::from_millis);
    let monitor = DeadlineMonitor::new(&store, SeverityConfig::default());
    let pending = monitor
        .breaches_requiring_notification(now, threshold)
        .context("Deadline scan failed")?;

    if pending.is_empty() {
        println!(
            "No breaches require notification within {threshold} hours of {now}"
        );
        return Ok(());
    }

    println!("Breaches requiring NITDA notification (as of {now}):");
    println!();
    for entry in &pending {
        let marker = if entry.hours_remaining < 0.0 { "⚠" } else { "•" };
        println!(
            "{marker} {} [{}] {}",
            entry.report.id, entry.report.category.id, entry.report.status
        );
        if entry.hours_remaining < 0.0 {
            println!("    deadline MISSED {:.1}h ago", -entry.hours_remaining);
        } else {
            println!("    {:.1}h remaining", entry.hours_remaining);
        }
        println!("    deadline: {}", entry.requirement.nitda_notification_deadline);
    }
    println!();
    println!("Total: {}", pending.len());
    Ok(())
}
