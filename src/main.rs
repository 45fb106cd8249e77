//! ed-triage
//!
//! Command line entry point: score, predict, allocate and report over JSON
//! case files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use ed_triage::config;
use ed_triage::core::{
    calculate_quality_metrics, calculate_triage_score, optimize_resource_allocation, predict_deterioration,
};
use ed_triage::models::{Demographics, EmergencyCase, Resource, VitalsSnapshot};
use ed_triage::telemetry;

#[derive(Parser)]
#[command(name = "ed-triage", about = "Emergency department triage toolkit")]
struct Cli {
    /// Configuration file, replaces config/default and config/{ED_ENV}
    #[arg(long, global = true)]
    config: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one presentation: {"vitals", "symptoms", "demographics"}
    Score { input: PathBuf },
    /// Forecast deterioration for one case
    Predict { case: PathBuf },
    /// Plan resource assignments for a list of cases
    Allocate {
        cases: PathBuf,
        /// Resource list; defaults to the configured inventory
        #[arg(long)]
        resources: Option<PathBuf>,
    },
    /// Quality metrics for a list of cases
    Metrics {
        cases: PathBuf,
        #[arg(long)]
        hours: Option<i64>,
    },
}

#[derive(Debug, Deserialize)]
struct ScoreInput {
    vitals: VitalsSnapshot,
    #[serde(default)]
    symptoms: Vec<String>,
    #[serde(default)]
    demographics: Demographics,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = config::load_settings(cli.config.as_deref())
        .context("Failed to load configuration")?
        .with_default_inventory(2);
    telemetry::init_tracing(&settings.logging);

    match cli.command {
        Commands::Score { input } => {
            let input: ScoreInput = read_json(&input)?;
            let assessment = calculate_triage_score(&input.vitals, &input.symptoms, &input.demographics);
            print_json(&assessment)?;
        }
        Commands::Predict { case } => {
            let case: EmergencyCase = read_json(&case)?;
            print_json(&predict_deterioration(&case))?;
        }
        Commands::Allocate { cases, resources } => {
            let cases: Vec<EmergencyCase> = read_json(&cases)?;
            let resources: Vec<Resource> = match resources {
                Some(path) => read_json(&path)?,
                None => settings.resources.clone(),
            };
            info!(cases = cases.len(), resources = resources.len(), "allocating");
            print_json(&optimize_resource_allocation(&cases, &resources, Utc::now()))?;
        }
        Commands::Metrics { cases, hours } => {
            let cases: Vec<EmergencyCase> = read_json(&cases)?;
            let hours = hours.unwrap_or(settings.quality.timeframe_hours);
            print_json(&calculate_quality_metrics(&cases, hours, Utc::now()))?;
        }
    }
    Ok(())
}
