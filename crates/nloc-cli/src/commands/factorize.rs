use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use nloc_relax::{build_report, report_to_json};
use serde::Serialize;
use tracing::info;

use super::write_json;
use crate::config::load_config;

#[derive(Args, Debug)]
pub struct FactorizeArgs {
    /// YAML scenario describing parties, moments and options.
    #[arg(long)]
    pub config: PathBuf,
    /// Output directory for the report and constraint artefacts.
    #[arg(long)]
    pub out: PathBuf,
    /// Record a fixed timestamp instead of the current time.
    #[arg(long)]
    pub created_at: Option<String>,
}

#[derive(Serialize)]
struct ColumnEntry {
    column: String,
    monomial: Option<String>,
}

pub fn run(args: &FactorizeArgs) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(&args.out)?;
    let config = load_config(&args.config)?;
    let created_at = args
        .created_at
        .clone()
        .unwrap_or_else(|| Utc::now().to_rfc3339());
    let scenario = config.build(Some(created_at))?;

    let report = build_report(
        &scenario.parties,
        &scenario.moments,
        &scenario.substitutions,
        &scenario.opts,
    )?;
    fs::write(args.out.join("report.json"), report_to_json(&report, true)?)?;

    let constraints: BTreeMap<&str, &str> = report
        .constraints
        .iter()
        .map(|record| (record.key_text.as_str(), record.value_text.as_str()))
        .collect();
    write_json(args.out.join("constraints.json"), &constraints)?;

    let columns: Vec<ColumnEntry> = report
        .extra_columns
        .iter()
        .enumerate()
        .map(|(idx, column)| ColumnEntry {
            column: column.to_string(),
            monomial: report
                .column_names
                .as_ref()
                .and_then(|names| names.get(idx))
                .map(ToString::to_string),
        })
        .collect();
    write_json(args.out.join("extra_columns.json"), &columns)?;

    info!(
        out = %args.out.display(),
        constraints = report.summary.constraints,
        extra_columns = report.summary.extra_columns,
        "wrote factorization artefacts"
    );
    Ok(())
}
