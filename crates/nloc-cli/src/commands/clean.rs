use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;
use nloc_relax::{fix_moments, CleanSummary, MomentRecord};
use serde::Serialize;
use tracing::info;

use super::write_json;
use crate::config::load_config;

#[derive(Args, Debug)]
pub struct CleanArgs {
    /// YAML scenario describing parties and moments.
    #[arg(long)]
    pub config: PathBuf,
    /// Output directory for `moments.json`.
    #[arg(long)]
    pub out: PathBuf,
    /// Override the tolerance given in the scenario.
    #[arg(long)]
    pub tolerance: Option<f64>,
}

#[derive(Serialize)]
struct CleanedMoments {
    tolerance: f64,
    summary: CleanSummary,
    moments: Vec<MomentRecord>,
}

pub fn run(args: &CleanArgs) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(&args.out)?;
    let config = load_config(&args.config)?;
    let mut scenario = config.build(None)?;
    let tolerance = args.tolerance.unwrap_or(scenario.opts.tolerance);

    let summary = fix_moments(&mut scenario.moments, tolerance)?;
    let cleaned = CleanedMoments {
        tolerance,
        summary,
        moments: scenario
            .moments
            .iter()
            .map(|(key, value)| MomentRecord::new(key, value))
            .collect(),
    };
    write_json(args.out.join("moments.json"), &cleaned)?;

    info!(
        entries = summary.entries,
        snapped_to_zero = summary.snapped_to_zero,
        "wrote cleaned moments"
    );
    Ok(())
}
