use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use nloc_algebra::{flatten, get_all_monomials, to_canonical_json_pretty, Symbol};

use crate::config::load_config;

#[derive(Args, Debug)]
pub struct EnumerateArgs {
    /// YAML scenario describing the parties.
    #[arg(long)]
    pub config: PathBuf,
    /// Maximum monomial degree.
    #[arg(long, default_value_t = 2)]
    pub degree: usize,
}

pub fn run(args: &EnumerateArgs) -> Result<(), Box<dyn Error>> {
    let config = load_config(&args.config)?;
    let scenario = config.build(None)?;
    let operators: Vec<Symbol> = scenario
        .parties
        .iter()
        .flat_map(|party| flatten(party))
        .collect();
    let monomials = get_all_monomials(&operators, &[], &scenario.substitutions, args.degree)?;
    let rendered: Vec<String> = monomials.iter().map(ToString::to_string).collect();
    println!("{}", to_canonical_json_pretty(&rendered)?);
    Ok(())
}
