use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    clean::{self, CleanArgs},
    enumerate::{self, EnumerateArgs},
    factorize::{self, FactorizeArgs},
};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

#[derive(Parser, Debug)]
#[command(name = "nloc", about = "n-locality scalar extension toolkit")]
struct Cli {
    /// Tracing directives such as `nloc_relax=debug`; overrides `RUST_LOG`.
    #[arg(long, global = true)]
    log: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean the moments, derive factorization constraints and extra columns.
    Factorize(FactorizeArgs),
    /// Remove numerical noise from the scenario's known moments.
    Clean(CleanArgs),
    /// Print the reduced monomials of all operators up to a degree.
    Enumerate(EnumerateArgs),
}

fn init_tracing(directives: Option<&str>) -> Result<(), Box<dyn Error>> {
    let filter = match directives {
        Some(directives) => EnvFilter::try_new(directives)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| err.to_string())?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log.as_deref())?;
    match cli.command {
        Command::Factorize(args) => factorize::run(&args),
        Command::Clean(args) => clean::run(&args),
        Command::Enumerate(args) => enumerate::run(&args),
    }
}
