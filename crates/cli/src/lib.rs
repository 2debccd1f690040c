pub mod commands;

use clap::{Parser, Subcommand};
use dynaprice_core::pricing::PricingStrategy;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "dynaprice",
    about = "Dynaprice operator CLI",
    long_about = "Prepare the catalog database, load demo products, run one-off pricing cycles, \
                  and inspect effective configuration.",
    after_help = "Examples:\n  dynaprice migrate\n  dynaprice seed\n  dynaprice reprice --dry-run\n  \
                  dynaprice reprice --strategy legacy\n  dynaprice config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo catalog at base prices (idempotent)")]
    Seed,
    #[command(about = "Run a single pricing cycle against the configured catalog")]
    Reprice {
        #[arg(long, help = "Compute and report new prices without writing them")]
        dry_run: bool,
        #[arg(long, help = "Override pricing.strategy for this run (tiered|legacy)")]
        strategy: Option<PricingStrategy>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Reprice { dry_run, strategy } => commands::reprice::run(dry_run, strategy),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
