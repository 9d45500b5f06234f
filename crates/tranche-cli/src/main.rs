mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::lending::{RedeemArgs, RedeemFeeArgs};
use commands::sweep::SweepArgs;

/// Senior/junior tranche redemption on a pooled reserve
#[derive(Parser)]
#[command(
    name = "tranche",
    version,
    about = "Senior/junior tranche redemption on a pooled reserve",
    long_about = "Re-values a senior and a junior claim on a shared reserve when the \
                  reserve's fair value moves. Supports the plain lending waterfall, a \
                  fee-bearing whole-token variant, and sweeps over new fair values."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log regime selection and intermediate values to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Redeem a senior/junior pair against a reserve fair-value move
    Redeem(RedeemArgs),
    /// Fee-bearing redemption on whole-token quantities
    RedeemFee(RedeemFeeArgs),
    /// Redeem one starting state across a range of new fair values
    Sweep(SweepArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
    Yaml,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Redeem(args) => commands::lending::run_redeem(args),
        Commands::RedeemFee(args) => commands::lending::run_redeem_fee(args),
        Commands::Sweep(args) => commands::sweep::run_sweep(args),
        Commands::Version => {
            println!("tranche {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
