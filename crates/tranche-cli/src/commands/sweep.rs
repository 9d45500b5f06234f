use clap::Args;
use serde_json::Value;

use tranche_core::sweep::{self, RedemptionSweepInput};

use crate::input;

/// Arguments for a new-fair-value sweep
#[derive(Args)]
pub struct SweepArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_sweep(args: SweepArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sweep_input: RedemptionSweepInput = input::load(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for a fair-value sweep")?;
    let result = sweep::sweep_new_fair_value(&sweep_input)?;
    Ok(serde_json::to_value(result)?)
}
