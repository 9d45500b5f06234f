use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use tranche_core::lending::{self, LendingRedemptionInput};
use tranche_core::lending_fee::{self, LendingFeeInput};
use tranche_core::TrancheQuantity;

use crate::input;

/// Arguments for a single lending-tranche redemption
#[derive(Args)]
pub struct RedeemArgs {
    /// Senior tranche quantity before redemption
    #[arg(long)]
    pub senior: Option<Decimal>,

    /// Junior tranche quantity before redemption
    #[arg(long)]
    pub junior: Option<Decimal>,

    /// Reserve fair value at the last redemption
    #[arg(long)]
    pub old_fair_value: Option<Decimal>,

    /// Reserve fair value now
    #[arg(long)]
    pub new_fair_value: Option<Decimal>,

    /// Fraction of excess return kept by the junior tranche (e.g. 0.2 for 20%)
    #[arg(long)]
    pub interest_split: Option<Decimal>,

    /// Relative conservation tolerance (default 1e-20)
    #[arg(long)]
    pub tolerance: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a fee-bearing redemption
#[derive(Args)]
pub struct RedeemFeeArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_redeem(args: RedeemArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let redeem_input: LendingRedemptionInput = match input::load(args.input.as_deref())? {
        Some(loaded) => loaded,
        None => LendingRedemptionInput {
            old_quantity: TrancheQuantity::new(
                args.senior
                    .ok_or("--senior is required (or provide --input)")?,
                args.junior
                    .ok_or("--junior is required (or provide --input)")?,
            ),
            old_reserve_fair_value: args
                .old_fair_value
                .ok_or("--old-fair-value is required (or provide --input)")?,
            new_reserve_fair_value: args
                .new_fair_value
                .ok_or("--new-fair-value is required (or provide --input)")?,
            interest_split: args
                .interest_split
                .ok_or("--interest-split is required (or provide --input)")?,
            conservation_tolerance: args.tolerance,
        },
    };

    let result = lending::redeem_lending(&redeem_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_redeem_fee(args: RedeemFeeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let fee_input: LendingFeeInput = input::load(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for fee-bearing redemption")?;
    let result = lending_fee::redeem_lending_fee(&fee_input)?;
    Ok(serde_json::to_value(result)?)
}
