use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::{FeeSchedule, InterestSplit};
use crate::error::TrancheError;
use crate::types::{checked, validate_fair_value, with_metadata, ComputationOutput, FairValue, Rate};
use crate::TrancheResult;

const SENIOR: usize = 0;
const JUNIOR: usize = 1;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Input for a fee-bearing redemption on whole-token quantities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LendingFeeInput {
    /// `[senior, junior]` token quantities at the last redemption
    pub old_quantity: [u64; 2],
    pub old_reserve_fair_value: FairValue,
    pub new_reserve_fair_value: FairValue,
    /// Fraction of excess return kept by the junior tranche
    pub interest_split: Rate,
    /// Charged on every tranche's value (0.01 = 1%)
    #[serde(default)]
    pub mgmt_fee: Rate,
    /// Charged on a tranche's gain only
    #[serde(default)]
    pub perf_fee: Rate,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Whole-token split of the old pool into senior, junior and fees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRedemption {
    pub new_quantity: [u64; 2],
    pub fee_quantity: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LendingFeeOutput {
    pub senior: u64,
    pub junior: u64,
    pub fee_quantity: u64,
    pub total_quantity: u64,
    /// Either fair value was zero; the pool went to senior net of fees
    pub defaulted: bool,
    /// Senior value after fees, in reserve value units
    pub senior_value: Decimal,
    /// Junior value after fees, in reserve value units
    pub junior_value: Decimal,
}

/// Intermediate values kept for reporting.
struct FeeWaterfall {
    redemption: FeeRedemption,
    defaulted: bool,
    senior_value: Decimal,
    junior_value: Decimal,
}

// ---------------------------------------------------------------------------
// Main function
// ---------------------------------------------------------------------------

/// Redeem whole-token tranche quantities, charging management and
/// performance fees before the senior/junior split.
///
/// Token counts are floored, and every token lost to flooring is booked as
/// fee, so `senior + junior + fee` always equals the old pool.
pub fn redeem_lending_fee(
    input: &LendingFeeInput,
) -> TrancheResult<ComputationOutput<LendingFeeOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let interest_split = InterestSplit::new(input.interest_split)?;
    let fees = FeeSchedule::new(input.mgmt_fee, input.perf_fee)?;
    validate_fair_value("old_reserve_fair_value", input.old_reserve_fair_value)?;
    validate_fair_value("new_reserve_fair_value", input.new_reserve_fair_value)?;

    let waterfall = run_waterfall(
        input.old_quantity,
        input.old_reserve_fair_value,
        input.new_reserve_fair_value,
        interest_split,
        &fees,
    )?;
    let r = waterfall.redemption;
    let total = total_quantity(input.old_quantity)?;

    if waterfall.defaulted {
        warnings.push("Reserve fair value is zero; pool assigned to senior net of fees".into());
    } else if r.new_quantity[JUNIOR] == 0 && input.old_quantity[JUNIOR] > 0 {
        warnings.push("Junior tranche wiped out".into());
    }

    let output = LendingFeeOutput {
        senior: r.new_quantity[SENIOR],
        junior: r.new_quantity[JUNIOR],
        fee_quantity: r.fee_quantity,
        total_quantity: total,
        defaulted: waterfall.defaulted,
        senior_value: waterfall.senior_value,
        junior_value: waterfall.junior_value,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fee-bearing senior/junior lending tranche redemption",
        &serde_json::json!({
            "interest_split": interest_split.get().to_string(),
            "mgmt_fee": fees.mgmt_fee().to_string(),
            "perf_fee": fees.perf_fee().to_string(),
            "rounding": "floor to whole tokens, remainder to fees",
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Core fee waterfall without the envelope. Inputs must already be valid.
pub fn redeem_with_fees(
    old_quantity: [u64; 2],
    old_reserve_fair_value: FairValue,
    new_reserve_fair_value: FairValue,
    interest_split: InterestSplit,
    fees: &FeeSchedule,
) -> TrancheResult<FeeRedemption> {
    run_waterfall(
        old_quantity,
        old_reserve_fair_value,
        new_reserve_fair_value,
        interest_split,
        fees,
    )
    .map(|w| w.redemption)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn total_quantity(quantity: [u64; 2]) -> TrancheResult<u64> {
    quantity[SENIOR]
        .checked_add(quantity[JUNIOR])
        .ok_or_else(|| TrancheError::ArithmeticOverflow {
            context: "fee: pool total".into(),
        })
}

fn floor_to_tokens(value: Decimal, context: &str) -> TrancheResult<u64> {
    value
        .floor()
        .to_u64()
        .ok_or_else(|| TrancheError::ArithmeticOverflow {
            context: context.into(),
        })
}

fn run_waterfall(
    old_quantity: [u64; 2],
    old_fv: FairValue,
    new_fv: FairValue,
    interest_split: InterestSplit,
    fees: &FeeSchedule,
) -> TrancheResult<FeeWaterfall> {
    let total = total_quantity(old_quantity)?;
    let after_mgmt = Decimal::ONE - fees.mgmt_fee();

    if old_fv.is_zero() || new_fv.is_zero() {
        let senior = floor_to_tokens(
            checked(
                Decimal::from(total).checked_mul(after_mgmt),
                "fee: default senior",
            )?,
            "fee: default senior",
        )?;
        tracing::debug!(total, senior, "fee redemption in default");
        return Ok(FeeWaterfall {
            redemption: FeeRedemption {
                new_quantity: [senior, 0],
                fee_quantity: total - senior,
            },
            defaulted: true,
            senior_value: Decimal::ZERO,
            junior_value: Decimal::ZERO,
        });
    }

    // Value of each tranche after the management fee, at the old mark.
    let mut value_mgmt = [Decimal::ZERO; 2];
    // The same value marked to the new fair value, net of performance fee.
    let mut value_perf = [Decimal::ZERO; 2];
    for i in [SENIOR, JUNIOR] {
        let old_value = checked(
            Decimal::from(old_quantity[i])
                .checked_mul(old_fv)
                .and_then(|v| v.checked_mul(after_mgmt)),
            "fee: value after management fee",
        )?;
        let new_value = checked(
            old_value
                .checked_div(old_fv)
                .and_then(|v| v.checked_mul(new_fv)),
            "fee: value at new mark",
        )?;
        value_mgmt[i] = old_value;
        value_perf[i] = if new_value > old_value {
            old_value + (new_value - old_value) * (Decimal::ONE - fees.perf_fee())
        } else {
            new_value
        };
    }

    let pool_value = checked(
        value_perf[SENIOR].checked_add(value_perf[JUNIOR]),
        "fee: pool value",
    )?;
    let senior_value = if value_perf[SENIOR] > value_mgmt[SENIOR] {
        value_mgmt[SENIOR]
            + (value_perf[SENIOR] - value_mgmt[SENIOR]) * interest_split.senior_share()
    } else {
        value_mgmt[SENIOR].min(pool_value)
    };
    let junior_value = pool_value - senior_value;

    let senior = floor_to_tokens(
        checked(senior_value.checked_div(new_fv), "fee: senior quantity")?,
        "fee: senior quantity",
    )?;
    let junior = floor_to_tokens(
        checked(junior_value.checked_div(new_fv), "fee: junior quantity")?,
        "fee: junior quantity",
    )?;

    let fee_quantity = total
        .checked_sub(senior)
        .and_then(|rest| rest.checked_sub(junior))
        .ok_or_else(|| TrancheError::InvariantViolation {
            context: "fee redemption conservation".into(),
            expected: Decimal::from(total),
            actual: Decimal::from(senior) + Decimal::from(junior),
            tolerance: Decimal::ZERO,
        })?;

    tracing::debug!(senior, junior, fee_quantity, "fee redemption");
    Ok(FeeWaterfall {
        redemption: FeeRedemption {
            new_quantity: [senior, junior],
            fee_quantity,
        },
        defaulted: false,
        senior_value,
        junior_value,
    })
}
