use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::{ConservationTolerance, InterestSplit, LendingConfig};
use crate::error::TrancheError;
use crate::lending::{LendingRedeemer, Regime};
use crate::types::*;
use crate::TrancheResult;

/// Upper bound on generated sweep points.
pub const MAX_SWEEP_POINTS: usize = 10_000;

/// Range of new reserve fair values to evaluate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FairValueRange {
    pub min: FairValue,
    pub max: FairValue,
    pub step: Decimal,
}

/// Input for a new-fair-value sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedemptionSweepInput {
    /// Tranche quantities at the last redemption
    pub old_quantity: TrancheQuantity,
    /// Reserve fair value at the last redemption
    pub old_reserve_fair_value: FairValue,
    pub interest_split: Rate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conservation_tolerance: Option<Decimal>,
    /// New reserve fair values to sweep over
    pub new_reserve_fair_value: FairValueRange,
}

/// One evaluated point of the sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepPoint {
    pub new_reserve_fair_value: FairValue,
    pub regime: Regime,
    pub senior: Quantity,
    pub junior: Quantity,
}

/// Output of a new-fair-value sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedemptionSweepOutput {
    pub points: Vec<SweepPoint>,
    /// Lowest swept fair value at which the junior tranche is still alive
    pub junior_survives_from: Option<FairValue>,
}

/// Generate the sweep values from min to max with step.
fn generate_sweep_values(range: &FairValueRange) -> TrancheResult<Vec<Decimal>> {
    if range.step <= Decimal::ZERO {
        return Err(TrancheError::InvalidInput {
            field: "new_reserve_fair_value.step".into(),
            reason: "Step must be positive".into(),
        });
    }
    if range.min < Decimal::ZERO {
        return Err(TrancheError::InvalidInput {
            field: "new_reserve_fair_value.min".into(),
            reason: "Fair value cannot be negative".into(),
        });
    }
    if range.min > range.max {
        return Err(TrancheError::InvalidInput {
            field: "new_reserve_fair_value".into(),
            reason: "Min must be <= max".into(),
        });
    }

    let too_many = || TrancheError::InvalidInput {
        field: "new_reserve_fair_value.step".into(),
        reason: format!("Sweep would exceed {MAX_SWEEP_POINTS} points"),
    };

    let mut values = Vec::new();
    let mut current = range.min;
    while current <= range.max {
        if values.len() == MAX_SWEEP_POINTS {
            return Err(too_many());
        }
        values.push(current);
        current = match current.checked_add(range.step) {
            Some(next) => next,
            None => break,
        };
    }
    // Ensure max is included if step doesn't land exactly on it
    if let Some(&last) = values.last() {
        if last < range.max {
            if values.len() == MAX_SWEEP_POINTS {
                return Err(too_many());
            }
            values.push(range.max);
        }
    }

    Ok(values)
}

/// Redeem the same starting state against a range of new fair values.
pub fn sweep_new_fair_value(
    input: &RedemptionSweepInput,
) -> TrancheResult<ComputationOutput<RedemptionSweepOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let split = InterestSplit::new(input.interest_split)?;
    let tolerance = match input.conservation_tolerance {
        Some(t) => ConservationTolerance::new(t)?,
        None => ConservationTolerance::default(),
    };
    let redeemer = LendingRedeemer::new(LendingConfig::new(split).with_tolerance(tolerance));

    let values = generate_sweep_values(&input.new_reserve_fair_value)?;
    let mut points = Vec::with_capacity(values.len());
    for new_fv in values {
        let r = redeemer.redeem(input.old_quantity, input.old_reserve_fair_value, new_fv)?;
        points.push(SweepPoint {
            new_reserve_fair_value: new_fv,
            regime: r.regime,
            senior: r.quantity.senior,
            junior: r.quantity.junior,
        });
    }

    let junior_survives_from = points
        .iter()
        .find(|p| p.junior > Decimal::ZERO)
        .map(|p| p.new_reserve_fair_value);

    if input.old_reserve_fair_value.is_zero() {
        warnings.push("Reserve was already in default; every point is unchanged".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Lending tranche redemption across new reserve fair values",
        &serde_json::json!({
            "interest_split": split.get().to_string(),
            "old_reserve_fair_value": input.old_reserve_fair_value.to_string(),
            "min": input.new_reserve_fair_value.min.to_string(),
            "max": input.new_reserve_fair_value.max.to_string(),
            "step": input.new_reserve_fair_value.step.to_string(),
        }),
        warnings,
        elapsed,
        RedemptionSweepOutput {
            points,
            junior_survives_from,
        },
    ))
}
