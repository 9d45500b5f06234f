use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::conservation::{residual_junior, verify};
use super::regime::Regime;
use crate::config::{ConservationTolerance, InterestSplit, LendingConfig};
use crate::types::{
    checked, validate_fair_value, with_metadata, ComputationOutput, FairValue, Quantity, Rate,
    TrancheQuantity,
};
use crate::TrancheResult;

// ---------------------------------------------------------------------------
// Redeemer
// ---------------------------------------------------------------------------

/// Outcome of one redemption period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redemption {
    pub regime: Regime,
    pub quantity: TrancheQuantity,
    /// Negative residual noise floored to zero (normally zero)
    pub residual_floored: Decimal,
    /// Signed deviation of the new pool total from the old one
    pub conservation_error: Decimal,
}

/// Stateless senior/junior redemption with a fixed interest split.
///
/// Holds only immutable configuration, so a single instance can be shared
/// freely across threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LendingRedeemer {
    config: LendingConfig,
}

impl LendingRedeemer {
    pub fn new(config: LendingConfig) -> Self {
        Self { config }
    }

    /// Redeemer with the default conservation tolerance.
    pub fn with_split(interest_split: InterestSplit) -> Self {
        Self::new(LendingConfig::new(interest_split))
    }

    pub fn config(&self) -> &LendingConfig {
        &self.config
    }

    /// Re-value `old` for a reserve move from `old_fair_value` to
    /// `new_fair_value`.
    pub fn redeem(
        &self,
        old: TrancheQuantity,
        old_fair_value: FairValue,
        new_fair_value: FairValue,
    ) -> TrancheResult<Redemption> {
        old.validate()?;
        validate_fair_value("old_reserve_fair_value", old_fair_value)?;
        validate_fair_value("new_reserve_fair_value", new_fair_value)?;

        let pool = checked(old.checked_total(), "redeem: pool total")?;
        let regime = Regime::select(old_fair_value, new_fair_value);
        tracing::debug!(
            %regime,
            senior = %old.senior,
            junior = %old.junior,
            %old_fair_value,
            %new_fair_value,
            "selected redemption regime"
        );

        let senior = regime.senior_quantity(
            &old,
            old_fair_value,
            new_fair_value,
            self.config.interest_split,
        )?;
        let residual = residual_junior(pool, senior, &self.config.tolerance)?;
        let quantity = TrancheQuantity::new(senior, residual.junior);
        let conservation_error = verify(pool, &quantity, &self.config.tolerance)?;

        Ok(Redemption {
            regime,
            quantity,
            residual_floored: residual.floored,
            conservation_error,
        })
    }
}

// ---------------------------------------------------------------------------
// Input / output types
// ---------------------------------------------------------------------------

/// Input for a single lending-tranche redemption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LendingRedemptionInput {
    /// Tranche quantities at the last redemption
    pub old_quantity: TrancheQuantity,
    /// Reserve fair value at the last redemption
    pub old_reserve_fair_value: FairValue,
    /// Reserve fair value now
    pub new_reserve_fair_value: FairValue,
    /// Fraction of excess return kept by the junior tranche (0.2 = 20%)
    pub interest_split: Rate,
    /// Relative conservation tolerance; defaults to 1e-20
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conservation_tolerance: Option<Decimal>,
}

impl LendingRedemptionInput {
    pub fn config(&self) -> TrancheResult<LendingConfig> {
        let split = InterestSplit::new(self.interest_split)?;
        let tolerance = match self.conservation_tolerance {
            Some(t) => ConservationTolerance::new(t)?,
            None => ConservationTolerance::default(),
        };
        Ok(LendingConfig::new(split).with_tolerance(tolerance))
    }
}

/// Result of a single lending-tranche redemption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LendingRedemptionOutput {
    pub regime: Regime,
    pub senior: Quantity,
    pub junior: Quantity,
    /// New minus old senior quantity
    pub senior_delta: Decimal,
    /// New minus old junior quantity
    pub junior_delta: Decimal,
    pub total_quantity: Quantity,
    pub conservation_error: Decimal,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Redeem a senior/junior pair against a reserve fair-value move.
///
/// Regimes are checked in priority order: past default, gain, total loss,
/// partial loss. Junior is always the residual of the pool.
pub fn redeem_lending(
    input: &LendingRedemptionInput,
) -> TrancheResult<ComputationOutput<LendingRedemptionOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let config = input.config()?;
    let redeemer = LendingRedeemer::new(config);
    let old = input.old_quantity;
    let redemption = redeemer.redeem(
        old,
        input.old_reserve_fair_value,
        input.new_reserve_fair_value,
    )?;
    let new = redemption.quantity;
    let pool = checked(old.checked_total(), "redeem: pool total")?;

    match redemption.regime {
        Regime::PastDefault => {
            warnings.push("Reserve was already in default; quantities unchanged".into());
        }
        Regime::TotalLoss => {
            warnings.push("Reserve fully written down; junior tranche wiped out".into());
        }
        Regime::PartialLoss if new.senior == pool && old.junior > Decimal::ZERO => {
            warnings.push("Senior claim capped at combined pool; junior tranche wiped out".into());
        }
        _ => {}
    }
    if !redemption.residual_floored.is_zero() {
        warnings.push(format!(
            "Negative junior residual of {} floored to zero",
            redemption.residual_floored
        ));
    }

    let output = LendingRedemptionOutput {
        regime: redemption.regime,
        senior: new.senior,
        junior: new.junior,
        senior_delta: new.senior - old.senior,
        junior_delta: new.junior - old.junior,
        total_quantity: pool,
        conservation_error: redemption.conservation_error,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Senior/junior lending tranche redemption (residual junior)",
        &serde_json::json!({
            "interest_split": config.interest_split.get().to_string(),
            "conservation_tolerance": config.tolerance.relative().to_string(),
            "old_reserve_fair_value": input.old_reserve_fair_value.to_string(),
            "new_reserve_fair_value": input.new_reserve_fair_value.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrancheError;
    use rust_decimal_macros::dec;

    fn redeemer() -> LendingRedeemer {
        LendingRedeemer::with_split(InterestSplit::new(dec!(0.2)).unwrap())
    }

    fn q(senior: Decimal, junior: Decimal) -> TrancheQuantity {
        TrancheQuantity::new(senior, junior)
    }

    fn input(old: TrancheQuantity, old_fv: Decimal, new_fv: Decimal) -> LendingRedemptionInput {
        LendingRedemptionInput {
            old_quantity: old,
            old_reserve_fair_value: old_fv,
            new_reserve_fair_value: new_fv,
            interest_split: dec!(0.2),
            conservation_tolerance: None,
        }
    }

    #[test]
    fn test_flat_returns() {
        let r = redeemer().redeem(q(dec!(1), dec!(1)), dec!(1), dec!(1)).unwrap();
        assert_eq!(r.quantity, q(dec!(1), dec!(1)));
        assert_eq!(r.regime, Regime::PartialLoss);
    }

    #[test]
    fn test_positive_returns() {
        let r = redeemer().redeem(q(dec!(1), dec!(1)), dec!(60), dec!(75)).unwrap();
        assert_eq!(r.regime, Regime::Gain);
        assert_eq!(r.quantity, q(dec!(0.96), dec!(1.04)));
        assert_eq!(r.conservation_error, Decimal::ZERO);
    }

    #[test]
    fn test_negative_returns_senior_imbalance() {
        let r = redeemer().redeem(q(dec!(100), dec!(1)), dec!(60), dec!(48)).unwrap();
        assert_eq!(r.quantity, q(dec!(101), dec!(0)));
    }

    #[test]
    fn test_junior_wipeout() {
        let r = redeemer().redeem(q(dec!(1), dec!(1)), dec!(100), dec!(50)).unwrap();
        assert_eq!(r.quantity, q(dec!(2), dec!(0)));
    }

    #[test]
    fn test_total_loss() {
        let r = redeemer().redeem(q(dec!(1), dec!(1)), dec!(13), dec!(0)).unwrap();
        assert_eq!(r.regime, Regime::TotalLoss);
        assert_eq!(r.quantity, q(dec!(2), dec!(0)));
    }

    #[test]
    fn test_past_default() {
        let r = redeemer().redeem(q(dec!(10), dec!(1)), dec!(0), dec!(0)).unwrap();
        assert_eq!(r.regime, Regime::PastDefault);
        assert_eq!(r.quantity, q(dec!(10), dec!(1)));
    }

    #[test]
    fn test_rejects_negative_fair_value() {
        let err = redeemer()
            .redeem(q(dec!(1), dec!(1)), dec!(-1), dec!(1))
            .unwrap_err();
        match err {
            TrancheError::InvalidInput { field, .. } => {
                assert_eq!(field, "old_reserve_fair_value")
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_negative_quantity() {
        assert!(matches!(
            redeemer().redeem(q(dec!(1), dec!(-1)), dec!(1), dec!(1)),
            Err(TrancheError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_envelope_warns_on_wipeout() {
        let out = redeem_lending(&input(q(dec!(1), dec!(1)), dec!(100), dec!(50))).unwrap();
        assert_eq!(out.result.senior, dec!(2));
        assert_eq!(out.result.junior_delta, dec!(-1));
        assert!(out.warnings.iter().any(|w| w.contains("capped")));
    }

    #[test]
    fn test_envelope_no_warnings_on_gain() {
        let out = redeem_lending(&input(q(dec!(1), dec!(1)), dec!(60), dec!(75))).unwrap();
        assert!(out.warnings.is_empty());
        assert_eq!(out.result.senior_delta, dec!(-0.04));
        assert_eq!(out.result.total_quantity, dec!(2));
    }

    #[test]
    fn test_envelope_rejects_bad_split() {
        let mut bad = input(q(dec!(1), dec!(1)), dec!(1), dec!(1));
        bad.interest_split = dec!(1.2);
        assert!(matches!(
            redeem_lending(&bad),
            Err(TrancheError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_envelope_rejects_bad_tolerance() {
        let mut bad = input(q(dec!(1), dec!(1)), dec!(1), dec!(1));
        bad.conservation_tolerance = Some(dec!(2));
        assert!(matches!(
            redeem_lending(&bad),
            Err(TrancheError::InvalidConfiguration { .. })
        ));
    }
}
