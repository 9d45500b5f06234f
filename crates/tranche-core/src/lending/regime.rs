use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::InterestSplit;
use crate::types::{checked, FairValue, Quantity, TrancheQuantity};
use crate::TrancheResult;

/// Economic regime of a single redemption period.
///
/// Variants are listed in selection priority: the first condition that holds
/// decides the regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    /// Reserve was already worthless at the start of the period
    PastDefault,
    /// Reserve grew; excess return is shared
    Gain,
    /// Reserve went to zero during the period
    TotalLoss,
    /// Reserve fell (or stayed flat) but kept some value
    PartialLoss,
}

impl Regime {
    /// Pick the regime for a move from `old_fair_value` to `new_fair_value`.
    ///
    /// Both values must already be validated as non-negative.
    pub fn select(old_fair_value: FairValue, new_fair_value: FairValue) -> Self {
        if old_fair_value.is_zero() {
            Regime::PastDefault
        } else if new_fair_value > old_fair_value {
            Regime::Gain
        } else if new_fair_value.is_zero() {
            Regime::TotalLoss
        } else {
            Regime::PartialLoss
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Regime::PastDefault => "past default",
            Regime::Gain => "gain",
            Regime::TotalLoss => "total loss",
            Regime::PartialLoss => "partial loss",
        }
    }

    /// New senior quantity under this regime.
    pub fn senior_quantity(
        &self,
        old: &TrancheQuantity,
        old_fair_value: FairValue,
        new_fair_value: FairValue,
        interest_split: InterestSplit,
    ) -> TrancheResult<Quantity> {
        match self {
            Regime::PastDefault => Ok(past_default_senior(old)),
            Regime::Gain => gain_senior(old, old_fair_value, new_fair_value, interest_split),
            Regime::TotalLoss => total_loss_senior(old),
            Regime::PartialLoss => partial_loss_senior(old, old_fair_value, new_fair_value),
        }
    }
}

impl std::fmt::Display for Regime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Regime calculators
// ---------------------------------------------------------------------------

/// No redemption math once the reserve has defaulted.
pub fn past_default_senior(old: &TrancheQuantity) -> Quantity {
    old.senior
}

/// Senior quantity shrinks with reserve growth but keeps `1 - split` of the
/// excess return:
///
/// `senior * (old / new) * (1 + (new / old - 1) * (1 - split))`
///
/// evaluated as `senior * ((1 - split) + split * old / new)`. With
/// `new > old > 0` the factor lies in `(0, 1]`, so no intermediate exceeds
/// `senior`.
pub fn gain_senior(
    old: &TrancheQuantity,
    old_fair_value: FairValue,
    new_fair_value: FairValue,
    interest_split: InterestSplit,
) -> TrancheResult<Quantity> {
    let shrink = checked(
        old_fair_value.checked_div(new_fair_value),
        "gain: reserve shrink ratio",
    )?;
    let factor = checked(
        interest_split
            .get()
            .checked_mul(shrink)
            .and_then(|v| v.checked_add(interest_split.senior_share())),
        "gain: senior factor",
    )?;
    checked(old.senior.checked_mul(factor), "gain: senior quantity")
}

/// The senior tranche claims the whole pool.
pub fn total_loss_senior(old: &TrancheQuantity) -> TrancheResult<Quantity> {
    checked(old.checked_total(), "total loss: pool total")
}

/// Senior is protected until it holds the entire pool:
///
/// `min(senior + junior, senior * old / new)`
pub fn partial_loss_senior(
    old: &TrancheQuantity,
    old_fair_value: FairValue,
    new_fair_value: FairValue,
) -> TrancheResult<Quantity> {
    let pool = checked(old.checked_total(), "partial loss: pool total")?;
    let protected = match old_fair_value.checked_div(new_fair_value) {
        Some(ratio) => old.senior.checked_mul(ratio),
        // old / new exceeds Decimal::MAX, so new < 1
        None => old
            .senior
            .checked_mul(old_fair_value)
            .and_then(|v| v.checked_div(new_fair_value)),
    };
    // Overflow in either ordering puts the claim above Decimal::MAX, which
    // bounds the pool.
    Ok(protected.map_or(pool, |v| pool.min(v)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn split() -> InterestSplit {
        InterestSplit::new(dec!(0.2)).unwrap()
    }

    #[test]
    fn test_select_priority_order() {
        assert_eq!(Regime::select(dec!(0), dec!(0)), Regime::PastDefault);
        assert_eq!(Regime::select(dec!(0), dec!(5)), Regime::PastDefault);
        assert_eq!(Regime::select(dec!(60), dec!(75)), Regime::Gain);
        assert_eq!(Regime::select(dec!(13), dec!(0)), Regime::TotalLoss);
        assert_eq!(Regime::select(dec!(100), dec!(50)), Regime::PartialLoss);
    }

    #[test]
    fn test_select_flat_is_partial_loss() {
        assert_eq!(Regime::select(dec!(1), dec!(1)), Regime::PartialLoss);
    }

    #[test]
    fn test_past_default_keeps_senior() {
        let old = TrancheQuantity::new(dec!(10), dec!(1));
        assert_eq!(past_default_senior(&old), dec!(10));
    }

    #[test]
    fn test_gain_senior_even_pool() {
        let old = TrancheQuantity::new(dec!(1), dec!(1));
        // 1 * 60/75 * (1 + 0.25 * 0.8) = 0.8 * 1.2
        assert_eq!(gain_senior(&old, dec!(60), dec!(75), split()).unwrap(), dec!(0.96));
    }

    #[test]
    fn test_gain_senior_full_split_to_junior() {
        let old = TrancheQuantity::new(dec!(1), dec!(1));
        let all_junior = InterestSplit::new(Decimal::ONE).unwrap();
        // Senior keeps par value only: quantity scales by old/new.
        assert_eq!(gain_senior(&old, dec!(60), dec!(75), all_junior).unwrap(), dec!(0.8));
    }

    #[test]
    fn test_gain_senior_zero_split_is_pass_through() {
        let old = TrancheQuantity::new(dec!(3), dec!(1));
        let none_junior = InterestSplit::new(Decimal::ZERO).unwrap();
        assert_eq!(gain_senior(&old, dec!(60), dec!(75), none_junior).unwrap(), dec!(3));
    }

    #[test]
    fn test_total_loss_senior_takes_pool() {
        let old = TrancheQuantity::new(dec!(1), dec!(1));
        assert_eq!(total_loss_senior(&old).unwrap(), dec!(2));
    }

    #[test]
    fn test_partial_loss_protected() {
        let old = TrancheQuantity::new(dec!(1), dec!(1));
        assert_eq!(partial_loss_senior(&old, dec!(80), dec!(64)).unwrap(), dec!(1.25));
    }

    #[test]
    fn test_partial_loss_capped_at_pool() {
        let old = TrancheQuantity::new(dec!(100), dec!(1));
        assert_eq!(partial_loss_senior(&old, dec!(60), dec!(48)).unwrap(), dec!(101));
    }

    #[test]
    fn test_partial_loss_unbounded_claim_caps_at_pool() {
        let old = TrancheQuantity::new(dec!(1_000_000), dec!(1));
        let tiny = dec!(0.0000000000000000000000000001);
        let result = partial_loss_senior(&old, Decimal::MAX, tiny).unwrap();
        assert_eq!(result, dec!(1_000_001));
    }

    #[test]
    fn test_partial_loss_large_values_not_capped() {
        // senior * old_fv alone would overflow; the protected claim is ~1.111e15.
        let e15 = dec!(1_000_000_000_000_000);
        let old = TrancheQuantity::new(e15, e15);
        let result = partial_loss_senior(&old, e15, dec!(900_000_000_000_000)).unwrap();
        assert!(result > dec!(1_111_111_111_111_111));
        assert!(result < dec!(1_111_111_111_111_112));
    }

    #[test]
    fn test_partial_loss_zero_senior_with_tiny_new_value() {
        let old = TrancheQuantity::new(Decimal::ZERO, dec!(5));
        let tiny = dec!(0.0000000000000000000000000001);
        assert_eq!(partial_loss_senior(&old, Decimal::MAX, tiny).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_gain_senior_large_values() {
        // 1e15 * (0.8 + 0.2 * 0.5) = 9e14
        let e15 = dec!(1_000_000_000_000_000);
        let old = TrancheQuantity::new(e15, e15);
        let result = gain_senior(&old, e15, dec!(2_000_000_000_000_000), split()).unwrap();
        assert_eq!(result, dec!(900_000_000_000_000));
    }

    #[test]
    fn test_gain_senior_tiny_old_value() {
        // old / new is ~1e-30 and rounds away; senior keeps 1 - split.
        let old = TrancheQuantity::new(dec!(1), dec!(1));
        let result = gain_senior(
            &old,
            dec!(0.0000000001),
            dec!(100_000_000_000_000_000_000),
            split(),
        )
        .unwrap();
        assert!(result >= dec!(0.8));
        assert!(result < dec!(0.80000000001));
    }

    #[test]
    fn test_senior_quantity_dispatch() {
        let old = TrancheQuantity::new(dec!(1), dec!(1));
        let regime = Regime::select(dec!(100), dec!(50));
        assert_eq!(
            regime.senior_quantity(&old, dec!(100), dec!(50), split()).unwrap(),
            dec!(2)
        );
    }

    #[test]
    fn test_regime_serde_snake_case() {
        let json = serde_json::to_string(&Regime::PartialLoss).unwrap();
        assert_eq!(json, r#""partial_loss""#);
    }
}
