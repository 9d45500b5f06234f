use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use tranche_core::lending_fee::fee::redeem_with_fees;
use tranche_core::lending_fee::{redeem_lending_fee, LendingFeeInput};
use tranche_core::{FeeSchedule, InterestSplit};

fn fee_input(
    old_quantity: [u64; 2],
    old_reserve: Decimal,
    new_reserve: Decimal,
    mgmt_fee: Decimal,
    perf_fee: Decimal,
) -> LendingFeeInput {
    LendingFeeInput {
        old_quantity,
        old_reserve_fair_value: old_reserve,
        new_reserve_fair_value: new_reserve,
        interest_split: dec!(0.2),
        mgmt_fee,
        perf_fee,
    }
}

// ===========================================================================
// Scenarios
// ===========================================================================

#[test]
fn test_positive_returns_rounding_fee() {
    let out = redeem_lending_fee(&fee_input(
        [100_000; 2],
        dec!(0.6),
        dec!(0.61),
        dec!(0.0649),
        dec!(0.0123),
    ))
    .unwrap();
    assert_eq!(
        (out.result.senior, out.result.junior, out.result.fee_quantity),
        (93_188, 93_793, 13_019)
    );
}

#[test]
fn test_positive_returns_senior_imbalance_fee() {
    let out = redeem_lending_fee(&fee_input(
        [100_000, 1_000],
        dec!(0.6),
        dec!(0.75),
        dec!(0.08),
        dec!(0.16),
    ))
    .unwrap();
    assert_eq!(
        (out.result.senior, out.result.junior, out.result.fee_quantity),
        (85_964, 3_981, 11_055)
    );
    assert!(!out.result.defaulted);
}

#[test]
fn test_negative_returns_rounding_fee() {
    let out = redeem_lending_fee(&fee_input(
        [100_000; 2],
        dec!(0.6),
        dec!(0.59),
        dec!(0.01),
        dec!(0.05),
    ))
    .unwrap();
    assert_eq!(
        (out.result.senior, out.result.junior, out.result.fee_quantity),
        (100_677, 97_322, 2_001)
    );
}

#[test]
fn test_negative_returns_junior_imbalance_fee() {
    let out = redeem_lending_fee(&fee_input(
        [1_000, 100_000],
        Decimal::ONE,
        dec!(0.8),
        dec!(0.0999),
        Decimal::ZERO,
    ))
    .unwrap();
    assert_eq!(
        (out.result.senior, out.result.junior, out.result.fee_quantity),
        (1_125, 89_784, 10_091)
    );
}

#[test]
fn test_junior_wipeout_senior_partial_fee() {
    let out = redeem_lending_fee(&fee_input(
        [100_000; 2],
        Decimal::ONE,
        dec!(0.25),
        dec!(0.0132),
        dec!(0.85),
    ))
    .unwrap();
    assert_eq!(
        (out.result.senior, out.result.junior, out.result.fee_quantity),
        (197_360, 0, 2_640)
    );
    assert_eq!(out.warnings, vec!["Junior tranche wiped out".to_string()]);
}

#[test]
fn test_fee_input_defaults_fees_to_zero() {
    let input: LendingFeeInput = serde_json::from_str(
        r#"{
            "old_quantity": [100000, 100000],
            "old_reserve_fair_value": "0.8",
            "new_reserve_fair_value": "0.64",
            "interest_split": "0.2"
        }"#,
    )
    .unwrap();
    let out = redeem_lending_fee(&input).unwrap();
    assert_eq!(
        (out.result.senior, out.result.junior, out.result.fee_quantity),
        (125_000, 75_000, 0)
    );
}

#[test]
fn test_zero_fees_match_lending_quantities_on_even_moves() {
    // Without fees and with terminating quotients, whole-token results equal
    // the continuous redemption.
    let split = InterestSplit::new(dec!(0.2)).unwrap();
    let res = redeem_with_fees(
        [1_000, 100_000],
        Decimal::ONE,
        dec!(1.25),
        split,
        &FeeSchedule::zero(),
    )
    .unwrap();
    assert_eq!(res.new_quantity, [960, 100_040]);
    assert_eq!(res.fee_quantity, 0);
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #[test]
    fn prop_tokens_are_conserved(
        senior in 0u64..=1_000_000_000,
        junior in 0u64..=1_000_000_000,
        old_bps in 0u32..=50_000,
        new_bps in 0u32..=50_000,
        split_bps in 0u32..=10_000,
        mgmt_bps in 0u32..=10_000,
        perf_bps in 0u32..=10_000,
    ) {
        let split = InterestSplit::from_bps(split_bps).unwrap();
        let fees = FeeSchedule::new(
            Decimal::new(mgmt_bps as i64, 4),
            Decimal::new(perf_bps as i64, 4),
        )
        .unwrap();
        let res = redeem_with_fees(
            [senior, junior],
            Decimal::new(old_bps as i64, 4),
            Decimal::new(new_bps as i64, 4),
            split,
            &fees,
        )
        .unwrap();
        prop_assert_eq!(
            res.new_quantity[0] + res.new_quantity[1] + res.fee_quantity,
            senior + junior
        );
    }
}
