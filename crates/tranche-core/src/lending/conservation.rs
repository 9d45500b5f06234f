use rust_decimal::Decimal;

use crate::config::ConservationTolerance;
use crate::error::TrancheError;
use crate::types::{checked, Quantity, TrancheQuantity};
use crate::TrancheResult;

/// Junior quantity derived from the pool total, plus any noise it absorbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Residual {
    pub junior: Quantity,
    /// Magnitude of a negative residual floored to zero
    pub floored: Decimal,
}

/// `junior' = max(0, pool - senior')`.
///
/// The floor only absorbs deviations within `tolerance`. A larger negative
/// residual means the senior formula over-allocated and is reported as an
/// invariant violation.
pub fn residual_junior(
    pool: Quantity,
    new_senior: Quantity,
    tolerance: &ConservationTolerance,
) -> TrancheResult<Residual> {
    let raw = checked(pool.checked_sub(new_senior), "residual: junior quantity")?;
    if raw >= Decimal::ZERO {
        return Ok(Residual {
            junior: raw,
            floored: Decimal::ZERO,
        });
    }

    let allowed = tolerance.allowed_for(pool);
    if raw.abs() > allowed {
        return Err(TrancheError::InvariantViolation {
            context: "residual junior quantity".into(),
            expected: Decimal::ZERO,
            actual: raw,
            tolerance: allowed,
        });
    }

    tracing::warn!(%raw, %allowed, "flooring negative junior residual");
    Ok(Residual {
        junior: Decimal::ZERO,
        floored: raw.abs(),
    })
}

/// Check that the redeemed pair is non-negative and still sums to `pool`.
///
/// Returns the signed deviation `new_total - pool` on success.
pub fn verify(
    pool: Quantity,
    new: &TrancheQuantity,
    tolerance: &ConservationTolerance,
) -> TrancheResult<Decimal> {
    if new.senior < Decimal::ZERO {
        return Err(TrancheError::InvariantViolation {
            context: "senior non-negativity".into(),
            expected: Decimal::ZERO,
            actual: new.senior,
            tolerance: Decimal::ZERO,
        });
    }
    if new.junior < Decimal::ZERO {
        return Err(TrancheError::InvariantViolation {
            context: "junior non-negativity".into(),
            expected: Decimal::ZERO,
            actual: new.junior,
            tolerance: Decimal::ZERO,
        });
    }

    let new_total = checked(new.checked_total(), "conservation: redeemed total")?;
    let deviation = checked(new_total.checked_sub(pool), "conservation: deviation")?;
    let allowed = tolerance.allowed_for(pool);
    if deviation.abs() > allowed {
        return Err(TrancheError::InvariantViolation {
            context: "tranche quantity conservation".into(),
            expected: pool,
            actual: new_total,
            tolerance: allowed,
        });
    }
    Ok(deviation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_residual_positive() {
        let r = residual_junior(dec!(2), dec!(0.96), &ConservationTolerance::exact()).unwrap();
        assert_eq!(r.junior, dec!(1.04));
        assert_eq!(r.floored, Decimal::ZERO);
    }

    #[test]
    fn test_residual_noise_is_floored() {
        let tol = ConservationTolerance::new(dec!(0.000001)).unwrap();
        let r = residual_junior(dec!(2), dec!(2.0000001), &tol).unwrap();
        assert_eq!(r.junior, Decimal::ZERO);
        assert_eq!(r.floored, dec!(0.0000001));
    }

    #[test]
    fn test_residual_large_deficit_is_violation() {
        let tol = ConservationTolerance::new(dec!(0.000001)).unwrap();
        let err = residual_junior(dec!(2), dec!(2.5), &tol).unwrap_err();
        match err {
            TrancheError::InvariantViolation { actual, .. } => assert_eq!(actual, dec!(-0.5)),
            other => panic!("Expected InvariantViolation, got {other:?}"),
        }
    }

    #[test]
    fn test_verify_exact() {
        let new = TrancheQuantity::new(dec!(0.96), dec!(1.04));
        let dev = verify(dec!(2), &new, &ConservationTolerance::exact()).unwrap();
        assert_eq!(dev, Decimal::ZERO);
    }

    #[test]
    fn test_verify_within_tolerance() {
        let tol = ConservationTolerance::new(dec!(0.0001)).unwrap();
        let new = TrancheQuantity::new(dec!(1), dec!(1.00001));
        let dev = verify(dec!(2), &new, &tol).unwrap();
        assert_eq!(dev, dec!(0.00001));
    }

    #[test]
    fn test_verify_rejects_drift() {
        let new = TrancheQuantity::new(dec!(1), dec!(1.1));
        assert!(matches!(
            verify(dec!(2), &new, &ConservationTolerance::default()),
            Err(TrancheError::InvariantViolation { .. })
        ));
    }

    #[test]
    fn test_verify_rejects_negative_senior() {
        let new = TrancheQuantity::new(dec!(-1), dec!(3));
        match verify(dec!(2), &new, &ConservationTolerance::default()) {
            Err(TrancheError::InvariantViolation { context, .. }) => {
                assert_eq!(context, "senior non-negativity")
            }
            other => panic!("Expected InvariantViolation, got {other:?}"),
        }
    }
}
