use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::TrancheError;
use crate::types::Rate;
use crate::TrancheResult;

const BPS_PER_UNIT: Decimal = dec!(10000);
const MAX_BPS: u32 = 10_000;

// ---------------------------------------------------------------------------
// Ratio validation
// ---------------------------------------------------------------------------

fn validate_unit_ratio(field: &str, value: Rate) -> TrancheResult<Rate> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(TrancheError::InvalidConfiguration {
            field: field.into(),
            reason: format!("Must lie in [0, 1], got {value}"),
        });
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// Interest split
// ---------------------------------------------------------------------------

/// Fraction of the reserve's excess return kept by the junior tranche.
///
/// Validated once on construction and immutable afterwards. The remaining
/// `1 - split` of the excess is passed through to the senior tranche.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct InterestSplit(Rate);

impl InterestSplit {
    pub fn new(value: Rate) -> TrancheResult<Self> {
        validate_unit_ratio("interest_split", value).map(Self)
    }

    /// Build from basis points (`0..=10_000`).
    pub fn from_bps(bps: u32) -> TrancheResult<Self> {
        if bps > MAX_BPS {
            return Err(TrancheError::InvalidConfiguration {
                field: "interest_split".into(),
                reason: format!("Basis points must lie in [0, {MAX_BPS}], got {bps}"),
            });
        }
        Self::new(Decimal::from(bps) / BPS_PER_UNIT)
    }

    pub fn get(&self) -> Rate {
        self.0
    }

    /// Share of the excess return passed through to the senior tranche.
    pub fn senior_share(&self) -> Rate {
        Decimal::ONE - self.0
    }

    /// Whole basis points, truncating any sub-bps remainder.
    pub fn to_bps(&self) -> u32 {
        // Bounded by MAX_BPS, so the conversion cannot fail.
        (self.0 * BPS_PER_UNIT).trunc().to_u32().unwrap_or(MAX_BPS)
    }
}

impl<'de> Deserialize<'de> for InterestSplit {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        InterestSplit::new(value).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Conservation tolerance
// ---------------------------------------------------------------------------

/// Relative epsilon for the conservation check.
///
/// A pool of total `T` may drift by at most `relative * max(T, 1)` after a
/// redemption. Decimal division rounds at 28 significant digits, so a
/// non-terminating quotient leaves a residue in the last place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConservationTolerance(Decimal);

impl ConservationTolerance {
    pub const DEFAULT_RELATIVE: Decimal = dec!(0.00000000000000000001);

    pub fn new(relative: Decimal) -> TrancheResult<Self> {
        if relative < Decimal::ZERO || relative >= Decimal::ONE {
            return Err(TrancheError::InvalidConfiguration {
                field: "conservation_tolerance".into(),
                reason: format!("Must lie in [0, 1), got {relative}"),
            });
        }
        Ok(Self(relative))
    }

    /// Exact equality. Only safe when every quotient terminates.
    pub fn exact() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn relative(&self) -> Decimal {
        self.0
    }

    /// Largest absolute deviation accepted for a pool of the given size.
    pub fn allowed_for(&self, total: Decimal) -> Decimal {
        self.0.saturating_mul(total.max(Decimal::ONE))
    }
}

impl Default for ConservationTolerance {
    fn default() -> Self {
        Self(Self::DEFAULT_RELATIVE)
    }
}

impl<'de> Deserialize<'de> for ConservationTolerance {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        ConservationTolerance::new(value).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Lending configuration
// ---------------------------------------------------------------------------

/// Everything a lending redeemer needs, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LendingConfig {
    pub interest_split: InterestSplit,
    #[serde(default)]
    pub tolerance: ConservationTolerance,
}

impl LendingConfig {
    pub fn new(interest_split: InterestSplit) -> Self {
        Self {
            interest_split,
            tolerance: ConservationTolerance::default(),
        }
    }

    pub fn with_tolerance(mut self, tolerance: ConservationTolerance) -> Self {
        self.tolerance = tolerance;
        self
    }
}

// ---------------------------------------------------------------------------
// Fee schedule
// ---------------------------------------------------------------------------

/// Management and performance fees charged by the fee-bearing redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeeSchedule {
    /// Charged on every tranche's value each redemption
    mgmt_fee: Rate,
    /// Charged on a tranche's gain only
    perf_fee: Rate,
}

impl FeeSchedule {
    pub fn new(mgmt_fee: Rate, perf_fee: Rate) -> TrancheResult<Self> {
        Ok(Self {
            mgmt_fee: validate_unit_ratio("mgmt_fee", mgmt_fee)?,
            perf_fee: validate_unit_ratio("perf_fee", perf_fee)?,
        })
    }

    pub fn zero() -> Self {
        Self {
            mgmt_fee: Decimal::ZERO,
            perf_fee: Decimal::ZERO,
        }
    }

    pub fn mgmt_fee(&self) -> Rate {
        self.mgmt_fee
    }

    pub fn perf_fee(&self) -> Rate {
        self.perf_fee
    }
}
