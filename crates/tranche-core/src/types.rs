use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TrancheError;
use crate::TrancheResult;

/// Tranche claim sizes. Units are shares, not currency.
pub type Quantity = Decimal;

/// Mark-to-market value of the whole reserve.
pub type FairValue = Decimal;

/// Ratios expressed as decimals (0.2 = 20%). Never as percentages.
pub type Rate = Decimal;

/// The pair of claims held against a single reserve.
///
/// Values are produced fresh by every redemption; nothing mutates one in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrancheQuantity {
    pub senior: Quantity,
    pub junior: Quantity,
}

impl TrancheQuantity {
    pub fn new(senior: Quantity, junior: Quantity) -> Self {
        Self { senior, junior }
    }

    /// Combined claim of both classes. `None` on overflow.
    pub fn checked_total(&self) -> Option<Quantity> {
        self.senior.checked_add(self.junior)
    }

    /// Reject negative claims before any arithmetic runs.
    pub fn validate(&self) -> TrancheResult<()> {
        if self.senior < Decimal::ZERO {
            return Err(TrancheError::InvalidInput {
                field: "senior".into(),
                reason: "Senior quantity cannot be negative".into(),
            });
        }
        if self.junior < Decimal::ZERO {
            return Err(TrancheError::InvalidInput {
                field: "junior".into(),
                reason: "Junior quantity cannot be negative".into(),
            });
        }
        Ok(())
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// Reject a negative fair value, naming the offending field.
pub(crate) fn validate_fair_value(field: &str, value: FairValue) -> TrancheResult<()> {
    if value < Decimal::ZERO {
        return Err(TrancheError::InvalidInput {
            field: field.into(),
            reason: "Fair value cannot be negative".into(),
        });
    }
    Ok(())
}

/// Lift a checked `Decimal` operation into the crate error type.
pub(crate) fn checked(value: Option<Decimal>, context: &str) -> TrancheResult<Decimal> {
    value.ok_or_else(|| TrancheError::ArithmeticOverflow {
        context: context.into(),
    })
}
