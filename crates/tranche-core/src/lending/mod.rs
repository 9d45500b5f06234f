pub mod conservation;
pub mod redeem;
pub mod regime;

pub use redeem::{
    redeem_lending, LendingRedeemer, LendingRedemptionInput, LendingRedemptionOutput, Redemption,
};
pub use regime::Regime;
