pub mod fee;

pub use fee::{redeem_lending_fee, FeeRedemption, LendingFeeInput, LendingFeeOutput};
