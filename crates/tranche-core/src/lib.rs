pub mod config;
pub mod error;
pub mod types;

#[cfg(feature = "lending")]
pub mod lending;

#[cfg(feature = "lending_fee")]
pub mod lending_fee;

#[cfg(feature = "sweep")]
pub mod sweep;

pub use config::{ConservationTolerance, FeeSchedule, InterestSplit, LendingConfig};
pub use error::TrancheError;
pub use types::*;

/// Standard result type for all tranche operations
pub type TrancheResult<T> = Result<T, TrancheError>;
