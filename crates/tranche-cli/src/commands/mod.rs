pub mod lending;
pub mod sweep;
