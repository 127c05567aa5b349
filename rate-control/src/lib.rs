#![cfg_attr(not(test), no_std)]

// This must go first so the logging macros are visible to the other modules.
mod fmt;

pub mod buffer_control;
pub mod buffer_level;
pub mod rate_estimator;

pub use buffer_control::{KpTable, MAX_CORRECTION, RateFamily, proportional_correction};
pub use buffer_level::BufferLevelTracker;
pub use rate_estimator::RateEstimator;

/// Reference clock the I2S driver timestamps its reports with.
pub const REF_CLOCK_TICKS_PER_SECOND: u32 = 100_000_000;
