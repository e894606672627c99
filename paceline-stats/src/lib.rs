#![warn(missing_docs)]
//! Paceline Statistics Kernel
//!
//! Pure, side-effect free functions over samples of periods:
//! - Mean, Bessel-corrected variance, standard deviation, standard error
//! - Student's t critical values and 95% margin of error
//! - Mann-Whitney U / z comparison of two samples

mod comparison;
mod summary;
mod tables;

pub use comparison::{
    MIN_COMPARABLE_SAMPLES, Ordering, Z_TEST_THRESHOLD, compare, mann_whitney_u, z_score,
};
pub use summary::{
    Stats, margin_of_error, mean, relative_margin_of_error, std_dev, std_error, variance,
};
pub use tables::{T_TABLE, U_TABLE, Z_CRITICAL, critical_t, critical_u};

/// Confidence level every interval in this crate is computed at.
pub const CONFIDENCE_LEVEL: f64 = 0.95;
