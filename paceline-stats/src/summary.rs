//! Sample Statistics
//!
//! Descriptive statistics over a sample of per-invocation periods (seconds).
//!
//! [`Stats`] is always rebuilt from the whole sample with [`Stats::from_sample`];
//! there is no streaming update, so every field stays consistent with the
//! others no matter how often the sample grows.

use crate::tables::critical_t;
use serde::{Deserialize, Serialize};

/// Arithmetic mean. An empty sample has a mean of `0.0`.
pub fn mean(sample: &[f64]) -> f64 {
    if sample.is_empty() {
        return 0.0;
    }
    sample.iter().sum::<f64>() / sample.len() as f64
}

/// Sample variance with Bessel's correction. `0.0` when `n <= 1`.
pub fn variance(sample: &[f64], mean: f64) -> f64 {
    if sample.len() < 2 {
        return 0.0;
    }
    sample.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (sample.len() - 1) as f64
}

/// Sample standard deviation.
pub fn std_dev(sample: &[f64]) -> f64 {
    variance(sample, mean(sample)).sqrt()
}

/// Standard error of the mean: `sqrt(variance) / sqrt(n)`.
pub fn std_error(sample: &[f64]) -> f64 {
    if sample.is_empty() {
        return 0.0;
    }
    std_dev(sample) / (sample.len() as f64).sqrt()
}

/// Half-width of the confidence interval around the mean.
pub fn margin_of_error(std_error: f64, critical_t: f64) -> f64 {
    std_error * critical_t
}

/// Margin of error as a percentage of the mean. `0.0` when the mean is zero.
pub fn relative_margin_of_error(margin_of_error: f64, mean: f64) -> f64 {
    if mean == 0.0 {
        return 0.0;
    }
    margin_of_error / mean * 100.0
}

/// Statistics for one benchmark sample.
///
/// All fields are zero until the sample holds at least one period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Mean period in seconds
    pub mean: f64,
    /// Sample variance (seconds squared)
    pub variance: f64,
    /// Sample standard deviation in seconds
    pub std_dev: f64,
    /// Standard error of the mean in seconds
    pub std_err_mean: f64,
    /// 95% margin of error in seconds
    pub margin_of_error: f64,
    /// Margin of error as a percentage of the mean
    pub relative_margin_of_error: f64,
    /// Operations per second (`1 / mean`)
    pub hz: f64,
    /// Number of periods the statistics were computed from
    pub sample_size: usize,
}

impl Stats {
    /// Compute every field from scratch.
    pub fn from_sample(sample: &[f64]) -> Self {
        if sample.is_empty() {
            return Self::default();
        }

        let size = sample.len();
        let mean = mean(sample);
        let variance = variance(sample, mean);
        let std_dev = variance.sqrt();
        let std_err_mean = std_dev / (size as f64).sqrt();
        let margin_of_error = margin_of_error(std_err_mean, critical_t(size - 1));
        let relative_margin_of_error = relative_margin_of_error(margin_of_error, mean);
        let hz = if mean > 0.0 { 1.0 / mean } else { 0.0 };

        Self {
            mean,
            variance,
            std_dev,
            std_err_mean,
            margin_of_error,
            relative_margin_of_error,
            hz,
            sample_size: size,
        }
    }

    /// Whether these statistics describe a real measurement.
    pub fn is_measured(&self) -> bool {
        self.sample_size > 0 && self.hz.is_finite() && self.hz > 0.0
    }

    /// Upper bound of the confidence interval (`mean + moe`).
    pub fn upper_bound(&self) -> f64 {
        self.mean + self.margin_of_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand::rngs::StdRng;

    #[test]
    fn test_basic_stats() {
        let sample = [1.0, 2.0, 3.0, 4.0, 5.0];
        let stats = Stats::from_sample(&sample);

        assert!((stats.mean - 3.0).abs() < 1e-12);
        assert!((stats.variance - 2.5).abs() < 1e-12);
        assert!((stats.std_dev - 2.5f64.sqrt()).abs() < 1e-12);
        assert!((stats.std_err_mean - (2.5f64 / 5.0).sqrt()).abs() < 1e-12);
        // df = 4
        assert!((stats.margin_of_error - stats.std_err_mean * 2.776).abs() < 1e-12);
        assert!((stats.hz - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(stats.sample_size, 5);
    }

    #[test]
    fn test_empty_sample() {
        let stats = Stats::from_sample(&[]);
        assert_eq!(stats, Stats::default());
        assert!(!stats.is_measured());
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(std_error(&[]), 0.0);
    }

    #[test]
    fn test_single_observation() {
        let stats = Stats::from_sample(&[0.25]);
        assert_eq!(stats.mean, 0.25);
        assert_eq!(stats.variance, 0.0);
        assert_eq!(stats.margin_of_error, 0.0);
        assert_eq!(stats.hz, 4.0);
        assert!(stats.is_measured());
    }

    #[test]
    fn test_relative_margin_guard() {
        assert_eq!(relative_margin_of_error(1.0, 0.0), 0.0);
        assert!((relative_margin_of_error(0.5, 10.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_dispersion_invariants() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let len = rng.gen_range(2..64);
            let sample: Vec<f64> = (0..len).map(|_| rng.gen_range(1e-6..1e-2)).collect();
            let m = mean(&sample);
            assert!(variance(&sample, m) >= 0.0);
            assert!(std_error(&sample) <= std_dev(&sample) + f64::EPSILON);
        }
    }

    #[test]
    fn test_mean_is_order_independent() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut sample: Vec<f64> = (0..50).map(|_| rng.gen_range(0.0..1.0)).collect();
        let before = mean(&sample);
        sample.shuffle(&mut rng);
        assert!((mean(&sample) - before).abs() < 1e-12);
    }
}
