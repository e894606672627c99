//! Sample Comparison
//!
//! Decides whether one sample of periods is significantly faster or slower
//! than another, without assuming normality:
//! - Combined size above [`Z_TEST_THRESHOLD`]: z-test on the Mann-Whitney U statistic
//! - Otherwise: exact lookup against the tabulated U critical values
//!
//! Samples below [`MIN_COMPARABLE_SAMPLES`] are never ranked.

use crate::tables::{Z_CRITICAL, critical_u};
use serde::{Deserialize, Serialize};

/// Minimum observations each sample needs before it can be ranked.
pub const MIN_COMPARABLE_SAMPLES: usize = 5;

/// Combined sample size above which the z approximation is used.
pub const Z_TEST_THRESHOLD: usize = 30;

/// Outcome of comparing sample `a` against sample `b`.
///
/// Samples hold periods, so lower values mean faster code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ordering {
    /// `a` is significantly faster than `b`
    Faster,
    /// `a` is significantly slower than `b`
    Slower,
    /// No statistically significant difference
    Indeterminate,
}

impl Ordering {
    /// The same comparison seen from the other side.
    pub fn reverse(self) -> Self {
        match self {
            Ordering::Faster => Ordering::Slower,
            Ordering::Slower => Ordering::Faster,
            Ordering::Indeterminate => Ordering::Indeterminate,
        }
    }

    /// Whether a difference was detected.
    pub fn is_significant(self) -> bool {
        !matches!(self, Ordering::Indeterminate)
    }
}

impl std::fmt::Display for Ordering {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ordering::Faster => write!(f, "faster"),
            Ordering::Slower => write!(f, "slower"),
            Ordering::Indeterminate => write!(f, "indeterminate"),
        }
    }
}

/// Mann-Whitney U statistics `(u1, u2)` for samples `a` and `b`.
///
/// `u1` scores every pair: 1 when the `a` value is lower, 0.5 on a tie.
/// `u2 = n_a * n_b - u1`.
pub fn mann_whitney_u(a: &[f64], b: &[f64]) -> (f64, f64) {
    let u1: f64 = a
        .iter()
        .map(|&x| {
            b.iter()
                .map(|&y| {
                    if x < y {
                        1.0
                    } else if x == y {
                        0.5
                    } else {
                        0.0
                    }
                })
                .sum::<f64>()
        })
        .sum();
    let u2 = (a.len() * b.len()) as f64 - u1;
    (u1, u2)
}

/// Normal approximation of U for samples of size `n_a` and `n_b`.
pub fn z_score(u: f64, n_a: usize, n_b: usize) -> f64 {
    let (n_a, n_b) = (n_a as f64, n_b as f64);
    let product = n_a * n_b;
    (u - product / 2.0) / (product * (n_a + n_b + 1.0) / 12.0).sqrt()
}

/// Compare two samples of periods.
///
/// Returns [`Ordering::Faster`] when `a` is significantly faster than `b`.
pub fn compare(a: &[f64], b: &[f64]) -> Ordering {
    let (n_a, n_b) = (a.len(), b.len());
    if n_a.min(n_b) < MIN_COMPARABLE_SAMPLES {
        return Ordering::Indeterminate;
    }

    let (u1, u2) = mann_whitney_u(a, b);
    let u = u1.min(u2);

    let significant = if n_a + n_b > Z_TEST_THRESHOLD {
        z_score(u, n_a, n_b).abs() > Z_CRITICAL
    } else {
        match critical_u(n_a.max(n_b), n_a.min(n_b)) {
            Some(critical) => u <= f64::from(critical),
            None => false,
        }
    };

    if !significant {
        Ordering::Indeterminate
    } else if u1 > u2 {
        // Most pairs have the lower value in `a`.
        Ordering::Faster
    } else {
        Ordering::Slower
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: [f64; 5] = [0.010, 0.011, 0.0105, 0.0108, 0.0102];
    const SLOW: [f64; 5] = [0.020, 0.021, 0.019, 0.0205, 0.0195];

    #[test]
    fn test_small_samples_use_u_table() {
        let (u1, u2) = mann_whitney_u(&FAST, &SLOW);
        assert_eq!(u1, 25.0);
        assert_eq!(u2, 0.0);
        assert_eq!(compare(&FAST, &SLOW), Ordering::Faster);
        assert_eq!(compare(&SLOW, &FAST), Ordering::Slower);
    }

    #[test]
    fn test_identical_samples_are_indeterminate() {
        assert_eq!(compare(&FAST, &FAST), Ordering::Indeterminate);
        let large: Vec<f64> = (0..40).map(|i| 1.0 + i as f64 * 0.01).collect();
        assert_eq!(compare(&large, &large), Ordering::Indeterminate);
    }

    #[test]
    fn test_below_floor_is_indeterminate() {
        let four = [0.001, 0.001, 0.001, 0.001];
        let many: Vec<f64> = vec![10.0; 100];
        assert_eq!(compare(&four, &SLOW), Ordering::Indeterminate);
        assert_eq!(compare(&four, &many), Ordering::Indeterminate);
        assert_eq!(compare(&many, &four), Ordering::Indeterminate);
    }

    #[test]
    fn test_large_samples_use_z_test() {
        let fast: Vec<f64> = (0..20).map(|i| 1.0 + i as f64 * 0.01).collect();
        let slow: Vec<f64> = (0..20).map(|i| 2.0 + i as f64 * 0.01).collect();
        assert_eq!(compare(&fast, &slow), Ordering::Faster);
        assert_eq!(compare(&slow, &fast), Ordering::Slower);

        // Fully interleaved samples: U sits at its expectation.
        let evens: Vec<f64> = (0..20).map(|i| (2 * i) as f64).collect();
        let odds: Vec<f64> = (0..20).map(|i| (2 * i + 1) as f64).collect();
        assert_eq!(compare(&evens, &odds), Ordering::Indeterminate);
    }

    /// Samples where `a[i]` sits above exactly `above[i]` of the `n_b`
    /// values in `b`, so `u2` is the sum of `above`.
    fn with_pairs_above(above: &[usize], n_b: usize) -> (Vec<f64>, Vec<f64>) {
        let a = above.iter().map(|&k| (10 * k + 5) as f64).collect();
        let b = (1..=n_b).map(|j| (10 * j) as f64).collect();
        (a, b)
    }

    #[test]
    fn test_thirty_values_stay_on_u_table() {
        // u2 = 65: one past critical_u(15, 15) = 64, but |z| is above 1.96.
        let above = [[13; 5].as_slice(), &[0; 10]].concat();
        let (a, b) = with_pairs_above(&above, 15);
        let (u1, u2) = mann_whitney_u(&a, &b);
        assert_eq!((u1, u2), (160.0, 65.0));
        assert_eq!(critical_u(15, 15), Some(64));
        assert!(z_score(u2, 15, 15).abs() > Z_CRITICAL);

        assert_eq!(compare(&a, &b), Ordering::Indeterminate);
        assert_eq!(compare(&b, &a), Ordering::Indeterminate);

        // u2 = 64 sits on the critical value.
        let above = [[13; 4].as_slice(), &[12], &[0; 10]].concat();
        let (a, b) = with_pairs_above(&above, 15);
        assert_eq!(mann_whitney_u(&a, &b).1, 64.0);
        assert_eq!(compare(&a, &b), Ordering::Faster);
    }

    #[test]
    fn test_thirty_one_values_switch_to_z_test() {
        let significant = [[14; 5].as_slice(), &[0; 10]].concat();
        let (a, b) = with_pairs_above(&significant, 16);
        let (u1, u2) = mann_whitney_u(&a, &b);
        assert_eq!((u1, u2), (170.0, 70.0));
        assert!(z_score(u2, 15, 16).abs() > Z_CRITICAL);
        assert_eq!(compare(&a, &b), Ordering::Faster);
        assert_eq!(compare(&b, &a), Ordering::Slower);

        let borderline = [[14; 5].as_slice(), &[1], &[0; 9]].concat();
        let (a, b) = with_pairs_above(&borderline, 16);
        let u2 = mann_whitney_u(&a, &b).1;
        assert_eq!(u2, 71.0);
        assert!(z_score(u2, 15, 16).abs() < Z_CRITICAL);
        assert_eq!(compare(&a, &b), Ordering::Indeterminate);

        // Past the table's largest size only the z-test can decide.
        let (a, b) = with_pairs_above(&[0; 5], 31);
        assert_eq!(critical_u(31, 5), None);
        assert_eq!(compare(&a, &b), Ordering::Faster);
    }

    #[test]
    fn test_overlapping_small_samples() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [1.5, 2.5, 3.5, 4.5, 5.5];
        assert_eq!(compare(&a, &b), Ordering::Indeterminate);
    }

    #[test]
    fn test_z_score_symmetry() {
        let z_low = z_score(0.0, 20, 20);
        let z_high = z_score(400.0, 20, 20);
        assert!((z_low + z_high).abs() < 1e-12);
        assert!(z_score(200.0, 20, 20).abs() < 1e-12);
    }

    #[test]
    fn test_ordering_reverse() {
        assert_eq!(Ordering::Faster.reverse(), Ordering::Slower);
        assert_eq!(Ordering::Indeterminate.reverse(), Ordering::Indeterminate);
        assert!(!Ordering::Indeterminate.is_significant());
        assert_eq!(Ordering::Slower.to_string(), "slower");
    }
}
