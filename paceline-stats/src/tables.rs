//! Critical Value Tables
//!
//! Fixed lookup tables used by the kernel:
//! - Two-tailed 95% Student's t critical values for 1..=30 degrees of freedom
//! - Two-tailed 95% Mann-Whitney U critical values for sample sizes 5..=30
//!
//! Both tables are constants of the method, not configuration.

/// z critical value for a two-tailed test at 95% confidence.
///
/// Used as the t critical value once degrees of freedom exceed the table.
pub const Z_CRITICAL: f64 = 1.96;

/// Two-tailed 95% Student's t critical values, indexed by `df - 1`.
pub const T_TABLE: [f64; 30] = [
    12.706, 4.303, 3.182, 2.776, 2.571, 2.447, 2.365, 2.306, 2.262, 2.228, // 1..=10
    2.201, 2.179, 2.16, 2.145, 2.131, 2.12, 2.11, 2.101, 2.093, 2.086, // 11..=20
    2.08, 2.074, 2.069, 2.064, 2.06, 2.056, 2.052, 2.048, 2.045, 2.042, // 21..=30
];

/// Smallest larger-sample size covered by [`U_TABLE`].
pub const U_TABLE_MIN_SIZE: usize = 5;

/// Largest larger-sample size covered by [`U_TABLE`].
pub const U_TABLE_MAX_SIZE: usize = 30;

/// Smallest smaller-sample size covered by [`U_TABLE`].
pub const U_TABLE_MIN_OTHER: usize = 3;

/// Mann-Whitney U critical values (two-tailed, alpha = 0.05).
///
/// Row `i` holds the values for a larger sample of size `i + 5`; column `j`
/// within that row is the smaller sample of size `j + 3`.
pub const U_TABLE: [&[u32]; 26] = [
    &[0, 1, 2],
    &[1, 2, 3, 5],
    &[1, 3, 5, 6, 8],
    &[2, 4, 6, 8, 10, 13],
    &[2, 4, 7, 10, 12, 15, 17],
    &[3, 5, 8, 11, 14, 17, 20, 23],
    &[3, 6, 9, 13, 16, 19, 23, 26, 30],
    &[4, 7, 11, 14, 18, 22, 26, 29, 33, 37],
    &[4, 8, 12, 16, 20, 24, 28, 33, 37, 41, 45],
    &[5, 9, 13, 17, 22, 26, 31, 36, 40, 45, 50, 55],
    &[5, 10, 14, 19, 24, 29, 34, 39, 44, 49, 54, 59, 64],
    &[6, 11, 15, 21, 26, 31, 37, 42, 47, 53, 59, 64, 70, 75],
    &[6, 11, 17, 22, 28, 34, 39, 45, 51, 57, 63, 67, 75, 81, 87],
    &[7, 12, 18, 24, 30, 36, 42, 48, 55, 61, 67, 74, 80, 86, 93, 99],
    &[7, 13, 19, 25, 32, 38, 45, 52, 58, 65, 72, 78, 85, 92, 99, 106, 113],
    &[
        8, 14, 20, 27, 34, 41, 48, 55, 62, 69, 76, 83, 90, 98, 105, 112, 119, 127,
    ],
    &[
        8, 15, 22, 29, 36, 43, 50, 58, 65, 73, 80, 88, 96, 103, 111, 119, 126, 134, 142,
    ],
    &[
        9, 16, 23, 30, 38, 45, 53, 61, 69, 77, 85, 93, 101, 109, 117, 125, 133, 141, 150, 158,
    ],
    &[
        9, 17, 24, 32, 40, 48, 56, 64, 73, 81, 89, 98, 106, 115, 123, 132, 140, 149, 157, 166,
        175,
    ],
    &[
        10, 17, 25, 33, 42, 50, 59, 67, 76, 85, 94, 102, 111, 120, 129, 138, 147, 156, 165, 174,
        183, 192,
    ],
    &[
        10, 18, 27, 35, 44, 53, 62, 71, 80, 89, 98, 107, 117, 126, 135, 145, 154, 163, 173, 182,
        192, 201, 211,
    ],
    &[
        11, 19, 28, 37, 46, 55, 64, 74, 83, 93, 102, 112, 122, 132, 141, 151, 161, 171, 181, 191,
        200, 210, 220, 230,
    ],
    &[
        11, 20, 29, 38, 48, 57, 67, 77, 87, 97, 107, 118, 128, 138, 147, 158, 168, 178, 188, 199,
        209, 219, 230, 240, 250,
    ],
    &[
        12, 21, 30, 40, 50, 60, 70, 80, 90, 101, 111, 122, 132, 143, 154, 164, 175, 186, 196, 207,
        218, 228, 239, 250, 261, 272,
    ],
    &[
        13, 22, 32, 42, 52, 62, 73, 83, 94, 105, 116, 127, 138, 149, 160, 171, 182, 193, 204, 215,
        226, 238, 249, 260, 271, 282, 294,
    ],
    &[
        13, 23, 33, 43, 54, 65, 76, 87, 98, 109, 120, 131, 143, 154, 166, 177, 189, 200, 212, 223,
        235, 247, 258, 270, 282, 293, 305, 317,
    ],
];

/// Two-tailed 95% t critical value for the given degrees of freedom.
///
/// `df == 0` is treated as 1; anything above 30 falls back to [`Z_CRITICAL`].
pub fn critical_t(degrees_of_freedom: usize) -> f64 {
    let df = degrees_of_freedom.max(1);
    T_TABLE.get(df - 1).copied().unwrap_or(Z_CRITICAL)
}

/// Mann-Whitney U critical value for samples of size `larger` and `smaller`.
///
/// Returns `None` outside the tabulated domain.
pub fn critical_u(larger: usize, smaller: usize) -> Option<u32> {
    if !(U_TABLE_MIN_SIZE..=U_TABLE_MAX_SIZE).contains(&larger)
        || smaller < U_TABLE_MIN_OTHER
        || smaller > larger
    {
        return None;
    }
    U_TABLE[larger - U_TABLE_MIN_SIZE]
        .get(smaller - U_TABLE_MIN_OTHER)
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_t_table_bounds() {
        assert_eq!(critical_t(0), 12.706);
        assert_eq!(critical_t(1), 12.706);
        assert_eq!(critical_t(4), 2.776);
        assert_eq!(critical_t(30), 2.042);
        assert_eq!(critical_t(31), Z_CRITICAL);
        assert_eq!(critical_t(10_000), Z_CRITICAL);
    }

    #[test]
    fn test_t_table_is_decreasing() {
        for pair in T_TABLE.windows(2) {
            assert!(pair[0] > pair[1], "{} should exceed {}", pair[0], pair[1]);
        }
        assert!(T_TABLE[29] > Z_CRITICAL);
    }

    #[test]
    fn test_u_table_shape() {
        for (i, row) in U_TABLE.iter().enumerate() {
            let size = i + U_TABLE_MIN_SIZE;
            assert_eq!(row.len(), size - U_TABLE_MIN_OTHER + 1, "row for n={size}");
            for pair in row.windows(2) {
                assert!(pair[0] <= pair[1], "row for n={size} must be non-decreasing");
            }
        }
    }

    #[test]
    fn test_critical_u_lookup() {
        assert_eq!(critical_u(5, 5), Some(2));
        assert_eq!(critical_u(5, 3), Some(0));
        assert_eq!(critical_u(10, 10), Some(23));
        assert_eq!(critical_u(30, 30), Some(317));
        assert_eq!(critical_u(4, 4), None);
        assert_eq!(critical_u(31, 5), None);
        assert_eq!(critical_u(10, 2), None);
        assert_eq!(critical_u(5, 6), None);
    }
}
