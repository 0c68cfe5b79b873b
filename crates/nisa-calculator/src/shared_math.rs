/// Pure numeric helpers shared by the calculators.
/// Stateless functions, no ledger access.

/// `part / whole × 100`, or 0 when `whole` is 0.
pub fn percent_of(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

/// Whether two amounts agree within `tolerance`
pub fn approx_equal(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

/// Herfindahl index from weights (0-1 scale). Higher = more concentrated.
pub fn herfindahl_index(weights: &[f64]) -> f64 {
    weights.iter().map(|w| w * w).sum()
}

/// Normalize non-negative values into weights that sum to 1.
/// Returns an empty vec when the total is not positive.
pub fn normalize(values: &[f64]) -> Vec<f64> {
    let total: f64 = values.iter().filter(|v| **v > 0.0).sum();
    if total <= 0.0 {
        return Vec::new();
    }
    values.iter().map(|v| v.max(0.0) / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_percent_of() {
        assert_abs_diff_eq!(percent_of(250_000.0, 2_400_000.0), 10.416_666, epsilon = 1e-5);
        assert_eq!(percent_of(100.0, 0.0), 0.0);
    }

    #[test]
    fn test_herfindahl_index() {
        // Equal weight across 4 sectors = 4 * 0.25^2 = 0.25
        let weights = vec![0.25, 0.25, 0.25, 0.25];
        assert_abs_diff_eq!(herfindahl_index(&weights), 0.25, epsilon = 1e-10);

        // Single sector = 1.0
        assert_abs_diff_eq!(herfindahl_index(&[1.0]), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_normalize() {
        let weights = normalize(&[300.0, 100.0]);
        assert_abs_diff_eq!(weights[0], 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(weights[1], 0.25, epsilon = 1e-12);
        assert!(normalize(&[0.0, 0.0]).is_empty());
    }
}
