//! Descriptive statistics over windows of present values.
//!
//! All functions take the non-missing values of a window and return `None`
//! when the statistic is undefined for that sample.

/// Relative tolerance below which a standard deviation counts as zero.
pub const DEGENERATE_STD_TOLERANCE: f64 = 1e-12;

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample (n - 1) standard deviation.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (n - 1) as f64).sqrt())
}

/// Population standard deviation.
pub fn population_std(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / values.len() as f64).sqrt())
}

/// Returns true if `std` is numerically zero relative to the window mean.
///
/// Rounding leaves constant windows with a std around 1e-16 times the mean
/// rather than exactly zero.
pub fn is_degenerate_std(std: f64, mean: f64) -> bool {
    std <= DEGENERATE_STD_TOLERANCE * mean.abs().max(1.0)
}

/// Median of the values.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Smallest value.
pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

/// Largest value.
pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

fn central_moments(values: &[f64]) -> Option<(f64, f64, f64)> {
    let m = mean(values)?;
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for v in values {
        let d = v - m;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    if is_degenerate_std(m2.sqrt(), m) {
        return None;
    }
    Some((m2, m3, m4))
}

/// Bias-adjusted sample skewness (Fisher-Pearson G1). Needs three values.
pub fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len() as f64;
    if values.len() < 3 {
        return None;
    }
    let (m2, m3, _) = central_moments(values)?;
    let g1 = (m3 / n) / (m2 / n).powf(1.5);
    Some((n * (n - 1.0)).sqrt() / (n - 2.0) * g1)
}

/// Bias-adjusted sample excess kurtosis (G2). Needs four values.
pub fn excess_kurtosis(values: &[f64]) -> Option<f64> {
    let n = values.len() as f64;
    if values.len() < 4 {
        return None;
    }
    let (m2, _, m4) = central_moments(values)?;
    let term = (n + 1.0) * n * (n - 1.0) / ((n - 2.0) * (n - 3.0)) * m4 / (m2 * m2);
    let correction = 3.0 * (n - 1.0).powi(2) / ((n - 2.0) * (n - 3.0));
    Some(term - correction)
}

/// Percentile rank of `score` within `values`, 0-100, ties at average rank.
///
/// Equals `(count(v < score) + count(v <= score)) / 2n × 100`, plus half a
/// rank when `score` itself occurs in `values`.
pub fn percentile_of_score(values: &[f64], score: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let left = values.iter().filter(|v| **v < score).count();
    let right = values.iter().filter(|v| **v <= score).count();
    let present = usize::from(right > left);
    Some((left + right + present) as f64 * 50.0 / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_and_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&values).unwrap(), 5.0);
        assert_relative_eq!(population_std(&values).unwrap(), 2.0);
        assert_relative_eq!(sample_std(&values).unwrap(), 2.138_089_935_299_395, epsilon = 1e-12);
        assert!(sample_std(&[1.0]).is_none());
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_degenerate_std() {
        assert!(is_degenerate_std(0.0, 0.0));
        assert!(is_degenerate_std(1e-13, 100.0));
        assert!(!is_degenerate_std(1e-6, 100.0));
    }

    #[test]
    fn test_skew_and_kurtosis() {
        // Bias-adjusted sample estimators
        let values = [1.0, 2.0, 3.0, 4.0, 10.0];
        assert_relative_eq!(skewness(&values).unwrap(), 1.697_056_274_847_714_3, epsilon = 1e-9);
        assert_relative_eq!(
            excess_kurtosis(&values).unwrap(),
            3.152,
            epsilon = 1e-9
        );

        assert!(skewness(&[1.0, 1.0, 1.0]).is_none());
        assert!(excess_kurtosis(&[1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn test_percentile_of_score() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(percentile_of_score(&values, 4.0).unwrap(), 100.0);
        assert_relative_eq!(percentile_of_score(&values, 1.0).unwrap(), 25.0);

        // Ties share the average rank
        let tied = [1.0, 2.0, 2.0, 3.0];
        assert_relative_eq!(percentile_of_score(&tied, 2.0).unwrap(), 62.5);
    }
}
