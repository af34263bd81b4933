//! One-sample Kolmogorov-Smirnov test against a fitted CDF.

use crate::distributions::FittedDist;

/// KS statistic: supremum distance between the empirical CDF of `sample`
/// and the fitted CDF.
pub fn statistic(sample: &[f64], dist: &FittedDist) -> f64 {
    let mut sorted = sample.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len() as f64;
    let mut d = 0.0_f64;
    for (i, &x) in sorted.iter().enumerate() {
        let f = dist.cdf(x);
        let above = (i + 1) as f64 / n - f;
        let below = f - i as f64 / n;
        d = d.max(above).max(below);
    }
    d
}

/// Asymptotic p-value for a KS statistic `d` over a sample of size `n`,
/// using the Kolmogorov survival series with the Stephens small-sample
/// correction to the effective sample size.
pub fn p_value(d: f64, n: usize) -> f64 {
    if d <= 0.0 {
        return 1.0;
    }
    let sqrt_n = (n as f64).sqrt();
    let lambda = (sqrt_n + 0.12 + 0.11 / sqrt_n) * d;

    let mut sum = 0.0_f64;
    let mut sign = 1.0_f64;
    for j in 1..=100 {
        let term = sign * (-2.0 * (j as f64).powi(2) * lambda * lambda).exp();
        sum += term;
        sign = -sign;
        if term.abs() < 1e-12 {
            break;
        }
    }
    (2.0 * sum).clamp(0.0, 1.0)
}

/// KS p-value of `sample` against `dist`, rounded to 5 decimal places.
pub fn test(sample: &[f64], dist: &FittedDist) -> f64 {
    let d = statistic(sample, dist);
    let p = p_value(d, sample.len());
    (p * 1e5).round() / 1e5
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::Family;

    #[test]
    fn test_p_value_bounds() {
        assert_eq!(p_value(0.0, 50), 1.0);
        assert!(p_value(0.9, 50) < 1e-6);
        let mid = p_value(0.1, 50);
        assert!(mid > 0.0 && mid < 1.0);
    }

    #[test]
    fn test_p_value_decreases_with_distance() {
        assert!(p_value(0.05, 100) > p_value(0.15, 100));
        assert!(p_value(0.15, 100) > p_value(0.30, 100));
    }

    #[test]
    fn test_statistic_against_good_fit_is_small() {
        // near-uniform data against a fitted uniform distribution
        let data: Vec<f64> = (0..=100).map(|i| i as f64 / 100.0).collect();
        let fitted = Family::Uniform.fit(&data).unwrap();
        let d = statistic(&data, &fitted);
        assert!(d < 0.05, "statistic {d}");
        assert!(test(&data, &fitted) > 0.99);
    }

    #[test]
    fn test_rounding_to_five_places() {
        let data: Vec<f64> = (0..=100).map(|i| i as f64 / 100.0).collect();
        let fitted = Family::Uniform.fit(&data).unwrap();
        let p = test(&data, &fitted);
        assert_eq!(p, (p * 1e5).round() / 1e5);
    }
}
