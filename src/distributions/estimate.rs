//! Deterministic parameter estimators, one per candidate family.
//!
//! Closed-form maximum likelihood where it exists (uniform, expon, Laplace on
//! the log scale), method of moments or a closed-form MLE approximation
//! otherwise, and a Newton iteration for the Weibull shape. Families whose
//! support excludes part of the real line are anchored with a location just
//! outside the sample range so that standardized (negative-valued) samples
//! remain fittable.

use statrs::distribution::{
    Beta, Exp, Gamma, LogNormal, Normal, Triangular, Uniform, Weibull,
};

use super::{Family, FittedDist, Kernel};
use crate::error::FitError;
use crate::sample::{mean, percentile, population_stddev};

/// Relative margin used when anchoring a support boundary outside the data.
const ANCHOR_MARGIN: f64 = 1e-4;

struct Moments {
    n: usize,
    min: f64,
    max: f64,
    mean: f64,
    sd: f64,
    spread: f64,
}

impl Moments {
    fn of(data: &[f64]) -> Self {
        let min = data.iter().copied().fold(f64::INFINITY, f64::min);
        let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let m = mean(data);
        Moments {
            n: data.len(),
            min,
            max,
            mean: m,
            sd: population_stddev(data, m),
            spread: max - min,
        }
    }

    /// Population skewness (Fisher-Pearson g1).
    fn skewness(&self, data: &[f64]) -> f64 {
        let m3 = data.iter().map(|x| (x - self.mean).powi(3)).sum::<f64>() / self.n as f64;
        m3 / self.sd.powi(3)
    }
}

fn failure(family: Family, reason: impl ToString) -> FitError {
    FitError::FitFailure {
        family: family.name(),
        reason: reason.to_string(),
    }
}

pub(super) fn fit_family(family: Family, data: &[f64]) -> Result<FittedDist, FitError> {
    if data.is_empty() {
        return Err(failure(family, "empty sample"));
    }
    let mo = Moments::of(data);
    if !(mo.spread > 0.0) {
        return Err(failure(family, "sample has zero spread"));
    }

    match family {
        Family::Uniform => fit_uniform(&mo),
        Family::Expon => fit_expon(&mo),
        Family::Beta => fit_beta(data, &mo),
        Family::Gamma => fit_gamma(data, &mo),
        Family::LogNorm => fit_lognorm(data, &mo),
        Family::LogLaplace => fit_loglaplace(data, &mo),
        Family::Pearson3 => fit_pearson3(data, &mo),
        Family::Triang => fit_triang(&mo),
        Family::WeibullMin => fit_weibull_min(data, &mo),
        Family::WeibullMax => fit_weibull_max(data, &mo),
    }
}

/// MLE: loc = min, scale = range.
fn fit_uniform(mo: &Moments) -> Result<FittedDist, FitError> {
    let kernel = Uniform::new(0.0, 1.0).map_err(|e| failure(Family::Uniform, e))?;
    Ok(FittedDist::new(
        Family::Uniform,
        vec![mo.min, mo.spread],
        mo.min,
        mo.spread,
        Kernel::Uniform(kernel),
    ))
}

/// MLE: loc = min, scale = mean - min.
fn fit_expon(mo: &Moments) -> Result<FittedDist, FitError> {
    let scale = mo.mean - mo.min;
    if !(scale > 0.0) {
        return Err(failure(Family::Expon, "non-positive scale"));
    }
    let kernel = Exp::new(1.0).map_err(|e| failure(Family::Expon, e))?;
    Ok(FittedDist::new(
        Family::Expon,
        vec![mo.min, scale],
        mo.min,
        scale,
        Kernel::Exp(kernel),
    ))
}

/// Support anchored just outside the data range; method of moments for the
/// shape pair on the unit-rescaled sample.
fn fit_beta(data: &[f64], mo: &Moments) -> Result<FittedDist, FitError> {
    let margin = mo.spread * ANCHOR_MARGIN;
    let loc = mo.min - margin;
    let scale = mo.spread + 2.0 * margin;

    let unit: Vec<f64> = data.iter().map(|x| (x - loc) / scale).collect();
    let mu = mean(&unit);
    let var = population_stddev(&unit, mu).powi(2);
    if !(var > 0.0) {
        return Err(failure(Family::Beta, "zero variance on unit interval"));
    }

    let common = mu * (1.0 - mu) / var - 1.0;
    if !(common > 0.0) {
        return Err(failure(Family::Beta, "moment estimate outside the parameter space"));
    }
    let a = mu * common;
    let b = (1.0 - mu) * common;

    let kernel = Beta::new(a, b).map_err(|e| failure(Family::Beta, e))?;
    Ok(FittedDist::new(
        Family::Beta,
        vec![a, b, loc, scale],
        loc,
        scale,
        Kernel::Beta(kernel),
    ))
}

/// Minka's closed-form approximate MLE for the gamma shape.
fn fit_gamma(data: &[f64], mo: &Moments) -> Result<FittedDist, FitError> {
    let loc = mo.min - mo.spread * ANCHOR_MARGIN;
    let shifted: Vec<f64> = data.iter().map(|x| x - loc).collect();

    let m = mean(&shifted);
    let mean_ln = mean(&shifted.iter().map(|y| y.ln()).collect::<Vec<_>>());
    let s = m.ln() - mean_ln;
    if !(s > 0.0) || !s.is_finite() {
        return Err(failure(Family::Gamma, "log-moment gap is non-positive"));
    }

    let shape = (3.0 - s + ((s - 3.0).powi(2) + 24.0 * s).sqrt()) / (12.0 * s);
    if !(shape > 0.0) || !shape.is_finite() {
        return Err(failure(Family::Gamma, "shape estimate diverged"));
    }
    let scale = m / shape;

    let kernel = Gamma::new(shape, 1.0).map_err(|e| failure(Family::Gamma, e))?;
    Ok(FittedDist::new(
        Family::Gamma,
        vec![shape, loc, scale],
        loc,
        scale,
        Kernel::Gamma(kernel),
    ))
}

/// Moments of the log-data: shape = sigma, scale = exp(mu).
fn fit_lognorm(data: &[f64], mo: &Moments) -> Result<FittedDist, FitError> {
    let loc = mo.min - mo.spread * ANCHOR_MARGIN;
    let logs: Vec<f64> = data.iter().map(|x| (x - loc).ln()).collect();

    let mu = mean(&logs);
    let sigma = population_stddev(&logs, mu);
    if !(sigma > 0.0) {
        return Err(failure(Family::LogNorm, "log-data has zero variance"));
    }

    let kernel = LogNormal::new(0.0, sigma).map_err(|e| failure(Family::LogNorm, e))?;
    Ok(FittedDist::new(
        Family::LogNorm,
        vec![sigma, loc, mu.exp()],
        loc,
        mu.exp(),
        Kernel::LogNormal(kernel),
    ))
}

/// Laplace MLE on the log-data: median and mean absolute deviation.
fn fit_loglaplace(data: &[f64], mo: &Moments) -> Result<FittedDist, FitError> {
    let loc = mo.min - mo.spread * ANCHOR_MARGIN;
    let mut logs: Vec<f64> = data.iter().map(|x| (x - loc).ln()).collect();
    logs.sort_by(f64::total_cmp);

    let med = percentile(&logs, 50.0);
    let b = logs.iter().map(|y| (y - med).abs()).sum::<f64>() / logs.len() as f64;
    if !(b > 0.0) {
        return Err(failure(Family::LogLaplace, "zero dispersion on the log scale"));
    }

    let c = 1.0 / b;
    let scale = med.exp();
    Ok(FittedDist::new(
        Family::LogLaplace,
        vec![c, loc, scale],
        loc,
        scale,
        Kernel::LogLaplace { c },
    ))
}

/// Method of moments: (skew, loc = mean, scale = sd). Near-zero skew falls
/// back to the normal limiting kernel, as scipy does.
fn fit_pearson3(data: &[f64], mo: &Moments) -> Result<FittedDist, FitError> {
    let skew = mo.skewness(data);
    if !skew.is_finite() {
        return Err(failure(Family::Pearson3, "skewness is not finite"));
    }

    let kernel = if skew.abs() < 1e-8 {
        Kernel::Normal(Normal::new(0.0, 1.0).map_err(|e| failure(Family::Pearson3, e))?)
    } else {
        let alpha = 4.0 / (skew * skew);
        let gamma = Gamma::new(alpha, 1.0).map_err(|e| failure(Family::Pearson3, e))?;
        Kernel::PearsonGamma {
            gamma,
            beta: skew / 2.0,
        }
    };

    Ok(FittedDist::new(
        Family::Pearson3,
        vec![skew, mo.mean, mo.sd],
        mo.mean,
        mo.sd,
        kernel,
    ))
}

/// loc = min, scale = range, mode from the moment identity
/// mode = 3 * mean - min - max, clamped to the open support.
fn fit_triang(mo: &Moments) -> Result<FittedDist, FitError> {
    let mode = 3.0 * mo.mean - mo.min - mo.max;
    let c = ((mode - mo.min) / mo.spread).clamp(1e-6, 1.0 - 1e-6);

    let kernel = Triangular::new(0.0, 1.0, c).map_err(|e| failure(Family::Triang, e))?;
    Ok(FittedDist::new(
        Family::Triang,
        vec![c, mo.min, mo.spread],
        mo.min,
        mo.spread,
        Kernel::Triangular(kernel),
    ))
}

fn fit_weibull_min(data: &[f64], mo: &Moments) -> Result<FittedDist, FitError> {
    let loc = mo.min - mo.spread * ANCHOR_MARGIN;
    let shifted: Vec<f64> = data.iter().map(|x| x - loc).collect();
    let (c, scale) = weibull_shape_scale(&shifted).map_err(|r| failure(Family::WeibullMin, r))?;

    let kernel = Weibull::new(c, 1.0).map_err(|e| failure(Family::WeibullMin, e))?;
    Ok(FittedDist::new(
        Family::WeibullMin,
        vec![c, loc, scale],
        loc,
        scale,
        Kernel::Weibull(kernel),
    ))
}

/// Mirror of `weibull_min`: anchored above the maximum, fitted to `loc - x`.
fn fit_weibull_max(data: &[f64], mo: &Moments) -> Result<FittedDist, FitError> {
    let loc = mo.max + mo.spread * ANCHOR_MARGIN;
    let mirrored: Vec<f64> = data.iter().map(|x| loc - x).collect();
    let (c, scale) = weibull_shape_scale(&mirrored).map_err(|r| failure(Family::WeibullMax, r))?;

    let kernel = Weibull::new(c, 1.0).map_err(|e| failure(Family::WeibullMax, e))?;
    Ok(FittedDist::new(
        Family::WeibullMax,
        vec![c, loc, scale],
        loc,
        scale,
        Kernel::MirroredWeibull(kernel),
    ))
}

/// Profile-MLE Weibull shape via Newton iteration, then the closed-form
/// scale for that shape. Input values must be strictly positive.
fn weibull_shape_scale(values: &[f64]) -> Result<(f64, f64), String> {
    let logs: Vec<f64> = values.iter().map(|v| v.ln()).collect();
    let mean_ln = mean(&logs);
    let sd_ln = population_stddev(&logs, mean_ln);
    if !(sd_ln > 0.0) {
        return Err("log-data has zero variance".to_string());
    }

    // moment-based starting point for the shape
    let mut c = std::f64::consts::PI / (sd_ln * 6.0_f64.sqrt());

    for _ in 0..100 {
        let (mut s0, mut s1, mut s2) = (0.0, 0.0, 0.0);
        for (&v, &l) in values.iter().zip(&logs) {
            let p = v.powf(c);
            s0 += p;
            s1 += p * l;
            s2 += p * l * l;
        }

        let f = s1 / s0 - 1.0 / c - mean_ln;
        let fp = (s2 * s0 - s1 * s1) / (s0 * s0) + 1.0 / (c * c);
        let mut next = c - f / fp;
        if !next.is_finite() {
            return Err("shape iteration diverged".to_string());
        }
        if next <= 0.0 {
            // halve instead of stepping out of the parameter space
            next = c / 2.0;
        }
        if (next - c).abs() <= 1e-10 * c.max(1.0) {
            c = next;
            let scale =
                (values.iter().map(|v| v.powf(c)).sum::<f64>() / values.len() as f64).powf(1.0 / c);
            return Ok((c, scale));
        }
        c = next;
    }

    Err("shape iteration did not converge".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::CATALOG;

    fn standardized_sample() -> Vec<f64> {
        // z-scores of a small arrival-like sample (mean 0, pop sd 1)
        let raw = [120.0, 310.0, 95.0, 480.0, 230.0, 150.0, 610.0, 75.0, 260.0, 190.0];
        let m = mean(&raw);
        let sd = population_stddev(&raw, m);
        raw.iter().map(|x| (x - m) / sd).collect()
    }

    #[test]
    fn test_expon_closed_form() {
        let data = [1.0, 2.0, 3.0, 6.0];
        let fitted = Family::Expon.fit(&data).unwrap();
        // loc = min, scale = mean - min
        assert_eq!(fitted.params()[0], 1.0);
        assert!((fitted.params()[1] - 2.0).abs() < 1e-12);
        assert!((fitted.cdf(1.0)).abs() < 1e-12);
        assert!(fitted.cdf(100.0) > 0.999);
    }

    #[test]
    fn test_uniform_closed_form() {
        let data = [2.0, 5.0, 3.0, 4.0];
        let fitted = Family::Uniform.fit(&data).unwrap();
        assert_eq!(fitted.params(), &[2.0, 3.0]);
        assert!((fitted.cdf(3.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_every_family_fits_standardized_data() {
        let z = standardized_sample();
        for family in CATALOG {
            let fitted = family.fit(&z).unwrap_or_else(|e| panic!("{family:?}: {e}"));
            // cdf must be monotone over the sample range
            let lo = fitted.cdf(-2.0);
            let hi = fitted.cdf(2.5);
            assert!(lo <= hi, "{family:?} cdf not monotone");
            assert!((0.0..=1.0).contains(&lo) && (0.0..=1.0).contains(&hi));
        }
    }

    #[test]
    fn test_weibull_shape_recovers_exponential() {
        // For an exponential-looking geometric grid the shape should be near 1.
        let values: Vec<f64> = (1..=60).map(|i| -f64::ln(1.0 - i as f64 / 61.0)).collect();
        let (c, scale) = weibull_shape_scale(&values).unwrap();
        assert!((c - 1.0).abs() < 0.15, "shape {c}");
        assert!(scale > 0.0);
    }

    #[test]
    fn test_zero_spread_is_fit_failure() {
        let data = [5.0, 5.0, 5.0];
        for family in CATALOG {
            let err = family.fit(&data).unwrap_err();
            assert!(matches!(err, FitError::FitFailure { .. }));
        }
    }

    #[test]
    fn test_pearson3_zero_skew_falls_back_to_normal() {
        let data = [-1.5, -0.5, 0.5, 1.5];
        let fitted = Family::Pearson3.fit(&data).unwrap();
        assert!((fitted.cdf(0.0) - 0.5).abs() < 1e-9);
        assert_eq!(fitted.params()[0], 0.0);
    }

    #[test]
    fn test_gamma_moments_roughly_match() {
        let data: Vec<f64> = (1..=40).map(|i| (i as f64).sqrt()).collect();
        let fitted = Family::Gamma.fit(&data).unwrap();
        let shape = fitted.params()[0];
        assert!(shape > 0.0 && shape.is_finite());
        assert!(fitted.cdf(10.0) > fitted.cdf(1.0));
    }
}
