//! Goodness-of-fit scoring and ranking of the candidate catalog.
//!
//! Each candidate is fitted to the standardized sample, scored with a
//! percentile-binned chi-squared statistic on cumulative frequencies plus a
//! KS-test p-value, and ranked ascending by chi-squared. A candidate whose
//! estimator fails is recorded as an annotated failure and does not abort
//! the remaining candidates.

pub mod ks;

use serde::Serialize;
use tracing::debug;

use crate::distributions::{CATALOG, FittedDist};
use crate::error::FitError;
use crate::sample::{linspace, percentile};

/// Default number of percentile points for the chi-squared binning.
pub const DEFAULT_BINS: usize = 5;

/// Score of one successfully fitted candidate.
#[derive(Debug, Clone, Serialize)]
pub struct RankedFit {
    pub distribution: &'static str,
    pub chi_square: f64,
    pub p_value: f64,
}

/// A candidate whose estimator failed on this sample.
#[derive(Debug, Clone, Serialize)]
pub struct FailedFit {
    pub distribution: &'static str,
    pub reason: String,
}

/// All candidate outcomes for one sample: ranked fits sorted ascending by
/// chi-squared (stable, ties keep catalog order) and annotated failures.
#[derive(Debug, Clone, Serialize)]
pub struct Ranking {
    pub ranked: Vec<RankedFit>,
    pub failed: Vec<FailedFit>,
}

impl Ranking {
    /// Best `n` fits, fewer if fewer candidates ranked.
    pub fn top(&self, n: usize) -> &[RankedFit] {
        &self.ranked[..n.min(self.ranked.len())]
    }

    pub fn outcome_count(&self) -> usize {
        self.ranked.len() + self.failed.len()
    }
}

/// Percentile cutoffs for the binning: `bins` evenly spaced percentile
/// points over [0, 100], mapped through the sample's interpolated
/// percentiles. The first and last cutoff are the sample min and max.
pub fn percentile_cutoffs(sample: &[f64], bins: usize) -> Vec<f64> {
    let mut sorted = sample.to_vec();
    sorted.sort_by(f64::total_cmp);

    linspace(0.0, 100.0, bins)
        .into_iter()
        .map(|q| percentile(&sorted, q))
        .collect()
}

/// Cumulative observed counts per consecutive cutoff interval. Intervals are
/// half-open with the last one closed, matching histogram edge semantics.
pub fn cumulative_observed(sample: &[f64], cutoffs: &[f64]) -> Vec<f64> {
    let k = cutoffs.len() - 1;
    let mut counts = vec![0.0_f64; k];

    for &x in sample {
        if x < cutoffs[0] || x > cutoffs[k] {
            continue;
        }
        let idx = cutoffs[1..k]
            .iter()
            .position(|&edge| x < edge)
            .unwrap_or(k - 1);
        counts[idx] += 1.0;
    }

    let mut cum = 0.0;
    counts
        .iter()
        .map(|c| {
            cum += c;
            cum
        })
        .collect()
}

/// Chi-squared statistic over cumulative frequencies: the fitted CDF is
/// evaluated at the cutoffs, interval areas scaled by the sample size give
/// expected counts, and both sides are cumulative-summed before comparing.
fn chi_square(dist: &FittedDist, cutoffs: &[f64], cum_observed: &[f64], size: f64) -> f64 {
    let cdf_at: Vec<f64> = cutoffs.iter().map(|&c| dist.cdf(c)).collect();

    let mut cum_expected = 0.0;
    let mut stat = 0.0;
    for i in 0..cutoffs.len() - 1 {
        cum_expected += (cdf_at[i + 1] - cdf_at[i]) * size;
        stat += (cum_expected - cum_observed[i]).powi(2) / cum_observed[i];
    }
    stat
}

/// Scores every catalog candidate against one standardized sample.
pub fn evaluate(standardized: &[f64], bins: usize) -> Ranking {
    // at least two percentile points are needed to form an interval
    let cutoffs = percentile_cutoffs(standardized, bins.max(2));
    let cum_observed = cumulative_observed(standardized, &cutoffs);
    let size = standardized.len() as f64;

    let mut ranked = Vec::new();
    let mut failed = Vec::new();

    for family in CATALOG {
        match family.fit(standardized) {
            Ok(dist) => {
                let p_value = ks::test(standardized, &dist);
                let stat = chi_square(&dist, &cutoffs, &cum_observed, size);
                debug!(
                    distribution = family.name(),
                    chi_square = stat,
                    p_value,
                    "Candidate scored"
                );
                ranked.push(RankedFit {
                    distribution: family.name(),
                    chi_square: stat,
                    p_value,
                });
            }
            Err(FitError::FitFailure { family, reason }) => {
                debug!(distribution = family, reason, "Candidate fit failed");
                failed.push(FailedFit {
                    distribution: family,
                    reason,
                });
            }
            Err(e) => {
                failed.push(FailedFit {
                    distribution: family.name(),
                    reason: e.to_string(),
                });
            }
        }
    }

    // stable sort: ties keep catalog order
    ranked.sort_by(|a, b| a.chi_square.total_cmp(&b.chi_square));

    Ranking { ranked, failed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ArrivalRow;
    use crate::sample::StopSample;

    fn standardized(raw: &[f64]) -> Vec<f64> {
        let rows: Vec<ArrivalRow> = raw
            .iter()
            .map(|&ai| ArrivalRow { stop_id: 1, ai })
            .collect();
        StopSample::extract(&rows, 1).unwrap().standardized
    }

    fn arrival_like() -> Vec<f64> {
        (1..=60)
            .map(|i| 600.0 * -f64::ln(1.0 - i as f64 / 61.0))
            .collect()
    }

    #[test]
    fn test_cutoffs_span_sample_range() {
        let sample: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let cutoffs = percentile_cutoffs(&sample, 5);
        assert_eq!(cutoffs.len(), 5);
        assert_eq!(cutoffs[0], 0.0);
        assert_eq!(cutoffs[4], 99.0);
        assert!(cutoffs.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_cumulative_observed_counts_everything() {
        let sample: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let cutoffs = percentile_cutoffs(&sample, 5);
        let cum = cumulative_observed(&sample, &cutoffs);
        assert_eq!(cum.len(), 4);
        assert_eq!(*cum.last().unwrap(), 100.0);
        assert!(cum.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_evaluate_scores_all_candidates() {
        let z = standardized(&arrival_like());
        let ranking = evaluate(&z, DEFAULT_BINS);

        assert_eq!(ranking.outcome_count(), 10);
        assert!(
            ranking
                .ranked
                .windows(2)
                .all(|w| w[0].chi_square <= w[1].chi_square)
        );
        for fit in &ranking.ranked {
            assert!((0.0..=1.0).contains(&fit.p_value));
        }
    }

    #[test]
    fn test_evaluate_with_extreme_outlier() {
        let z = standardized(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]);
        let ranking = evaluate(&z, DEFAULT_BINS);
        // every candidate produces an outcome, ranked or annotated
        assert_eq!(ranking.outcome_count(), 10);
        assert!(!ranking.ranked.is_empty());
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let z = standardized(&arrival_like());
        let a = evaluate(&z, DEFAULT_BINS);
        let b = evaluate(&z, DEFAULT_BINS);

        assert_eq!(a.ranked.len(), b.ranked.len());
        for (x, y) in a.ranked.iter().zip(&b.ranked) {
            assert_eq!(x.distribution, y.distribution);
            assert_eq!(x.chi_square.to_bits(), y.chi_square.to_bits());
            assert_eq!(x.p_value.to_bits(), y.p_value.to_bits());
        }
    }

    #[test]
    fn test_top_caps_at_ranked_len() {
        let z = standardized(&arrival_like());
        let ranking = evaluate(&z, DEFAULT_BINS);
        assert_eq!(ranking.top(2).len(), 2);
        assert!(ranking.top(100).len() <= 10);
    }

    #[test]
    fn test_exponential_data_ranks_exponential_family_well() {
        let z = standardized(&arrival_like());
        let ranking = evaluate(&z, DEFAULT_BINS);
        let pos = ranking
            .ranked
            .iter()
            .position(|r| r.distribution == "expon")
            .expect("expon should rank");
        assert!(pos < 6, "expon ranked at {pos}");
    }
}
