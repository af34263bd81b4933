//! Parameter reporting for the best-fitting distributions.
//!
//! The top-N families from a ranking are re-fitted against the RAW (not
//! standardized) sample, labelled via the parameter schema, and paired with
//! a density curve rescaled to sit on top of a histogram of the raw data.
//! The rescaling is purely visual: the fitted PDF, evaluated over the index
//! range of the sample, is multiplied so its trapezoidal integral matches
//! the histogram's.

use serde::Serialize;
use tracing::warn;

use crate::distributions::{Family, param_names};
use crate::error::FitError;
use crate::gof::Ranking;
use crate::sample::{linspace, percentile};

/// Number of histogram bins used for the plotting overlay.
const OVERLAY_HISTOGRAM_BINS: usize = 100;

/// Fitted parameters of one reported distribution, labels aligned with values.
#[derive(Debug, Clone, Serialize)]
pub struct FittedParameters {
    pub distribution: &'static str,
    pub labels: Vec<&'static str>,
    pub values: Vec<f64>,
}

/// A density curve scaled for plotting against the raw-sample histogram.
#[derive(Debug, Clone, Serialize)]
pub struct DensityCurve {
    pub distribution: &'static str,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Top-N parameter report: labelled parameter values and plot overlays.
#[derive(Debug, Clone, Serialize)]
pub struct ParameterReport {
    pub parameters: Vec<FittedParameters>,
    pub curves: Vec<DensityCurve>,
}

/// Trapezoidal integral of `y` over `x`.
fn trapezoid(y: &[f64], x: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum()
}

/// Histogram of `values` over `count` evenly spaced edges spanning the 0th
/// to 99th percentile; returns (counts, edges).
fn overlay_histogram(values: &[f64], count: usize) -> (Vec<f64>, Vec<f64>) {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let edges = linspace(percentile(&sorted, 0.0), percentile(&sorted, 99.0), count);
    let k = edges.len() - 1;
    let mut counts = vec![0.0_f64; k];

    for &x in values {
        if x < edges[0] || x > edges[k] {
            continue;
        }
        let idx = edges[1..k].iter().position(|&e| x < e).unwrap_or(k - 1);
        counts[idx] += 1.0;
    }
    (counts, edges)
}

/// Re-fits the top `n` ranked families on the raw sample and builds the
/// parameter table plus scaled density overlays. Pure function of its
/// inputs; calling it twice yields identical output.
pub fn report_parameters(
    ranking: &Ranking,
    raw: &[f64],
    top_n: usize,
) -> Result<ParameterReport, FitError> {
    let (hist_counts, hist_edges) = overlay_histogram(raw, OVERLAY_HISTOGRAM_BINS);
    let hist_area = trapezoid(&hist_counts, &hist_edges[..hist_edges.len() - 1]);

    let xs: Vec<f64> = (0..raw.len()).map(|i| i as f64).collect();

    let mut parameters = Vec::new();
    let mut curves = Vec::new();

    for entry in ranking.top(top_n) {
        let family = Family::from_name(entry.distribution)
            .ok_or_else(|| FitError::UnknownDistribution(entry.distribution.to_string()))?;

        let fitted = match family.fit(raw) {
            Ok(f) => f,
            Err(e) => {
                // ranked on the standardized sample but degenerate on the raw
                // one; skip the report entry rather than aborting the stop
                warn!(distribution = entry.distribution, error = %e, "Raw re-fit failed");
                continue;
            }
        };

        let labels = param_names(entry.distribution)?;
        parameters.push(FittedParameters {
            distribution: entry.distribution,
            labels,
            values: fitted.params().to_vec(),
        });

        let mut pdf: Vec<f64> = xs.iter().map(|&x| fitted.pdf(x)).collect();
        let pdf_area = trapezoid(&pdf, &xs);
        let scale = hist_area / pdf_area;
        if scale.is_finite() {
            for y in &mut pdf {
                *y *= scale;
            }
        }

        curves.push(DensityCurve {
            distribution: entry.distribution,
            x: xs.clone(),
            y: pdf,
        });
    }

    Ok(ParameterReport { parameters, curves })
}
