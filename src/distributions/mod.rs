//! Candidate distribution catalog.
//!
//! The ten continuous families tested against each stop's inter-arrival
//! sample, held as an explicit static table rather than looked up by name in
//! a registry at runtime. Each family knows its scipy-style key, its shape
//! parameter names, and how to fit itself to a sample; the resulting
//! [`FittedDist`] exposes `cdf`/`pdf` in the original (loc/scale shifted)
//! coordinates.

mod estimate;

use statrs::distribution::{
    Beta, Continuous, ContinuousCDF, Exp, Gamma, LogNormal, Normal, Triangular, Uniform, Weibull,
};

use crate::error::FitError;

/// One candidate parametric family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Beta,
    Expon,
    Gamma,
    LogNorm,
    LogLaplace,
    Pearson3,
    Triang,
    Uniform,
    WeibullMin,
    WeibullMax,
}

/// The fixed candidate list, in evaluation order. Ties in the ranking keep
/// this order.
pub const CATALOG: [Family; 10] = [
    Family::Beta,
    Family::Expon,
    Family::Gamma,
    Family::LogNorm,
    Family::LogLaplace,
    Family::Pearson3,
    Family::Triang,
    Family::Uniform,
    Family::WeibullMin,
    Family::WeibullMax,
];

impl Family {
    pub const fn name(self) -> &'static str {
        match self {
            Family::Beta => "beta",
            Family::Expon => "expon",
            Family::Gamma => "gamma",
            Family::LogNorm => "lognorm",
            Family::LogLaplace => "loglaplace",
            Family::Pearson3 => "pearson3",
            Family::Triang => "triang",
            Family::Uniform => "uniform",
            Family::WeibullMin => "weibull_min",
            Family::WeibullMax => "weibull_max",
        }
    }

    /// Shape parameter names, in reporting order. Location and scale follow.
    pub const fn shape_names(self) -> &'static [&'static str] {
        match self {
            Family::Beta => &["a", "b"],
            Family::Expon => &[],
            Family::Gamma => &["a"],
            Family::LogNorm => &["s"],
            Family::LogLaplace => &["c"],
            Family::Pearson3 => &["skew"],
            Family::Triang => &["c"],
            Family::Uniform => &[],
            Family::WeibullMin => &["c"],
            Family::WeibullMax => &["c"],
        }
    }

    /// Every shipped family is continuous; the discrete arm of the parameter
    /// schema (`loc` only) exists for catalog completeness.
    pub const fn is_discrete(self) -> bool {
        false
    }

    pub fn from_name(name: &str) -> Option<Family> {
        CATALOG.iter().copied().find(|f| f.name() == name)
    }

    /// Fits this family to `data` with the crate's deterministic estimator.
    pub fn fit(self, data: &[f64]) -> Result<FittedDist, FitError> {
        estimate::fit_family(self, data)
    }
}

/// Resolves a family name to its ordered parameter-name list: shape names,
/// then `loc` for discrete families or `loc, scale` for continuous ones.
pub fn param_names(name: &str) -> Result<Vec<&'static str>, FitError> {
    let family =
        Family::from_name(name).ok_or_else(|| FitError::UnknownDistribution(name.to_string()))?;

    let mut names: Vec<&'static str> = family.shape_names().to_vec();
    if family.is_discrete() {
        names.push("loc");
    } else {
        names.push("loc");
        names.push("scale");
    }
    Ok(names)
}

/// Distribution kernel in standardized coordinates `z = (x - loc) / scale`.
#[derive(Debug, Clone)]
pub(crate) enum Kernel {
    Beta(Beta),
    Exp(Exp),
    Gamma(Gamma),
    LogNormal(LogNormal),
    /// Log-Laplace with shape `c`; no statrs equivalent.
    LogLaplace { c: f64 },
    /// Pearson type III: shifted/scaled gamma with signed internal scale
    /// `beta = skew / 2`; negative `beta` mirrors the support.
    PearsonGamma { gamma: Gamma, beta: f64 },
    /// Pearson type III in the zero-skew limit.
    Normal(Normal),
    Triangular(Triangular),
    Uniform(Uniform),
    Weibull(Weibull),
    /// Weibull of the sample maximum: standard Weibull mirrored about zero.
    MirroredWeibull(Weibull),
}

impl Kernel {
    fn cdf(&self, z: f64) -> f64 {
        match self {
            Kernel::Beta(d) => d.cdf(z),
            Kernel::Exp(d) => d.cdf(z),
            Kernel::Gamma(d) => d.cdf(z),
            Kernel::LogNormal(d) => d.cdf(z),
            Kernel::LogLaplace { c } => {
                if z <= 0.0 {
                    0.0
                } else if z < 1.0 {
                    0.5 * z.powf(*c)
                } else {
                    1.0 - 0.5 * z.powf(-c)
                }
            }
            Kernel::PearsonGamma { gamma, beta } => {
                let w = z / beta + gamma.shape();
                if *beta > 0.0 {
                    gamma.cdf(w)
                } else {
                    1.0 - gamma.cdf(w)
                }
            }
            Kernel::Normal(d) => d.cdf(z),
            Kernel::Triangular(d) => d.cdf(z),
            Kernel::Uniform(d) => d.cdf(z),
            Kernel::Weibull(d) => d.cdf(z),
            Kernel::MirroredWeibull(d) => 1.0 - d.cdf(-z),
        }
    }

    fn pdf(&self, z: f64) -> f64 {
        match self {
            Kernel::Beta(d) => d.pdf(z),
            Kernel::Exp(d) => d.pdf(z),
            Kernel::Gamma(d) => d.pdf(z),
            Kernel::LogNormal(d) => d.pdf(z),
            Kernel::LogLaplace { c } => {
                if z <= 0.0 {
                    0.0
                } else if z < 1.0 {
                    0.5 * c * z.powf(c - 1.0)
                } else {
                    0.5 * c * z.powf(-c - 1.0)
                }
            }
            Kernel::PearsonGamma { gamma, beta } => {
                let w = z / beta + gamma.shape();
                gamma.pdf(w) / beta.abs()
            }
            Kernel::Normal(d) => d.pdf(z),
            Kernel::Triangular(d) => d.pdf(z),
            Kernel::Uniform(d) => d.pdf(z),
            Kernel::Weibull(d) => d.pdf(z),
            Kernel::MirroredWeibull(d) => d.pdf(-z),
        }
    }
}

/// A candidate distribution fitted to one sample.
#[derive(Debug, Clone)]
pub struct FittedDist {
    family: Family,
    /// Shapes, then loc, then scale, matching [`param_names`].
    params: Vec<f64>,
    loc: f64,
    scale: f64,
    kernel: Kernel,
}

impl FittedDist {
    pub(crate) fn new(
        family: Family,
        params: Vec<f64>,
        loc: f64,
        scale: f64,
        kernel: Kernel,
    ) -> Self {
        FittedDist {
            family,
            params,
            loc,
            scale,
            kernel,
        }
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn params(&self) -> &[f64] {
        &self.params
    }

    pub fn cdf(&self, x: f64) -> f64 {
        self.kernel.cdf((x - self.loc) / self.scale)
    }

    pub fn pdf(&self, x: f64) -> f64 {
        self.kernel.pdf((x - self.loc) / self.scale) / self.scale
    }
}
