//! Lognormal parameterisations.
//!
//! Priors on ECS are often specified by their mean and standard deviation, or by a
//! median and a range, while the `lnorm` family takes the mean and standard
//! deviation of $\log X$. If $\log X \sim N(\mu, \sigma^2)$ then
//! $$ E[X] = e^{\mu + \sigma^2 / 2}, \qquad
//!    \mathrm{Var}[X] = \left(e^{\sigma^2} - 1\right) e^{2\mu + \sigma^2} $$

use crate::percentiles::log_sigma_from_interval;
use ecsu_core::errors::{ECSUError, ECSUResult};
use ecsu_core::parameters::Parameters;
use serde::{Deserialize, Serialize};

/// Parameters of a lognormal distribution on the log scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogNormalParameters {
    pub meanlog: f64,
    pub sdlog: f64,
}

fn check_positive(name: &str, value: f64) -> ECSUResult<()> {
    if !(value > 0.0 && value.is_finite()) {
        return Err(ECSUError::Error(format!(
            "{} must be positive and finite, got {}",
            name, value
        )));
    }
    Ok(())
}

impl LogNormalParameters {
    pub fn new(meanlog: f64, sdlog: f64) -> ECSUResult<Self> {
        if !meanlog.is_finite() {
            return Err(ECSUError::Error(format!(
                "meanlog must be finite, got {}",
                meanlog
            )));
        }
        check_positive("sdlog", sdlog)?;
        Ok(Self { meanlog, sdlog })
    }

    /// Match the mean and standard deviation of the distribution itself
    pub fn from_moments(mean: f64, sd: f64) -> ECSUResult<Self> {
        check_positive("mean", mean)?;
        check_positive("sd", sd)?;

        let variance_log = (1.0 + (sd / mean).powi(2)).ln();
        Self::new(mean.ln() - 0.5 * variance_log, variance_log.sqrt())
    }

    /// Match a median and the standard deviation of the distribution.
    ///
    /// With $u = e^{\sigma^2}$ the variance condition
    /// $sd^2 = m^2 u (u - 1)$ is a quadratic in $u$.
    pub fn from_median_sd(median: f64, sd: f64) -> ECSUResult<Self> {
        check_positive("median", median)?;
        check_positive("sd", sd)?;

        let ratio_sq = (sd / median).powi(2);
        let u = 0.5 * (1.0 + (1.0 + 4.0 * ratio_sq).sqrt());
        Self::new(median.ln(), u.ln().sqrt())
    }

    /// Match a central interval at `level`, centred geometrically
    pub fn from_interval(lower: f64, upper: f64, level: f64) -> ECSUResult<Self> {
        let sdlog = log_sigma_from_interval(lower, upper, level)?;
        Self::new(0.5 * (lower.ln() + upper.ln()), sdlog)
    }

    pub fn mean(&self) -> f64 {
        (self.meanlog + 0.5 * self.sdlog.powi(2)).exp()
    }

    pub fn variance(&self) -> f64 {
        let s2 = self.sdlog.powi(2);
        s2.exp_m1() * (2.0 * self.meanlog + s2).exp()
    }

    pub fn sd(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn median(&self) -> f64 {
        self.meanlog.exp()
    }

    pub fn mode(&self) -> f64 {
        (self.meanlog - self.sdlog.powi(2)).exp()
    }

    /// Parameters for the `lnorm` family
    pub fn to_parameters(&self) -> Parameters {
        Parameters::from([("meanlog", self.meanlog), ("sdlog", self.sdlog)])
    }
}
