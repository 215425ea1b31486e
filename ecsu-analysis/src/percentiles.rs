//! Standard deviations implied by published uncertainty ranges.
//!
//! Assessments usually report ECS as a central estimate with a "likely" (66%) or
//! "very likely" (90%) range. Assuming a normal distribution (or a lognormal, on the
//! log scale) the width of a central interval at level $L$ gives
//! $$ \sigma = \frac{u - l}{2 z}, \qquad z = \Phi^{-1}\left(\frac{1 + L}{2}\right) $$

use ecsu_core::errors::{ECSUError, ECSUResult};
use ecsu_core::parameters::Parameters;
use ecsu_core::registry::default_registry;
use serde::{Deserialize, Serialize};

fn standard_normal_quantile(p: f64) -> ECSUResult<f64> {
    default_registry()
        .resolve("norm")?
        .quantile(p, &Parameters::new())
}

fn check_level(level: f64) -> ECSUResult<()> {
    if !(level > 0.0 && level < 1.0) {
        return Err(ECSUError::Error(format!(
            "Confidence level must be in (0, 1), got {}",
            level
        )));
    }
    Ok(())
}

fn check_ordered(lower: f64, upper: f64) -> ECSUResult<()> {
    if !(lower.is_finite() && upper.is_finite()) || lower >= upper {
        return Err(ECSUError::InvalidInterval { lower, upper });
    }
    Ok(())
}

/// Two-sided standard normal critical value for a central interval at `level`.
///
/// `z_score(0.9)` is about 1.645 and `z_score(0.95)` about 1.960.
pub fn z_score(level: f64) -> ECSUResult<f64> {
    check_level(level)?;
    standard_normal_quantile(0.5 * (1.0 + level))
}

/// Standard deviation of a normal distribution whose central `level` interval is
/// `[lower, upper]`
pub fn sigma_from_interval(lower: f64, upper: f64, level: f64) -> ECSUResult<f64> {
    check_ordered(lower, upper)?;
    Ok((upper - lower) / (2.0 * z_score(level)?))
}

/// Standard deviation of a normal distribution centred on `centre` whose
/// `probability` quantile is `value`.
///
/// Useful when only one side of a range is reported, e.g. "ECS above 1.5 K with
/// 95% probability" together with a best estimate.
pub fn sigma_from_percentile(centre: f64, value: f64, probability: f64) -> ECSUResult<f64> {
    if !(probability > 0.0 && probability < 1.0) || probability == 0.5 {
        return Err(ECSUError::Error(format!(
            "Probability must be in (0, 1) and not 0.5, got {}",
            probability
        )));
    }
    let sigma = (value - centre) / standard_normal_quantile(probability)?;
    if !(sigma > 0.0) {
        return Err(ECSUError::Error(format!(
            "Percentile {} at probability {} lies on the wrong side of {}",
            value, probability, centre
        )));
    }
    Ok(sigma)
}

/// Standard deviation on the log scale of a lognormal distribution whose central
/// `level` interval is `[lower, upper]`
pub fn log_sigma_from_interval(lower: f64, upper: f64, level: f64) -> ECSUResult<f64> {
    if !(lower > 0.0) {
        return Err(ECSUError::Error(format!(
            "Lognormal interval bounds must be positive, got [{}, {}]",
            lower, upper
        )));
    }
    sigma_from_interval(lower.ln(), upper.ln(), level)
}

/// Normal distribution matched to a symmetric reported range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalFit {
    pub mean: f64,
    pub sd: f64,
}

impl NormalFit {
    /// Centre the distribution on the midpoint of `[lower, upper]`
    pub fn from_interval(lower: f64, upper: f64, level: f64) -> ECSUResult<Self> {
        Ok(Self {
            mean: 0.5 * (lower + upper),
            sd: sigma_from_interval(lower, upper, level)?,
        })
    }

    /// Parameters for the `norm` family
    pub fn to_parameters(&self) -> Parameters {
        Parameters::from([("mean", self.mean), ("sd", self.sd)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;

    #[test]
    fn test_z_scores() {
        assert!(is_close!(z_score(0.9).unwrap(), 1.6448536269514722, rel_tol = 1e-7));
        assert!(is_close!(z_score(0.95).unwrap(), 1.959963984540054, rel_tol = 1e-7));
        assert!(z_score(0.0).is_err());
        assert!(z_score(1.0).is_err());
        assert!(z_score(f64::NAN).is_err());
    }

    #[test]
    fn test_sigma_from_very_likely_range() {
        // 90% range of 1.5-4.5 K
        let sigma = sigma_from_interval(1.5, 4.5, 0.9).unwrap();
        assert!(is_close!(sigma, 3.0 / (2.0 * 1.6448536269514722), rel_tol = 1e-7));

        let fit = NormalFit::from_interval(1.5, 4.5, 0.9).unwrap();
        assert_eq!(fit.mean, 3.0);
        assert_eq!(fit.sd, sigma);
        assert_eq!(fit.to_parameters().get("sd"), Some(sigma));
    }

    #[test]
    fn test_invalid_intervals() {
        assert!(sigma_from_interval(4.5, 1.5, 0.9).is_err());
        assert!(sigma_from_interval(1.5, f64::INFINITY, 0.9).is_err());
        assert!(log_sigma_from_interval(0.0, 4.5, 0.9).is_err());
    }

    #[test]
    fn test_sigma_from_percentile() {
        // 95th percentile two sigma above the centre
        let z95 = 1.6448536269514722;
        let sigma = sigma_from_percentile(3.0, 3.0 + 2.0 * z95, 0.95).unwrap();
        assert!(is_close!(sigma, 2.0, rel_tol = 1e-7));

        // Lower tail works too
        let sigma = sigma_from_percentile(3.0, 3.0 - z95, 0.05).unwrap();
        assert!(is_close!(sigma, 1.0, rel_tol = 1e-7));

        assert!(sigma_from_percentile(3.0, 2.0, 0.95).is_err());
        assert!(sigma_from_percentile(3.0, 4.0, 0.5).is_err());
    }

    #[test]
    fn test_log_sigma() {
        let sigma = log_sigma_from_interval(2.0, 8.0, 0.9).unwrap();
        assert!(is_close!(sigma, 4.0f64.ln() / (2.0 * 1.6448536269514722), rel_tol = 1e-7));
    }
}
