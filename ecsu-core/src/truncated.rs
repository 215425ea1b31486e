//! Truncated distributions built from an arbitrary base family.
//!
//! Restricting a base distribution with density $f$ and CDF $F$ to $[a, b]$ and
//! renormalising gives
//!
//! $$ f_{[a,b]}(x) = \frac{f(x)}{Z}, \qquad F_{[a,b]}(x) = \frac{F(\max(a, \min(x, b))) - F(a)}{Z},
//! \qquad Z = F(b) - F(a) $$
//!
//! and the quantile function $Q_{[a,b]}(p) = Q(F(a) + pZ)$. The mean and variance
//! are computed by numerical integration of the truncated density.
//!
//! Each of the six operations is available as a free function that resolves the
//! family by name from the default registry (e.g. [`density_trunc`]), or as a
//! method on a [`Truncated`] value resolved once and reused.
//!
//! Batched operations fail as a whole: an invalid element (e.g. a NaN query point)
//! or an error from the base family aborts the call and no partial results are
//! returned.

use crate::errors::{ECSUError, ECSUResult};
use crate::family::DistributionFamily;
use crate::integrate::{integrate, IntegrationConfig};
use crate::interval::TruncationInterval;
use crate::parameters::Parameters;
use crate::registry::{default_registry, FamilyRegistry};
use log::debug;
use rand::distributions::Open01;
use rand::Rng;
use std::sync::Arc;

/// A base family restricted to a truncation interval.
///
/// Holds the resolved family, the caller's parameters and the probability mass
/// of the interval. Construction fails if that mass is not positive.
#[derive(Debug, Clone)]
pub struct Truncated<'a> {
    family: Arc<dyn DistributionFamily>,
    params: &'a Parameters,
    interval: TruncationInterval,
    lower_mass: f64,
    mass: f64,
    integration: IntegrationConfig,
}

impl<'a> Truncated<'a> {
    /// Resolve `spec` from the default registry and truncate it to `[lower, upper]`
    pub fn resolve(
        spec: &str,
        params: &'a Parameters,
        lower: f64,
        upper: f64,
    ) -> ECSUResult<Self> {
        Self::resolve_in(
            default_registry(),
            spec,
            params,
            TruncationInterval::new(lower, upper)?,
        )
    }

    /// Resolve `spec` from an explicit registry
    pub fn resolve_in(
        registry: &FamilyRegistry,
        spec: &str,
        params: &'a Parameters,
        interval: TruncationInterval,
    ) -> ECSUResult<Self> {
        Self::from_family(registry.resolve(spec)?, params, interval)
    }

    pub fn from_family(
        family: Arc<dyn DistributionFamily>,
        params: &'a Parameters,
        interval: TruncationInterval,
    ) -> ECSUResult<Self> {
        interval.validate()?;

        let lower_mass = base_cdf(family.as_ref(), interval.lower, params)?;
        let upper_mass = base_cdf(family.as_ref(), interval.upper, params)?;
        let mass = upper_mass - lower_mass;

        if mass.is_nan() || mass <= 0.0 {
            return Err(ECSUError::DegenerateMass {
                family: family.name().to_string(),
                lower: interval.lower,
                upper: interval.upper,
                mass,
            });
        }

        debug!(
            "truncated '{}' to [{}, {}] with mass {}",
            family.name(),
            interval.lower,
            interval.upper,
            mass
        );

        Ok(Self {
            family,
            params,
            interval,
            lower_mass,
            mass,
            integration: IntegrationConfig::default(),
        })
    }

    /// Use different tolerances for [`Truncated::mean`] and [`Truncated::variance`]
    pub fn with_integration(mut self, config: IntegrationConfig) -> Self {
        self.integration = config;
        self
    }

    pub fn family(&self) -> &dyn DistributionFamily {
        self.family.as_ref()
    }

    pub fn interval(&self) -> TruncationInterval {
        self.interval
    }

    /// Probability mass of the base distribution inside the interval, $Z$
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Truncated density at a single point; zero outside the interval
    pub fn density_at(&self, x: f64) -> ECSUResult<f64> {
        if !self.interval.contains(x) {
            return Ok(0.0);
        }
        Ok(self.family.density(x, self.params)? / self.mass)
    }

    /// Truncated density at each of `xs`
    pub fn density(&self, xs: &[f64]) -> ECSUResult<Vec<f64>> {
        xs.iter()
            .enumerate()
            .map(|(index, &x)| {
                check_not_nan(index, x)?;
                self.density_at(x)
            })
            .collect()
    }

    /// Truncated CDF at a single point.
    ///
    /// The point is clamped into the interval first, so the result saturates at
    /// 0 below the interval and 1 above it.
    pub fn cdf_at(&self, x: f64) -> ECSUResult<f64> {
        let clamped = self.interval.clamp(x);
        let base = base_cdf(self.family.as_ref(), clamped, self.params)?;
        Ok((base - self.lower_mass) / self.mass)
    }

    /// Truncated CDF at each of `xs`
    pub fn cdf(&self, xs: &[f64]) -> ECSUResult<Vec<f64>> {
        xs.iter()
            .enumerate()
            .map(|(index, &x)| {
                check_not_nan(index, x)?;
                self.cdf_at(x)
            })
            .collect()
    }

    /// Truncated quantile function at a single probability.
    ///
    /// `p` is mapped to `F(a) + pZ` and handed to the base family, which decides
    /// what to do with probabilities outside `[0, 1]`.
    pub fn quantile_at(&self, p: f64) -> ECSUResult<f64> {
        let mut target = self.lower_mass + p * self.mass;
        // Rounding in F(a) + pZ can step just past 1
        if p <= 1.0 && target > 1.0 {
            target = 1.0;
        }
        let x = self.family.quantile(target, self.params)?;
        Ok(self.interval.clamp(x))
    }

    /// Truncated quantile function at each of `ps`
    pub fn quantile(&self, ps: &[f64]) -> ECSUResult<Vec<f64>> {
        ps.iter().map(|&p| self.quantile_at(p)).collect()
    }

    /// Mean of the truncated distribution, $\int_a^b x f_{[a,b]}(x) dx$
    pub fn mean(&self) -> ECSUResult<f64> {
        self.expectation(|x| x)
    }

    /// Variance of the truncated distribution.
    ///
    /// Integrates the squared deviation from [`Truncated::mean`], so two
    /// integrations are performed.
    pub fn variance(&self) -> ECSUResult<f64> {
        let mean = self.mean()?;
        self.expectation(|x| (x - mean).powi(2))
    }

    /// $\int_a^b g(x) f_{[a,b]}(x) dx$, split at the truncated median so that a
    /// narrow peak far from zero is not lost when a bound is infinite.
    fn expectation<G: Fn(f64) -> f64>(&self, g: G) -> ECSUResult<f64> {
        let split = self.quantile_at(0.5)?;
        let integrand = |x: f64| -> ECSUResult<f64> {
            Ok(g(x) * self.family.density(x, self.params)? / self.mass)
        };

        let below = integrate(integrand, self.interval.lower, split, &self.integration)?;
        let above = integrate(integrand, split, self.interval.upper, &self.integration)?;
        Ok(below.value + above.value)
    }

    /// Draw `n` variates by inverse-transform sampling of uniform draws from `rng`.
    ///
    /// The uniforms lie in the open interval (0, 1), so an infinite bound is never drawn.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> ECSUResult<Vec<f64>> {
        let uniforms: Vec<f64> = (0..n).map(|_| rng.sample(Open01)).collect();
        self.quantile(&uniforms)
    }
}

/// Base CDF with the infinite bounds pinned to 0 and 1
fn base_cdf(family: &dyn DistributionFamily, x: f64, params: &Parameters) -> ECSUResult<f64> {
    if x == f64::NEG_INFINITY {
        Ok(0.0)
    } else if x == f64::INFINITY {
        Ok(1.0)
    } else {
        family.cdf(x, params)
    }
}

fn check_not_nan(index: usize, x: f64) -> ECSUResult<()> {
    if x.is_nan() {
        return Err(ECSUError::InvalidInput {
            index,
            reason: "query point is NaN".to_string(),
        });
    }
    Ok(())
}

/// Truncated density of family `spec` at each of `x`.
///
/// Zero outside `[lower, upper]`, otherwise the base density divided by the
/// mass of the interval.
pub fn density_trunc(
    x: &[f64],
    spec: &str,
    lower: f64,
    upper: f64,
    params: &Parameters,
) -> ECSUResult<Vec<f64>> {
    Truncated::resolve(spec, params, lower, upper)?.density(x)
}

/// Mean of family `spec` truncated to `[lower, upper]`
pub fn mean_trunc(spec: &str, lower: f64, upper: f64, params: &Parameters) -> ECSUResult<f64> {
    Truncated::resolve(spec, params, lower, upper)?.mean()
}

/// Variance of family `spec` truncated to `[lower, upper]`
pub fn variance_trunc(
    spec: &str,
    lower: f64,
    upper: f64,
    params: &Parameters,
) -> ECSUResult<f64> {
    Truncated::resolve(spec, params, lower, upper)?.variance()
}

/// Truncated CDF of family `spec` at each of `x`
pub fn cdf_trunc(
    x: &[f64],
    spec: &str,
    lower: f64,
    upper: f64,
    params: &Parameters,
) -> ECSUResult<Vec<f64>> {
    Truncated::resolve(spec, params, lower, upper)?.cdf(x)
}

/// Truncated quantile function of family `spec` at each of `p`
pub fn quantile_trunc(
    p: &[f64],
    spec: &str,
    lower: f64,
    upper: f64,
    params: &Parameters,
) -> ECSUResult<Vec<f64>> {
    Truncated::resolve(spec, params, lower, upper)?.quantile(p)
}

/// Draw `n` variates from family `spec` truncated to `[lower, upper]`
pub fn sample_trunc<R: Rng + ?Sized>(
    n: usize,
    spec: &str,
    lower: f64,
    upper: f64,
    params: &Parameters,
    rng: &mut R,
) -> ECSUResult<Vec<f64>> {
    Truncated::resolve(spec, params, lower, upper)?.sample(n, rng)
}
