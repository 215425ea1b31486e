//! Base distribution families.
//!
//! A family bundles the four primitive operations of a parametric distribution:
//! density, CDF, quantile and random variates. The parameters are passed to every
//! call so that one family value serves every parameterisation.
//!
//! The built-in families follow R's naming (`norm`, `lnorm`, `gamma`, ...) and
//! parameter names, and delegate the numerics to [`statrs`].

use crate::errors::{ECSUError, ECSUResult};
use crate::parameters::Parameters;
use rand::RngCore;
use statrs::distribution::{
    Beta, Cauchy, ChiSquared, Continuous, ContinuousCDF, Exp, Gamma, LogNormal, Normal,
    StudentsT, Uniform, Weibull,
};
use statrs::statistics::{Max, Min};
use std::fmt::Debug;

/// The four primitive operations of a named continuous distribution family.
///
/// Implementations are expected to be consistent (the CDF integrates the density,
/// the quantile inverts the CDF). Nothing in this crate checks that.
pub trait DistributionFamily: Debug + Send + Sync {
    /// Name used to resolve the family from a [`crate::registry::FamilyRegistry`]
    fn name(&self) -> &str;

    fn density(&self, x: f64, params: &Parameters) -> ECSUResult<f64>;

    fn cdf(&self, x: f64, params: &Parameters) -> ECSUResult<f64>;

    /// Inverse CDF, defined for `p` in `[0, 1]`
    fn quantile(&self, p: f64, params: &Parameters) -> ECSUResult<f64>;

    /// Draw `n` independent variates
    fn sample(&self, n: usize, params: &Parameters, rng: &mut dyn RngCore)
        -> ECSUResult<Vec<f64>>;
}

/// A parameterised distribution as provided by statrs.
trait Primitives {
    fn pdf(&self, x: f64) -> f64;
    fn cdf(&self, x: f64) -> f64;
    fn inverse_cdf(&self, p: f64) -> f64;
    fn support(&self) -> (f64, f64);
    fn draw(&self, rng: &mut dyn RngCore) -> f64;
}

impl<D> Primitives for D
where
    D: Continuous<f64, f64> + ContinuousCDF<f64, f64> + rand::distributions::Distribution<f64>,
{
    fn pdf(&self, x: f64) -> f64 {
        Continuous::pdf(self, x)
    }

    fn cdf(&self, x: f64) -> f64 {
        ContinuousCDF::cdf(self, x)
    }

    fn inverse_cdf(&self, p: f64) -> f64 {
        let guess = ContinuousCDF::inverse_cdf(self, p);
        if p <= 0.0 || p >= 1.0 {
            return guess;
        }
        refine_quantile(self, p, guess)
    }

    fn support(&self) -> (f64, f64) {
        (Min::min(self), Max::max(self))
    }

    fn draw(&self, rng: &mut dyn RngCore) -> f64 {
        self.sample(rng)
    }
}

/// Solve `cdf(x) = p` starting from statrs' estimate `guess`.
///
/// Some statrs families fall back to a coarse bisection or an unguarded Newton
/// iteration for `inverse_cdf`, which can land on a pole of the density or run
/// off to infinity. The root is bracketed within the support and refined by
/// Newton steps that stay inside the bracket, bisecting otherwise.
fn refine_quantile<D: Primitives + ?Sized>(dist: &D, p: f64, guess: f64) -> f64 {
    let tolerance = QUANTILE_TOLERANCE * p.min(1.0 - p);
    if guess.is_finite() && (dist.cdf(guess) - p).abs() <= tolerance {
        return guess;
    }

    let Some((mut lower, mut upper)) = bracket_quantile(dist, p, guess) else {
        return guess;
    };

    let mut x = if guess.is_finite() && guess > lower && guess < upper {
        guess
    } else {
        lower + 0.5 * (upper - lower)
    };
    for _ in 0..MAX_REFINE_STEPS {
        let residual = dist.cdf(x) - p;
        if residual.abs() <= tolerance {
            return x;
        }
        if residual < 0.0 {
            lower = x;
        } else {
            upper = x;
        }
        if upper - lower <= f64::EPSILON * lower.abs().max(upper.abs()) {
            break;
        }

        let density = dist.pdf(x);
        let newton = x - residual / density;
        x = if density > 0.0 && density.is_finite() && newton > lower && newton < upper {
            newton
        } else {
            lower + 0.5 * (upper - lower)
        };
    }
    lower + 0.5 * (upper - lower)
}

/// Finite `[lower, upper]` with `cdf(lower) < p <= cdf(upper)`, found by stepping
/// outwards from `guess` (or from inside the support) with doubling steps
fn bracket_quantile<D: Primitives + ?Sized>(dist: &D, p: f64, guess: f64) -> Option<(f64, f64)> {
    let (mut lower, mut upper) = dist.support();
    let mut x = if guess.is_finite() && guess > lower && guess < upper {
        guess
    } else {
        match (lower.is_finite(), upper.is_finite()) {
            (true, true) => lower + 0.5 * (upper - lower),
            (true, false) => lower + 1.0,
            (false, true) => upper - 1.0,
            (false, false) => 0.0,
        }
    };

    let mut step = 1.0;
    for _ in 0..MAX_BRACKET_STEPS {
        if !x.is_finite() {
            return None;
        }
        if dist.cdf(x) < p {
            lower = x;
            if upper.is_finite() {
                return Some((lower, upper));
            }
            x += step;
        } else {
            upper = x;
            if lower.is_finite() {
                return Some((lower, upper));
            }
            x -= step;
        }
        step *= 2.0;
    }
    None
}

const QUANTILE_TOLERANCE: f64 = 1e-12;
const MAX_BRACKET_STEPS: usize = 1100;
const MAX_REFINE_STEPS: usize = 500;

type Builder = fn(&str, &Parameters) -> ECSUResult<Box<dyn Primitives>>;

/// A family backed by one of the statrs continuous distributions.
pub struct StatrsFamily {
    name: &'static str,
    parameter_names: &'static [&'static str],
    build: Builder,
}

impl Debug for StatrsFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatrsFamily")
            .field("name", &self.name)
            .field("parameter_names", &self.parameter_names)
            .finish()
    }
}

fn invalid(family: &str, e: impl std::fmt::Display) -> ECSUError {
    ECSUError::InvalidParameters {
        family: family.to_string(),
        reason: e.to_string(),
    }
}

impl StatrsFamily {
    /// Normal distribution. Parameters: `mean` (0), `sd` (1)
    pub fn norm() -> Self {
        Self {
            name: "norm",
            parameter_names: &["mean", "sd"],
            build: |family, p| {
                Normal::new(p.get_or("mean", 0.0), p.get_or("sd", 1.0))
                    .map(|d| Box::new(d) as Box<dyn Primitives>)
                    .map_err(|e| invalid(family, e))
            },
        }
    }

    /// Lognormal distribution. Parameters: `meanlog` (0), `sdlog` (1)
    pub fn lnorm() -> Self {
        Self {
            name: "lnorm",
            parameter_names: &["meanlog", "sdlog"],
            build: |family, p| {
                LogNormal::new(p.get_or("meanlog", 0.0), p.get_or("sdlog", 1.0))
                    .map(|d| Box::new(d) as Box<dyn Primitives>)
                    .map_err(|e| invalid(family, e))
            },
        }
    }

    /// Gamma distribution. Parameters: `shape`, and either `rate` (1) or `scale`
    pub fn gamma() -> Self {
        Self {
            name: "gamma",
            parameter_names: &["shape", "rate", "scale"],
            build: |family, p| {
                let shape = p.require(family, "shape")?;
                let rate = match (p.get("rate"), p.get("scale")) {
                    (Some(_), Some(_)) => {
                        return Err(invalid(family, "specify only one of 'rate' and 'scale'"))
                    }
                    (Some(rate), None) => rate,
                    (None, Some(scale)) => 1.0 / scale,
                    (None, None) => 1.0,
                };
                Gamma::new(shape, rate)
                    .map(|d| Box::new(d) as Box<dyn Primitives>)
                    .map_err(|e| invalid(family, e))
            },
        }
    }

    /// Exponential distribution. Parameters: `rate` (1)
    pub fn exp() -> Self {
        Self {
            name: "exp",
            parameter_names: &["rate"],
            build: |family, p| {
                Exp::new(p.get_or("rate", 1.0))
                    .map(|d| Box::new(d) as Box<dyn Primitives>)
                    .map_err(|e| invalid(family, e))
            },
        }
    }

    /// Continuous uniform distribution. Parameters: `min` (0), `max` (1)
    pub fn unif() -> Self {
        Self {
            name: "unif",
            parameter_names: &["min", "max"],
            build: |family, p| {
                Uniform::new(p.get_or("min", 0.0), p.get_or("max", 1.0))
                    .map(|d| Box::new(d) as Box<dyn Primitives>)
                    .map_err(|e| invalid(family, e))
            },
        }
    }

    /// Beta distribution. Parameters: `shape1`, `shape2`
    pub fn beta() -> Self {
        Self {
            name: "beta",
            parameter_names: &["shape1", "shape2"],
            build: |family, p| {
                Beta::new(p.require(family, "shape1")?, p.require(family, "shape2")?)
                    .map(|d| Box::new(d) as Box<dyn Primitives>)
                    .map_err(|e| invalid(family, e))
            },
        }
    }

    /// Weibull distribution. Parameters: `shape`, `scale` (1)
    pub fn weibull() -> Self {
        Self {
            name: "weibull",
            parameter_names: &["shape", "scale"],
            build: |family, p| {
                Weibull::new(p.require(family, "shape")?, p.get_or("scale", 1.0))
                    .map(|d| Box::new(d) as Box<dyn Primitives>)
                    .map_err(|e| invalid(family, e))
            },
        }
    }

    /// Location-scale Student's t. Parameters: `df`, `location` (0), `scale` (1)
    pub fn t() -> Self {
        Self {
            name: "t",
            parameter_names: &["df", "location", "scale"],
            build: |family, p| {
                StudentsT::new(
                    p.get_or("location", 0.0),
                    p.get_or("scale", 1.0),
                    p.require(family, "df")?,
                )
                .map(|d| Box::new(d) as Box<dyn Primitives>)
                .map_err(|e| invalid(family, e))
            },
        }
    }

    /// Cauchy distribution. Parameters: `location` (0), `scale` (1)
    pub fn cauchy() -> Self {
        Self {
            name: "cauchy",
            parameter_names: &["location", "scale"],
            build: |family, p| {
                Cauchy::new(p.get_or("location", 0.0), p.get_or("scale", 1.0))
                    .map(|d| Box::new(d) as Box<dyn Primitives>)
                    .map_err(|e| invalid(family, e))
            },
        }
    }

    /// Chi-squared distribution. Parameters: `df`
    pub fn chisq() -> Self {
        Self {
            name: "chisq",
            parameter_names: &["df"],
            build: |family, p| {
                ChiSquared::new(p.require(family, "df")?)
                    .map(|d| Box::new(d) as Box<dyn Primitives>)
                    .map_err(|e| invalid(family, e))
            },
        }
    }

    /// Every built-in family
    pub fn builtin() -> Vec<Self> {
        vec![
            Self::norm(),
            Self::lnorm(),
            Self::gamma(),
            Self::exp(),
            Self::unif(),
            Self::beta(),
            Self::weibull(),
            Self::t(),
            Self::cauchy(),
            Self::chisq(),
        ]
    }

    fn bind(&self, params: &Parameters) -> ECSUResult<Box<dyn Primitives>> {
        params.check_known(self.name, self.parameter_names)?;
        (self.build)(self.name, params)
    }

    fn domain_error(&self, reason: String) -> ECSUError {
        ECSUError::DomainError {
            family: self.name.to_string(),
            reason,
        }
    }
}

impl DistributionFamily for StatrsFamily {
    fn name(&self) -> &str {
        self.name
    }

    fn density(&self, x: f64, params: &Parameters) -> ECSUResult<f64> {
        if x.is_nan() {
            return Err(self.domain_error("density evaluated at NaN".to_string()));
        }
        Ok(self.bind(params)?.pdf(x))
    }

    fn cdf(&self, x: f64, params: &Parameters) -> ECSUResult<f64> {
        if x.is_nan() {
            return Err(self.domain_error("cdf evaluated at NaN".to_string()));
        }
        Ok(self.bind(params)?.cdf(x))
    }

    fn quantile(&self, p: f64, params: &Parameters) -> ECSUResult<f64> {
        // statrs panics outside [0, 1]
        if !(0.0..=1.0).contains(&p) {
            return Err(self.domain_error(format!("probability {} is outside [0, 1]", p)));
        }
        Ok(self.bind(params)?.inverse_cdf(p))
    }

    fn sample(
        &self,
        n: usize,
        params: &Parameters,
        rng: &mut dyn RngCore,
    ) -> ECSUResult<Vec<f64>> {
        let dist = self.bind(params)?;
        Ok((0..n).map(|_| dist.draw(rng)).collect())
    }
}
