//! Generic truncated probability distributions.
//!
//! Any continuous family exposing a density, CDF, quantile function and sampler
//! (see [`family::DistributionFamily`]) can be restricted to an interval $[a, b]$.
//! The [`truncated`] module provides the six truncated operations: density,
//! mean, variance, CDF, quantile and sampling.
//!
//! ```
//! use ecsu_core::parameters::Parameters;
//! use ecsu_core::truncated::{cdf_trunc, mean_trunc};
//!
//! let params = Parameters::from([("mean", 0.0), ("sd", 1.0)]);
//! let half_normal_mean = mean_trunc("norm", 0.0, f64::INFINITY, &params).unwrap();
//! assert!((half_normal_mean - (2.0 / std::f64::consts::PI).sqrt()).abs() < 1e-8);
//!
//! let cdf = cdf_trunc(&[-1.0, 10.0], "norm", 0.0, f64::INFINITY, &params).unwrap();
//! assert_eq!(cdf, vec![0.0, 1.0]);
//! ```

pub mod errors;
pub mod family;
pub mod integrate;
pub mod interval;
pub mod parameters;
pub mod registry;
pub mod truncated;
