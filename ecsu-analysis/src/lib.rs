//! Analysis of equilibrium climate sensitivity (ECS) uncertainty.
//!
//! Builds on the truncated distributions of [`ecsu_core`]:
//! - `percentiles`: standard deviations implied by reported confidence intervals
//! - `lognormal`: conversions between lognormal parameterisations
//! - `weighted`: weighted means, quantiles and credible intervals
//! - `response`: the seam where a climate model turns ECS into an output
//! - `ensemble`: Monte Carlo ensembles drawn from a truncated prior
//! - `config`: TOML configuration of priors and ensembles

pub mod config;
pub mod ensemble;
pub mod lognormal;
pub mod percentiles;
pub mod response;
pub mod weighted;
