//! Equilibrium climate sensitivity uncertainty.
//!
//! Re-exports the truncated distribution kernel ([`kernel`]) and the ensemble
//! analysis built on it ([`analysis`]).

pub use ecsu_analysis as analysis;
pub use ecsu_core as kernel;

pub use ecsu_core::errors::{ECSUError, ECSUResult};
pub use ecsu_core::truncated::{
    cdf_trunc, density_trunc, mean_trunc, quantile_trunc, sample_trunc, variance_trunc,
    Truncated,
};
