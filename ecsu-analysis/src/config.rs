//! TOML configuration of ECS priors and ensembles.
//!
//! ```toml
//! n_samples = 5000
//! seed = 42
//!
//! [prior]
//! family = "lnorm"
//! lower = 0.0
//! upper = 10.0
//! parameters = { meanlog = 1.1, sdlog = 0.4 }
//!
//! [observation]
//! observed = 3.0
//! sigma = 0.5
//! ```

use crate::response::EquilibriumWarming;
use ecsu_core::errors::{ECSUError, ECSUResult};
use ecsu_core::integrate::IntegrationConfig;
use ecsu_core::interval::TruncationInterval;
use ecsu_core::parameters::Parameters;
use ecsu_core::truncated::Truncated;
use log::warn;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_lower() -> f64 {
    f64::NEG_INFINITY
}

fn default_upper() -> f64 {
    f64::INFINITY
}

fn default_n_samples() -> usize {
    10_000
}

fn default_credible_level() -> f64 {
    0.9
}

/// A truncated prior on ECS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorConfig {
    /// Name of the base distribution family, e.g. `"lnorm"`
    pub family: String,
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(default = "default_lower")]
    pub lower: f64,
    #[serde(default = "default_upper")]
    pub upper: f64,
}

impl PriorConfig {
    pub fn new(family: &str, parameters: Parameters, lower: f64, upper: f64) -> Self {
        Self {
            family: family.to_string(),
            parameters,
            lower,
            upper,
        }
    }

    pub fn interval(&self) -> ECSUResult<TruncationInterval> {
        TruncationInterval::new(self.lower, self.upper)
    }

    /// Resolve the prior against the default family registry
    pub fn truncated(&self) -> ECSUResult<Truncated<'_>> {
        Truncated::resolve(&self.family, &self.parameters, self.lower, self.upper)
    }
}

/// An observation of the response used to weight ensemble members
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationConfig {
    pub observed: f64,
    /// Standard deviation of the observational error
    pub sigma: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleConfig {
    pub prior: PriorConfig,
    #[serde(default = "default_n_samples")]
    pub n_samples: usize,
    /// Seed for reproducible ensembles; drawn from entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_credible_level")]
    pub credible_level: f64,
    #[serde(default)]
    pub integration: IntegrationConfig,
    #[serde(default)]
    pub response: EquilibriumWarming,
    #[serde(default)]
    pub observation: Option<ObservationConfig>,
}

impl EnsembleConfig {
    pub fn new(prior: PriorConfig) -> Self {
        Self {
            prior,
            n_samples: default_n_samples(),
            seed: None,
            credible_level: default_credible_level(),
            integration: IntegrationConfig::default(),
            response: EquilibriumWarming::default(),
            observation: None,
        }
    }

    pub fn from_toml_str(contents: &str) -> ECSUResult<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ECSUError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> ECSUResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Check values that deserialisation alone cannot
    pub fn validate(&self) -> ECSUResult<()> {
        self.prior.interval()?;
        if self.n_samples == 0 {
            return Err(ECSUError::Config("n_samples must be positive".to_string()));
        }
        if !(self.credible_level > 0.0 && self.credible_level < 1.0) {
            return Err(ECSUError::Config(format!(
                "credible_level must be in (0, 1), got {}",
                self.credible_level
            )));
        }
        if let Some(observation) = &self.observation {
            if !observation.observed.is_finite() || !(observation.sigma > 0.0) {
                return Err(ECSUError::Config(format!(
                    "observation needs a finite value and a positive sigma, got {} +/- {}",
                    observation.observed, observation.sigma
                )));
            }
        }
        Ok(())
    }

    pub fn rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => {
                warn!("No seed configured; the ensemble will not be reproducible");
                ChaCha8Rng::from_entropy()
            }
        }
    }
}
