//! Monte Carlo ensembles of climate sensitivity.
//!
//! An [`EcsEnsemble`] holds ECS values drawn from a truncated prior together with
//! a weight per member. Weights start uniform and can be replaced by Gaussian
//! likelihood weights once a response has been compared to an observation.

use crate::config::{EnsembleConfig, PriorConfig};
use crate::response::ClimateResponse;
use crate::weighted::{
    credible_interval, effective_sample_size, weighted_mean, weighted_quantile,
    weighted_variance,
};
use ecsu_core::errors::{ECSUError, ECSUResult};
use ecsu_core::truncated::{sample_trunc, Truncated};
use log::{debug, info};
use ndarray::{Array1, ArrayView1};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Weighted summary of an ensemble quantity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsembleSummary {
    pub mean: f64,
    pub sd: f64,
    pub median: f64,
    /// Lower end of the central credible interval
    pub lower: f64,
    /// Upper end of the central credible interval
    pub upper: f64,
    /// Probability content of `[lower, upper]`
    pub level: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EcsEnsemble {
    samples: Array1<f64>,
    weights: Array1<f64>,
}

impl EcsEnsemble {
    /// Draw `n` members from `prior`
    pub fn sample<R: Rng + ?Sized>(prior: &PriorConfig, n: usize, rng: &mut R) -> ECSUResult<Self> {
        let samples = sample_trunc(
            n,
            &prior.family,
            prior.lower,
            prior.upper,
            &prior.parameters,
            rng,
        )?;
        Self::from_samples(Array1::from_vec(samples))
    }

    /// Draw `n` members from an already resolved distribution
    pub fn from_truncated<R: Rng + ?Sized>(
        prior: &Truncated<'_>,
        n: usize,
        rng: &mut R,
    ) -> ECSUResult<Self> {
        Self::from_samples(Array1::from_vec(prior.sample(n, rng)?))
    }

    /// Wrap existing ECS values with uniform weights
    pub fn from_samples(samples: Array1<f64>) -> ECSUResult<Self> {
        if samples.is_empty() {
            return Err(ECSUError::Error("An ensemble needs at least one member".to_string()));
        }
        if let Some(index) = samples.iter().position(|x| !x.is_finite()) {
            return Err(ECSUError::InvalidInput {
                index,
                reason: format!("ensemble member {} is not finite", samples[index]),
            });
        }
        let n = samples.len();
        Ok(Self {
            samples,
            weights: Array1::from_elem(n, 1.0 / n as f64),
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> ArrayView1<f64> {
        self.samples.view()
    }

    /// Normalised member weights
    pub fn weights(&self) -> ArrayView1<f64> {
        self.weights.view()
    }

    /// Evaluate `response` for every member in parallel, keeping member order.
    ///
    /// The first failing member fails the whole call.
    pub fn propagate<C: ClimateResponse + ?Sized>(&self, response: &C) -> ECSUResult<Array1<f64>> {
        let samples = self.samples.to_vec();
        let outputs = samples
            .par_iter()
            .map(|&ecs| response.respond(ecs))
            .collect::<ECSUResult<Vec<f64>>>()?;
        Ok(Array1::from_vec(outputs))
    }

    /// Replace the weights by Gaussian likelihoods of `outputs` given `observed`.
    ///
    /// Non-finite outputs get zero weight. Fails if every member does.
    pub fn score_gaussian(
        &mut self,
        outputs: ArrayView1<f64>,
        observed: f64,
        sigma: f64,
    ) -> ECSUResult<()> {
        if outputs.len() != self.len() {
            return Err(ECSUError::Error(format!(
                "Expected {} outputs, got {}",
                self.len(),
                outputs.len()
            )));
        }
        if !observed.is_finite() || !(sigma > 0.0 && sigma.is_finite()) {
            return Err(ECSUError::Error(format!(
                "Observation needs a finite value and a positive sigma, got {} +/- {}",
                observed, sigma
            )));
        }

        let log_likelihood = outputs.mapv(|y| {
            if y.is_finite() {
                -0.5 * ((y - observed) / sigma).powi(2)
            } else {
                f64::NEG_INFINITY
            }
        });
        let max = log_likelihood.fold(f64::NEG_INFINITY, |acc, &l| acc.max(l));
        if !max.is_finite() {
            return Err(ECSUError::Error(
                "Every ensemble member has zero likelihood".to_string(),
            ));
        }

        // Shift by the maximum so the best member has weight one before normalising
        let weights = log_likelihood.mapv(|l| (l - max).exp());
        let total = weights.sum();
        self.weights = weights / total;

        debug!(
            "scored {} members against {} +/- {}, effective size {:.1}",
            self.len(),
            observed,
            sigma,
            self.effective_sample_size()
        );
        Ok(())
    }

    /// Kish effective sample size of the current weights
    pub fn effective_sample_size(&self) -> f64 {
        effective_sample_size(self.weights.view())
    }

    /// Weighted summary of the ECS values
    pub fn summary(&self, level: f64) -> ECSUResult<EnsembleSummary> {
        self.summarise(self.samples.view(), level)
    }

    /// Weighted summary of any per-member quantity, e.g. the output of [`EcsEnsemble::propagate`]
    pub fn summarise(&self, values: ArrayView1<f64>, level: f64) -> ECSUResult<EnsembleSummary> {
        let weights = self.weights.view();
        let (lower, upper) = credible_interval(values, weights, level)?;
        Ok(EnsembleSummary {
            mean: weighted_mean(values, weights)?,
            sd: weighted_variance(values, weights)?.sqrt(),
            median: weighted_quantile(values, weights, 0.5)?,
            lower,
            upper,
            level,
        })
    }
}

/// Results of [`analyse`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleReport {
    /// Mean of the truncated prior, by quadrature
    pub prior_mean: f64,
    /// Standard deviation of the truncated prior, by quadrature
    pub prior_sd: f64,
    pub ecs: EnsembleSummary,
    pub response: EnsembleSummary,
    pub effective_sample_size: f64,
}

/// Sample the configured prior, propagate it through `response` and summarise.
///
/// When the configuration has an observation the summaries are weighted by the
/// Gaussian likelihood of each member's response.
pub fn analyse<C: ClimateResponse + ?Sized>(
    config: &EnsembleConfig,
    response: &C,
) -> ECSUResult<EnsembleReport> {
    config.validate()?;

    let prior = config
        .prior
        .truncated()?
        .with_integration(config.integration);
    let prior_mean = prior.mean()?;
    let prior_sd = prior.variance()?.sqrt();

    let mut rng = config.rng();
    let mut ensemble = EcsEnsemble::from_truncated(&prior, config.n_samples, &mut rng)?;
    let outputs = ensemble.propagate(response)?;

    if let Some(observation) = &config.observation {
        ensemble.score_gaussian(outputs.view(), observation.observed, observation.sigma)?;
    }

    let report = EnsembleReport {
        prior_mean,
        prior_sd,
        ecs: ensemble.summary(config.credible_level)?,
        response: ensemble.summarise(outputs.view(), config.credible_level)?,
        effective_sample_size: ensemble.effective_sample_size(),
    };
    info!(
        "ensemble of {} '{}' members: ECS {:.2} [{:.2}, {:.2}]",
        ensemble.len(),
        config.prior.family,
        report.ecs.median,
        report.ecs.lower,
        report.ecs.upper
    );
    Ok(report)
}
