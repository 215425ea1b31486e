//! Mapping from climate sensitivity to a model output.
//!
//! [`ClimateResponse`] is where an external climate model plugs into an ensemble.
//! Closures `Fn(f64) -> ECSUResult<f64>` implement it directly.

use ecsu_core::errors::{ECSUError, ECSUResult};
use serde::{Deserialize, Serialize};

/// A model output as a function of equilibrium climate sensitivity (K)
pub trait ClimateResponse: Send + Sync {
    fn respond(&self, ecs: f64) -> ECSUResult<f64>;
}

impl<F> ClimateResponse for F
where
    F: Fn(f64) -> ECSUResult<f64> + Send + Sync,
{
    fn respond(&self, ecs: f64) -> ECSUResult<f64> {
        self(ecs)
    }
}

/// Equilibrium warming under a constant forcing
///
/// $$ \Delta T = ECS \cdot \frac{F}{F_{2xCO2}} $$
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquilibriumWarming {
    /// Sustained effective radiative forcing
    /// unit: W / m^2
    pub forcing: f64,
    /// Forcing due to a doubling of atmospheric CO2 concentrations
    /// unit: W / m^2
    pub rf_2xco2: f64,
}

impl Default for EquilibriumWarming {
    fn default() -> Self {
        Self::doubling()
    }
}

impl EquilibriumWarming {
    pub fn new(forcing: f64) -> Self {
        Self {
            forcing,
            ..Self::doubling()
        }
    }

    /// Warming for a doubling of CO2, which is ECS itself
    pub fn doubling() -> Self {
        Self {
            forcing: 3.71,
            rf_2xco2: 3.71,
        }
    }

    pub fn calculate_warming(&self, ecs: f64) -> f64 {
        ecs * (self.forcing / self.rf_2xco2)
    }
}

impl ClimateResponse for EquilibriumWarming {
    fn respond(&self, ecs: f64) -> ECSUResult<f64> {
        if !(self.rf_2xco2 > 0.0) {
            return Err(ECSUError::Error(format!(
                "rf_2xco2 must be positive, got {}",
                self.rf_2xco2
            )));
        }
        Ok(self.calculate_warming(ecs))
    }
}
