//! Named parameters forwarded to a distribution family.
//!
//! The truncation kernel never looks inside a [`Parameters`] value; only the
//! family that receives it interprets the names.

use crate::errors::{ECSUError, ECSUResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An ordered map of parameter name to value, e.g. `{meanlog = 1.1, sdlog = 0.4}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters {
    values: IndexMap<String, f64>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or overwrite) a parameter, returning `self` for chaining.
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: f64) -> Option<f64> {
        self.values.insert(name.to_string(), value)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Look up a parameter, falling back to `default` when it is absent.
    pub fn get_or(&self, name: &str, default: f64) -> f64 {
        self.get(name).unwrap_or(default)
    }

    /// Look up a parameter that has no default.
    ///
    /// `family` is only used to label the error.
    pub fn require(&self, family: &str, name: &str) -> ECSUResult<f64> {
        self.get(name)
            .ok_or_else(|| ECSUError::InvalidParameters {
                family: family.to_string(),
                reason: format!("missing required parameter '{}'", name),
            })
    }

    /// Fail if any parameter name is not in `allowed`.
    ///
    /// Catches typos such as `sdev` for `sd` which would otherwise silently
    /// fall back to a default.
    pub fn check_known(&self, family: &str, allowed: &[&str]) -> ECSUResult<()> {
        match self.values.keys().find(|k| !allowed.contains(&k.as_str())) {
            Some(unknown) => Err(ECSUError::InvalidParameters {
                family: family.to_string(),
                reason: format!(
                    "unexpected parameter '{}' (expected one of: {})",
                    unknown,
                    allowed.join(", ")
                ),
            }),
            None => Ok(()),
        }
    }
}

impl<const N: usize> From<[(&str, f64); N]> for Parameters {
    fn from(pairs: [(&str, f64); N]) -> Self {
        Self {
            values: pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }
}

impl FromIterator<(String, f64)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
