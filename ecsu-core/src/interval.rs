use crate::errors::{ECSUError, ECSUResult};
use serde::{Deserialize, Serialize};

/// A closed truncation interval $[a, b]$; either bound may be infinite.
///
/// The default interval is the whole real line, i.e. no truncation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TruncationInterval {
    pub lower: f64,
    pub upper: f64,
}

impl Default for TruncationInterval {
    fn default() -> Self {
        Self {
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
        }
    }
}

impl TruncationInterval {
    /// Create a new interval, failing if `lower > upper` or either bound is NaN
    pub fn new(lower: f64, upper: f64) -> ECSUResult<Self> {
        if lower.is_nan() || upper.is_nan() || lower > upper {
            return Err(ECSUError::InvalidInterval { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    /// Truncate from below only
    pub fn above(lower: f64) -> ECSUResult<Self> {
        Self::new(lower, f64::INFINITY)
    }

    /// Truncate from above only
    pub fn below(upper: f64) -> ECSUResult<Self> {
        Self::new(f64::NEG_INFINITY, upper)
    }

    /// Re-check the invariants of a value built without [`TruncationInterval::new`],
    /// e.g. one read from a configuration file.
    pub fn validate(&self) -> ECSUResult<()> {
        Self::new(self.lower, self.upper).map(|_| ())
    }

    pub fn contains(&self, x: f64) -> bool {
        x >= self.lower && x <= self.upper
    }

    /// Clamp `x` into the interval
    pub fn clamp(&self, x: f64) -> f64 {
        self.lower.max(x.min(self.upper))
    }

    pub fn is_unbounded(&self) -> bool {
        self.lower == f64::NEG_INFINITY && self.upper == f64::INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation() {
        assert!(TruncationInterval::new(0.0, 1.0).is_ok());
        assert!(TruncationInterval::new(5.0, 5.0).is_ok());
        assert!(matches!(
            TruncationInterval::new(2.0, 1.0),
            Err(ECSUError::InvalidInterval { .. })
        ));
        assert!(TruncationInterval::new(f64::NAN, 1.0).is_err());

        let bad = TruncationInterval {
            lower: 1.0,
            upper: 0.0,
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_clamp_and_contains() {
        let interval = TruncationInterval::above(0.0).unwrap();

        assert_eq!(interval.clamp(-3.0), 0.0);
        assert_eq!(interval.clamp(3.0), 3.0);
        assert!(interval.contains(0.0));
        assert!(!interval.contains(-1e-12));
        assert!(!interval.is_unbounded());
        assert!(TruncationInterval::default().is_unbounded());
    }

    #[test]
    fn test_deserialise_with_defaults() {
        let interval: TruncationInterval = toml::from_str("lower = 0.5").unwrap();
        assert_eq!(interval.lower, 0.5);
        assert_eq!(interval.upper, f64::INFINITY);

        let interval: TruncationInterval = toml::from_str("lower = -inf\nupper = 10.0").unwrap();
        assert_eq!(interval, TruncationInterval::below(10.0).unwrap());
    }
}
