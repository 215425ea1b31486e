use thiserror::Error;

/// Error type for invalid operations.
#[derive(Error, Debug)]
pub enum ECSUError {
    #[error("{0}")]
    Error(String),
    #[error("Unknown distribution family '{0}'")]
    UnknownDistributionFamily(String),
    #[error("Invalid truncation interval [{lower}, {upper}]. The lower bound must not exceed the upper bound and neither may be NaN")]
    InvalidInterval { lower: f64, upper: f64 },
    #[error("Degenerate truncation interval [{lower}, {upper}] for family '{family}': probability mass {mass} is not positive")]
    DegenerateMass {
        family: String,
        lower: f64,
        upper: f64,
        mass: f64,
    },
    #[error("Numerical integration over [{lower}, {upper}] failed: {reason}")]
    IntegrationFailure {
        lower: f64,
        upper: f64,
        reason: String,
    },
    #[error("Domain error in family '{family}': {reason}")]
    DomainError { family: String, reason: String },
    #[error("Invalid parameters for family '{family}': {reason}")]
    InvalidParameters { family: String, reason: String },
    #[error("Invalid input at index {index}: {reason}")]
    InvalidInput { index: usize, reason: String },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience type for `Result<T, ECSUError>`.
pub type ECSUResult<T> = Result<T, ECSUError>;
