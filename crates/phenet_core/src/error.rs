use thiserror::Error;

/// Failure taxonomy for the numerical core.
///
/// Every failure is reported synchronously to the caller; nothing is retried,
/// since identical deterministic inputs would reproduce the same failure.
/// Extinction-floor clamping and simplex drift renormalization are designed
/// behaviors, not errors.
#[derive(Debug, Error)]
pub enum Error {
    /// An out-of-range scalar parameter or a malformed species vector.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// H, Q, x0, f, d sizes disagree.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// The initial condition does not lie on the simplex.
    #[error("invalid initial condition: {0}")]
    InvalidInitialCondition(String),

    /// The trajectory left the finite domain; reported, never clamped.
    #[error("integration failure: {0}")]
    IntegrationFailure(String),
}

pub type Result<T> = std::result::Result<T, Error>;
