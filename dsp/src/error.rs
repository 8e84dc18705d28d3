use crate::math::Real;

/// Errors reported by the timing loop.
///
/// None of these leave the loop half-updated: the state that was current
/// before the failing sample is kept.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("oversampling ratio {0} must be finite and at least 2")]
    InvalidRatio(Real),

    #[error("loop bandwidth {0} must lie strictly between 0 and 1")]
    InvalidBandwidth(Real),

    #[error("limit {0} must be finite and positive")]
    InvalidLimit(Real),

    #[error("sample {index} is not finite")]
    NonFiniteSample { index: u64 },

    #[error("timing estimate became non-finite at sample {index}")]
    NumericalFault { index: u64 },

    #[error("timing loop diverged at sample {index} (tau = {tau}, dtau = {dtau})")]
    Diverged { index: u64, tau: Real, dtau: Real },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
