use thiserror::Error;

/// Error taxonomy for the sampler. Mirrors the recovery policy laid out
/// for the driver: `DegenerateCovariance` and numerical underflow are
/// recovered from locally and never reach this type; everything else is
/// surfaced to the caller.
#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error(
        "draw exhausted after {attempts} attempts at logL_min = {log_l_min}; evidence estimate is no longer unbiased"
    )]
    DrawExhausted { attempts: usize, log_l_min: f64 },

    #[error("cancellation requested at iteration {iteration}")]
    CancellationRequested { iteration: usize },

    #[error("prior error: {0}")]
    PriorError(String),
}

pub type Result<T> = std::result::Result<T, SamplerError>;
