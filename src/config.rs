//! Driver configuration: the full nested-sampling configuration table.

use serde::Deserialize;

use crate::error::SamplerError;

#[derive(Deserialize, Debug, Clone)]
pub struct RunConfig {
    /// Initial live-point population.
    pub n_initial: usize,
    /// Floor the live-point population is never reduced below.
    pub n_min: usize,
    /// Per-iteration draw budget.
    pub max_draw_attempts: usize,
    /// Iterations using a single cluster before k-means is enabled.
    pub n_initial_noclust: usize,
    /// Rebuild clustering + ellipsoids every this many iterations.
    pub n_reclust_period: usize,
    /// Base ellipsoid inflation.
    pub initial_enlargement_fraction: f64,
    /// Exponent on remaining prior mass in the enlargement formula, in `[0,1]`.
    pub shrinking_rate: f64,
    /// Stop when remaining/accumulated evidence falls below this factor.
    pub termination_factor: f64,
    pub k_min: usize,
    pub k_max: usize,
    pub n_trials: usize,
    pub rel_tol: f64,
    /// Outer iteration cap; `None` means unbounded.
    #[serde(default)]
    pub max_iterations: Option<usize>,
    /// RNG seed; the driver owns a single seedable generator.
    pub seed: u64,
}

impl RunConfig {
    /// Fatal-at-construction validation.
    pub fn validate(&self) -> Result<(), SamplerError> {
        if self.n_min == 0 {
            return Err(SamplerError::ConfigInvalid("n_min must be >= 1".into()));
        }
        if self.n_min > self.n_initial {
            return Err(SamplerError::ConfigInvalid(
                "n_min must not exceed n_initial".into(),
            ));
        }
        if self.k_min == 0 || self.k_min > self.k_max {
            return Err(SamplerError::ConfigInvalid(
                "need 0 < k_min <= k_max".into(),
            ));
        }
        if self.n_trials == 0 {
            return Err(SamplerError::ConfigInvalid("n_trials must be >= 1".into()));
        }
        if !(self.termination_factor > 0.0 && self.termination_factor <= 1.0) {
            return Err(SamplerError::ConfigInvalid(
                "termination_factor must be in (0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.shrinking_rate) {
            return Err(SamplerError::ConfigInvalid(
                "shrinking_rate must be in [0, 1]".into(),
            ));
        }
        if self.initial_enlargement_fraction <= 0.0 {
            return Err(SamplerError::ConfigInvalid(
                "initial_enlargement_fraction must be positive".into(),
            ));
        }
        if self.max_draw_attempts == 0 {
            return Err(SamplerError::ConfigInvalid(
                "max_draw_attempts must be >= 1".into(),
            ));
        }
        Ok(())
    }
}
