//! Live-point reduction schedules.
//!
//! The Feroz strategy is named for Feroz & Hobson's progressively-shrinking
//! live-point-count variant of nested sampling; its call signature takes
//! the scalars it needs (current iteration, N_initial, N_min) rather than
//! holding a back-reference to the sampler, per the "cyclic references"
//! design note: the driver is the only thing that owns evidence state.

#[derive(Debug, Clone, Copy)]
pub enum LivePointReducer {
    /// Never shrinks the live set.
    Constant,
    /// `N_live(i) = N_min + (N_initial - N_min) * exp(-i * tolerance)`.
    Feroz { tolerance: f64 },
    /// `N_live(i) = N_initial * exp(-i * rate)`, floored at `N_min`.
    Exponential { rate: f64 },
}

impl LivePointReducer {
    /// Computes the target live-point count at iteration `i`. The caller
    /// (the driver) is responsible for enforcing monotone non-increasing
    /// behavior and for never dropping below `n_min`.
    pub fn target_n_live(&self, iteration: usize, n_initial: usize, n_min: usize) -> usize {
        let i = iteration as f64;
        match self {
            LivePointReducer::Constant => n_initial,
            LivePointReducer::Feroz { tolerance } => {
                let target = n_min as f64 + (n_initial - n_min) as f64 * (-i * tolerance).exp();
                target.round() as usize
            }
            LivePointReducer::Exponential { rate } => {
                let target = n_initial as f64 * (-i * rate).exp();
                (target.round() as usize).max(n_min)
            }
        }
    }
}
