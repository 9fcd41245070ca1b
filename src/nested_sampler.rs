//! Top-level nested sampling driver.

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::clusterer::Clusterer;
use crate::config::RunConfig;
use crate::error::SamplerError;
use crate::evidence::EvidenceAccumulator;
use crate::live::{LivePoint, LiveSet, PosteriorPoint, PosteriorSample};
use crate::metric::Euclidean;
use crate::prior::Prior;
use crate::reducer::LivePointReducer;
use crate::sampler::{ConstrainedSamplerConfig, MultiEllipsoidSampler};

/// How a run ended. Only `Converged` follows the documented finalize
/// step; `Cancelled` and `IterationCapReached` both return whatever
/// posterior sample had accumulated so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerOutcome {
    Converged,
    Cancelled,
    IterationCapReached,
}

#[derive(Debug)]
pub struct RunReport {
    pub outcome: SamplerOutcome,
    pub posterior: PosteriorSample,
    pub log_z: f64,
    pub log_z_err: f64,
    pub information: f64,
    pub iterations: usize,
}

/// Carries the partial posterior sample alongside a fatal error, per the
/// the policy that `DrawExhausted` must surface the partial state
/// rather than be silently swallowed.
#[derive(Debug)]
pub struct PartialRunError {
    pub source: SamplerError,
    pub posterior: PosteriorSample,
    pub log_z: f64,
    pub iterations: usize,
}

impl std::fmt::Display for PartialRunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (after {} iterations, {} posterior points retained)",
            self.source,
            self.iterations,
            self.posterior.len()
        )
    }
}

impl std::error::Error for PartialRunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

pub struct NestedSampler<P, F>
where
    P: Prior + Sync,
    F: Fn(&Array1<f64>) -> f64 + Sync,
{
    config: RunConfig,
    prior: P,
    log_likelihood: F,
    reducer: LivePointReducer,
    rng: StdRng,
}

impl<P, F> NestedSampler<P, F>
where
    P: Prior + Sync,
    F: Fn(&Array1<f64>) -> f64 + Sync,
{
    pub fn new(
        config: RunConfig,
        prior: P,
        log_likelihood: F,
        reducer: LivePointReducer,
    ) -> Result<Self, SamplerError> {
        config.validate()?;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(NestedSampler {
            config,
            prior,
            log_likelihood,
            reducer,
            rng,
        })
    }

    /// Samples `n` points uniformly from the prior in unit coordinates,
    /// evaluating the likelihood for each. Likelihood evaluation is
    /// embarrassingly parallel, so it's done with rayon (see
    /// "parallel evaluation" is out of scope for the *draw* loop, but
    /// initialization has no ordering dependency).
    fn sample_initial_live_set(&mut self) -> LiveSet {
        let d = self.prior.dim();
        let n = self.config.n_initial;

        let unit_draws: Vec<Array1<f64>> = (0..n)
            .map(|_| Array1::from_iter((0..d).map(|_| self.rng.gen::<f64>())))
            .collect();

        use rayon::prelude::*;
        let points: Vec<LivePoint> = unit_draws
            .into_par_iter()
            .map(|u| {
                let theta_phys = self.prior.from_unit(&u);
                let log_l = (self.log_likelihood)(&theta_phys);
                LivePoint::new(u, theta_phys, log_l)
            })
            .collect();

        LiveSet::from_unsorted(points)
    }

    /// Whether iteration `i` rebuilds the ellipsoid geometry. During the
    /// first `N_initial_noclust` iterations the live set is small/changing
    /// every step and clustering is trivial (K=1), so the single ellipsoid
    /// is rebuilt every iteration; afterwards it's rebuilt only every
    /// `N_reclust_period` iterations, with the last geometry reused in
    /// between.
    fn should_recluster(&self, iteration: usize) -> bool {
        if iteration <= self.config.n_initial_noclust {
            return true;
        }
        let since_clustering_enabled = iteration - self.config.n_initial_noclust;
        since_clustering_enabled == 1
            || since_clustering_enabled % self.config.n_reclust_period.max(1) == 0
    }

    fn build_sampler(
        &mut self,
        live_set: &LiveSet,
        exclude_index: usize,
        log_x: f64,
        iteration: usize,
    ) -> MultiEllipsoidSampler {
        let all_points = live_set.unit_matrix();
        let n_total = all_points.nrows();
        // Excluding the worst point is only meaningful when other points
        // remain to build geometry from; at N_live=1 there is nothing else,
        // so fall back to the single point itself (the boundary case
        // "N_live=N_min=1").
        let indices: Vec<usize> = if n_total <= 1 {
            (0..n_total).collect()
        } else {
            (0..n_total).filter(|&i| i != exclude_index).collect()
        };
        let points = crate::linalg::select_rows(all_points.view(), &indices);

        let use_single_cluster =
            iteration <= self.config.n_initial_noclust || self.config.k_max <= 1;
        let assignment = if use_single_cluster {
            crate::clusterer::ClusterAssignment {
                assignments: vec![0; points.nrows()],
                k: 1,
                cost: 0.0,
            }
        } else {
            let clusterer = Clusterer::new(
                Euclidean,
                self.config.k_min,
                self.config.k_max,
                self.config.n_trials,
                self.config.rel_tol,
            );
            clusterer.cluster(points.view(), &mut self.rng)
        };

        let n_live = live_set.len();
        let sampler_config = ConstrainedSamplerConfig {
            initial_enlargement_fraction: self.config.initial_enlargement_fraction,
            shrinking_rate: self.config.shrinking_rate,
        };
        MultiEllipsoidSampler::build(points.view(), &assignment, log_x, n_live, &sampler_config)
    }

    /// Evolves the live set until termination, cancellation, or the
    /// iteration cap is reached.
    pub fn run(&mut self, cancel: Option<&dyn Fn() -> bool>) -> Result<RunReport, PartialRunError> {
        let mut live_set = self.sample_initial_live_set();
        let mut acc = EvidenceAccumulator::new();
        let mut posterior = PosteriorSample::new();
        let mut iteration = 0usize;
        let mut cached_sampler: Option<MultiEllipsoidSampler> = None;
        let mut last_target = self.config.n_initial;

        loop {
            iteration += 1;

            if let Some(poll) = cancel {
                if poll() {
                    log::info!("cancellation requested at iteration {iteration}");
                    return Ok(RunReport {
                        outcome: SamplerOutcome::Cancelled,
                        log_z: acc.log_z,
                        log_z_err: acc.log_z_err(self.config.n_initial),
                        information: acc.h,
                        posterior,
                        iterations: iteration,
                    });
                }
            }

            if let Some(cap) = self.config.max_iterations {
                if iteration > cap {
                    log::warn!("iteration cap ({cap}) reached before convergence");
                    return Ok(RunReport {
                        outcome: SamplerOutcome::IterationCapReached,
                        log_z: acc.log_z,
                        log_z_err: acc.log_z_err(self.config.n_initial),
                        information: acc.h,
                        posterior,
                        iterations: iteration,
                    });
                }
            }

            let n_live_now = live_set.len();
            let worst_log_l = live_set.worst_log_l();
            let log_dx = acc.shrink(n_live_now);
            let log_w = log_dx + worst_log_l;
            acc.accumulate(log_w, worst_log_l);

            if self.should_recluster(iteration) {
                log::debug!("rebuilding ellipsoid geometry at iteration {iteration}");
                cached_sampler = Some(self.build_sampler(&live_set, 0, acc.log_x, iteration));
            }
            let sampler = cached_sampler
                .as_ref()
                .expect("geometry is always built on the first iteration");

            let new_point = sampler.draw_replacement(
                &self.prior,
                &self.log_likelihood,
                worst_log_l,
                self.config.max_draw_attempts,
                &mut self.rng,
            );

            let new_point = match new_point {
                Ok(p) => p,
                Err(e) => {
                    return Err(PartialRunError {
                        source: e,
                        log_z: acc.log_z,
                        posterior,
                        iterations: iteration,
                    })
                }
            };

            let removed = live_set.replace_worst(new_point);
            posterior.push(PosteriorPoint {
                theta_phys: removed.theta_phys,
                log_l: removed.log_l,
                log_w,
            });

            // Reduce: shrink the live-point population toward the
            // reducer's target, never below n_min, never increasing.
            let raw_target = self
                .reducer
                .target_n_live(iteration, self.config.n_initial, self.config.n_min);
            let target = raw_target.min(last_target).max(self.config.n_min);
            last_target = target;

            while live_set.len() > target {
                let n_live_for_shell = live_set.len();
                let dropped_log_l = live_set.worst_log_l();
                let log_dx2 = acc.shrink(n_live_for_shell);
                let log_w2 = log_dx2 + dropped_log_l;
                acc.accumulate(log_w2, dropped_log_l);
                let dropped = live_set.pop_worst();
                posterior.push(PosteriorPoint {
                    theta_phys: dropped.theta_phys,
                    log_l: dropped.log_l,
                    log_w: log_w2,
                });
            }

            let remaining = live_set.best_log_l() + acc.log_x;
            let criterion = remaining - acc.log_z;
            if criterion < self.config.termination_factor.ln() {
                log::info!(
                    "converged at iteration {iteration}: logZ = {:.6}, H = {:.6}",
                    acc.log_z,
                    acc.h
                );
                self.finalize(&live_set, &mut acc, &mut posterior);
                return Ok(RunReport {
                    outcome: SamplerOutcome::Converged,
                    log_z: acc.log_z,
                    log_z_err: acc.log_z_err(self.config.n_initial),
                    information: acc.h,
                    posterior,
                    iterations: iteration,
                });
            }
        }
    }

    /// Distributes the final prior mass uniformly among the surviving
    /// live points, folding each into both the posterior sample and the
    /// evidence accumulator.
    fn finalize(&self, live_set: &LiveSet, acc: &mut EvidenceAccumulator, posterior: &mut PosteriorSample) {
        let n_live = live_set.len();
        if n_live == 0 {
            return;
        }
        let log_share = acc.log_x - (n_live as f64).ln();
        for point in live_set.iter() {
            let log_w = log_share + point.log_l;
            acc.accumulate(log_w, point.log_l);
            posterior.push(PosteriorPoint {
                theta_phys: point.theta_phys.clone(),
                log_l: point.log_l,
                log_w,
            });
        }
    }
}
