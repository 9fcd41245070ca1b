//! Multi-ellipsoidal constrained prior sampler.

use ndarray::{Array1, ArrayView2};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::clusterer::ClusterAssignment;
use crate::ellipsoid::Ellipsoid;
use crate::error::SamplerError;
use crate::linalg::select_rows;
use crate::live::LivePoint;
use crate::prior::Prior;

#[derive(Debug, Clone, Copy)]
pub struct ConstrainedSamplerConfig {
    /// Base ellipsoid inflation (`initialEnlargementFraction`).
    pub initial_enlargement_fraction: f64,
    /// Exponent on remaining prior mass in the enlargement formula
    /// (`shrinkingRate`, in `[0,1]`).
    pub shrinking_rate: f64,
}

/// The K enlarged ellipsoids built from the current cluster assignment
/// Rebuilt from scratch every
/// `N_reclust_period` iterations; does not persist across rebuilds
/// across rebuilds.
pub struct MultiEllipsoidSampler {
    pub ellipsoids: Vec<Ellipsoid>,
    /// Cumulative normalized volume fractions, for ellipsoid-proportional
    /// selection.
    cumulative_weights: Vec<f64>,
}

impl MultiEllipsoidSampler {
    /// Builds one enlarged ellipsoid per cluster in `assignment`.
    ///
    /// `log_x` is the current log prior mass, used in the enlargement
    /// formula `f_k = initialEnlargementFraction * X_i^shrinkingRate *
    /// n_k/N_live`. Clusters with fewer than 2 points cannot yield a
    /// sample covariance at all; such a
    /// cluster is merged into its nearest neighbor by center distance,
    /// with a warning logged, before ellipsoids are built.
    pub fn build(
        unit_points: ArrayView2<f64>,
        assignment: &ClusterAssignment,
        log_x: f64,
        n_live: usize,
        config: &ConstrainedSamplerConfig,
    ) -> Self {
        let mut groups = cluster_index_groups(assignment);
        merge_degenerate_clusters(unit_points, &mut groups);

        let mut ellipsoids = Vec::with_capacity(groups.len());
        for indices in &groups {
            let cluster_points = select_rows(unit_points, indices);
            let n_k = indices.len();

            let log_base_f = config.initial_enlargement_fraction.ln()
                + config.shrinking_rate * log_x
                + (n_k as f64 / n_live as f64).ln();
            let base_f = log_base_f.exp();

            let mut ellipsoid = Ellipsoid::from_points(cluster_points.view());
            ellipsoid.enlarge_to_cover(base_f, cluster_points.view());
            ellipsoids.push(ellipsoid);
        }

        let cumulative_weights = normalized_cumulative_volumes(&ellipsoids);

        MultiEllipsoidSampler {
            ellipsoids,
            cumulative_weights,
        }
    }

    fn pick_ellipsoid<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        if self.ellipsoids.len() == 1 {
            return 0;
        }
        let target: f64 = rng.gen();
        match self
            .cumulative_weights
            .iter()
            .position(|&c| target <= c)
        {
            Some(i) => i,
            None => self.ellipsoids.len() - 1,
        }
    }

    /// Number of ellipsoids (including `self`'s own) that contain `x`,
    /// used for the overlap correction.
    fn overlap_count(&self, x: &Array1<f64>) -> usize {
        self.ellipsoids.iter().filter(|e| e.contains(x)).count()
    }

    /// Draws one replacement live point with `logL > logL_min` by
    /// rejection sampling over the ellipsoid union, up to `max_attempts`
    /// draws. Attempts are tried in parallel batches, each with an
    /// independently-seeded sub-stream so the
    /// result is reproducible given the driver's master RNG.
    pub fn draw_replacement<P, F>(
        &self,
        prior: &P,
        log_likelihood: F,
        log_l_min: f64,
        max_attempts: usize,
        rng: &mut impl Rng,
    ) -> Result<LivePoint, SamplerError>
    where
        P: Prior + Sync,
        F: Fn(&Array1<f64>) -> f64 + Sync,
    {
        if self.ellipsoids.is_empty() {
            return Err(SamplerError::DrawExhausted {
                attempts: 0,
                log_l_min,
            });
        }

        let batch_size = rayon::current_num_threads().max(1);
        let mut attempts_used = 0usize;

        while attempts_used < max_attempts {
            let this_batch = batch_size.min(max_attempts - attempts_used);
            let seeds: Vec<u64> = (0..this_batch).map(|_| rng.gen()).collect();

            let results: Vec<Option<LivePoint>> = seeds
                .into_par_iter()
                .map(|seed| {
                    let mut sub_rng = StdRng::seed_from_u64(seed);
                    self.try_one_draw(prior, &log_likelihood, log_l_min, &mut sub_rng)
                })
                .collect();

            attempts_used += this_batch;
            if let Some(found) = results.into_iter().flatten().next() {
                return Ok(found);
            }
        }

        Err(SamplerError::DrawExhausted {
            attempts: attempts_used,
            log_l_min,
        })
    }

    fn try_one_draw<P, F>(
        &self,
        prior: &P,
        log_likelihood: &F,
        log_l_min: f64,
        rng: &mut impl Rng,
    ) -> Option<LivePoint>
    where
        P: Prior,
        F: Fn(&Array1<f64>) -> f64,
    {
        let k = self.pick_ellipsoid(rng);
        let x = self.ellipsoids[k].sample_uniform(rng);

        let q = self.overlap_count(&x);
        if q == 0 {
            return None;
        }
        let accept_prob = 1.0 / q as f64;
        if rng.gen::<f64>() > accept_prob {
            return None;
        }

        if x.iter().any(|&v| !(0.0..=1.0).contains(&v)) {
            return None;
        }

        let theta_phys = prior.from_unit(&x);
        let log_l = log_likelihood(&theta_phys);
        // `-inf` is always a rejected point regardless of the threshold
        // ("-inf" always means "point rejected"), even
        // when `log_l_min` is itself `-inf` during initialization. Ties at
        // a finite value are accepted, which is the documented tie policy
        // that lets flat/plateaued likelihoods still make progress via
        // prior-mass shrinkage alone.
        if log_l.is_finite() && log_l >= log_l_min {
            Some(LivePoint::new(x, theta_phys, log_l))
        } else {
            None
        }
    }
}

fn cluster_index_groups(assignment: &ClusterAssignment) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = vec![Vec::new(); assignment.k];
    for (i, &a) in assignment.assignments.iter().enumerate() {
        groups[a].push(i);
    }
    groups.retain(|g| !g.is_empty());
    groups
}

fn cluster_centroid(points: ArrayView2<f64>, indices: &[usize]) -> Array1<f64> {
    let d = points.ncols();
    let mut sum = Array1::<f64>::zeros(d);
    for &i in indices {
        sum = sum + points.row(i);
    }
    sum / indices.len() as f64
}

/// Folds any cluster with fewer than 2 members into its nearest neighbor
/// by centroid distance, repeating until none remain (or a single cluster
/// is left).
fn merge_degenerate_clusters(points: ArrayView2<f64>, groups: &mut Vec<Vec<usize>>) {
    loop {
        if groups.len() <= 1 {
            return;
        }
        let degenerate = groups.iter().position(|g| g.len() < 2);
        let Some(victim) = degenerate else { return };

        let centroids: Vec<Array1<f64>> = groups
            .iter()
            .map(|g| cluster_centroid(points, g))
            .collect();
        let victim_centroid = &centroids[victim];
        let nearest = (0..groups.len())
            .filter(|&j| j != victim)
            .min_by(|&a, &b| {
                let da = (&centroids[a] - victim_centroid).dot(&(&centroids[a] - victim_centroid));
                let db = (&centroids[b] - victim_centroid).dot(&(&centroids[b] - victim_centroid));
                da.partial_cmp(&db).unwrap()
            })
            .expect("at least one other cluster exists");

        log::warn!(
            "cluster of size {} has a degenerate covariance; merging into nearest neighbor",
            groups[victim].len()
        );
        let old_len = groups.len();
        let merged = groups.swap_remove(victim);
        // swap_remove moved the last element into `victim`'s slot; remap
        // `nearest` if it was that last element.
        let nearest = if nearest == old_len - 1 { victim } else { nearest };
        groups[nearest].extend(merged);
    }
}

fn normalized_cumulative_volumes(ellipsoids: &[Ellipsoid]) -> Vec<f64> {
    if ellipsoids.is_empty() {
        return Vec::new();
    }
    let log_volumes: Vec<f64> = ellipsoids.iter().map(|e| e.log_volume()).collect();
    let max_log_v = log_volumes.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let weights: Vec<f64> = log_volumes.iter().map(|&lv| (lv - max_log_v).exp()).collect();
    let total: f64 = weights.iter().sum();
    let mut cumulative = Vec::with_capacity(weights.len());
    let mut running = 0.0;
    for w in weights {
        running += w / total;
        cumulative.push(running);
    }
    if let Some(last) = cumulative.last_mut() {
        *last = 1.0;
    }
    cumulative
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clusterer::ClusterAssignment;
    use crate::prior::BoxUniformPrior;
    use ndarray::array;
    use rand::rngs::StdRng;

    fn unit_gaussian_log_l(theta: &Array1<f64>) -> f64 {
        -0.5 * theta.dot(theta)
    }

    #[test]
    fn draw_replacement_respects_the_likelihood_floor() {
        let prior = BoxUniformPrior::symmetric(2, 5.0);
        let unit_points = array![
            [0.4, 0.4],
            [0.6, 0.4],
            [0.4, 0.6],
            [0.6, 0.6],
            [0.5, 0.5],
            [0.45, 0.55],
        ];
        let assignment = ClusterAssignment {
            assignments: vec![0; 6],
            k: 1,
            cost: 0.0,
        };
        let config = ConstrainedSamplerConfig {
            initial_enlargement_fraction: 1.5,
            shrinking_rate: 0.0,
        };
        let sampler = MultiEllipsoidSampler::build(unit_points.view(), &assignment, 0.0, 6, &config);

        let mut rng = StdRng::seed_from_u64(11);
        let point = sampler
            .draw_replacement(&prior, unit_gaussian_log_l, -10.0, 10_000, &mut rng)
            .expect("should find a point above the very loose floor");
        assert!(point.log_l > -10.0);
    }

    #[test]
    fn draw_exhausted_when_floor_is_unreachable() {
        let prior = BoxUniformPrior::symmetric(2, 5.0);
        let unit_points = array![[0.5, 0.5], [0.5, 0.5], [0.5, 0.5]];
        let assignment = ClusterAssignment {
            assignments: vec![0; 3],
            k: 1,
            cost: 0.0,
        };
        let config = ConstrainedSamplerConfig {
            initial_enlargement_fraction: 1.0,
            shrinking_rate: 0.0,
        };
        let sampler = MultiEllipsoidSampler::build(unit_points.view(), &assignment, 0.0, 3, &config);
        let mut rng = StdRng::seed_from_u64(2);
        let result = sampler.draw_replacement(&prior, unit_gaussian_log_l, 1e10, 20, &mut rng);
        assert!(result.is_err());
    }
}
