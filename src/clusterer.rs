//! K-means clustering with k-means++ seeding, restart trials, and BIC-like
//! K selection.

use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::Rng;

use crate::metric::Metric;

/// Result of a clustering run: a surjective assignment onto `0..k`, with
/// no empty clusters.
#[derive(Debug, Clone)]
pub struct ClusterAssignment {
    pub assignments: Vec<usize>,
    pub k: usize,
    pub cost: f64,
}

pub struct Clusterer<M: Metric> {
    pub metric: M,
    pub k_min: usize,
    pub k_max: usize,
    pub n_trials: usize,
    pub rel_tol: f64,
    pub max_lloyd_iters: usize,
}

impl<M: Metric> Clusterer<M> {
    pub fn new(metric: M, k_min: usize, k_max: usize, n_trials: usize, rel_tol: f64) -> Self {
        Clusterer {
            metric,
            k_min: k_min.max(1),
            k_max: k_max.max(k_min.max(1)),
            n_trials: n_trials.max(1),
            rel_tol,
            max_lloyd_iters: 50,
        }
    }

    /// Partitions `points` (n x d) into `1..=k_max` clusters, selecting K
    /// via a BIC-like criterion: `cost + K * D * log(N)`.
    pub fn cluster<R: Rng>(&self, points: ArrayView2<f64>, rng: &mut R) -> ClusterAssignment {
        let n = points.nrows();
        let d = points.ncols();

        if n <= 1 || self.k_max <= 1 {
            return ClusterAssignment {
                assignments: vec![0; n],
                k: 1.min(n),
                cost: self.within_cluster_cost(points, &vec![0; n], 1),
            };
        }

        let mut best: Option<ClusterAssignment> = None;
        let mut best_bic = f64::INFINITY;

        for k in self.k_min.max(1)..=self.k_max.min(n) {
            let candidate = self.best_of_n_trials(points, k, rng);
            let bic = candidate.cost + (k as f64) * (d as f64) * (n as f64).ln();
            if bic < best_bic {
                best_bic = bic;
                best = Some(candidate);
            }
        }

        best.unwrap_or_else(|| ClusterAssignment {
            assignments: vec![0; n],
            k: 1,
            cost: self.within_cluster_cost(points, &vec![0; n], 1),
        })
    }

    fn best_of_n_trials<R: Rng>(
        &self,
        points: ArrayView2<f64>,
        k: usize,
        rng: &mut R,
    ) -> ClusterAssignment {
        let mut best: Option<ClusterAssignment> = None;
        for _ in 0..self.n_trials {
            let candidate = self.lloyd(points, k, rng);
            if best.as_ref().map_or(true, |b| candidate.cost < b.cost) {
                best = Some(candidate);
            }
        }
        best.unwrap()
    }

    /// k-means++ seeding followed by Lloyd's algorithm until relative
    /// improvement drops below `rel_tol` or `max_lloyd_iters` is hit.
    /// Empty clusters are dropped and K decremented; if K collapses to 0,
    /// falls back to K=1.
    fn lloyd<R: Rng>(&self, points: ArrayView2<f64>, k: usize, rng: &mut R) -> ClusterAssignment {
        let n = points.nrows();
        let mut centers = self.kmeans_plus_plus_seed(points, k, rng);
        let mut assignments = vec![0usize; n];
        let mut prev_cost = f64::INFINITY;
        let mut cost = f64::INFINITY;

        for _ in 0..self.max_lloyd_iters {
            for i in 0..n {
                let row = points.row(i);
                assignments[i] = self.nearest_center(row, &centers);
            }

            // Recompute centers, dropping empty clusters and remapping
            // assignments to the compacted index space so `assignments[i]`
            // always indexes validly into the returned `centers`.
            let (new_centers, mapping) = self.recompute_centers(points, &assignments, centers.len());
            for a in assignments.iter_mut() {
                *a = mapping[*a].expect("a cluster with an assigned point is never empty");
            }
            centers = new_centers;

            cost = self.cost_given_centers(points, &assignments, &centers);
            let rel_change = if prev_cost.is_finite() && prev_cost > 0.0 {
                ((prev_cost - cost) / prev_cost).abs()
            } else {
                1.0
            };
            prev_cost = cost;
            if rel_change < self.rel_tol {
                break;
            }
        }

        let k_final = centers.len().max(1);
        ClusterAssignment {
            assignments,
            k: k_final,
            cost,
        }
    }

    fn kmeans_plus_plus_seed<R: Rng>(
        &self,
        points: ArrayView2<f64>,
        k: usize,
        rng: &mut R,
    ) -> Vec<Array1<f64>> {
        let n = points.nrows();
        let mut centers: Vec<Array1<f64>> = Vec::with_capacity(k);
        let first = rng.gen_range(0..n);
        centers.push(points.row(first).to_owned());

        while centers.len() < k {
            let mut dist_sq: Vec<f64> = (0..n)
                .map(|i| {
                    let row = points.row(i);
                    centers
                        .iter()
                        .map(|c| {
                            let d = self.metric.distance(row, c.view());
                            d * d
                        })
                        .fold(f64::INFINITY, f64::min)
                })
                .collect();

            let total: f64 = dist_sq.iter().sum();
            if total <= 0.0 {
                let idx = rng.gen_range(0..n);
                centers.push(points.row(idx).to_owned());
                continue;
            }
            for v in dist_sq.iter_mut() {
                *v /= total;
            }
            let mut target: f64 = rng.gen();
            let mut chosen = n - 1;
            for (i, p) in dist_sq.iter().enumerate() {
                if target <= *p {
                    chosen = i;
                    break;
                }
                target -= p;
            }
            centers.push(points.row(chosen).to_owned());
        }
        centers
    }

    fn nearest_center(&self, row: ArrayView1<f64>, centers: &[Array1<f64>]) -> usize {
        centers
            .iter()
            .enumerate()
            .map(|(i, c)| (i, self.metric.distance(row, c.view())))
            .fold((0usize, f64::INFINITY), |(bi, bd), (i, d)| {
                if d < bd {
                    (i, d)
                } else {
                    (bi, bd)
                }
            })
            .0
    }

    /// Recomputes centers as cluster means, dropping empty clusters and
    /// compacting the index space. Returns `(centers, mapping)` where
    /// `mapping[old_index]` gives the `Some(new_index)` of that cluster in
    /// the returned `centers`, or `None` if it was empty and dropped.
    fn recompute_centers(
        &self,
        points: ArrayView2<f64>,
        assignments: &[usize],
        k: usize,
    ) -> (Vec<Array1<f64>>, Vec<Option<usize>>) {
        let d = points.ncols();
        let mut sums = vec![Array1::<f64>::zeros(d); k];
        let mut counts = vec![0usize; k];
        for (i, &a) in assignments.iter().enumerate() {
            sums[a] = &sums[a] + &points.row(i);
            counts[a] += 1;
        }

        let mut new_centers = Vec::with_capacity(k);
        let mut mapping = vec![None; k];
        for (old_idx, (sum, count)) in sums.into_iter().zip(counts.into_iter()).enumerate() {
            if count > 0 {
                mapping[old_idx] = Some(new_centers.len());
                new_centers.push(sum / count as f64);
            }
        }
        (new_centers, mapping)
    }

    /// Within-cluster sum of squared distances for an already-consistent
    /// `(assignments, centers)` pairing, i.e. every `assignments[i]` is a
    /// valid index into `centers`.
    fn cost_given_centers(
        &self,
        points: ArrayView2<f64>,
        assignments: &[usize],
        centers: &[Array1<f64>],
    ) -> f64 {
        if centers.is_empty() {
            return 0.0;
        }
        assignments
            .iter()
            .enumerate()
            .map(|(i, &a)| {
                let d = self.metric.distance(points.row(i), centers[a].view());
                d * d
            })
            .sum()
    }

    /// Cost of the trivial single-cluster (or pre-assigned) case, used by
    /// the K<=1 short-circuits in [`cluster`](Self::cluster).
    fn within_cluster_cost(&self, points: ArrayView2<f64>, assignments: &[usize], k: usize) -> f64 {
        let (centers, mapping) = self.recompute_centers(points, assignments, k);
        let remapped: Vec<usize> = assignments
            .iter()
            .map(|&a| mapping[a].expect("a cluster with an assigned point is never empty"))
            .collect();
        self.cost_given_centers(points, &remapped, &centers)
    }
}
