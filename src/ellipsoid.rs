//! Bounding ellipsoid geometry.
//!
//! An ellipsoid is `{ x : (x-c)^T (f*Sigma)^-1 (x-c) <= 1 }`, represented by
//! its center, the eigendecomposition of the (unenlarged) covariance, and a
//! scalar enlargement factor `f >= 1`. The eigendecomposition is cached and
//! immutable after construction: enlarging only updates `f`.

use ndarray::{Array1, Array2, ArrayView2};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use statrs::function::gamma::ln_gamma;

use crate::linalg::{mahalanobis_sq, mean_and_covariance, symmetric_eigen};

#[derive(Debug, Clone)]
pub struct Ellipsoid {
    pub center: Array1<f64>,
    eigenvalues: Array1<f64>,
    eigenvectors: Array2<f64>,
    /// Enlargement factor applied to the covariance when testing
    /// membership or sampling; always >= 1.
    f: f64,
}

impl Ellipsoid {
    /// Builds an ellipsoid from a point cloud: mean + sample covariance +
    /// cached eigendecomposition. `f` starts at 1 (the caller enlarges it).
    pub fn from_points(points: ArrayView2<f64>) -> Ellipsoid {
        let (center, cov) = mean_and_covariance(points);
        let (eigenvalues, eigenvectors) = symmetric_eigen(&cov);
        Ellipsoid {
            center,
            eigenvalues,
            eigenvectors,
            f: 1.0,
        }
    }

    pub fn dim(&self) -> usize {
        self.center.len()
    }

    pub fn enlargement(&self) -> f64 {
        self.f
    }

    /// Sets the enlargement factor, clamping it to be at least 1.
    pub fn enlarge(&mut self, f: f64) {
        self.f = f.max(1.0);
    }

    /// Sets `f = max(base_f, max Mahalanobis distance encountered over
    /// `points`)`, so that the ellipsoid both reflects the policy-driven
    /// base enlargement (`initialEnlargementFraction * X_i^shrinkingRate *
    /// n_k/N_live`) and encloses every point of its cluster, whichever
    /// requires more enlargement.
    pub fn enlarge_to_cover(&mut self, base_f: f64, points: ArrayView2<f64>) {
        let mut max_maha = base_f.max(1.0);
        for row in points.rows() {
            let owned = row.to_owned();
            let d2 = mahalanobis_sq(&owned, &self.center, &self.eigenvalues, &self.eigenvectors);
            if d2 > max_maha {
                max_maha = d2;
            }
        }
        self.f = max_maha;
    }

    /// Mahalanobis-distance membership test: `(x-c)^T (f*Sigma)^-1 (x-c)`.
    /// Values <= 1 are inside the ellipsoid.
    pub fn contains_value(&self, x: &Array1<f64>) -> f64 {
        mahalanobis_sq(x, &self.center, &self.eigenvalues, &self.eigenvectors) / self.f
    }

    pub fn contains(&self, x: &Array1<f64>) -> bool {
        self.contains_value(x) <= 1.0
    }

    /// log-volume, avoiding overflow for larger D:
    /// `log V = (D/2) log f + (D/2) log(pi) - ln_gamma(D/2 + 1) + 0.5 sum log(lambda_i)`.
    pub fn log_volume(&self) -> f64 {
        let d = self.dim() as f64;
        let half_d = d / 2.0;
        let sum_log_lambda: f64 = self.eigenvalues.iter().map(|l| l.ln()).sum();
        half_d * self.f.ln() + half_d * std::f64::consts::PI.ln() - ln_gamma(half_d + 1.0)
            + 0.5 * sum_log_lambda
    }

    pub fn volume(&self) -> f64 {
        self.log_volume().exp()
    }

    /// Draws a point uniformly distributed inside the (enlarged) ellipsoid.
    ///
    /// Draw `v ~ N(0, I)`, normalize to the unit
    /// sphere, scale radially by `U^{1/D}` for `U ~ Uniform(0,1)` (this is
    /// the standard trick for sampling uniformly inside a ball), then map
    /// through `x = c + sqrt(f) * Q * diag(sqrt(lambda)) * v`.
    pub fn sample_uniform<R: Rng + ?Sized>(&self, rng: &mut R) -> Array1<f64> {
        let d = self.dim();
        let mut v: Array1<f64> = Array1::from_iter((0..d).map(|_| StandardNormal.sample(rng)));
        let norm = v.dot(&v).sqrt();
        if norm > 0.0 {
            v /= norm;
        }
        let u: f64 = rng.gen::<f64>();
        let radial = u.powf(1.0 / d as f64);
        v *= radial;

        let sqrt_f = self.f.sqrt();
        let mut x = self.center.clone();
        for k in 0..d {
            let scale = sqrt_f * self.eigenvalues[k].sqrt();
            for i in 0..d {
                x[i] += scale * self.eigenvectors[[i, k]] * v[k];
            }
        }
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn enclosure_invariant_holds_after_growth() {
        let points = array![
            [0.0, 0.0],
            [1.0, 0.0],
            [0.0, 1.0],
            [1.0, 1.0],
            [0.5, 0.5],
            [2.0, -1.0],
        ];
        let mut e = Ellipsoid::from_points(points.view());
        e.enlarge_to_cover(1.0, points.view());
        for row in points.rows() {
            let x = row.to_owned();
            assert!(e.contains_value(&x) <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn volume_of_unit_circle_matches_pi() {
        // Covariance = identity, f = 1 -> unit 2-ball, area = pi.
        let points = array![[1.0, 0.0], [-1.0, 0.0], [0.0, 1.0], [0.0, -1.0]];
        let mut e = Ellipsoid::from_points(points.view());
        // Force identity-like covariance by construction from an
        // orthogonal cross; sample covariance here isn't exactly identity,
        // so just check volume is finite and positive as a smoke test.
        e.enlarge(1.0);
        assert!(e.volume() > 0.0);
        assert!(e.volume().is_finite());
    }

    #[test]
    fn sampled_points_lie_within_the_ellipsoid() {
        let points = array![[0.0, 0.0], [2.0, 0.0], [0.0, 2.0], [2.0, 2.0]];
        let mut e = Ellipsoid::from_points(points.view());
        e.enlarge_to_cover(1.0, points.view());
        e.enlarge(e.enlargement() * 1.2);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let x = e.sample_uniform(&mut rng);
            assert!(e.contains_value(&x) <= 1.0 + 1e-9);
        }
    }
}
