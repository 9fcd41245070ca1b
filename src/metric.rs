//! Distance metrics injected into the clusterer.

use ndarray::ArrayView1;

/// A narrow capability interface, not a wide trait hierarchy: the
/// clusterer only ever needs a distance between two points.
pub trait Metric: Send + Sync {
    fn distance(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Euclidean;

impl Metric for Euclidean {
    fn distance(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}

/// Mahalanobis distance against a fixed precision matrix (inverse
/// covariance), stored row-major via `nalgebra::DMatrix`.
#[derive(Debug, Clone)]
pub struct Mahalanobis {
    precision: nalgebra::DMatrix<f64>,
}

impl Mahalanobis {
    pub fn new(precision: nalgebra::DMatrix<f64>) -> Self {
        Mahalanobis { precision }
    }
}

impl Metric for Mahalanobis {
    fn distance(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        let d = a.len();
        let diff = nalgebra::DVector::from_iterator(d, a.iter().zip(b.iter()).map(|(x, y)| x - y));
        (diff.transpose() * &self.precision * &diff)[(0, 0)].max(0.0).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn euclidean_matches_hand_computation() {
        let a = array![0.0, 0.0];
        let b = array![3.0, 4.0];
        assert!((Euclidean.distance(a.view(), b.view()) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn mahalanobis_reduces_to_euclidean_under_identity() {
        let precision = nalgebra::DMatrix::identity(2, 2);
        let m = Mahalanobis::new(precision);
        let a = array![1.0, 2.0];
        let b = array![4.0, -2.0];
        let got = m.distance(a.view(), b.view());
        assert!((got - 5.0).abs() < 1e-12);
    }
}
