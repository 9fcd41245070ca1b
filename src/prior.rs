//! Prior contract and a box-uniform implementation used by
//! the tests and the demo binary.

use ndarray::Array1;

/// `fromUnit`/`toUnit`/`logPdf` over the unit hypercube. Implementations
/// must be separable per dimension or the unit-space ellipsoid geometry
/// loses its meaning; that separability is a contract
/// obligation on implementors, not something this trait can enforce.
pub trait Prior: Send + Sync {
    fn dim(&self) -> usize;
    fn from_unit(&self, u: &Array1<f64>) -> Array1<f64>;
    fn to_unit(&self, theta: &Array1<f64>) -> Array1<f64>;
    fn log_pdf(&self, theta: &Array1<f64>) -> f64;
}

/// A separable uniform prior over a per-dimension bounded box
/// `[lower_i, upper_i]`. `fromUnit`/`toUnit` are the trivial affine maps
/// the canonical case for a separable box prior.
#[derive(Debug, Clone)]
pub struct BoxUniformPrior {
    pub lower: Array1<f64>,
    pub upper: Array1<f64>,
}

impl BoxUniformPrior {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Self {
        assert_eq!(lower.len(), upper.len());
        assert!(lower.iter().zip(upper.iter()).all(|(l, u)| l < u));
        BoxUniformPrior {
            lower: Array1::from(lower),
            upper: Array1::from(upper),
        }
    }

    pub fn symmetric(dim: usize, half_width: f64) -> Self {
        BoxUniformPrior::new(vec![-half_width; dim], vec![half_width; dim])
    }
}

impl Prior for BoxUniformPrior {
    fn dim(&self) -> usize {
        self.lower.len()
    }

    fn from_unit(&self, u: &Array1<f64>) -> Array1<f64> {
        &self.lower + &(u * &(&self.upper - &self.lower))
    }

    fn to_unit(&self, theta: &Array1<f64>) -> Array1<f64> {
        (theta - &self.lower) / (&self.upper - &self.lower)
    }

    fn log_pdf(&self, theta: &Array1<f64>) -> f64 {
        let inside = theta
            .iter()
            .zip(self.lower.iter())
            .zip(self.upper.iter())
            .all(|((t, l), u)| *t >= *l && *t <= *u);
        if !inside {
            return f64::NEG_INFINITY;
        }
        let log_vol: f64 = self
            .upper
            .iter()
            .zip(self.lower.iter())
            .map(|(u, l)| (u - l).ln())
            .sum();
        -log_vol
    }
}
