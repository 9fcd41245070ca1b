//! Worked-example log-likelihoods used by the end-to-end tests and the
//! demo binary. These are ambient scaffolding, not part of the core
//! sampler, but unlike a throwaway example they are actually exercised
//! by tests.

use ndarray::Array1;
use statrs::distribution::{Continuous, Normal};

/// Isotropic Gaussian centered at the origin with standard deviation
/// `sigma` in every dimension.
pub fn gaussian_log_likelihood(sigma: f64) -> impl Fn(&Array1<f64>) -> f64 + Sync + Send {
    move |theta: &Array1<f64>| {
        let normal = Normal::new(0.0, sigma).expect("sigma must be positive");
        theta.iter().map(|&x| normal.ln_pdf(x)).sum()
    }
}

/// The Himmelblau function's four minima induce four likelihood modes:
/// `L = exp(-f(x,y)/2)`.
pub fn himmelblau_log_likelihood(theta: &Array1<f64>) -> f64 {
    let x = theta[0];
    let y = theta[1];
    let a = x * x + y - 11.0;
    let b = x + y * y - 7.0;
    let f = a * a + b * b;
    -0.5 * f
}

/// The "eggbox" likelihood, highly multimodal over
/// `[0, 10*pi]^2`.
pub fn eggbox_log_likelihood(theta: &Array1<f64>) -> f64 {
    let x = theta[0];
    let y = theta[1];
    let term = 2.0 + (x / 2.0).cos() * (y / 2.0).cos();
    5.0 * term.ln()
}

/// Constant log-likelihood, used for the flat-likelihood boundary scenario
/// where the evidence should converge to logZ = 0.
pub fn flat_log_likelihood(_theta: &Array1<f64>) -> f64 {
    0.0
}

/// A likelihood that is `-inf` almost everywhere, used for the
/// `DrawExhausted` smoke test: only a tiny ball
/// around the origin is feasible.
pub fn needle_in_haystack_log_likelihood(radius: f64) -> impl Fn(&Array1<f64>) -> f64 + Sync + Send {
    let radius = radius.abs();
    move |theta: &Array1<f64>| {
        let r2: f64 = theta.iter().map(|&v| v * v).sum();
        if r2.sqrt() <= radius {
            0.0
        } else {
            f64::NEG_INFINITY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn gaussian_peaks_at_origin() {
        let log_l = gaussian_log_likelihood(1.0);
        assert!(log_l(&array![0.0, 0.0]) > log_l(&array![1.0, 1.0]));
    }

    #[test]
    fn himmelblau_is_near_zero_at_a_known_minimum() {
        let log_l = himmelblau_log_likelihood(&array![3.0, 2.0]);
        assert!(log_l > -0.1);
    }

    #[test]
    fn eggbox_is_maximal_where_cosines_align() {
        let peak = eggbox_log_likelihood(&array![0.0, 0.0]);
        let trough = eggbox_log_likelihood(&array![std::f64::consts::PI, std::f64::consts::PI]);
        assert!(peak > trough);
    }

    #[test]
    fn needle_rejects_outside_the_ball() {
        let log_l = needle_in_haystack_log_likelihood(0.01);
        assert_eq!(log_l(&array![1.0, 1.0]), f64::NEG_INFINITY);
        assert_eq!(log_l(&array![0.0, 0.0]), 0.0);
    }
}
