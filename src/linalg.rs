//! Dense-matrix helpers shared by the clusterer and ellipsoid geometry.
//!
//! Live points are stored contiguously, row-major, in `ndarray::Array2`
//! (following the design note that large matrix storage should use a
//! contiguous row-major 2-D array type"). Eigendecomposition is delegated
//! to `nalgebra::SymmetricEigen`, which ndarray alone does not provide
//! without a BLAS/LAPACK backend.

use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array1, Array2, ArrayView2};

/// Floor applied to eigenvalues of a covariance matrix that is singular or
/// near-singular: its minimal eigenvalue is inflated to a floor.
pub const EIGENVALUE_FLOOR: f64 = 1e-12;

/// Sample mean and unbiased (n-1 denominator) sample covariance of the rows
/// of `points`.
pub fn mean_and_covariance(points: ArrayView2<f64>) -> (Array1<f64>, Array2<f64>) {
    let n = points.nrows();
    let d = points.ncols();
    let mean = points.mean_axis(ndarray::Axis(0)).expect("non-empty cluster");

    let mut cov = Array2::<f64>::zeros((d, d));
    if n < 2 {
        return (mean, cov);
    }
    for row in points.rows() {
        let centered = &row - &mean;
        for i in 0..d {
            for j in 0..d {
                cov[[i, j]] += centered[i] * centered[j];
            }
        }
    }
    cov /= (n - 1) as f64;
    (mean, cov)
}

/// Eigendecomposition of a symmetric matrix. The matrix is symmetrized
/// before decomposition to absorb floating-point asymmetry
/// accumulated during covariance accumulation.
///
/// Returns `(eigenvalues, eigenvectors)` where eigenvectors are columns of
/// the returned matrix, ordered to match `eigenvalues`. Any eigenvalue
/// below [`EIGENVALUE_FLOOR`] is clamped up to the floor.
pub fn symmetric_eigen(matrix: &Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let d = matrix.nrows();
    let symmetrized = {
        let mut m = matrix.clone();
        for i in 0..d {
            for j in (i + 1)..d {
                let avg = 0.5 * (m[[i, j]] + m[[j, i]]);
                m[[i, j]] = avg;
                m[[j, i]] = avg;
            }
        }
        m
    };

    let dm = DMatrix::from_fn(d, d, |i, j| symmetrized[[i, j]]);
    let eigen = SymmetricEigen::new(dm);

    let mut eigenvalues = Array1::<f64>::zeros(d);
    let mut eigenvectors = Array2::<f64>::zeros((d, d));
    for i in 0..d {
        eigenvalues[i] = eigen.eigenvalues[i].max(EIGENVALUE_FLOOR);
        for j in 0..d {
            eigenvectors[[j, i]] = eigen.eigenvectors[(j, i)];
        }
    }
    (eigenvalues, eigenvectors)
}

/// Selects a subset of rows (by index) out of a matrix, for gathering one
/// cluster's points out of the full live-point matrix.
pub fn select_rows(points: ArrayView2<f64>, indices: &[usize]) -> Array2<f64> {
    let d = points.ncols();
    let mut out = Array2::<f64>::zeros((indices.len(), d));
    for (mut out_row, &idx) in out.axis_iter_mut(ndarray::Axis(0)).zip(indices.iter()) {
        out_row.assign(&points.row(idx));
    }
    out
}

/// Mahalanobis-squared distance `(x-c)^T Sigma^{-1} (x-c)` computed from a
/// cached eigendecomposition: `Sigma^{-1} = Q diag(1/lambda) Q^T`.
pub fn mahalanobis_sq(
    x: &Array1<f64>,
    center: &Array1<f64>,
    eigenvalues: &Array1<f64>,
    eigenvectors: &Array2<f64>,
) -> f64 {
    let diff = x - center;
    // y = Q^T diff, projecting the offset onto the eigenbasis.
    let d = diff.len();
    let mut acc = 0.0;
    for k in 0..d {
        let mut y_k = 0.0;
        for i in 0..d {
            y_k += eigenvectors[[i, k]] * diff[i];
        }
        acc += y_k * y_k / eigenvalues[k];
    }
    acc
}
