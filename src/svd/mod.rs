//! # Singular value decomposition
//!
//! - [`svd`]: exact SVD through bidiagonalization followed by zero-shift QR sweeps
//! - [`rsvd`]/[`RandomizedSvd`]: randomized low-rank approximation for large matrices

use ndarray::{Array1, Array2};

mod golub_kahan;
mod randomized;

pub use golub_kahan::{svd, vsweep, Sweep, DEFLATION_TOLERANCE, MAX_SWEEPS_PER_DIM_SQ};
pub use randomized::{rsvd, RandomizedSvd};

/// Singular triplets `X ≈ U·diag(s)·Vᵗ`, ordered by decreasing singular value.
#[derive(Debug, Clone)]
pub struct SVD {
    s: Array1<f64>,
    u: Array2<f64>,
    v: Array2<f64>,
}

impl SVD {
    pub(crate) fn new(s: Array1<f64>, u: Array2<f64>, v: Array2<f64>) -> Self {
        SVD { s, u, v }
    }

    /// Non-negative singular values, length `ncomp`.
    pub fn s(&self) -> &Array1<f64> {
        &self.s
    }

    /// Left singular vectors, `m×ncomp`.
    pub fn u(&self) -> &Array2<f64> {
        &self.u
    }

    /// Right singular vectors, `n×ncomp`.
    pub fn v(&self) -> &Array2<f64> {
        &self.v
    }

    pub fn ncomp(&self) -> usize {
        self.s.len()
    }

    /// Rank-`ncomp` reconstruction `U·diag(s)·Vᵗ`.
    pub fn reconstruct(&self) -> Array2<f64> {
        let s_diag = Array2::from_diag(&self.s);
        self.u.dot(&s_diag).dot(&self.v.t())
    }

    /// Swaps the roles of `U` and `V`, turning the SVD of `X` into the SVD of `Xᵗ`.
    pub(crate) fn transposed(self) -> Self {
        SVD {
            s: self.s,
            u: self.v,
            v: self.u,
        }
    }

    /// Returns `(s, U, V)`.
    pub fn into_parts(self) -> (Array1<f64>, Array2<f64>, Array2<f64>) {
        (self.s, self.u, self.v)
    }
}
