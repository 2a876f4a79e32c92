//! # QR decomposition
//!
//! Givens-rotation QR. Sub-diagonal entries are eliminated column by column from the
//! bottom row upwards, each rotation touching only two adjacent rows, so entries
//! zeroed earlier stay exactly zero.

use crate::error::{check_non_empty, Result};
use crate::primitives::rot;
use crate::utils::{rotate_columns, rotate_rows};
use ndarray::{s, Array2, ArrayView2};

/// Result of [`qr`]: `Q` with orthonormal columns and upper-triangular (trapezoidal
/// for wide inputs) `R` with `Q·R ≈ X`.
#[derive(Debug, Clone)]
pub struct QR {
    q: Array2<f64>,
    r: Array2<f64>,
}

impl QR {
    /// `m×min(m,n)` factor with orthonormal columns.
    pub fn q(&self) -> &Array2<f64> {
        &self.q
    }

    /// `min(m,n)×n` upper-triangular factor.
    pub fn r(&self) -> &Array2<f64> {
        &self.r
    }

    pub fn into_parts(self) -> (Array2<f64>, Array2<f64>) {
        (self.q, self.r)
    }
}

/// Factors `x` into `Q·R`.
///
/// For a wide matrix (`m < n`) `Q` is taken from the QR of the leading `m` columns and
/// `R = Qᵗ·X`. This is a valid factorization but not the only one.
pub fn qr(x: ArrayView2<f64>) -> Result<QR> {
    let (m, n) = x.dim();
    check_non_empty(m, n)?;

    if m < n {
        let QR { q, r: leading } = qr_tall(x.slice(s![.., ..m]));
        let mut r = q.t().dot(&x);
        // keep the exact zeros of the square block
        r.slice_mut(s![.., ..m]).assign(&leading);
        return Ok(QR { q, r });
    }

    Ok(qr_tall(x))
}

fn qr_tall(x: ArrayView2<f64>) -> QR {
    let (m, n) = x.dim();
    let mut q = Array2::<f64>::eye(m);
    let mut r = x.to_owned();

    for j in 0..n {
        for i in (j + 1..m).rev() {
            let (c, s, norm) = rot(r[[i - 1, j]], r[[i, j]]);
            rotate_rows(&mut r, i - 1, i, c, s, j + 1);
            r[[i - 1, j]] = norm;
            r[[i, j]] = 0.0;
            rotate_columns(&mut q, i - 1, i, c, s);
        }
    }

    if m == n {
        return QR { q, r };
    }

    QR {
        q: q.slice(s![.., ..n]).to_owned(),
        r: r.slice(s![..n, ..]).to_owned(),
    }
}
