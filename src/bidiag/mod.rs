//! # Bidiagonalization
//!
//! Golub–Kahan reduction `B = Uᵗ·A·V` through alternating left and right Householder
//! reflections. The reflectors are applied as rank-one updates and never materialized.

use crate::error::{check_non_empty, Result};
use crate::primitives::householderv;
use ndarray::{s, Array1, Array2, ArrayView2, Axis};

/// Result of [`bidiag`]: `B` bidiagonal, `U` and `V` with orthonormal columns and
/// `U·B·Vᵗ ≈ A`.
#[derive(Debug, Clone)]
pub struct Bidiagonal {
    b: Array2<f64>,
    v: Array2<f64>,
    u: Array2<f64>,
    upper: bool,
}

impl Bidiagonal {
    /// `k×k` bidiagonal factor, `k = min(m, n)`.
    pub fn b(&self) -> &Array2<f64> {
        &self.b
    }

    pub fn v(&self) -> &Array2<f64> {
        &self.v
    }

    pub fn u(&self) -> &Array2<f64> {
        &self.u
    }

    /// `true` if `B` is upper bidiagonal (inputs with `m ≥ n`), `false` if it is lower
    /// bidiagonal (wide inputs, reduced through the transpose).
    pub fn is_upper(&self) -> bool {
        self.upper
    }

    /// Main diagonal and the non-zero off-diagonal of `B`.
    pub fn diagonals(&self) -> (Array1<f64>, Array1<f64>) {
        let k = self.b.nrows();
        let d = self.b.diag().to_owned();
        let e = if self.upper {
            self.b.slice(s![..k - 1, 1..]).diag().to_owned()
        } else {
            self.b.slice(s![1.., ..k - 1]).diag().to_owned()
        };
        (d, e)
    }

    /// Returns `(B, V, U)`.
    pub fn into_parts(self) -> (Array2<f64>, Array2<f64>, Array2<f64>) {
        (self.b, self.v, self.u)
    }
}

/// Reduces `a` to bidiagonal form.
///
/// For `m ≥ n`, `B` is `n×n` upper bidiagonal, `V` is `n×n` and `U` is `m×n`. A wide
/// matrix is reduced through its transpose: `B` is then lower bidiagonal, `U` is `m×m`
/// and `V` is `n×m`.
pub fn bidiag(a: ArrayView2<f64>) -> Result<Bidiagonal> {
    let (m, n) = a.dim();
    check_non_empty(m, n)?;

    if m < n {
        let Bidiagonal { b, v, u, .. } = bidiag_tall(a.t());
        return Ok(Bidiagonal {
            b: b.reversed_axes(),
            v: u,
            u: v,
            upper: false,
        });
    }

    Ok(bidiag_tall(a))
}

pub(crate) fn bidiag_tall(a: ArrayView2<f64>) -> Bidiagonal {
    let (m, n) = a.dim();
    let mut b = a.to_owned();
    let mut ut = Array2::<f64>::eye(m);
    let mut v = Array2::<f64>::eye(n);

    // a square matrix has nothing below the last diagonal entry
    let steps = if m > n { n } else { n - 1 };

    for k in 0..steps {
        let h = householderv(&b.column(k), k);
        reflect_rows(&mut b, &h, k, k);
        reflect_rows(&mut ut, &h, k, 0);

        if k + 2 < n {
            let g = householderv(&b.row(k), k + 1);
            reflect_columns(&mut b, &g, k + 1, k);
            reflect_columns(&mut v, &g, k + 1, 0);
        }
    }

    Bidiagonal {
        b: b.slice(s![..n, ..]).to_owned(),
        v,
        u: ut.slice(s![..n, ..]).t().to_owned(),
        upper: true,
    }
}

/// `M[start.., from..] <- (I - 2hhᵗ)·M[start.., from..]`
fn reflect_rows(matrix: &mut Array2<f64>, h: &Array1<f64>, start: usize, from: usize) {
    let mut block = matrix.slice_mut(s![start.., from..]);
    let projection = h.dot(&block);
    for (i, mut row) in block.axis_iter_mut(Axis(0)).enumerate() {
        row.scaled_add(-2.0 * h[i], &projection);
    }
}

/// `M[from.., start..] <- M[from.., start..]·(I - 2hhᵗ)`
fn reflect_columns(matrix: &mut Array2<f64>, h: &Array1<f64>, start: usize, from: usize) {
    let mut block = matrix.slice_mut(s![from.., start..]);
    let projection = block.dot(h);
    for (j, mut column) in block.axis_iter_mut(Axis(1)).enumerate() {
        column.scaled_add(-2.0 * h[j], &projection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LinalgError;
    use crate::utils::testing::{max_abs_diff, orthonormality_error, random_matrix};
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn off_bidiagonal_max(b: &Array2<f64>, upper: bool) -> f64 {
        b.indexed_iter()
            .filter(|((i, j), _)| {
                if upper {
                    *j != *i && *j != *i + 1
                } else {
                    *i != *j && *i != *j + 1
                }
            })
            .map(|(_, v)| v.abs())
            .fold(0.0, f64::max)
    }

    fn check_bidiag(a: &Array2<f64>) -> Bidiagonal {
        let (m, n) = a.dim();
        let k = m.min(n);
        let decomp = bidiag(a.view()).unwrap();
        assert_eq!(decomp.b().dim(), (k, k));
        assert_eq!(decomp.u().dim(), (m, k));
        assert_eq!(decomp.v().dim(), (n, k));
        assert_eq!(decomp.is_upper(), m >= n);

        let product = decomp.u().dot(decomp.b()).dot(&decomp.v().t());
        assert!(max_abs_diff(product.view(), a.view()) < 1e-9);
        assert!(orthonormality_error(decomp.u().view()) < 1e-12);
        assert!(orthonormality_error(decomp.v().view()) < 1e-12);
        assert!(off_bidiagonal_max(decomp.b(), decomp.is_upper()) < 1e-9);
        decomp
    }

    #[test]
    fn test_bidiag_square() {
        check_bidiag(&random_matrix(6, 6, 11));
        check_bidiag(&random_matrix(2, 2, 12));
        check_bidiag(&random_matrix(1, 1, 13));
    }

    #[test]
    fn test_bidiag_tall() {
        check_bidiag(&random_matrix(10, 4, 14));
        check_bidiag(&random_matrix(7, 1, 15));
        check_bidiag(&random_matrix(3, 2, 16));
    }

    #[test]
    fn test_bidiag_wide() {
        let decomp = check_bidiag(&random_matrix(3, 8, 17));
        assert!(!decomp.is_upper());
    }

    #[test]
    fn test_bidiag_diagonals() {
        let a = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let decomp = check_bidiag(&a);
        let (d, e) = decomp.diagonals();
        assert_eq!(d.len(), 2);
        assert_eq!(e.len(), 1);

        // |d0| is the norm of the first column, and BᵗB shares AᵗA's trace
        assert_abs_diff_eq!(d[0].abs(), 35.0f64.sqrt(), epsilon = 1e-12);
        let trace = d.dot(&d) + e.dot(&e);
        assert_abs_diff_eq!(trace, 91.0, epsilon = 1e-10);
    }

    #[test]
    fn test_bidiag_small_scale() {
        let a = random_matrix(5, 3, 18);
        let tiny = &a * 1e-18;
        let decomp = bidiag(tiny.view()).unwrap();
        assert!(orthonormality_error(decomp.u().view()) < 1e-12);
        assert!(orthonormality_error(decomp.v().view()) < 1e-12);

        let b = decomp.b() * 1e18;
        assert!(off_bidiagonal_max(&b, true) < 1e-9);
        let product = decomp.u().dot(&b).dot(&decomp.v().t());
        assert!(max_abs_diff(product.view(), a.view()) < 1e-9);
    }

    #[test]
    fn test_bidiag_empty() {
        let a = Array2::<f64>::zeros((0, 0));
        assert_eq!(
            bidiag(a.view()).unwrap_err(),
            LinalgError::EmptyMatrix { rows: 0, cols: 0 }
        );
    }
}
