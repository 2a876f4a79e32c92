//! # Matrix inverse
//!
//! Structure-aware inversion: diagonal and triangular matrices are inverted directly,
//! anything else goes through the QR factorization (`X⁻¹ = R⁻¹·Qᵗ`).

use crate::error::{check_non_empty, LinalgError, Result};
use crate::qr::qr;
use crate::utils::{MatrixStructure, Triangle};
use log::trace;
use ndarray::{Array2, ArrayBase, ArrayView2, Data, Ix2};

/// Inverse of a square matrix.
///
/// # Errors
/// - [`LinalgError::EmptyMatrix`] for a matrix without entries
/// - [`LinalgError::NotSquare`] if `x` is not square
/// - [`LinalgError::Singular`] if an exact zero appears on the diagonal of `x` (diagonal
///   and triangular inputs) or of `R` (general inputs)
pub fn inv(x: ArrayView2<f64>) -> Result<Array2<f64>> {
    let (m, n) = x.dim();
    check_non_empty(m, n)?;
    if m != n {
        return Err(LinalgError::NotSquare { rows: m, cols: n });
    }

    if x.is_diagonal() {
        trace!("Inverting {}x{} diagonal matrix", n, n);
        check_regular(&x)?;
        return Ok(Array2::from_diag(&x.diag().mapv(f64::recip)));
    }
    if x.is_upper_triangular() {
        trace!("Inverting {}x{} upper triangular matrix", n, n);
        check_regular(&x)?;
        return Ok(triangular_inverse(x, Triangle::Upper));
    }
    if x.is_lower_triangular() {
        trace!("Inverting {}x{} lower triangular matrix", n, n);
        check_regular(&x)?;
        return Ok(triangular_inverse(x, Triangle::Lower));
    }

    trace!("Inverting {}x{} matrix through QR", n, n);
    let (q, r) = qr(x)?.into_parts();
    check_regular(&r)?;
    let r_inv = triangular_inverse(r.view(), Triangle::Upper);
    Ok(r_inv.dot(&q.t()))
}

fn check_regular<S>(x: &ArrayBase<S, Ix2>) -> Result<()>
where
    S: Data<Elem = f64>,
{
    // entry-wise: the diagonal product underflows for large well-conditioned matrices
    if x.diag().iter().any(|&value| value == 0.0) {
        return Err(LinalgError::Singular);
    }
    Ok(())
}

/// Inverts a triangular matrix with non-zero diagonal, one column of the identity at a
/// time. Upper matrices use back substitution, lower ones forward substitution.
fn triangular_inverse(t: ArrayView2<f64>, triangle: Triangle) -> Array2<f64> {
    let n = t.nrows();
    let mut out = Array2::<f64>::zeros((n, n));

    for col in 0..n {
        match triangle {
            Triangle::Upper => {
                for i in (0..=col).rev() {
                    let mut acc = if i == col { 1.0 } else { 0.0 };
                    for k in i + 1..=col {
                        acc -= t[[i, k]] * out[[k, col]];
                    }
                    out[[i, col]] = acc / t[[i, i]];
                }
            }
            Triangle::Lower => {
                for i in col..n {
                    let mut acc = if i == col { 1.0 } else { 0.0 };
                    for k in col..i {
                        acc -= t[[i, k]] * out[[k, col]];
                    }
                    out[[i, col]] = acc / t[[i, i]];
                }
            }
        }
    }
    out
}

/// Extension trait exposing [`inv`] as a method on dense matrices.
pub trait Inverse {
    fn inv(&self) -> Result<Array2<f64>>;
}

impl<S> Inverse for ArrayBase<S, Ix2>
where
    S: Data<Elem = f64>,
{
    fn inv(&self) -> Result<Array2<f64>> {
        inv(self.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::{max_abs_diff, off_triangle_max, random_matrix};
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn check_inverse(x: &Array2<f64>, tol: f64) -> Array2<f64> {
        let inverse = x.inv().unwrap();
        let eye = Array2::<f64>::eye(x.nrows());
        assert!(max_abs_diff(x.dot(&inverse).view(), eye.view()) < tol);
        assert!(max_abs_diff(inverse.dot(x).view(), eye.view()) < tol);
        inverse
    }

    #[test]
    fn test_inv_diagonal() {
        let x = array![[2.0, 0.0, 0.0], [0.0, -4.0, 0.0], [0.0, 0.0, 0.5]];
        let inverse = check_inverse(&x, 1e-15);
        assert_eq!(inverse, array![[0.5, 0.0, 0.0], [0.0, -0.25, 0.0], [0.0, 0.0, 2.0]]);
    }

    #[test]
    fn test_inv_upper_triangular() {
        let x = array![[2.0, 1.0, -1.0], [0.0, 3.0, 2.0], [0.0, 0.0, 4.0]];
        let inverse = check_inverse(&x, 1e-14);
        assert_eq!(off_triangle_max(inverse.view(), true), 0.0);
        assert_abs_diff_eq!(inverse[[0, 1]], -1.0 / 6.0, epsilon = 1e-15);
    }

    #[test]
    fn test_inv_lower_triangular() {
        let x = array![[1.0, 0.0, 0.0], [2.0, 1.0, 0.0], [3.0, -1.0, 5.0]];
        let inverse = check_inverse(&x, 1e-14);
        assert_eq!(off_triangle_max(inverse.view(), false), 0.0);
        assert_abs_diff_eq!(inverse[[1, 0]], -2.0, epsilon = 1e-15);
    }

    #[test]
    fn test_inv_general() {
        let x = array![[4.0, 7.0], [2.0, 6.0]];
        let inverse = check_inverse(&x, 1e-14);
        let expected = array![[0.6, -0.7], [-0.2, 0.4]];
        assert!(max_abs_diff(inverse.view(), expected.view()) < 1e-14);

        let x = random_matrix(12, 12, 51);
        check_inverse(&x, 1e-10);
    }

    #[test]
    fn test_inv_small_diagonal_is_regular() {
        let x = Array2::<f64>::eye(200) * 0.01;
        assert_eq!(x.diagonal_product(), 0.0);
        let inverse = check_inverse(&x, 1e-12);
        assert_abs_diff_eq!(inverse[[199, 199]], 100.0, epsilon = 1e-12);

        let mut lower = Array2::<f64>::eye(200) * 0.01;
        for i in 1..200 {
            lower[[i, i - 1]] = 0.005;
        }
        assert!(lower.is_lower_triangular());
        let inverse = check_inverse(&lower, 1e-9);
        assert_eq!(off_triangle_max(inverse.view(), false), 0.0);

        let upper = lower.t().to_owned();
        check_inverse(&upper, 1e-9);
    }

    #[test]
    fn test_inv_one_by_one() {
        let x = array![[8.0]];
        assert_eq!(inv(x.view()).unwrap(), array![[0.125]]);
        assert_eq!(inv(array![[0.0]].view()), Err(LinalgError::Singular));
    }

    #[test]
    fn test_inv_errors() {
        let wide = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        assert_eq!(
            inv(wide.view()),
            Err(LinalgError::NotSquare { rows: 2, cols: 3 })
        );

        let diag = array![[1.0, 0.0], [0.0, 0.0]];
        assert_eq!(inv(diag.view()), Err(LinalgError::Singular));

        let upper = array![[1.0, 5.0], [0.0, 0.0]];
        assert_eq!(upper.inv(), Err(LinalgError::Singular));

        // rank one, R ends up with an exact zero pivot
        let rank_one = array![[1.0, 2.0], [2.0, 4.0]];
        assert_eq!(inv(rank_one.view()), Err(LinalgError::Singular));

        let empty = Array2::<f64>::zeros((0, 0));
        assert!(matches!(
            inv(empty.view()),
            Err(LinalgError::EmptyMatrix { .. })
        ));
    }
}
