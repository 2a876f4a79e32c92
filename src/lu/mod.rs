//! # LU decomposition
//!
//! Blocked Crout elimination without pivoting. `L` carries the pivots on its diagonal,
//! `U` has a unit diagonal. Every `block` columns the accumulated panel product is
//! subtracted from the trailing submatrix (Schur complement update), so the
//! per-column recurrences only sum over the columns of the current block.

use crate::error::{check_non_empty, Result};
use log::{debug, warn};
use ndarray::{s, Array2, ArrayView2};

/// Exponent of the block size `round(n^LU_BLOCK_EXPONENT)`, tuned to balance
/// panel work against trailing updates.
pub const LU_BLOCK_EXPONENT: f64 = 0.5285;

/// Result of [`lu`]: lower-triangular `L` and upper-triangular `U` with `L·U ≈ X`.
#[derive(Debug, Clone)]
pub struct LU {
    l: Array2<f64>,
    u: Array2<f64>,
}

impl LU {
    pub fn l(&self) -> &Array2<f64> {
        &self.l
    }

    pub fn u(&self) -> &Array2<f64> {
        &self.u
    }

    pub fn into_parts(self) -> (Array2<f64>, Array2<f64>) {
        (self.l, self.u)
    }
}

pub(crate) fn block_size(n: usize) -> usize {
    ((n as f64).powf(LU_BLOCK_EXPONENT).round() as usize).max(1)
}

/// Factors `x` into `L·U` without pivoting.
///
/// For `m ≥ n`, `L` is `m×n` and `U` is `n×n` with unit diagonal. A wide matrix is
/// factored through its transpose, giving a unit-diagonal `m×m` `L` and an `m×n` `U`.
///
/// No pivoting is performed. A pivot that is exactly zero leaves the corresponding row
/// of `U` undivided instead of failing, so the factors of a singular (or leading-minor
/// singular) matrix do not reproduce it. The event is logged at `warn` level.
pub fn lu(x: ArrayView2<f64>) -> Result<LU> {
    let (m, n) = x.dim();
    check_non_empty(m, n)?;

    if m < n {
        let LU { l, u } = lu_tall(x.t());
        return Ok(LU {
            l: u.reversed_axes(),
            u: l.reversed_axes(),
        });
    }

    Ok(lu_tall(x))
}

fn lu_tall(x: ArrayView2<f64>) -> LU {
    let (m, n) = x.dim();
    let block = block_size(n);
    debug!("LU of {}x{} matrix with block size {}", m, n, block);

    let mut xv = x.to_owned();
    let mut l = Array2::<f64>::zeros((m, n));
    let mut u = Array2::<f64>::eye(n);
    let mut z = 0;

    for c in 0..n {
        for i in c..m {
            let mut acc = xv[[i, c]];
            for k in z..c {
                acc -= l[[i, k]] * u[[k, c]];
            }
            l[[i, c]] = acc;
        }

        let pivot = l[[c, c]];
        if pivot == 0.0 {
            warn!("LU: zero pivot in column {}, row of U left undivided", c);
        }
        for j in c + 1..n {
            let mut acc = xv[[c, j]];
            for k in z..c {
                acc -= l[[c, k]] * u[[k, j]];
            }
            u[[c, j]] = if pivot == 0.0 { acc } else { acc / pivot };
        }

        let next = c + 1;
        if next - z == block && next < n {
            let update = l
                .slice(s![next.., z..next])
                .dot(&u.slice(s![z..next, next..]));
            let mut trailing = xv.slice_mut(s![next.., next..]);
            trailing -= &update;
            z = next;
        }
    }

    LU { l, u }
}
