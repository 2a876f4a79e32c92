use super::SVD;
use crate::bidiag::bidiag_tall;
use crate::error::{check_components, check_non_empty, LinalgError, Result};
use crate::primitives::rot;
use crate::utils::rotate_columns;
use log::{debug, trace};
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};

/// Super-diagonal entries at or below this magnitude count as deflated.
pub const DEFLATION_TOLERANCE: f64 = 1e-64;

/// The sweep budget is `MAX_SWEEPS_PER_DIM_SQ * n²` for an `n`-column problem.
pub const MAX_SWEEPS_PER_DIM_SQ: usize = 500;

/// Outcome of one [`vsweep`] over a bidiagonal block.
///
/// With `B` the block before the sweep and `B'` the block built from `d`, `e`:
/// `B = pt·B'·gᵗ`.
#[derive(Debug, Clone)]
pub struct Sweep {
    pub d: Array1<f64>,
    pub e: Array1<f64>,
    /// Accumulated right rotations.
    pub g: Array2<f64>,
    /// Accumulated transposed left rotations.
    pub pt: Array2<f64>,
}

/// One zero-shift QR sweep over the upper-bidiagonal block with diagonal `d` and
/// super-diagonal `e`.
///
/// Each step computes a right rotation from the running diagonal entry and the
/// super-diagonal, then a left rotation that chases the created bulge back onto the
/// diagonal. Super-diagonal entries are written one step late. Without a shift every
/// rotation is computed to high relative accuracy, and a zero diagonal entry is
/// handled like any other.
///
/// The caller must pass a block whose neighbouring super-diagonal entries are already
/// negligible.
///
/// # Panics
/// If `e.len() + 1 != d.len()` for a non-empty `d`.
pub fn vsweep(d: ArrayView1<f64>, e: ArrayView1<f64>) -> Sweep {
    let n = d.len();
    assert_eq!(
        e.len() + 1,
        n.max(1),
        "super-diagonal must be one shorter than the diagonal"
    );

    let mut d = d.to_owned();
    let mut e = e.to_owned();
    let mut g = Array2::<f64>::eye(n);
    let mut pt = Array2::<f64>::eye(n);
    if n < 2 {
        return Sweep { d, e, g, pt };
    }

    let mut cs = 1.0;
    let mut oldcs = 1.0;
    let mut oldsn = 0.0;
    for i in 0..n - 1 {
        let (c, s, r) = rot(cs * d[i], e[i]);
        cs = c;
        if i > 0 {
            e[i - 1] = oldsn * r;
        }
        let (lc, ls, lr) = rot(oldcs * r, d[i + 1] * s);
        oldcs = lc;
        oldsn = ls;
        d[i] = lr;

        rotate_columns(&mut g, i, i + 1, c, s);
        rotate_columns(&mut pt, i, i + 1, lc, ls);
    }
    let h = d[n - 1] * cs;
    e[n - 2] = h * oldsn;
    d[n - 1] = h * oldcs;

    Sweep { d, e, g, pt }
}

/// Flushes super-diagonal entries that are negligible relative to their diagonal
/// neighbours.
fn flush_negligible(d: &Array1<f64>, e: &mut Array1<f64>) {
    for i in 0..e.len() {
        if e[i].abs() <= f64::EPSILON * (d[i].abs() + d[i + 1].abs()) {
            e[i] = 0.0;
        }
    }
}

/// Bottom-most run of non-deflated super-diagonal entries, as inclusive indices into `e`.
fn active_block(e: &Array1<f64>) -> Option<(usize, usize)> {
    let upper = (0..e.len())
        .rev()
        .find(|&i| e[i].abs() > DEFLATION_TOLERANCE)?;
    let mut lower = upper;
    while lower > 0 && e[lower - 1].abs() > DEFLATION_TOLERANCE {
        lower -= 1;
    }
    Some((lower, upper))
}

/// Singular value decomposition of `x`, truncated to the `ncomp` largest singular
/// values (all `min(m, n)` by default).
///
/// Wide matrices are decomposed through their transpose. Fails with
/// [`LinalgError::NoConvergence`] if the bidiagonal form has not deflated after
/// `MAX_SWEEPS_PER_DIM_SQ * min(m, n)²` sweeps.
///
/// The sweeps carry no shift, so their convergence rate is the ratio of neighbouring
/// singular values. Nearly equal but distinct singular values (relative gap around
/// `1e-10` or closer) can exhaust the budget, for example `[[1, 1e-10], [0, 1]]`.
/// Exactly equal values deflate normally.
pub fn svd(x: ArrayView2<f64>, ncomp: Option<usize>) -> Result<SVD> {
    let (m, n) = x.dim();
    check_non_empty(m, n)?;
    let max_components = m.min(n);
    let ncomp = ncomp.unwrap_or(max_components);
    check_components(ncomp, max_components)?;

    if m < n {
        return Ok(svd_tall(x.t(), ncomp)?.transposed());
    }
    svd_tall(x, ncomp)
}

fn svd_tall(x: ArrayView2<f64>, ncomp: usize) -> Result<SVD> {
    let (m, n) = x.dim();
    let bidiagonal = bidiag_tall(x);
    let (mut d, mut e) = bidiagonal.diagonals();
    let (_, v, u) = bidiagonal.into_parts();

    let mut gt = Array2::<f64>::eye(n);
    let mut p = Array2::<f64>::eye(n);
    let max_sweeps = MAX_SWEEPS_PER_DIM_SQ * n * n;
    let mut sweeps = 0;

    loop {
        flush_negligible(&d, &mut e);
        let Some((lower, upper)) = active_block(&e) else {
            break;
        };
        if sweeps == max_sweeps {
            return Err(LinalgError::NoConvergence { sweeps });
        }
        sweeps += 1;
        trace!("sweep {} over block {}..={}", sweeps, lower, upper + 1);

        let sweep = vsweep(
            d.slice(s![lower..=upper + 1]),
            e.slice(s![lower..=upper]),
        );
        d.slice_mut(s![lower..=upper + 1]).assign(&sweep.d);
        e.slice_mut(s![lower..=upper]).assign(&sweep.e);

        let rotated = gt.slice(s![.., lower..=upper + 1]).dot(&sweep.g);
        gt.slice_mut(s![.., lower..=upper + 1]).assign(&rotated);
        let rotated = p.slice(s![.., lower..=upper + 1]).dot(&sweep.pt);
        p.slice_mut(s![.., lower..=upper + 1]).assign(&rotated);
    }
    debug!("SVD of {}x{} matrix deflated after {} sweeps", m, n, sweeps);

    let u_full = u.dot(&p);
    let v_full = v.dot(&gt);

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| d[b].abs().total_cmp(&d[a].abs()));

    let mut s_out = Array1::<f64>::zeros(ncomp);
    let mut u_out = Array2::<f64>::zeros((m, ncomp));
    let mut v_out = Array2::<f64>::zeros((n, ncomp));
    for (k, &idx) in order.iter().take(ncomp).enumerate() {
        s_out[k] = d[idx].abs();
        u_out
            .column_mut(k)
            .assign(&(&u_full.column(idx) * d[idx].signum()));
        v_out.column_mut(k).assign(&v_full.column(idx));
    }

    Ok(SVD::new(s_out, u_out, v_out))
}
