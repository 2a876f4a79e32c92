use super::{svd, SVD};
use crate::error::{check_components, check_non_empty, check_range, Result};
use crate::lu::lu;
use crate::qr::qr;
use log::debug;
use ndarray::{Array2, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Randomized SVD builder.
///
/// Approximates the leading `ncomp` singular triplets: the matrix is sketched with a
/// random `n×l` projection (`l = round(pa·ncomp + pb)`), the range estimate is refined
/// by `its` power iterations and an exact SVD of the small projected matrix is lifted
/// back. Power iterations re-orthonormalize through LU, which is cheaper than QR; the
/// last one uses QR so the final basis is orthonormal.
///
/// The sketch is drawn uniformly from `[-1, 1)` with a seeded ChaCha generator, so
/// results are reproducible for a fixed seed.
///
/// ```ignore
/// let svd = RandomizedSvd::new()
///     .ncomp(10)
///     .oversampling(1.0, 10.0)
///     .power_iterations(3)
///     .seed(7)
///     .compute(x.view())?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RandomizedSvd {
    ncomp: Option<usize>,
    oversampling_factor: f64,
    oversampling_offset: f64,
    power_iterations: usize,
    seed: u64,
}

impl Default for RandomizedSvd {
    fn default() -> Self {
        Self {
            ncomp: None,
            oversampling_factor: 1.0,
            oversampling_offset: 10.0,
            power_iterations: 3,
            seed: 42,
        }
    }
}

impl RandomizedSvd {
    /// Creates a builder with default parameters.
    ///
    /// Default values:
    /// - `ncomp`: `round(min(m - 1, n) / 1.5)`
    /// - oversampling: `pa = 1`, `pb = 10`
    /// - `power_iterations`: 3
    /// - `seed`: 42
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ncomp(mut self, ncomp: usize) -> Self {
        self.ncomp = Some(ncomp);
        self
    }

    /// Sketch width `round(factor·ncomp + offset)`, with `factor ∈ [1, 5]` and
    /// `offset ∈ [1, 100]`. The width is capped at `min(m, n)`.
    pub fn oversampling(mut self, factor: f64, offset: f64) -> Self {
        self.oversampling_factor = factor;
        self.oversampling_offset = offset;
        self
    }

    /// Number of power iterations, within `[1, 10]`.
    pub fn power_iterations(mut self, its: usize) -> Self {
        self.power_iterations = its;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self) -> Result<()> {
        check_range("pa", self.oversampling_factor, 1.0, 5.0)?;
        check_range("pb", self.oversampling_offset, 1.0, 100.0)?;
        check_range("its", self.power_iterations as f64, 1.0, 10.0)
    }

    pub fn compute(&self, x: ArrayView2<f64>) -> Result<SVD> {
        let (m, n) = x.dim();
        check_non_empty(m, n)?;
        self.validate()?;

        let ncomp = self.ncomp.unwrap_or_else(|| default_components(m, n));
        check_components(ncomp, m.min(n))?;

        if m < n {
            return Ok(self.compute_tall(x.t(), ncomp)?.transposed());
        }
        self.compute_tall(x, ncomp)
    }

    fn compute_tall(&self, x: ArrayView2<f64>, ncomp: usize) -> Result<SVD> {
        let (m, n) = x.dim();
        let width = (self.oversampling_factor * ncomp as f64 + self.oversampling_offset).round()
            as usize;
        let width = width.clamp(ncomp, n);
        debug!(
            "Randomized SVD of {}x{} matrix: ncomp={}, sketch width={}, power iterations={}",
            m, n, ncomp, width, self.power_iterations
        );

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let omega = Array2::<f64>::from_shape_fn((n, width), |_| rng.random_range(-1.0..1.0));

        let (mut q, _) = qr(x.dot(&omega).view())?.into_parts();
        for it in 0..self.power_iterations {
            let (l, _) = lu(x.t().dot(&q).view())?.into_parts();
            let y = x.dot(&l);
            q = if it + 1 < self.power_iterations {
                lu(y.view())?.into_parts().0
            } else {
                qr(y.view())?.into_parts().0
            };
        }

        let projected = q.t().dot(&x);
        let (s, u, v) = svd(projected.view(), Some(ncomp))?.into_parts();
        Ok(SVD::new(s, q.dot(&u), v))
    }
}

fn default_components(m: usize, n: usize) -> usize {
    let limit = (m - 1).min(n) as f64;
    ((limit / 1.5).round() as usize).max(1)
}

/// Randomized SVD with optional parameters, see [`RandomizedSvd`] for their meaning
/// and defaults.
pub fn rsvd(
    x: ArrayView2<f64>,
    ncomp: Option<usize>,
    pa: Option<f64>,
    pb: Option<f64>,
    its: Option<usize>,
) -> Result<SVD> {
    let defaults = RandomizedSvd::default();
    let mut builder = RandomizedSvd::new()
        .oversampling(
            pa.unwrap_or(defaults.oversampling_factor),
            pb.unwrap_or(defaults.oversampling_offset),
        )
        .power_iterations(its.unwrap_or(defaults.power_iterations));
    if let Some(ncomp) = ncomp {
        builder = builder.ncomp(ncomp);
    }
    builder.compute(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LinalgError;
    use crate::utils::testing::{
        init_logging, low_rank_matrix, max_abs_diff, orthonormality_error, random_matrix,
    };
    use approx::assert_relative_eq;

    fn frobenius(a: ArrayView2<f64>) -> f64 {
        a.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    fn reconstruction_error(x: &Array2<f64>, svd: &SVD) -> f64 {
        frobenius((x - &svd.reconstruct()).view())
    }

    #[test]
    fn test_rsvd_low_rank_is_exact() {
        init_logging();
        let x = low_rank_matrix(40, 20, 3, 31);
        let approx = rsvd(x.view(), Some(3), None, None, None).unwrap();
        let exact = svd(x.view(), Some(3)).unwrap();

        assert_eq!(approx.u().dim(), (40, 3));
        assert_eq!(approx.v().dim(), (20, 3));
        for k in 0..3 {
            assert_relative_eq!(approx.s()[k], exact.s()[k], max_relative = 1e-8);
        }
        assert!(orthonormality_error(approx.u().view()) < 1e-9);
        assert!(orthonormality_error(approx.v().view()) < 1e-9);
        assert!(max_abs_diff(approx.reconstruct().view(), x.view()) < 1e-6);
    }

    #[test]
    fn test_rsvd_wide_matrix() {
        let x = low_rank_matrix(15, 35, 4, 32);
        let approx = RandomizedSvd::new().ncomp(4).compute(x.view()).unwrap();
        assert_eq!(approx.u().dim(), (15, 4));
        assert_eq!(approx.v().dim(), (35, 4));
        assert!(max_abs_diff(approx.reconstruct().view(), x.view()) < 1e-6);
    }

    #[test]
    fn test_rsvd_matches_exact_leading_values() {
        let x = low_rank_matrix(30, 20, 20, 33);
        let approx = rsvd(x.view(), Some(3), None, None, None).unwrap();
        let exact = svd(x.view(), Some(3)).unwrap();
        for k in 0..3 {
            assert_relative_eq!(approx.s()[k], exact.s()[k], max_relative = 1e-4);
        }
        let optimal = reconstruction_error(&x, &exact);
        assert_relative_eq!(reconstruction_error(&x, &approx), optimal, max_relative = 1e-4);
    }

    #[test]
    fn test_rsvd_more_work_does_not_hurt() {
        let x = low_rank_matrix(30, 20, 20, 34);
        let slack = 1e-8 * frobenius(x.view());

        let few = rsvd(x.view(), Some(3), Some(1.0), Some(1.0), Some(1)).unwrap();
        let many = rsvd(x.view(), Some(3), Some(1.0), Some(1.0), Some(6)).unwrap();
        assert!(reconstruction_error(&x, &many) <= reconstruction_error(&x, &few) + slack);

        let narrow = rsvd(x.view(), Some(3), Some(1.0), Some(1.0), Some(2)).unwrap();
        let wide = rsvd(x.view(), Some(3), Some(1.0), Some(20.0), Some(2)).unwrap();
        assert!(reconstruction_error(&x, &wide) <= reconstruction_error(&x, &narrow) + slack);
    }

    #[test]
    fn test_rsvd_is_reproducible() {
        let x = random_matrix(25, 12, 35);
        let first = RandomizedSvd::new().ncomp(4).seed(9).compute(x.view()).unwrap();
        let second = RandomizedSvd::new().ncomp(4).seed(9).compute(x.view()).unwrap();
        assert_eq!(first.s(), second.s());
        assert_eq!(first.u(), second.u());
    }

    #[test]
    fn test_rsvd_default_components() {
        assert_eq!(default_components(10, 6), 4);
        assert_eq!(default_components(4, 9), 2);
        assert_eq!(default_components(1, 5), 1);

        let x = random_matrix(10, 6, 36);
        let approx = rsvd(x.view(), None, None, None, None).unwrap();
        assert_eq!(approx.ncomp(), 4);
    }

    #[test]
    fn test_rsvd_full_width_sketch() {
        // the sketch is capped at n, which makes the range estimate exact
        let x = random_matrix(12, 5, 37);
        let approx = rsvd(x.view(), Some(5), None, None, Some(1)).unwrap();
        let exact = svd(x.view(), None).unwrap();
        for k in 0..5 {
            assert_relative_eq!(approx.s()[k], exact.s()[k], max_relative = 1e-8);
        }
    }

    #[test]
    fn test_rsvd_parameter_ranges() {
        let x = random_matrix(10, 6, 38);
        let err = rsvd(x.view(), Some(2), None, None, Some(0)).unwrap_err();
        assert_eq!(
            err,
            LinalgError::InvalidParameter {
                name: "its",
                value: 0.0,
                min: 1.0,
                max: 10.0
            }
        );
        assert!(rsvd(x.view(), Some(2), None, None, Some(11)).is_err());
        assert!(rsvd(x.view(), Some(2), Some(0.5), None, None).is_err());
        assert!(rsvd(x.view(), Some(2), Some(6.0), None, None).is_err());
        assert!(rsvd(x.view(), Some(2), None, Some(0.0), None).is_err());
        assert!(rsvd(x.view(), Some(2), None, Some(101.0), None).is_err());
        assert_eq!(
            rsvd(x.view(), Some(7), None, None, None).unwrap_err(),
            LinalgError::InvalidComponents { ncomp: 7, max: 6 }
        );
    }
}
