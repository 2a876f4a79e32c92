//! # Elementary orthogonal transformations
//!
//! Givens rotations and Householder reflectors, the building blocks of the QR,
//! bidiagonalization and SVD routines.

use ndarray::{s, Array1, Array2, ArrayBase, Data, Ix1};
use num_traits::Float;

/// Computes a Givens rotation `(c, s, r)` such that
///
/// ```text
/// [  c  s ] [ f ]   [ r ]
/// [ -s  c ] [ g ] = [ 0 ]
/// ```
///
/// The ratio is always taken against the operand of larger magnitude, so neither
/// `f*f` nor `g*g` is ever formed. `f == 0` yields the pure swap `(0, 1, g)`.
pub fn rot<T: Float>(f: T, g: T) -> (T, T, T) {
    if f == T::zero() {
        return (T::zero(), T::one(), g);
    }

    if f.abs() > g.abs() {
        let t = g / f;
        let t1 = (T::one() + t * t).sqrt();
        let c = T::one() / t1;
        (c, t * c, f * t1)
    } else {
        let t = f / g;
        let t1 = (T::one() + t * t).sqrt();
        let s = T::one() / t1;
        (t * s, s, g * t1)
    }
}

/// Householder vector for the segment `b[start..]`.
///
/// The returned unit vector `h` (length `b.len() - start`) defines the reflector
/// `H = I - 2hhᵗ` mapping the segment onto `-sign(b[start])·‖b[start..]‖·e₁`.
///
/// The textbook form of this reflector targets `+sign(b[start])·‖b[start..]‖·e₁`, which
/// subtracts two nearly equal numbers when forming `h[0]`. This function deliberately
/// uses the opposite sign, so `h` differs from that form by the sign of the reflected
/// head; `H` is still symmetric, orthogonal and zeroes the tail.
///
/// The norm is computed with scaling, so segments of any magnitude are reflected. Only
/// an all-zero segment yields a zero `h`, which must be treated as a no-op reflector.
///
/// # Panics
/// If `start >= b.len()`.
pub fn householderv<S>(b: &ArrayBase<S, Ix1>, start: usize) -> Array1<f64>
where
    S: Data<Elem = f64>,
{
    let mut h = b.slice(s![start..]).to_owned();
    let scale = h.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 {
        return h;
    }
    let norm = scale * h.iter().map(|v| (v / scale).powi(2)).sum::<f64>().sqrt();
    let head = h[0];
    let sign = -head.signum();
    h[0] = head - sign * norm;

    // ‖h - s‖h‖e₁‖² = 2‖h‖(‖h‖ + |h₀|), factored so it cannot underflow
    let updated_norm = (2.0 * norm).sqrt() * (norm + head.abs()).sqrt();
    h /= updated_norm;
    h
}

/// Explicit reflector `H = I - 2hhᵗ` over the segment `b[start..]`.
///
/// Only worth materializing for short segments; the decompositions in this crate
/// apply [`householderv`] directly as a rank-one update.
pub fn householder<S>(b: &ArrayBase<S, Ix1>, start: usize) -> Array2<f64>
where
    S: Data<Elem = f64>,
{
    let h = householderv(b, start);
    let n = h.len();
    let mut reflector = Array2::eye(n);
    for i in 0..n {
        for j in 0..n {
            reflector[[i, j]] -= 2.0 * h[i] * h[j];
        }
    }
    reflector
}
