//! Dense matrix decompositions on `ndarray`.
//!
//! - elementary transformations: [`rot`], [`householderv`], [`householder`]
//! - factorizations: [`qr`], [`lu`], [`bidiag`]
//! - singular values: [`svd`] (with the single sweep [`vsweep`]) and the randomized [`rsvd`]
//! - [`inv`] for square matrices
//!
//! All routines take `ArrayView2<f64>` inputs, never modify them and report failures
//! through [`LinalgError`].

pub mod bidiag;
pub mod dimred;
pub mod error;
pub mod inverse;
pub mod lu;
pub mod primitives;
pub mod qr;
pub mod svd;
mod utils;

pub use bidiag::{bidiag, Bidiagonal};
pub use error::{LinalgError, Result};
pub use inverse::{inv, Inverse};
pub use lu::{lu, LU};
pub use primitives::{householder, householderv, rot};
pub use qr::{qr, QR};
pub use svd::{rsvd, svd, vsweep, RandomizedSvd, SVD};
pub use utils::{MatrixStructure, Triangle};
