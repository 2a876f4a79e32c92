//! # Dimensionality Reduction
//!
//! Consumers of the decompositions that reduce high-dimensional data to a few
//! informative directions.
//!
//! ## Currently Available
//! - **PCA** ([`pca`]): Principal Component Analysis backed by the exact or the
//!   randomized SVD

pub mod pca;
