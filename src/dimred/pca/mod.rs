//! # Principal Component Analysis
//!
//! Dense PCA on top of the decompositions in this crate. The data is optionally
//! centered and scaled column-wise, then factored with either the exact [`svd`] or the
//! randomized [`RandomizedSvd`].

use crate::svd::{svd, RandomizedSvd, SVD};
use anyhow::{anyhow, bail};
use log::info;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use rayon::prelude::*;

/// Decomposition backing [`PCA::fit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SVDMethod {
    Exact,
    Randomized {
        oversampling_factor: f64,
        oversampling_offset: f64,
        power_iterations: usize,
        seed: u64,
    },
}

impl Default for SVDMethod {
    fn default() -> Self {
        Self::Exact
    }
}

impl SVDMethod {
    /// Randomized method with the default sketch parameters.
    pub fn randomized() -> Self {
        Self::Randomized {
            oversampling_factor: 1.0,
            oversampling_offset: 10.0,
            power_iterations: 3,
            seed: 42,
        }
    }
}

/// Builder for [`PCA`].
///
/// ```ignore
/// let mut pca = PCABuilder::new()
///     .n_components(2)
///     .scale(true)
///     .svd_method(SVDMethod::randomized())
///     .build();
/// let embedding = pca.fit_transform(x.view())?;
/// ```
#[derive(Debug, Clone)]
pub struct PCABuilder {
    n_components: Option<usize>,
    center: bool,
    scale: bool,
    svd_method: SVDMethod,
    verbose: bool,
}

impl Default for PCABuilder {
    fn default() -> Self {
        PCABuilder {
            n_components: None,
            center: true,
            scale: false,
            svd_method: SVDMethod::default(),
            verbose: false,
        }
    }
}

impl PCABuilder {
    /// Creates a new builder with default parameters.
    ///
    /// Default values:
    /// - `n_components`: `min(n_samples, n_features)`
    /// - `center`: true
    /// - `scale`: false
    /// - `svd_method`: Exact
    /// - `verbose`: false
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n_components(mut self, n_components: usize) -> Self {
        self.n_components = Some(n_components);
        self
    }

    pub fn center(mut self, center: bool) -> Self {
        self.center = center;
        self
    }

    /// Divides every feature by its standard deviation before the decomposition.
    /// Constant features are left unscaled.
    pub fn scale(mut self, scale: bool) -> Self {
        self.scale = scale;
        self
    }

    pub fn svd_method(mut self, svd_method: SVDMethod) -> Self {
        self.svd_method = svd_method;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn build(self) -> PCA {
        PCA {
            n_components: self.n_components,
            center: self.center,
            scale: self.scale,
            svd_method: self.svd_method,
            verbose: self.verbose,
            components: None,
            mean: None,
            std_dev: None,
            explained_variance_ratio: None,
            total_variance: None,
            eigenvalues: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PCA {
    n_components: Option<usize>,
    center: bool,
    scale: bool,
    svd_method: SVDMethod,
    verbose: bool,
    components: Option<Array2<f64>>,
    mean: Option<Array1<f64>>,
    std_dev: Option<Array1<f64>>,
    explained_variance_ratio: Option<Array1<f64>>,
    total_variance: Option<f64>,
    eigenvalues: Option<Array1<f64>>,
}

impl PCA {
    /// Fits the model to `x` (samples × features).
    ///
    /// Components are sign-normalized so that the largest-magnitude loading of each one
    /// is positive, which makes results comparable across SVD methods.
    ///
    /// Nearly tied component variances can make the underlying SVD fail to converge
    /// (see [`svd`]), in which case `fit` returns an "SVD computation failed" error. Both
    /// methods are affected, the randomized one finishes with an exact SVD of the
    /// projected matrix.
    pub fn fit(&mut self, x: ArrayView2<f64>) -> anyhow::Result<()> {
        let (n_samples, n_features) = x.dim();
        if n_samples < 2 || n_features == 0 {
            bail!(
                "PCA needs at least 2 samples and 1 feature, got {} x {}",
                n_samples,
                n_features
            );
        }
        let max_components = n_samples.min(n_features);
        let n_components = self.n_components.unwrap_or(max_components);
        if n_components == 0 || n_components > max_components {
            bail!(
                "Number of components ({}) must be within [1, {}]",
                n_components,
                max_components
            );
        }

        let mean = if self.center {
            Some(
                x.mean_axis(Axis(0))
                    .ok_or_else(|| anyhow!("Failed to compute column means"))?,
            )
        } else {
            None
        };

        let std_dev = if self.scale {
            Some(
                x.std_axis(Axis(0), 0.0)
                    .mapv(|s| if s > 0.0 { s } else { 1.0 }),
            )
        } else {
            None
        };

        let x_preprocessed = preprocess(x, &mean, &std_dev);
        let svd = self.decompose(x_preprocessed.view(), n_components)?;
        let (s, _, v) = svd.into_parts();

        let mut components = v.reversed_axes();
        for mut component in components.axis_iter_mut(Axis(0)) {
            let pivot = component
                .iter()
                .copied()
                .fold(0.0f64, |acc, value| if value.abs() > acc.abs() { value } else { acc });
            if pivot < 0.0 {
                component.mapv_inplace(|value| -value);
            }
        }

        let n_minus_1 = n_samples as f64 - 1.0;
        let eigenvalues = s.mapv(|value| value * value / n_minus_1);
        let total_variance = x_preprocessed.iter().map(|value| value * value).sum::<f64>() / n_minus_1;
        let explained_variance_ratio = if total_variance > 0.0 {
            &eigenvalues / total_variance
        } else {
            Array1::zeros(eigenvalues.len())
        };

        if self.verbose {
            info!(
                "PCA: {} samples x {} features reduced to {} components",
                n_samples, n_features, n_components
            );
            info!(
                "PCA: explained variance {:.4} of total {:.4}",
                eigenvalues.sum(),
                total_variance
            );
        }

        self.components = Some(components);
        self.mean = mean;
        self.std_dev = std_dev;
        self.explained_variance_ratio = Some(explained_variance_ratio);
        self.total_variance = Some(total_variance);
        self.eigenvalues = Some(eigenvalues);

        Ok(())
    }

    fn decompose(&self, x: ArrayView2<f64>, n_components: usize) -> anyhow::Result<SVD> {
        let result = match self.svd_method {
            SVDMethod::Exact => {
                if self.verbose {
                    info!("PCA: computing exact SVD");
                }
                svd(x, Some(n_components))
            }
            SVDMethod::Randomized {
                oversampling_factor,
                oversampling_offset,
                power_iterations,
                seed,
            } => {
                if self.verbose {
                    info!(
                        "PCA: computing randomized SVD (oversampling {} x k + {}, {} power iterations)",
                        oversampling_factor, oversampling_offset, power_iterations
                    );
                }
                RandomizedSvd::new()
                    .ncomp(n_components)
                    .oversampling(oversampling_factor, oversampling_offset)
                    .power_iterations(power_iterations)
                    .seed(seed)
                    .compute(x)
            }
        };
        result.map_err(|e| anyhow!("SVD computation failed: {}", e))
    }

    /// Projects `x` onto the fitted components.
    pub fn transform(&self, x: ArrayView2<f64>) -> anyhow::Result<Array2<f64>> {
        let components = self
            .components
            .as_ref()
            .ok_or_else(|| anyhow!("PCA has not been fitted yet"))?;
        if x.ncols() != components.ncols() {
            bail!(
                "Feature count mismatch: fitted on {}, got {}",
                components.ncols(),
                x.ncols()
            );
        }

        let x_preprocessed = preprocess(x, &self.mean, &self.std_dev);
        Ok(x_preprocessed.dot(&components.t()))
    }

    pub fn fit_transform(&mut self, x: ArrayView2<f64>) -> anyhow::Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    /// Principal axes, one per row (`n_components × n_features`).
    pub fn components(&self) -> Option<&Array2<f64>> {
        self.components.as_ref()
    }

    pub fn explained_variance_ratio(&self) -> Option<&Array1<f64>> {
        self.explained_variance_ratio.as_ref()
    }

    pub fn cumulative_explained_variance_ratio(&self) -> Option<Array1<f64>> {
        self.explained_variance_ratio.as_ref().map(|ratios| {
            let mut sum = 0.0;
            ratios.mapv(|ratio| {
                sum += ratio;
                sum
            })
        })
    }

    pub fn total_variance(&self) -> Option<f64> {
        self.total_variance
    }

    /// Variance along each component, `s² / (n_samples - 1)`.
    pub fn eigenvalues(&self) -> Option<&Array1<f64>> {
        self.eigenvalues.as_ref()
    }
}

fn preprocess(
    x: ArrayView2<f64>,
    mean: &Option<Array1<f64>>,
    std_dev: &Option<Array1<f64>>,
) -> Array2<f64> {
    let mut x_preprocessed = x.to_owned();

    if let Some(m) = mean {
        x_preprocessed
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .for_each(|mut row| {
                row -= m;
            });
    }

    if let Some(s) = std_dev {
        x_preprocessed
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .for_each(|mut row| {
                row /= s;
            });
    }

    x_preprocessed
}
