//! Principal component analysis of a cube
//!
//! The pixels are the samples and the bands the variables. The components are
//! sorted by decreasing variance and each one is signed so that its largest
//! loading is positive.

use std::{cmp::Ordering, ops::Deref};

use nalgebra::{DMatrix, DVector, SymmetricEigen};

use crate::{
    cube::Cube,
    error::{ConfigurationError, DegenerateDataError, Result},
};

/// Removes the mean pixel from every column
///
/// Returns the mean and the centered matrix
pub(crate) fn center(pixels: &DMatrix<f64>) -> (DVector<f64>, DMatrix<f64>) {
    let mean = pixels.column_mean();
    let mut centered = pixels.clone();
    centered
        .column_iter_mut()
        .for_each(|mut column| column -= &mean);
    (mean, centered)
}

/// Principal components of a cube
#[derive(Debug, Clone)]
pub struct Decomposition {
    mean: DVector<f64>,
    eigenvalues: DVector<f64>,
    loadings: DMatrix<f64>,
    explained_variance_ratio: Vec<f64>,
}
impl Decomposition {
    /// Computes the principal components of the cube pixels
    pub fn fit(cube: &Cube) -> Result<Self> {
        let n = cube.n_pixels();
        if n < 2 {
            return Err(DegenerateDataError::InsufficientPixels { pixels: n }.into());
        }
        let bands = cube.bands();
        let (mean, centered) = center(cube.pixel_matrix());
        let covariance = &centered * centered.transpose() / (n - 1) as f64;
        if covariance.iter().any(|x| !x.is_finite()) {
            return Err(DegenerateDataError::NonFiniteValues.into());
        }

        let eigen = SymmetricEigen::new(covariance);
        let mut order: Vec<usize> = (0..bands).collect();
        order.sort_by(|&a, &b| {
            eigen.eigenvalues[b]
                .partial_cmp(&eigen.eigenvalues[a])
                .unwrap_or(Ordering::Equal)
        });
        // round-off may leave tiny negative eigenvalues
        let eigenvalues =
            DVector::from_iterator(bands, order.iter().map(|&k| eigen.eigenvalues[k].max(0f64)));
        let mut loadings = DMatrix::from_fn(bands, bands, |i, j| eigen.eigenvectors[(i, order[j])]);
        loadings.column_iter_mut().for_each(|mut v| {
            if v[v.iamax()] < 0f64 {
                v.neg_mut();
            }
        });

        // centering a constant band leaves a residue of the order of EPSILON x mean
        let total_variance = eigenvalues.sum();
        if total_variance <= f64::EPSILON * mean.norm_squared() {
            return Err(DegenerateDataError::NoVariance.into());
        }
        let explained_variance_ratio = eigenvalues.iter().map(|l| l / total_variance).collect();
        Ok(Self {
            mean,
            eigenvalues,
            loadings,
            explained_variance_ratio,
        })
    }
    /// The mean pixel
    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }
    /// The variance of each component
    pub fn eigenvalues(&self) -> &DVector<f64> {
        &self.eigenvalues
    }
    /// The `bands x bands` matrix of the components, one per column
    pub fn loadings(&self) -> &DMatrix<f64> {
        &self.loadings
    }
    /// The fraction of the total variance in each component
    pub fn explained_variance_ratio(&self) -> &[f64] {
        &self.explained_variance_ratio
    }
    /// Projects the cube onto the principal components
    ///
    /// The returned cube has as many bands as components, the first band
    /// being the first principal component.
    pub fn project(&self, cube: &Cube) -> Result<Cube> {
        if cube.bands() != self.mean.len() {
            return Err(ConfigurationError::ShapeMismatch {
                expected: cube.n_pixels() * self.mean.len(),
                found: cube.pixel_matrix().len(),
            }
            .into());
        }
        let mut centered = cube.pixel_matrix().clone();
        centered
            .column_iter_mut()
            .for_each(|mut column| column -= &self.mean);
        Cube::from_pixel_matrix(
            cube.rows(),
            cube.cols(),
            self.loadings.tr_mul(&centered),
        )
    }
}

/// Cumulative explained variance [%]
///
/// The explained variance ratio of each component is rounded to 4 decimals
/// before being converted to percent and summed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct VarianceProfile(Vec<f64>);
impl Deref for VarianceProfile {
    type Target = [f64];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl VarianceProfile {
    pub fn from_ratios(ratios: &[f64]) -> Self {
        Self(
            ratios
                .iter()
                .scan(0f64, |cumulated, ratio| {
                    *cumulated += (ratio * 1e4).round() * 1e-2;
                    Some(*cumulated)
                })
                .collect(),
        )
    }
    /// The cumulative variance of all the components
    pub fn full(&self) -> &[f64] {
        &self.0
    }
    /// The cumulative variance of the first `n` components
    pub fn retained(&self, n: usize) -> &[f64] {
        &self.0[..n.min(self.0.len())]
    }
    /// Unwraps the cumulative variance
    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}
