//! Noise estimation and whitening
//!
//! The noise is isolated with the shift-difference method (Green et al., 1988):
//! the difference between neighbouring pixels cancels the spatially smooth
//! signal and leaves twice the pixel noise. The covariance of these differences
//! gives the band-to-band noise covariance and the whitening matrix
//! `W = V diag(1/sqrt(l)) V^T` turns it into the identity.

use nalgebra::{DMatrix, SymmetricEigen};
use rayon::prelude::*;
use strum_macros::{Display, EnumIter, EnumString};

use crate::{
    cube::Cube,
    error::{ConfigurationError, DegenerateDataError, Result},
    pca::center,
};

/// Relative threshold below which a variance or an eigenvalue is zero
const DEGENERACY_TOLERANCE: f64 = 1e-12;

/// Neighbour pairs used to estimate the noise
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, EnumString, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum NoiseEstimator {
    /// pixels and their right neighbour
    Horizontal,
    /// pixels and their bottom neighbour
    Vertical,
    /// both horizontal and vertical pairs
    #[default]
    Both,
}
impl NoiseEstimator {
    /// Pixel index pairs of the neighbours in a `rows x cols` image, one set per direction
    fn pairs(self, rows: usize, cols: usize) -> Vec<Vec<(usize, usize)>> {
        let horizontal = || -> Vec<(usize, usize)> {
            (0..rows)
                .flat_map(|r| (1..cols).map(move |c| (r * cols + c - 1, r * cols + c)))
                .collect()
        };
        let vertical = || -> Vec<(usize, usize)> {
            (1..rows)
                .flat_map(|r| (0..cols).map(move |c| ((r - 1) * cols + c, r * cols + c)))
                .collect()
        };
        match self {
            NoiseEstimator::Horizontal => vec![horizontal()],
            NoiseEstimator::Vertical => vec![vertical()],
            NoiseEstimator::Both => vec![horizontal(), vertical()],
        }
    }
}

/// Estimates the `bands x bands` noise covariance matrix
///
/// The differences are centered per direction so that a linear trend of the
/// signal does not leak into the noise estimate.
pub fn noise_covariance(cube: &Cube, estimator: NoiseEstimator) -> Result<DMatrix<f64>> {
    let (rows, cols, bands) = cube.shape();
    let pixels = cube.pixel_matrix();
    let mut scatter = DMatrix::<f64>::zeros(bands, bands);
    let mut dof = 0usize;
    for pairs in estimator
        .pairs(rows, cols)
        .into_iter()
        .filter(|pairs| !pairs.is_empty())
    {
        let differences = DMatrix::from_fn(bands, pairs.len(), |b, k| {
            let (p, q) = pairs[k];
            pixels[(b, q)] - pixels[(b, p)]
        });
        let (_, centered) = center(&differences);
        scatter += &centered * centered.transpose();
        dof += pairs.len() - 1;
    }
    if dof == 0 {
        return Err(DegenerateDataError::InsufficientPixels {
            pixels: cube.n_pixels(),
        }
        .into());
    }
    // the difference of two pixels carries twice the noise variance
    let noise = scatter / (2 * dof) as f64;
    if noise.iter().any(|x| !x.is_finite()) {
        return Err(DegenerateDataError::NonFiniteValues.into());
    }
    Ok(noise)
}

/// Variance of each band of the cube
fn band_variances(cube: &Cube) -> Vec<f64> {
    let n = cube.n_pixels() as f64;
    let pixels = cube.pixel_matrix();
    (0..cube.bands())
        .into_par_iter()
        .map(|b| {
            let band = pixels.row(b);
            let mean = band.mean();
            band.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n
        })
        .collect()
}

/// Noise whitening transform
#[derive(Debug, Clone)]
pub struct Whitener {
    noise_covariance: DMatrix<f64>,
    matrix: DMatrix<f64>,
    inverse: DMatrix<f64>,
}
impl Whitener {
    /// Estimates the noise of the cube and the matching whitening transform
    pub fn estimate(cube: &Cube, estimator: NoiseEstimator) -> Result<Self> {
        let noise_covariance = noise_covariance(cube, estimator)?;
        let noise_variances = noise_covariance.diagonal();
        let max_noise_variance = noise_variances.max();
        if let Some((band, &variance)) = noise_variances
            .iter()
            .enumerate()
            .find(|&(_, &v)| v <= DEGENERACY_TOLERANCE * max_noise_variance)
        {
            let data_variances = band_variances(cube);
            let max_data_variance = data_variances.iter().cloned().fold(0f64, f64::max);
            let error = if data_variances[band] <= DEGENERACY_TOLERANCE * max_data_variance {
                DegenerateDataError::ConstantBand { band }
            } else {
                DegenerateDataError::NoiselessBand { band, variance }
            };
            return Err(error.into());
        }

        let SymmetricEigen {
            eigenvalues,
            eigenvectors,
        } = SymmetricEigen::new(noise_covariance.clone());
        let (min_eigenvalue, max_eigenvalue) = (eigenvalues.min(), eigenvalues.max());
        if max_eigenvalue <= 0f64 || min_eigenvalue <= DEGENERACY_TOLERANCE * max_eigenvalue {
            return Err(DegenerateDataError::SingularNoiseCovariance {
                min_eigenvalue,
                max_eigenvalue,
            }
            .into());
        }
        log::debug!(
            "noise covariance eigenvalues in [{:e}, {:e}]",
            min_eigenvalue,
            max_eigenvalue
        );

        let scale = |f: fn(f64) -> f64| {
            &eigenvectors
                * DMatrix::from_diagonal(&eigenvalues.map(f))
                * eigenvectors.transpose()
        };
        Ok(Self {
            matrix: scale(|l| l.sqrt().recip()),
            inverse: scale(f64::sqrt),
            noise_covariance,
        })
    }
    /// The estimated noise covariance
    pub fn noise_covariance(&self) -> &DMatrix<f64> {
        &self.noise_covariance
    }
    /// The whitening matrix
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }
    fn apply(operator: &DMatrix<f64>, cube: &Cube) -> Result<Cube> {
        if cube.bands() != operator.ncols() {
            return Err(ConfigurationError::ShapeMismatch {
                expected: cube.rows() * cube.cols() * operator.ncols(),
                found: cube.pixel_matrix().len(),
            }
            .into());
        }
        Cube::from_pixel_matrix(cube.rows(), cube.cols(), operator * cube.pixel_matrix())
    }
    /// Whitens the cube noise
    pub fn whiten(&self, cube: &Cube) -> Result<Cube> {
        Self::apply(&self.matrix, cube)
    }
    /// Reverts [Whitener::whiten]
    pub fn unwhiten(&self, cube: &Cube) -> Result<Cube> {
        Self::apply(&self.inverse, cube)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use rand::{rngs::StdRng, SeedableRng};
    use rand_distr::{Distribution, Normal};
    use strum::IntoEnumIterator;

    /// Smooth signal plus noise correlated between bands
    fn noisy_cube(rows: usize, cols: usize) -> Cube {
        let mut rng = StdRng::seed_from_u64(42);
        let normal = Normal::new(0., 1.).unwrap();
        let mixing = [[1.0, 0.0, 0.0], [0.6, 0.8, 0.0], [0.2, -0.3, 0.5]];
        let n: Vec<[f64; 3]> = (0..rows * cols)
            .map(|_| [0; 3].map(|_| normal.sample(&mut rng)))
            .collect();
        Cube::from_fn(rows, cols, 3, |r, c, b| {
            let noise: f64 = (0..3).map(|k| mixing[b][k] * n[r * cols + c][k]).sum();
            (b + 1) as f64 * (0.3 * r as f64 + 0.2 * c as f64) + noise
        })
        .unwrap()
    }

    #[test]
    fn whitened_noise_is_identity() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let cube = noisy_cube(12, 10);
        for estimator in NoiseEstimator::iter() {
            let whitener = Whitener::estimate(&cube, estimator)?;
            let whitened = whitener.whiten(&cube)?;
            assert_eq!(whitened.shape(), cube.shape());
            let noise = noise_covariance(&whitened, estimator)?;
            let error = (noise - DMatrix::<f64>::identity(3, 3)).amax();
            assert!(error < 1e-9, "{estimator}: {error}");
        }
        Ok(())
    }

    #[test]
    fn unwhiten() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let cube = noisy_cube(8, 9);
        let whitener = Whitener::estimate(&cube, NoiseEstimator::default())?;
        let restored = whitener.unwhiten(&whitener.whiten(&cube)?)?;
        let error = (restored.pixel_matrix() - cube.pixel_matrix()).amax();
        assert!(error < 1e-9, "{error}");
        Ok(())
    }

    #[test]
    fn noise_estimate() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let cube = noisy_cube(40, 40);
        let noise = noise_covariance(&cube, NoiseEstimator::Both)?;
        // M M^T of the mixing matrix
        assert!((noise[(0, 0)] - 1.).abs() < 0.15, "{}", noise);
        assert!((noise[(1, 0)] - 0.6).abs() < 0.15, "{}", noise);
        assert!((noise[(2, 2)] - 0.38).abs() < 0.1, "{}", noise);
        Ok(())
    }

    #[test]
    fn constant_band() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let noisy = noisy_cube(5, 5);
        let cube = Cube::from_fn(5, 5, 3, |r, c, b| if b == 1 { 5. } else { noisy.get(r, c, b) })?;
        assert!(matches!(
            Whitener::estimate(&cube, NoiseEstimator::Both),
            Err(Error::DegenerateData(DegenerateDataError::ConstantBand { band: 1 }))
        ));
        Ok(())
    }

    #[test]
    fn noiseless_band() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let noisy = noisy_cube(5, 5);
        let cube = Cube::from_fn(5, 5, 3, |r, c, b| {
            if b == 2 {
                (r + 2 * c) as f64
            } else {
                noisy.get(r, c, b)
            }
        })?;
        assert!(matches!(
            Whitener::estimate(&cube, NoiseEstimator::Both),
            Err(Error::DegenerateData(DegenerateDataError::NoiselessBand { band: 2, .. }))
        ));
        Ok(())
    }

    #[test]
    fn correlated_bands() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let noisy = noisy_cube(6, 6);
        let cube = Cube::from_fn(6, 6, 3, |r, c, b| {
            if b == 2 {
                2. * noisy.get(r, c, 0) - noisy.get(r, c, 1)
            } else {
                noisy.get(r, c, b)
            }
        })?;
        assert!(matches!(
            Whitener::estimate(&cube, NoiseEstimator::Both),
            Err(Error::DegenerateData(
                DegenerateDataError::SingularNoiseCovariance { .. }
            ))
        ));
        Ok(())
    }

    #[test]
    fn not_enough_neighbours() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let row = Cube::from_fn(1, 6, 2, |_, c, b| (c * c + b) as f64)?;
        assert!(matches!(
            noise_covariance(&row, NoiseEstimator::Vertical),
            Err(Error::DegenerateData(DegenerateDataError::InsufficientPixels { pixels: 6 }))
        ));
        assert!(noise_covariance(&row, NoiseEstimator::Horizontal).is_ok());
        Ok(())
    }

    #[test]
    fn estimator_names() {
        assert_eq!(
            "vertical".parse::<NoiseEstimator>().ok(),
            Some(NoiseEstimator::Vertical)
        );
        assert_eq!(NoiseEstimator::default().to_string(), "both");
    }
}
