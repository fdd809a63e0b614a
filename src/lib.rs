//! # Minimum Noise Fraction transform
//!
//! Applies the Minimum/Maximum Noise Fraction (MNF) transform (Green et al., 1988)
//! to multi-band raster images such as hyperspectral scenes.
//! The transform chains:
//!  - an optional per-pixel brightness normalization ([normalize]),
//!  - the estimation and the whitening of the noise ([noise]),
//!  - the principal component analysis of the noise whitened image ([pca]).
//!
//! The components are ordered by decreasing signal-to-noise ratio and come
//! with the cumulative explained variance of the decomposition.
//!
//! ```no_run
//! use mnf_transform::{raster, report::VarianceReport, transform, MnfOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cube = raster::load("scene.npy")?;
//! let mnf = transform(&cube, &MnfOptions::default().brightness_normalization(true))?;
//! raster::save(mnf.components(), "scene_MNF_BN.npy")?;
//! VarianceReport::retained(&mnf).to_csv("scene_MNF.csv")?;
//! # Ok(())
//! # }
//! ```

pub mod cube;
pub mod error;
pub mod mnf;
pub mod noise;
pub mod normalize;
pub mod pca;
pub mod raster;
pub mod report;

pub use cube::Cube;
pub use error::{ConfigurationError, DegenerateDataError, Error, Result};
pub use mnf::{transform, transform_with, Components, MnfOptions, MnfOutput};
pub use noise::NoiseEstimator;
