//! Minimum Noise Fraction transform
//!
//! The MNF transform is a principal component analysis of the image once its
//! noise has been whitened: the components come out sorted by decreasing
//! signal-to-noise ratio.
//!
//! ```no_run
//! use mnf_transform::{transform, Components, Cube, MnfOptions};
//!
//! # fn main() -> mnf_transform::Result<()> {
//! let cube = Cube::from_fn(64, 64, 10, |r, c, b| ((r * c + b) % 7) as f64)?;
//! let mnf = transform(&cube, &MnfOptions::default().components(Components::Count(3)))?;
//! println!("{:?}", mnf.retained_variance());
//! # Ok(())
//! # }
//! ```

use std::{borrow::Cow, fmt, str::FromStr, time::Instant};

use nalgebra::DMatrix;

use crate::{
    cube::Cube,
    error::{ConfigurationError, Result},
    noise::{NoiseEstimator, Whitener},
    normalize::{brightness_normalize, NormalizationReport},
    pca::{Decomposition, VarianceProfile},
};

/// Number of MNF components to keep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Components {
    /// as many components as bands
    #[default]
    All,
    Count(usize),
}
impl Components {
    /// Resolves the number of components for a cube with `bands` bands
    pub fn resolve(self, bands: usize) -> std::result::Result<usize, ConfigurationError> {
        match self {
            Components::All => Ok(bands),
            Components::Count(n) if (1..=bands).contains(&n) => Ok(n),
            Components::Count(requested) => {
                Err(ConfigurationError::ComponentsOutOfRange { requested, bands })
            }
        }
    }
}
impl From<usize> for Components {
    fn from(n: usize) -> Self {
        Components::Count(n)
    }
}
impl From<Option<usize>> for Components {
    fn from(n: Option<usize>) -> Self {
        n.map_or(Components::All, Components::Count)
    }
}
impl FromStr for Components {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") || s.eq_ignore_ascii_case("all bands") {
            return Ok(Components::All);
        }
        match s.parse::<i64>() {
            Ok(n) if n >= 0 => Ok(Components::Count(n as usize)),
            _ => Err(ConfigurationError::InvalidComponents(s.to_string())),
        }
    }
}
impl fmt::Display for Components {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Components::All => write!(f, "all"),
            Components::Count(n) => write!(f, "{}", n),
        }
    }
}

/// MNF transform options
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MnfOptions {
    components: Components,
    brightness_normalization: bool,
    noise_estimator: NoiseEstimator,
}
impl MnfOptions {
    /// Sets the number of components
    pub fn components<C: Into<Components>>(self, components: C) -> Self {
        Self {
            components: components.into(),
            ..self
        }
    }
    /// Enables the brightness normalization of the pixels
    pub fn brightness_normalization(self, brightness_normalization: bool) -> Self {
        Self {
            brightness_normalization,
            ..self
        }
    }
    /// Sets the neighbour pairs used to estimate the noise
    pub fn noise_estimator(self, noise_estimator: NoiseEstimator) -> Self {
        Self {
            noise_estimator,
            ..self
        }
    }
}

/// MNF transform results
#[derive(Debug, Clone)]
pub struct MnfOutput {
    components: Cube,
    variance: VarianceProfile,
    explained_variance_ratio: Vec<f64>,
    eigenvalues: Vec<f64>,
    loadings: DMatrix<f64>,
    normalization: NormalizationReport,
}
impl MnfOutput {
    /// The MNF components (rows x columns x components)
    pub fn components(&self) -> &Cube {
        &self.components
    }
    pub fn n_components(&self) -> usize {
        self.components.bands()
    }
    /// The cumulative explained variance [%] of all the components, retained or not
    pub fn variance(&self) -> &VarianceProfile {
        &self.variance
    }
    /// The cumulative explained variance [%] of the retained components
    pub fn retained_variance(&self) -> &[f64] {
        self.variance.retained(self.n_components())
    }
    /// The explained variance ratio of all the components
    pub fn explained_variance_ratio(&self) -> &[f64] {
        &self.explained_variance_ratio
    }
    /// The variance of the noise whitened components
    ///
    /// The inverse of an eigenvalue is the noise fraction of the component.
    pub fn eigenvalues(&self) -> &[f64] {
        &self.eigenvalues
    }
    /// The `bands x bands` matrix mapping a centered input pixel to its MNF
    /// components, one component per column
    pub fn loadings(&self) -> &DMatrix<f64> {
        &self.loadings
    }
    /// Number of zero norm pixels met by the brightness normalization
    pub fn zero_norm_pixels(&self) -> usize {
        self.normalization.zero_norm_pixels
    }
    /// Component labels: `MNF1`, `MNF2`, ...
    pub fn labels(&self) -> Vec<String> {
        (1..=self.n_components()).map(|i| format!("MNF{i}")).collect()
    }
    /// Splits the output into the components and the cumulative explained variance
    pub fn into_parts(self) -> (Cube, VarianceProfile) {
        (self.components, self.variance)
    }
}

/// Applies the MNF transform to a cube
pub fn transform(image: &Cube, options: &MnfOptions) -> Result<MnfOutput> {
    let now = Instant::now();
    let (rows, cols, bands) = image.shape();
    let n_components = options.components.resolve(bands)?;
    log::info!(
        "MNF transform of a {}x{}x{} cube into {} components",
        rows,
        cols,
        bands,
        n_components
    );

    let (image, normalization) = if options.brightness_normalization {
        let (normalized, report) = brightness_normalize(image);
        (Cow::Owned(normalized), report)
    } else {
        (Cow::Borrowed(image), NormalizationReport::default())
    };

    let whitener = Whitener::estimate(&image, options.noise_estimator)?;
    let whitened = whitener.whiten(&image)?;
    log::debug!("noise whitened ({} noise estimator)", options.noise_estimator);

    let decomposition = Decomposition::fit(&whitened)?;
    let scores = decomposition.project(&whitened)?;
    let variance = VarianceProfile::from_ratios(decomposition.explained_variance_ratio());
    log::debug!("cumulative explained variance: {:?}", variance.full());

    let output = MnfOutput {
        components: scores.leading_bands(n_components)?,
        explained_variance_ratio: decomposition.explained_variance_ratio().to_vec(),
        eigenvalues: decomposition.eigenvalues().iter().cloned().collect(),
        // the whitening matrix is symmetric
        loadings: whitener.matrix() * decomposition.loadings(),
        variance,
        normalization,
    };
    log::info!("... MNF transform done in {}ms", now.elapsed().as_millis());
    Ok(output)
}

/// Applies the MNF transform to a cube
///
/// All the bands are kept if `n_components` is `None`
pub fn transform_with(
    image: &Cube,
    n_components: Option<usize>,
    apply_normalization: bool,
) -> Result<MnfOutput> {
    transform(
        image,
        &MnfOptions::default()
            .components(n_components)
            .brightness_normalization(apply_normalization),
    )
}
