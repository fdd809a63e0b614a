use crate::{raster::RasterError, report::ReportError};

/// Invalid request or input shape, surfaced before any numerics run
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigurationError {
    #[error("number of components must be in [1, {bands}], found {requested}")]
    ComponentsOutOfRange { requested: usize, bands: usize },
    #[error("invalid number of components: {0:?} (expected a positive integer or \"all\")")]
    InvalidComponents(String),
    #[error("image cube must be non-empty, found {rows}x{cols}x{bands}")]
    EmptyCube {
        rows: usize,
        cols: usize,
        bands: usize,
    },
    #[error("expected {expected} values for the cube shape, found {found}")]
    ShapeMismatch { expected: usize, found: usize },
}

/// The image does not support a noise whitening or a decomposition
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum DegenerateDataError {
    #[error("band #{band} is constant, its noise variance is zero")]
    ConstantBand { band: usize },
    #[error("band #{band} has no spatial noise (noise variance: {variance:e})")]
    NoiselessBand { band: usize, variance: f64 },
    #[error(
        "noise covariance is singular (eigenvalues in [{min_eigenvalue:e}, {max_eigenvalue:e}]), some bands are perfectly correlated"
    )]
    SingularNoiseCovariance {
        min_eigenvalue: f64,
        max_eigenvalue: f64,
    },
    #[error("{pixels} pixel(s) are not enough to estimate the noise, at least 2 neighbours are needed")]
    InsufficientPixels { pixels: usize },
    #[error("the image holds NaN or infinite values")]
    NonFiniteValues,
    #[error("whitened data has no variance")]
    NoVariance,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("configuration error")]
    Configuration(#[from] ConfigurationError),
    #[error("degenerate data")]
    DegenerateData(#[from] DegenerateDataError),
    #[error("error in the `raster` module")]
    Raster(#[from] RasterError),
    #[error("error in the `report` module")]
    Report(#[from] ReportError),
}

pub type Result<T> = std::result::Result<T, Error>;
