//! Multi-band image cube
//!
//! A cube holds `rows x cols` pixels of `bands` values each. The values are
//! stored in a `bands x (rows * cols)` matrix, one column per pixel, pixel
//! `(row, col)` being the column `row * cols + col`. With nalgebra column-major
//! storage each pixel spectrum is contiguous in memory.

use nalgebra::DMatrix;

use crate::error::{ConfigurationError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Cube {
    rows: usize,
    cols: usize,
    pixels: DMatrix<f64>,
}
impl Cube {
    /// Creates a cube from values in (row, column, band) order
    pub fn new(rows: usize, cols: usize, bands: usize, data: Vec<f64>) -> Result<Self> {
        check_shape(rows, cols, bands, data.len())?;
        Ok(Self {
            rows,
            cols,
            pixels: DMatrix::from_vec(bands, rows * cols, data),
        })
    }
    /// Creates a cube from values in (band, row, column) order
    ///
    /// This is the orientation raster readers hand over: one full image per band.
    pub fn from_band_major(bands: usize, rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        check_shape(rows, cols, bands, data.len())?;
        // (band, row, col) row-major is a column-major (pixel x band) matrix
        let by_band = DMatrix::from_vec(rows * cols, bands, data);
        Ok(Self {
            rows,
            cols,
            pixels: by_band.transpose(),
        })
    }
    /// Creates a cube with `f(row, col, band)` as values
    pub fn from_fn<F>(rows: usize, cols: usize, bands: usize, mut f: F) -> Result<Self>
    where
        F: FnMut(usize, usize, usize) -> f64,
    {
        check_shape(rows, cols, bands, rows * cols * bands)?;
        let pixels = DMatrix::from_fn(bands, rows * cols, |b, p| f(p / cols, p % cols, b));
        Ok(Self { rows, cols, pixels })
    }
    /// Reshapes a `bands x (rows * cols)` pixel matrix into a cube
    ///
    /// This is the inverse of [Cube::pixel_matrix]
    pub fn from_pixel_matrix(rows: usize, cols: usize, pixels: DMatrix<f64>) -> Result<Self> {
        let bands = pixels.nrows();
        check_shape(rows, cols, bands, pixels.len())?;
        Ok(Self { rows, cols, pixels })
    }
    /// Creates a single row cube from a `pixels x bands` sample matrix
    pub fn from_samples(samples: &DMatrix<f64>) -> Result<Self> {
        Self::from_pixel_matrix(1, samples.nrows(), samples.transpose())
    }
    pub fn rows(&self) -> usize {
        self.rows
    }
    pub fn cols(&self) -> usize {
        self.cols
    }
    pub fn bands(&self) -> usize {
        self.pixels.nrows()
    }
    pub fn n_pixels(&self) -> usize {
        self.pixels.ncols()
    }
    /// Returns (rows, columns, bands)
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.rows, self.cols, self.bands())
    }
    pub fn get(&self, row: usize, col: usize, band: usize) -> f64 {
        self.pixels[(band, row * self.cols + col)]
    }
    /// Returns the spectrum of pixel (row, col)
    pub fn pixel(&self, row: usize, col: usize) -> &[f64] {
        let bands = self.bands();
        let start = (row * self.cols + col) * bands;
        &self.pixels.as_slice()[start..start + bands]
    }
    /// Returns the image of a band in row-major order
    pub fn band(&self, band: usize) -> Vec<f64> {
        self.pixels.row(band).iter().cloned().collect()
    }
    /// The `bands x (rows * cols)` pixel matrix
    pub fn pixel_matrix(&self) -> &DMatrix<f64> {
        &self.pixels
    }
    pub fn into_pixel_matrix(self) -> DMatrix<f64> {
        self.pixels
    }
    pub(crate) fn pixels_mut(&mut self) -> &mut DMatrix<f64> {
        &mut self.pixels
    }
    /// Returns a new cube with only the first `k` bands
    pub fn leading_bands(&self, k: usize) -> Result<Self> {
        if k == 0 || k > self.bands() {
            return Err(ConfigurationError::ComponentsOutOfRange {
                requested: k,
                bands: self.bands(),
            }
            .into());
        }
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            pixels: self.pixels.rows(0, k).into_owned(),
        })
    }
    /// Returns the values in (band, row, column) order
    pub fn to_band_major(&self) -> Vec<f64> {
        self.pixels.transpose().as_slice().to_vec()
    }
}

fn check_shape(rows: usize, cols: usize, bands: usize, len: usize) -> Result<()> {
    if rows == 0 || cols == 0 || bands == 0 {
        return Err(ConfigurationError::EmptyCube { rows, cols, bands }.into());
    }
    let expected = rows * cols * bands;
    if len != expected {
        return Err(ConfigurationError::ShapeMismatch {
            expected,
            found: len,
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn band_major_round_trip() -> std::result::Result<(), Box<dyn std::error::Error>> {
        // 2 bands of 2x3 images
        let data: Vec<f64> = (0..12).map(|x| x as f64).collect();
        let cube = Cube::from_band_major(2, 2, 3, data.clone())?;
        assert_eq!(cube.shape(), (2, 3, 2));
        assert_eq!(cube.get(0, 0, 0), 0.);
        assert_eq!(cube.get(1, 2, 0), 5.);
        assert_eq!(cube.get(0, 1, 1), 7.);
        assert_eq!(cube.pixel(1, 0), &[3., 9.]);
        assert_eq!(cube.band(1), data[6..].to_vec());
        assert_eq!(cube.to_band_major(), data);
        Ok(())
    }

    #[test]
    fn pixel_order() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let cube = Cube::from_fn(3, 4, 2, |r, c, b| (100 * r + 10 * c + b) as f64)?;
        assert_eq!(cube.pixel(2, 3), &[230., 231.]);
        let same = Cube::new(3, 4, 2, cube.pixel_matrix().as_slice().to_vec())?;
        assert_eq!(same, cube);
        let reshaped = Cube::from_pixel_matrix(3, 4, cube.clone().into_pixel_matrix())?;
        assert_eq!(reshaped, cube);
        Ok(())
    }

    #[test]
    fn samples_are_a_single_row() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let samples = DMatrix::from_row_slice(3, 2, &[1., 2., 3., 4., 5., 6.]);
        let cube = Cube::from_samples(&samples)?;
        assert_eq!(cube.shape(), (1, 3, 2));
        assert_eq!(cube.pixel(0, 1), &[3., 4.]);
        Ok(())
    }

    #[test]
    fn rejects_bad_shapes() {
        assert!(matches!(
            Cube::new(2, 2, 2, vec![0.; 7]),
            Err(Error::Configuration(ConfigurationError::ShapeMismatch {
                expected: 8,
                found: 7
            }))
        ));
        assert!(matches!(
            Cube::new(2, 2, 0, vec![]),
            Err(Error::Configuration(ConfigurationError::EmptyCube { .. }))
        ));
        assert!(matches!(
            Cube::from_pixel_matrix(2, 3, DMatrix::zeros(2, 5)),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn leading_bands() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let cube = Cube::from_fn(2, 2, 4, |r, c, b| (r + c + b) as f64)?;
        let two = cube.leading_bands(2)?;
        assert_eq!(two.shape(), (2, 2, 2));
        assert_eq!(two.pixel(1, 1), &[2., 3.]);
        assert!(cube.leading_bands(0).is_err());
        assert!(cube.leading_bands(5).is_err());
        Ok(())
    }
}
