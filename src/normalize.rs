//! Brightness normalization
//!
//! Each pixel spectrum is scaled to unit L2 norm (Feilhauer et al., 2010),
//! removing the overall illumination level before the spectral shape analysis.
//! A pixel with a zero norm is left as a zero vector.

use rayon::prelude::*;

use crate::cube::Cube;

/// Outcome of a brightness normalization
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NormalizationReport {
    /// Number of pixels with a zero norm, left as zero vectors
    pub zero_norm_pixels: usize,
}

/// L2 norm scaled by the largest magnitude, finite for any finite spectrum
fn l2_norm(spectrum: &[f64]) -> f64 {
    let scale = spectrum.iter().fold(0f64, |m, x| m.max(x.abs()));
    if scale == 0f64 || !scale.is_finite() {
        return scale;
    }
    scale
        * spectrum
            .iter()
            .map(|&x| (x / scale).powi(2))
            .sum::<f64>()
            .sqrt()
}

/// Scales a spectrum to unit norm in place, returns `false` if its norm is zero
pub fn normalize_spectrum(spectrum: &mut [f64]) -> bool {
    let norm = l2_norm(spectrum);
    if norm == 0f64 {
        // already a zero vector, possibly with negative zeros
        spectrum.iter_mut().for_each(|x| *x = 0f64);
        return false;
    }
    spectrum.iter_mut().for_each(|x| *x /= norm);
    true
}

/// Brightness normalization of all the pixels of a cube
pub fn brightness_normalize(cube: &Cube) -> (Cube, NormalizationReport) {
    let mut normalized = cube.clone();
    let bands = normalized.bands();
    let zero_norm_pixels: usize = normalized
        .pixels_mut()
        .as_mut_slice()
        .par_chunks_mut(bands)
        .map(|spectrum| usize::from(!normalize_spectrum(spectrum)))
        .sum();
    if zero_norm_pixels > 0 {
        log::warn!(
            "{} zero norm pixel(s) set to zero by the brightness normalization",
            zero_norm_pixels
        );
    }
    (normalized, NormalizationReport { zero_norm_pixels })
}
