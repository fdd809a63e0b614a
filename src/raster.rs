//! Raster files
//!
//! Images are exchanged as NumPy `.npy` arrays of shape (bands, rows, columns),
//! the orientation of GeoTIFF readers. The input may be single or double
//! precision, the output is always written in double precision.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use npyz::{DType, NpyFile, Order, TypeChar, WriteOptions, WriterBuilder};

use crate::{cube::Cube, error::Result};

#[derive(thiserror::Error, Debug)]
pub enum RasterError {
    #[error("failed to access {path:?}")]
    File {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read or write the NPY array")]
    Io(#[from] std::io::Error),
    #[error("expected a 3D (bands, rows, columns) array, found shape {0:?}")]
    Shape(Vec<u64>),
    #[error("Fortran ordered arrays are not supported")]
    Layout,
    #[error("expected an array of f4 or f8 values, found {0}")]
    Dtype(String),
}

/// Reads a cube from a NPY array
pub fn read_npy<R: Read>(reader: R) -> Result<Cube> {
    let npy = NpyFile::new(reader).map_err(RasterError::from)?;
    let shape = npy.shape().to_vec();
    let &[bands, rows, cols] = shape.as_slice() else {
        return Err(RasterError::Shape(shape).into());
    };
    if let Order::Fortran = npy.order() {
        return Err(RasterError::Layout.into());
    }
    let data = match npy.dtype() {
        DType::Plain(ts) if ts.type_char() == TypeChar::Float && ts.size_field() == 8 => {
            npy.into_vec::<f64>().map_err(RasterError::from)?
        }
        DType::Plain(ts) if ts.type_char() == TypeChar::Float && ts.size_field() == 4 => npy
            .into_vec::<f32>()
            .map_err(RasterError::from)?
            .into_iter()
            .map(f64::from)
            .collect(),
        dtype => return Err(RasterError::Dtype(dtype.descr()).into()),
    };
    Cube::from_band_major(bands as usize, rows as usize, cols as usize, data)
}

/// Writes a cube into a NPY array
pub fn write_npy<W: Write>(cube: &Cube, writer: W) -> Result<()> {
    let (rows, cols, bands) = cube.shape();
    let mut npy = WriteOptions::<f64>::new()
        .default_dtype()
        .shape(&[bands as u64, rows as u64, cols as u64])
        .writer(writer)
        .begin_nd()
        .map_err(RasterError::from)?;
    npy.extend(cube.to_band_major())
        .map_err(RasterError::from)?;
    npy.finish().map_err(RasterError::from)?;
    Ok(())
}

/// Loads a cube from a `.npy` file
pub fn load<P: AsRef<Path>>(path: P) -> Result<Cube> {
    let path = path.as_ref();
    log::info!("Loading {:?}...", path);
    let file = File::open(path).map_err(|source| RasterError::File {
        path: path.to_path_buf(),
        source,
    })?;
    read_npy(BufReader::new(file))
}

/// Saves a cube into a `.npy` file
pub fn save<P: AsRef<Path>>(cube: &Cube, path: P) -> Result<()> {
    let path = path.as_ref();
    log::info!("Saving {:?}...", path);
    let file = File::create(path).map_err(|source| RasterError::File {
        path: path.to_path_buf(),
        source,
    })?;
    write_npy(cube, BufWriter::new(file))
}

fn with_suffix(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{stem}{suffix}"))
}

/// Path of the MNF components derived from the input path:
/// `<stem>_MNF.npy` or `<stem>_MNF_BN.npy` if the brightness normalization is applied
pub fn output_path<P: AsRef<Path>>(input: P, brightness_normalization: bool) -> PathBuf {
    if brightness_normalization {
        with_suffix(input.as_ref(), "_MNF_BN.npy")
    } else {
        with_suffix(input.as_ref(), "_MNF.npy")
    }
}

/// Path of the variance report derived from the input path: `<stem>_MNF.csv`
pub fn report_path<P: AsRef<Path>>(input: P) -> PathBuf {
    with_suffix(input.as_ref(), "_MNF.csv")
}
