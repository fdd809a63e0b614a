use std::path::PathBuf;

use anyhow::Context;
use mnf_transform::{
    raster, report::VarianceReport, transform, Components, MnfOptions, NoiseEstimator,
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "mnf",
    about = "Minimum Noise Fraction transform of multi-band rasters",
    after_help = "The input raster is a NumPy array of shape (bands, rows, columns).
The MNF components are written next to it in <input>_MNF.npy
(<input>_MNF_BN.npy with brightness normalization)
and the cumulative explained variance in <input>_MNF.csv."
)]
struct Opt {
    /// Input raster
    #[structopt(short, long)]
    input: PathBuf,
    /// Number of components [default: all the bands]
    #[structopt(short, long, default_value = "all", allow_hyphen_values = true)]
    components: Components,
    /// Preprocessing: brightness normalization of hyperspectral data
    #[structopt(short = "p", long)]
    preprop: bool,
    /// Output raster [default: derived from the input]
    #[structopt(short, long)]
    output: Option<PathBuf>,
    /// Neighbour pairs used to estimate the noise: horizontal, vertical or both
    #[structopt(long, default_value = "both")]
    noise: NoiseEstimator,
    /// Write the cumulative variance of all the components, retained or not, in the report
    #[structopt(long)]
    full_variance: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let cube = raster::load(&opt.input)
        .with_context(|| format!("failed to load {:?}", opt.input))?;

    println!("Creating MNF components of {:?}", opt.input);
    let options = MnfOptions::default()
        .components(opt.components)
        .brightness_normalization(opt.preprop)
        .noise_estimator(opt.noise);
    let mnf = transform(&cube, &options).context("MNF transform failed")?;
    if mnf.zero_norm_pixels() > 0 {
        println!(
            "WARNING: {} zero norm pixel(s) set to zero by the brightness normalization",
            mnf.zero_norm_pixels()
        );
    }
    println!("The accumulative explained variance per component is:");
    println!("{:?}", mnf.variance().full());

    let output = opt
        .output
        .unwrap_or_else(|| raster::output_path(&opt.input, opt.preprop));
    raster::save(mnf.components(), &output)
        .with_context(|| format!("failed to save {:?}", output))?;

    let report = if opt.full_variance {
        VarianceReport::full(&mnf)
    } else {
        VarianceReport::retained(&mnf)
    };
    let report_path = raster::report_path(&opt.input);
    report
        .to_csv(&report_path)
        .with_context(|| format!("failed to write {:?}", report_path))?;

    Ok(())
}
