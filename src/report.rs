//! Cumulative explained variance report

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::mnf::MnfOutput;

#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error("failed to write the CSV report")]
    Csv(#[from] csv::Error),
    #[error("failed to flush the CSV report")]
    Io(#[from] std::io::Error),
}
type Result<T> = std::result::Result<T, ReportError>;

/// Report entry: a component label and its cumulative explained variance
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Record {
    #[serde(rename = "Bands")]
    pub band: String,
    #[serde(rename = "AccVariance")]
    pub acc_variance: f64,
}

/// Cumulative explained variance table
#[derive(Debug, Clone, PartialEq)]
pub struct VarianceReport(Vec<Record>);
impl VarianceReport {
    fn from_profile(profile: &[f64], n_retained: usize, full: bool) -> Self {
        let n = if full {
            profile.len()
        } else {
            n_retained.min(profile.len())
        };
        Self(
            profile
                .iter()
                .take(n)
                .enumerate()
                .map(|(i, &acc_variance)| Record {
                    band: if i < n_retained {
                        format!("MNF{}", i + 1)
                    } else {
                        "NA".to_string()
                    },
                    acc_variance,
                })
                .collect(),
        )
    }
    /// Report of the retained components
    pub fn retained(output: &MnfOutput) -> Self {
        Self::from_profile(output.variance(), output.n_components(), false)
    }
    /// Report of all the components
    ///
    /// The components that are not retained are labeled `NA`
    pub fn full(output: &MnfOutput) -> Self {
        Self::from_profile(output.variance(), output.n_components(), true)
    }
    pub fn records(&self) -> &[Record] {
        &self.0
    }
    /// Writes the report as CSV
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for record in &self.0 {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        Ok(())
    }
    /// Writes the report into a CSV file
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        log::info!("Writing {:?}...", path.as_ref());
        let file = File::create(path)?;
        self.to_writer(BufWriter::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn retained_and_full() {
        let profile = [61.5, 90.25, 99.99];
        let retained = VarianceReport::from_profile(&profile, 2, false);
        assert_eq!(
            retained.records(),
            &[
                Record {
                    band: "MNF1".into(),
                    acc_variance: 61.5
                },
                Record {
                    band: "MNF2".into(),
                    acc_variance: 90.25
                }
            ]
        );
        let full = VarianceReport::from_profile(&profile, 2, true);
        assert_eq!(full.records().len(), 3);
        assert_eq!(full.records()[2].band, "NA");
        assert_eq!(full.records()[2].acc_variance, 99.99);
    }

    #[test]
    fn csv_layout() -> std::result::Result<(), Box<dyn Error>> {
        let report = VarianceReport::from_profile(&[75., 100.], 2, false);
        let mut buffer = vec![];
        report.to_writer(&mut buffer)?;
        let mut rdr = csv::Reader::from_reader(buffer.as_slice());
        assert_eq!(
            rdr.headers()?.iter().collect::<Vec<_>>(),
            vec!["Bands", "AccVariance"]
        );
        let records: Vec<Record> = rdr.deserialize().collect::<std::result::Result<_, _>>()?;
        assert_eq!(records, report.records());
        Ok(())
    }
}
