use std::path::Path;

pub use self::number::{parse_floats, parse_number, split_csv};
use crate::IngestError;

/// Particle-physics event tables.
pub mod cern;
/// NIST Statistical Reference Datasets.
pub mod nist;
/// NOAA monthly CO₂ means.
pub mod noaa;
/// Locale-free numeric tokens.
mod number;
/// USGS earthquake catalogs.
pub mod usgs;

/// Index-aligned measurements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Independent values.
    pub x: Vec<f64>,
    /// Dependent values.
    pub y: Vec<f64>,
    /// One-sigma uncertainties of `y`, when the source has them.
    pub sigma: Option<Vec<f64>>,
}

impl Dataset {
    /// Number of points.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// No points at all?
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Read a whole file into memory. The handle is closed before parsing starts.
pub fn read_source(path: &Path) -> Result<String, IngestError> {
    std::fs::read_to_string(path).map_err(|error| IngestError::Io {
        path: path.to_owned(),
        error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_names_the_path() {
        let err = read_source(Path::new("definitely/not/here.csv")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("definitely/not/here.csv"), "{msg}");
    }
}
