use std::{f64::consts::LN_10, path::Path};

use parfit_engine::Parameters;
use tracing::info;

use super::{Case, CaseId, FitSummary, fit_failed};
use crate::{
    Error, IngestError,
    fit::{FitConfig, LeastSquares},
    ingest::{self, Dataset, read_source},
};

const FILE: &str = "usgs/earthquakes_2025_m4p5.csv";
/// Catalog completeness threshold.
const MIN_MAGNITUDE: f64 = 4.5;
const MAGNITUDE_STEP: f64 = 0.1;

/// `log10 N(≥m) = a − b·m`.
pub fn gutenberg_richter(p: &[f64], m: f64) -> f64 {
    p[0] - p[1] * m
}

pub(super) struct UsgsEarthquakes {
    /// Magnitude thresholds against log10 of the cumulative count.
    data: Dataset,
}

impl UsgsEarthquakes {
    fn from_magnitudes(magnitudes: &[f64]) -> Self {
        let max = magnitudes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let cumulative =
            ingest::usgs::cumulative_counts(magnitudes, MIN_MAGNITUDE, max.floor(), MAGNITUDE_STEP);
        let y = cumulative.counts.iter().map(|&n| n.log10()).collect();
        let sigma = cumulative
            .counts
            .iter()
            .map(|&n| 1.0 / (LN_10 * n.sqrt()))
            .collect();
        Self {
            data: Dataset {
                x: cumulative.thresholds,
                y,
                sigma: Some(sigma),
            },
        }
    }
}

impl Case for UsgsEarthquakes {
    const ID: CaseId = CaseId::UsgsEarthquakes;

    fn load(data_dir: &Path) -> Result<Self, Error> {
        let text = read_source(&data_dir.join(FILE))?;
        let magnitudes = ingest::usgs::parse_magnitudes(&text, FILE)?;
        let case = Self::from_magnitudes(&magnitudes);
        if case.data.is_empty() {
            return Err(IngestError::Empty {
                what: format!("{FILE} above magnitude {MIN_MAGNITUDE}"),
            }
            .into());
        }
        info!(
            file = FILE,
            events = magnitudes.len(),
            thresholds = case.data.len(),
            "parsed"
        );
        Ok(case)
    }

    fn solve(&self) -> Result<Vec<FitSummary>, Error> {
        let fcn = LeastSquares::of(&self.data, gutenberg_richter);
        let mut params = Parameters::new();
        params.add("a", 5.0, 0.1);
        params.add("b", 1.0, 0.05);
        let min = FitConfig::CASE.migrad_hesse(&fcn, &params);
        if !min.is_valid() {
            return Err(fit_failed(Self::ID, FILE, "minimum is not valid"));
        }
        Ok(vec![FitSummary {
            label: FILE.to_owned(),
            fval: min.fval(),
            params: min.params(),
            nfcn: min.nfcn(),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Magnitudes with `10^(a - b m)` events at or above each 0.1 step.
    fn catalog(a: f64, b: f64) -> Vec<f64> {
        let mut mags = Vec::new();
        let mut m = MIN_MAGNITUDE;
        while m < 7.0 {
            let above = 10f64.powf(a - b * m).round() as usize;
            let above_next = 10f64.powf(a - b * (m + MAGNITUDE_STEP)).round() as usize;
            mags.extend(std::iter::repeat_n(m + 0.05, above - above_next));
            m += MAGNITUDE_STEP;
        }
        mags
    }

    #[test]
    fn thresholds_stop_at_floor_of_max() {
        let case = UsgsEarthquakes::from_magnitudes(&[4.5, 4.8, 6.9]);
        // 4.5 ..= 6.0
        assert_eq!(case.data.len(), 16);
        assert!((case.data.y[0] - 3f64.log10()).abs() < 1e-12);
        let sigma = case.data.sigma.as_ref().unwrap();
        assert!((sigma[15] - 1.0 / LN_10).abs() < 1e-12);
    }

    #[test]
    fn catalog_below_first_full_step_is_empty() {
        // 4.8 floors to 4.0, under the completeness threshold.
        let case = UsgsEarthquakes::from_magnitudes(&[4.5, 4.8]);
        assert!(case.data.is_empty());

        let dir = std::env::temp_dir().join(format!("parfit-usgs-empty-{}", std::process::id()));
        let path = dir.join(FILE);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let row = |mag: f64| {
            format!("2025-01-01T00:00:00.000Z,0,0,10,{mag},mb,,1,1,1,us,us1,2025-01-01T00:00:00.000Z,\"x\",earthquake")
        };
        let text = format!(
            "time,latitude,longitude,depth,mag,magType,nst,gap,dmin,rms,net,id,updated,place,type\n{}\n{}\n",
            row(4.5),
            row(4.8)
        );
        std::fs::write(&path, text).unwrap();
        let loaded = UsgsEarthquakes::load(&dir);
        std::fs::remove_dir_all(&dir).unwrap();
        assert!(
            matches!(loaded, Err(Error::Ingest(IngestError::Empty { .. }))),
            "{:?}",
            loaded.err()
        );
    }

    #[test]
    fn recovers_b_value() {
        let case = UsgsEarthquakes::from_magnitudes(&catalog(8.0, 1.0));
        let fits = case.solve().unwrap();
        let p = &fits[0].params;
        assert!((p[1] - 1.0).abs() < 0.1, "{p:?}");
    }
}
