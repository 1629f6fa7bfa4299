use std::{f64::consts::TAU, path::Path};

use parfit_engine::Parameters;
use tracing::info;

use super::{Case, CaseId, FitSummary, fit_failed};
use crate::{
    Error,
    fit::{FitConfig, LeastSquares},
    ingest::{self, Dataset, read_source},
};

const FILE: &str = "noaa/co2_mm_mlo.csv";

/// Quadratic trend with annual and semiannual harmonics and a growing
/// annual amplitude. `t` is in years.
pub fn seasonal_trend(p: &[f64], t: f64) -> f64 {
    let w1 = TAU * t;
    let w2 = 2.0 * w1;
    let (s1, c1) = libm::sincos(w1);
    let (s2, c2) = libm::sincos(w2);
    p[0] + p[1] * t + p[2] * t * t + p[3] * s1 + p[4] * c1 + p[5] * s2 + p[6] * c2 + p[7] * t * s1
}

pub(super) struct NoaaCo2 {
    data: Dataset,
}

impl NoaaCo2 {
    fn parameters(&self) -> Parameters {
        let mut p = Parameters::new();
        p.add("a0", self.data.y[0], 0.5);
        p.add("a1", 2.0, 0.2);
        p.add("a2", 0.0, 0.01);
        p.add("b1", 2.0, 0.2);
        p.add("c1", 0.0, 0.2);
        p.add("b2", 0.5, 0.1);
        p.add("c2", 0.0, 0.1);
        p.add("d1", 0.0, 0.01);
        p
    }
}

impl Case for NoaaCo2 {
    const ID: CaseId = CaseId::NoaaCo2;

    fn load(data_dir: &Path) -> Result<Self, Error> {
        let text = read_source(&data_dir.join(FILE))?;
        let data = ingest::noaa::parse(&text, FILE)?;
        info!(file = FILE, months = data.len(), "parsed");
        Ok(Self { data })
    }

    fn solve(&self) -> Result<Vec<FitSummary>, Error> {
        let fcn = LeastSquares::of(&self.data, seasonal_trend);
        let min = FitConfig::CASE.migrad_hesse(&fcn, &self.parameters());
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

    #[test]
    fn harmonics() {
        let p = [1.0, 0.0, 0.0, 0.0, 2.0, 0.0, 3.0, 0.0];
        // cos terms peak at whole years.
        assert!((seasonal_trend(&p, 0.0) - 6.0).abs() < 1e-12);
        assert!((seasonal_trend(&p, 0.5) - (1.0 - 2.0 + 3.0)).abs() < 1e-12);
        let trend = [1.0, 2.0, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0];
        assert!((seasonal_trend(&trend, 2.0) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn recovers_synthetic_curve() {
        let truth = [330.0, 1.5, 0.01, 2.5, -1.0, 0.7, 0.2, 0.01];
        let x: Vec<f64> = (0..240).map(|i| f64::from(i) / 12.0).collect();
        let y = x.iter().map(|&t| seasonal_trend(&truth, t)).collect();
        let sigma = vec![0.1; x.len()];
        let case = NoaaCo2 {
            data: Dataset {
                x,
                y,
                sigma: Some(sigma),
            },
        };
        let fits = case.solve().unwrap();
        assert_eq!(fits.len(), 1);
        assert!((fits[0].params[1] - 1.5).abs() < 1e-2, "{:?}", fits[0].params);
        assert!(fits[0].fval < 1.0);
    }
}
