use std::path::Path;

use tracing::info;

use super::{Case, CaseId, FitSummary, fit_failed};
use crate::{
    Error,
    fit::Model,
    ingest::{
        nist::{self, ReferenceDataset},
        read_source,
    },
    multistart::{MultiStart, base_starts, rational_starts},
};

/// `b1·(1 − e^(−b2·x))`
pub fn misra1a(p: &[f64], x: f64) -> f64 {
    p[0] * (1.0 - libm::exp(-p[1] * x))
}

/// Rational cubic over cubic. NaN near a pole.
pub fn hahn1(p: &[f64], x: f64) -> f64 {
    let x2 = x * x;
    let x3 = x2 * x;
    let num = p[0] + p[1] * x + p[2] * x2 + p[3] * x3;
    let den = 1.0 + p[4] * x + p[5] * x2 + p[6] * x3;
    if den.abs() < 1e-14 {
        return f64::NAN;
    }
    num / den
}

/// Sigmoidal growth `b1 / (1 + e^(b2 − b3·x))^(1/b4)`. NaN unless `b4 > 0`.
pub fn rat43(p: &[f64], x: f64) -> f64 {
    if p[3] <= 0.0 {
        return f64::NAN;
    }
    let exponent = (p[1] - p[2] * x).clamp(-700.0, 700.0);
    p[0] / libm::pow(1.0 + libm::exp(exponent), 1.0 / p[3])
}

/// A problem, its model and how to choose its starts.
struct Problem {
    file: &'static str,
    n_params: usize,
    model: Model,
    starts: fn(&ReferenceDataset) -> Vec<Vec<f64>>,
    positive: Option<usize>,
}

const PROBLEMS: [Problem; 3] = [
    Problem {
        file: "nist/Misra1a.dat",
        n_params: 2,
        model: misra1a,
        starts: base_starts,
        positive: None,
    },
    Problem {
        file: "nist/Hahn1.dat",
        n_params: 7,
        model: hahn1,
        starts: rational_starts,
        positive: None,
    },
    Problem {
        file: "nist/Rat43.dat",
        n_params: 4,
        model: rat43,
        starts: base_starts,
        positive: Some(3),
    },
];

pub(super) struct NistStrd {
    datasets: Vec<ReferenceDataset>,
}

impl Case for NistStrd {
    const ID: CaseId = CaseId::NistStrd;

    fn load(data_dir: &Path) -> Result<Self, Error> {
        let datasets = PROBLEMS
            .iter()
            .map(|problem| -> Result<ReferenceDataset, Error> {
                let text = read_source(&data_dir.join(problem.file))?;
                let ds = nist::parse(&text, problem.file, problem.n_params)?;
                info!(file = problem.file, name = %ds.name, points = ds.data.len(), "parsed");
                Ok(ds)
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { datasets })
    }

    fn solve(&self) -> Result<Vec<FitSummary>, Error> {
        PROBLEMS
            .iter()
            .zip(&self.datasets)
            .map(|(problem, ds)| -> Result<FitSummary, Error> {
                let mut fit = MultiStart::new(&ds.data, problem.model);
                if let Some(index) = problem.positive {
                    fit = fit.with_positive(index);
                }
                let starts = (problem.starts)(ds);
                let best = fit.run(&starts)?.ok_or_else(|| {
                    fit_failed(Self::ID, &ds.name, "no start reached a finite objective value")
                })?;
                if let Some(certified) = ds.certified_rss {
                    info!(
                        dataset = %ds.name,
                        start = best.start_index,
                        rss = best.fval,
                        certified,
                        "best of {} starts",
                        starts.len()
                    );
                }
                Ok(FitSummary {
                    label: ds.name.clone(),
                    fval: best.fval,
                    params: best.params,
                    nfcn: best.nfcn,
                })
            })
            .collect()
    }
}
