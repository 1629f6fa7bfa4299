use parfit_engine::{EngineError, Parameters};
use tracing::debug;

use crate::{
    fit::{FitConfig, LeastSquares, Model},
    ingest::{Dataset, nist::ReferenceDataset},
};

/// Lower bound of a parameter constrained to be positive.
pub const POSITIVE_FLOOR: f64 = 1e-6;
const SCALES: [f64; 4] = [0.25, 0.5, 1.5, 2.0];
const NUDGE_UP: f64 = 1.35;
const NUDGE_DOWN: f64 = 0.65;

/// The two published starting points.
pub fn base_starts(ds: &ReferenceDataset) -> Vec<Vec<f64>> {
    vec![ds.start_a.clone(), ds.start_b.clone()]
}

/// The published starts, the certified values, their midpoint, scaled copies
/// of both starts, and the second start with one parameter nudged up or
/// down at a time. For `n` parameters this is `12 + 2n` starts.
pub fn rational_starts(ds: &ReferenceDataset) -> Vec<Vec<f64>> {
    let (a, b) = (&ds.start_a, &ds.start_b);
    let mid = a.iter().zip(b).map(|(a, b)| 0.5 * (a + b)).collect();
    let mut starts = vec![a.clone(), b.clone(), ds.certified.clone(), mid];
    for scale in SCALES {
        starts.push(a.iter().map(|v| v * scale).collect());
        starts.push(b.iter().map(|v| v * scale).collect());
    }
    for i in 0..b.len() {
        for nudge in [NUDGE_UP, NUDGE_DOWN] {
            let mut s = b.clone();
            s[i] *= nudge;
            starts.push(s);
        }
    }
    starts
}

/// Initial step per parameter: 5% of the start, never below 1e-6.
pub fn step_sizes(start: &[f64]) -> Vec<f64> {
    start.iter().map(|s| (s.abs() * 0.05).max(1e-6)).collect()
}

/// Outcome of one start.
#[derive(Debug, Clone, PartialEq)]
pub struct FitAttempt {
    /// Position in the start list.
    pub start_index: usize,
    /// Final objective value.
    pub fval: f64,
    /// Final parameter values.
    pub params: Vec<f64>,
    /// Did the engine report a valid minimum?
    pub valid: bool,
    /// Objective evaluations used.
    pub nfcn: usize,
}

/// Least-squares fits of one model to one dataset from many starts.
#[derive(Clone, Copy)]
pub struct MultiStart<'a> {
    fcn: LeastSquares<'a>,
    positive: Option<usize>,
    config: FitConfig,
}

impl<'a> MultiStart<'a> {
    /// Fit `model` to `data`, weighting by its uncertainties if it has any.
    pub fn new(data: &'a Dataset, model: Model) -> Self {
        Self {
            fcn: LeastSquares::of(data, model),
            positive: None,
            config: FitConfig::MULTI_START,
        }
    }

    /// Keep parameter `index` at or above [`POSITIVE_FLOOR`].
    pub fn with_positive(mut self, index: usize) -> Self {
        self.positive = Some(index);
        self
    }

    /// Override the per-attempt engine settings.
    pub fn with_config(mut self, config: FitConfig) -> Self {
        self.config = config;
        self
    }

    fn parameters(&self, start: &[f64]) -> Result<Parameters, EngineError> {
        let mut params = Parameters::new();
        for (i, (&value, step)) in start.iter().zip(step_sizes(start)).enumerate() {
            params.add(format!("b{}", i + 1), value, step);
        }
        if let Some(index) = self.positive.filter(|&i| i < start.len()) {
            params.set_lower_limit(index, POSITIVE_FLOOR)?;
        }
        Ok(params)
    }

    /// Fit from a single start.
    pub fn attempt(&self, start_index: usize, start: &[f64]) -> Result<FitAttempt, EngineError> {
        let params = self.parameters(start)?;
        let min = self.config.migrad(&self.fcn, &params);
        let attempt = FitAttempt {
            start_index,
            fval: min.fval(),
            params: min.params(),
            valid: min.is_valid(),
            nfcn: min.nfcn(),
        };
        debug!(
            start = start_index,
            fval = attempt.fval,
            valid = attempt.valid,
            nfcn = attempt.nfcn,
            "multi-start attempt"
        );
        Ok(attempt)
    }

    /// Fit from every start and keep the best. `None` if no attempt ended
    /// with a finite objective value.
    pub fn run(&self, starts: &[Vec<f64>]) -> Result<Option<FitAttempt>, EngineError> {
        let attempts = starts
            .iter()
            .enumerate()
            .map(|(i, s)| self.attempt(i, s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(best(attempts))
    }
}

/// Smallest finite objective value. Ties keep the earliest attempt.
pub fn best(attempts: impl IntoIterator<Item = FitAttempt>) -> Option<FitAttempt> {
    attempts
        .into_iter()
        .filter(|a| a.fval.is_finite())
        .fold(None, |best: Option<FitAttempt>, a| match best {
            Some(b) if b.fval <= a.fval => Some(b),
            _ => Some(a),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(n: usize) -> ReferenceDataset {
        ReferenceDataset {
            name: "r".to_owned(),
            data: Dataset::default(),
            start_a: (1..=n).map(|i| i as f64).collect(),
            start_b: (1..=n).map(|i| 10.0 * i as f64).collect(),
            certified: vec![7.0; n],
            certified_rss: None,
        }
    }

    fn attempt(start_index: usize, fval: f64) -> FitAttempt {
        FitAttempt {
            start_index,
            fval,
            params: Vec::new(),
            valid: true,
            nfcn: 0,
        }
    }

    #[test]
    fn base_is_both_published_starts() {
        let ds = reference(2);
        assert_eq!(base_starts(&ds), vec![vec![1.0, 2.0], vec![10.0, 20.0]]);
    }

    #[test]
    fn rational_start_order() {
        let ds = reference(7);
        let starts = rational_starts(&ds);
        assert_eq!(starts.len(), 26);
        assert_eq!(starts[0], ds.start_a);
        assert_eq!(starts[1], ds.start_b);
        assert_eq!(starts[2], ds.certified);
        assert_eq!(starts[3][0], 5.5);
        assert_eq!(starts[4][0], 0.25);
        assert_eq!(starts[5][0], 2.5);
        assert_eq!(starts[10][6], 14.0);
        assert_eq!(starts[11][6], 140.0);
        // Nudges of b1, then b2, ...
        assert_eq!(starts[12][0], 10.0 * 1.35);
        assert_eq!(starts[13][0], 10.0 * 0.65);
        assert_eq!(&starts[12][1..], &ds.start_b[1..]);
        assert_eq!(starts[25][6], 70.0 * 0.65);
        assert_eq!(&starts[25][..6], &ds.start_b[..6]);
    }

    #[test]
    fn steps_are_floored() {
        assert_eq!(step_sizes(&[100.0, -2.0, 0.0]), vec![5.0, 0.1, 1e-6]);
    }

    #[test]
    fn best_skips_non_finite_and_keeps_first_tie() {
        let picked = best([
            attempt(0, f64::NAN),
            attempt(1, 3.0),
            attempt(2, 1.0),
            attempt(3, f64::INFINITY),
            attempt(4, 1.0),
        ])
        .unwrap();
        assert_eq!(picked.start_index, 2);
        assert_eq!(best([attempt(0, f64::INFINITY)]), None);
        assert_eq!(best(Vec::new()), None);
    }

    fn exponential(p: &[f64], x: f64) -> f64 {
        p[0] * (1.0 - libm::exp(-p[1] * x))
    }

    #[test]
    fn fits_every_start() {
        let x: Vec<f64> = (1..=12).map(|i| 50.0 * f64::from(i)).collect();
        let y = x.iter().map(|&x| exponential(&[240.0, 5.5e-4], x)).collect();
        let data = Dataset { x, y, sigma: None };
        let fit = MultiStart::new(&data, exponential);
        let best = fit
            .run(&[vec![500.0, 1e-4], vec![250.0, 5e-4]])
            .unwrap()
            .unwrap();
        assert!(best.fval < 1e-3, "{best:?}");
        assert!((best.params[0] - 240.0).abs() < 1.0, "{best:?}");
    }

    #[test]
    fn positive_bound_applies() {
        let data = Dataset::default();
        let fit = MultiStart::new(&data, exponential).with_positive(1);
        let params = fit.parameters(&[1.0, 2.0]).unwrap();
        assert_eq!(params[1].lower(), Some(POSITIVE_FLOOR));
        assert_eq!(params[1].name(), "b2");
        // Out-of-range index is ignored.
        let fit = MultiStart::new(&data, exponential).with_positive(5);
        assert!(fit.parameters(&[1.0]).is_ok());
    }
}
