use parfit_engine::{EngineError, FunctionMinimum, Parameters};

use crate::fit::{FitConfig, LeastSquares};

/// Equal-width bin counts over `[low, high)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Bin centers.
    pub centers: Vec<f64>,
    /// Samples per bin.
    pub counts: Vec<f64>,
}

impl Histogram {
    /// Bin `samples` into `bins` equal-width bins over `[low, high)`.
    /// Samples outside the range are ignored.
    pub fn new(samples: &[f64], low: f64, high: f64, bins: usize) -> Self {
        let mut counts = vec![0.0; bins];
        let width = (high - low) / bins as f64;
        if let Some(last) = bins.checked_sub(1) {
            for &m in samples {
                if m < low || m >= high {
                    continue;
                }
                // Rounding can land a sample just below `high` one past the end.
                let idx = (((m - low) / width).floor() as usize).min(last);
                counts[idx] += 1.0;
            }
        }
        let centers = (0..bins).map(|i| low + (i as f64 + 0.5) * width).collect();
        Self { centers, counts }
    }

    /// Number of bins.
    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    /// Poisson uncertainty per bin, at least 1.
    pub fn uncertainties(&self) -> Vec<f64> {
        self.counts.iter().map(|&c| c.max(1.0).sqrt()).collect()
    }

    /// Largest bin count.
    pub fn max_count(&self) -> f64 {
        self.counts.iter().copied().fold(0.0, f64::max)
    }

    /// Mean bin count.
    pub fn mean_count(&self) -> f64 {
        self.counts.iter().sum::<f64>() / self.bins().max(1) as f64
    }
}

/// Narrowest peak width the model accepts.
pub const MIN_WIDTH: f64 = 0.05;
/// Background slope is measured from here.
pub const BACKGROUND_PIVOT: f64 = 91.0;
/// The model never predicts fewer counts than this.
pub const MIN_PREDICTION: f64 = 1e-9;

/// Gaussian peak over a linear background, parameters
/// `[amp, mu, sigma, c0, c1]`.
pub fn peak_model(p: &[f64], x: f64) -> f64 {
    let [amp, mu, sigma, c0, c1] = [p[0], p[1], p[2], p[3], p[4]];
    if sigma <= MIN_WIDTH {
        return f64::NAN;
    }
    let z = (x - mu) / sigma;
    let v = amp * libm::exp(-0.5 * z * z) + c0 + c1 * (x - BACKGROUND_PIVOT);
    // NaN passes through so the objective can penalize it.
    if v < MIN_PREDICTION { MIN_PREDICTION } else { v }
}

/// Starting parameters for a peak near `mu0` with width `sigma0`.
pub fn peak_parameters(hist: &Histogram, mu0: f64, sigma0: f64) -> Result<Parameters, EngineError> {
    let max_count = hist.max_count();
    let mut params = Parameters::new();
    let amp = params.add("amp", max_count, (0.1 * max_count).max(1.0));
    params.add("mu", mu0, (0.2 * sigma0).max(0.01));
    let sigma = params.add("sigma", sigma0, (0.1 * sigma0).max(0.01));
    let c0 = params.add("c0", hist.mean_count().max(1.0), 0.5);
    params.add("c1", 0.0, 0.05);
    params.set_lower_limit(amp, 0.0)?;
    params.set_lower_limit(sigma, MIN_WIDTH)?;
    params.set_lower_limit(c0, 0.0)?;
    Ok(params)
}

/// χ² fit of [`peak_model`] to a histogram, from a single start.
pub fn fit_peak(hist: &Histogram, mu0: f64, sigma0: f64) -> Result<FunctionMinimum, EngineError> {
    let sigma = hist.uncertainties();
    let fcn = LeastSquares::weighted(&hist.centers, &hist.counts, &sigma, peak_model);
    let params = peak_parameters(hist, mu0, sigma0)?;
    Ok(FitConfig::CASE.migrad(&fcn, &params))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binning() {
        let h = Histogram::new(&[0.0, 0.5, 0.99, 1.0, 3.999, 4.0, -0.1], 0.0, 4.0, 4);
        assert_eq!(h.counts, vec![3.0, 1.0, 0.0, 1.0]);
        assert_eq!(h.centers, vec![0.5, 1.5, 2.5, 3.5]);
        assert_eq!(h.bins(), 4);
        assert_eq!(h.uncertainties(), vec![3f64.sqrt(), 1.0, 1.0, 1.0]);
        assert!((h.max_count() - 3.0).abs() < 1e-15);
        assert!((h.mean_count() - 1.25).abs() < 1e-15);
    }

    #[test]
    fn zero_bins() {
        let h = Histogram::new(&[1.0], 0.0, 2.0, 0);
        assert!(h.counts.is_empty());
        assert!(h.mean_count().abs() < 1e-15);
    }

    #[test]
    fn model_guards() {
        assert!(peak_model(&[10.0, 91.0, 0.05, 1.0, 0.0], 91.0).is_nan());
        assert!((peak_model(&[10.0, 91.0, 2.0, 1.0, 0.0], 91.0) - 11.0).abs() < 1e-12);
        let floor = peak_model(&[0.0, 91.0, 2.0, -5.0, 0.0], 91.0);
        assert!((floor - MIN_PREDICTION).abs() < 1e-20);
        assert!(peak_model(&[f64::NAN, 91.0, 2.0, 1.0, 0.0], 91.0).is_nan());
    }

    #[test]
    fn starting_values() {
        let h = Histogram::new(&[1.0, 1.0, 3.0], 0.0, 4.0, 2);
        let p = peak_parameters(&h, 1.0, 0.02).unwrap();
        assert_eq!(p.values(), vec![2.0, 1.0, 0.02, 1.5, 0.0]);
        assert_eq!(p.errors(), vec![1.0, 0.01, 0.01, 0.5, 0.05]);
        assert_eq!(p[0].lower(), Some(0.0));
        assert_eq!(p[2].lower(), Some(MIN_WIDTH));
        assert_eq!(p[3].lower(), Some(0.0));
        assert!(!p[4].has_limits());
    }

    #[test]
    fn recovers_a_synthetic_peak() {
        // Deterministic counts shaped like the model, no noise.
        let truth = [400.0, 91.0, 2.5, 20.0, 0.0];
        let centers: Vec<f64> = (0..60).map(|i| 60.0 + (f64::from(i) + 0.5)).collect();
        let samples: Vec<f64> = centers
            .iter()
            .flat_map(|&c| {
                let n = peak_model(&truth, c).round() as usize;
                std::iter::repeat_n(c, n)
            })
            .collect();
        let h = Histogram::new(&samples, 60.0, 120.0, 60);
        let min = fit_peak(&h, 91.0, 2.5).unwrap();
        assert!(min.is_valid());
        let p = min.params();
        assert!((p[1] - 91.0).abs() < 0.1, "{p:?}");
        assert!((p[2] - 2.5).abs() < 0.2, "{p:?}");
    }
}
