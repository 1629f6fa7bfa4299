use std::path::Path;

use tracing::info;

use super::{Case, CaseId, FitSummary, fit_failed};
use crate::{
    Error,
    histogram::{Histogram, fit_peak},
    ingest::{cern, read_source},
};

const MURUN_FILE: &str = "cern/MuRun2010B_0.csv";
const MURUN_COLUMN: &str = "M";
const ZMUMU_FILE: &str = "cern/Zmumu.csv";
const BINS: usize = 60;

/// A resonance to fit: where to histogram and where to start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    /// Resonance name.
    pub name: &'static str,
    /// Histogram range, low edge inclusive.
    pub low: f64,
    /// Histogram range, high edge exclusive.
    pub high: f64,
    /// Starting mass.
    pub mu0: f64,
    /// Starting width.
    pub sigma0: f64,
}

/// J/ψ in the MuRun sample, Z in the Zmumu sample.
pub const DIMUON_PEAKS: [Peak; 2] = [
    Peak {
        name: "J/psi",
        low: 2.0,
        high: 5.0,
        mu0: 3.10,
        sigma0: 0.12,
    },
    Peak {
        name: "Z",
        low: 60.0,
        high: 120.0,
        mu0: 91.0,
        sigma0: 2.5,
    },
];

impl Peak {
    /// Histogram of the samples inside the closed range `[low, high]`.
    fn histogram(&self, masses: &[f64]) -> Histogram {
        let window: Vec<f64> = masses
            .iter()
            .copied()
            .filter(|m| (self.low..=self.high).contains(m))
            .collect();
        Histogram::new(&window, self.low, self.high, BINS)
    }
}

pub(super) struct CernDimuon {
    histograms: [Histogram; 2],
}

impl Case for CernDimuon {
    const ID: CaseId = CaseId::CernDimuon;

    fn load(data_dir: &Path) -> Result<Self, Error> {
        let murun = read_source(&data_dir.join(MURUN_FILE))?;
        let jpsi = cern::parse_mass_column(&murun, MURUN_FILE, MURUN_COLUMN)?;
        let zmumu = read_source(&data_dir.join(ZMUMU_FILE))?;
        let z = cern::parse_dimuon_masses(&zmumu, ZMUMU_FILE)?;
        info!(jpsi = jpsi.len(), z = z.len(), "parsed dimuon masses");
        let [jpsi_peak, z_peak] = DIMUON_PEAKS;
        Ok(Self {
            histograms: [jpsi_peak.histogram(&jpsi), z_peak.histogram(&z)],
        })
    }

    fn solve(&self) -> Result<Vec<FitSummary>, Error> {
        DIMUON_PEAKS
            .iter()
            .zip(&self.histograms)
            .map(|(peak, hist)| -> Result<FitSummary, Error> {
                let min = fit_peak(hist, peak.mu0, peak.sigma0)?;
                if !min.is_valid() {
                    return Err(fit_failed(Self::ID, peak.name, "peak fit is not valid"));
                }
                Ok(FitSummary {
                    label: peak.name.to_owned(),
                    fval: min.fval(),
                    params: min.params(),
                    nfcn: min.nfcn(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_closed_but_histogram_is_half_open() {
        let h = DIMUON_PEAKS[0].histogram(&[1.99, 2.0, 3.1, 5.0, 5.01]);
        assert_eq!(h.bins(), BINS);
        assert!((h.counts.iter().sum::<f64>() - 2.0).abs() < 1e-15);
        assert!((h.counts[0] - 1.0).abs() < 1e-15);
    }

    #[test]
    fn fits_two_synthetic_peaks() {
        fn peak_samples(peak: &Peak, amp: f64, background: f64) -> Vec<f64> {
            let width = (peak.high - peak.low) / BINS as f64;
            (0..BINS)
                .flat_map(|i| {
                    let c = peak.low + (i as f64 + 0.5) * width;
                    let z = (c - peak.mu0) / peak.sigma0;
                    let n = (amp * (-0.5 * z * z).exp() + background).round() as usize;
                    std::iter::repeat_n(c, n)
                })
                .collect()
        }
        let [jpsi, z] = DIMUON_PEAKS;
        let case = CernDimuon {
            histograms: [
                jpsi.histogram(&peak_samples(&jpsi, 300.0, 30.0)),
                z.histogram(&peak_samples(&z, 500.0, 10.0)),
            ],
        };
        let fits = case.solve().unwrap();
        assert_eq!(fits.len(), 2);
        assert!((fits[0].params[1] - 3.10).abs() < 0.02, "{:?}", fits[0]);
        assert!((fits[1].params[1] - 91.0).abs() < 0.2, "{:?}", fits[1]);
    }
}
