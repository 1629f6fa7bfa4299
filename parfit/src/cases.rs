use std::{fmt, path::Path, str::FromStr, time::Duration};

use tracing::info;

use crate::{Error, bench::run_benchmark};

mod cern;
mod nist;
mod noaa;
mod usgs;

pub use self::cern::{DIMUON_PEAKS, Peak};
pub use self::nist::{hahn1, misra1a, rat43};
pub use self::noaa::seasonal_trend;
pub use self::usgs::gutenberg_richter;

/// Scientific cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseId {
    /// Seasonal trend of monthly CO₂ means.
    NoaaCo2,
    /// Three NIST reference nonlinear regressions.
    NistStrd,
    /// Gutenberg–Richter law from an earthquake catalog.
    UsgsEarthquakes,
    /// Dimuon resonance peaks.
    CernDimuon,
}

impl CaseId {
    /// Every case, in catalog order.
    pub const ALL: &'static [CaseId] = &[
        CaseId::NoaaCo2,
        CaseId::NistStrd,
        CaseId::UsgsEarthquakes,
        CaseId::CernDimuon,
    ];

    /// Command-line id.
    pub fn as_str(self) -> &'static str {
        match self {
            CaseId::NoaaCo2 => "noaa_co2",
            CaseId::NistStrd => "nist_strd",
            CaseId::UsgsEarthquakes => "usgs_earthquakes",
            CaseId::CernDimuon => "cern_dimuon",
        }
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| Error::UnknownCase(s.to_owned()))
    }
}

/// How much of a case to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Ingest and solve.
    #[default]
    Full,
    /// Ingest only.
    LoadOnly,
    /// Same as [`Mode::Full`]; ingestion cannot be skipped.
    SolveOnly,
}

impl Mode {
    /// Does this mode run the fits?
    pub fn solves(self) -> bool {
        !matches!(self, Mode::LoadOnly)
    }
}

/// Timed repetitions of a case's solve. Zero repeats means a single untimed solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BenchConfig {
    /// Timed solves.
    pub repeats: u32,
    /// Untimed solves before the timed ones.
    pub warmups: u32,
}

impl BenchConfig {
    /// Will the solve be timed?
    pub fn is_enabled(self) -> bool {
        self.repeats > 0
    }
}

/// One accepted fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FitSummary {
    /// Dataset or peak the fit belongs to.
    pub label: String,
    /// Final objective value.
    pub fval: f64,
    /// Best-fit parameters.
    pub params: Vec<f64>,
    /// Objective evaluations used.
    pub nfcn: usize,
}

/// What a case run produced.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CaseOutcome {
    /// Fits of the last solve. Empty for load-only runs.
    pub fits: Vec<FitSummary>,
    /// Per-repeat solve times, when benchmarking.
    pub bench_times: Option<Vec<Duration>>,
}

/// Load, then solve, one case.
trait Case: Sized {
    const ID: CaseId;

    /// Read and parse every file the case needs.
    fn load(data_dir: &Path) -> Result<Self, Error>;

    /// Run the fits and check acceptance.
    fn solve(&self) -> Result<Vec<FitSummary>, Error>;
}

fn fit_failed(case: CaseId, dataset: impl Into<String>, reason: impl Into<String>) -> Error {
    Error::Fit {
        case: case.as_str(),
        dataset: dataset.into(),
        reason: reason.into(),
    }
}

/// Run a case against the datasets under `data_dir`.
pub fn run_case(
    id: CaseId,
    mode: Mode,
    bench: BenchConfig,
    data_dir: &Path,
) -> Result<CaseOutcome, Error> {
    match id {
        CaseId::NoaaCo2 => drive::<noaa::NoaaCo2>(mode, bench, data_dir),
        CaseId::NistStrd => drive::<nist::NistStrd>(mode, bench, data_dir),
        CaseId::UsgsEarthquakes => drive::<usgs::UsgsEarthquakes>(mode, bench, data_dir),
        CaseId::CernDimuon => drive::<cern::CernDimuon>(mode, bench, data_dir),
    }
}

fn drive<C: Case>(mode: Mode, bench: BenchConfig, data_dir: &Path) -> Result<CaseOutcome, Error> {
    let case = C::load(data_dir)?;
    if !mode.solves() {
        info!(case = %C::ID, "loaded");
        return Ok(CaseOutcome::default());
    }
    if !bench.is_enabled() {
        let fits = case.solve()?;
        for fit in &fits {
            info!(
                case = %C::ID,
                fit = %fit.label,
                fval = fit.fval,
                nfcn = fit.nfcn,
                params = ?fit.params,
                "accepted"
            );
        }
        return Ok(CaseOutcome {
            fits,
            bench_times: None,
        });
    }
    let mut fits = Vec::new();
    let times = run_benchmark(
        || {
            fits = case.solve()?;
            Ok::<_, Error>(())
        },
        bench.repeats,
        bench.warmups,
    )?;
    info!(case = %C::ID, repeats = times.len(), "benchmarked");
    Ok(CaseOutcome {
        fits,
        bench_times: Some(times),
    })
}
