//! Parity harnesses for the parfit minimization engine.
//!
//! Two catalogs live here. [`WorkloadId`]s exercise each engine algorithm on
//! a small synthetic objective and produce a [`RunResult`] with a fixed JSON
//! encoding. [`CaseId`]s ingest real measurement datasets, fit models to
//! them from one or more starting points and optionally time the solve.

pub use crate::adapter::run_workload;
pub use crate::bench::{format_bench_times, run_benchmark};
pub use crate::cases::{BenchConfig, CaseId, CaseOutcome, FitSummary, Mode, run_case};
pub use crate::error::{Error, IngestError};
pub use crate::objective::Objective;
pub use crate::result::{MinosSummary, RunResult};
pub use crate::workload::{Diagnostic, Minimizer, ParameterSpec, Workload, WorkloadId};

/// Runs a workload's algorithm sequence against the engine.
mod adapter;
/// Warmup-then-timed repeated execution of a solve.
pub mod bench;
/// Scientific cases: dataset ingestion, model fits and acceptance.
pub mod cases;
mod error;
/// Least-squares objectives over ingested datasets.
pub mod fit;
/// Fixed-width histograms and the peak-plus-background fit.
pub mod histogram;
/// Parsers from raw text to aligned numeric arrays.
pub mod ingest;
/// Fits from several starting points, keeping the best.
pub mod multistart;
/// Synthetic test objectives.
mod objective;
/// Canonical run result and its JSON encoding.
mod result;
/// The workload catalog.
mod workload;
