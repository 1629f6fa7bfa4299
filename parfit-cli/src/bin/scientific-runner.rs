//! Runs one scientific case: ingest its datasets, fit, optionally time the fits.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use parfit::{BenchConfig, CaseId, Mode, format_bench_times, run_case};

#[derive(Parser)]
#[command(name = "scientific-runner", version, about, long_about = None)]
struct Cli {
    /// Case id: noaa_co2, nist_strd, usgs_earthquakes or cern_dimuon.
    #[arg(long)]
    case: String,

    /// How much of the case to run.
    #[arg(long, value_enum, default_value_t = ModeArg::Full)]
    mode: ModeArg,

    /// Timed solves. 0 runs the solve once, untimed.
    #[arg(long, default_value_t = 0)]
    bench_repeats: u32,

    /// Untimed solves before the timed ones.
    #[arg(long, default_value_t = 0)]
    bench_warmups: u32,

    /// Directory holding the `noaa/`, `nist/`, `usgs/` and `cern/` datasets.
    #[arg(long, env = "PARFIT_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Log verbosity (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn")]
    log_level: tracing::Level,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Ingest and solve.
    Full,
    /// Ingest only.
    LoadOnly,
    /// Same as full.
    SolveOnly,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Full => Mode::Full,
            ModeArg::LoadOnly => Mode::LoadOnly,
            ModeArg::SolveOnly => Mode::SolveOnly,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    parfit_cli::init_logging(cli.log_level);
    if let Err(e) = main_inner(&cli) {
        parfit_cli::fail(&e);
    }
}

fn main_inner(cli: &Cli) -> anyhow::Result<()> {
    let id: CaseId = cli.case.parse()?;
    let bench = BenchConfig {
        repeats: cli.bench_repeats,
        warmups: cli.bench_warmups,
    };
    let outcome = run_case(id, cli.mode.into(), bench, &cli.data_dir)
        .with_context(|| format!("case {id} with data from {}", cli.data_dir.display()))?;
    if let Some(times) = outcome.bench_times {
        println!("{}", format_bench_times(&times));
    }
    println!("ok {id}");
    Ok(())
}
