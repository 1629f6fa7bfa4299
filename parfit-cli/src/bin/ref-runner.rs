//! Runs one registered workload and prints its result as a JSON line.

use anyhow::Context;
use clap::Parser;
use parfit::{WorkloadId, run_workload};

#[derive(Parser)]
#[command(name = "ref-runner", version, about, long_about = None)]
struct Cli {
    /// Workload id, e.g. `quadratic2_minos_p0`.
    #[arg(
        long,
        required_unless_present = "list",
        value_parser = clap::builder::NonEmptyStringValueParser::new()
    )]
    workload: Option<String>,

    /// Print every workload id and exit.
    #[arg(long, conflicts_with = "workload")]
    list: bool,

    /// Log verbosity (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn")]
    log_level: tracing::Level,
}

fn main() {
    let cli = Cli::parse();
    parfit_cli::init_logging(cli.log_level);
    if let Err(e) = main_inner(&cli) {
        parfit_cli::fail(&e);
    }
}

fn main_inner(cli: &Cli) -> anyhow::Result<()> {
    if cli.list {
        for id in WorkloadId::ALL {
            println!("{id}");
        }
        return Ok(());
    }
    let name = cli.workload.as_deref().context("--workload is required")?;
    let id: WorkloadId = name.parse()?;
    let result = run_workload(id).with_context(|| format!("running workload {id}"))?;
    println!("{}", result.to_json()?);
    Ok(())
}
