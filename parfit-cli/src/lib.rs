//! Shared plumbing for the `ref-runner` and `scientific-runner` binaries.
//!
//! Stdout carries only each runner's contract output. Logs and errors go
//! to stderr.

use colored::Colorize;

/// The run finished and its output was printed.
pub const EXIT_OK: i32 = 0;
/// Loading data or fitting failed.
pub const EXIT_FAILURE: i32 = 1;
/// The command line did not parse. Clap exits with this itself.
pub const EXIT_USAGE: i32 = 2;
/// The workload or case id is not registered.
pub const EXIT_UNKNOWN_ID: i32 = 3;

/// Send `tracing` events at `level` and above to stderr.
pub fn init_logging(level: tracing::Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Exit status for a failed run.
pub fn exit_code(error: &anyhow::Error) -> i32 {
    let unknown = error
        .downcast_ref::<parfit::Error>()
        .is_some_and(parfit::Error::is_unknown_id);
    if unknown { EXIT_UNKNOWN_ID } else { EXIT_FAILURE }
}

/// Print `error` with its context chain to stderr and exit.
pub fn fail(error: &anyhow::Error) -> ! {
    eprintln!("{}: {error:#}", "Error".red());
    std::process::exit(exit_code(error));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_ids_exit_3() {
        let err = anyhow::Error::new(parfit::Error::UnknownCase("x".to_owned()));
        assert_eq!(exit_code(&err), EXIT_UNKNOWN_ID);
        let err = anyhow::Error::new(parfit::Error::UnknownWorkload("x".to_owned()))
            .context("while looking up the workload");
        assert_eq!(exit_code(&err), EXIT_UNKNOWN_ID);
    }

    #[test]
    fn other_failures_exit_1() {
        let err = anyhow::Error::new(parfit::Error::Fit {
            case: "noaa_co2",
            dataset: "co2".to_owned(),
            reason: "minimum is not valid".to_owned(),
        });
        assert_eq!(exit_code(&err), EXIT_FAILURE);
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), EXIT_FAILURE);
    }
}
