use std::time::{Duration, Instant};

/// Prefix of the timing line.
pub const BENCH_PREFIX: &str = "BENCH_TIMES_S:";

/// Run `solve` `warmups` times untimed, then `repeats` times timed.
/// The first failure aborts the run and is returned as is.
#[mutants::skip]
pub fn run_benchmark<E>(
    mut solve: impl FnMut() -> Result<(), E>,
    repeats: u32,
    warmups: u32,
) -> Result<Vec<Duration>, E> {
    for _ in 0..warmups {
        solve()?;
    }
    let mut times = Vec::with_capacity(repeats as usize);
    for _ in 0..repeats {
        let start = Instant::now();
        solve()?;
        times.push(start.elapsed());
    }
    Ok(times)
}

/// `BENCH_TIMES_S:` followed by comma-separated seconds, 9 decimals each.
pub fn format_bench_times(times: &[Duration]) -> String {
    let seconds: Vec<String> = times
        .iter()
        .map(|t| format!("{:.9}", t.as_secs_f64()))
        .collect();
    format!("{BENCH_PREFIX}{}", seconds.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_warmups_and_repeats() {
        let mut calls = 0;
        let times = run_benchmark(
            || {
                calls += 1;
                Ok::<_, ()>(())
            },
            3,
            2,
        )
        .unwrap();
        assert_eq!(times.len(), 3);
        assert_eq!(calls, 5);
    }

    #[test]
    fn zero_repeats_times_nothing() {
        let times = run_benchmark(|| Ok::<_, ()>(()), 0, 0).unwrap();
        assert!(times.is_empty());
    }

    #[test]
    fn first_failure_aborts() {
        let mut calls = 0;
        let err = run_benchmark(
            || {
                calls += 1;
                if calls == 4 { Err(calls) } else { Ok(()) }
            },
            10,
            1,
        )
        .unwrap_err();
        assert_eq!(err, 4);
        assert_eq!(calls, 4);
    }

    #[test]
    fn warmup_failure_aborts() {
        let err = run_benchmark(|| Err::<(), _>("boom"), 5, 1).unwrap_err();
        assert_eq!(err, "boom");
    }

    #[test]
    fn formatting() {
        let times = [
            Duration::from_millis(1500),
            Duration::from_nanos(1),
            Duration::ZERO,
        ];
        assert_eq!(
            format_bench_times(&times),
            "BENCH_TIMES_S:1.500000000,0.000000001,0.000000000"
        );
        assert_eq!(format_bench_times(&[]), "BENCH_TIMES_S:");
    }
}
