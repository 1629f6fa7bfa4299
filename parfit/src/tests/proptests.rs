use proptest::prelude::*;

use crate::{
    histogram::Histogram,
    ingest::{parse_floats, parse_number, usgs::cumulative_counts},
    multistart::{FitAttempt, best, step_sizes},
};

fn attempt(start_index: usize, fval: f64) -> FitAttempt {
    FitAttempt {
        start_index,
        fval,
        params: Vec::new(),
        valid: false,
        nfcn: 0,
    }
}

proptest! {
    #[test]
    fn cumulative_counts_never_increase(
        mags in proptest::collection::vec(4.0f64..9.0, 0..200),
        max in 4.5f64..9.0,
    ) {
        let c = cumulative_counts(&mags, 4.5, max, 0.1);
        prop_assert_eq!(c.thresholds.len(), c.counts.len());
        prop_assert!(c.counts.windows(2).all(|w| w[1] <= w[0]));
        prop_assert!(c.counts.iter().all(|&n| n > 0.0));
        prop_assert!(c.thresholds.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn best_is_no_worse_than_any_finite_attempt(
        fvals in proptest::collection::vec(
            prop_oneof![
                -1e6f64..1e6,
                Just(f64::NAN),
                Just(f64::INFINITY),
            ],
            0..30,
        ),
    ) {
        let attempts: Vec<FitAttempt> =
            fvals.iter().enumerate().map(|(i, &f)| attempt(i, f)).collect();
        match best(attempts) {
            Some(chosen) => {
                prop_assert!(chosen.fval.is_finite());
                for (i, &f) in fvals.iter().enumerate() {
                    if f.is_finite() {
                        prop_assert!(chosen.fval <= f);
                        if i < chosen.start_index {
                            prop_assert!(f > chosen.fval);
                        }
                    }
                }
            }
            None => prop_assert!(fvals.iter().all(|f| !f.is_finite())),
        }
    }

    #[test]
    fn numbers_survive_surrounding_text(x in -1e12f64..1e12, suffix in "[a-df-z]{0,4}") {
        let token = format!("{x:e}{suffix}");
        prop_assert_eq!(parse_number(&token), Some(x));
        let line = format!("b1 = ({x:e}) [{x}]");
        // `b1` has no numeric prefix.
        prop_assert_eq!(parse_floats(&line), vec![x, x]);
    }

    #[test]
    fn histogram_counts_in_range_samples(
        samples in proptest::collection::vec(-10.0f64..10.0, 0..300),
        bins in 1usize..50,
    ) {
        let h = Histogram::new(&samples, -5.0, 5.0, bins);
        let inside = samples.iter().filter(|&&s| (-5.0..5.0).contains(&s)).count();
        prop_assert_eq!(h.counts.iter().sum::<f64>() as usize, inside);
        prop_assert_eq!(h.centers.len(), bins);
        prop_assert!(h.uncertainties().iter().all(|&u| u >= 1.0));
    }

    #[test]
    fn steps_are_positive(start in proptest::collection::vec(-1e3f64..1e3, 1..8)) {
        for (step, s) in step_sizes(&start).iter().zip(&start) {
            prop_assert!(*step >= 1e-6);
            prop_assert!(*step >= s.abs() * 0.05);
        }
    }
}
