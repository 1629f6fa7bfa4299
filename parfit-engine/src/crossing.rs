/// Where a one-dimensional profile rises by the error definition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Crossing {
    pub(crate) offset: f64,
    pub(crate) valid: bool,
}

const MAX_ITERATIONS: usize = 30;

/// Find `t > 0` with `profile(t) - fmin == up` to within `tolerance * up`.
///
/// `profile(0)` is assumed to equal `fmin`. Steps assume the profile is
/// locally parabolic and fall back to bisection once the crossing is
/// bracketed. `limit` caps `t`; reaching it without crossing is invalid.
pub(crate) fn find(
    mut profile: impl FnMut(f64) -> f64,
    fmin: f64,
    up: f64,
    first_guess: f64,
    limit: Option<f64>,
    tolerance: f64,
) -> Crossing {
    let mut t = if first_guess > 0.0 && first_guess.is_finite() {
        first_guess
    } else {
        1.0
    };
    if let Some(limit) = limit {
        t = t.min(limit);
    }
    let mut inside = 0.0;
    let mut outside: Option<f64> = None;
    for _ in 0..MAX_ITERATIONS {
        let excess = profile(t) - fmin - up;
        if excess.abs() <= tolerance * up {
            return Crossing {
                offset: t,
                valid: true,
            };
        }
        if excess < 0.0 {
            inside = t;
            if limit.is_some_and(|limit| t >= limit) {
                return Crossing {
                    offset: t,
                    valid: false,
                };
            }
        } else {
            outside = Some(t);
        }

        let rise = excess + up;
        let mut next = if rise > 0.0 && rise.is_finite() {
            t * (up / rise).sqrt()
        } else {
            0.5 * t
        };
        match outside {
            Some(hi) => {
                if !(next > inside && next < hi) {
                    next = 0.5 * (inside + hi);
                }
            }
            None => {
                if next <= t {
                    next = 2.0 * t;
                }
            }
        }
        if let Some(limit) = limit {
            next = next.min(limit);
        }
        t = next;
    }
    Crossing {
        offset: t,
        valid: false,
    }
}
