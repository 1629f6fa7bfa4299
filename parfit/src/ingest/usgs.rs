use super::{parse_number, split_csv};
use crate::IngestError;

const MIN_COLUMNS: usize = 5;
const MAGNITUDE_COLUMN: usize = 4;

/// Magnitudes from a catalog export. The first line is always a header.
pub fn parse_magnitudes(text: &str, what: &str) -> Result<Vec<f64>, IngestError> {
    let magnitudes: Vec<f64> = text
        .lines()
        .skip(1)
        .filter_map(|line| {
            let columns = split_csv(line);
            if columns.len() < MIN_COLUMNS {
                return None;
            }
            parse_number(columns[MAGNITUDE_COLUMN]).filter(|m| m.is_finite())
        })
        .collect();
    if magnitudes.is_empty() {
        return Err(IngestError::Empty {
            what: what.to_owned(),
        });
    }
    Ok(magnitudes)
}

/// How many samples reach each threshold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cumulative {
    /// Thresholds, ascending.
    pub thresholds: Vec<f64>,
    /// Samples at or above the matching threshold. Never zero.
    pub counts: Vec<f64>,
}

/// Count samples at or above thresholds `min`, `min + step`, ... up to `max`.
///
/// Thresholds are accumulated by repeated addition, so they carry the same
/// rounding as a `t += step` loop. Thresholds no sample reaches are dropped,
/// which leaves the counts non-increasing.
pub fn cumulative_counts(samples: &[f64], min: f64, max: f64, step: f64) -> Cumulative {
    let mut out = Cumulative::default();
    if step <= 0.0 || !step.is_finite() {
        return out;
    }
    let mut threshold = min;
    while threshold <= max + 1e-12 {
        let count = samples.iter().filter(|&&s| s >= threshold).count();
        if count > 0 {
            out.thresholds.push(threshold);
            out.counts.push(count as f64);
        }
        threshold += step;
    }
    out
}
