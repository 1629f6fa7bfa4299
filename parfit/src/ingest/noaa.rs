use super::{Dataset, parse_number, split_csv};
use crate::IngestError;

const HEADER: &str = "year,month,decimal date";
const MIN_COLUMNS: usize = 8;
const DATE_COLUMN: usize = 2;
const VALUE_COLUMN: usize = 3;
const UNCERTAINTY_COLUMN: usize = 7;
/// Smallest uncertainty a point may carry.
pub const MIN_SIGMA: f64 = 1e-6;

/// Monthly means as (years since the first accepted month, value, uncertainty).
pub fn parse(text: &str, what: &str) -> Result<Dataset, IngestError> {
    let mut origin = None;
    let mut x = Vec::new();
    let mut y = Vec::new();
    let mut sigma = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(HEADER) {
            continue;
        }
        let columns = split_csv(line);
        if columns.len() < MIN_COLUMNS {
            continue;
        }
        let (Some(date), Some(value), Some(uncertainty)) = (
            parse_number(columns[DATE_COLUMN]),
            parse_number(columns[VALUE_COLUMN]),
            parse_number(columns[UNCERTAINTY_COLUMN]),
        ) else {
            continue;
        };
        // Missing months carry a negative sentinel uncertainty.
        if !uncertainty.is_finite() || uncertainty <= 0.0 {
            continue;
        }
        let origin = *origin.get_or_insert(date);
        x.push(date - origin);
        y.push(value);
        sigma.push(uncertainty.max(MIN_SIGMA));
    }
    if x.is_empty() {
        return Err(IngestError::Empty {
            what: what.to_owned(),
        });
    }
    Ok(Dataset {
        x,
        y,
        sigma: Some(sigma),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# CO2 monthly means
# comment line

year,month,decimal date,average,deseasonalized,ndays,sdev,unc
1974,5,1974.3750,333.19,329.79,-1,-9.99,-0.99
1974,6,1974.4583,332.20,330.71,-1,-9.99,0.25
1974,7,1974.5417,331.07,331.71,-1,-9.99,0.0000001
1974,8,1974.6250,329.15,332.12,-1,-9.99,nan
1974,9
1974,10,1974.7917,327.32,332.43,-1,-9.99,.31
";

    #[test]
    fn keeps_rows_with_positive_uncertainty() {
        let data = parse(SAMPLE, "co2").unwrap();
        assert_eq!(data.len(), 3);
        assert!((data.x[0]).abs() < 1e-12);
        assert!((data.x[1] - (1974.5417 - 1974.4583)).abs() < 1e-9);
        assert!((data.x[2] - (1974.7917 - 1974.4583)).abs() < 1e-9);
        assert_eq!(data.y, vec![332.20, 331.07, 327.32]);
        let sigma = data.sigma.unwrap();
        assert!((sigma[0] - 0.25).abs() < 1e-15);
        assert!((sigma[1] - MIN_SIGMA).abs() < 1e-15);
        assert!((sigma[2] - 0.31).abs() < 1e-15);
    }

    #[test]
    fn only_comments_is_empty() {
        let err = parse("# nothing\n\n# here\n", "co2").unwrap_err();
        assert!(matches!(err, IngestError::Empty { .. }));
    }
}
