use super::{Dataset, parse_floats};
use crate::IngestError;

/// A NIST StRD nonlinear-regression problem.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceDataset {
    /// From the `Dataset Name:` line, or the caller's label.
    pub name: String,
    /// Observations, unweighted.
    pub data: Dataset,
    /// First published starting point.
    pub start_a: Vec<f64>,
    /// Second published starting point.
    pub start_b: Vec<f64>,
    /// Certified parameter values.
    pub certified: Vec<f64>,
    /// Certified residual sum of squares, if listed.
    pub certified_rss: Option<f64>,
}

impl ReferenceDataset {
    /// Number of model parameters.
    pub fn n_params(&self) -> usize {
        self.certified.len()
    }
}

/// Parse a StRD `.dat` file for a model with `n_params` parameters.
pub fn parse(text: &str, what: &str, n_params: usize) -> Result<ReferenceDataset, IngestError> {
    let mut name = None;
    let mut certified_rss = None;
    let mut start_a = Vec::new();
    let mut start_b = Vec::new();
    let mut certified = Vec::new();
    let mut data = Dataset::default();
    let mut in_data = false;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix("Dataset Name:") {
            name = rest.split_whitespace().next().map(str::to_owned);
            continue;
        }
        if let Some(rest) = line.strip_prefix("Residual Sum of Squares:") {
            certified_rss = parse_floats(rest).last().copied();
            continue;
        }
        // `b3 = start1 start2 certified stddev`
        if let Some((lhs, rhs)) = line.split_once('=')
            && lhs.trim_start().starts_with('b')
        {
            if let [a, b, c, _, ..] = parse_floats(rhs)[..] {
                start_a.push(a);
                start_b.push(b);
                certified.push(c);
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix("Data:")
            && rest.trim_start().starts_with('y')
        {
            in_data = true;
            continue;
        }
        if in_data && let [y, x, ..] = parse_floats(line)[..] {
            data.y.push(y);
            data.x.push(x);
        }
    }

    if [start_a.len(), start_b.len(), certified.len()] != [n_params; 3] {
        return Err(IngestError::WrongParameterCount {
            what: what.to_owned(),
            expected: n_params,
            start_a: start_a.len(),
            start_b: start_b.len(),
            certified: certified.len(),
        });
    }
    if !in_data {
        return Err(IngestError::MissingDataSection {
            what: what.to_owned(),
        });
    }
    if data.is_empty() {
        return Err(IngestError::Empty {
            what: what.to_owned(),
        });
    }
    Ok(ReferenceDataset {
        name: name.unwrap_or_else(|| what.to_owned()),
        data,
        start_a,
        start_b,
        certified,
        certified_rss,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISRA: &str = "\
NIST/ITL StRD
Dataset Name:  Misra1a           (Misra1a.dat)

Model:         Exponential Class
               2 Parameters (b1 to b2)

               y = b1*(1-exp[-b2*x])  +  e

          Starting values                  Certified Values

        Start 1     Start 2           Parameter     Standard Deviation
  b1 =   500         250           2.3894212918E+02  2.7070075241E+00
  b2 =   1.0E-04     5.0E-04       5.5015643181E-04  7.2668688436E-06

Residual Sum of Squares:                    1.2455138894E-01

Data:   y               x
      10.07E0      77.6E0
      14.73E0     114.9E0
      17.94E0     141.1E0
";

    #[test]
    fn reads_starts_certified_and_data() {
        let ds = parse(MISRA, "nist/Misra1a.dat", 2).unwrap();
        assert_eq!(ds.name, "Misra1a");
        assert_eq!(ds.start_a, vec![500.0, 1.0e-4]);
        assert_eq!(ds.start_b, vec![250.0, 5.0e-4]);
        assert_eq!(ds.certified, vec![2.3894212918E+02, 5.5015643181E-04]);
        assert_eq!(ds.certified_rss, Some(1.2455138894E-01));
        assert_eq!(ds.data.y, vec![10.07, 14.73, 17.94]);
        assert_eq!(ds.data.x, vec![77.6, 114.9, 141.1]);
        assert!(ds.data.sigma.is_none());
        assert_eq!(ds.n_params(), 2);
    }

    #[test]
    fn model_line_is_not_a_parameter() {
        // `y = b1*...` has an `=` but its left side does not start with `b`.
        let ds = parse(MISRA, "m", 2).unwrap();
        assert_eq!(ds.start_a.len(), 2);
    }

    #[test]
    fn wrong_parameter_count() {
        let err = parse(MISRA, "nist/Misra1a.dat", 4).unwrap_err();
        match err {
            IngestError::WrongParameterCount {
                expected,
                start_a,
                start_b,
                certified,
                ..
            } => assert_eq!((expected, start_a, start_b, certified), (4, 2, 2, 2)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn data_header_needs_y() {
        let text = MISRA.replace("Data:   y", "Data:   x");
        let err = parse(&text, "m", 2).unwrap_err();
        assert!(matches!(err, IngestError::MissingDataSection { .. }));
    }

    #[test]
    fn empty_data_section() {
        let text = MISRA.split("Data:").next().unwrap().to_owned() + "Data: y x\n";
        let err = parse(&text, "m", 2).unwrap_err();
        assert!(matches!(err, IngestError::Empty { .. }));
    }

    #[test]
    fn falls_back_to_label() {
        let text = MISRA.replace("Dataset Name:", "Name:");
        let ds = parse(&text, "label", 2).unwrap();
        assert_eq!(ds.name, "label");
    }
}
