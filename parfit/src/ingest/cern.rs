use indexmap::IndexMap;

use super::{parse_number, split_csv};
use crate::IngestError;

/// Dimuon kinematics columns, in lookup order.
pub const DIMUON_COLUMNS: [&str; 6] = ["pt1", "eta1", "phi1", "pt2", "eta2", "phi2"];

/// Header position of each column name. The first occurrence of a repeated
/// name wins.
fn header_index(header: &str) -> IndexMap<&str, usize> {
    let mut index = IndexMap::new();
    for (i, name) in split_csv(header).into_iter().enumerate() {
        index.entry(name).or_insert(i);
    }
    index
}

fn column(index: &IndexMap<&str, usize>, name: &str, what: &str) -> Result<usize, IngestError> {
    index
        .get(name)
        .copied()
        .ok_or_else(|| IngestError::MissingColumn {
            what: what.to_owned(),
            column: name.to_owned(),
        })
}

fn not_empty(values: Vec<f64>, what: &str) -> Result<Vec<f64>, IngestError> {
    if values.is_empty() {
        return Err(IngestError::Empty {
            what: what.to_owned(),
        });
    }
    Ok(values)
}

/// Finite values of the column named `name`.
pub fn parse_mass_column(text: &str, what: &str, name: &str) -> Result<Vec<f64>, IngestError> {
    let mut lines = text.lines();
    let header = lines.next().ok_or_else(|| IngestError::Empty {
        what: what.to_owned(),
    })?;
    let idx = column(&header_index(header), name, what)?;
    let values = lines
        .filter_map(|line| {
            let columns = split_csv(line);
            parse_number(columns.get(idx)?).filter(|v| v.is_finite())
        })
        .collect();
    not_empty(values, what)
}

/// Invariant mass of a muon pair from transverse momenta, pseudorapidities
/// and azimuths.
pub fn dimuon_mass(pt1: f64, eta1: f64, phi1: f64, pt2: f64, eta2: f64, phi2: f64) -> Option<f64> {
    let m2 = 2.0 * pt1 * pt2 * (libm::cosh(eta1 - eta2) - libm::cos(phi1 - phi2));
    (m2.is_finite() && m2 > 0.0).then(|| m2.sqrt())
}

/// Invariant masses of every row with all six kinematics columns present.
pub fn parse_dimuon_masses(text: &str, what: &str) -> Result<Vec<f64>, IngestError> {
    let mut lines = text.lines();
    let header = lines.next().ok_or_else(|| IngestError::Empty {
        what: what.to_owned(),
    })?;
    let index = header_index(header);
    let mut idx = [0; 6];
    for (slot, name) in idx.iter_mut().zip(DIMUON_COLUMNS) {
        *slot = column(&index, name, what)?;
    }
    let widest = idx.iter().copied().max().unwrap_or_default();

    let masses = lines
        .filter_map(|line| {
            let columns = split_csv(line);
            if columns.len() <= widest {
                return None;
            }
            let mut v = [0.0; 6];
            for (value, &i) in v.iter_mut().zip(&idx) {
                *value = parse_number(columns[i])?;
            }
            let [pt1, eta1, phi1, pt2, eta2, phi2] = v;
            dimuon_mass(pt1, eta1, phi1, pt2, eta2, phi2)
        })
        .collect();
    not_empty(masses, what)
}
