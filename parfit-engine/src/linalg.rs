use faer::{Mat, Side, col::ColRef, prelude::Solve};

pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    ColRef::from_slice(a).transpose() * ColRef::from_slice(b)
}

pub(crate) fn mat_vec(m: &Mat<f64>, v: &[f64]) -> Vec<f64> {
    let product = m.as_ref() * ColRef::from_slice(v);
    (0..product.nrows()).map(|i| product[i]).collect()
}

/// `0.5 * g' V g`, the estimated distance to the minimum.
pub(crate) fn edm(inv_hessian: &Mat<f64>, grad: &[f64]) -> f64 {
    0.5 * dot(grad, &mat_vec(inv_hessian, grad))
}

/// Diagonal inverse Hessian from second derivatives; non-positive
/// curvature falls back to 1.
pub(crate) fn diagonal_inverse(g2: &[f64]) -> Mat<f64> {
    let n = g2.len();
    Mat::from_fn(n, n, |i, j| {
        if i != j {
            0.0
        } else if g2[i] > 0.0 && g2[i].is_finite() {
            1.0 / g2[i]
        } else {
            1.0
        }
    })
}

pub(crate) fn sum_abs(m: &Mat<f64>) -> f64 {
    let mut total = 0.0;
    for i in 0..m.nrows() {
        for j in 0..m.ncols() {
            total += m[(i, j)].abs();
        }
    }
    total
}

/// Is the symmetric matrix positive definite? Finite Cholesky succeeds.
pub(crate) fn is_pos_def(m: &Mat<f64>) -> bool {
    if (0..m.nrows()).any(|i| (0..m.ncols()).any(|j| !m[(i, j)].is_finite())) {
        return false;
    }
    m.nrows() == 0 || m.llt(Side::Lower).is_ok()
}

/// Inverse of a square matrix, if the result is finite.
pub(crate) fn invert(m: &Mat<f64>) -> Option<Mat<f64>> {
    let n = m.nrows();
    if n == 0 {
        return Some(Mat::zeros(0, 0));
    }
    let lu = m.full_piv_lu();
    let inv = lu.solve(Mat::<f64>::identity(n, n).as_ref());
    for i in 0..n {
        for j in 0..n {
            if !inv[(i, j)].is_finite() {
                return None;
            }
        }
    }
    Some(symmetrize(&inv))
}

pub(crate) fn symmetrize(m: &Mat<f64>) -> Mat<f64> {
    let n = m.nrows();
    Mat::from_fn(n, n, |i, j| 0.5 * (m[(i, j)] + m[(j, i)]))
}

/// Force a symmetric matrix to be positive definite by fixing the diagonal
/// and then adding a growing multiple of it until Cholesky succeeds.
/// Returns the matrix and whether it had to be changed.
pub(crate) fn make_pos_def(m: &Mat<f64>) -> (Mat<f64>, bool) {
    if is_pos_def(m) {
        return (m.clone(), false);
    }
    let n = m.nrows();
    let mut fixed = symmetrize(m);
    let dgmin = (0..n).map(|i| fixed[(i, i)]).fold(f64::INFINITY, f64::min);
    let epspdf = 1.0e-3;
    for i in 0..n {
        if fixed[(i, i)] <= 0.0 || fixed[(i, i)].is_nan() {
            let shift = if dgmin.is_finite() { epspdf - dgmin } else { 1.0 };
            fixed[(i, i)] = (fixed[(i, i)] + shift).max(epspdf);
        }
    }
    let diag: Vec<f64> = (0..n).map(|i| fixed[(i, i)]).collect();
    let mut fraction = epspdf;
    for _ in 0..40 {
        let shifted = Mat::from_fn(n, n, |i, j| {
            if i == j {
                fixed[(i, j)] * (1.0 + fraction)
            } else {
                fixed[(i, j)]
            }
        });
        if is_pos_def(&shifted) {
            return (shifted, true);
        }
        fraction *= 2.0;
    }
    (Mat::from_fn(n, n, |i, j| if i == j { diag[i] } else { 0.0 }), true)
}
