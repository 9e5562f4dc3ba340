use nalgebra::{DMatrix, Point3};

/// Full symmetric matrix of pairwise Euclidean distances.
pub fn distance_matrix(positions: &[Point3<f64>]) -> DMatrix<f64> {
    let n = positions.len();
    DMatrix::from_fn(n, n, |i, k| (positions[i] - positions[k]).norm())
}

/// Copy of `matrix` with every row sorted ascending.
///
/// The sorted row of atom `i` is its distance profile independent of how the other
/// atoms are numbered.
pub fn sorted_rows(matrix: &DMatrix<f64>) -> DMatrix<f64> {
    let mut sorted = matrix.clone();
    for mut row in sorted.row_iter_mut() {
        let mut values: Vec<f64> = row.iter().copied().collect();
        values.sort_by(|a, b| a.total_cmp(b));
        for (slot, value) in row.iter_mut().zip(values) {
            *slot = value;
        }
    }
    sorted
}

/// Squared L2 distance between row `i` of `a` and row `j` of `b`.
pub fn row_distance_squared(a: &DMatrix<f64>, i: usize, b: &DMatrix<f64>, j: usize) -> f64 {
    a.row(i)
        .iter()
        .zip(b.row(j).iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum()
}

/// RMSD between `d_a` and `d_b` after relabeling `d_b` through `mapping`:
/// `sqrt(mean over i,k of (d_a[i,k] - d_b[mapping[i], mapping[k]])^2)`.
///
/// Returns `None` when the matrices are empty, not square, differently sized, or the
/// mapping does not cover every row.
pub fn mapped_distance_rmsd(
    d_a: &DMatrix<f64>,
    d_b: &DMatrix<f64>,
    mapping: &[usize],
) -> Option<f64> {
    let n = d_a.nrows();
    if n == 0
        || d_a.ncols() != n
        || d_b.nrows() != n
        || d_b.ncols() != n
        || mapping.len() != n
        || mapping.iter().any(|&m| m >= n)
    {
        return None;
    }
    let mut squared_sum = 0.0;
    for i in 0..n {
        for k in 0..n {
            squared_sum += (d_a[(i, k)] - d_b[(mapping[i], mapping[k])]).powi(2);
        }
    }
    Some((squared_sum / (n * n) as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn triangle() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(0.0, 4.0, 0.0),
        ]
    }

    #[test]
    fn distance_matrix_is_symmetric_with_zero_diagonal() {
        let d = distance_matrix(&triangle());
        assert_eq!(d.nrows(), 3);
        for i in 0..3 {
            assert_eq!(d[(i, i)], 0.0);
            for k in 0..3 {
                assert_eq!(d[(i, k)], d[(k, i)]);
            }
        }
        assert!(f64_approx_equal(d[(0, 1)], 3.0));
        assert!(f64_approx_equal(d[(0, 2)], 4.0));
        assert!(f64_approx_equal(d[(1, 2)], 5.0));
    }

    #[test]
    fn sorted_rows_orders_each_row_independently() {
        let d = distance_matrix(&triangle());
        let s = sorted_rows(&d);
        assert_eq!(s.row(1).iter().copied().collect::<Vec<_>>(), vec![0.0, 3.0, 5.0]);
        assert_eq!(s.row(2).iter().copied().collect::<Vec<_>>(), vec![0.0, 4.0, 5.0]);
    }

    #[test]
    fn row_distance_squared_sums_elementwise_differences() {
        let d = distance_matrix(&triangle());
        assert!(f64_approx_equal(row_distance_squared(&d, 0, &d, 0), 0.0));
        // (0-3)^2 + (3-0)^2 + (4-5)^2
        assert!(f64_approx_equal(row_distance_squared(&d, 0, &d, 1), 19.0));
    }

    #[test]
    fn mapped_distance_rmsd_is_zero_for_identity_mapping() {
        let d = distance_matrix(&triangle());
        let rmsd = mapped_distance_rmsd(&d, &d, &[0, 1, 2]).unwrap();
        assert!(f64_approx_equal(rmsd, 0.0));
    }

    #[test]
    fn mapped_distance_rmsd_detects_wrong_mapping() {
        let d = distance_matrix(&triangle());
        let rmsd = mapped_distance_rmsd(&d, &d, &[1, 0, 2]).unwrap();
        assert!(rmsd > 0.1);
    }

    #[test]
    fn mapped_distance_rmsd_rejects_inconsistent_input() {
        let d = distance_matrix(&triangle());
        assert!(mapped_distance_rmsd(&d, &d, &[0, 1]).is_none());
        assert!(mapped_distance_rmsd(&d, &d, &[0, 1, 3]).is_none());
        let empty = DMatrix::<f64>::zeros(0, 0);
        assert!(mapped_distance_rmsd(&empty, &empty, &[]).is_none());
    }
}
