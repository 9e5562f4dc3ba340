use nalgebra::DMatrix;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AssignmentError {
    #[error("Cost matrix must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },
    #[error("Cost matrix contains a non-finite entry at ({row}, {col})")]
    NonFinite { row: usize, col: usize },
}

/// Solves the minimum-cost perfect bipartite matching on a square cost matrix.
///
/// Uses the Hungarian method with row/column potentials, O(n³). The result maps every
/// row index to its assigned column index. Rows are inserted in index order and the
/// first minimal column wins every scan, so equal inputs always yield equal outputs.
pub fn solve(cost: &DMatrix<f64>) -> Result<Vec<usize>, AssignmentError> {
    let n = cost.nrows();
    if cost.ncols() != n {
        return Err(AssignmentError::NotSquare {
            rows: n,
            cols: cost.ncols(),
        });
    }
    if let Some((idx, _)) = cost.iter().enumerate().find(|(_, c)| !c.is_finite()) {
        // nalgebra storage is column-major
        return Err(AssignmentError::NonFinite {
            row: idx % n,
            col: idx / n,
        });
    }
    if n == 0 {
        return Ok(Vec::new());
    }

    // 1-based bookkeeping; index 0 is the virtual column used to seed each augmentation.
    let mut u = vec![0.0; n + 1];
    let mut v = vec![0.0; n + 1];
    let mut column_owner = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for row in 1..=n {
        column_owner[0] = row;
        let mut j0 = 0;
        let mut min_slack = vec![f64::INFINITY; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[j0] = true;
            let i0 = column_owner[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0;
            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let reduced = cost[(i0 - 1, j - 1)] - u[i0] - v[j];
                if reduced < min_slack[j] {
                    min_slack[j] = reduced;
                    way[j] = j0;
                }
                if min_slack[j] < delta {
                    delta = min_slack[j];
                    j1 = j;
                }
            }
            for j in 0..=n {
                if used[j] {
                    u[column_owner[j]] += delta;
                    v[j] -= delta;
                } else {
                    min_slack[j] -= delta;
                }
            }
            j0 = j1;
            if column_owner[j0] == 0 {
                break;
            }
        }

        loop {
            let j1 = way[j0];
            column_owner[j0] = column_owner[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0; n];
    for j in 1..=n {
        assignment[column_owner[j] - 1] = j - 1;
    }
    Ok(assignment)
}

/// Total cost of an assignment produced by [`solve`].
pub fn assignment_cost(cost: &DMatrix<f64>, assignment: &[usize]) -> f64 {
    assignment
        .iter()
        .enumerate()
        .map(|(row, &col)| cost[(row, col)])
        .sum()
}
