// Presolve reductions and the matching postsolve.
//
// Removes fixed and empty columns and the rows they leave empty. With
// implied bounds enabled, singleton rows tighten their column's bounds;
// postsolve moves the reduced cost of a column resting on such a bound
// back onto the row that implied it.

use super::standard_form::StandardForm;
use crate::domain::options::SolverSettings;
use crate::domain::session::WorkingBasis;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PresolveStatus {
    Reduced,
    Infeasible,
    /// An empty column improves the objective without limit; the outcome
    /// is unbounded if the rest of the problem is feasible.
    Unbounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Lower,
    Upper,
}

/// Column bound implied by a singleton row (indices in the reduced problem)
#[derive(Debug, Clone, Copy, PartialEq)]
struct ImpliedBound {
    col: usize,
    row: usize,
    coeff: f64,
    bound: f64,
    row_side: Side,
}

#[derive(Debug, Clone)]
pub(crate) struct Reduction {
    pub status: PresolveStatus,
    pub reduced: StandardForm,
    kept_cols: Vec<usize>,
    kept_rows: Vec<usize>,
    /// Original index and value of every removed column
    removed_cols: Vec<(usize, f64)>,
    /// Contribution of removed columns to each original row
    row_shift: Vec<f64>,
    implied: Vec<ImpliedBound>,
}

fn empty_column_value(form: &StandardForm, col: usize) -> (f64, bool) {
    let (lower, upper, cost) = (form.col_lower[col], form.col_upper[col], form.costs[col]);
    if cost > 0.0 {
        if lower.is_finite() {
            (lower, false)
        } else {
            (form.resting_value(col), true)
        }
    } else if cost < 0.0 {
        if upper.is_finite() {
            (upper, false)
        } else {
            (form.resting_value(col), true)
        }
    } else {
        (form.resting_value(col), false)
    }
}

/// Reduce `form`. The returned reduction always carries a usable reduced
/// problem, even when `status` already decides the outcome.
pub(crate) fn presolve(form: &StandardForm, settings: &SolverSettings) -> Reduction {
    let num_cols = form.num_cols();
    let num_rows = form.num_rows();
    let tol = settings.primal_tolerance;
    let mut status = PresolveStatus::Reduced;

    let mut kept_cols = Vec::with_capacity(num_cols);
    let mut removed_cols = Vec::new();
    for col in 0..num_cols {
        if form.col_lower[col] == form.col_upper[col] {
            removed_cols.push((col, form.col_lower[col]));
            continue;
        }
        let empty = form.matrix.iter().all(|row| row[col] == 0.0);
        if empty {
            let (value, unbounded) = empty_column_value(form, col);
            if unbounded {
                status = PresolveStatus::Unbounded;
            }
            removed_cols.push((col, value));
        } else {
            kept_cols.push(col);
        }
    }

    let row_shift: Vec<f64> = form
        .matrix
        .iter()
        .map(|row| removed_cols.iter().map(|&(j, v)| row[j] * v).sum())
        .collect();

    let mut kept_rows = Vec::with_capacity(num_rows);
    for row in 0..num_rows {
        let nonzeros = kept_cols.iter().any(|&j| form.matrix[row][j] != 0.0);
        if nonzeros {
            kept_rows.push(row);
        } else {
            let lower = form.row_lower[row] - row_shift[row];
            let upper = form.row_upper[row] - row_shift[row];
            if lower > tol || upper < -tol {
                debug!(row, lower, upper, "empty row cannot hold zero activity");
                status = PresolveStatus::Infeasible;
            }
        }
    }

    let mut reduced = StandardForm {
        matrix: kept_rows
            .iter()
            .map(|&i| kept_cols.iter().map(|&j| form.matrix[i][j]).collect())
            .collect(),
        col_lower: kept_cols.iter().map(|&j| form.col_lower[j]).collect(),
        col_upper: kept_cols.iter().map(|&j| form.col_upper[j]).collect(),
        row_lower: kept_rows
            .iter()
            .map(|&i| form.row_lower[i] - row_shift[i])
            .collect(),
        row_upper: kept_rows
            .iter()
            .map(|&i| form.row_upper[i] - row_shift[i])
            .collect(),
        costs: kept_cols.iter().map(|&j| form.costs[j]).collect(),
        offset: form.offset
            + removed_cols
                .iter()
                .map(|&(j, v)| form.costs[j] * v)
                .sum::<f64>(),
    };

    let mut implied = Vec::new();
    if settings.use_implied_bounds && !tighten_from_singletons(&mut reduced, &mut implied, tol) {
        status = PresolveStatus::Infeasible;
    }

    debug!(
        removed_cols = removed_cols.len(),
        removed_rows = num_rows - kept_rows.len(),
        implied_bounds = implied.len(),
        ?status,
        "presolve finished"
    );

    Reduction {
        status,
        reduced,
        kept_cols,
        kept_rows,
        removed_cols,
        row_shift,
        implied,
    }
}

/// Tighten column bounds from singleton rows. Returns false when a column's
/// bounds cross.
fn tighten_from_singletons(
    form: &mut StandardForm,
    implied: &mut Vec<ImpliedBound>,
    tol: f64,
) -> bool {
    let mut by_col: Vec<[Option<ImpliedBound>; 2]> = vec![[None, None]; form.num_cols()];

    for row in 0..form.num_rows() {
        let mut nonzeros = form.matrix[row]
            .iter()
            .enumerate()
            .filter(|(_, a)| **a != 0.0);
        let (col, coeff) = match (nonzeros.next(), nonzeros.next()) {
            (Some((col, &coeff)), None) => (col, coeff),
            _ => continue,
        };

        let (lower_from, upper_from) = if coeff > 0.0 {
            ((form.row_lower[row], Side::Lower), (form.row_upper[row], Side::Upper))
        } else {
            ((form.row_upper[row], Side::Upper), (form.row_lower[row], Side::Lower))
        };

        let implied_lower = lower_from.0 / coeff;
        if implied_lower.is_finite() && implied_lower > form.col_lower[col] {
            form.col_lower[col] = implied_lower;
            by_col[col][0] = Some(ImpliedBound {
                col,
                row,
                coeff,
                bound: implied_lower,
                row_side: lower_from.1,
            });
        }
        let implied_upper = upper_from.0 / coeff;
        if implied_upper.is_finite() && implied_upper < form.col_upper[col] {
            form.col_upper[col] = implied_upper;
            by_col[col][1] = Some(ImpliedBound {
                col,
                row,
                coeff,
                bound: implied_upper,
                row_side: upper_from.1,
            });
        }
    }

    for col in 0..form.num_cols() {
        if form.col_lower[col] > form.col_upper[col] {
            if form.col_lower[col] - form.col_upper[col] > tol {
                debug!(col, "implied bounds cross");
                return false;
            }
            form.col_upper[col] = form.col_lower[col];
            // the column is now fixed at its lower bound
            by_col[col][1] = None;
        }
    }

    implied.extend(by_col.into_iter().flatten().flatten());
    true
}

impl Reduction {
    #[cfg(test)]
    pub fn num_removed_cols(&self) -> usize {
        self.removed_cols.len()
    }

    /// Map a point of the reduced problem back onto `original`
    pub fn postsolve(&self, original: &StandardForm, mut point: WorkingBasis) -> WorkingBasis {
        let num_cols = original.num_cols();
        let num_rows = original.num_rows();

        for bound in &self.implied {
            let (col, row) = (bound.col, bound.row);
            if point.column_basic[col] || point.column_values[col] != bound.bound {
                continue;
            }
            point.row_duals[row] += point.column_duals[col] / bound.coeff;
            point.column_duals[col] = 0.0;
            point.column_basic[col] = true;
            point.row_basic[row] = false;
            point.row_values[row] = match bound.row_side {
                Side::Lower => self.reduced.row_lower[row],
                Side::Upper => self.reduced.row_upper[row],
            };
        }

        let mut full = WorkingBasis {
            column_values: vec![0.0; num_cols],
            column_duals: vec![0.0; num_cols],
            column_basic: vec![false; num_cols],
            row_values: self.row_shift.clone(),
            row_duals: vec![0.0; num_rows],
            row_basic: vec![true; num_rows],
            objective: 0.0,
        };

        for (r, &j) in self.kept_cols.iter().enumerate() {
            full.column_values[j] = point.column_values[r];
            full.column_duals[j] = point.column_duals[r];
            full.column_basic[j] = point.column_basic[r];
        }
        for &(j, value) in &self.removed_cols {
            full.column_values[j] = value;
        }

        for (r, &i) in self.kept_rows.iter().enumerate() {
            full.row_duals[i] = point.row_duals[r];
            full.row_basic[i] = point.row_basic[r];
            full.row_values[i] = if point.row_basic[r] {
                point.row_values[r] + self.row_shift[i]
            } else if point.row_values[r] == self.reduced.row_lower[r] {
                original.row_lower[i]
            } else {
                original.row_upper[i]
            };
        }

        for &(j, _) in &self.removed_cols {
            let priced: f64 = (0..num_rows)
                .map(|i| original.matrix[i][j] * full.row_duals[i])
                .sum();
            full.column_duals[j] = original.costs[j] - priced;
        }

        full.objective = original.objective_at(&full.column_values);
        full
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const INF: f64 = f64::INFINITY;

    fn form() -> StandardForm {
        // min x + 2y + 3z, z fixed at 1, w empty with zero cost
        StandardForm {
            matrix: vec![vec![1.0, 1.0, 1.0, 0.0], vec![0.0, 0.0, 2.0, 0.0]],
            col_lower: vec![0.0, 0.0, 1.0, -INF],
            col_upper: vec![INF, INF, 1.0, 5.0],
            row_lower: vec![3.0, -INF],
            row_upper: vec![INF, 4.0],
            costs: vec![1.0, 2.0, 3.0, 0.0],
            offset: 0.0,
        }
    }

    #[test]
    fn test_removes_fixed_and_empty_columns() {
        let form = form();
        let reduction = presolve(&form, &SolverSettings::default());
        assert_eq!(reduction.status, PresolveStatus::Reduced);
        assert_eq!(reduction.num_removed_cols(), 2);
        assert_eq!(reduction.reduced.num_cols(), 2);
        // second row only touched the fixed column
        assert_eq!(reduction.reduced.num_rows(), 1);
        assert_eq!(reduction.reduced.row_lower, vec![2.0]);
        assert_eq!(reduction.reduced.offset, 3.0);
    }

    #[test]
    fn test_empty_row_outside_bounds_is_infeasible() {
        let mut form = form();
        form.row_upper[1] = 1.0;
        let reduction = presolve(&form, &SolverSettings::default());
        assert_eq!(reduction.status, PresolveStatus::Infeasible);
    }

    #[test]
    fn test_improving_empty_column_flags_unbounded() {
        let mut form = form();
        form.costs[3] = -1.0;
        form.col_upper[3] = INF;
        let reduction = presolve(&form, &SolverSettings::default());
        assert_eq!(reduction.status, PresolveStatus::Unbounded);
    }

    #[test]
    fn test_postsolve_restores_dimensions_and_prices_removed_columns() {
        let form = form();
        let reduction = presolve(&form, &SolverSettings::default());
        // reduced optimum: x = 2 basic, y nonbasic at 0, row at lower bound 2
        let point = WorkingBasis {
            column_values: vec![2.0, 0.0],
            column_duals: vec![0.0, 1.0],
            column_basic: vec![true, false],
            row_values: vec![2.0],
            row_duals: vec![1.0],
            row_basic: vec![false],
            objective: 2.0,
        };
        let full = reduction.postsolve(&form, point);
        assert_eq!(full.column_values, vec![2.0, 0.0, 1.0, 5.0]);
        assert_eq!(full.row_values, vec![3.0, 2.0]);
        assert!(full.row_basic[1]);
        assert_relative_eq!(full.column_duals[2], 2.0);
        assert_relative_eq!(full.objective, 5.0);
    }

    #[test]
    fn test_singleton_row_tightens_and_transfers_dual() {
        // min -x - y, x + y <= 4, 2x <= 2
        let form = StandardForm {
            matrix: vec![vec![1.0, 1.0], vec![2.0, 0.0]],
            col_lower: vec![0.0, 0.0],
            col_upper: vec![INF, INF],
            row_lower: vec![-INF, -INF],
            row_upper: vec![4.0, 2.0],
            costs: vec![-2.0, -1.0],
            offset: 0.0,
        };
        let settings = SolverSettings {
            use_implied_bounds: true,
            ..SolverSettings::default()
        };
        let reduction = presolve(&form, &settings);
        assert_eq!(reduction.reduced.col_upper[0], 1.0);

        // x at its implied upper bound with reduced cost -1, y basic
        let point = WorkingBasis {
            column_values: vec![1.0, 3.0],
            column_duals: vec![-1.0, 0.0],
            column_basic: vec![false, true],
            row_values: vec![4.0, 2.0],
            row_duals: vec![-1.0, 0.0],
            row_basic: vec![false, true],
            objective: -5.0,
        };
        let full = reduction.postsolve(&form, point);
        assert!(full.column_basic[0]);
        assert_eq!(full.column_duals[0], 0.0);
        assert!(!full.row_basic[1]);
        assert_relative_eq!(full.row_duals[1], -0.5);
        assert_eq!(full.row_values[1], 2.0);
    }
}
