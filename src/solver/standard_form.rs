// Internal problem layout handed to presolve, scaling and the simplex:
// dense row-major matrix, column and row bounds, minimisation costs.

use crate::domain::models::Model;
use crate::domain::options::normalize_bound;
use crate::domain::session::WorkingBasis;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StandardForm {
    pub matrix: Vec<Vec<f64>>,
    pub col_lower: Vec<f64>,
    pub col_upper: Vec<f64>,
    pub row_lower: Vec<f64>,
    pub row_upper: Vec<f64>,
    /// Minimisation costs (`Sense::sign` already applied)
    pub costs: Vec<f64>,
    /// Constant collected from substituted columns
    pub offset: f64,
}

impl StandardForm {
    /// Lay out the continuous relaxation of `model` with the given column
    /// bounds (model bounds tightened by branching, or the model's own).
    pub fn from_model(model: &Model, column_bounds: &[(f64, f64)], infinite_bound: f64) -> Self {
        let num_cols = model.num_variables();
        let sign = model.sense.sign();

        let matrix = model
            .constraints
            .iter()
            .map(|constraint| {
                let mut row = vec![0.0; num_cols];
                for &(index, coeff) in &constraint.coefficients {
                    row[index] += coeff;
                }
                row
            })
            .collect();

        let costs = model
            .objective
            .dense(num_cols)
            .into_iter()
            .map(|c| sign * c)
            .collect();

        Self {
            matrix,
            col_lower: column_bounds
                .iter()
                .map(|&(l, _)| normalize_bound(l, infinite_bound))
                .collect(),
            col_upper: column_bounds
                .iter()
                .map(|&(_, u)| normalize_bound(u, infinite_bound))
                .collect(),
            row_lower: model
                .constraints
                .iter()
                .map(|c| normalize_bound(c.lower_bound, infinite_bound))
                .collect(),
            row_upper: model
                .constraints
                .iter()
                .map(|c| normalize_bound(c.upper_bound, infinite_bound))
                .collect(),
            costs,
            offset: 0.0,
        }
    }

    pub fn num_cols(&self) -> usize {
        self.col_lower.len()
    }

    pub fn num_rows(&self) -> usize {
        self.row_lower.len()
    }

    /// Any column or row whose lower bound exceeds its upper bound. A lower
    /// bound of `+inf` or an upper bound of `-inf` admits no value either.
    pub fn has_crossed_bounds(&self) -> bool {
        self.col_lower
            .iter()
            .zip(&self.col_upper)
            .chain(self.row_lower.iter().zip(&self.row_upper))
            .any(|(&l, &u)| l > u || l == f64::INFINITY || u == f64::NEG_INFINITY)
    }

    /// Value a nonbasic column rests at: its lower bound, else its upper
    /// bound, else zero.
    pub fn resting_value(&self, col: usize) -> f64 {
        let (lower, upper) = (self.col_lower[col], self.col_upper[col]);
        if lower.is_finite() {
            lower
        } else if upper.is_finite() {
            upper
        } else {
            0.0
        }
    }

    pub fn row_activity(&self, row: usize, values: &[f64]) -> f64 {
        self.matrix[row]
            .iter()
            .zip(values)
            .map(|(a, x)| a * x)
            .sum()
    }

    /// Internal objective `c·x`, offset excluded
    pub fn objective_at(&self, values: &[f64]) -> f64 {
        self.costs.iter().zip(values).map(|(c, x)| c * x).sum()
    }

    /// Point with every column resting on a bound, rows at their
    /// activities, zero duals. Used when no pivoting happened.
    pub fn resting_point(&self) -> WorkingBasis {
        let values: Vec<f64> = (0..self.num_cols()).map(|j| self.resting_value(j)).collect();
        let rows = (0..self.num_rows())
            .map(|i| self.row_activity(i, &values))
            .collect();
        let mut point = WorkingBasis::at_point(values, rows);
        point.objective = self.objective_at(&point.column_values);
        point
    }
}
