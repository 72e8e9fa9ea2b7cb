// Power-of-two equilibration of the constraint matrix and the cost vector.
// Factors are exact powers of two so nonbasic values survive the round
// trip bit for bit.

use super::standard_form::StandardForm;
use crate::domain::options::SolverSettings;
use crate::domain::session::WorkingBasis;
use tracing::debug;

const PASSES: usize = 4;

/// Row factors `R`, column factors `C` and the cost factor `σ`.
///
/// The scaled problem has matrix `R A C`, columns `x / C`, rows `R r`
/// and costs `σ c C`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Scaling {
    col: Vec<f64>,
    row: Vec<f64>,
    cost: f64,
}

fn power_of_two(exponent: i32) -> f64 {
    2f64.powi(exponent)
}

/// Exponent bringing the geometric mean of `min` and `max` to one
fn balancing_exponent(min: f64, max: f64, limit: i32) -> i32 {
    let exponent = (-0.5 * (min.log2() + max.log2())).round() as i32;
    exponent.clamp(-limit, limit)
}

impl Scaling {
    pub fn identity(form: &StandardForm) -> Self {
        Self {
            col: vec![1.0; form.num_cols()],
            row: vec![1.0; form.num_rows()],
            cost: 1.0,
        }
    }

    pub fn compute(form: &StandardForm, settings: &SolverSettings) -> Self {
        let mut scaling = Self::identity(form);

        let limit = settings.matrix_scale_exponent;
        if settings.scaling && limit > 0 {
            let mut row_exp = vec![0i32; form.num_rows()];
            let mut col_exp = vec![0i32; form.num_cols()];

            for _ in 0..PASSES {
                for (i, row) in form.matrix.iter().enumerate() {
                    let magnitudes = row
                        .iter()
                        .zip(&col_exp)
                        .filter(|(a, _)| **a != 0.0)
                        .map(|(a, &e)| a.abs() * power_of_two(e));
                    if let Some((min, max)) = min_max(magnitudes) {
                        row_exp[i] = balancing_exponent(min, max, limit);
                    }
                }
                for (j, exp) in col_exp.iter_mut().enumerate() {
                    let magnitudes = form
                        .matrix
                        .iter()
                        .zip(&row_exp)
                        .filter(|(row, _)| row[j] != 0.0)
                        .map(|(row, &e)| row[j].abs() * power_of_two(e));
                    if let Some((min, max)) = min_max(magnitudes) {
                        *exp = balancing_exponent(min, max, limit);
                    }
                }
            }

            scaling.row = row_exp.into_iter().map(power_of_two).collect();
            scaling.col = col_exp.into_iter().map(power_of_two).collect();
        }

        let cost_limit = settings.cost_scale_exponent;
        if cost_limit > 0 {
            let largest = form
                .costs
                .iter()
                .zip(&scaling.col)
                .map(|(c, s)| (c * s).abs())
                .fold(0.0f64, f64::max);
            if largest > 0.0 {
                let exponent = (-largest.log2().round() as i32).clamp(-cost_limit, cost_limit);
                scaling.cost = power_of_two(exponent);
            }
        }

        debug!(
            cost_factor = scaling.cost,
            max_col_factor = scaling.col.iter().cloned().fold(1.0f64, f64::max),
            max_row_factor = scaling.row.iter().cloned().fold(1.0f64, f64::max),
            "scaling computed"
        );
        scaling
    }

    pub fn is_identity(&self) -> bool {
        self.cost == 1.0 && self.col.iter().chain(&self.row).all(|&f| f == 1.0)
    }

    pub fn apply(&self, form: &StandardForm) -> StandardForm {
        StandardForm {
            matrix: form
                .matrix
                .iter()
                .zip(&self.row)
                .map(|(row, r)| row.iter().zip(&self.col).map(|(a, c)| r * a * c).collect())
                .collect(),
            col_lower: form.col_lower.iter().zip(&self.col).map(|(l, c)| l / c).collect(),
            col_upper: form.col_upper.iter().zip(&self.col).map(|(u, c)| u / c).collect(),
            row_lower: form.row_lower.iter().zip(&self.row).map(|(l, r)| l * r).collect(),
            row_upper: form.row_upper.iter().zip(&self.row).map(|(u, r)| u * r).collect(),
            costs: form
                .costs
                .iter()
                .zip(&self.col)
                .map(|(cost, c)| self.cost * cost * c)
                .collect(),
            offset: self.cost * form.offset,
        }
    }

    /// Map a point of the scaled problem back into the units of `original`
    pub fn unscale(&self, original: &StandardForm, point: WorkingBasis) -> WorkingBasis {
        let column_values: Vec<f64> = point
            .column_values
            .iter()
            .zip(&self.col)
            .map(|(x, c)| x * c)
            .collect();
        let objective = original.objective_at(&column_values);
        WorkingBasis {
            column_values,
            column_duals: point
                .column_duals
                .iter()
                .zip(&self.col)
                .map(|(d, c)| d / (c * self.cost))
                .collect(),
            column_basic: point.column_basic,
            row_values: point
                .row_values
                .iter()
                .zip(&self.row)
                .map(|(v, r)| v / r)
                .collect(),
            row_duals: point
                .row_duals
                .iter()
                .zip(&self.row)
                .map(|(y, r)| y * r / self.cost)
                .collect(),
            row_basic: point.row_basic,
            objective,
        }
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((min, max)) => Some((min.min(v), max.max(v))),
    })
}
