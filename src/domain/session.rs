// Per-call solver state. A session is created by the facade, mutated by
// one backend, read once by the report builder, and dropped.

use super::models::SolverStatistics;
use super::options::SolverSettings;

/// Final point of a relaxation solve.
///
/// Values are in model units. Duals and reduced costs are in internal
/// minimisation form (costs multiplied by `Sense::sign`). Basic items carry
/// an exact `+0.0` dual.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkingBasis {
    pub column_values: Vec<f64>,
    pub column_duals: Vec<f64>,
    pub column_basic: Vec<bool>,
    pub row_values: Vec<f64>,
    pub row_duals: Vec<f64>,
    pub row_basic: Vec<bool>,
    /// Internal (minimisation) objective, offset excluded
    pub objective: f64,
}

impl WorkingBasis {
    /// Point with every column nonbasic at `values`, every row basic at its
    /// activity, and zero duals
    pub fn at_point(values: Vec<f64>, row_values: Vec<f64>) -> Self {
        let num_cols = values.len();
        let num_rows = row_values.len();
        Self {
            column_values: values,
            column_duals: vec![0.0; num_cols],
            column_basic: vec![false; num_cols],
            row_values,
            row_duals: vec![0.0; num_rows],
            row_basic: vec![true; num_rows],
            objective: 0.0,
        }
    }

    pub fn num_columns(&self) -> usize {
        self.column_values.len()
    }

    pub fn num_rows(&self) -> usize {
        self.row_values.len()
    }
}

/// Best integer-feasible point found by branch-and-bound
#[derive(Debug, Clone, PartialEq)]
pub struct Incumbent {
    /// Column values, integer columns already rounded
    pub column_values: Vec<f64>,
    /// Internal (minimisation) objective, offset excluded
    pub objective: f64,
    /// Depth of the node that produced it
    pub depth: usize,
}

/// Ephemeral state of one solve call
#[derive(Debug, Clone, Default)]
pub struct SolverSession {
    pub settings: SolverSettings,
    pub basis: WorkingBasis,
    pub incumbent: Option<Incumbent>,
    pub statistics: SolverStatistics,
}

impl SolverSession {
    pub fn new(settings: SolverSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Column values the report should show: the incumbent when one
    /// exists, otherwise the last relaxation point.
    pub fn reported_columns(&self) -> &[f64] {
        match &self.incumbent {
            Some(incumbent) => &incumbent.column_values,
            None => &self.basis.column_values,
        }
    }
}
