// Bounded primal simplex on a dense tableau.
//
// Every row `i` gets a logical variable `r_i` equal to the row activity,
// bounded by the row bounds. The tableau holds `T = B⁻¹ [A | -I]`, so the
// starting slack basis is `T = [-A | I]`. Phase 1 minimises the sum of
// bound violations of basic variables; phase 2 minimises the costs.
// Nonbasic variables always sit exactly on a bound, or at zero when free.

use super::standard_form::StandardForm;
use crate::domain::options::{Pricing, SolverSettings};
use crate::domain::session::WorkingBasis;
use crate::domain::solver_service::{Result, SolverError};
use crate::domain::value_objects::SolutionStatus;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const PIVOT_TOLERANCE: f64 = 1e-11;
const RATIO_TIE: f64 = 1e-12;
/// Degenerate pivots in a row before switching to Bland's rule
const DEGENERATE_RUN: u32 = 50;

/// Result of one simplex run on a standard form
#[derive(Debug, Clone)]
pub(crate) struct SimplexOutcome {
    pub status: SolutionStatus,
    pub point: WorkingBasis,
    pub iterations: u64,
}

/// Limits shared by every simplex run of one solve call
#[derive(Debug, Clone, Copy)]
pub(crate) struct Limits {
    pub iterations: u64,
    pub deadline: Option<Instant>,
}

impl Limits {
    pub fn from_settings(settings: &SolverSettings, started: Instant) -> Self {
        Self {
            iterations: settings.iteration_limit,
            deadline: settings
                .time_limit
                .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
                .and_then(|limit| started.checked_add(limit)),
        }
    }

    pub fn time_exceeded(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Basic,
    AtLower,
    AtUpper,
    Free,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Feasibility,
    Optimality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PhaseEnd {
    Done,
    /// Phase 1: infeasibility remains; phase 2: a ray was found
    NoProgress,
    IterationLimit,
    TimeLimit,
}

#[derive(Debug, Clone, Copy)]
struct Leaving {
    row: usize,
    ratio: f64,
    to_upper: bool,
}

struct Tableau {
    num_cols: usize,
    rows: Vec<Vec<f64>>,
    basis: Vec<usize>,
    position: Vec<Position>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    values: Vec<f64>,
    costs: Vec<f64>,
    weights: Vec<f64>,
    primal_tolerance: f64,
    dual_tolerance: f64,
    pricing: Pricing,
    iterations: u64,
    degenerate: u32,
}

impl Tableau {
    fn new(form: &StandardForm, settings: &SolverSettings) -> Self {
        let num_cols = form.num_cols();
        let num_rows = form.num_rows();
        let total = num_cols + num_rows;

        let rows = form
            .matrix
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let mut tableau_row = Vec::with_capacity(total);
                tableau_row.extend(row.iter().map(|a| -a));
                tableau_row.extend((0..num_rows).map(|k| if k == i { 1.0 } else { 0.0 }));
                tableau_row
            })
            .collect();

        let mut lower = form.col_lower.clone();
        lower.extend_from_slice(&form.row_lower);
        let mut upper = form.col_upper.clone();
        upper.extend_from_slice(&form.row_upper);
        let mut costs = form.costs.clone();
        costs.resize(total, 0.0);

        let mut position = Vec::with_capacity(total);
        let mut values = vec![0.0; total];
        for j in 0..num_cols {
            let (pos, value) = if lower[j].is_finite() {
                (Position::AtLower, lower[j])
            } else if upper[j].is_finite() {
                (Position::AtUpper, upper[j])
            } else {
                (Position::Free, 0.0)
            };
            position.push(pos);
            values[j] = value;
        }
        position.extend(std::iter::repeat(Position::Basic).take(num_rows));

        let mut tableau = Self {
            num_cols,
            rows,
            basis: (num_cols..total).collect(),
            position,
            lower,
            upper,
            values,
            costs,
            weights: vec![1.0; total],
            primal_tolerance: settings.primal_tolerance,
            dual_tolerance: settings.dual_tolerance,
            pricing: settings.pricing,
            iterations: 0,
            degenerate: 0,
        };
        tableau.recompute_basic_values();
        tableau
    }

    fn total(&self) -> usize {
        self.values.len()
    }

    fn recompute_basic_values(&mut self) {
        let nonbasic: Vec<usize> = (0..self.total())
            .filter(|&k| !matches!(self.position[k], Position::Basic))
            .collect();
        for (r, row) in self.rows.iter().enumerate() {
            let value: f64 = nonbasic.iter().map(|&k| -row[k] * self.values[k]).sum();
            self.values[self.basis[r]] = value;
        }
    }

    /// Cost of each basic row for the given phase
    fn basic_costs(&self, phase: Phase) -> Vec<f64> {
        self.basis
            .iter()
            .map(|&var| match phase {
                Phase::Optimality => self.costs[var],
                Phase::Feasibility => {
                    if self.values[var] < self.lower[var] - self.primal_tolerance {
                        -1.0
                    } else if self.values[var] > self.upper[var] + self.primal_tolerance {
                        1.0
                    } else {
                        0.0
                    }
                }
            })
            .collect()
    }

    fn reduced_cost(&self, var: usize, phase: Phase, basic_costs: &[f64]) -> f64 {
        let own = match phase {
            Phase::Optimality => self.costs[var],
            Phase::Feasibility => 0.0,
        };
        own - self
            .rows
            .iter()
            .zip(basic_costs)
            .filter(|(_, c)| **c != 0.0)
            .map(|(row, c)| c * row[var])
            .sum::<f64>()
    }

    /// Entering variable and its direction of motion
    fn price(&self, phase: Phase, basic_costs: &[f64], bland: bool) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64, f64)> = None;
        for var in 0..self.total() {
            let position = self.position[var];
            if matches!(position, Position::Basic) || self.lower[var] == self.upper[var] {
                continue;
            }
            let d = self.reduced_cost(var, phase, basic_costs);
            let direction = match position {
                Position::AtLower if d < -self.dual_tolerance => 1.0,
                Position::AtUpper if d > self.dual_tolerance => -1.0,
                Position::Free if d.abs() > self.dual_tolerance => -d.signum(),
                _ => continue,
            };
            if bland {
                return Some((var, direction));
            }
            let score = match self.pricing {
                Pricing::Dantzig => d.abs(),
                Pricing::Devex => d * d / self.weights[var],
            };
            if best.map_or(true, |(_, _, s)| score > s) {
                best = Some((var, direction, score));
            }
        }
        best.map(|(var, direction, _)| (var, direction))
    }

    /// Basic row that blocks first when `entering` moves in `direction`
    fn ratio_test(
        &self,
        entering: usize,
        direction: f64,
        phase: Phase,
        bland: bool,
    ) -> Option<Leaving> {
        let mut best: Option<(Leaving, f64)> = None;
        for (r, row) in self.rows.iter().enumerate() {
            let pivot = row[entering];
            if pivot.abs() <= PIVOT_TOLERANCE {
                continue;
            }
            let var = self.basis[r];
            let alpha = -pivot * direction;
            let (x, lower, upper) = (self.values[var], self.lower[var], self.upper[var]);
            let tol = self.primal_tolerance;

            let below = phase == Phase::Feasibility && x < lower - tol;
            let above = phase == Phase::Feasibility && x > upper + tol;
            let candidate = if below {
                (alpha > 0.0).then(|| ((lower - x) / alpha, false))
            } else if above {
                (alpha < 0.0).then(|| ((x - upper) / -alpha, true))
            } else if alpha > 0.0 && upper.is_finite() {
                Some(((upper - x) / alpha, true))
            } else if alpha < 0.0 && lower.is_finite() {
                Some(((x - lower) / -alpha, false))
            } else {
                None
            };
            let Some((ratio, to_upper)) = candidate else {
                continue;
            };
            let ratio = ratio.max(0.0);
            let leaving = Leaving { row: r, ratio, to_upper };

            let better = match best {
                None => true,
                Some((current, current_pivot)) => {
                    if ratio < current.ratio - RATIO_TIE {
                        true
                    } else if ratio <= current.ratio + RATIO_TIE {
                        if bland {
                            var < self.basis[current.row]
                        } else if pivot.abs() != current_pivot {
                            pivot.abs() > current_pivot
                        } else {
                            var < self.basis[current.row]
                        }
                    } else {
                        false
                    }
                }
            };
            if better {
                best = Some((leaving, pivot.abs()));
            }
        }
        best.map(|(leaving, _)| leaving)
    }

    fn pivot(&mut self, row: usize, entering: usize) {
        let pivot = self.rows[row][entering];
        let total = self.total();

        if self.pricing == Pricing::Devex {
            let entering_weight = self.weights[entering];
            for var in 0..total {
                if var == entering || matches!(self.position[var], Position::Basic) {
                    continue;
                }
                let ratio = self.rows[row][var] / pivot;
                self.weights[var] = self.weights[var].max(ratio * ratio * entering_weight);
            }
            let leaving = self.basis[row];
            self.weights[leaving] = (entering_weight / (pivot * pivot)).max(1.0);
        }

        for value in self.rows[row].iter_mut() {
            *value /= pivot;
        }
        let pivot_row = self.rows[row].clone();
        for (r, other) in self.rows.iter_mut().enumerate() {
            if r == row {
                continue;
            }
            let factor = other[entering];
            if factor == 0.0 {
                continue;
            }
            for (value, p) in other.iter_mut().zip(&pivot_row) {
                *value -= factor * p;
            }
            other[entering] = 0.0;
        }
        self.rows[row][entering] = 1.0;
    }

    /// Move `entering` by the step the ratio test allows, flipping it to its
    /// opposite bound or exchanging it with the blocking basic variable.
    fn step(&mut self, entering: usize, direction: f64, leaving: Option<Leaving>) -> bool {
        let flip = if self.lower[entering].is_finite() && self.upper[entering].is_finite() {
            Some(self.upper[entering] - self.lower[entering])
        } else {
            None
        };

        let (theta, exchange) = match (leaving, flip) {
            (None, None) => return false,
            (None, Some(range)) => (range, None),
            (Some(leaving), Some(range)) if range <= leaving.ratio => (range, None),
            (Some(leaving), _) => (leaving.ratio, Some(leaving)),
        };

        for (r, row) in self.rows.iter().enumerate() {
            let alpha = -row[entering] * direction;
            if alpha != 0.0 {
                self.values[self.basis[r]] += alpha * theta;
            }
        }

        match exchange {
            None => {
                let (position, value) = if direction > 0.0 {
                    (Position::AtUpper, self.upper[entering])
                } else {
                    (Position::AtLower, self.lower[entering])
                };
                self.position[entering] = position;
                self.values[entering] = value;
            }
            Some(leaving) => {
                self.values[entering] += direction * theta;
                let var = self.basis[leaving.row];
                let value = if leaving.to_upper {
                    self.upper[var]
                } else {
                    self.lower[var]
                };
                let position = if leaving.to_upper && self.lower[var] != self.upper[var] {
                    Position::AtUpper
                } else {
                    Position::AtLower
                };
                self.position[var] = position;
                self.values[var] = value;
                self.pivot(leaving.row, entering);
                self.basis[leaving.row] = entering;
                self.position[entering] = Position::Basic;
            }
        }

        if theta <= self.primal_tolerance {
            self.degenerate += 1;
        } else {
            self.degenerate = 0;
        }
        true
    }

    fn run_phase(&mut self, phase: Phase, limits: &Limits) -> Result<PhaseEnd> {
        let safety_cap = 50_000 + 100 * self.total() as u64;
        let mut phase_iterations = 0u64;
        loop {
            let basic_costs = self.basic_costs(phase);
            if phase == Phase::Feasibility && basic_costs.iter().all(|&c| c == 0.0) {
                return Ok(PhaseEnd::Done);
            }

            let bland = self.degenerate >= DEGENERATE_RUN;
            let Some((entering, direction)) = self.price(phase, &basic_costs, bland) else {
                return Ok(match phase {
                    Phase::Feasibility => PhaseEnd::NoProgress,
                    Phase::Optimality => PhaseEnd::Done,
                });
            };

            if self.iterations >= limits.iterations {
                return Ok(PhaseEnd::IterationLimit);
            }
            if limits.time_exceeded() {
                return Ok(PhaseEnd::TimeLimit);
            }
            if phase_iterations >= safety_cap {
                warn!(iterations = self.iterations, "simplex stalled, stopping at iteration cap");
                return Ok(PhaseEnd::IterationLimit);
            }

            let leaving = self.ratio_test(entering, direction, phase, bland);
            if !self.step(entering, direction, leaving) {
                return match phase {
                    Phase::Optimality => Ok(PhaseEnd::NoProgress),
                    Phase::Feasibility => Err(SolverError::ExecutionFailed(format!(
                        "phase 1 found no blocking row for variable {}",
                        entering
                    ))),
                };
            }
            self.iterations += 1;
            phase_iterations += 1;
        }
    }

    /// Current point with reduced costs and row duals of the phase 2 costs
    fn point(&self) -> WorkingBasis {
        let basic_costs = self.basic_costs(Phase::Optimality);
        let total = self.total();
        let mut duals = vec![0.0; total];
        for (var, dual) in duals.iter_mut().enumerate() {
            if !matches!(self.position[var], Position::Basic) {
                *dual = self.reduced_cost(var, Phase::Optimality, &basic_costs);
            }
        }
        let basic: Vec<bool> = self
            .position
            .iter()
            .map(|p| *p == Position::Basic)
            .collect();
        let n = self.num_cols;
        WorkingBasis {
            column_values: self.values[..n].to_vec(),
            column_duals: duals[..n].to_vec(),
            column_basic: basic[..n].to_vec(),
            row_values: self.values[n..].to_vec(),
            row_duals: duals[n..].to_vec(),
            row_basic: basic[n..].to_vec(),
            objective: self.values[..n]
                .iter()
                .zip(&self.costs)
                .map(|(x, c)| x * c)
                .sum(),
        }
    }
}

fn limit_status(end: PhaseEnd) -> Option<SolutionStatus> {
    match end {
        PhaseEnd::IterationLimit => Some(SolutionStatus::IterationLimit),
        PhaseEnd::TimeLimit => Some(SolutionStatus::TimeLimit),
        _ => None,
    }
}

/// Solve `form` from a slack basis. The reported point is in the units of
/// `form`; the caller unscales and postsolves it.
pub(crate) fn solve_standard_form(
    form: &StandardForm,
    settings: &SolverSettings,
    limits: &Limits,
) -> Result<SimplexOutcome> {
    let mut tableau = Tableau::new(form, settings);

    let phase1 = tableau.run_phase(Phase::Feasibility, limits)?;
    tableau.recompute_basic_values();
    debug!(?phase1, iterations = tableau.iterations, "phase 1 finished");

    let status = match phase1 {
        PhaseEnd::NoProgress => SolutionStatus::Infeasible,
        PhaseEnd::Done => {
            let phase2 = tableau.run_phase(Phase::Optimality, limits)?;
            tableau.recompute_basic_values();
            debug!(?phase2, iterations = tableau.iterations, "phase 2 finished");
            match phase2 {
                PhaseEnd::Done => SolutionStatus::Optimal,
                PhaseEnd::NoProgress => SolutionStatus::Unbounded,
                end => limit_status(end).unwrap_or(SolutionStatus::IterationLimit),
            }
        }
        end => limit_status(end).unwrap_or(SolutionStatus::IterationLimit),
    };

    Ok(SimplexOutcome {
        status,
        point: tableau.point(),
        iterations: tableau.iterations,
    })
}
