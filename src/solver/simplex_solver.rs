// Simplex Solver Adapter
// Implements the SolverService interface for continuous models
// Runs one relaxation solve and records its final basis in the session

use super::relaxation::{model_bounds, solve_relaxation};
use super::simplex::Limits;
use crate::domain::{
    models::{Model, SolverStatistics},
    session::SolverSession,
    solver_service::{Result, SolverService},
    value_objects::SolutionStatus,
};
use std::time::Instant;
use tracing::debug;

pub struct SimplexSolver;

impl SimplexSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SimplexSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for SimplexSolver {
    fn solve(&self, model: &Model, session: &mut SolverSession) -> Result<SolutionStatus> {
        // Validate first
        self.validate(model)?;

        let start_time = Instant::now();
        let limits = Limits::from_settings(&session.settings, start_time);

        let outcome = solve_relaxation(model, &model_bounds(model), &session.settings, &limits)?;
        let solve_time = start_time.elapsed().as_secs_f64() * 1000.0;

        session.statistics = SolverStatistics {
            simplex_iterations: outcome.iterations,
            nodes_explored: 0,
            solve_time_ms: solve_time,
            num_variables: model.num_variables() as u32,
            num_constraints: model.num_constraints() as u32,
            num_integer_vars: model.num_integer_variables() as u32,
        };
        session.basis = outcome.point;
        session.incumbent = None;

        debug!(
            status = %outcome.status,
            iterations = outcome.iterations,
            solve_time_ms = solve_time,
            "simplex finished"
        );
        Ok(outcome.status)
    }

    fn name(&self) -> &str {
        "Simplex"
    }

    fn supports_mip(&self) -> bool {
        false
    }
}
