use super::lp_reader::read_lp;
use super::report::Solution;
use crate::domain::{
    models::Model,
    options::{apply_options, OptionMap, OptionRegistry},
    session::SolverSession,
    solver_service::Result,
};
use crate::solver::SolverFactory;
use tracing::{debug, info};

/// Solve use case: text or model in, classified solution out
pub struct SolveFacade {
    registry: OptionRegistry,
}

impl SolveFacade {
    pub fn new(registry: OptionRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &OptionRegistry {
        &self.registry
    }

    /// Read LP text, then solve it
    pub fn solve(&self, text: &str, options: &OptionMap) -> Result<Solution> {
        let model = read_lp(text)?;
        debug!(
            variables = model.num_variables(),
            constraints = model.num_constraints(),
            "model read"
        );
        self.solve_model(&model, options)
    }

    pub fn solve_model(&self, model: &Model, options: &OptionMap) -> Result<Solution> {
        let mut session = SolverSession::default();
        apply_options(&mut session, &self.registry, options)?;

        // Create solver based on the model's integrality
        let solver = SolverFactory::create_solver(model);
        solver.validate(model)?;
        debug!(backend = solver.name(), "solving");

        let status = solver.solve(model, &mut session)?;
        let solution = Solution::from_session(model, &session, status);

        if session.settings.output_flag {
            let stats = &session.statistics;
            info!(
                backend = solver.name(),
                %status,
                objective = solution.objective_value,
                iterations = stats.simplex_iterations,
                nodes = stats.nodes_explored,
                solve_time_ms = stats.solve_time_ms,
                "solve finished"
            );
        }
        Ok(solution)
    }
}

impl Default for SolveFacade {
    fn default() -> Self {
        Self::new(OptionRegistry::standard())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::options::OptionValue;
    use crate::domain::solver_service::SolverError;
    use crate::domain::value_objects::SolutionStatus;

    #[test]
    fn test_solve_text() {
        let facade = SolveFacade::default();
        let solution = facade
            .solve("min\n obj: x + y\nst\n c: x + 2 y >= 4\nend", &OptionMap::new())
            .unwrap();
        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_eq!(solution.columns.get("y").unwrap().primal, 2.0);
    }

    #[test]
    fn test_bad_option_stops_before_solving() {
        let facade = SolveFacade::default();
        let mut options = OptionMap::new();
        options.insert("no_such_option".to_string(), OptionValue::Bool(true));
        let error = facade
            .solve("min\n x\nst\n c: x >= 1\nend", &options)
            .unwrap_err();
        assert!(matches!(error, SolverError::Option(_)));
    }

    #[test]
    fn test_model_error_passes_through() {
        let error = SolveFacade::default()
            .solve("nothing to see", &OptionMap::new())
            .unwrap_err();
        assert!(matches!(error, SolverError::Model(_)));
        assert!(error.to_string().starts_with("Unable to read LP model"));
    }
}
