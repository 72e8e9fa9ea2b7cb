use crate::domain::{models::Model, solver_service::SolverService};
use crate::solver::{BranchAndBoundSolver, SimplexSolver};
use std::sync::Arc;

/// Factory for creating solver instances based on the model
pub struct SolverFactory;

impl SolverFactory {
    /// Create a solver suited to the model: branch-and-bound when any
    /// column is integer, plain simplex otherwise
    pub fn create_solver(model: &Model) -> Arc<dyn SolverService> {
        Self::create_for(model.is_mixed_integer())
    }

    pub fn create_for(is_mip: bool) -> Arc<dyn SolverService> {
        if is_mip {
            Arc::new(BranchAndBoundSolver::new())
        } else {
            Arc::new(SimplexSolver::new())
        }
    }

    /// Get the default solver (simplex)
    pub fn default_solver() -> Arc<dyn SolverService> {
        Arc::new(SimplexSolver::new())
    }
}
