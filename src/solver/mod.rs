// Solver adapters module

pub mod branch_and_bound;
pub mod factory;
mod presolve;
mod relaxation;
mod scaling;
mod simplex;
pub mod simplex_solver;
mod standard_form;

pub use branch_and_bound::BranchAndBoundSolver;
pub use factory::SolverFactory;
pub use simplex_solver::SimplexSolver;
