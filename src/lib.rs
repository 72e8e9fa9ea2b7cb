//! Linear and mixed-integer programming from LP text.
//!
//! ```no_run
//! use linopt::OptionMap;
//!
//! let text = "Maximize\n obj: x + 2 y\nSubject To\n c1: x + y <= 4\nEnd";
//! let solution = linopt::solve(text, &OptionMap::new()).unwrap();
//! println!("{}", solution.columns.get("y").unwrap().primal);
//! ```

// Domain layer: Business logic and rules
pub mod domain;

// Application layer: Use cases and service orchestration
pub mod application;

// Infrastructure layer: Process-wide engine
pub mod infrastructure;

// Solver adapters: Concrete implementations of SolverService
pub mod solver;

// Re-export commonly used types
pub use domain::{
    BasisStatus, Constraint, Model, ModelError, Objective, OptionError, OptionMap, OptionValue,
    Sense, SolutionStatus, SolverError, SolverService, SolverSettings, Variable, VariableKind,
};

pub use application::{read_lp, Column, Columns, Row, Solution};

pub use infrastructure::Engine;

pub use solver::{BranchAndBoundSolver, SimplexSolver, SolverFactory};

/// Solve LP text with the shared engine
pub fn solve(text: &str, options: &OptionMap) -> domain::Result<Solution> {
    Engine::global().solve(text, options)
}

/// Solve LP text with options given as a JSON object
pub fn solve_with_json_options(
    text: &str,
    options: &serde_json::Value,
) -> domain::Result<Solution> {
    Engine::global().solve_with_json_options(text, options)
}
