// Domain service interface for solving optimization problems
// Defines the contract that the simplex and branch-and-bound backends follow

use super::models::Model;
use super::session::SolverSession;
use super::value_objects::SolutionStatus;

/// The LP text could not be turned into a model
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Unable to read LP model: {message} (line {line}, column {column})")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Unable to read LP model: variable '{name}' in {section} section is not declared")]
    UndeclaredVariable { name: String, section: String },

    #[error("Unable to read LP model: malformed number '{0}'")]
    InvalidNumber(String),
}

/// An option failed validation against the registry
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OptionError {
    #[error("Invalid option: '{0}' is not a recognised option")]
    UnknownOption(String),

    #[error("Invalid option: '{name}' expects {expected}, got {found}")]
    WrongType {
        name: String,
        expected: String,
        found: String,
    },

    #[error("Invalid option: '{name}' value {value} is outside [{min}, {max}]")]
    OutOfRange {
        name: String,
        value: String,
        min: String,
        max: String,
    },

    #[error("Invalid option: '{name}' value '{value}' is not one of {allowed:?}")]
    InvalidChoice {
        name: String,
        value: String,
        allowed: Vec<String>,
    },
}

/// Error types for the solver service
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Option(#[from] OptionError),

    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    #[error("Solver execution failed: {0}")]
    ExecutionFailed(String),
}

pub type Result<T> = std::result::Result<T, SolverError>;

/// Domain service interface for optimization backends
///
/// A backend reads the model and settings from the session, writes its
/// working basis (and incumbent, for integer search) back into it, and
/// returns the outcome status. Infeasible and unbounded problems are
/// statuses, not errors.
pub trait SolverService: Send + Sync {
    /// Solve a model, recording the final point in `session`
    fn solve(&self, model: &Model, session: &mut SolverSession) -> Result<SolutionStatus>;

    /// Check the structural invariants a hand-built model may break
    fn validate(&self, model: &Model) -> Result<()> {
        let mut errors = Vec::new();
        let num_vars = model.num_variables();

        for (i, &(index, coeff)) in model.objective.coefficients.iter().enumerate() {
            if index >= num_vars {
                errors.push(format!(
                    "Objective term {} references variable {} but model has {} variables",
                    i, index, num_vars
                ));
            }
            if !coeff.is_finite() {
                errors.push(format!("Objective term {} has non-finite coefficient", i));
            }
        }
        if !model.objective.offset.is_finite() {
            errors.push("Objective offset is not finite".to_string());
        }

        for (i, constraint) in model.constraints.iter().enumerate() {
            for &(index, coeff) in &constraint.coefficients {
                if index >= num_vars {
                    errors.push(format!(
                        "Constraint {} '{}' references variable {} but model has {} variables",
                        i, constraint.name, index, num_vars
                    ));
                }
                if !coeff.is_finite() {
                    errors.push(format!(
                        "Constraint {} '{}' has non-finite coefficient",
                        i, constraint.name
                    ));
                }
            }
            if constraint.lower_bound.is_nan() || constraint.upper_bound.is_nan() {
                errors.push(format!("Constraint {} '{}' has a NaN bound", i, constraint.name));
            }
        }

        for (i, var) in model.variables.iter().enumerate() {
            if var.lower_bound.is_nan() || var.upper_bound.is_nan() {
                errors.push(format!("Variable {} '{}' has a NaN bound", i, var.name));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SolverError::InvalidProblem(errors.join("; ")))
        }
    }

    /// Get the name of this solver backend
    fn name(&self) -> &str;

    /// Check if this solver supports mixed-integer programming
    fn supports_mip(&self) -> bool;
}
