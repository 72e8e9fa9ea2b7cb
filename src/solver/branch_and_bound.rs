// Branch-and-Bound Solver Adapter
// Implements the SolverService interface for mixed-integer models
// Depth-first search over bound changes, one relaxation solve per node

use super::relaxation::{model_bounds, solve_relaxation};
use super::simplex::Limits;
use super::standard_form::StandardForm;
use crate::domain::{
    models::{Model, SolverStatistics},
    session::{Incumbent, SolverSession},
    solver_service::{Result, SolverService},
    value_objects::SolutionStatus,
};
use std::rc::Rc;
use std::time::Instant;
use tracing::{debug, warn};

/// Column bounds a node imposes on top of its parent's
#[derive(Debug, Clone, Copy, PartialEq)]
struct BoundChange {
    column: usize,
    lower: f64,
    upper: f64,
}

/// Search node. Holds only its own change; the full bound set is rebuilt
/// by walking the parent chain.
#[derive(Debug)]
struct Node {
    change: Option<BoundChange>,
    parent: Option<Rc<Node>>,
    depth: usize,
}

impl Node {
    fn root() -> Rc<Self> {
        Rc::new(Self {
            change: None,
            parent: None,
            depth: 0,
        })
    }

    fn child(parent: &Rc<Node>, change: BoundChange) -> Rc<Self> {
        Rc::new(Self {
            change: Some(change),
            parent: Some(Rc::clone(parent)),
            depth: parent.depth + 1,
        })
    }

    fn bounds(&self, model_bounds: &[(f64, f64)]) -> Vec<(f64, f64)> {
        let mut changes = Vec::with_capacity(self.depth);
        let mut node = Some(self);
        while let Some(current) = node {
            if let Some(change) = current.change {
                changes.push(change);
            }
            node = current.parent.as_deref();
        }

        let mut bounds = model_bounds.to_vec();
        // root first, so deeper changes win
        for change in changes.into_iter().rev() {
            bounds[change.column] = (change.lower, change.upper);
        }
        bounds
    }
}

/// Most fractional integer column: distance to the nearest integer closest
/// to one half, lowest index on ties.
fn branching_column(values: &[f64], integer_columns: &[usize], tolerance: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for &column in integer_columns {
        let value = values[column];
        let fraction = value - value.floor();
        let distance = fraction.min(1.0 - fraction);
        if distance <= tolerance {
            continue;
        }
        if best.map_or(true, |(_, d)| distance > d) {
            best = Some((column, distance));
        }
    }
    best.map(|(column, _)| column)
}

pub struct BranchAndBoundSolver;

impl BranchAndBoundSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BranchAndBoundSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for BranchAndBoundSolver {
    fn solve(&self, model: &Model, session: &mut SolverSession) -> Result<SolutionStatus> {
        // Validate first
        self.validate(model)?;

        let start_time = Instant::now();
        let settings = session.settings.clone();
        let limits = Limits::from_settings(&settings, start_time);
        let sign = model.sense.sign();
        let base_bounds = model_bounds(model);
        let integer_columns: Vec<usize> = model
            .variables
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_integer())
            .map(|(j, _)| j)
            .collect();

        // reported if the search stops before the root relaxation is solved
        session.basis =
            StandardForm::from_model(model, &base_bounds, settings.infinite_bound).resting_point();

        let mut stack = vec![Node::root()];
        let mut incumbent: Option<Incumbent> = None;
        let mut nodes_explored = 0u64;
        let mut iterations = 0u64;
        let mut stopped: Option<SolutionStatus> = None;

        while let Some(node) = stack.pop() {
            if nodes_explored >= settings.max_nodes {
                stopped = Some(SolutionStatus::NodeLimit);
                break;
            }
            if limits.time_exceeded() {
                stopped = Some(SolutionStatus::TimeLimit);
                break;
            }

            let node_limits = Limits {
                iterations: limits.iterations.saturating_sub(iterations),
                ..limits
            };
            let bounds = node.bounds(&base_bounds);
            let outcome = solve_relaxation(model, &bounds, &settings, &node_limits)?;
            nodes_explored += 1;
            iterations += outcome.iterations;
            let objective = outcome.point.objective;
            let values = outcome.point.column_values.clone();
            if node.depth == 0 {
                session.basis = outcome.point;
            }

            match outcome.status {
                SolutionStatus::Optimal => {}
                SolutionStatus::Infeasible => {
                    debug!(depth = node.depth, "node infeasible");
                    continue;
                }
                SolutionStatus::Unbounded if node.depth == 0 => {
                    stopped = Some(SolutionStatus::Unbounded);
                    break;
                }
                SolutionStatus::Unbounded => {
                    warn!(depth = node.depth, "unbounded relaxation below a bounded root");
                    continue;
                }
                status => {
                    stopped = Some(status);
                    break;
                }
            }

            if let Some(best) = &incumbent {
                let gap = settings.mip_abs_gap.max(settings.mip_rel_gap * best.objective.abs());
                if objective >= best.objective - gap {
                    debug!(depth = node.depth, objective, "node pruned by bound");
                    continue;
                }
            }

            match branching_column(&values, &integer_columns, settings.integrality_tolerance) {
                None => {
                    let mut rounded = values;
                    for &column in &integer_columns {
                        rounded[column] = rounded[column].round();
                    }
                    let objective =
                        sign * (model.objective_value(&rounded) - model.objective.offset);
                    debug!(depth = node.depth, objective, "new incumbent");
                    incumbent = Some(Incumbent {
                        column_values: rounded,
                        objective,
                        depth: node.depth,
                    });
                }
                Some(column) => {
                    let value = values[column];
                    let (lower, upper) = bounds[column];
                    // pushed last, explored first
                    stack.push(Node::child(
                        &node,
                        BoundChange {
                            column,
                            lower: value.ceil(),
                            upper,
                        },
                    ));
                    stack.push(Node::child(
                        &node,
                        BoundChange {
                            column,
                            lower,
                            upper: value.floor(),
                        },
                    ));
                }
            }
        }

        let status = match stopped {
            Some(status) => status,
            None if incumbent.is_some() => SolutionStatus::Optimal,
            None => SolutionStatus::Infeasible,
        };

        session.statistics = SolverStatistics {
            simplex_iterations: iterations,
            nodes_explored,
            solve_time_ms: start_time.elapsed().as_secs_f64() * 1000.0,
            num_variables: model.num_variables() as u32,
            num_constraints: model.num_constraints() as u32,
            num_integer_vars: integer_columns.len() as u32,
        };
        session.incumbent = incumbent;

        debug!(%status, nodes_explored, iterations, "branch-and-bound finished");
        Ok(status)
    }

    fn name(&self) -> &str {
        "BranchAndBound"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}
