// Continuous relaxation pipeline: layout, presolve, scaling, simplex,
// unscaling and postsolve. Shared by the LP backend and every
// branch-and-bound node.

use super::presolve::{presolve, PresolveStatus};
use super::scaling::Scaling;
use super::simplex::{solve_standard_form, Limits, SimplexOutcome};
use super::standard_form::StandardForm;
use crate::domain::models::Model;
use crate::domain::options::SolverSettings;
use crate::domain::solver_service::Result;
use crate::domain::value_objects::SolutionStatus;
use tracing::debug;

/// Model bounds of every column
pub(crate) fn model_bounds(model: &Model) -> Vec<(f64, f64)> {
    model
        .variables
        .iter()
        .map(|v| (v.lower_bound, v.upper_bound))
        .collect()
}

/// Solve the relaxation of `model` with `column_bounds` in place of the
/// model's own bounds. The point comes back in model units, with duals in
/// minimisation form.
pub(crate) fn solve_relaxation(
    model: &Model,
    column_bounds: &[(f64, f64)],
    settings: &SolverSettings,
    limits: &Limits,
) -> Result<SimplexOutcome> {
    let form = StandardForm::from_model(model, column_bounds, settings.infinite_bound);

    if form.has_crossed_bounds() {
        debug!("bounds cross before pivoting");
        return Ok(SimplexOutcome {
            status: SolutionStatus::Infeasible,
            point: form.resting_point(),
            iterations: 0,
        });
    }

    if !settings.presolve.enabled() {
        return solve_scaled(&form, settings, limits);
    }

    let reduction = presolve(&form, settings);
    if reduction.status == PresolveStatus::Infeasible {
        return Ok(SimplexOutcome {
            status: SolutionStatus::Infeasible,
            point: form.resting_point(),
            iterations: 0,
        });
    }

    let reduced = solve_scaled(&reduction.reduced, settings, limits)?;
    let status = match (reduction.status, reduced.status) {
        (PresolveStatus::Unbounded, SolutionStatus::Optimal) => SolutionStatus::Unbounded,
        (_, status) => status,
    };
    Ok(SimplexOutcome {
        status,
        point: reduction.postsolve(&form, reduced.point),
        iterations: reduced.iterations,
    })
}

fn solve_scaled(
    form: &StandardForm,
    settings: &SolverSettings,
    limits: &Limits,
) -> Result<SimplexOutcome> {
    let scaling = Scaling::compute(form, settings);
    if scaling.is_identity() {
        return solve_standard_form(form, settings, limits);
    }
    let scaled = scaling.apply(form);
    let outcome = solve_standard_form(&scaled, settings, limits)?;
    Ok(SimplexOutcome {
        point: scaling.unscale(form, outcome.point),
        ..outcome
    })
}
