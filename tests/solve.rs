use approx::assert_relative_eq;
use linopt::{
    BasisStatus, Constraint, Engine, Model, Objective, OptionMap, OptionValue, Sense,
    SolutionStatus, SolverError, Variable, VariableKind,
};
use serde_json::json;
use test_case::test_case;

const PRODUCTION: &str = "Maximize
 obj: x1 + 2 x2 + 3 x3 + x4
Subject To
 c1: - x1 + x2 + x3 + 10 x4 <= 20
 c2: x1 - 3 x2 + x3 <= 30
 c3: x2 - 3.5 x4 = 0
Bounds
 0 <= x1 <= 40
 2 <= x4 <= 3
End";

const COVER: &str = "Minimize
 obj: a + b
Subject To
 c1: 2 a + b >= 6.5
General
 a
End";

fn options(pairs: &[(&str, OptionValue)]) -> OptionMap {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

#[test]
fn test_production_problem() {
    let solution = linopt::solve(PRODUCTION, &OptionMap::new()).unwrap();
    assert!(solution.is_linear);
    assert_eq!(solution.status, SolutionStatus::Optimal);
    assert_relative_eq!(solution.objective_value, 125.20833, epsilon = 1e-4);

    let x1 = solution.columns.get("x1").unwrap();
    assert_eq!(x1.primal, 40.0);
    assert_eq!(x1.status, Some(BasisStatus::UB));
    assert_relative_eq!(x1.dual.unwrap(), 1.29167, epsilon = 1e-4);

    let x2 = solution.columns.get("x2").unwrap();
    assert_relative_eq!(x2.primal, 10.20833, epsilon = 1e-4);
    assert_eq!(x2.status, Some(BasisStatus::BS));

    let x3 = solution.columns.get("x3").unwrap();
    assert_relative_eq!(x3.primal, 20.625, epsilon = 1e-4);
    assert_eq!(x3.status, Some(BasisStatus::BS));

    let x4 = solution.columns.get("x4").unwrap();
    assert_relative_eq!(x4.primal, 2.91667, epsilon = 1e-4);
    assert_eq!(x4.status, Some(BasisStatus::BS));

    let c3 = &solution.rows[2];
    assert_eq!(c3.status, Some(BasisStatus::FX));
    assert_relative_eq!(c3.primal, 0.0, epsilon = 1e-9);
    assert_relative_eq!(c3.dual.unwrap(), 4.41667, epsilon = 1e-4);

    assert_eq!(solution.rows[0].status, Some(BasisStatus::UB));
    assert_relative_eq!(solution.rows[0].primal, 20.0, epsilon = 1e-9);
    assert_relative_eq!(solution.rows[0].dual.unwrap(), 1.64583, epsilon = 1e-4);
    assert_eq!(solution.rows[1].status, Some(BasisStatus::UB));
    assert_relative_eq!(solution.rows[1].dual.unwrap(), 1.35417, epsilon = 1e-4);
}

#[test]
fn test_basic_duals_keep_negative_zero() {
    let solution = linopt::solve(PRODUCTION, &OptionMap::new()).unwrap();
    for name in ["x2", "x3", "x4"] {
        let dual = solution.columns.get(name).unwrap().dual.unwrap();
        assert!(dual == 0.0 && dual.is_sign_negative(), "{} dual was {}", name, dual);
    }
    let text = serde_json::to_string(&solution).unwrap();
    assert!(text.contains("\"Dual\":-0.0"));
}

#[test_case(&[] ; "defaults")]
#[test_case(&[
    ("allowed_cost_scale_factor", OptionValue::Int(2)),
    ("use_implied_bounds_from_presolve", OptionValue::Bool(true)),
    ("presolve", OptionValue::from("off")),
] ; "cost scaling without presolve")]
#[test_case(&[("simplex_pricing", OptionValue::from("devex"))] ; "devex pricing")]
#[test_case(&[("simplex_scale_strategy", OptionValue::Int(0))] ; "no scaling")]
#[test_case(&[
    ("presolve", OptionValue::from("on")),
    ("use_implied_bounds_from_presolve", OptionValue::Bool(true)),
] ; "presolve with implied bounds")]
#[test_case(&[("output_flag", OptionValue::Bool(true))] ; "output flag")]
fn test_options_do_not_change_the_answer(pairs: &[(&str, OptionValue)]) {
    let solution = linopt::solve(PRODUCTION, &options(pairs)).unwrap();
    assert_eq!(solution.status, SolutionStatus::Optimal);
    assert_relative_eq!(solution.objective_value, 125.20833, epsilon = 1e-4);
    let expected = [40.0, 10.20833, 20.625, 2.91667];
    for (column, value) in solution.columns.iter().zip(expected) {
        assert_relative_eq!(column.primal, value, epsilon = 1e-4);
    }
}

#[test]
fn test_indices_follow_declaration_order() {
    let solution = linopt::solve(PRODUCTION, &OptionMap::new()).unwrap();
    let names: Vec<&str> = solution.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["x1", "x2", "x3", "x4"]);
    for (position, column) in solution.columns.iter().enumerate() {
        assert_eq!(column.index, position);
    }
    for (position, row) in solution.rows.iter().enumerate() {
        assert_eq!(row.index, position);
    }
}

#[test]
fn test_cover_problem_is_mixed_integer() {
    let solution = linopt::solve(COVER, &OptionMap::new()).unwrap();
    assert!(!solution.is_linear);
    assert_eq!(solution.status, SolutionStatus::Optimal);

    let a = solution.columns.get("a").unwrap();
    assert_eq!(a.primal, 3.0);
    assert_eq!(a.kind, Some(VariableKind::Integer));
    let b = solution.columns.get("b").unwrap();
    assert_relative_eq!(b.primal, 0.5, epsilon = 1e-9);
    assert_eq!(b.kind, Some(VariableKind::Continuous));
    assert_relative_eq!(solution.rows[0].primal, 6.5, epsilon = 1e-9);

    let value = solution.to_json().unwrap();
    assert_eq!(value["IsLinear"], json!(false));
    for name in ["a", "b"] {
        let column = &value["Columns"][name];
        assert!(column.get("Status").is_none());
        assert!(column.get("Dual").is_none());
        assert!(column.get("Type").is_some());
    }
    assert!(value["Rows"][0].get("Status").is_none());
    assert!(value["Rows"][0].get("Dual").is_none());
}

#[test]
fn test_fixed_column_classifies_fx() {
    let text = "Minimize\n obj: x + y\nSubject To\n c: x + y >= 1\nBounds\n x = 2\nEnd";
    let solution = linopt::solve(text, &OptionMap::new()).unwrap();
    assert_eq!(solution.status, SolutionStatus::Optimal);
    let x = solution.columns.get("x").unwrap();
    assert_eq!(x.primal, 2.0);
    assert_eq!(x.status, Some(BasisStatus::FX));
    assert_eq!(solution.columns.get("y").unwrap().primal, 0.0);
}

#[test_case(
    "Minimize\n obj: x\nSubject To\n c: x >= 2\nBounds\n x <= 1\nEnd",
    SolutionStatus::Infeasible
    ; "infeasible lp"
)]
#[test_case(
    "Maximize\n obj: x + y\nSubject To\n c: x - y <= 1\nEnd",
    SolutionStatus::Unbounded
    ; "unbounded lp"
)]
#[test_case(
    "Minimize\n obj: a\nSubject To\n c: 2 a = 1\nGeneral\n a\nEnd",
    SolutionStatus::Infeasible
    ; "integer infeasible"
)]
#[test_case(
    "Maximize\n obj: a\nSubject To\n c: a + b >= 1\nGeneral\n a\nEnd",
    SolutionStatus::Unbounded
    ; "unbounded mip"
)]
fn test_outcomes_are_statuses_not_errors(text: &str, expected: SolutionStatus) {
    let solution = linopt::solve(text, &OptionMap::new()).unwrap();
    assert_eq!(solution.status, expected);
}

#[test_case("Minimize\n obj: x\nSubject To\n c: x >= 1e25\nEnd" ; "row lower at infinity")]
#[test_case("Minimize\n obj: x\nSubject To\n c: x >= inf\nEnd" ; "row lower infinite literal")]
#[test_case(
    "Minimize\n obj: x\nSubject To\n c: x + y >= 1\nBounds\n x >= 1e25\nEnd"
    ; "column lower at infinity"
)]
#[test_case("Maximize\n obj: x\nSubject To\n c: x <= -1e25\nEnd" ; "row upper at minus infinity")]
fn test_unreachable_infinite_bound_is_infeasible(text: &str) {
    let solution = linopt::solve(text, &OptionMap::new()).unwrap();
    assert_eq!(solution.status, SolutionStatus::Infeasible);
    assert!(solution.objective_value.is_finite());
    assert!(solution.columns.iter().all(|c| c.primal.is_finite()));
}

#[test]
fn test_infinite_bound_option_moves_the_threshold() {
    let text = "Minimize\n obj: x\nSubject To\n c: x >= 1e25\nEnd";
    let solution =
        linopt::solve(text, &options(&[("infinite_bound", OptionValue::Double(1e30))])).unwrap();
    assert_eq!(solution.status, SolutionStatus::Optimal);
    assert_relative_eq!(solution.columns[0].primal, 1e25, max_relative = 1e-12);
    assert_eq!(solution.rows[0].lower, 1e25);
}

#[test_case(&[("time_limit", OptionValue::Double(0.0))], SolutionStatus::TimeLimit ; "time limit")]
#[test_case(
    &[("simplex_iteration_limit", OptionValue::Int(1))],
    SolutionStatus::IterationLimit
    ; "iteration limit"
)]
fn test_lp_limits(pairs: &[(&str, OptionValue)], expected: SolutionStatus) {
    let solution = linopt::solve(PRODUCTION, &options(pairs)).unwrap();
    assert_eq!(solution.status, expected);
    assert_eq!(solution.columns.len(), 4);
    for column in &solution.columns {
        assert!(column.primal >= column.lower - 1e-9 && column.primal <= column.upper + 1e-9);
    }
}

#[test_case(&[("mip_max_nodes", OptionValue::Int(0))], SolutionStatus::NodeLimit ; "node limit")]
#[test_case(&[("time_limit", OptionValue::Int(0))], SolutionStatus::TimeLimit ; "time limit")]
fn test_mip_stopped_before_root_stays_within_bounds(
    pairs: &[(&str, OptionValue)],
    expected: SolutionStatus,
) {
    let text = "Minimize\n obj: a + b\nSubject To\n c1: 2 a + b >= 6.5\n\
                Bounds\n 1 <= b <= 5\nGeneral\n a\nEnd";
    let solution = linopt::solve(text, &options(pairs)).unwrap();
    assert_eq!(solution.status, expected);
    assert_eq!(solution.columns.get("a").unwrap().primal, 0.0);
    assert_eq!(solution.columns.get("b").unwrap().primal, 1.0);
    assert_eq!(solution.rows[0].primal, 1.0);
}

#[test]
fn test_node_limit_reports_incumbent() {
    // root, then the down branch finds a = 3, b = 0.5; the up branch is cut off
    let limit = options(&[("mip_max_nodes", OptionValue::Int(2))]);
    let solution = linopt::solve(COVER, &limit).unwrap();
    assert_eq!(solution.status, SolutionStatus::NodeLimit);
    assert_eq!(solution.statistics.nodes_explored, 2);
    assert_eq!(solution.columns.get("a").unwrap().primal, 3.0);
    assert_relative_eq!(solution.columns.get("b").unwrap().primal, 0.5, epsilon = 1e-9);
    assert_relative_eq!(solution.objective_value, 3.5, epsilon = 1e-9);
}

const KNAPSACK: &str = "Maximize
 obj: 5 x + 4 y
Subject To
 c1: 6 x + 4 y <= 24
 c2: x + 2 y <= 6
General
 x y
End";

#[test_case(&[], 20.0 ; "default gaps")]
#[test_case(&[("mip_abs_gap", OptionValue::Double(10.0))], 19.0 ; "absolute gap")]
#[test_case(&[("mip_rel_gap", OptionValue::Double(0.6))], 19.0 ; "relative gap")]
fn test_gap_prunes_improving_nodes(pairs: &[(&str, OptionValue)], expected: f64) {
    // the first incumbent (x = 3, y = 1) is worth 19; x = 4, y = 0 is worth 20
    let solution = linopt::solve(KNAPSACK, &options(pairs)).unwrap();
    assert_eq!(solution.status, SolutionStatus::Optimal);
    assert_relative_eq!(solution.objective_value, expected, epsilon = 1e-9);
}

#[test]
fn test_malformed_text_is_an_input_error() {
    let error = linopt::solve("This is not an LP file at all.", &OptionMap::new()).unwrap_err();
    assert!(matches!(error, SolverError::Model(_)));
    assert!(error.to_string().starts_with("Unable to read LP model"));
}

#[test_case("no_such_option", OptionValue::Bool(true) ; "unknown name")]
#[test_case("presolve", OptionValue::Int(1) ; "wrong type")]
#[test_case("simplex_pricing", OptionValue::from("steepest") ; "bad choice")]
#[test_case("allowed_cost_scale_factor", OptionValue::Int(-1) ; "out of range")]
fn test_bad_options_are_rejected(name: &str, value: OptionValue) {
    let error = linopt::solve(PRODUCTION, &options(&[(name, value)])).unwrap_err();
    assert!(matches!(error, SolverError::Option(_)));
    assert!(error.to_string().starts_with("Invalid option"));
}

#[test]
fn test_json_options() {
    let solution = linopt::solve_with_json_options(
        PRODUCTION,
        &json!({"presolve": "off", "allowed_cost_scale_factor": 2}),
    )
    .unwrap();
    assert_eq!(solution.status, SolutionStatus::Optimal);

    let value = solution.to_json().unwrap();
    assert_eq!(value["Status"], json!("Optimal"));
    assert_eq!(value["Columns"]["x1"]["Upper"], json!(40.0));
    assert_eq!(value["Columns"]["x2"]["Upper"], json!("Infinity"));
    assert_eq!(value["Rows"][2]["Status"], json!("FX"));

    let error = linopt::solve_with_json_options(PRODUCTION, &json!({"presolve": 3})).unwrap_err();
    assert!(matches!(error, SolverError::Option(_)));
}

#[test]
fn test_engine_solves_built_model() {
    let mut model = Model::new(Sense::Maximize);
    let x = model.add_variable(Variable::integer("x"));
    let y = model.add_variable(Variable::integer("y"));
    model.add_constraint(Constraint::less_equal(vec![(x, 6.0), (y, 4.0)], 24.0).with_name("wood"));
    model.add_constraint(Constraint::less_equal(vec![(x, 1.0), (y, 2.0)], 6.0).with_name("labour"));
    model.set_objective(Objective::new(vec![(x, 5.0), (y, 4.0)]));

    let solution = Engine::global().solve_model(&model, &OptionMap::new()).unwrap();
    assert!(!solution.is_linear);
    assert_eq!(solution.status, SolutionStatus::Optimal);
    assert_relative_eq!(solution.objective_value, 20.0, epsilon = 1e-9);
    assert!(solution.statistics.nodes_explored >= 1);
}
