use super::value_objects::{Sense, VariableKind};

/// Decision variable in an optimization problem
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub kind: VariableKind,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub name: String,
}

impl Variable {
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            kind: VariableKind::Continuous,
            lower_bound: 0.0,
            upper_bound: f64::INFINITY,
            name: name.into(),
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self {
            kind: VariableKind::Integer,
            lower_bound: 0.0,
            upper_bound: f64::INFINITY,
            name: name.into(),
        }
    }

    /// Integer variable restricted to {0, 1}
    pub fn binary(name: impl Into<String>) -> Self {
        Self::integer(name).with_bounds(0.0, 1.0)
    }

    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower_bound = lower;
        self.upper_bound = upper;
        self
    }

    pub fn is_integer(&self) -> bool {
        self.kind == VariableKind::Integer
    }

    pub fn is_fixed(&self) -> bool {
        self.lower_bound == self.upper_bound
    }
}

/// Linear objective: sparse coefficients plus a constant offset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Objective {
    pub name: String,
    pub coefficients: Vec<(usize, f64)>,
    pub offset: f64,
}

impl Objective {
    pub fn new(coefficients: Vec<(usize, f64)>) -> Self {
        Self {
            name: String::new(),
            coefficients,
            offset: 0.0,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    /// Dense cost vector of length `num_vars`, duplicate entries summed
    pub fn dense(&self, num_vars: usize) -> Vec<f64> {
        let mut costs = vec![0.0; num_vars];
        for &(index, value) in &self.coefficients {
            if let Some(cost) = costs.get_mut(index) {
                *cost += value;
            }
        }
        costs
    }
}

/// Linear constraint `lower_bound <= Σ a_j x_j <= upper_bound`
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub coefficients: Vec<(usize, f64)>,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub name: String,
}

impl Constraint {
    pub fn ranged(coefficients: Vec<(usize, f64)>, lower: f64, upper: f64) -> Self {
        Self {
            coefficients,
            lower_bound: lower,
            upper_bound: upper,
            name: String::new(),
        }
    }

    pub fn less_equal(coefficients: Vec<(usize, f64)>, bound: f64) -> Self {
        Self::ranged(coefficients, f64::NEG_INFINITY, bound)
    }

    pub fn greater_equal(coefficients: Vec<(usize, f64)>, bound: f64) -> Self {
        Self::ranged(coefficients, bound, f64::INFINITY)
    }

    pub fn equal(coefficients: Vec<(usize, f64)>, bound: f64) -> Self {
        Self::ranged(coefficients, bound, bound)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn is_equality(&self) -> bool {
        self.lower_bound == self.upper_bound
    }

    /// Row activity `Σ a_j x_j` at the given column values
    pub fn activity(&self, values: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .map(|&(index, coeff)| coeff * values.get(index).copied().unwrap_or(0.0))
            .sum()
    }
}

/// Complete optimization problem, immutable once handed to the engine
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub sense: Sense,
    pub objective: Objective,
    pub variables: Vec<Variable>,
    pub constraints: Vec<Constraint>,
}

impl Model {
    pub fn new(sense: Sense) -> Self {
        Self {
            sense,
            objective: Objective::default(),
            variables: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Append a variable and return its index
    pub fn add_variable(&mut self, variable: Variable) -> usize {
        self.variables.push(variable);
        self.variables.len() - 1
    }

    /// Append a constraint and return its index
    pub fn add_constraint(&mut self, constraint: Constraint) -> usize {
        self.constraints.push(constraint);
        self.constraints.len() - 1
    }

    pub fn set_objective(&mut self, objective: Objective) {
        self.objective = objective;
    }

    pub fn with_variables(mut self, variables: Vec<Variable>) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_constraints(mut self, constraints: Vec<Constraint>) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn num_integer_variables(&self) -> usize {
        self.variables.iter().filter(|v| v.is_integer()).count()
    }

    pub fn is_mixed_integer(&self) -> bool {
        self.num_integer_variables() > 0
    }

    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.name == name)
    }

    /// Objective value (offset included) at the given column values
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective.offset
            + self
                .objective
                .coefficients
                .iter()
                .map(|&(index, coeff)| coeff * values.get(index).copied().unwrap_or(0.0))
                .sum::<f64>()
    }

    /// Row activities of every constraint at the given column values
    pub fn row_activities(&self, values: &[f64]) -> Vec<f64> {
        self.constraints.iter().map(|c| c.activity(values)).collect()
    }
}

/// Statistics about the solve process
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverStatistics {
    pub simplex_iterations: u64,
    pub nodes_explored: u64,
    pub solve_time_ms: f64,
    pub num_variables: u32,
    pub num_constraints: u32,
    pub num_integer_vars: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_model() -> Model {
        let mut model = Model::new(Sense::Maximize);
        let x = model.add_variable(Variable::continuous("x").with_bounds(0.0, 4.0));
        let y = model.add_variable(Variable::integer("y"));
        model.add_constraint(
            Constraint::less_equal(vec![(x, 1.0), (y, 2.0)], 10.0).with_name("c1"),
        );
        model.set_objective(Objective::new(vec![(x, 3.0), (y, 1.0), (x, 1.0)]).with_offset(2.0));
        model
    }

    #[test]
    fn test_model_counts() {
        let model = small_model();
        assert_eq!(model.num_variables(), 2);
        assert_eq!(model.num_constraints(), 1);
        assert_eq!(model.num_integer_variables(), 1);
        assert!(model.is_mixed_integer());
        assert_eq!(model.variable_index("y"), Some(1));
        assert_eq!(model.variable_index("z"), None);
    }

    #[test]
    fn test_objective_sums_duplicates() {
        let model = small_model();
        assert_eq!(model.objective.dense(2), vec![4.0, 1.0]);
        assert_eq!(model.objective_value(&[1.0, 2.0]), 2.0 + 4.0 + 2.0);
    }

    #[test]
    fn test_constraint_shapes() {
        let le = Constraint::less_equal(vec![(0, 1.0)], 5.0);
        assert_eq!(le.lower_bound, f64::NEG_INFINITY);
        let ge = Constraint::greater_equal(vec![(0, 1.0)], 5.0);
        assert_eq!(ge.upper_bound, f64::INFINITY);
        let eq = Constraint::equal(vec![(0, 1.0)], 5.0);
        assert!(eq.is_equality());
        assert_eq!(small_model().row_activities(&[2.0, 3.0]), vec![8.0]);
    }

    #[test]
    fn test_binary_bounds() {
        let b = Variable::binary("b");
        assert!(b.is_integer());
        assert_eq!((b.lower_bound, b.upper_bound), (0.0, 1.0));
        assert!(Variable::continuous("f").with_bounds(3.0, 3.0).is_fixed());
    }
}
