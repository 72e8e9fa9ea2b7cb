// LP text reader.
//
// Parses CPLEX-style LP text (see `lp.pest`) into a `Model`. Variables are
// indexed by first appearance; unnamed rows are called `R1`, `R2`, ...

use crate::domain::models::{Constraint, Model, Objective, Variable};
use crate::domain::solver_service::ModelError;
use crate::domain::value_objects::{Sense, VariableKind};
use pest::error::LineColLocation;
use pest::iterators::Pair;
use pest::Parser;
use std::collections::HashMap;

mod lp_parser {
    #[derive(pest_derive::Parser)]
    #[grammar = "application/lp.pest"]
    pub struct LpParser;
}

use lp_parser::{LpParser, Rule};

type Result<T> = std::result::Result<T, ModelError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    LessEqual,
    GreaterEqual,
    Equal,
}

/// Linear expression as read: terms in order of appearance plus the sum of
/// constant terms
#[derive(Debug, Default)]
struct Expression {
    terms: Vec<(usize, f64)>,
    constant: f64,
}

fn syntax_error(error: pest::error::Error<Rule>) -> ModelError {
    let (line, column) = match error.line_col {
        LineColLocation::Pos(position) => position,
        LineColLocation::Span(start, _) => start,
    };
    ModelError::Syntax {
        line,
        column,
        message: error.variant.message().into_owned(),
    }
}

fn malformed(pair: &Pair<Rule>, message: &str) -> ModelError {
    let (line, column) = pair.as_span().start_pos().line_col();
    ModelError::Syntax {
        line,
        column,
        message: format!("{} near '{}'", message, pair.as_str()),
    }
}

fn next_inner<'i>(
    pairs: &mut pest::iterators::Pairs<'i, Rule>,
    parent: &Pair<'i, Rule>,
) -> Result<Pair<'i, Rule>> {
    pairs
        .next()
        .ok_or_else(|| malformed(parent, "incomplete statement"))
}

fn parse_number(pair: &Pair<Rule>) -> Result<f64> {
    pair.as_str()
        .parse::<f64>()
        .map_err(|_| ModelError::InvalidNumber(pair.as_str().to_string()))
}

fn parse_sign(pair: &Pair<Rule>) -> f64 {
    if pair.as_str() == "-" {
        -1.0
    } else {
        1.0
    }
}

/// `value = sign? (number | inf)`
fn parse_value(pair: Pair<Rule>) -> Result<f64> {
    let mut sign = 1.0;
    let mut magnitude = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::sign => sign = parse_sign(&inner),
            Rule::number => magnitude = Some(parse_number(&inner)?),
            Rule::inf_kw => magnitude = Some(f64::INFINITY),
            _ => {}
        }
    }
    Ok(sign * magnitude.unwrap_or(0.0))
}

fn parse_relation(pair: &Pair<Rule>) -> Result<Relation> {
    let inner = pair
        .clone()
        .into_inner()
        .next()
        .ok_or_else(|| malformed(pair, "missing comparison"))?;
    Ok(match inner.as_rule() {
        Rule::le => Relation::LessEqual,
        Rule::ge => Relation::GreaterEqual,
        _ => Relation::Equal,
    })
}

/// Bounds on `expression` implied by `expression op rhs`
fn relation_bounds(relation: Relation, rhs: f64) -> (f64, f64) {
    match relation {
        Relation::LessEqual => (f64::NEG_INFINITY, rhs),
        Relation::GreaterEqual => (rhs, f64::INFINITY),
        Relation::Equal => (rhs, rhs),
    }
}

/// Bounds on `expression` implied by `lhs op expression`
fn mirrored_bounds(relation: Relation, lhs: f64) -> (f64, f64) {
    match relation {
        Relation::LessEqual => (lhs, f64::INFINITY),
        Relation::GreaterEqual => (f64::NEG_INFINITY, lhs),
        Relation::Equal => (lhs, lhs),
    }
}

fn intersect(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    (a.0.max(b.0), a.1.min(b.1))
}

#[derive(Default)]
struct LpBuilder {
    sense: Option<Sense>,
    objective: Objective,
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    index: HashMap<String, usize>,
}

impl LpBuilder {
    /// Index of `name`, declaring it with default bounds on first sight
    fn column(&mut self, name: &str) -> usize {
        if let Some(&index) = self.index.get(name) {
            return index;
        }
        let index = self.variables.len();
        self.variables.push(Variable::continuous(name));
        self.index.insert(name.to_string(), index);
        index
    }

    fn expression(&mut self, pair: Pair<Rule>) -> Result<Expression> {
        let mut expression = Expression::default();
        for summand in pair.into_inner() {
            let rule = summand.as_rule();
            let mut coefficient = 1.0;
            let mut column = None;
            for part in summand.into_inner() {
                match part.as_rule() {
                    Rule::sign => coefficient *= parse_sign(&part),
                    Rule::number => coefficient *= parse_number(&part)?,
                    Rule::identifier => column = Some(self.column(part.as_str())),
                    _ => {}
                }
            }
            match (rule, column) {
                (Rule::term, Some(column)) => expression.terms.push((column, coefficient)),
                _ => expression.constant += coefficient,
            }
        }
        Ok(expression)
    }

    fn objective(&mut self, pair: Pair<Rule>) -> Result<()> {
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::sense => {
                    let is_max = inner
                        .into_inner()
                        .next()
                        .is_some_and(|kw| kw.as_rule() == Rule::maximize_kw);
                    self.sense = Some(if is_max { Sense::Maximize } else { Sense::Minimize });
                }
                Rule::label => {
                    if let Some(name) = inner.into_inner().next() {
                        self.objective.name = name.as_str().to_string();
                    }
                }
                Rule::expression => {
                    let expression = self.expression(inner)?;
                    self.objective.coefficients = expression.terms;
                    self.objective.offset = expression.constant;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn constraint(&mut self, pair: Pair<Rule>) -> Result<()> {
        let mut name = None;
        let mut row = None;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::label => name = inner.into_inner().next().map(|n| n.as_str().to_string()),
                Rule::single_row | Rule::ranged_row | Rule::value_row => {
                    row = Some(self.row(inner)?)
                }
                _ => {}
            }
        }
        let Some((expression, lower, upper)) = row else {
            return Ok(());
        };

        // constants on the left move to the right
        let constraint = Constraint::ranged(
            expression.terms,
            lower - expression.constant,
            upper - expression.constant,
        )
        .with_name(name.unwrap_or_else(|| format!("R{}", self.constraints.len() + 1)));
        self.constraints.push(constraint);
        Ok(())
    }

    fn row(&mut self, pair: Pair<Rule>) -> Result<(Expression, f64, f64)> {
        let rule = pair.as_rule();
        let parent = pair.clone();
        let mut inner = pair.into_inner();
        if rule == Rule::single_row {
            let expression = self.expression(next_inner(&mut inner, &parent)?)?;
            let relation = parse_relation(&next_inner(&mut inner, &parent)?)?;
            let rhs = parse_value(next_inner(&mut inner, &parent)?)?;
            let (lower, upper) = relation_bounds(relation, rhs);
            Ok((expression, lower, upper))
        } else if rule == Rule::value_row {
            let lhs = parse_value(next_inner(&mut inner, &parent)?)?;
            let relation = parse_relation(&next_inner(&mut inner, &parent)?)?;
            let expression = self.expression(next_inner(&mut inner, &parent)?)?;
            let (lower, upper) = mirrored_bounds(relation, lhs);
            Ok((expression, lower, upper))
        } else {
            let lhs = parse_value(next_inner(&mut inner, &parent)?)?;
            let left = parse_relation(&next_inner(&mut inner, &parent)?)?;
            let expression = self.expression(next_inner(&mut inner, &parent)?)?;
            let right = parse_relation(&next_inner(&mut inner, &parent)?)?;
            let rhs = parse_value(next_inner(&mut inner, &parent)?)?;
            let (lower, upper) = intersect(mirrored_bounds(left, lhs), relation_bounds(right, rhs));
            Ok((expression, lower, upper))
        }
    }

    fn bound(&mut self, pair: Pair<Rule>) -> Result<()> {
        let rule = pair.as_rule();
        let parent = pair.clone();
        let mut inner = pair.into_inner();
        match rule {
            Rule::free_bound => {
                let column = self.column(next_inner(&mut inner, &parent)?.as_str());
                self.set_bounds(column, f64::NEG_INFINITY, f64::INFINITY);
            }
            Rule::upper_first => {
                let column = self.column(next_inner(&mut inner, &parent)?.as_str());
                let relation = parse_relation(&next_inner(&mut inner, &parent)?)?;
                let value = parse_value(next_inner(&mut inner, &parent)?)?;
                self.apply_relation(column, relation, value);
            }
            Rule::value_first => {
                let value = parse_value(next_inner(&mut inner, &parent)?)?;
                let relation = parse_relation(&next_inner(&mut inner, &parent)?)?;
                let column = self.column(next_inner(&mut inner, &parent)?.as_str());
                let flipped = match relation {
                    Relation::LessEqual => Relation::GreaterEqual,
                    Relation::GreaterEqual => Relation::LessEqual,
                    Relation::Equal => Relation::Equal,
                };
                self.apply_relation(column, flipped, value);
            }
            Rule::double_bound => {
                let first = parse_value(next_inner(&mut inner, &parent)?)?;
                let left = parse_relation(&next_inner(&mut inner, &parent)?)?;
                let column = self.column(next_inner(&mut inner, &parent)?.as_str());
                let right = parse_relation(&next_inner(&mut inner, &parent)?)?;
                let second = parse_value(next_inner(&mut inner, &parent)?)?;
                match (left, right) {
                    (Relation::LessEqual, Relation::LessEqual) => {
                        self.set_bounds(column, first, second)
                    }
                    (Relation::GreaterEqual, Relation::GreaterEqual) => {
                        self.set_bounds(column, second, first)
                    }
                    _ => {
                        return Err(malformed(
                            &parent,
                            "bound comparisons must point the same way",
                        ))
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn apply_relation(&mut self, column: usize, relation: Relation, value: f64) {
        let variable = &mut self.variables[column];
        match relation {
            Relation::LessEqual => variable.upper_bound = value,
            Relation::GreaterEqual => variable.lower_bound = value,
            Relation::Equal => {
                variable.lower_bound = value;
                variable.upper_bound = value;
            }
        }
    }

    fn set_bounds(&mut self, column: usize, lower: f64, upper: f64) {
        let variable = &mut self.variables[column];
        variable.lower_bound = lower;
        variable.upper_bound = upper;
    }

    fn integrality(&mut self, pair: Pair<Rule>, binary: bool) -> Result<()> {
        let section = if binary { "Binary" } else { "General" };
        for inner in pair.into_inner() {
            if inner.as_rule() != Rule::identifier {
                continue;
            }
            let name = inner.as_str();
            let column = *self
                .index
                .get(name)
                .ok_or_else(|| ModelError::UndeclaredVariable {
                    name: name.to_string(),
                    section: section.to_string(),
                })?;
            let variable = &mut self.variables[column];
            variable.kind = VariableKind::Integer;
            if binary {
                variable.lower_bound = 0.0;
                variable.upper_bound = 1.0;
            }
        }
        Ok(())
    }

    fn build(self) -> Model {
        Model::new(self.sense.unwrap_or(Sense::Minimize))
            .with_variables(self.variables)
            .with_constraints(self.constraints)
            .with_objective(self.objective)
    }
}

/// Read LP text into a model
pub fn read_lp(text: &str) -> Result<Model> {
    let mut pairs = LpParser::parse(Rule::lp, text).map_err(syntax_error)?;
    let lp = pairs.next().ok_or_else(|| ModelError::Syntax {
        line: 1,
        column: 1,
        message: "empty input".to_string(),
    })?;

    let mut builder = LpBuilder::default();
    for section in lp.into_inner() {
        match section.as_rule() {
            Rule::objective => builder.objective(section)?,
            Rule::constraints => {
                for constraint in section.into_inner() {
                    if constraint.as_rule() == Rule::constraint {
                        builder.constraint(constraint)?;
                    }
                }
            }
            Rule::bounds => {
                for bound in section.into_inner() {
                    builder.bound(bound)?;
                }
            }
            Rule::generals => builder.integrality(section, false)?,
            Rule::binaries => builder.integrality(section, true)?,
            _ => {}
        }
    }
    Ok(builder.build())
}
