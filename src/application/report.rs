// Solution report: classifies the final solver state into per-column and
// per-row records and renders them as JSON.

use crate::domain::models::{Model, SolverStatistics};
use crate::domain::options::normalize_bound;
use crate::domain::session::SolverSession;
use crate::domain::value_objects::{BasisStatus, SolutionStatus, VariableKind};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Infinite bounds render as the strings `"Infinity"` / `"-Infinity"`
fn serialize_bound<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if *value == f64::INFINITY {
        serializer.serialize_str("Infinity")
    } else if *value == f64::NEG_INFINITY {
        serializer.serialize_str("-Infinity")
    } else {
        serializer.serialize_f64(*value)
    }
}

/// One decision variable in the report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Column {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BasisStatus>,
    #[serde(serialize_with = "serialize_bound")]
    pub lower: f64,
    #[serde(serialize_with = "serialize_bound")]
    pub upper: f64,
    pub primal: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dual: Option<f64>,
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<VariableKind>,
    pub name: String,
}

/// One constraint in the report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Row {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BasisStatus>,
    #[serde(serialize_with = "serialize_bound")]
    pub lower: f64,
    #[serde(serialize_with = "serialize_bound")]
    pub upper: f64,
    pub primal: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dual: Option<f64>,
}

/// Columns in declaration order, serialised as a name → column map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Columns(Vec<Column>);

impl Columns {
    pub fn get(&self, name: &str) -> Option<&Column> {
        self.0.iter().find(|c| c.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Column> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::ops::Index<usize> for Columns {
    type Output = Column;

    fn index(&self, index: usize) -> &Column {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a Columns {
    type Item = &'a Column;
    type IntoIter = std::slice::Iter<'a, Column>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for Columns {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for column in &self.0 {
            map.serialize_entry(&column.name, column)?;
        }
        map.end()
    }
}

/// Outcome of one solve call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Solution {
    pub is_linear: bool,
    pub status: SolutionStatus,
    pub objective_value: f64,
    pub columns: Columns,
    pub rows: Vec<Row>,
    #[serde(skip)]
    pub statistics: SolverStatistics,
}

fn at<T: Copy + Default>(values: &[T], index: usize) -> T {
    values.get(index).copied().unwrap_or_default()
}

impl Solution {
    /// Classify the final state of `session` against `model`.
    ///
    /// Continuous models report basis status and duals for every item;
    /// mixed-integer models report the variable type instead, and their row
    /// activities are recomputed from the reported column values.
    pub fn from_session(model: &Model, session: &SolverSession, status: SolutionStatus) -> Self {
        let is_linear = !model.is_mixed_integer();
        let sign = model.sense.sign();
        let infinite_bound = session.settings.infinite_bound;
        let basis = &session.basis;
        let values = session.reported_columns();

        let columns = model
            .variables
            .iter()
            .enumerate()
            .map(|(j, variable)| {
                let lower = normalize_bound(variable.lower_bound, infinite_bound);
                let upper = normalize_bound(variable.upper_bound, infinite_bound);
                let primal = at(values, j);
                Column {
                    index: j,
                    status: is_linear.then(|| {
                        BasisStatus::classify(lower, upper, primal, at(&basis.column_basic, j))
                    }),
                    lower,
                    upper,
                    primal,
                    dual: is_linear.then(|| sign * at(&basis.column_duals, j)),
                    kind: (!is_linear).then_some(variable.kind),
                    name: variable.name.clone(),
                }
            })
            .collect();

        let row_values = if is_linear {
            basis.row_values.clone()
        } else {
            model.row_activities(values)
        };

        let rows = model
            .constraints
            .iter()
            .enumerate()
            .map(|(i, constraint)| {
                let lower = normalize_bound(constraint.lower_bound, infinite_bound);
                let upper = normalize_bound(constraint.upper_bound, infinite_bound);
                let primal = at(&row_values, i);
                Row {
                    index: i,
                    status: is_linear.then(|| {
                        BasisStatus::classify(lower, upper, primal, at(&basis.row_basic, i))
                    }),
                    lower,
                    upper,
                    primal,
                    dual: is_linear.then(|| sign * at(&basis.row_duals, i)),
                }
            })
            .collect();

        Self {
            is_linear,
            status,
            objective_value: model.objective_value(values),
            columns: Columns(columns),
            rows,
            statistics: session.statistics.clone(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
