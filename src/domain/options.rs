// Solver options: a closed registry of recognised keys, their expected
// types, and the setting each one drives.
//
// Callers pass an `OptionMap`; every entry is checked against the
// registry before any numeric work starts. Unknown keys, wrong types and
// out-of-range values are rejected rather than ignored.

use super::session::SolverSession;
use super::solver_service::OptionError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// A caller-supplied option value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
}

impl OptionValue {
    fn type_name(&self) -> &'static str {
        match self {
            OptionValue::Bool(_) => "boolean",
            OptionValue::Int(_) => "integer",
            OptionValue::Double(_) => "double",
            OptionValue::String(_) => "string",
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(v) => write!(f, "{}", v),
            OptionValue::Int(v) => write!(f, "{}", v),
            OptionValue::Double(v) => write!(f, "{}", v),
            OptionValue::String(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Int(value.into())
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Double(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::String(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::String(value)
    }
}

/// Option name → value, applied in key order
pub type OptionMap = BTreeMap<String, OptionValue>;

/// Whether the presolve pass runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresolveMode {
    Off,
    #[default]
    Choose,
    On,
}

impl PresolveMode {
    pub fn enabled(self) -> bool {
        !matches!(self, PresolveMode::Off)
    }
}

/// Entering-variable selection rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pricing {
    /// Largest reduced cost
    #[default]
    Dantzig,
    /// Largest reduced cost relative to a devex reference weight
    Devex,
}

/// Typed solver configuration produced by applying an [`OptionMap`]
#[derive(Debug, Clone, PartialEq)]
pub struct SolverSettings {
    pub presolve: PresolveMode,
    pub use_implied_bounds: bool,
    pub scaling: bool,
    pub matrix_scale_exponent: i32,
    pub cost_scale_exponent: i32,
    pub pricing: Pricing,
    pub primal_tolerance: f64,
    pub dual_tolerance: f64,
    pub integrality_tolerance: f64,
    pub mip_rel_gap: f64,
    pub mip_abs_gap: f64,
    pub max_nodes: u64,
    pub iteration_limit: u64,
    /// Wall-clock limit in seconds. `None` means no limit.
    pub time_limit: Option<f64>,
    pub infinite_bound: f64,
    pub output_flag: bool,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            presolve: PresolveMode::Choose,
            use_implied_bounds: false,
            scaling: true,
            matrix_scale_exponent: 20,
            cost_scale_exponent: 0,
            pricing: Pricing::Dantzig,
            primal_tolerance: 1e-9,
            dual_tolerance: 1e-9,
            integrality_tolerance: 1e-6,
            mip_rel_gap: 0.0,
            mip_abs_gap: 1e-6,
            max_nodes: u64::MAX,
            iteration_limit: u64::MAX,
            time_limit: None,
            infinite_bound: 1e20,
            output_flag: true,
        }
    }
}

impl SolverSettings {
    pub fn with_presolve(mut self, mode: PresolveMode) -> Self {
        self.presolve = mode;
        self
    }

    pub fn with_pricing(mut self, pricing: Pricing) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_scaling(mut self, enabled: bool) -> Self {
        self.scaling = enabled;
        self
    }

    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = Some(seconds);
        self
    }

    pub fn with_max_nodes(mut self, nodes: u64) -> Self {
        self.max_nodes = nodes;
        self
    }

    pub fn with_iteration_limit(mut self, iterations: u64) -> Self {
        self.iteration_limit = iterations;
        self
    }
}

/// Map magnitudes at or beyond `infinite_bound` to the matching infinity
pub fn normalize_bound(value: f64, infinite_bound: f64) -> f64 {
    if value >= infinite_bound {
        f64::INFINITY
    } else if value <= -infinite_bound {
        f64::NEG_INFINITY
    } else {
        value
    }
}

/// Expected type of an option value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OptionKind {
    Bool,
    Int { min: i64, max: i64 },
    Double { min: f64, max: f64 },
    Choice(&'static [&'static str]),
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionKind::Bool => write!(f, "a boolean"),
            OptionKind::Int { .. } => write!(f, "an integer"),
            OptionKind::Double { .. } => write!(f, "a number"),
            OptionKind::Choice(allowed) => write!(f, "one of {:?}", allowed),
        }
    }
}

/// Every option the engine recognises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKey {
    Presolve,
    UseImpliedBoundsFromPresolve,
    SimplexScaleStrategy,
    AllowedMatrixScaleFactor,
    AllowedCostScaleFactor,
    SimplexPricing,
    PrimalFeasibilityTolerance,
    DualFeasibilityTolerance,
    MipFeasibilityTolerance,
    MipRelGap,
    MipAbsGap,
    MipMaxNodes,
    SimplexIterationLimit,
    TimeLimit,
    InfiniteBound,
    OutputFlag,
}

/// Registry entry: name, expected type, and the setting it drives
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub key: OptionKey,
    pub name: &'static str,
    pub kind: OptionKind,
    pub description: &'static str,
}

const PRESOLVE_CHOICES: &[&str] = &["off", "choose", "on"];
const PRICING_CHOICES: &[&str] = &["dantzig", "devex"];

const OPTION_SPECS: &[OptionSpec] = &[
    OptionSpec {
        key: OptionKey::Presolve,
        name: "presolve",
        kind: OptionKind::Choice(PRESOLVE_CHOICES),
        description: "Run the presolve pass before the simplex",
    },
    OptionSpec {
        key: OptionKey::UseImpliedBoundsFromPresolve,
        name: "use_implied_bounds_from_presolve",
        kind: OptionKind::Bool,
        description: "Tighten column bounds implied by singleton rows during presolve",
    },
    OptionSpec {
        key: OptionKey::SimplexScaleStrategy,
        name: "simplex_scale_strategy",
        kind: OptionKind::Int { min: 0, max: 1 },
        description: "0: no scaling, 1: power-of-two geometric scaling",
    },
    OptionSpec {
        key: OptionKey::AllowedMatrixScaleFactor,
        name: "allowed_matrix_scale_factor",
        kind: OptionKind::Int { min: 0, max: 30 },
        description: "Largest power-of-two exponent for row and column scale factors",
    },
    OptionSpec {
        key: OptionKey::AllowedCostScaleFactor,
        name: "allowed_cost_scale_factor",
        kind: OptionKind::Int { min: 0, max: 20 },
        description: "Largest power-of-two exponent for the cost scale factor",
    },
    OptionSpec {
        key: OptionKey::SimplexPricing,
        name: "simplex_pricing",
        kind: OptionKind::Choice(PRICING_CHOICES),
        description: "Entering-variable pricing rule",
    },
    OptionSpec {
        key: OptionKey::PrimalFeasibilityTolerance,
        name: "primal_feasibility_tolerance",
        kind: OptionKind::Double { min: 1e-12, max: 1e-3 },
        description: "Bound violation tolerated on basic variables",
    },
    OptionSpec {
        key: OptionKey::DualFeasibilityTolerance,
        name: "dual_feasibility_tolerance",
        kind: OptionKind::Double { min: 1e-12, max: 1e-3 },
        description: "Reduced cost magnitude below which a column is not attractive",
    },
    OptionSpec {
        key: OptionKey::MipFeasibilityTolerance,
        name: "mip_feasibility_tolerance",
        kind: OptionKind::Double { min: 1e-12, max: 1e-3 },
        description: "Distance to the nearest integer accepted as integral",
    },
    OptionSpec {
        key: OptionKey::MipRelGap,
        name: "mip_rel_gap",
        kind: OptionKind::Double { min: 0.0, max: f64::INFINITY },
        description: "Relative gap under which a node cannot improve the incumbent",
    },
    OptionSpec {
        key: OptionKey::MipAbsGap,
        name: "mip_abs_gap",
        kind: OptionKind::Double { min: 0.0, max: f64::INFINITY },
        description: "Absolute gap under which a node cannot improve the incumbent",
    },
    OptionSpec {
        key: OptionKey::MipMaxNodes,
        name: "mip_max_nodes",
        kind: OptionKind::Int { min: 0, max: i64::MAX },
        description: "Branch-and-bound node limit",
    },
    OptionSpec {
        key: OptionKey::SimplexIterationLimit,
        name: "simplex_iteration_limit",
        kind: OptionKind::Int { min: 0, max: i64::MAX },
        description: "Simplex iteration limit per solve",
    },
    OptionSpec {
        key: OptionKey::TimeLimit,
        name: "time_limit",
        kind: OptionKind::Double { min: 0.0, max: f64::INFINITY },
        description: "Wall-clock limit in seconds",
    },
    OptionSpec {
        key: OptionKey::InfiniteBound,
        name: "infinite_bound",
        kind: OptionKind::Double { min: 1e15, max: f64::INFINITY },
        description: "Bounds at or beyond this magnitude are treated as infinite",
    },
    OptionSpec {
        key: OptionKey::OutputFlag,
        name: "output_flag",
        kind: OptionKind::Bool,
        description: "Emit the solve summary at info level",
    },
];

/// Closed registry of recognised options, keyed by name
#[derive(Debug, Clone)]
pub struct OptionRegistry {
    specs: HashMap<&'static str, OptionSpec>,
}

impl Default for OptionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl OptionRegistry {
    /// Registry holding every option the engine understands
    pub fn standard() -> Self {
        let specs = OPTION_SPECS.iter().map(|spec| (spec.name, *spec)).collect();
        Self { specs }
    }

    pub fn get(&self, name: &str) -> Option<&OptionSpec> {
        self.specs.get(name)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Registered option names in alphabetical order
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.specs.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Check one entry and return the value in its canonical type
    pub fn validate(
        &self,
        name: &str,
        value: &OptionValue,
    ) -> Result<(OptionKey, OptionValue), OptionError> {
        let spec = self
            .get(name)
            .ok_or_else(|| OptionError::UnknownOption(name.to_string()))?;

        let wrong_type = || OptionError::WrongType {
            name: name.to_string(),
            expected: spec.kind.to_string(),
            found: value.type_name().to_string(),
        };

        let canonical = match (spec.kind, value) {
            (OptionKind::Bool, OptionValue::Bool(v)) => OptionValue::Bool(*v),
            (OptionKind::Int { min, max }, OptionValue::Int(v)) => {
                if *v < min || *v > max {
                    return Err(OptionError::OutOfRange {
                        name: name.to_string(),
                        value: v.to_string(),
                        min: min.to_string(),
                        max: max.to_string(),
                    });
                }
                OptionValue::Int(*v)
            }
            (OptionKind::Double { min, max }, OptionValue::Int(_) | OptionValue::Double(_)) => {
                let v = match value {
                    OptionValue::Int(i) => *i as f64,
                    OptionValue::Double(d) => *d,
                    _ => return Err(wrong_type()),
                };
                if v.is_nan() || v < min || v > max {
                    return Err(OptionError::OutOfRange {
                        name: name.to_string(),
                        value: v.to_string(),
                        min: min.to_string(),
                        max: max.to_string(),
                    });
                }
                OptionValue::Double(v)
            }
            (OptionKind::Choice(allowed), OptionValue::String(s)) => {
                if !allowed.contains(&s.as_str()) {
                    return Err(OptionError::InvalidChoice {
                        name: name.to_string(),
                        value: s.clone(),
                        allowed: allowed.iter().map(|a| a.to_string()).collect(),
                    });
                }
                OptionValue::String(s.clone())
            }
            _ => return Err(wrong_type()),
        };

        Ok((spec.key, canonical))
    }
}

/// Validate every entry of `options`, then write them into the session.
///
/// Nothing is applied unless the whole map is valid.
pub fn apply_options(
    session: &mut SolverSession,
    registry: &OptionRegistry,
    options: &OptionMap,
) -> Result<(), OptionError> {
    let validated = options
        .iter()
        .map(|(name, value)| registry.validate(name, value))
        .collect::<Result<Vec<_>, _>>()?;

    for (key, value) in &validated {
        apply_setting(&mut session.settings, *key, value);
    }
    Ok(())
}

fn apply_setting(settings: &mut SolverSettings, key: OptionKey, value: &OptionValue) {
    match (key, value) {
        (OptionKey::Presolve, OptionValue::String(s)) => {
            settings.presolve = match s.as_str() {
                "off" => PresolveMode::Off,
                "on" => PresolveMode::On,
                _ => PresolveMode::Choose,
            }
        }
        (OptionKey::UseImpliedBoundsFromPresolve, OptionValue::Bool(b)) => {
            settings.use_implied_bounds = *b
        }
        (OptionKey::SimplexScaleStrategy, OptionValue::Int(i)) => settings.scaling = *i != 0,
        (OptionKey::AllowedMatrixScaleFactor, OptionValue::Int(i)) => {
            settings.matrix_scale_exponent = *i as i32
        }
        (OptionKey::AllowedCostScaleFactor, OptionValue::Int(i)) => {
            settings.cost_scale_exponent = *i as i32
        }
        (OptionKey::SimplexPricing, OptionValue::String(s)) => {
            settings.pricing = match s.as_str() {
                "devex" => Pricing::Devex,
                _ => Pricing::Dantzig,
            }
        }
        (OptionKey::PrimalFeasibilityTolerance, OptionValue::Double(d)) => {
            settings.primal_tolerance = *d
        }
        (OptionKey::DualFeasibilityTolerance, OptionValue::Double(d)) => {
            settings.dual_tolerance = *d
        }
        (OptionKey::MipFeasibilityTolerance, OptionValue::Double(d)) => {
            settings.integrality_tolerance = *d
        }
        (OptionKey::MipRelGap, OptionValue::Double(d)) => settings.mip_rel_gap = *d,
        (OptionKey::MipAbsGap, OptionValue::Double(d)) => settings.mip_abs_gap = *d,
        (OptionKey::MipMaxNodes, OptionValue::Int(i)) => settings.max_nodes = *i as u64,
        (OptionKey::SimplexIterationLimit, OptionValue::Int(i)) => {
            settings.iteration_limit = *i as u64
        }
        (OptionKey::TimeLimit, OptionValue::Double(d)) => {
            settings.time_limit = if d.is_finite() { Some(*d) } else { None }
        }
        (OptionKey::InfiniteBound, OptionValue::Double(d)) => settings.infinite_bound = *d,
        (OptionKey::OutputFlag, OptionValue::Bool(b)) => settings.output_flag = *b,
        // validate() returns the canonical type for each key
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(entries: &[(&str, OptionValue)]) -> OptionMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_registry_lists_every_key() {
        let registry = OptionRegistry::standard();
        assert_eq!(registry.len(), OPTION_SPECS.len());
        assert!(registry.names().contains(&"presolve"));
        assert!(registry.get("allowed_cost_scale_factor").is_some());
    }

    #[test]
    fn test_apply_valid_options() {
        let registry = OptionRegistry::standard();
        let mut session = SolverSession::default();
        let map = options(&[
            ("allowed_cost_scale_factor", 2.into()),
            ("use_implied_bounds_from_presolve", true.into()),
            ("presolve", "off".into()),
            ("time_limit", 5.into()),
            ("simplex_pricing", "devex".into()),
        ]);
        apply_options(&mut session, &registry, &map).unwrap();

        let settings = &session.settings;
        assert_eq!(settings.cost_scale_exponent, 2);
        assert!(settings.use_implied_bounds);
        assert_eq!(settings.presolve, PresolveMode::Off);
        assert_eq!(settings.time_limit, Some(5.0));
        assert_eq!(settings.pricing, Pricing::Devex);
    }

    #[test]
    fn test_unknown_option_rejected() {
        let registry = OptionRegistry::standard();
        let mut session = SolverSession::default();
        let err = apply_options(&mut session, &registry, &options(&[("turbo", true.into())]))
            .unwrap_err();
        assert_eq!(err, OptionError::UnknownOption("turbo".to_string()));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let registry = OptionRegistry::standard();
        let err = registry.validate("presolve", &OptionValue::Bool(false)).unwrap_err();
        assert!(matches!(err, OptionError::WrongType { .. }));
        let err = registry
            .validate("allowed_cost_scale_factor", &OptionValue::Double(2.5))
            .unwrap_err();
        assert!(matches!(err, OptionError::WrongType { .. }));
        assert!(err.to_string().starts_with("Invalid option"));
    }

    #[test]
    fn test_range_and_choice_checks() {
        let registry = OptionRegistry::standard();
        assert!(matches!(
            registry.validate("allowed_matrix_scale_factor", &OptionValue::Int(31)),
            Err(OptionError::OutOfRange { .. })
        ));
        assert!(matches!(
            registry.validate("presolve", &OptionValue::String("sometimes".into())),
            Err(OptionError::InvalidChoice { .. })
        ));
    }

    #[test]
    fn test_invalid_map_applies_nothing() {
        let registry = OptionRegistry::standard();
        let mut session = SolverSession::default();
        let map = options(&[("presolve", "off".into()), ("zzz", 1.into())]);
        assert!(apply_options(&mut session, &registry, &map).is_err());
        assert_eq!(session.settings, SolverSettings::default());
    }

    #[test]
    fn test_option_value_from_json() {
        let text = r#"{"presolve": "off", "allowed_cost_scale_factor": 2,
            "mip_rel_gap": 0.5, "output_flag": false}"#;
        let map: OptionMap = serde_json::from_str(text).unwrap();
        assert_eq!(map["presolve"], OptionValue::String("off".into()));
        assert_eq!(map["allowed_cost_scale_factor"], OptionValue::Int(2));
        assert_eq!(map["mip_rel_gap"], OptionValue::Double(0.5));
        assert_eq!(map["output_flag"], OptionValue::Bool(false));
    }
}
