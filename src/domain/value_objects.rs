// Domain value objects: closed symbol sets shared by the model, the engine and the report

use serde::Serialize;
use std::fmt;

/// Kind of decision variable in the optimization problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VariableKind {
    /// Continuous real number (x ∈ ℝ)
    Continuous,
    /// Integer number (x ∈ ℤ)
    Integer,
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableKind::Continuous => write!(f, "Continuous"),
            VariableKind::Integer => write!(f, "Integer"),
        }
    }
}

/// Direction of optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Sense {
    /// Minimize the objective function
    Minimize,
    /// Maximize the objective function
    Maximize,
}

impl Sense {
    /// Multiplier taking user costs to the internal minimisation form.
    ///
    /// The same multiplier maps internal duals back to the user's sense, so
    /// an internal `0.0` becomes `-0.0` for a maximisation.
    pub fn sign(self) -> f64 {
        match self {
            Sense::Minimize => 1.0,
            Sense::Maximize => -1.0,
        }
    }
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sense::Minimize => write!(f, "Minimize"),
            Sense::Maximize => write!(f, "Maximize"),
        }
    }
}

/// Status of the optimization outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SolutionStatus {
    /// Found optimal solution
    Optimal,
    /// Problem has no feasible solution
    Infeasible,
    /// Objective can be improved infinitely
    Unbounded,
    /// Time limit reached
    #[serde(rename = "Time limit reached")]
    TimeLimit,
    /// Iteration limit reached
    #[serde(rename = "Iteration limit reached")]
    IterationLimit,
    /// Node limit reached (MIP)
    #[serde(rename = "Node limit reached")]
    NodeLimit,
}

impl SolutionStatus {
    /// True when the search stopped on a work limit rather than a proof.
    pub fn is_limit(self) -> bool {
        matches!(
            self,
            SolutionStatus::TimeLimit | SolutionStatus::IterationLimit | SolutionStatus::NodeLimit
        )
    }
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionStatus::Optimal => write!(f, "Optimal"),
            SolutionStatus::Infeasible => write!(f, "Infeasible"),
            SolutionStatus::Unbounded => write!(f, "Unbounded"),
            SolutionStatus::TimeLimit => write!(f, "Time limit reached"),
            SolutionStatus::IterationLimit => write!(f, "Iteration limit reached"),
            SolutionStatus::NodeLimit => write!(f, "Node limit reached"),
        }
    }
}

/// Basis classification of a column or row in the final report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BasisStatus {
    /// Basic: strictly between bounds
    BS,
    /// Nonbasic at lower bound
    LB,
    /// Nonbasic at upper bound
    UB,
    /// Fixed: lower bound equals upper bound
    FX,
}

impl BasisStatus {
    /// Classify an item from its bounds, its value and whether the final
    /// basis holds it.
    ///
    /// Equal bounds always give `FX`. A value exactly on one bound gives
    /// `LB`/`UB` even for a basic item. A nonbasic item that sits on neither
    /// bound (a free column parked at zero) gives `BS`.
    pub fn classify(lower: f64, upper: f64, value: f64, basic: bool) -> Self {
        if lower == upper {
            return BasisStatus::FX;
        }
        if value == lower {
            return BasisStatus::LB;
        }
        if value == upper {
            return BasisStatus::UB;
        }
        if !basic {
            // a nonbasic value lies on a bound up to unscaling noise
            let to_lower = (value - lower).abs();
            let to_upper = (upper - value).abs();
            if to_lower.is_finite() && (!to_upper.is_finite() || to_lower <= to_upper) {
                return BasisStatus::LB;
            }
            if to_upper.is_finite() {
                return BasisStatus::UB;
            }
        }
        BasisStatus::BS
    }
}

impl fmt::Display for BasisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BasisStatus::BS => write!(f, "BS"),
            BasisStatus::LB => write!(f, "LB"),
            BasisStatus::UB => write!(f, "UB"),
            BasisStatus::FX => write!(f, "FX"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sense_sign_keeps_negative_zero() {
        let dual = Sense::Maximize.sign() * 0.0;
        assert!(dual == 0.0 && dual.is_sign_negative());
        let dual = Sense::Minimize.sign() * 0.0;
        assert!(dual.is_sign_positive());
    }

    #[test]
    fn test_classify_fixed_wins() {
        assert_eq!(BasisStatus::classify(2.0, 2.0, 2.0, true), BasisStatus::FX);
        assert_eq!(BasisStatus::classify(0.0, 0.0, 0.0, false), BasisStatus::FX);
    }

    #[test]
    fn test_classify_basic_at_bound_is_not_bs() {
        assert_eq!(BasisStatus::classify(0.0, 10.0, 0.0, true), BasisStatus::LB);
        assert_eq!(BasisStatus::classify(0.0, 10.0, 10.0, true), BasisStatus::UB);
        assert_eq!(BasisStatus::classify(0.0, 10.0, 5.0, true), BasisStatus::BS);
    }

    #[test]
    fn test_classify_nonbasic() {
        assert_eq!(
            BasisStatus::classify(f64::NEG_INFINITY, 20.0, 20.0, false),
            BasisStatus::UB
        );
        assert_eq!(
            BasisStatus::classify(f64::NEG_INFINITY, f64::INFINITY, 0.0, false),
            BasisStatus::BS
        );
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SolutionStatus::Optimal.to_string(), "Optimal");
        assert_eq!(SolutionStatus::TimeLimit.to_string(), "Time limit reached");
        assert!(SolutionStatus::NodeLimit.is_limit());
        assert!(!SolutionStatus::Infeasible.is_limit());
    }
}
