//! Issues and mutations: the output units of validation and reconciliation
//!
//! Every rule code lives in one table ([`IssueCode::rule`]). Adding a rule
//! means adding a variant and a row, never a branch in a checker.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ============================================================================
// SEVERITY
// ============================================================================

/// Severity of an issue. Only errors block a graph from simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// RULE TABLE
// ============================================================================

/// Which pass emits a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueOrigin {
    /// Tier 1: cardinality, limits, references
    Structural,
    /// Tier 2: edge types, sources, sinks, cycles
    Topology,
    /// Tier 3
    Reachability,
    /// Tier 4
    FactorData,
    /// Tier 5
    Semantic,
    /// Tier 6
    Numeric,
    /// Non-blocking advisories
    Advisory,
    PostNormalisation,
    Reconciliation,
}

/// Static description of a rule code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleEntry {
    pub code: &'static str,
    pub severity: Severity,
    pub origin: IssueOrigin,
}

const fn rule(code: &'static str, severity: Severity, origin: IssueOrigin) -> RuleEntry {
    RuleEntry {
        code,
        severity,
        origin,
    }
}

/// Every code the validator, post-normalisation pass, and reconciliation pass emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    // Tier 1
    MissingGoal,
    MissingDecision,
    InsufficientOptions,
    MissingBridge,
    NodeLimitExceeded,
    EdgeLimitExceeded,
    InvalidEdgeRef,
    DuplicateNodeId,
    // Tier 2
    GoalHasOutgoing,
    DecisionHasIncoming,
    InvalidEdgeType,
    CycleDetected,
    // Tier 3
    UnreachableFromDecision,
    NoPathToGoal,
    // Tier 4
    ControllableMissingData,
    ObservableMissingData,
    ObservableExtraData,
    ExternalHasData,
    CategoryMismatch,
    // Tier 5
    NoEffectPath,
    OptionsIdentical,
    InvalidInterventionRef,
    GoalNumberAsFactor,
    StructuralEdgeNotCanonicalError,
    // Tier 6
    NanValue,
    // Advisories
    StrengthOutOfRange,
    ProbabilityOutOfRange,
    OutcomeNegativePolarity,
    RiskPositivePolarity,
    LowEdgeConfidence,
    EmptyUncertaintyDrivers,
    StructuralEdgeNotCanonical,
    LowStdNonStructural,
    // Post-normalisation
    SignMismatch,
    // Reconciliation
    CategoryOverride,
    EnumValueCorrected,
    ConstraintRemapped,
    ConstraintDropped,
    SignCorrected,
    ControllableDataFilled,
}

impl IssueCode {
    /// The rule table.
    pub const fn rule(self) -> RuleEntry {
        use IssueOrigin::*;
        use Severity::*;
        match self {
            IssueCode::MissingGoal => rule("MISSING_GOAL", Error, Structural),
            IssueCode::MissingDecision => rule("MISSING_DECISION", Error, Structural),
            IssueCode::InsufficientOptions => rule("INSUFFICIENT_OPTIONS", Error, Structural),
            IssueCode::MissingBridge => rule("MISSING_BRIDGE", Error, Structural),
            IssueCode::NodeLimitExceeded => rule("NODE_LIMIT_EXCEEDED", Error, Structural),
            IssueCode::EdgeLimitExceeded => rule("EDGE_LIMIT_EXCEEDED", Error, Structural),
            IssueCode::InvalidEdgeRef => rule("INVALID_EDGE_REF", Error, Structural),
            IssueCode::DuplicateNodeId => rule("DUPLICATE_NODE_ID", Error, Structural),
            IssueCode::GoalHasOutgoing => rule("GOAL_HAS_OUTGOING", Error, Topology),
            IssueCode::DecisionHasIncoming => rule("DECISION_HAS_INCOMING", Error, Topology),
            IssueCode::InvalidEdgeType => rule("INVALID_EDGE_TYPE", Error, Topology),
            IssueCode::CycleDetected => rule("CYCLE_DETECTED", Error, Topology),
            IssueCode::UnreachableFromDecision => {
                rule("UNREACHABLE_FROM_DECISION", Error, Reachability)
            }
            IssueCode::NoPathToGoal => rule("NO_PATH_TO_GOAL", Error, Reachability),
            IssueCode::ControllableMissingData => {
                rule("CONTROLLABLE_MISSING_DATA", Error, FactorData)
            }
            IssueCode::ObservableMissingData => rule("OBSERVABLE_MISSING_DATA", Error, FactorData),
            IssueCode::ObservableExtraData => rule("OBSERVABLE_EXTRA_DATA", Error, FactorData),
            IssueCode::ExternalHasData => rule("EXTERNAL_HAS_DATA", Error, FactorData),
            IssueCode::CategoryMismatch => rule("CATEGORY_MISMATCH", Error, FactorData),
            IssueCode::NoEffectPath => rule("NO_EFFECT_PATH", Error, Semantic),
            IssueCode::OptionsIdentical => rule("OPTIONS_IDENTICAL", Error, Semantic),
            IssueCode::InvalidInterventionRef => rule("INVALID_INTERVENTION_REF", Error, Semantic),
            IssueCode::GoalNumberAsFactor => rule("GOAL_NUMBER_AS_FACTOR", Error, Semantic),
            IssueCode::StructuralEdgeNotCanonicalError => {
                rule("STRUCTURAL_EDGE_NOT_CANONICAL_ERROR", Error, Semantic)
            }
            IssueCode::NanValue => rule("NAN_VALUE", Error, Numeric),
            IssueCode::StrengthOutOfRange => rule("STRENGTH_OUT_OF_RANGE", Warn, Advisory),
            IssueCode::ProbabilityOutOfRange => rule("PROBABILITY_OUT_OF_RANGE", Warn, Advisory),
            IssueCode::OutcomeNegativePolarity => {
                rule("OUTCOME_NEGATIVE_POLARITY", Warn, Advisory)
            }
            IssueCode::RiskPositivePolarity => rule("RISK_POSITIVE_POLARITY", Warn, Advisory),
            IssueCode::LowEdgeConfidence => rule("LOW_EDGE_CONFIDENCE", Warn, Advisory),
            IssueCode::EmptyUncertaintyDrivers => {
                rule("EMPTY_UNCERTAINTY_DRIVERS", Warn, Advisory)
            }
            IssueCode::StructuralEdgeNotCanonical => {
                rule("STRUCTURAL_EDGE_NOT_CANONICAL", Warn, Advisory)
            }
            IssueCode::LowStdNonStructural => rule("LOW_STD_NON_STRUCTURAL", Warn, Advisory),
            IssueCode::SignMismatch => rule("SIGN_MISMATCH", Error, PostNormalisation),
            IssueCode::CategoryOverride => rule("CATEGORY_OVERRIDE", Info, Reconciliation),
            IssueCode::EnumValueCorrected => rule("ENUM_VALUE_CORRECTED", Warn, Reconciliation),
            IssueCode::ConstraintRemapped => rule("CONSTRAINT_REMAPPED", Info, Reconciliation),
            IssueCode::ConstraintDropped => rule("CONSTRAINT_DROPPED", Warn, Reconciliation),
            IssueCode::SignCorrected => rule("SIGN_CORRECTED", Warn, Reconciliation),
            IssueCode::ControllableDataFilled => {
                rule("CONTROLLABLE_DATA_FILLED", Info, Reconciliation)
            }
        }
    }

    pub const fn as_str(self) -> &'static str {
        self.rule().code
    }

    pub const fn severity(self) -> Severity {
        self.rule().severity
    }

    pub const fn origin(self) -> IssueOrigin {
        self.rule().origin
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// ISSUE
// ============================================================================

/// A single finding, located by a path into the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub code: IssueCode,
    /// Location such as `edges[3].strength_mean` or `nodes[2].data.value`
    pub path: String,
    pub message: String,
    /// Ids and values a repair strategy needs, always a JSON object
    pub context: Value,
    pub severity: Severity,
}

impl Issue {
    /// Create an issue with the code's table severity and an empty context.
    pub fn new(code: IssueCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            path: path.into(),
            message: message.into(),
            context: Value::Object(serde_json::Map::new()),
            severity: code.severity(),
        }
    }

    /// Attach context. Non-object values are wrapped under `"value"`.
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = match context {
            Value::Object(_) => context,
            other => serde_json::json!({ "value": other }),
        };
        self
    }

    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} at {}: {}", self.severity, self.code, self.path, self.message)
    }
}

// ============================================================================
// MUTATION
// ============================================================================

/// Reconciliation rules, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileRule {
    CategoryOverride,
    EnumValidation,
    ConstraintTargetRemap,
    SignReconciliation,
    ControllableDataCompletion,
}

impl ReconcileRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileRule::CategoryOverride => "category_override",
            ReconcileRule::EnumValidation => "enum_validation",
            ReconcileRule::ConstraintTargetRemap => "constraint_target_remap",
            ReconcileRule::SignReconciliation => "sign_reconciliation",
            ReconcileRule::ControllableDataCompletion => "controllable_data_completion",
        }
    }
}

impl fmt::Display for ReconcileRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a mutation changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MutationTarget {
    Node { node_id: String },
    Edge { index: usize, from: String, to: String },
    Constraint { constraint_id: String },
}

impl fmt::Display for MutationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationTarget::Node { node_id } => write!(f, "node {}", node_id),
            MutationTarget::Edge { index, from, to } => {
                write!(f, "edge[{}] {}->{}", index, from, to)
            }
            MutationTarget::Constraint { constraint_id } => {
                write!(f, "constraint {}", constraint_id)
            }
        }
    }
}

/// Audit record of one in-place change made by reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    pub rule: ReconcileRule,
    pub code: IssueCode,
    pub target: MutationTarget,
    /// Field changed, relative to the target (e.g. `category`, `data.factor_type`)
    pub field: String,
    pub before: Value,
    pub after: Value,
    pub severity: Severity,
}

impl Mutation {
    pub fn new(
        rule: ReconcileRule,
        code: IssueCode,
        target: MutationTarget,
        field: impl Into<String>,
        before: Value,
        after: Value,
    ) -> Self {
        Self {
            rule,
            code,
            target,
            field: field.into(),
            before,
            after,
            severity: code.severity(),
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}.{}: {} -> {}",
            self.severity, self.code, self.target, self.field, self.before, self.after
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_code_matches_table() {
        for code in [
            IssueCode::MissingGoal,
            IssueCode::StructuralEdgeNotCanonicalError,
            IssueCode::NanValue,
            IssueCode::LowStdNonStructural,
            IssueCode::ControllableDataFilled,
        ] {
            let wire = serde_json::to_value(code).unwrap();
            assert_eq!(wire, json!(code.as_str()));
        }
    }

    #[test]
    fn test_structural_canonical_severity_split() {
        assert_eq!(IssueCode::StructuralEdgeNotCanonical.severity(), Severity::Warn);
        assert_eq!(
            IssueCode::StructuralEdgeNotCanonicalError.severity(),
            Severity::Error
        );
    }

    #[test]
    fn test_issue_severity_from_code() {
        let issue = Issue::new(IssueCode::RiskPositivePolarity, "edges[0]", "positive risk");
        assert_eq!(issue.severity, Severity::Warn);
        assert!(!issue.is_blocking());
        assert_eq!(issue.context, json!({}));
    }

    #[test]
    fn test_with_context_wraps_scalars() {
        let issue = Issue::new(IssueCode::NanValue, "edges[0].strength_mean", "NaN")
            .with_context(json!(3));
        assert_eq!(issue.context, json!({"value": 3}));
    }

    #[test]
    fn test_mutation_serializes_target() {
        let mutation = Mutation::new(
            ReconcileRule::SignReconciliation,
            IssueCode::SignCorrected,
            MutationTarget::Edge {
                index: 2,
                from: "fac_a".into(),
                to: "out_b".into(),
            },
            "effect_direction",
            json!("positive"),
            json!("negative"),
        );
        let wire = serde_json::to_value(&mutation).unwrap();
        assert_eq!(wire["target"]["type"], json!("edge"));
        assert_eq!(wire["rule"], json!("sign_reconciliation"));
        assert_eq!(wire["severity"], json!("warn"));
    }
}
