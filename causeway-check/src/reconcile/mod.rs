//! Structural Truth Reconciliation
//!
//! Five rules run in a fixed order, each mutating the graph in place and
//! logging one [`Mutation`] per changed field:
//!
//! 1. category override
//! 2. enum validation
//! 3. constraint target remap
//! 4. sign reconciliation
//! 5. controllable data completion (behind `fill_controllable_data`)
//!
//! Running the pass over its own output yields no mutations. Categories are
//! inferred once up front; no rule touches edges' endpoints or factor values,
//! so the inference cannot drift mid-pass.

mod category;
mod constraints;
mod enums;
mod sign;

pub use constraints::{normalise_label, split_prefix};

use causeway_core::{
    infer_all, FactorType, Graph, GraphIndex, IssueCode, Mutation, ReconcileRule,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `factor_type` written into controllable factors that lack one.
pub const DEFAULT_FACTOR_TYPE: FactorType = FactorType::Other;
/// Sole uncertainty driver written into controllable factors that lack one.
pub const DEFAULT_UNCERTAINTY_DRIVER: &str = "Estimation uncertainty";

// ============================================================================
// OPTIONS AND OUTCOME
// ============================================================================

/// A goal constraint supplied alongside a graph, pinned to one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalConstraint {
    #[serde(alias = "constraintId")]
    pub constraint_id: String,
    #[serde(alias = "nodeId")]
    pub node_id: String,
    /// Comparison operator, e.g. `>=`
    pub operator: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl GoalConstraint {
    pub fn new(
        constraint_id: impl Into<String>,
        node_id: impl Into<String>,
        operator: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            constraint_id: constraint_id.into(),
            node_id: node_id.into(),
            operator: operator.into(),
            value,
            label: None,
        }
    }
}

/// Reconciliation switches and inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOptions {
    /// Run rule 5 (default: true)
    pub fill_controllable_data: bool,
    /// Constraints for rule 3; rule 3 is skipped when `None`
    pub goal_constraints: Option<Vec<GoalConstraint>>,
    /// Label overrides consulted by rule 3's label stage
    pub node_labels: BTreeMap<String, String>,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            fill_controllable_data: true,
            goal_constraints: None,
            node_labels: BTreeMap::new(),
        }
    }
}

impl ReconcileOptions {
    pub fn with_fill_controllable_data(mut self, fill: bool) -> Self {
        self.fill_controllable_data = fill;
        self
    }

    pub fn with_goal_constraints(mut self, constraints: Vec<GoalConstraint>) -> Self {
        self.goal_constraints = Some(constraints);
        self
    }

    pub fn with_node_labels<I, K, V>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.node_labels = labels
            .into_iter()
            .map(|(id, label)| (id.into(), label.into()))
            .collect();
        self
    }
}

/// What a reconciliation call changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    pub mutations: Vec<Mutation>,
    /// Constraints after remapping; `None` when none were supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_constraints: Option<Vec<GoalConstraint>>,
}

impl ReconcileOutcome {
    pub fn is_noop(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn mutations_for(&self, rule: ReconcileRule) -> Vec<&Mutation> {
        self.mutations.iter().filter(|m| m.rule == rule).collect()
    }

    pub fn mutations_with_code(&self, code: IssueCode) -> Vec<&Mutation> {
        self.mutations.iter().filter(|m| m.code == code).collect()
    }
}

// ============================================================================
// ENTRYPOINTS
// ============================================================================

/// Reconcile `graph` in place and return the mutation log.
///
/// Remapped constraints are written back into `options.goal_constraints`
/// (dropped ones removed), so calling again with the same graph and the same
/// options mutates nothing.
pub fn reconcile_structural_truth(
    graph: &mut Graph,
    options: &mut ReconcileOptions,
) -> ReconcileOutcome {
    let before = graph.fingerprint();
    let categories = infer_all(&GraphIndex::build(graph));
    let mut mutations = Vec::new();

    category::override_categories(graph, &categories, &mut mutations);
    enums::coerce_enum_values(graph, &mut mutations);
    let goal_constraints = options.goal_constraints.as_deref().map(|supplied| {
        constraints::remap_constraints(graph, supplied, &options.node_labels, &mut mutations)
    });
    options.goal_constraints.clone_from(&goal_constraints);
    sign::reconcile_signs(graph, &mut mutations);
    if options.fill_controllable_data {
        category::complete_controllable_data(graph, &categories, &mut mutations);
    }

    for mutation in &mutations {
        tracing::debug!(
            rule = %mutation.rule,
            code = %mutation.code,
            target = %mutation.target,
            field = %mutation.field,
            before = %mutation.before,
            after = %mutation.after,
            "graph mutated"
        );
    }
    tracing::info!(
        mutations = mutations.len(),
        before = %before,
        after = %graph.fingerprint(),
        "structural truth reconciled"
    );

    ReconcileOutcome {
        mutations,
        goal_constraints,
    }
}

/// Reconcile a copy, leaving `graph` and `options` untouched.
///
/// Remapped constraints are only reported in the outcome.
pub fn reconcile_structural_truth_cloned(
    graph: &Graph,
    options: &ReconcileOptions,
) -> (Graph, ReconcileOutcome) {
    let mut reconciled = graph.clone();
    let outcome = reconcile_structural_truth(&mut reconciled, &mut options.clone());
    (reconciled, outcome)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate_graph;
    use causeway_core::{
        Edge, EffectDirection, ExtractionType, FactorCategory, FactorData, Lenient, MutationTarget,
        Node, NodeBody, Severity,
    };
    use causeway_test_utils::{minimal_valid_graph, mislabelled_controllable_graph};
    use serde_json::json;

    fn factor<'a>(graph: &'a Graph, id: &str) -> &'a Node {
        graph
            .nodes
            .iter()
            .find(|n| n.id == id)
            .unwrap_or_else(|| panic!("no node {id}"))
    }

    #[test]
    fn test_valid_graph_is_untouched() {
        let mut graph = minimal_valid_graph();
        let outcome = reconcile_structural_truth(&mut graph, &mut ReconcileOptions::default());
        assert!(outcome.is_noop(), "unexpected: {:?}", outcome.mutations);
        assert_eq!(graph, minimal_valid_graph());
        assert!(outcome.goal_constraints.is_none());
    }

    #[test]
    fn test_mislabelled_factor_is_overridden_in_place() {
        let mut graph = mislabelled_controllable_graph();
        let outcome = reconcile_structural_truth(&mut graph, &mut ReconcileOptions::default());

        let overrides = outcome.mutations_with_code(IssueCode::CategoryOverride);
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides[0].field, "category");
        assert_eq!(overrides[0].before, json!("observable"));
        assert_eq!(overrides[0].after, json!("controllable"));
        assert_eq!(overrides[0].severity, Severity::Info);
        assert_eq!(
            factor(&graph, "fac_price").declared_category(),
            Some(FactorCategory::Controllable)
        );

        let report = validate_graph(&graph, None);
        assert!(!report.has_code(IssueCode::CategoryMismatch));
        assert!(report.valid, "unexpected errors: {:?}", report.errors);
    }

    #[test]
    fn test_override_backfills_each_field() {
        let mut graph = minimal_valid_graph();
        graph.nodes.push(Node::factor("fac_volume", "Volume"));
        graph.edges.push(Edge::structural("opt_a", "fac_volume"));

        let outcome = reconcile_structural_truth(&mut graph, &mut ReconcileOptions::default());
        let fields: Vec<&str> = outcome
            .mutations_with_code(IssueCode::CategoryOverride)
            .iter()
            .map(|m| m.field.as_str())
            .collect();
        assert_eq!(fields, vec!["category", "data.factor_type", "data.uncertainty_drivers"]);
        assert!(outcome
            .mutations_with_code(IssueCode::ControllableDataFilled)
            .is_empty());

        let data = factor(&graph, "fac_volume").factor_data().unwrap();
        assert_eq!(data.factor_type, Some(Lenient::Known(FactorType::Other)));
        assert_eq!(
            data.uncertainty_drivers,
            Some(vec![DEFAULT_UNCERTAINTY_DRIVER.to_string()])
        );
    }

    #[test]
    fn test_override_to_observable_strips_controllable_keys() {
        let mut graph = minimal_valid_graph();
        graph.nodes.push(
            Node::factor("fac_market", "Market size")
                .with_category(FactorCategory::Controllable)
                .with_factor_data(FactorData::controlled(
                    900.0,
                    ExtractionType::Explicit,
                    FactorType::Demand,
                    vec!["Survey".into()],
                )),
        );
        graph.edges.push(Edge::causal("fac_market", "out_revenue", 0.3, 0.1, 0.7));

        let outcome = reconcile_structural_truth(&mut graph, &mut ReconcileOptions::default());
        let fields: Vec<&str> = outcome.mutations.iter().map(|m| m.field.as_str()).collect();
        assert_eq!(fields, vec!["category", "data.factor_type", "data.uncertainty_drivers"]);
        assert_eq!(outcome.mutations[1].after, serde_json::Value::Null);

        let data = factor(&graph, "fac_market").factor_data().unwrap();
        assert!(data.factor_type.is_none());
        assert!(data.uncertainty_drivers.is_none());
        assert!(validate_graph(&graph, None).valid);
    }

    #[test]
    fn test_external_factor_keeps_its_data() {
        let mut graph = minimal_valid_graph();
        graph.nodes.push(
            Node::factor("fac_regulation", "Regulation").with_factor_data(FactorData {
                extraction_type: Some(Lenient::Known(ExtractionType::Inferred)),
                ..FactorData::default()
            }),
        );
        graph.edges.push(Edge::causal("fac_regulation", "out_revenue", -0.2, 0.1, 0.6));

        let outcome = reconcile_structural_truth(&mut graph, &mut ReconcileOptions::default());
        assert_eq!(outcome.mutations.len(), 1);
        assert_eq!(outcome.mutations[0].after, json!("external"));
        assert!(factor(&graph, "fac_regulation").factor_data().is_some());
        assert!(validate_graph(&graph, None).has_code(IssueCode::ExternalHasData));
    }

    #[test]
    fn test_completion_respects_flag() {
        let incomplete = || {
            let mut graph = minimal_valid_graph();
            for node in &mut graph.nodes {
                if let NodeBody::Factor { data: Some(data), .. } = &mut node.body {
                    data.factor_type = None;
                }
            }
            graph
        };

        let mut graph = incomplete();
        let outcome = reconcile_structural_truth(&mut graph, &mut ReconcileOptions::default());
        let filled = outcome.mutations_for(ReconcileRule::ControllableDataCompletion);
        assert_eq!(filled.len(), 1);
        assert_eq!(filled[0].code, IssueCode::ControllableDataFilled);
        assert_eq!(filled[0].field, "data.factor_type");
        assert!(validate_graph(&graph, None).valid);

        let mut graph = incomplete();
        let outcome = reconcile_structural_truth(
            &mut graph,
            &mut ReconcileOptions::default().with_fill_controllable_data(false),
        );
        assert!(outcome.is_noop());
        assert!(validate_graph(&graph, None).has_code(IssueCode::ControllableMissingData));
    }

    #[test]
    fn test_unknown_direction_coerced_then_sign_corrected() {
        let mut graph = minimal_valid_graph();
        graph.edges[4] = Edge::new("fac_price", "out_revenue", -0.6)
            .with_std(0.15)
            .with_belief(0.9)
            .with_direction(Lenient::Unknown("upward".into()));

        let outcome = reconcile_structural_truth(&mut graph, &mut ReconcileOptions::default());
        let codes: Vec<IssueCode> = outcome.mutations.iter().map(|m| m.code).collect();
        assert_eq!(codes, vec![IssueCode::EnumValueCorrected, IssueCode::SignCorrected]);
        assert_eq!(outcome.mutations[0].before, json!("upward"));
        assert_eq!(
            outcome.mutations[1].target,
            MutationTarget::Edge {
                index: 4,
                from: "fac_price".into(),
                to: "out_revenue".into(),
            }
        );
        assert_eq!(
            graph.edges[4].effect_direction,
            Some(Lenient::Known(EffectDirection::Negative))
        );
    }

    #[test]
    fn test_second_run_is_a_noop() {
        let mut graph = mislabelled_controllable_graph();
        graph.nodes.push(Node::factor("fac_volume", "Volume"));
        graph.edges.push(Edge::structural("opt_b", "fac_volume"));
        graph.edges[5].effect_direction = Some(Lenient::Known(EffectDirection::Negative));

        let first = reconcile_structural_truth(&mut graph, &mut ReconcileOptions::default());
        assert!(!first.is_noop());
        let second = reconcile_structural_truth(&mut graph, &mut ReconcileOptions::default());
        assert!(second.is_noop(), "second run mutated: {:?}", second.mutations);
    }

    #[test]
    fn test_second_run_with_same_options_keeps_constraints() {
        let mut graph = causeway_test_utils::retention_graph();
        let mut options = ReconcileOptions::default().with_goal_constraints(vec![
            GoalConstraint::new("c1", "fac_customer_retention", ">=", 0.9),
            GoalConstraint::new("c2", "fac_unknown_lever", "<=", 3.0),
        ]);

        let first = reconcile_structural_truth(&mut graph, &mut options);
        assert_eq!(first.mutations.len(), 2);
        let kept = vec![GoalConstraint::new("c1", "fac_retention_rate", ">=", 0.9)];
        assert_eq!(options.goal_constraints.as_deref(), Some(kept.as_slice()));

        let second = reconcile_structural_truth(&mut graph, &mut options);
        assert!(second.is_noop(), "second run mutated: {:?}", second.mutations);
        assert_eq!(second.goal_constraints, Some(kept));
    }

    #[test]
    fn test_cloned_variant_leaves_input_alone() {
        let original = mislabelled_controllable_graph();
        let options = ReconcileOptions::default()
            .with_goal_constraints(vec![GoalConstraint::new("c1", "fac_price_per_unit", ">=", 1.0)]);
        let (reconciled, outcome) = reconcile_structural_truth_cloned(&original, &options);
        assert_eq!(original, mislabelled_controllable_graph());
        assert_eq!(
            options.goal_constraints.as_ref().map(|c| c[0].node_id.as_str()),
            Some("fac_price_per_unit")
        );
        assert_ne!(original.fingerprint(), reconciled.fingerprint());
        assert_eq!(outcome.mutations_with_code(IssueCode::CategoryOverride).len(), 1);
        assert_eq!(outcome.mutations_with_code(IssueCode::ConstraintRemapped).len(), 1);
    }

    #[test]
    fn test_options_builders() {
        let options = ReconcileOptions::default()
            .with_fill_controllable_data(false)
            .with_goal_constraints(vec![GoalConstraint::new("c1", "fac_price", ">=", 1.0)])
            .with_node_labels([("fac_price", "Price per unit")]);
        assert!(!options.fill_controllable_data);
        assert_eq!(options.goal_constraints.as_ref().map(Vec::len), Some(1));
        assert_eq!(options.node_labels["fac_price"], "Price per unit");
        assert!(ReconcileOptions::default().fill_controllable_data);
    }

    #[test]
    fn test_goal_constraint_accepts_camel_case() {
        let constraint: GoalConstraint = serde_json::from_value(json!({
            "constraintId": "c1",
            "nodeId": "fac_price",
            "operator": "<=",
            "value": 120.0
        }))
        .unwrap();
        assert_eq!(constraint, GoalConstraint::new("c1", "fac_price", "<=", 120.0));
    }
}
