//! Reconcile → validate → post-normalise, in one call

use crate::reconcile::{reconcile_structural_truth, GoalConstraint, ReconcileOptions};
use crate::report::{PostNormalisationReport, ValidationReport};
use crate::validate_graph_post_normalisation;
use crate::validator::GraphValidator;
use causeway_core::{Graph, Issue, Mutation};
use serde::{Deserialize, Serialize};

/// Everything one pass over a candidate graph produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    /// Reconciliation log; empty when reconciliation was skipped
    pub mutations: Vec<Mutation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_constraints: Option<Vec<GoalConstraint>>,
    pub report: ValidationReport,
    pub post: PostNormalisationReport,
    /// Fingerprint of the graph as validated
    pub fingerprint: String,
}

impl PipelineOutcome {
    /// Both validators passed; the graph may go on to simulation.
    pub fn is_ready(&self) -> bool {
        self.report.valid && self.post.valid
    }

    /// Errors from both validators.
    pub fn blocking_issues(&self) -> impl Iterator<Item = &Issue> {
        self.report.errors.iter().chain(self.post.errors.iter())
    }
}

/// Prepare `graph` for simulation.
///
/// With `options` set, the graph is reconciled in place first and remapped
/// constraints are written back into the options; `None` runs the validators
/// over the graph exactly as given.
pub fn prepare_graph(
    graph: &mut Graph,
    options: Option<&mut ReconcileOptions>,
    validator: &GraphValidator,
    request_id: Option<&str>,
) -> PipelineOutcome {
    let span = tracing::info_span!("prepare_graph", request_id = request_id.unwrap_or("-"));
    let _guard = span.enter();

    let (mutations, goal_constraints) = match options {
        Some(options) => {
            let outcome = reconcile_structural_truth(graph, options);
            (outcome.mutations, outcome.goal_constraints)
        }
        None => (Vec::new(), None),
    };

    let report = validator.validate(graph, request_id);
    let post = validate_graph_post_normalisation(graph);

    PipelineOutcome {
        mutations,
        goal_constraints,
        report,
        post,
        fingerprint: graph.fingerprint(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use causeway_core::{Edge, EffectDirection, IssueCode, Lenient};
    use causeway_test_utils::{minimal_valid_graph, mislabelled_controllable_graph};

    #[test]
    fn test_reconciled_graph_is_ready() {
        let mut graph = mislabelled_controllable_graph();
        let outcome = prepare_graph(
            &mut graph,
            Some(&mut ReconcileOptions::default()),
            &GraphValidator::default(),
            Some("req-7"),
        );
        assert!(outcome.is_ready(), "blocking: {:?}", outcome.blocking_issues().collect::<Vec<_>>());
        assert_eq!(outcome.mutations.len(), 1);
        assert_eq!(outcome.fingerprint, graph.fingerprint());
    }

    #[test]
    fn test_skipping_reconcile_leaves_mismatch() {
        let mut graph = mislabelled_controllable_graph();
        let outcome = prepare_graph(&mut graph, None, &GraphValidator::default(), None);
        assert!(!outcome.is_ready());
        assert!(outcome.mutations.is_empty());
        assert!(outcome.report.has_code(IssueCode::CategoryMismatch));
    }

    #[test]
    fn test_sign_mismatch_blocks_without_reconcile() {
        let mut graph = minimal_valid_graph();
        graph.edges[5] = Edge::causal("out_revenue", "goal_1", 0.8, 0.1, 0.95)
            .with_direction(Lenient::Known(EffectDirection::Negative));
        let outcome = prepare_graph(&mut graph, None, &GraphValidator::default(), None);
        assert!(outcome.report.valid);
        assert!(!outcome.post.valid);
        assert!(!outcome.is_ready());

        let outcome = prepare_graph(
            &mut graph,
            Some(&mut ReconcileOptions::default()),
            &GraphValidator::default(),
            None,
        );
        assert!(outcome.is_ready());
        assert_eq!(outcome.mutations[0].code, IssueCode::SignCorrected);
    }
}
