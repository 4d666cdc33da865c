//! Non-blocking advisories on edge parameters and factor data.
//!
//! Nothing here is an error. Non-finite numbers are skipped since the numeric
//! tier already owns them.

use super::{edge_path, node_path, IssueSink, TierContext};
use causeway_core::{Edge, FactorCategory, Issue, IssueCode, NodeKind};
use serde_json::json;

/// Below this `belief_exists` an edge is a weak claim.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.3;
/// A causal edge with a smaller std looks like copied scaffolding defaults.
pub const LOW_STD_THRESHOLD: f64 = 0.05;

pub(crate) fn check(ctx: &TierContext<'_>, sink: &mut IssueSink) {
    let graph = ctx.graph();

    for (idx, edge) in graph.edges.iter().enumerate() {
        check_ranges(idx, edge, sink);
    }

    for (idx, from, to) in ctx.index.resolved_edges() {
        let edge = &graph.edges[idx];
        check_polarity(ctx, idx, edge, from, to, sink);

        if !ctx.is_structural(from, to) {
            if let Some(std) = edge.strength_std.filter(|s| s.is_finite()) {
                if std < LOW_STD_THRESHOLD {
                    sink.push(
                        Issue::new(
                            IssueCode::LowStdNonStructural,
                            format!("{}.strength_std", edge_path(idx)),
                            format!(
                                "causal edge {} -> {} has std {} below {}",
                                edge.from, edge.to, std, LOW_STD_THRESHOLD
                            ),
                        )
                        .with_context(json!({ "from": edge.from, "to": edge.to, "std": std })),
                    );
                }
            }
        }
    }

    for (idx, node) in ctx.index.live_nodes() {
        if ctx.category(idx) != Some(FactorCategory::Controllable) {
            continue;
        }
        let empty = node
            .factor_data()
            .and_then(|data| data.uncertainty_drivers.as_ref())
            .is_some_and(|drivers| drivers.is_empty());
        if empty {
            sink.push(
                Issue::new(
                    IssueCode::EmptyUncertaintyDrivers,
                    format!("{}.data.uncertainty_drivers", node_path(idx)),
                    format!("controllable factor '{}' lists no uncertainty drivers", node.id),
                )
                .with_context(json!({ "node_id": node.id })),
            );
        }
    }
}

fn check_ranges(idx: usize, edge: &Edge, sink: &mut IssueSink) {
    let mean = edge.strength_mean;
    if mean.is_finite() && mean.abs() > 1.0 {
        sink.push(
            Issue::new(
                IssueCode::StrengthOutOfRange,
                format!("{}.strength_mean", edge_path(idx)),
                format!("edge {} -> {} has |strength_mean| {} above 1", edge.from, edge.to, mean),
            )
            .with_context(json!({ "from": edge.from, "to": edge.to, "strength_mean": mean })),
        );
    }

    let field = if edge.belief_exists.is_some() {
        "belief_exists"
    } else {
        "belief"
    };
    let Some(belief) = edge.effective_belief().filter(|b| b.is_finite()) else {
        return;
    };
    let path = format!("{}.{}", edge_path(idx), field);
    if !(0.0..=1.0).contains(&belief) {
        sink.push(
            Issue::new(
                IssueCode::ProbabilityOutOfRange,
                path,
                format!("edge {} -> {} has belief {} outside [0, 1]", edge.from, edge.to, belief),
            )
            .with_context(json!({ "from": edge.from, "to": edge.to, "belief": belief })),
        );
    } else if belief < LOW_CONFIDENCE_THRESHOLD {
        sink.push(
            Issue::new(
                IssueCode::LowEdgeConfidence,
                path,
                format!(
                    "edge {} -> {} has belief {} below {}",
                    edge.from, edge.to, belief, LOW_CONFIDENCE_THRESHOLD
                ),
            )
            .with_context(json!({ "from": edge.from, "to": edge.to, "belief": belief })),
        );
    }
}

fn check_polarity(
    ctx: &TierContext<'_>,
    idx: usize,
    edge: &Edge,
    from: usize,
    to: usize,
    sink: &mut IssueSink,
) {
    if ctx.index.kind_at(to) != NodeKind::Goal {
        return;
    }
    let mean = edge.strength_mean;
    let (code, message) = match ctx.index.kind_at(from) {
        NodeKind::Outcome if mean < 0.0 => (
            IssueCode::OutcomeNegativePolarity,
            "outcome lowers the goal; outcomes are expected to raise it",
        ),
        NodeKind::Risk if mean > 0.0 => (
            IssueCode::RiskPositivePolarity,
            "risk raises the goal; risks are expected to lower it",
        ),
        _ => return,
    };
    sink.push(
        Issue::new(
            code,
            format!("{}.strength_mean", edge_path(idx)),
            format!("{} -> {}: {}", edge.from, edge.to, message),
        )
        .with_context(json!({ "from": edge.from, "to": edge.to, "strength_mean": mean })),
    );
}

#[cfg(test)]
mod tests {
    use crate::validate_graph;
    use causeway_core::{Edge, IssueCode, Node, NodeBody, Severity};
    use causeway_test_utils::minimal_valid_graph;

    #[test]
    fn test_risk_positive_polarity() {
        let mut graph = minimal_valid_graph();
        graph.nodes.push(Node::risk("risk_1", "Churn spike"));
        graph.edges.push(Edge::causal("fac_price", "risk_1", 0.4, 0.1, 0.7));
        graph.edges.push(Edge::causal("risk_1", "goal_1", 0.5, 0.1, 0.7));
        let report = validate_graph(&graph, None);
        let issues = report.issues_with_code(IssueCode::RiskPositivePolarity);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warn);
        assert!(report.valid);
    }

    #[test]
    fn test_outcome_negative_polarity() {
        let mut graph = minimal_valid_graph();
        for edge in &mut graph.edges {
            if edge.to == "goal_1" {
                *edge = Edge::causal("out_revenue", "goal_1", -0.4, 0.1, 0.9);
            }
        }
        let report = validate_graph(&graph, None);
        assert!(report.has_code(IssueCode::OutcomeNegativePolarity));
    }

    #[test]
    fn test_edge_range_warnings() {
        let mut graph = minimal_valid_graph();
        for edge in &mut graph.edges {
            if edge.from == "fac_price" {
                edge.strength_mean = 1.6;
                edge.belief_exists = Some(0.1);
                edge.strength_std = Some(0.01);
            }
            if edge.to == "goal_1" {
                edge.belief_exists = Some(1.4);
            }
        }
        let report = validate_graph(&graph, None);
        assert!(report.has_code(IssueCode::StrengthOutOfRange));
        assert!(report.has_code(IssueCode::LowEdgeConfidence));
        assert!(report.has_code(IssueCode::ProbabilityOutOfRange));
        assert!(report.has_code(IssueCode::LowStdNonStructural));
        assert!(report.valid);
    }

    #[test]
    fn test_structural_edges_exempt_from_low_std() {
        let report = validate_graph(&minimal_valid_graph(), None);
        assert!(!report.has_code(IssueCode::LowStdNonStructural));
    }

    #[test]
    fn test_empty_uncertainty_drivers() {
        let mut graph = minimal_valid_graph();
        for node in &mut graph.nodes {
            if let NodeBody::Factor { data: Some(data), .. } = &mut node.body {
                data.uncertainty_drivers = Some(Vec::new());
            }
        }
        let report = validate_graph(&graph, None);
        let issues = report.issues_with_code(IssueCode::EmptyUncertaintyDrivers);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "nodes[1].data.uncertainty_drivers");
        assert!(!report.has_code(IssueCode::ControllableMissingData));
    }
}
