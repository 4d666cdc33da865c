//! Tier 2: sources, sinks, allowed edge types, and cycles

use super::{edge_path, node_path, IssueSink, TierContext};
use causeway_core::{FactorCategory, Issue, IssueCode, NodeKind};
use serde_json::json;

/// An edge endpoint as the allow-list sees it: factors resolve to their
/// inferred category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Decision,
    Option,
    Factor(FactorCategory),
    Outcome,
    Risk,
    Goal,
}

impl Endpoint {
    fn of(ctx: &TierContext<'_>, idx: usize) -> Self {
        match ctx.index.kind_at(idx) {
            NodeKind::Decision => Endpoint::Decision,
            NodeKind::Option => Endpoint::Option,
            NodeKind::Factor => {
                Endpoint::Factor(ctx.category(idx).unwrap_or(FactorCategory::External))
            }
            NodeKind::Outcome => Endpoint::Outcome,
            NodeKind::Risk => Endpoint::Risk,
            NodeKind::Goal => Endpoint::Goal,
        }
    }

    fn describe(&self) -> String {
        match self {
            Endpoint::Factor(category) => format!("{} factor", category),
            other => format!("{:?}", other).to_lowercase(),
        }
    }
}

/// The edge allow-list. Anything without a row is rejected.
fn allowed(source: Endpoint, target: Endpoint) -> bool {
    use Endpoint::*;
    matches!(
        (source, target),
        (Decision, Option)
            | (Option, Factor(FactorCategory::Controllable))
            | (Factor(_), Outcome)
            | (Factor(_), Risk)
            | (Factor(_), Factor(FactorCategory::Observable))
            | (Factor(_), Factor(FactorCategory::External))
            | (Outcome, Goal)
            | (Risk, Goal)
    )
}

pub(crate) fn check(ctx: &TierContext<'_>, sink: &mut IssueSink) {
    check_source_and_sink(ctx, sink);
    check_edge_types(ctx, sink);
    check_cycles(ctx, sink);
}

fn check_source_and_sink(ctx: &TierContext<'_>, sink: &mut IssueSink) {
    for idx in ctx.index.nodes_of_kind(NodeKind::Goal) {
        let outgoing = ctx.index.outgoing(idx);
        if !outgoing.is_empty() {
            let targets: Vec<&str> = outgoing.iter().map(|adj| ctx.id(adj.node)).collect();
            sink.push(
                Issue::new(
                    IssueCode::GoalHasOutgoing,
                    node_path(idx),
                    format!(
                        "goal '{}' must be a sink but has {} outgoing edge(s)",
                        ctx.id(idx),
                        outgoing.len()
                    ),
                )
                .with_context(json!({ "node_id": ctx.id(idx), "targets": targets })),
            );
        }
    }

    for idx in ctx.index.nodes_of_kind(NodeKind::Decision) {
        let incoming = ctx.index.incoming(idx);
        if !incoming.is_empty() {
            let sources: Vec<&str> = incoming.iter().map(|adj| ctx.id(adj.node)).collect();
            sink.push(
                Issue::new(
                    IssueCode::DecisionHasIncoming,
                    node_path(idx),
                    format!(
                        "decision '{}' must be a source but has {} incoming edge(s)",
                        ctx.id(idx),
                        incoming.len()
                    ),
                )
                .with_context(json!({ "node_id": ctx.id(idx), "sources": sources })),
            );
        }
    }
}

fn check_edge_types(ctx: &TierContext<'_>, sink: &mut IssueSink) {
    for (edge_idx, from, to) in ctx.index.resolved_edges() {
        let source = Endpoint::of(ctx, from);
        let target = Endpoint::of(ctx, to);
        if !allowed(source, target) {
            sink.push(
                Issue::new(
                    IssueCode::InvalidEdgeType,
                    edge_path(edge_idx),
                    format!(
                        "edge {} ({}) -> {} ({}) is not an allowed connection",
                        ctx.id(from),
                        source.describe(),
                        ctx.id(to),
                        target.describe()
                    ),
                )
                .with_context(json!({
                    "from": ctx.id(from),
                    "to": ctx.id(to),
                    "from_kind": source.describe(),
                    "to_kind": target.describe(),
                })),
            );
        }
    }
}

const UNVISITED: u8 = 0;
const ON_STACK: u8 = 1;
const DONE: u8 = 2;

/// Iterative depth-first search with an on-stack marker; every back-edge is
/// one cycle.
fn check_cycles(ctx: &TierContext<'_>, sink: &mut IssueSink) {
    let node_count = ctx.graph().nodes.len();
    let mut state = vec![UNVISITED; node_count];

    let starts: Vec<usize> = ctx.index.live_nodes().map(|(idx, _)| idx).collect();
    for start in starts {
        if state[start] != UNVISITED {
            continue;
        }
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        state[start] = ON_STACK;

        while let Some((node, cursor)) = stack.last().copied() {
            let outgoing = ctx.index.outgoing(node);
            let Some(adj) = outgoing.get(cursor) else {
                state[node] = DONE;
                stack.pop();
                continue;
            };
            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }

            match state[adj.node] {
                UNVISITED => {
                    state[adj.node] = ON_STACK;
                    stack.push((adj.node, 0));
                }
                ON_STACK => {
                    let entry = stack
                        .iter()
                        .position(|(n, _)| *n == adj.node)
                        .unwrap_or(0);
                    let mut cycle: Vec<&str> =
                        stack[entry..].iter().map(|(n, _)| ctx.id(*n)).collect();
                    cycle.push(ctx.id(adj.node));
                    sink.push(
                        Issue::new(
                            IssueCode::CycleDetected,
                            edge_path(adj.edge),
                            format!("cycle detected: {}", cycle.join(" -> ")),
                        )
                        .with_context(json!({
                            "cycle": cycle,
                            "edge_index": adj.edge,
                        })),
                    );
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate_graph;
    use causeway_core::{Edge, Node};
    use causeway_test_utils::minimal_valid_graph;

    #[test]
    fn test_allow_list_rows() {
        use Endpoint::*;
        assert!(allowed(Decision, Option));
        assert!(allowed(Option, Factor(FactorCategory::Controllable)));
        assert!(allowed(Factor(FactorCategory::Controllable), Factor(FactorCategory::Observable)));
        assert!(!allowed(Factor(FactorCategory::External), Factor(FactorCategory::Controllable)));
        assert!(!allowed(Option, Outcome));
        assert!(!allowed(Option, Goal));
        assert!(!allowed(Factor(FactorCategory::Observable), Goal));
        assert!(!allowed(Goal, Outcome));
        assert!(!allowed(Outcome, Risk));
        assert!(!allowed(Risk, Decision));
    }

    #[test]
    fn test_factor_to_goal_rejected() {
        let mut graph = minimal_valid_graph();
        graph.edges.push(Edge::causal("fac_price", "goal_1", 0.4, 0.1, 0.8));
        let report = validate_graph(&graph, None);
        let issues = report.issues_with_code(IssueCode::InvalidEdgeType);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].context["to"], "goal_1");
    }

    #[test]
    fn test_goal_outgoing_and_decision_incoming() {
        let mut graph = minimal_valid_graph();
        graph.edges.push(Edge::causal("goal_1", "dec_1", 0.4, 0.1, 0.8));
        let report = validate_graph(&graph, None);
        assert!(report.has_code(IssueCode::GoalHasOutgoing));
        assert!(report.has_code(IssueCode::DecisionHasIncoming));
        assert!(report.has_code(IssueCode::InvalidEdgeType));
        assert!(report.has_code(IssueCode::CycleDetected));
    }

    #[test]
    fn test_cycle_among_factors_reports_members() {
        let mut graph = minimal_valid_graph();
        graph.nodes.push(Node::factor("fac_demand", "Demand"));
        graph.edges.push(Edge::causal("fac_price", "fac_demand", -0.5, 0.1, 0.8));
        graph.edges.push(Edge::causal("fac_demand", "fac_price", 0.3, 0.1, 0.8));
        let report = validate_graph(&graph, None);
        let cycles = report.issues_with_code(IssueCode::CycleDetected);
        assert_eq!(cycles.len(), 1);
        let members = cycles[0].context["cycle"].as_array().unwrap();
        assert!(members.iter().any(|m| m == "fac_price"));
        assert!(members.iter().any(|m| m == "fac_demand"));
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let mut graph = minimal_valid_graph();
        graph.edges.push(Edge::causal("out_revenue", "out_revenue", 0.2, 0.1, 0.8));
        let report = validate_graph(&graph, None);
        let cycles = report.issues_with_code(IssueCode::CycleDetected);
        assert_eq!(cycles.len(), 1);
        assert_eq!(
            cycles[0].context["cycle"],
            serde_json::json!(["out_revenue", "out_revenue"])
        );
    }

    #[test]
    fn test_acyclic_graph_has_no_cycle() {
        let report = validate_graph(&minimal_valid_graph(), None);
        assert!(!report.has_code(IssueCode::CycleDetected));
    }
}
