//! Tier 1: cardinality, size limits, and referential integrity

use super::{edge_path, node_path, IssueSink, TierContext};
use causeway_core::{Issue, IssueCode, NodeKind};
use serde_json::json;

pub(crate) fn check(ctx: &TierContext<'_>, sink: &mut IssueSink) {
    let graph = ctx.graph();
    let config = &ctx.config;

    for (kind, code) in [
        (NodeKind::Goal, IssueCode::MissingGoal),
        (NodeKind::Decision, IssueCode::MissingDecision),
    ] {
        let count = graph.count_kind(kind);
        if count != 1 {
            sink.push(
                Issue::new(
                    code,
                    "nodes",
                    format!("expected exactly one {} node, found {}", kind, count),
                )
                .with_context(json!({ "kind": kind, "count": count })),
            );
        }
    }

    let options = graph.count_kind(NodeKind::Option);
    if options < config.min_options || options > config.max_options {
        sink.push(
            Issue::new(
                IssueCode::InsufficientOptions,
                "nodes",
                format!(
                    "expected between {} and {} options, found {}",
                    config.min_options, config.max_options, options
                ),
            )
            .with_context(json!({
                "count": options,
                "min": config.min_options,
                "max": config.max_options,
            })),
        );
    }

    if !graph.nodes.iter().any(|node| node.kind().is_bridge()) {
        sink.push(Issue::new(
            IssueCode::MissingBridge,
            "nodes",
            "graph has no outcome or risk node linking factors to the goal",
        ));
    }

    if graph.nodes.len() > config.node_limit {
        sink.push(
            Issue::new(
                IssueCode::NodeLimitExceeded,
                "nodes",
                format!(
                    "graph has {} nodes, limit is {}",
                    graph.nodes.len(),
                    config.node_limit
                ),
            )
            .with_context(json!({ "count": graph.nodes.len(), "limit": config.node_limit })),
        );
    }

    if graph.edges.len() > config.edge_limit {
        sink.push(
            Issue::new(
                IssueCode::EdgeLimitExceeded,
                "edges",
                format!(
                    "graph has {} edges, limit is {}",
                    graph.edges.len(),
                    config.edge_limit
                ),
            )
            .with_context(json!({ "count": graph.edges.len(), "limit": config.edge_limit })),
        );
    }

    for (idx, node) in graph.nodes.iter().enumerate() {
        if ctx.index.is_shadowed(idx) {
            let first = ctx.index.position(&node.id);
            sink.push(
                Issue::new(
                    IssueCode::DuplicateNodeId,
                    format!("{}.id", node_path(idx)),
                    format!("node id '{}' is already declared", node.id),
                )
                .with_context(json!({ "node_id": node.id, "first_index": first })),
            );
        }
    }

    for (idx, edge) in graph.edges.iter().enumerate() {
        for (field, id) in [("from", &edge.from), ("to", &edge.to)] {
            if ctx.index.position(id).is_none() {
                sink.push(
                    Issue::new(
                        IssueCode::InvalidEdgeRef,
                        format!("{}.{}", edge_path(idx), field),
                        format!("edge {} references unknown node '{}'", field, id),
                    )
                    .with_context(json!({
                        "edge_index": idx,
                        "from": edge.from,
                        "to": edge.to,
                        "missing": id,
                    })),
                );
            }
        }
    }
}
