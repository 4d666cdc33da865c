//! Tier 3: reachability from the decision and to the goal

use super::{node_path, IssueSink, TierContext};
use causeway_core::{has_option_parent, FactorCategory, Issue, IssueCode, NodeKind};
use serde_json::json;

/// An observable or external factor no option sets, which still drives the
/// goal, is an exogenous root and need not hang off the decision.
fn is_exogenous_driver(ctx: &TierContext<'_>, idx: usize) -> bool {
    let exogenous = matches!(
        ctx.category(idx),
        Some(FactorCategory::Observable | FactorCategory::External)
    ) && !has_option_parent(&ctx.index, idx);
    let drives_goal = ctx
        .reaches_goal
        .as_ref()
        .map_or(true, |reach| reach[idx]);
    exogenous && drives_goal
}

pub(crate) fn check(ctx: &TierContext<'_>, sink: &mut IssueSink) {
    if let Some(from_decision) = &ctx.from_decision {
        for (idx, node) in ctx.index.live_nodes() {
            if from_decision[idx] || is_exogenous_driver(ctx, idx) {
                continue;
            }
            sink.push(
                Issue::new(
                    IssueCode::UnreachableFromDecision,
                    node_path(idx),
                    format!("{} '{}' is not reachable from the decision", node.kind(), node.id),
                )
                .with_context(json!({ "node_id": node.id, "kind": node.kind() })),
            );
        }
    }

    if let Some(reaches_goal) = &ctx.reaches_goal {
        for (idx, node) in ctx.index.live_nodes() {
            if reaches_goal[idx] || node.kind() == NodeKind::Decision {
                continue;
            }
            sink.push(
                Issue::new(
                    IssueCode::NoPathToGoal,
                    node_path(idx),
                    format!("{} '{}' has no path to the goal", node.kind(), node.id),
                )
                .with_context(json!({ "node_id": node.id, "kind": node.kind() })),
            );
        }
    }
}
