//! Tier 5: semantic integrity of options, interventions, and scaffolding

use super::{edge_path, node_path, IssueSink, TierContext};
use causeway_core::{Edge, FactorCategory, Issue, IssueCode, NodeKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use std::collections::BTreeSet;

/// A currency amount, a percentage, or a standalone number.
static NUMBER_TOKEN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"(?i)[$£€¥]\s*\d|\d[\d,.]*\s*%|\b\d[\d,.]*(?:\s*(?:k|m|bn|million|billion|thousand))?\b",
    )
    .ok()
});

/// "targeting" stays out: ad targeting is a lever, not a goal.
static GOAL_WORD: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:target(?:s|ed)?|goals?|reach(?:es|ed|ing)?)\b").ok()
});

/// Labels like "Reach £20k MRR target" describe the goal, not a factor.
pub(crate) fn looks_like_goal_number(label: &str) -> bool {
    match (NUMBER_TOKEN.as_ref(), GOAL_WORD.as_ref()) {
        (Some(number), Some(goal)) => number.is_match(label) && goal.is_match(label),
        _ => false,
    }
}

pub(crate) fn check(ctx: &TierContext<'_>, sink: &mut IssueSink) {
    check_options(ctx, sink);
    check_identical_options(ctx, sink);
    check_goal_numbers(ctx, sink);
    check_structural_edges(ctx, sink);
}

fn check_options(ctx: &TierContext<'_>, sink: &mut IssueSink) {
    for idx in ctx.index.nodes_of_kind(NodeKind::Option) {
        let node = ctx.index.node_at(idx);
        let mut set_factors = BTreeSet::new();

        if let Some(interventions) = node.interventions() {
            for factor_id in interventions.keys() {
                match ctx.index.position(factor_id) {
                    Some(target) if ctx.index.kind_at(target) == NodeKind::Factor => {
                        set_factors.insert(target);
                    }
                    resolved => {
                        let reason = match resolved {
                            Some(target) => {
                                format!("is a {} node, not a factor", ctx.index.kind_at(target))
                            }
                            None => "does not exist".to_string(),
                        };
                        sink.push(
                            Issue::new(
                                IssueCode::InvalidInterventionRef,
                                format!("{}.data.interventions.{}", node_path(idx), factor_id),
                                format!(
                                    "option '{}' intervenes on '{}', which {}",
                                    node.id, factor_id, reason
                                ),
                            )
                            .with_context(json!({
                                "option_id": node.id,
                                "factor_id": factor_id,
                            })),
                        );
                    }
                }
            }
        }

        for adj in ctx.index.outgoing(idx) {
            if ctx.index.kind_at(adj.node) == NodeKind::Factor {
                set_factors.insert(adj.node);
            }
        }

        let Some(reaches_goal) = &ctx.reaches_goal else {
            continue;
        };
        if !set_factors.iter().any(|&factor| reaches_goal[factor]) {
            let factor_ids: Vec<&str> = set_factors.iter().map(|&f| ctx.id(f)).collect();
            sink.push(
                Issue::new(
                    IssueCode::NoEffectPath,
                    node_path(idx),
                    format!(
                        "option '{}' sets no factor with a path to the goal",
                        node.id
                    ),
                )
                .with_context(json!({ "option_id": node.id, "factors": factor_ids })),
            );
        }
    }
}

/// Unordered (factor, value) pairs; values compared bitwise with -0 folded to 0.
fn signature(ctx: &TierContext<'_>, idx: usize) -> Vec<(String, u64)> {
    let mut pairs: Vec<(String, u64)> = ctx
        .index
        .node_at(idx)
        .interventions()
        .map(|interventions| {
            interventions
                .iter()
                .map(|(factor, value)| {
                    let folded = if *value == 0.0 { 0.0 } else { *value };
                    (factor.clone(), folded.to_bits())
                })
                .collect()
        })
        .unwrap_or_default();
    pairs.sort();
    pairs
}

fn check_identical_options(ctx: &TierContext<'_>, sink: &mut IssueSink) {
    let mut groups: Vec<(Vec<(String, u64)>, Vec<usize>)> = Vec::new();
    for idx in ctx.index.nodes_of_kind(NodeKind::Option) {
        let sig = signature(ctx, idx);
        match groups.iter_mut().find(|(existing, _)| *existing == sig) {
            Some((_, members)) => members.push(idx),
            None => groups.push((sig, vec![idx])),
        }
    }

    for (_, members) in groups.into_iter().filter(|(_, m)| m.len() > 1) {
        let option_ids: Vec<&str> = members.iter().map(|&m| ctx.id(m)).collect();
        sink.push(
            Issue::new(
                IssueCode::OptionsIdentical,
                node_path(members[0]),
                format!(
                    "options {} set identical interventions",
                    option_ids.join(", ")
                ),
            )
            .with_context(json!({ "option_ids": option_ids })),
        );
    }
}

fn check_goal_numbers(ctx: &TierContext<'_>, sink: &mut IssueSink) {
    for idx in ctx.index.nodes_of_kind(NodeKind::Factor) {
        let node = ctx.index.node_at(idx);
        if ctx.category(idx) == Some(FactorCategory::Controllable)
            || node.declared_category() == Some(FactorCategory::Controllable)
        {
            continue;
        }
        if looks_like_goal_number(&node.label) {
            sink.push(
                Issue::new(
                    IssueCode::GoalNumberAsFactor,
                    format!("{}.label", node_path(idx)),
                    format!(
                        "factor '{}' ({}) looks like a goal target, model it as a goal constraint",
                        node.id, node.label
                    ),
                )
                .with_context(json!({ "node_id": node.id, "label": node.label })),
            );
        }
    }
}

fn structural_snapshot(edge: &Edge) -> serde_json::Value {
    json!({
        "from": edge.from,
        "to": edge.to,
        "strength_mean": edge.strength_mean,
        "strength_std": edge.strength_std,
        "belief_exists": edge.effective_belief(),
        "effect_direction": edge.effect_direction,
    })
}

fn check_structural_edges(ctx: &TierContext<'_>, sink: &mut IssueSink) {
    let graph = ctx.graph();
    for (edge_idx, from, to) in ctx.index.resolved_edges() {
        let code = match (ctx.index.kind_at(from), ctx.index.kind_at(to)) {
            (NodeKind::Option, NodeKind::Factor) => IssueCode::StructuralEdgeNotCanonicalError,
            (NodeKind::Decision, NodeKind::Option) => IssueCode::StructuralEdgeNotCanonical,
            _ => continue,
        };
        let edge = &graph.edges[edge_idx];
        if edge.is_canonical_structural() {
            continue;
        }
        sink.push(
            Issue::new(
                code,
                edge_path(edge_idx),
                format!(
                    "structural edge {} -> {} must use mean=1, std=0.01, belief_exists=1, direction=positive",
                    edge.from, edge.to
                ),
            )
            .with_context(structural_snapshot(edge)),
        );
    }
}
