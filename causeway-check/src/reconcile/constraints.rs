//! Rule 3: constraint target remap
//!
//! A constraint pointing at an id the graph lacks is resolved fuzzily, never
//! across id prefixes (`fac_`, `out_`, ...):
//!
//! - stage a: stem containment, either direction
//! - stage b: the stem inside a normalised node label
//!
//! More than one candidate at a stage is ambiguous and drops the constraint.

use super::GoalConstraint;
use causeway_core::{
    Graph, GraphIndex, IssueCode, Mutation, MutationTarget, ReconcileRule, MIN_FUZZY_STEM_LENGTH,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Split `fac_retention_rate` into `("fac", "retention_rate")`.
///
/// `None` when there is no underscore or either side is empty.
pub fn split_prefix(id: &str) -> Option<(&str, &str)> {
    let (prefix, stem) = id.split_once('_')?;
    (!prefix.is_empty() && !stem.is_empty()).then_some((prefix, stem))
}

/// Lower-case, with every run of non-alphanumerics collapsed to one `_` and
/// none at either end.
pub fn normalise_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut separator = false;
    for c in label.chars() {
        if c.is_alphanumeric() {
            if separator && !out.is_empty() {
                out.push('_');
            }
            separator = false;
            out.extend(c.to_lowercase());
        } else {
            separator = true;
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Stem,
    Label,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DropReason {
    NoPrefix,
    StemTooShort,
    NoCandidate,
    Ambiguous(Stage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution<'g> {
    Exists,
    Matched { node_id: &'g str, stage: Stage },
    Dropped(DropReason),
}

fn pick<'g>(matches: &[&'g str], stage: Stage) -> Option<Resolution<'g>> {
    match matches {
        [] => None,
        [only] => Some(Resolution::Matched {
            node_id: *only,
            stage,
        }),
        _ => Some(Resolution::Dropped(DropReason::Ambiguous(stage))),
    }
}

fn resolve<'g>(
    index: &GraphIndex<'g>,
    node_id: &str,
    labels: &BTreeMap<String, String>,
) -> Resolution<'g> {
    if index.position(node_id).is_some() {
        return Resolution::Exists;
    }
    let Some((prefix, stem)) = split_prefix(node_id) else {
        return Resolution::Dropped(DropReason::NoPrefix);
    };
    let stem = stem.to_lowercase();
    if stem.chars().count() < MIN_FUZZY_STEM_LENGTH {
        return Resolution::Dropped(DropReason::StemTooShort);
    }

    let candidates: Vec<(&'g str, String)> = index
        .live_nodes()
        .filter_map(|(_, node)| {
            let (candidate_prefix, candidate_stem) = split_prefix(&node.id)?;
            (candidate_prefix == prefix).then(|| (node.id.as_str(), candidate_stem.to_lowercase()))
        })
        .collect();

    let by_stem: Vec<&'g str> = candidates
        .iter()
        .filter(|(_, candidate)| {
            candidate.contains(stem.as_str())
                || (candidate.chars().count() >= MIN_FUZZY_STEM_LENGTH
                    && stem.contains(candidate.as_str()))
        })
        .map(|(id, _)| *id)
        .collect();
    if let Some(resolution) = pick(&by_stem, Stage::Stem) {
        return resolution;
    }

    let by_label: Vec<&'g str> = candidates
        .iter()
        .filter(|(id, _)| {
            let label = match labels.get(*id) {
                Some(label) => label.as_str(),
                None => index.node(id).map_or("", |node| node.label.as_str()),
            };
            normalise_label(label).contains(stem.as_str())
        })
        .map(|(id, _)| *id)
        .collect();
    pick(&by_label, Stage::Label).unwrap_or(Resolution::Dropped(DropReason::NoCandidate))
}

/// Remap or drop each constraint whose node id is missing from `graph`.
///
/// Returns the surviving constraints in input order.
pub(super) fn remap_constraints(
    graph: &Graph,
    constraints: &[GoalConstraint],
    labels: &BTreeMap<String, String>,
    mutations: &mut Vec<Mutation>,
) -> Vec<GoalConstraint> {
    let index = GraphIndex::build(graph);
    let mut kept = Vec::with_capacity(constraints.len());

    for constraint in constraints {
        let target = MutationTarget::Constraint {
            constraint_id: constraint.constraint_id.clone(),
        };
        match resolve(&index, &constraint.node_id, labels) {
            Resolution::Exists => kept.push(constraint.clone()),
            Resolution::Matched { node_id, stage } => {
                tracing::debug!(
                    constraint = %constraint.constraint_id,
                    from = %constraint.node_id,
                    to = node_id,
                    ?stage,
                    "constraint remapped"
                );
                mutations.push(Mutation::new(
                    ReconcileRule::ConstraintTargetRemap,
                    IssueCode::ConstraintRemapped,
                    target,
                    "node_id",
                    json!(constraint.node_id),
                    json!(node_id),
                ));
                kept.push(GoalConstraint {
                    node_id: node_id.to_string(),
                    ..constraint.clone()
                });
            }
            Resolution::Dropped(reason) => {
                tracing::debug!(
                    constraint = %constraint.constraint_id,
                    node_id = %constraint.node_id,
                    ?reason,
                    "constraint dropped"
                );
                mutations.push(Mutation::new(
                    ReconcileRule::ConstraintTargetRemap,
                    IssueCode::ConstraintDropped,
                    target,
                    "node_id",
                    json!(constraint.node_id),
                    Value::Null,
                ));
            }
        }
    }

    kept
}
