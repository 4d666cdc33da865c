//! Post-normalisation gate
//!
//! Runs after reconciliation and checks one thing: every present
//! `effect_direction` agrees with the sign of its `strength_mean`. A value
//! outside the direction vocabulary agrees with nothing. Graphs repaired
//! outside the reconciliation pass are caught here.

use crate::report::PostNormalisationReport;
use causeway_core::{EffectDirection, Graph, Issue, IssueCode, Lenient};
use serde_json::json;

/// Check residual sign consistency on every edge.
pub fn validate_graph_post_normalisation(graph: &Graph) -> PostNormalisationReport {
    let mut errors = Vec::new();

    for (idx, edge) in graph.edges.iter().enumerate() {
        let Some(declared) = &edge.effect_direction else {
            continue;
        };
        let Some(implied) = EffectDirection::from_mean(edge.strength_mean) else {
            continue;
        };
        let marked = match declared {
            Lenient::Known(direction) if *direction == implied => continue,
            Lenient::Known(direction) => direction.to_string(),
            Lenient::Unknown(raw) => format!("{:?}", raw),
        };
        errors.push(
            Issue::new(
                IssueCode::SignMismatch,
                format!("edges[{}].effect_direction", idx),
                format!(
                    "edge {} -> {} is marked {} but strength_mean {} is {}",
                    edge.from, edge.to, marked, edge.strength_mean, implied
                ),
            )
            .with_context(json!({
                "from": edge.from,
                "to": edge.to,
                "effect_direction": declared,
                "strength_mean": edge.strength_mean,
            })),
        );
    }

    let report = PostNormalisationReport::from_errors(errors);
    tracing::debug!(valid = report.valid, errors = report.errors.len(), "post-normalisation checked");
    report
}
