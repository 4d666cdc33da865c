//! Rule 2: coerce out-of-range enum values to safe defaults.
//!
//! Only present values are touched. An absent `factor_type` is rule 1's or
//! rule 5's business.

use causeway_core::{
    EffectDirection, ExtractionType, FactorType, Graph, IssueCode, Lenient, Mutation,
    MutationTarget, Node, NodeBody, ReconcileRule,
};
use serde::Serialize;
use serde_json::json;

/// Replace an `Unknown` value with `fallback`, returning the raw value replaced.
fn coerce<T>(field: &mut Option<Lenient<T>>, fallback: T) -> Option<String> {
    match field {
        Some(Lenient::Unknown(raw)) => {
            let raw = std::mem::take(raw);
            *field = Some(Lenient::Known(fallback));
            Some(raw)
        }
        _ => None,
    }
}

fn corrected<T: Serialize>(target: MutationTarget, field: &str, raw: String, fallback: T) -> Mutation {
    Mutation::new(
        ReconcileRule::EnumValidation,
        IssueCode::EnumValueCorrected,
        target,
        field,
        json!(raw),
        json!(fallback),
    )
}

pub(super) fn coerce_enum_values(graph: &mut Graph, mutations: &mut Vec<Mutation>) {
    for Node { id, body, .. } in &mut graph.nodes {
        let NodeBody::Factor {
            data: Some(data), ..
        } = body
        else {
            continue;
        };
        let target = || MutationTarget::Node {
            node_id: id.clone(),
        };

        if let Some(raw) = coerce(&mut data.factor_type, FactorType::Other) {
            mutations.push(corrected(target(), "data.factor_type", raw, FactorType::Other));
        }
        if let Some(raw) = coerce(&mut data.extraction_type, ExtractionType::Inferred) {
            mutations.push(corrected(
                target(),
                "data.extractionType",
                raw,
                ExtractionType::Inferred,
            ));
        }
    }

    for (index, edge) in graph.edges.iter_mut().enumerate() {
        if let Some(raw) = coerce(&mut edge.effect_direction, EffectDirection::Positive) {
            let target = MutationTarget::Edge {
                index,
                from: edge.from.clone(),
                to: edge.to.clone(),
            };
            mutations.push(corrected(
                target,
                "effect_direction",
                raw,
                EffectDirection::Positive,
            ));
        }
    }
}
