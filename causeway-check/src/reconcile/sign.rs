//! Rule 4: the sign of `strength_mean` wins over `effect_direction`

use causeway_core::{
    EffectDirection, Graph, IssueCode, Lenient, Mutation, MutationTarget, ReconcileRule,
};
use serde_json::json;

pub(super) fn reconcile_signs(graph: &mut Graph, mutations: &mut Vec<Mutation>) {
    for (index, edge) in graph.edges.iter_mut().enumerate() {
        let Some(Lenient::Known(declared)) = edge.effect_direction else {
            continue;
        };
        let Some(implied) = EffectDirection::from_mean(edge.strength_mean) else {
            continue;
        };
        if declared == implied {
            continue;
        }

        edge.effect_direction = Some(Lenient::Known(implied));
        mutations.push(Mutation::new(
            ReconcileRule::SignReconciliation,
            IssueCode::SignCorrected,
            MutationTarget::Edge {
                index,
                from: edge.from.clone(),
                to: edge.to.clone(),
            },
            "effect_direction",
            json!(declared),
            json!(implied),
        ));
    }
}
