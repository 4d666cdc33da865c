//! Rules 1 and 5: category override and controllable data completion

use super::{DEFAULT_FACTOR_TYPE, DEFAULT_UNCERTAINTY_DRIVER};
use causeway_core::{
    FactorCategory, FactorData, Graph, IssueCode, Lenient, Mutation, MutationTarget, NodeBody,
    ReconcileRule,
};
use serde_json::{json, Value};

/// Rule 1. Overwrite every declared category that disagrees with the inferred
/// one, then bring the data in line with the new category.
pub(super) fn override_categories(
    graph: &mut Graph,
    categories: &[Option<FactorCategory>],
    mutations: &mut Vec<Mutation>,
) {
    for (node, inferred) in graph.nodes.iter_mut().zip(categories) {
        let Some(inferred) = *inferred else {
            continue;
        };
        let NodeBody::Factor { category, data } = &mut node.body else {
            continue;
        };
        if *category == Some(inferred) {
            continue;
        }

        let target = MutationTarget::Node {
            node_id: node.id.clone(),
        };
        mutations.push(Mutation::new(
            ReconcileRule::CategoryOverride,
            IssueCode::CategoryOverride,
            target.clone(),
            "category",
            json!(*category),
            json!(inferred),
        ));
        *category = Some(inferred);

        match inferred {
            FactorCategory::Controllable => backfill_controllable(
                data,
                ReconcileRule::CategoryOverride,
                IssueCode::CategoryOverride,
                &target,
                mutations,
            ),
            FactorCategory::Observable => strip_controllable_keys(data, &target, mutations),
            FactorCategory::External => {}
        }
    }
}

/// Rule 5. Fill defaults into controllable factors that are still incomplete.
pub(super) fn complete_controllable_data(
    graph: &mut Graph,
    categories: &[Option<FactorCategory>],
    mutations: &mut Vec<Mutation>,
) {
    for (node, inferred) in graph.nodes.iter_mut().zip(categories) {
        if *inferred != Some(FactorCategory::Controllable) {
            continue;
        }
        let NodeBody::Factor { data, .. } = &mut node.body else {
            continue;
        };
        let target = MutationTarget::Node {
            node_id: node.id.clone(),
        };
        backfill_controllable(
            data,
            ReconcileRule::ControllableDataCompletion,
            IssueCode::ControllableDataFilled,
            &target,
            mutations,
        );
    }
}

/// Additive only: present keys, valid or not, are left alone.
fn backfill_controllable(
    data: &mut Option<FactorData>,
    rule: ReconcileRule,
    code: IssueCode,
    target: &MutationTarget,
    mutations: &mut Vec<Mutation>,
) {
    let complete = data
        .as_ref()
        .is_some_and(|d| d.factor_type.is_some() && d.uncertainty_drivers.is_some());
    if complete {
        return;
    }

    let data = data.get_or_insert_with(FactorData::default);
    if data.factor_type.is_none() {
        data.factor_type = Some(Lenient::Known(DEFAULT_FACTOR_TYPE));
        mutations.push(Mutation::new(
            rule,
            code,
            target.clone(),
            "data.factor_type",
            Value::Null,
            json!(DEFAULT_FACTOR_TYPE),
        ));
    }
    if data.uncertainty_drivers.is_none() {
        let drivers = vec![DEFAULT_UNCERTAINTY_DRIVER.to_string()];
        mutations.push(Mutation::new(
            rule,
            code,
            target.clone(),
            "data.uncertainty_drivers",
            Value::Null,
            json!(drivers),
        ));
        data.uncertainty_drivers = Some(drivers);
    }
}

fn strip_controllable_keys(
    data: &mut Option<FactorData>,
    target: &MutationTarget,
    mutations: &mut Vec<Mutation>,
) {
    let Some(data) = data else {
        return;
    };
    if let Some(factor_type) = data.factor_type.take() {
        mutations.push(Mutation::new(
            ReconcileRule::CategoryOverride,
            IssueCode::CategoryOverride,
            target.clone(),
            "data.factor_type",
            json!(factor_type),
            Value::Null,
        ));
    }
    if let Some(drivers) = data.uncertainty_drivers.take() {
        mutations.push(Mutation::new(
            ReconcileRule::CategoryOverride,
            IssueCode::CategoryOverride,
            target.clone(),
            "data.uncertainty_drivers",
            json!(drivers),
            Value::Null,
        ));
    }
}
