//! Tier 4: factor data must match the inferred category

use super::{node_path, IssueSink, TierContext};
use causeway_core::{project_factor, DataDefect, FactorCategory, Issue, IssueCode};
use serde_json::json;

pub(crate) fn check(ctx: &TierContext<'_>, sink: &mut IssueSink) {
    for (idx, node) in ctx.index.live_nodes() {
        let Some(inferred) = ctx.category(idx) else {
            continue;
        };

        if let Err(defects) = project_factor(node.factor_data(), inferred) {
            for defect in defects {
                sink.push(defect_issue(idx, &node.id, inferred, defect));
            }
        }

        if let Some(declared) = node.declared_category() {
            if declared != inferred {
                sink.push(
                    Issue::new(
                        IssueCode::CategoryMismatch,
                        format!("{}.category", node_path(idx)),
                        format!(
                            "factor '{}' is declared {} but its structure makes it {}",
                            node.id, declared, inferred
                        ),
                    )
                    .with_context(json!({
                        "node_id": node.id,
                        "declared": declared,
                        "inferred": inferred,
                    })),
                );
            }
        }
    }
}

fn defect_issue(idx: usize, node_id: &str, category: FactorCategory, defect: DataDefect) -> Issue {
    let path = format!("{}.data", node_path(idx));
    match defect {
        DataDefect::MissingKeys(missing) => {
            let code = match category {
                FactorCategory::Controllable => IssueCode::ControllableMissingData,
                _ => IssueCode::ObservableMissingData,
            };
            Issue::new(
                code,
                path,
                format!(
                    "{} factor '{}' is missing {}",
                    category,
                    node_id,
                    missing.join(", ")
                ),
            )
            .with_context(json!({ "node_id": node_id, "missing": missing }))
        }
        DataDefect::ExtraKeys(extra) => Issue::new(
            IssueCode::ObservableExtraData,
            path,
            format!(
                "{} factor '{}' must not carry {}",
                category,
                node_id,
                extra.join(", ")
            ),
        )
        .with_context(json!({ "node_id": node_id, "extra": extra })),
        DataDefect::UnexpectedData => Issue::new(
            IssueCode::ExternalHasData,
            path,
            format!("external factor '{}' must not carry a data object", node_id),
        )
        .with_context(json!({ "node_id": node_id })),
    }
}
