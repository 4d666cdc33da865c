//! Tier 6: every number must be finite

use super::{edge_path, node_path, IssueSink, TierContext};
use causeway_core::{Issue, IssueCode};
use serde_json::json;

fn report_non_finite(sink: &mut IssueSink, path: String, owner: &str, value: f64) {
    if value.is_finite() {
        return;
    }
    sink.push(
        Issue::new(
            IssueCode::NanValue,
            path.clone(),
            format!("{} holds a non-finite number ({})", path, value),
        )
        .with_context(json!({ "owner": owner, "value": value.to_string() })),
    );
}

pub(crate) fn check(ctx: &TierContext<'_>, sink: &mut IssueSink) {
    let graph = ctx.graph();

    for (idx, node) in graph.nodes.iter().enumerate() {
        if let Some(data) = node.factor_data() {
            for (field, value) in [("value", data.value), ("baseline", data.baseline)] {
                if let Some(value) = value {
                    let path = format!("{}.data.{}", node_path(idx), field);
                    report_non_finite(sink, path, &node.id, value);
                }
            }
        }
        if let Some(interventions) = node.interventions() {
            for (factor_id, value) in interventions {
                let path = format!("{}.data.interventions.{}", node_path(idx), factor_id);
                report_non_finite(sink, path, &node.id, *value);
            }
        }
    }

    for (idx, edge) in graph.edges.iter().enumerate() {
        let owner = format!("{}->{}", edge.from, edge.to);
        let fields = [
            ("strength_mean", Some(edge.strength_mean)),
            ("strength_std", edge.strength_std),
            ("belief_exists", edge.belief_exists),
            ("belief", edge.belief),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                report_non_finite(sink, format!("{}.{}", edge_path(idx), field), &owner, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::validate_graph;
    use causeway_core::{IssueCode, NodeBody};
    use causeway_test_utils::minimal_valid_graph;

    #[test]
    fn test_nan_paths_are_exact() {
        let mut graph = minimal_valid_graph();
        graph.edges[4].strength_mean = f64::NAN;
        graph.edges[5].strength_std = Some(f64::INFINITY);
        for node in &mut graph.nodes {
            match &mut node.body {
                NodeBody::Factor { data: Some(data), .. } => data.baseline = Some(f64::NEG_INFINITY),
                NodeBody::Option { data: Some(data) } if node.id == "opt_b" => {
                    data.interventions.insert("fac_price".into(), f64::NAN);
                }
                _ => {}
            }
        }

        let report = validate_graph(&graph, None);
        let mut paths: Vec<&str> = report
            .issues_with_code(IssueCode::NanValue)
            .iter()
            .map(|issue| issue.path.as_str())
            .collect();
        paths.sort_unstable();
        assert_eq!(
            paths,
            vec![
                "edges[4].strength_mean",
                "edges[5].strength_std",
                "nodes[1].data.baseline",
                "nodes[5].data.interventions.fac_price",
            ]
        );
        assert!(!report.valid);
    }

    #[test]
    fn test_finite_graph_has_no_nan_issue() {
        let report = validate_graph(&minimal_valid_graph(), None);
        assert!(!report.has_code(IssueCode::NanValue));
    }
}
