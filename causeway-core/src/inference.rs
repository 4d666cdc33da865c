//! Structural category inference for factor nodes
//!
//! The true category of a factor never depends on what was declared:
//! - an incoming edge from an option makes it controllable
//! - otherwise a finite `data.value` makes it observable
//! - otherwise it is external

use crate::{FactorCategory, GraphIndex, NodeKind};

/// Whether any option points at the node.
pub fn has_option_parent(index: &GraphIndex<'_>, idx: usize) -> bool {
    index
        .incoming(idx)
        .iter()
        .any(|adj| index.kind_at(adj.node) == NodeKind::Option)
}

/// Inferred category of the node at `idx`; `None` for non-factors.
pub fn infer_category(index: &GraphIndex<'_>, idx: usize) -> Option<FactorCategory> {
    let node = index.node_at(idx);
    if !node.is_factor() {
        return None;
    }
    if has_option_parent(index, idx) {
        return Some(FactorCategory::Controllable);
    }
    match node.factor_data().and_then(|data| data.finite_value()) {
        Some(_) => Some(FactorCategory::Observable),
        None => Some(FactorCategory::External),
    }
}

/// Inferred categories for every node position, `None` for non-factors.
pub fn infer_all(index: &GraphIndex<'_>) -> Vec<Option<FactorCategory>> {
    (0..index.graph().nodes.len())
        .map(|idx| infer_category(index, idx))
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Edge, ExtractionType, FactorData, Graph, Node};

    fn graph_with(factor: Node, edges: Vec<Edge>) -> Graph {
        Graph::new(
            vec![Node::option("opt_a", "A", [("fac_x", 1.0)]), factor],
            edges,
        )
    }

    #[test]
    fn test_option_parent_makes_controllable() {
        let factor = Node::factor("fac_x", "X")
            .with_category(FactorCategory::External)
            .with_factor_data(FactorData::observed(3.0, ExtractionType::Explicit));
        let graph = graph_with(factor, vec![Edge::structural("opt_a", "fac_x")]);
        let index = GraphIndex::build(&graph);
        assert_eq!(infer_category(&index, 1), Some(FactorCategory::Controllable));
    }

    #[test]
    fn test_finite_value_makes_observable() {
        let factor = Node::factor("fac_x", "X")
            .with_factor_data(FactorData::observed(3.0, ExtractionType::Explicit));
        let graph = graph_with(factor, vec![]);
        let index = GraphIndex::build(&graph);
        assert_eq!(infer_category(&index, 1), Some(FactorCategory::Observable));
    }

    #[test]
    fn test_nan_value_is_external() {
        let factor = Node::factor("fac_x", "X")
            .with_factor_data(FactorData::observed(f64::NAN, ExtractionType::Explicit));
        let graph = graph_with(factor, vec![]);
        let index = GraphIndex::build(&graph);
        assert_eq!(infer_category(&index, 1), Some(FactorCategory::External));
    }

    #[test]
    fn test_non_factor_has_no_category() {
        let graph = graph_with(Node::outcome("out_1", "Out"), vec![]);
        let index = GraphIndex::build(&graph);
        assert_eq!(infer_all(&index), vec![None, None]);
    }
}
