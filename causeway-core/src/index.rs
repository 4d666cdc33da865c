//! Graph index: O(1) lookups and adjacency over a borrowed graph
//!
//! Built in one linear pass per call and never cached; the graph it borrows
//! cannot change underneath it.

use crate::{Graph, Node, NodeKind};
use std::collections::HashMap;

/// One hop in an adjacency list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjacent {
    /// Position of the edge in `graph.edges`
    pub edge: usize,
    /// Position of the node at the other end in `graph.nodes`
    pub node: usize,
}

/// Lookup structures over a graph.
#[derive(Debug)]
pub struct GraphIndex<'g> {
    graph: &'g Graph,
    by_id: HashMap<&'g str, usize>,
    shadowed: Vec<bool>,
    endpoints: Vec<Option<(usize, usize)>>,
    outgoing: Vec<Vec<Adjacent>>,
    incoming: Vec<Vec<Adjacent>>,
}

impl<'g> GraphIndex<'g> {
    pub fn build(graph: &'g Graph) -> Self {
        let node_count = graph.nodes.len();
        let mut by_id = HashMap::with_capacity(node_count);
        let mut shadowed = vec![false; node_count];

        for (idx, node) in graph.nodes.iter().enumerate() {
            if by_id.contains_key(node.id.as_str()) {
                shadowed[idx] = true;
            } else {
                by_id.insert(node.id.as_str(), idx);
            }
        }

        let mut outgoing = vec![Vec::new(); node_count];
        let mut incoming = vec![Vec::new(); node_count];
        let mut endpoints = Vec::with_capacity(graph.edges.len());

        for (edge_idx, edge) in graph.edges.iter().enumerate() {
            let resolved = match (by_id.get(edge.from.as_str()), by_id.get(edge.to.as_str())) {
                (Some(&from), Some(&to)) => Some((from, to)),
                _ => None,
            };
            if let Some((from, to)) = resolved {
                outgoing[from].push(Adjacent { edge: edge_idx, node: to });
                incoming[to].push(Adjacent { edge: edge_idx, node: from });
            }
            endpoints.push(resolved);
        }

        Self {
            graph,
            by_id,
            shadowed,
            endpoints,
            outgoing,
            incoming,
        }
    }

    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    /// Position of the first node declared with `id`.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&'g Node> {
        self.position(id).map(|idx| &self.graph.nodes[idx])
    }

    pub fn node_at(&self, idx: usize) -> &'g Node {
        &self.graph.nodes[idx]
    }

    pub fn kind_at(&self, idx: usize) -> NodeKind {
        self.graph.nodes[idx].kind()
    }

    /// A node redeclaring an id already taken by an earlier node.
    pub fn is_shadowed(&self, idx: usize) -> bool {
        self.shadowed.get(idx).copied().unwrap_or(false)
    }

    /// Positions of nodes reachable by id, in declaration order.
    pub fn live_nodes(&self) -> impl Iterator<Item = (usize, &'g Node)> + '_ {
        self.graph
            .nodes
            .iter()
            .enumerate()
            .filter(move |(idx, _)| !self.shadowed[*idx])
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> Vec<usize> {
        self.live_nodes()
            .filter(|(_, node)| node.kind() == kind)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// The single live node of `kind`, or `None` when there are zero or several.
    pub fn unique_of_kind(&self, kind: NodeKind) -> Option<usize> {
        match self.nodes_of_kind(kind).as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// Resolved (from, to) positions of an edge; `None` for a dangling edge.
    pub fn endpoints(&self, edge_idx: usize) -> Option<(usize, usize)> {
        self.endpoints.get(edge_idx).copied().flatten()
    }

    pub fn outgoing(&self, idx: usize) -> &[Adjacent] {
        &self.outgoing[idx]
    }

    pub fn incoming(&self, idx: usize) -> &[Adjacent] {
        &self.incoming[idx]
    }

    /// Resolved edges as (edge position, from position, to position).
    pub fn resolved_edges(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        self.endpoints
            .iter()
            .enumerate()
            .filter_map(|(edge_idx, ends)| ends.map(|(from, to)| (edge_idx, from, to)))
    }
}

// =============================================================================
// TESTS
// =============================================================================


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_first_declaration_wins(
            ids in prop::collection::vec(prop::sample::select(vec!["fac_a", "fac_b", "fac_c", "fac_d"]), 0..12),
        ) {
            let graph = Graph::new(
                ids.iter().map(|id| Node::factor(*id, "F")).collect(),
                vec![],
            );
            let index = GraphIndex::build(&graph);

            for id in &ids {
                let first = ids.iter().position(|other| other == id);
                prop_assert_eq!(index.position(id), first);
            }
            let mut distinct = ids.clone();
            distinct.sort_unstable();
            distinct.dedup();
            prop_assert_eq!(index.live_nodes().count(), distinct.len());
            for (idx, id) in ids.iter().enumerate() {
                prop_assert_eq!(index.is_shadowed(idx), index.position(id) != Some(idx));
            }
        }
    }
}
