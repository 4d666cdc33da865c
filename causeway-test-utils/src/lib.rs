//! CAUSEWAY Test Utilities
//!
//! Centralized test infrastructure for the CAUSEWAY workspace:
//! - A graph builder over the canonical decision scaffold
//! - Fixtures for the standard validation scenarios
//! - Proptest generators for arbitrary (often malformed) graphs
//! - Assertions over issue lists

pub use causeway_core::{
    Edge, EffectDirection, ExtractionType, FactorCategory, FactorData, FactorType, Graph, Issue,
    IssueCode, Lenient, Node, NodeBody, NodeKind,
};

pub use builder::GraphBuilder;
pub use fixtures::*;

// ============================================================================
// GRAPH BUILDER
// ============================================================================

pub mod builder {
    //! Fluent construction of decision graphs.

    use super::*;

    /// Builds graphs on top of the decision/factor/outcome/goal scaffold.
    #[derive(Debug, Clone, Default)]
    pub struct GraphBuilder {
        nodes: Vec<Node>,
        edges: Vec<Edge>,
    }

    impl GraphBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        /// `dec_1`, the controllable `fac_price`, `out_revenue` and `goal_1`,
        /// with the two causal edges rolling price up into the goal. No options.
        pub fn scaffold() -> Self {
            Self::new()
                .node(Node::decision("dec_1", "Set pricing"))
                .node(fixtures::price_factor())
                .node(Node::outcome("out_revenue", "Revenue"))
                .node(Node::goal("goal_1", "Grow revenue"))
                .edge(Edge::causal("fac_price", "out_revenue", 0.6, 0.15, 0.9))
                .edge(Edge::causal("out_revenue", "goal_1", 0.8, 0.1, 0.95))
        }

        pub fn node(mut self, node: Node) -> Self {
            self.nodes.push(node);
            self
        }

        pub fn edge(mut self, edge: Edge) -> Self {
            self.edges.push(edge);
            self
        }

        /// Add an option wired from `dec_1` and into every factor it sets.
        pub fn option<'a, I>(mut self, id: &str, interventions: I) -> Self
        where
            I: IntoIterator<Item = (&'a str, f64)>,
        {
            let interventions: Vec<(&str, f64)> = interventions.into_iter().collect();
            self.edges.push(Edge::structural("dec_1", id));
            for (factor, _) in &interventions {
                self.edges.push(Edge::structural(id, *factor));
            }
            self.nodes
                .push(Node::option(id, format!("Option {}", id), interventions));
            self
        }

        pub fn build(self) -> Graph {
            Graph::new(self.nodes, self.edges)
        }
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built graphs for the standard scenarios.

    use super::*;

    /// The controllable price factor shared by every fixture.
    pub fn price_factor() -> Node {
        Node::factor("fac_price", "Unit price")
            .with_category(FactorCategory::Controllable)
            .with_factor_data(FactorData::controlled(
                100.0,
                ExtractionType::Explicit,
                FactorType::Price,
                vec!["Competitor response".to_string()],
            ))
    }

    /// One decision, two options setting distinct prices, one controllable
    /// factor, one outcome, one goal, canonical scaffolding. Zero issues.
    ///
    /// Node order: `dec_1`, `fac_price`, `out_revenue`, `goal_1`, `opt_a`,
    /// `opt_b`. Edge order: the four structural edges, then
    /// `fac_price -> out_revenue`, then `out_revenue -> goal_1`.
    pub fn minimal_valid_graph() -> Graph {
        Graph::new(
            vec![
                Node::decision("dec_1", "Set pricing"),
                price_factor(),
                Node::outcome("out_revenue", "Revenue"),
                Node::goal("goal_1", "Grow revenue"),
                Node::option("opt_a", "Premium price", [("fac_price", 120.0)]),
                Node::option("opt_b", "Hold price", [("fac_price", 100.0)]),
            ],
            vec![
                Edge::structural("dec_1", "opt_a"),
                Edge::structural("dec_1", "opt_b"),
                Edge::structural("opt_a", "fac_price"),
                Edge::structural("opt_b", "fac_price"),
                Edge::causal("fac_price", "out_revenue", 0.6, 0.15, 0.9),
                Edge::causal("out_revenue", "goal_1", 0.8, 0.1, 0.95),
            ],
        )
    }

    /// Two options with the same `{fac_price: 100}` interventions.
    pub fn identical_options_graph() -> Graph {
        GraphBuilder::scaffold()
            .option("opt_a", [("fac_price", 100.0)])
            .option("opt_b", [("fac_price", 100.0)])
            .build()
    }

    /// The minimal graph with `fac_price` declared observable although
    /// options point at it.
    pub fn mislabelled_controllable_graph() -> Graph {
        let mut graph = minimal_valid_graph();
        for node in &mut graph.nodes {
            if let NodeBody::Factor { category, .. } = &mut node.body {
                *category = Some(FactorCategory::Observable);
            }
        }
        graph
    }

    /// The minimal graph plus a risk that raises the goal.
    pub fn positive_risk_graph() -> Graph {
        let mut graph = minimal_valid_graph();
        graph.nodes.push(Node::risk("risk_1", "Price war"));
        graph
            .edges
            .push(Edge::causal("fac_price", "risk_1", 0.4, 0.2, 0.7));
        graph
            .edges
            .push(Edge::causal("risk_1", "goal_1", 0.5, 0.2, 0.7));
        graph
    }

    /// The minimal graph plus an observable `fac_retention_rate` labelled
    /// "Customer Retention Rate" and an outcome sharing the "retention" stem.
    pub fn retention_graph() -> Graph {
        let mut graph = minimal_valid_graph();
        graph.nodes.push(
            Node::factor("fac_retention_rate", "Customer Retention Rate")
                .with_category(FactorCategory::Observable)
                .with_factor_data(FactorData::observed(0.82, ExtractionType::Explicit)),
        );
        graph
            .nodes
            .push(Node::outcome("out_customer_retention", "Customer retention"));
        graph.edges.push(Edge::causal(
            "fac_retention_rate",
            "out_customer_retention",
            0.7,
            0.1,
            0.85,
        ));
        graph.edges.push(Edge::causal(
            "fac_price",
            "out_customer_retention",
            -0.3,
            0.2,
            0.6,
        ));
        graph.edges.push(Edge::causal(
            "out_customer_retention",
            "goal_1",
            0.5,
            0.1,
            0.8,
        ));
        graph
    }

    /// A valid graph with `factors` controllable factors chained through one
    /// outcome each into the goal, and `options` options setting all of them.
    pub fn wide_graph(factors: usize, options: usize) -> Graph {
        let mut nodes = vec![
            Node::decision("dec_1", "Decide"),
            Node::goal("goal_1", "Goal"),
        ];
        let mut edges = Vec::new();

        for f in 0..factors {
            let factor_id = format!("fac_{}", f);
            let outcome_id = format!("out_{}", f);
            nodes.push(
                Node::factor(factor_id.as_str(), format!("Lever {}", f))
                    .with_category(FactorCategory::Controllable)
                    .with_factor_data(FactorData::controlled(
                        f as f64,
                        ExtractionType::Inferred,
                        FactorType::Cost,
                        vec!["Supplier pricing".to_string()],
                    )),
            );
            nodes.push(Node::outcome(outcome_id.as_str(), format!("Result {}", f)));
            edges.push(Edge::causal(factor_id.as_str(), outcome_id.as_str(), 0.5, 0.1, 0.8));
            edges.push(Edge::causal(outcome_id, "goal_1", 0.4, 0.1, 0.8));
        }

        for o in 0..options {
            let option_id = format!("opt_{}", o);
            let interventions: Vec<(String, f64)> = (0..factors)
                .map(|f| (format!("fac_{}", f), (o * 10 + f) as f64))
                .collect();
            edges.push(Edge::structural("dec_1", option_id.as_str()));
            for (factor_id, _) in &interventions {
                edges.push(Edge::structural(option_id.as_str(), factor_id.as_str()));
            }
            nodes.push(Node::option(option_id, format!("Plan {}", o), interventions));
        }

        Graph::new(nodes, edges)
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for arbitrary decision graphs.
    //!
    //! Ids are drawn from a small pool so generated graphs actually collide,
    //! dangle, and cycle.

    use super::*;
    use proptest::prelude::*;
    use std::fmt::Debug;

    pub const NODE_IDS: &[&str] = &[
        "dec_1",
        "opt_a",
        "opt_b",
        "opt_c",
        "fac_price",
        "fac_demand",
        "fac_market",
        "out_revenue",
        "risk_churn",
        "goal_1",
    ];

    const LABELS: &[&str] = &[
        "Unit price",
        "Market demand",
        "Reach £20k MRR target",
        "Customer Retention Rate",
        "",
    ];

    /// Ids an edge may reference: the node pool plus some that never exist.
    pub const EDGE_ENDPOINTS: &[&str] = &[
        "dec_1",
        "opt_a",
        "opt_b",
        "opt_c",
        "fac_price",
        "fac_demand",
        "fac_market",
        "out_revenue",
        "risk_churn",
        "goal_1",
        "fac_ghost",
        "nowhere",
    ];

    pub fn arb_node_kind() -> impl Strategy<Value = NodeKind> {
        prop::sample::select(NodeKind::ALL.to_vec())
    }

    pub fn arb_factor_category() -> impl Strategy<Value = FactorCategory> {
        prop_oneof![
            Just(FactorCategory::Controllable),
            Just(FactorCategory::Observable),
            Just(FactorCategory::External),
        ]
    }

    /// Mostly ordinary numbers, with the edge cases every check must survive.
    pub fn arb_number() -> impl Strategy<Value = f64> {
        prop_oneof![
            6 => -2.0f64..2.0,
            1 => Just(0.0),
            1 => Just(1.0),
            1 => Just(0.01),
            1 => Just(f64::NAN),
        ]
    }

    /// A lenient enum field that is out of range a quarter of the time.
    pub fn arb_lenient<T, S>(known: S) -> impl Strategy<Value = Lenient<T>>
    where
        T: Debug + Clone + 'static,
        S: Strategy<Value = T> + 'static,
    {
        prop_oneof![
            3 => known.prop_map(Lenient::Known),
            1 => "[a-z]{1,8}".prop_map(Lenient::Unknown),
        ]
    }

    pub fn arb_factor_type() -> impl Strategy<Value = FactorType> {
        prop_oneof![
            Just(FactorType::Cost),
            Just(FactorType::Price),
            Just(FactorType::Time),
            Just(FactorType::Probability),
            Just(FactorType::Revenue),
            Just(FactorType::Demand),
            Just(FactorType::Quality),
            Just(FactorType::Other),
        ]
    }

    pub fn arb_extraction_type() -> impl Strategy<Value = ExtractionType> {
        prop_oneof![
            Just(ExtractionType::Explicit),
            Just(ExtractionType::Inferred),
            Just(ExtractionType::Range),
        ]
    }

    pub fn arb_direction() -> impl Strategy<Value = EffectDirection> {
        prop_oneof![Just(EffectDirection::Positive), Just(EffectDirection::Negative)]
    }

    pub fn arb_factor_data() -> impl Strategy<Value = FactorData> {
        (
            prop::option::of(arb_number()),
            prop::option::of(arb_number()),
            prop::option::of(arb_lenient(arb_extraction_type())),
            prop::option::of(arb_lenient(arb_factor_type())),
            prop::option::of(prop::collection::vec("[A-Za-z ]{1,12}", 0..3)),
        )
            .prop_map(
                |(value, baseline, extraction_type, factor_type, uncertainty_drivers)| FactorData {
                    value,
                    baseline,
                    extraction_type,
                    factor_type,
                    uncertainty_drivers,
                },
            )
    }

    pub fn arb_label() -> impl Strategy<Value = String> {
        prop_oneof![
            prop::sample::select(LABELS).prop_map(String::from),
            "[A-Za-z0-9 %$]{0,16}",
        ]
    }

    pub fn arb_interventions() -> impl Strategy<Value = Vec<(String, f64)>> {
        prop::collection::vec(
            (
                prop::sample::select(EDGE_ENDPOINTS).prop_map(String::from),
                arb_number(),
            ),
            0..3,
        )
    }

    pub fn arb_node() -> impl Strategy<Value = Node> {
        (
            prop::sample::select(NODE_IDS),
            arb_node_kind(),
            arb_label(),
            prop::option::of(arb_factor_category()),
            prop::option::of(arb_factor_data()),
            arb_interventions(),
        )
            .prop_map(|(id, kind, label, category, data, interventions)| match kind {
                NodeKind::Decision => Node::decision(id, label),
                NodeKind::Option => Node::option(id, label, interventions),
                NodeKind::Factor => {
                    let mut node = Node::factor(id, label);
                    node.body = NodeBody::Factor { category, data };
                    node
                }
                NodeKind::Outcome => Node::outcome(id, label),
                NodeKind::Risk => Node::risk(id, label),
                NodeKind::Goal => Node::goal(id, label),
            })
    }

    pub fn arb_edge() -> impl Strategy<Value = Edge> {
        (
            prop::sample::select(EDGE_ENDPOINTS),
            prop::sample::select(EDGE_ENDPOINTS),
            arb_number(),
            prop::option::of(arb_number()),
            prop::option::of(arb_number()),
            prop::option::of(arb_number()),
            prop::option::of(arb_lenient(arb_direction())),
        )
            .prop_map(|(from, to, mean, std, belief_exists, belief, direction)| {
                let mut edge = Edge::new(from, to, mean);
                edge.strength_std = std;
                edge.belief_exists = belief_exists;
                edge.belief = belief;
                edge.effect_direction = direction;
                edge
            })
    }

    /// An arbitrary graph of up to 12 nodes and 24 edges.
    pub fn arb_graph() -> impl Strategy<Value = Graph> {
        (
            prop::collection::vec(arb_node(), 0..12),
            prop::collection::vec(arb_edge(), 0..24),
        )
            .prop_map(|(nodes, edges)| Graph::new(nodes, edges))
    }

    /// The minimal valid graph with extra arbitrary nodes and edges mixed in.
    pub fn arb_scaffolded_graph() -> impl Strategy<Value = Graph> {
        (
            prop::collection::vec(arb_node(), 0..4),
            prop::collection::vec(arb_edge(), 0..8),
        )
            .prop_map(|(nodes, edges)| {
                let mut graph = fixtures::minimal_valid_graph();
                graph.nodes.extend(nodes);
                graph.edges.extend(edges);
                graph
            })
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over issue lists.

    use super::*;

    /// Assert that at least one issue carries `code`.
    #[track_caller]
    pub fn assert_has_code<'a>(issues: impl IntoIterator<Item = &'a Issue>, code: IssueCode) {
        let codes: Vec<IssueCode> = issues.into_iter().map(|issue| issue.code).collect();
        assert!(codes.contains(&code), "Expected {}, got: {:?}", code, codes);
    }

    /// Assert that no issue carries `code`.
    #[track_caller]
    pub fn assert_lacks_code<'a>(issues: impl IntoIterator<Item = &'a Issue>, code: IssueCode) {
        let hits: Vec<&Issue> = issues.into_iter().filter(|issue| issue.code == code).collect();
        assert!(hits.is_empty(), "Expected no {}, got: {:?}", code, hits);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_graph_shape() {
        let graph = minimal_valid_graph();
        assert_eq!(graph.nodes.len(), 6);
        assert_eq!(graph.edges.len(), 6);
        assert_eq!(graph.count_kind(NodeKind::Option), 2);
        assert!(graph.edges[..4].iter().all(Edge::is_canonical_structural));
    }

    #[test]
    fn test_builder_wires_options() {
        let graph = GraphBuilder::scaffold()
            .option("opt_a", [("fac_price", 1.0)])
            .build();
        assert!(graph
            .edges
            .iter()
            .any(|e| e.from == "dec_1" && e.to == "opt_a" && e.is_canonical_structural()));
        assert!(graph
            .edges
            .iter()
            .any(|e| e.from == "opt_a" && e.to == "fac_price"));
    }

    #[test]
    fn test_wide_graph_counts() {
        let graph = wide_graph(10, 4);
        assert_eq!(graph.nodes.len(), 2 + 20 + 4);
        assert_eq!(graph.edges.len(), 20 + 4 + 40);
    }
}
