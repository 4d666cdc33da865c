//! Tiered graph validator
//!
//! Six tiers run in order over one shared index. No tier short-circuits and
//! no tier can fail: a call always yields the complete problem list.
//!
//! ```text
//! Graph → Index + inferred categories + reachability sweeps
//!       → structural → topology → reachability → factor data → semantic
//!       → numeric → advisories → ValidationReport
//! ```

mod advisory;
mod factor_data;
mod numeric;
mod reachability;
mod semantic;
mod structural;
mod topology;

use crate::report::ValidationReport;
use causeway_core::{
    infer_all, Adjacent, CausewayResult, FactorCategory, Graph, GraphIndex, Issue, NodeKind,
    ValidatorConfig,
};
use std::collections::VecDeque;

// ============================================================================
// SHARED TIER STATE
// ============================================================================

/// Everything a tier may read. Built once per validation call.
pub(crate) struct TierContext<'g> {
    pub index: GraphIndex<'g>,
    pub config: ValidatorConfig,
    /// Inferred category per node position, `None` for non-factors
    pub categories: Vec<Option<FactorCategory>>,
    /// Nodes reachable forward from the decision, when exactly one exists
    pub from_decision: Option<Vec<bool>>,
    /// Nodes with a forward path to the goal, when exactly one exists
    pub reaches_goal: Option<Vec<bool>>,
}

impl<'g> TierContext<'g> {
    pub fn build(graph: &'g Graph, config: ValidatorConfig) -> Self {
        let index = GraphIndex::build(graph);
        let categories = infer_all(&index);
        let from_decision = index
            .unique_of_kind(NodeKind::Decision)
            .map(|start| sweep(&index, start, |idx| index.outgoing(idx)));
        let reaches_goal = index
            .unique_of_kind(NodeKind::Goal)
            .map(|goal| sweep(&index, goal, |idx| index.incoming(idx)));
        Self {
            index,
            config,
            categories,
            from_decision,
            reaches_goal,
        }
    }

    pub fn graph(&self) -> &'g Graph {
        self.index.graph()
    }

    pub fn category(&self, idx: usize) -> Option<FactorCategory> {
        self.categories.get(idx).copied().flatten()
    }

    pub fn id(&self, idx: usize) -> &'g str {
        self.index.node_at(idx).id.as_str()
    }

    /// Decision→option and option→factor edges are scaffolding, not claims.
    pub fn is_structural(&self, from: usize, to: usize) -> bool {
        matches!(
            (self.index.kind_at(from), self.index.kind_at(to)),
            (NodeKind::Decision, NodeKind::Option) | (NodeKind::Option, NodeKind::Factor)
        )
    }
}

/// Breadth-first sweep from `start` following `next`.
fn sweep<'a, F>(index: &GraphIndex<'_>, start: usize, next: F) -> Vec<bool>
where
    F: Fn(usize) -> &'a [Adjacent],
{
    let mut seen = vec![false; index.graph().nodes.len()];
    let mut queue = VecDeque::from([start]);
    seen[start] = true;
    while let Some(idx) = queue.pop_front() {
        for adj in next(idx) {
            if !seen[adj.node] {
                seen[adj.node] = true;
                queue.push_back(adj.node);
            }
        }
    }
    seen
}

/// Issue accumulator.
#[derive(Debug, Default)]
pub(crate) struct IssueSink {
    issues: Vec<Issue>,
}

impl IssueSink {
    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}

pub(crate) fn node_path(idx: usize) -> String {
    format!("nodes[{}]", idx)
}

pub(crate) fn edge_path(idx: usize) -> String {
    format!("edges[{}]", idx)
}

// ============================================================================
// VALIDATOR
// ============================================================================

type Tier = fn(&TierContext<'_>, &mut IssueSink);

/// Tiers in execution order.
const TIERS: [(&str, Tier); 7] = [
    ("structural", structural::check),
    ("topology", topology::check),
    ("reachability", reachability::check),
    ("factor_data", factor_data::check),
    ("semantic", semantic::check),
    ("numeric", numeric::check),
    ("advisory", advisory::check),
];

/// Tiered validator with configurable limits.
#[derive(Debug, Clone, Default)]
pub struct GraphValidator {
    config: ValidatorConfig,
}

impl GraphValidator {
    /// Create a validator, rejecting an inconsistent configuration.
    pub fn new(config: ValidatorConfig) -> CausewayResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Run every tier and return the full issue list.
    pub fn validate(&self, graph: &Graph, request_id: Option<&str>) -> ValidationReport {
        let request_id = request_id.unwrap_or("-");
        let span = tracing::debug_span!("validate_graph", request_id);
        let _guard = span.enter();

        let ctx = TierContext::build(graph, self.config);
        let mut sink = IssueSink::default();
        for (tier, check) in TIERS {
            let before = sink.len();
            check(&ctx, &mut sink);
            tracing::debug!(tier, issues = sink.len() - before, "tier complete");
        }

        let report = ValidationReport::from_issues(sink.into_issues());
        tracing::info!(
            request_id,
            valid = report.valid,
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "graph validated"
        );
        report
    }
}

/// Validate with default limits.
pub fn validate_graph(graph: &Graph, request_id: Option<&str>) -> ValidationReport {
    GraphValidator::default().validate(graph, request_id)
}

// =============================================================================
// TESTS
// =============================================================================
