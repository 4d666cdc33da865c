//! Causeway Check - Graph Validation and Structural Truth Reconciliation
//!
//! Decides whether a causal decision graph is fit to simulate:
//! - Tiered validator: structural, topology, reachability, factor data,
//!   semantic, and numeric tiers plus advisories, never short-circuiting
//! - Structural truth reconciliation: idempotent in-place repair of a bounded
//!   class of defects, with a field-level mutation log
//! - Post-normalisation gate: residual sign consistency
//!
//! None of these fail or panic on malformed content; defects come back as
//! issues and mutations.

pub mod pipeline;
pub mod post_normalise;
pub mod reconcile;
pub mod report;
pub mod validator;

pub use pipeline::{prepare_graph, PipelineOutcome};
pub use post_normalise::validate_graph_post_normalisation;
pub use reconcile::{
    normalise_label, reconcile_structural_truth, reconcile_structural_truth_cloned, split_prefix,
    GoalConstraint, ReconcileOptions, ReconcileOutcome, DEFAULT_FACTOR_TYPE,
    DEFAULT_UNCERTAINTY_DRIVER,
};
pub use report::{PostNormalisationReport, ValidationReport};
pub use validator::{validate_graph, GraphValidator};
