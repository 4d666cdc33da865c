//! Fuzz test for the graph pipeline
//!
//! Feeds arbitrary JSON through reconciliation, validation and the
//! post-normalisation gate. Any input that deserializes into a graph must
//! come out the other side without a panic, and reconciliation must settle
//! after one pass.
//!
//! Run with: cargo +nightly fuzz run graph_fuzz -- -max_total_time=60

#![no_main]

use causeway_check::{
    prepare_graph, reconcile_structural_truth, GraphValidator, ReconcileOptions,
};
use causeway_core::Graph;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(mut graph) = serde_json::from_slice::<Graph>(data) else {
        return;
    };

    let mut options = ReconcileOptions::default();
    let outcome = prepare_graph(&mut graph, Some(&mut options), &GraphValidator::default(), None);

    // A reconciled graph never fails the sign gate
    assert!(outcome.post.valid, "sign mismatch after reconcile: {:?}", outcome.post.errors);

    let again = reconcile_structural_truth(&mut graph, &mut options);
    assert!(again.is_noop(), "second reconcile mutated: {:?}", again.mutations);
});
