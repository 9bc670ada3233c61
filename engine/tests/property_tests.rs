// Property-based tests for engine invariants.
//
// Three categories:
// 1. Wire roundtrip: any well-formed DAG survives encode → decode
// 2. Skipping soundness: type skipping never changes inference results
// 3. Determinism: identical inputs produce identical artifacts
//
// Uses proptest with explicit configuration to prevent CI flakiness.

use proptest::prelude::*;

use mcc::dag::{CombKind, Dag, Node};
use mcc::decode::decode_program;
use mcc::encode::encode_program;
use mcc::infer::{infer_types, infer_types_naive};
use mcc::merkle::compute_roots;
use mcc::pipeline;

// ── DAG generator ───────────────────────────────────────────────────────────

const LEAF_KINDS: [CombKind; 3] = [CombKind::Iden, CombKind::Unit, CombKind::Witness];
const UNARY_KINDS: [CombKind; 4] = [
    CombKind::InjL,
    CombKind::InjR,
    CombKind::Take,
    CombKind::Drop,
];
const BINARY_KINDS: [CombKind; 3] = [CombKind::Comp, CombKind::Pair, CombKind::Case];

/// Generate a structurally well-formed DAG: every child reference points
/// strictly backward. No attempt is made to keep the program well-typed;
/// the type-level properties compare *results*, failures included.
fn arb_dag() -> impl Strategy<Value = Dag> {
    prop::collection::vec((any::<u8>(), any::<u64>(), any::<u64>()), 1..40).prop_map(|raw| {
        let mut nodes = Vec::with_capacity(raw.len());
        for (idx, (sel, l, r)) in raw.into_iter().enumerate() {
            let node = if idx == 0 {
                Node::leaf(LEAF_KINDS[sel as usize % LEAF_KINDS.len()])
            } else {
                match sel % 10 {
                    0..=2 => Node::leaf(LEAF_KINDS[sel as usize % LEAF_KINDS.len()]),
                    3..=6 => Node::unary(
                        UNARY_KINDS[sel as usize % UNARY_KINDS.len()],
                        (l % idx as u64) as usize,
                    ),
                    _ => Node::binary(
                        BINARY_KINDS[sel as usize % BINARY_KINDS.len()],
                        (l % idx as u64) as usize,
                        (r % idx as u64) as usize,
                    ),
                }
            };
            nodes.push(node);
        }
        Dag::from_nodes(nodes)
    })
}

// ── 1. Wire roundtrip ───────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 200,
        .. ProptestConfig::default()
    })]

    #[test]
    fn encode_decode_roundtrip(dag in arb_dag()) {
        let bytes = encode_program(&dag);
        let decoded = decode_program(&bytes);
        prop_assert!(decoded.is_ok(), "decode failed: {:?}", decoded.err());
        let decoded = decoded.unwrap();
        prop_assert_eq!(decoded.nodes(), dag.nodes());
    }

    #[test]
    fn encoding_is_deterministic(dag in arb_dag()) {
        prop_assert_eq!(encode_program(&dag), encode_program(&dag));
    }
}

// ── 2. Skipping soundness ───────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 200,
        .. ProptestConfig::default()
    })]

    #[test]
    fn skipping_never_changes_inference(dag in arb_dag()) {
        let skipped = infer_types(dag.clone());
        let naive = infer_types_naive(dag);
        match (skipped, naive) {
            (Ok(a), Ok(b)) => {
                for idx in 0..a.dag().len() {
                    prop_assert_eq!(a.source(idx).tmr(), b.source(idx).tmr());
                    prop_assert_eq!(a.target(idx).tmr(), b.target(idx).tmr());
                }
                prop_assert_eq!(compute_roots(&a), compute_roots(&b));
            }
            // Which of several simultaneous violations is reported first
            // may differ; only acceptance must agree.
            (Err(_), Err(_)) => {}
            (a, b) => prop_assert!(
                false,
                "skipping diverged: skipped={:?} naive={:?}",
                a.is_ok(),
                b.is_ok()
            ),
        }
    }
}

// ── 3. Determinism ──────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        max_shrink_iters: 100,
        .. ProptestConfig::default()
    })]

    #[test]
    fn pipeline_is_deterministic(dag in arb_dag()) {
        let bytes = encode_program(&dag);
        let options = pipeline::Options::default();
        let first = pipeline::run(&bytes, None, &options);
        let second = pipeline::run(&bytes, None, &options);
        match (first, second) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a.roots, b.roots);
                prop_assert_eq!(a.cost, b.cost);
                prop_assert_eq!(
                    serde_json::to_string(&a.report()).unwrap(),
                    serde_json::to_string(&b.report()).unwrap()
                );
            }
            (Err(a), Err(b)) => prop_assert_eq!(a, b),
            _ => prop_assert!(false, "pipeline result diverged between runs"),
        }
    }
}
