// merkle.rs — Merkle root computation over the combinator DAG
//
// Three independent 256-bit roots are derived from one DAG:
//   commitment — structure only; witness payloads and types erased;
//   identity   — structure plus the semantic identity tag of each
//                primitive leaf operation; types and payloads erased;
//   annotated  — structure plus the full source/target type annotation of
//                every node; witness payloads still excluded, so programs
//                differing only in witness data share all three roots.
//
// Every per-node digest is SHA-256 over a domain-separating tag IV
// followed by that node's inputs. Digests are cached by arena index, so a
// node referenced N times is hashed once and its digest reused N times —
// the hash tree mirrors the DAG's sharing instead of re-expanding it.
//
// Preconditions: commitment/identity take any well-formed DAG; annotated
//   requires a fully typed DAG.
// Postconditions: pure functions of (structure, kind); identical structure
//   gives identical digests.
// Failure modes: none.
// Side effects: none.

use std::fmt;
use std::sync::OnceLock;

use serde::{Serialize, Serializer};
use sha2::{Digest as _, Sha256};

use crate::dag::{CombKind, Dag};
use crate::infer::TypedDag;

// ── Digest value ─────────────────────────────────────────────────────────

/// A 256-bit digest, eight big-endian u32 words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest(pub [u32; 8]);

impl Digest {
    pub fn from_bytes(bytes: [u8; 32]) -> Digest {
        let mut words = [0u32; 8];
        for (i, word) in words.iter_mut().enumerate() {
            *word = u32::from_be_bytes([
                bytes[4 * i],
                bytes[4 * i + 1],
                bytes[4 * i + 2],
                bytes[4 * i + 3],
            ]);
        }
        Digest(words)
    }

    pub fn to_bytes(self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for (i, word) in self.0.iter().enumerate() {
            bytes[4 * i..4 * i + 4].copy_from_slice(&word.to_be_bytes());
        }
        bytes
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for word in &self.0 {
            write!(f, "{:08x}", word)?;
        }
        Ok(())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

// ── Tag IVs ──────────────────────────────────────────────────────────────
//
// Format version 1 tag layout: `mcc\x1fv1\x1f<namespace>\x1f<name>`, hashed
// once with SHA-256 to produce the per-(namespace, name) IV. The tables
// are built on first use and never mutated afterward.

const TAG_PREFIX: &str = "mcc\x1fv1\x1f";

fn tag_iv(namespace: &str, name: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(TAG_PREFIX.as_bytes());
    hasher.update(namespace.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(name.as_bytes());
    hasher.finalize().into()
}

const ALL_KINDS: [CombKind; 10] = [
    CombKind::Iden,
    CombKind::Unit,
    CombKind::Witness,
    CombKind::InjL,
    CombKind::InjR,
    CombKind::Take,
    CombKind::Drop,
    CombKind::Comp,
    CombKind::Pair,
    CombKind::Case,
];

fn kind_slot(kind: CombKind) -> usize {
    ALL_KINDS.iter().position(|&k| k == kind).unwrap()
}

fn kind_ivs(namespace: &'static str, cell: &'static OnceLock<[[u8; 32]; 10]>) -> &'static [[u8; 32]; 10] {
    cell.get_or_init(|| {
        let mut ivs = [[0u8; 32]; 10];
        for (slot, kind) in ALL_KINDS.iter().enumerate() {
            ivs[slot] = tag_iv(namespace, kind.name());
        }
        ivs
    })
}

static COMMITMENT_IVS: OnceLock<[[u8; 32]; 10]> = OnceLock::new();
static IDENTITY_IVS: OnceLock<[[u8; 32]; 10]> = OnceLock::new();
static ANNOTATED_IVS: OnceLock<[[u8; 32]; 10]> = OnceLock::new();
static TYPE_IVS: OnceLock<[[u8; 32]; 3]> = OnceLock::new();

/// IV for the type grammar: slot 0 = unit, 1 = sum, 2 = prod.
pub(crate) fn type_iv(slot: usize) -> &'static [u8; 32] {
    let ivs = TYPE_IVS.get_or_init(|| {
        [
            tag_iv("type", "unit"),
            tag_iv("type", "sum"),
            tag_iv("type", "prod"),
        ]
    });
    &ivs[slot]
}

/// SHA-256 of an IV followed by a sequence of digest inputs.
pub(crate) fn hash_with_iv(iv: &[u8; 32], parts: &[Digest]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(iv);
    for part in parts {
        hasher.update(part.to_bytes());
    }
    Digest::from_bytes(hasher.finalize().into())
}

// ── Root folds ───────────────────────────────────────────────────────────

/// Fold over the DAG where each node hashes only its kind tag and the
/// cached digests of its children.
fn structural_fold(dag: &Dag, ivs: &'static [[u8; 32]; 10]) -> Digest {
    let mut digests: Vec<Digest> = Vec::with_capacity(dag.len());
    for node in dag.nodes() {
        let children: Vec<Digest> = node.children().map(|c| digests[c]).collect();
        digests.push(hash_with_iv(&ivs[kind_slot(node.kind)], &children));
    }
    digests[dag.root()]
}

/// Commitment root: structure only.
pub fn commitment_root(dag: &Dag) -> Digest {
    structural_fold(dag, kind_ivs("commitment", &COMMITMENT_IVS))
}

/// Identity root: structure plus the semantic identity of each primitive
/// operation, under its own namespace so it is never comparable to the
/// commitment root.
pub fn identity_root(dag: &Dag) -> Digest {
    structural_fold(dag, kind_ivs("identity", &IDENTITY_IVS))
}

/// Annotated root: structure plus every node's resolved source and target
/// type roots. Witness nodes commit to their type, never their payload.
pub fn annotated_root(typed: &TypedDag) -> Digest {
    let ivs = kind_ivs("annotated", &ANNOTATED_IVS);
    let dag = typed.dag();
    let mut digests: Vec<Digest> = Vec::with_capacity(dag.len());
    for (idx, node) in dag.nodes().iter().enumerate() {
        let mut parts = vec![typed.source(idx).tmr(), typed.target(idx).tmr()];
        parts.extend(node.children().map(|c| digests[c]));
        digests.push(hash_with_iv(&ivs[kind_slot(node.kind)], &parts));
    }
    digests[dag.root()]
}

/// All three roots of one typed DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Roots {
    pub commitment: Digest,
    pub identity: Digest,
    pub annotated: Digest,
}

pub fn compute_roots(typed: &TypedDag) -> Roots {
    Roots {
        commitment: commitment_root(typed.dag()),
        identity: identity_root(typed.dag()),
        annotated: annotated_root(typed),
    }
}
