// pipeline.rs — Stage orchestration
//
// Runs decode → infer → witness → commit → cost over raw buffers and
// collects the externally consumed values: three Merkle roots, the static
// cost, and input provenance hashes. Every stage is a pure transformation
// over the previous stage's artifact; the first failure aborts the run
// with no partial result.
//
// Preconditions: none (inputs are untrusted bytes).
// Postconditions: on success all artifacts are populated and reproducible
//   byte-for-byte from the same inputs.
// Failure modes: any stage error (`Error`); budget rejection is the
//   caller's policy, not a stage failure.
// Side effects: per-stage timing lines on stderr when `verbose` is set.

use std::time::Instant;

use serde::Serialize;
use sha2::{Digest as _, Sha256};

use crate::cost::estimate_cost;
use crate::decode::decode_program;
use crate::error::Error;
use crate::infer::{infer_types_with, FreeVarPolicy, TypedDag};
use crate::merkle::{compute_roots, Digest, Roots};
use crate::witness::{decode_witness, WitnessData};

// ── Stages ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Decode,
    Infer,
    Witness,
    Commit,
    Cost,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Decode => "decode",
            Stage::Infer => "infer",
            Stage::Witness => "witness",
            Stage::Commit => "commit",
            Stage::Cost => "cost",
        }
    }
}

// ── Options ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Reject underdetermined programs instead of defaulting free type
    /// variables to unit.
    pub strict_types: bool,
    /// Print per-stage timing to stderr.
    pub verbose: bool,
}

// ── Provenance ───────────────────────────────────────────────────────────

/// SHA-256 fingerprints of the raw input buffers, for hermetic
/// reproducibility checks and cache keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provenance {
    pub program_hash: [u8; 32],
    pub witness_hash: Option<[u8; 32]>,
}

fn sha256(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

fn hex(bytes: &[u8; 32]) -> String {
    let mut s = String::with_capacity(64);
    for b in bytes {
        use std::fmt::Write;
        let _ = write!(s, "{:02x}", b);
    }
    s
}

impl Provenance {
    pub fn compute(program: &[u8], witness: Option<&[u8]>) -> Provenance {
        Provenance {
            program_hash: sha256(program),
            witness_hash: witness.map(sha256),
        }
    }

    pub fn program_hash_hex(&self) -> String {
        hex(&self.program_hash)
    }

    pub fn witness_hash_hex(&self) -> Option<String> {
        self.witness_hash.as_ref().map(hex)
    }
}

// ── Report ───────────────────────────────────────────────────────────────

/// The externally consumed values of one compiled program. Serializes to
/// stable JSON for `--emit report`.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub program_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub witness_hash: Option<String>,
    pub node_count: usize,
    pub commitment: Digest,
    pub identity: Digest,
    pub annotated: Digest,
    pub cost: u64,
}

// ── Compiled artifact ────────────────────────────────────────────────────

/// All artifacts of one successful pipeline run.
#[derive(Debug)]
pub struct Compiled {
    pub typed: TypedDag,
    pub witness: Option<WitnessData>,
    pub roots: Roots,
    pub cost: u64,
    pub provenance: Provenance,
}

impl Compiled {
    pub fn report(&self) -> Report {
        Report {
            program_hash: self.provenance.program_hash_hex(),
            witness_hash: self.provenance.witness_hash_hex(),
            node_count: self.typed.dag().len(),
            commitment: self.roots.commitment,
            identity: self.roots.identity,
            annotated: self.roots.annotated,
            cost: self.cost,
        }
    }
}

// ── Runner ───────────────────────────────────────────────────────────────

fn finish_stage(stage: Stage, started: Instant, verbose: bool) {
    if verbose {
        eprintln!(
            "mcc: {} complete, {:.1}ms",
            stage.name(),
            started.elapsed().as_secs_f64() * 1000.0
        );
    }
}

/// Run the full pipeline over a program buffer and an optional witness
/// buffer.
pub fn run(program: &[u8], witness: Option<&[u8]>, options: &Options) -> Result<Compiled, Error> {
    let provenance = Provenance::compute(program, witness);

    let t = Instant::now();
    let dag = decode_program(program)?;
    finish_stage(Stage::Decode, t, options.verbose);

    let policy = if options.strict_types {
        FreeVarPolicy::Reject
    } else {
        FreeVarPolicy::DefaultUnit
    };
    let t = Instant::now();
    let typed = infer_types_with(dag, policy)?;
    finish_stage(Stage::Infer, t, options.verbose);

    let witness_data = match witness {
        Some(bytes) => {
            let t = Instant::now();
            let data = decode_witness(&typed, bytes)?;
            finish_stage(Stage::Witness, t, options.verbose);
            Some(data)
        }
        None => None,
    };

    let t = Instant::now();
    let roots = compute_roots(&typed);
    finish_stage(Stage::Commit, t, options.verbose);

    let t = Instant::now();
    let cost = estimate_cost(&typed)?;
    finish_stage(Stage::Cost, t, options.verbose);

    Ok(Compiled {
        typed,
        witness: witness_data,
        roots,
        cost,
        provenance,
    })
}
