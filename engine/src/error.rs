// error.rs — Engine error taxonomy
//
// All pipeline stages share one error type. Every variant is terminal for
// the run that produced it: a failing stage yields no DAG, no types, no
// digests, and retrying with the same input reproduces the same failure.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;

// ── Structural decode failures ───────────────────────────────────────────

/// A structural defect in the program or witness bitstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformed {
    /// The buffer ended before the declared content did.
    Truncated,
    /// Bits or bytes remain after the declared content (including nonzero
    /// padding bits in the final byte).
    TrailingData,
    /// A child reference points at the referencing node or a later one.
    ForwardOrSelfReference { node: usize },
    /// An unassigned discriminant prefix code.
    BadPrefixCode,
    /// A variable-length integer exceeded the representable bound.
    NaturalOverflow,
    /// The node-record section decodes to zero nodes.
    EmptyProgram,
    /// The witness blob's declared bit length does not match the total
    /// width of the program's witness types.
    WitnessLengthMismatch { declared: u64, expected: u64 },
}

impl fmt::Display for Malformed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Malformed::Truncated => f.write_str("truncated input"),
            Malformed::TrailingData => f.write_str("trailing data"),
            Malformed::ForwardOrSelfReference { node } => {
                write!(f, "forward or self reference at node {}", node)
            }
            Malformed::BadPrefixCode => f.write_str("bad prefix code"),
            Malformed::NaturalOverflow => f.write_str("natural overflow"),
            Malformed::EmptyProgram => f.write_str("empty program"),
            Malformed::WitnessLengthMismatch { declared, expected } => write!(
                f,
                "witness length mismatch: declared {} bits, program needs {}",
                declared, expected
            ),
        }
    }
}

// ── Type inference failures ──────────────────────────────────────────────

/// A failure of the type inference engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeError {
    /// Two constraints bind the same variable to incompatible shapes.
    Mismatch,
    /// A variable occurs inside its own binding (infinite type).
    OccursCheck,
    /// A type variable is still free after full propagation and root
    /// pinning; the program's types are underdetermined.
    Ambiguous,
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::Mismatch => f.write_str("unification mismatch"),
            TypeError::OccursCheck => f.write_str("occurs check (infinite type)"),
            TypeError::Ambiguous => f.write_str("ambiguous (unconstrained type variable)"),
        }
    }
}

// ── Engine error ─────────────────────────────────────────────────────────

/// Any failure of the decode → infer → commit → cost pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The bitstream does not encode a well-formed DAG.
    MalformedEncoding(Malformed),
    /// The DAG is well-formed but not well-typed.
    Type(TypeError),
    /// The static cost exceeds the representable bound. The estimator is
    /// an upper bound used for admission control, so wraparound is never
    /// acceptable.
    CostOverflow,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MalformedEncoding(m) => write!(f, "malformed encoding: {}", m),
            Error::Type(t) => write!(f, "type error: {}", t),
            Error::CostOverflow => f.write_str("cost overflow"),
        }
    }
}

impl std::error::Error for Error {}

impl From<Malformed> for Error {
    fn from(m: Malformed) -> Error {
        Error::MalformedEncoding(m)
    }
}

impl From<TypeError> for Error {
    fn from(t: TypeError) -> Error {
        Error::Type(t)
    }
}
