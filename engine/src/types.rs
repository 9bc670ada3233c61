// types.rs — Resolved combinator types
//
// The type grammar is unit | sum | prod. Resolved types are immutable,
// `Rc`-shared, and carry two derived values computed once at construction:
// the encoded bit width (used by the cost estimator and the witness
// decoder) and the type Merkle root (used by the annotated program root).
// Sharing matters: deeply shared DAGs produce types whose tree expansion
// is exponential, so nothing in this module ever walks a type as a tree
// except `Display`, which is reserved for small test values.
//
// Preconditions: none.
// Postconditions: equal type structure ⇒ equal `tmr` and `bit_width`.
// Failure modes: none (widths saturate; overflow surfaces later as a cost
//   overflow, never as a wrong small number).
// Side effects: none.

use std::fmt;
use std::rc::Rc;

use crate::merkle::{hash_with_iv, type_iv, Digest};

/// Shape of a resolved type.
#[derive(Debug, Clone)]
pub enum FinalKind {
    Unit,
    Sum(Rc<Final>, Rc<Final>),
    Prod(Rc<Final>, Rc<Final>),
}

/// A fully resolved type.
#[derive(Debug, Clone)]
pub struct Final {
    kind: FinalKind,
    bit_width: u64,
    tmr: Digest,
}

impl Final {
    pub fn unit() -> Rc<Final> {
        Rc::new(Final {
            kind: FinalKind::Unit,
            bit_width: 0,
            tmr: hash_with_iv(type_iv(0), &[]),
        })
    }

    /// A sum value is one tag bit plus the wider arm.
    pub fn sum(left: Rc<Final>, right: Rc<Final>) -> Rc<Final> {
        let bit_width = 1u64.saturating_add(left.bit_width.max(right.bit_width));
        let tmr = hash_with_iv(type_iv(1), &[left.tmr, right.tmr]);
        Rc::new(Final {
            kind: FinalKind::Sum(left, right),
            bit_width,
            tmr,
        })
    }

    /// A product value is both components side by side.
    pub fn prod(left: Rc<Final>, right: Rc<Final>) -> Rc<Final> {
        let bit_width = left.bit_width.saturating_add(right.bit_width);
        let tmr = hash_with_iv(type_iv(2), &[left.tmr, right.tmr]);
        Rc::new(Final {
            kind: FinalKind::Prod(left, right),
            bit_width,
            tmr,
        })
    }

    pub fn kind(&self) -> &FinalKind {
        &self.kind
    }

    /// Number of bits a value of this type occupies on the wire.
    pub fn bit_width(&self) -> u64 {
        self.bit_width
    }

    /// Type Merkle root.
    pub fn tmr(&self) -> Digest {
        self.tmr
    }
}

/// Structural equality via the type Merkle root; never walks the tree.
impl PartialEq for Final {
    fn eq(&self, other: &Final) -> bool {
        self.tmr == other.tmr
    }
}

impl Eq for Final {}

impl fmt::Display for Final {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FinalKind::Unit => f.write_str("1"),
            FinalKind::Sum(l, r) => write!(f, "({} + {})", l, r),
            FinalKind::Prod(l, r) => write!(f, "({} * {})", l, r),
        }
    }
}
