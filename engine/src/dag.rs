// dag.rs — Combinator DAG arena
//
// Nodes live in an append-only arena and reference earlier nodes by index,
// never later ones and never themselves. That single invariant rules out
// cycles, makes children-before-parents iteration trivial, and gives every
// later pass O(1) per-node memoization keys.
//
// Preconditions: none.
// Postconditions: every `Dag` value satisfies the back-reference invariant.
// Failure modes: `DagBuilder` panics on out-of-range child indices (builder
//   misuse is a programming error, not input data).
// Side effects: none.

use std::collections::HashMap;
use std::fmt;

// ── Combinator kinds ─────────────────────────────────────────────────────

/// The fixed set of combinator discriminants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombKind {
    /// `iden : A → A`
    Iden,
    /// `unit : A → 1`
    Unit,
    /// `witness : A → B`, with an opaque payload supplied out of band.
    Witness,
    /// `injl t : A → B + C`
    InjL,
    /// `injr t : A → B + C`
    InjR,
    /// `take t : A × B → C`
    Take,
    /// `drop t : A × B → C`
    Drop,
    /// `comp s t : A → C`
    Comp,
    /// `pair s t : A → B × C`
    Pair,
    /// `case s t : (A + B) × C → D`
    Case,
}

impl CombKind {
    /// Number of children this discriminant carries.
    pub fn arity(self) -> usize {
        match self {
            CombKind::Iden | CombKind::Unit | CombKind::Witness => 0,
            CombKind::InjL | CombKind::InjR | CombKind::Take | CombKind::Drop => 1,
            CombKind::Comp | CombKind::Pair | CombKind::Case => 2,
        }
    }

    /// Lowercase name used in displays, DOT labels, and hash tags.
    pub fn name(self) -> &'static str {
        match self {
            CombKind::Iden => "iden",
            CombKind::Unit => "unit",
            CombKind::Witness => "witness",
            CombKind::InjL => "injl",
            CombKind::InjR => "injr",
            CombKind::Take => "take",
            CombKind::Drop => "drop",
            CombKind::Comp => "comp",
            CombKind::Pair => "pair",
            CombKind::Case => "case",
        }
    }
}

// ── Nodes ────────────────────────────────────────────────────────────────

/// One combinator instance. Children are arena indices strictly less than
/// the node's own index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Node {
    pub kind: CombKind,
    pub left: Option<usize>,
    pub right: Option<usize>,
}

impl Node {
    pub fn leaf(kind: CombKind) -> Node {
        debug_assert_eq!(kind.arity(), 0);
        Node {
            kind,
            left: None,
            right: None,
        }
    }

    pub fn unary(kind: CombKind, child: usize) -> Node {
        debug_assert_eq!(kind.arity(), 1);
        Node {
            kind,
            left: Some(child),
            right: None,
        }
    }

    pub fn binary(kind: CombKind, left: usize, right: usize) -> Node {
        debug_assert_eq!(kind.arity(), 2);
        Node {
            kind,
            left: Some(left),
            right: Some(right),
        }
    }

    /// Children in left-to-right order.
    pub fn children(&self) -> impl Iterator<Item = usize> {
        self.left.into_iter().chain(self.right)
    }
}

// ── DAG ──────────────────────────────────────────────────────────────────

/// An immutable combinator DAG. The last node is the program root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dag {
    nodes: Vec<Node>,
}

impl Dag {
    /// Wrap a node list, asserting the back-reference invariant.
    ///
    /// Callers that consume untrusted input (the decoder) check references
    /// themselves so they can report the offending node; this constructor
    /// is for trusted in-process construction.
    pub fn from_nodes(nodes: Vec<Node>) -> Dag {
        assert!(!nodes.is_empty(), "a DAG holds at least one node");
        for (idx, node) in nodes.iter().enumerate() {
            for child in node.children() {
                assert!(child < idx, "child {} of node {} is not earlier", child, idx);
            }
        }
        Dag { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Index of the program root (always the final node).
    pub fn root(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Indices of all witness nodes, in arena order.
    pub fn witness_nodes(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.kind == CombKind::Witness)
            .map(|(i, _)| i)
            .collect()
    }

    /// Structural identity table: `struct_id[i] == struct_id[j]` iff nodes
    /// `i` and `j` are the same sub-DAG (same discriminant, same child
    /// identities, recursively).
    ///
    /// Leaves and the single-child combinators are always distinct: their
    /// types carry node-local free variables, so identifying two physical
    /// instances would couple types that the naive per-node derivation
    /// keeps independent. Two-child combinators over identical children
    /// are safely shared — their types are fully determined by the
    /// children's.
    pub fn struct_ids(&self) -> Vec<usize> {
        let mut ids = Vec::with_capacity(self.nodes.len());
        let mut memo: HashMap<(CombKind, usize, usize), usize> = HashMap::new();
        for (idx, node) in self.nodes.iter().enumerate() {
            let id = match node.kind {
                CombKind::Comp | CombKind::Pair | CombKind::Case => {
                    let key = (
                        node.kind,
                        ids[node.left.unwrap()],
                        ids[node.right.unwrap()],
                    );
                    *memo.entry(key).or_insert(idx)
                }
                _ => idx,
            };
            ids.push(id);
        }
        ids
    }
}

impl fmt::Display for Dag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "dag ({} nodes)", self.nodes.len())?;
        for (idx, node) in self.nodes.iter().enumerate() {
            write!(f, "  [{}] {}", idx, node.kind.name())?;
            if let Some(l) = node.left {
                write!(f, " {}", l)?;
            }
            if let Some(r) = node.right {
                write!(f, " {}", r)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// ── Builder ──────────────────────────────────────────────────────────────

/// Programmatic DAG construction.
///
/// With sharing enabled the builder hash-conses: appending a node equal to
/// an existing one returns the existing index instead of growing the
/// arena. With sharing disabled every append produces a fresh node, which
/// is how tests build the "physically duplicated" rendition of a program.
#[derive(Debug)]
pub struct DagBuilder {
    nodes: Vec<Node>,
    share: bool,
    interned: HashMap<Node, usize>,
}

impl DagBuilder {
    pub fn new() -> Self {
        Self::with_sharing(true)
    }

    pub fn with_sharing(share: bool) -> Self {
        DagBuilder {
            nodes: Vec::new(),
            share,
            interned: HashMap::new(),
        }
    }

    fn push(&mut self, node: Node) -> usize {
        for child in node.children() {
            assert!(child < self.nodes.len(), "child index out of range");
        }
        if self.share {
            if let Some(&idx) = self.interned.get(&node) {
                return idx;
            }
        }
        let idx = self.nodes.len();
        self.nodes.push(node);
        if self.share {
            self.interned.insert(node, idx);
        }
        idx
    }

    pub fn iden(&mut self) -> usize {
        self.push(Node::leaf(CombKind::Iden))
    }

    pub fn unit(&mut self) -> usize {
        self.push(Node::leaf(CombKind::Unit))
    }

    /// Witness nodes are never interned: each carries its own payload and
    /// its own type variables.
    pub fn witness(&mut self) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(Node::leaf(CombKind::Witness));
        idx
    }

    pub fn injl(&mut self, child: usize) -> usize {
        self.push(Node::unary(CombKind::InjL, child))
    }

    pub fn injr(&mut self, child: usize) -> usize {
        self.push(Node::unary(CombKind::InjR, child))
    }

    pub fn take(&mut self, child: usize) -> usize {
        self.push(Node::unary(CombKind::Take, child))
    }

    pub fn drop(&mut self, child: usize) -> usize {
        self.push(Node::unary(CombKind::Drop, child))
    }

    pub fn comp(&mut self, left: usize, right: usize) -> usize {
        self.push(Node::binary(CombKind::Comp, left, right))
    }

    pub fn pair(&mut self, left: usize, right: usize) -> usize {
        self.push(Node::binary(CombKind::Pair, left, right))
    }

    pub fn case(&mut self, left: usize, right: usize) -> usize {
        self.push(Node::binary(CombKind::Case, left, right))
    }

    /// Finish construction. The most recently appended node must be the
    /// intended root.
    pub fn build(self) -> Dag {
        Dag::from_nodes(self.nodes)
    }
}

impl Default for DagBuilder {
    fn default() -> Self {
        Self::new()
    }
}
