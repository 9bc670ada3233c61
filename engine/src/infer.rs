// infer.rs — Type inference over the combinator DAG
//
// Assigns every node a (source, target) type pair by unifying the shape
// constraints of its discriminant against its children's variables, using
// a union-find substitution. Nodes are processed in arena order, so
// children are always solved before their parents.
//
// Type skipping: a node whose structural identity matches an already
// solved node aliases that node's variables outright and contributes no
// fresh constraints. Identification is restricted to the two-child
// combinators (see `Dag::struct_ids`), where the aliased result is
// provably the same one naive re-inference reaches; `infer_types_naive`
// exists so tests can check that equivalence.
//
// Preconditions: `dag` satisfies the back-reference invariant.
// Postconditions: on success every node carries resolved, immutable types
//   and the root is typed `1 → 1`.
// Failure modes: `TypeError::Mismatch` on conflicting constraints,
//   `TypeError::OccursCheck` on an infinite type, `TypeError::Ambiguous`
//   under `FreeVarPolicy::Reject` when variables survive propagation.
// Side effects: none.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::dag::{CombKind, Dag};
use crate::error::TypeError;
use crate::types::Final;

// ── Finalization policy ──────────────────────────────────────────────────

/// What to do with type variables still free after full propagation and
/// root pinning.
///
/// A program whose witness or tower sub-expressions are polymorphic keeps
/// free source-side variables no matter how much context exists; the
/// original engine instantiates those at the unit type. `Reject` is the
/// strict alternative for callers that refuse underdetermined programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeVarPolicy {
    DefaultUnit,
    Reject,
}

// ── Typed result ─────────────────────────────────────────────────────────

/// A DAG plus the resolved type pair of every node.
#[derive(Debug, Clone)]
pub struct TypedDag {
    dag: Dag,
    types: Vec<(Rc<Final>, Rc<Final>)>,
}

impl TypedDag {
    pub fn dag(&self) -> &Dag {
        &self.dag
    }

    pub fn source(&self, idx: usize) -> &Rc<Final> {
        &self.types[idx].0
    }

    pub fn target(&self, idx: usize) -> &Rc<Final> {
        &self.types[idx].1
    }
}

// ── Union-find substitution ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Bound {
    Free,
    Unit,
    Sum(usize, usize),
    Prod(usize, usize),
}

#[derive(Debug, Default)]
struct Unifier {
    parent: Vec<usize>,
    rank: Vec<u8>,
    bound: Vec<Bound>,
}

impl Unifier {
    fn fresh(&mut self) -> usize {
        self.fresh_with(Bound::Free)
    }

    fn fresh_with(&mut self, bound: Bound) -> usize {
        let v = self.parent.len();
        self.parent.push(v);
        self.rank.push(0);
        self.bound.push(bound);
        v
    }

    /// Representative of `v`, with path halving.
    fn find(&mut self, mut v: usize) -> usize {
        while self.parent[v] != v {
            self.parent[v] = self.parent[self.parent[v]];
            v = self.parent[v];
        }
        v
    }

    /// Unify two variables. Iterative worklist, so deeply nested type
    /// structure cannot exhaust the call stack.
    fn unify(&mut self, a: usize, b: usize) -> Result<(), TypeError> {
        let mut work = vec![(a, b)];
        while let Some((a, b)) = work.pop() {
            let ra = self.find(a);
            let rb = self.find(b);
            if ra == rb {
                continue;
            }
            let (hi, lo) = if self.rank[ra] >= self.rank[rb] {
                (ra, rb)
            } else {
                (rb, ra)
            };
            self.parent[lo] = hi;
            if self.rank[hi] == self.rank[lo] {
                self.rank[hi] += 1;
            }
            let merged = match (self.bound[hi], self.bound[lo]) {
                (Bound::Free, other) | (other, Bound::Free) => other,
                (Bound::Unit, Bound::Unit) => Bound::Unit,
                (Bound::Sum(a1, b1), Bound::Sum(a2, b2)) => {
                    work.push((a1, a2));
                    work.push((b1, b2));
                    Bound::Sum(a1, b1)
                }
                (Bound::Prod(a1, b1), Bound::Prod(a2, b2)) => {
                    work.push((a1, a2));
                    work.push((b1, b2));
                    Bound::Prod(a1, b1)
                }
                _ => return Err(TypeError::Mismatch),
            };
            self.bound[hi] = merged;
        }
        Ok(())
    }
}

// ── Constraint generation ────────────────────────────────────────────────

/// Derive (source, target) variables for one node from its discriminant's
/// shape and its children's variables.
fn node_constraints(
    u: &mut Unifier,
    kind: CombKind,
    left: Option<(usize, usize)>,
    right: Option<(usize, usize)>,
) -> Result<(usize, usize), TypeError> {
    Ok(match kind {
        CombKind::Iden => {
            let a = u.fresh();
            (a, a)
        }
        CombKind::Unit => {
            let a = u.fresh();
            let one = u.fresh_with(Bound::Unit);
            (a, one)
        }
        CombKind::Witness => (u.fresh(), u.fresh()),
        CombKind::InjL => {
            let (cs, ct) = left.unwrap();
            let c = u.fresh();
            let s = u.fresh_with(Bound::Sum(ct, c));
            (cs, s)
        }
        CombKind::InjR => {
            let (cs, ct) = left.unwrap();
            let b = u.fresh();
            let s = u.fresh_with(Bound::Sum(b, ct));
            (cs, s)
        }
        CombKind::Take => {
            let (cs, ct) = left.unwrap();
            let b = u.fresh();
            let p = u.fresh_with(Bound::Prod(cs, b));
            (p, ct)
        }
        CombKind::Drop => {
            let (cs, ct) = left.unwrap();
            let a = u.fresh();
            let p = u.fresh_with(Bound::Prod(a, cs));
            (p, ct)
        }
        CombKind::Comp => {
            let (ls, lt) = left.unwrap();
            let (rs, rt) = right.unwrap();
            u.unify(lt, rs)?;
            (ls, rt)
        }
        CombKind::Pair => {
            let (ls, lt) = left.unwrap();
            let (rs, rt) = right.unwrap();
            u.unify(ls, rs)?;
            let p = u.fresh_with(Bound::Prod(lt, rt));
            (ls, p)
        }
        CombKind::Case => {
            let (ls, lt) = left.unwrap();
            let (rs, rt) = right.unwrap();
            let a = u.fresh();
            let b = u.fresh();
            let c = u.fresh();
            let pac = u.fresh_with(Bound::Prod(a, c));
            let pbc = u.fresh_with(Bound::Prod(b, c));
            u.unify(ls, pac)?;
            u.unify(rs, pbc)?;
            u.unify(lt, rt)?;
            let sum = u.fresh_with(Bound::Sum(a, b));
            let src = u.fresh_with(Bound::Prod(sum, c));
            (src, lt)
        }
    })
}

// ── Finalization ─────────────────────────────────────────────────────────

/// Resolve one variable to an immutable type, caching by representative so
/// shared type structure is materialized exactly once.
fn resolve(
    u: &mut Unifier,
    v: usize,
    policy: FreeVarPolicy,
    cache: &mut HashMap<usize, Rc<Final>>,
    in_progress: &mut HashSet<usize>,
) -> Result<Rc<Final>, TypeError> {
    let r = u.find(v);
    if let Some(t) = cache.get(&r) {
        return Ok(t.clone());
    }
    if !in_progress.insert(r) {
        return Err(TypeError::OccursCheck);
    }
    let t = match u.bound[r] {
        Bound::Free => match policy {
            FreeVarPolicy::DefaultUnit => Final::unit(),
            FreeVarPolicy::Reject => return Err(TypeError::Ambiguous),
        },
        Bound::Unit => Final::unit(),
        Bound::Sum(a, b) => {
            let l = resolve(u, a, policy, cache, in_progress)?;
            let r = resolve(u, b, policy, cache, in_progress)?;
            Final::sum(l, r)
        }
        Bound::Prod(a, b) => {
            let l = resolve(u, a, policy, cache, in_progress)?;
            let r = resolve(u, b, policy, cache, in_progress)?;
            Final::prod(l, r)
        }
    };
    in_progress.remove(&r);
    cache.insert(r, t.clone());
    Ok(t)
}

// ── Entry points ─────────────────────────────────────────────────────────

fn infer_with(dag: Dag, policy: FreeVarPolicy, skipping: bool) -> Result<TypedDag, TypeError> {
    let mut u = Unifier::default();
    let struct_ids = dag.struct_ids();
    let mut vars: Vec<(usize, usize)> = Vec::with_capacity(dag.len());

    for idx in 0..dag.len() {
        if skipping && struct_ids[idx] < idx {
            // Same sub-DAG as an earlier node: alias its solved variables.
            vars.push(vars[struct_ids[idx]]);
            continue;
        }
        let node = dag.node(idx);
        let left = node.left.map(|c| vars[c]);
        let right = node.right.map(|c| vars[c]);
        let pair = node_constraints(&mut u, node.kind, left, right)?;
        vars.push(pair);
    }

    // Program contract: the root consumes and produces the unit value.
    let (root_src, root_tgt) = vars[dag.root()];
    let one_s = u.fresh_with(Bound::Unit);
    let one_t = u.fresh_with(Bound::Unit);
    u.unify(root_src, one_s)?;
    u.unify(root_tgt, one_t)?;

    let mut cache = HashMap::new();
    let mut types = Vec::with_capacity(dag.len());
    for &(s, t) in &vars {
        let mut in_progress = HashSet::new();
        let src = resolve(&mut u, s, policy, &mut cache, &mut in_progress)?;
        in_progress.clear();
        let tgt = resolve(&mut u, t, policy, &mut cache, &mut in_progress)?;
        types.push((src, tgt));
    }
    Ok(TypedDag { dag, types })
}

/// Infer types with structural memoization and unit defaulting.
pub fn infer_types(dag: Dag) -> Result<TypedDag, TypeError> {
    infer_with(dag, FreeVarPolicy::DefaultUnit, true)
}

/// Infer types under an explicit free-variable policy.
pub fn infer_types_with(dag: Dag, policy: FreeVarPolicy) -> Result<TypedDag, TypeError> {
    infer_with(dag, policy, true)
}

/// Re-infer every node even when a structurally identical sub-DAG was
/// already solved. Exists to demonstrate that skipping is a pure
/// optimization; production callers want `infer_types`.
pub fn infer_types_naive(dag: Dag) -> Result<TypedDag, TypeError> {
    infer_with(dag, FreeVarPolicy::DefaultUnit, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::DagBuilder;

    #[test]
    fn iden_program_types_as_unit_to_unit() {
        let mut b = DagBuilder::new();
        b.iden();
        let typed = infer_types(b.build()).unwrap();
        assert_eq!(typed.source(0), &Final::unit());
        assert_eq!(typed.target(0), &Final::unit());
    }

    #[test]
    fn comp_propagates_intermediate_type() {
        // pair(unit, unit) ; take(iden) — intermediate type is 1 × 1.
        let mut b = DagBuilder::new();
        let u1 = b.unit();
        let p = b.pair(u1, u1);
        let i = b.iden();
        let t = b.take(i);
        b.comp(p, t);
        let typed = infer_types(b.build()).unwrap();
        let prod_unit = Final::prod(Final::unit(), Final::unit());
        assert_eq!(typed.target(p), &prod_unit);
        assert_eq!(typed.source(t), &prod_unit);
    }

    #[test]
    fn case_joins_branch_targets() {
        // case(take iden, drop iden) driven by a witness-selected sum.
        let mut b = DagBuilder::new();
        let w = b.witness();
        let i = b.iden();
        let tk = b.take(i);
        let dr = b.drop(i);
        let cs = b.case(tk, dr);
        let c1 = b.comp(w, cs);
        let u = b.unit();
        b.comp(c1, u);
        let typed = infer_types(b.build()).unwrap();
        assert_eq!(typed.target(tk), typed.target(dr));
        assert_eq!(typed.target(cs), typed.target(tk));
    }

    #[test]
    fn mismatch_detected() {
        // comp(pair(unit, unit), case(...)): case needs a sum on the left
        // of its source product, pair supplies unit.
        let mut b = DagBuilder::new();
        let u1 = b.unit();
        let p = b.pair(u1, u1);
        let i = b.iden();
        let tk = b.take(i);
        let dr = b.drop(i);
        let cs = b.case(tk, dr);
        b.comp(p, cs);
        assert_eq!(infer_types(b.build()).unwrap_err(), TypeError::Mismatch);
    }

    #[test]
    fn root_contract_rejects_nonunit_target() {
        // injl(unit) : 1 → 1 + C cannot be a whole program.
        let mut b = DagBuilder::new();
        let u = b.unit();
        b.injl(u);
        assert_eq!(infer_types(b.build()).unwrap_err(), TypeError::Mismatch);
    }

    #[test]
    fn strict_policy_rejects_free_variables() {
        // comp(witness, unit): the witness target stays unconstrained.
        let mut b = DagBuilder::new();
        let w = b.witness();
        let u = b.unit();
        b.comp(w, u);
        let dag = b.build();
        assert_eq!(
            infer_types_with(dag.clone(), FreeVarPolicy::Reject).unwrap_err(),
            TypeError::Ambiguous
        );
        // The default policy instantiates it at unit instead.
        let typed = infer_types(dag).unwrap();
        assert_eq!(typed.target(w), &Final::unit());
    }

    #[test]
    fn occurs_check_detected() {
        // comp(pair(iden, iden), case(take(iden), iden)), kept away from
        // the root contract behind witness/unit composition. The case arm
        // forces A ~ B × C while the pair side forces C ~ A + B, so A
        // contains itself.
        let mut b = DagBuilder::with_sharing(false);
        let i1 = b.iden();
        let tk = b.take(i1);
        let i2 = b.iden();
        let cs = b.case(tk, i2);
        let i3 = b.iden();
        let p = b.pair(i3, i3);
        let pc = b.comp(p, cs);
        let w = b.witness();
        let wpc = b.comp(w, pc);
        let u = b.unit();
        b.comp(wpc, u);
        assert_eq!(infer_types(b.build()).unwrap_err(), TypeError::OccursCheck);
    }

    #[test]
    fn skipping_matches_naive_on_duplicated_structure() {
        // Physically duplicated pair towers over shared children: with
        // sharing disabled the duplicates occupy distinct arena slots but
        // carry equal struct ids, so the skip path actually fires.
        let build = |share: bool| {
            let mut b = DagBuilder::with_sharing(share);
            let w = b.witness();
            let i = b.iden();
            let t1 = b.take(i);
            let d1 = b.drop(i);
            let l1 = b.pair(t1, d1);
            let t2 = b.take(l1);
            let d2 = b.drop(l1);
            let l2a = b.pair(t2, d2);
            let l2b = b.pair(t2, d2);
            let c = b.case(l2a, l2b);
            let wc = b.comp(w, c);
            let u = b.unit();
            b.comp(wc, u);
            b.build()
        };
        assert_eq!(build(true).len() + 1, build(false).len());
        for share in [true, false] {
            let dag = build(share);
            let skip = infer_types(dag.clone()).unwrap();
            let naive = infer_types_naive(dag).unwrap();
            for idx in 0..skip.dag().len() {
                assert_eq!(skip.source(idx), naive.source(idx), "src of node {}", idx);
                assert_eq!(skip.target(idx), naive.target(idx), "tgt of node {}", idx);
            }
        }
    }
}
