// cost.rs — Static execution weight estimator
//
// One bottom-up pass over the typed DAG producing milli-weight-units. A
// node's contribution is a fixed base for its discriminant plus terms in
// its operand bit widths; children contribute once per *reference*, since
// execution expands sharing (the memo table keeps the walk itself linear).
// `case` takes the worst branch, not the sum — only one branch runs.
//
// The result is an admission-control upper bound, so arithmetic is
// checked: exceeding the representable range is the fatal `CostOverflow`,
// never a silent wrap.
//
// Preconditions: `typed` is a fully typed DAG.
// Postconditions: cost is monotonically non-decreasing in DAG size.
// Failure modes: `Error::CostOverflow`.
// Side effects: none.

use crate::dag::CombKind;
use crate::error::Error;
use crate::infer::TypedDag;

// ── Weight table (milli-weight-units) ────────────────────────────────────

/// Dispatch overhead paid by every node.
pub const NODE_OVERHEAD: u64 = 10;

/// Extra charged per bit moved or inspected.
pub const PER_BIT: u64 = 1;

fn base_cost(kind: CombKind) -> u64 {
    match kind {
        CombKind::Iden | CombKind::Unit | CombKind::Witness => NODE_OVERHEAD,
        CombKind::InjL | CombKind::InjR => NODE_OVERHEAD + 1,
        CombKind::Take | CombKind::Drop => NODE_OVERHEAD,
        CombKind::Comp | CombKind::Pair => NODE_OVERHEAD,
        CombKind::Case => NODE_OVERHEAD + 1,
    }
}

// ── Estimator ────────────────────────────────────────────────────────────

/// Estimate the static execution weight of a typed program.
pub fn estimate_cost(typed: &TypedDag) -> Result<u64, Error> {
    let dag = typed.dag();
    let mut costs: Vec<u64> = Vec::with_capacity(dag.len());
    for (idx, node) in dag.nodes().iter().enumerate() {
        let cost = node_cost(typed, idx, node.kind, &costs).ok_or(Error::CostOverflow)?;
        costs.push(cost);
    }
    Ok(costs[dag.root()])
}

fn width_term(width: u64) -> Option<u64> {
    width.checked_mul(PER_BIT)
}

fn node_cost(typed: &TypedDag, idx: usize, kind: CombKind, costs: &[u64]) -> Option<u64> {
    let node = typed.dag().node(idx);
    let base = base_cost(kind);
    match kind {
        // Copies its whole input.
        CombKind::Iden => base.checked_add(width_term(typed.source(idx).bit_width())?),
        CombKind::Unit => Some(base),
        // Reads its payload off the witness stream.
        CombKind::Witness => base.checked_add(width_term(typed.target(idx).bit_width())?),
        CombKind::InjL | CombKind::InjR | CombKind::Take | CombKind::Drop => {
            base.checked_add(costs[node.left.unwrap()])
        }
        // Materializes the intermediate value between its halves.
        CombKind::Comp => {
            let left = node.left.unwrap();
            base.checked_add(width_term(typed.target(left).bit_width())?)?
                .checked_add(costs[left])?
                .checked_add(costs[node.right.unwrap()])
        }
        CombKind::Pair => base
            .checked_add(costs[node.left.unwrap()])?
            .checked_add(costs[node.right.unwrap()]),
        // Only one branch executes: worst case, not the sum.
        CombKind::Case => {
            let branch = costs[node.left.unwrap()].max(costs[node.right.unwrap()]);
            base.checked_add(width_term(typed.source(idx).bit_width())?)?
                .checked_add(branch)
        }
    }
}

/// Pre-execution admission control: a program is admitted only when its
/// static weight fits the caller's budget.
pub fn within_budget(cost: u64, budget: u64) -> bool {
    cost <= budget
}
