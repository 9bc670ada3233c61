// dot.rs — Graphviz DOT output for combinator DAGs
//
// Renders the decoded arena with one DOT node per slot, so structural
// sharing shows up as fan-in. Output order follows arena indices and is
// fully deterministic.
//
// Preconditions: `dag` is a well-formed DAG.
// Postconditions: returns a valid DOT string.
// Failure modes: none (pure string formatting).
// Side effects: none.

use std::fmt::Write;

use crate::dag::Dag;

/// Emit the DAG as a Graphviz DOT string, root at the top.
pub fn emit_dot(dag: &Dag) -> String {
    let mut buf = String::new();
    writeln!(buf, "digraph mcc {{").unwrap();
    writeln!(buf, "    rankdir=TB;").unwrap();
    writeln!(buf, "    node [fontname=\"Helvetica\", fontsize=10];").unwrap();

    for (idx, node) in dag.nodes().iter().enumerate() {
        let shape = match node.kind.arity() {
            0 => "box",
            _ => "ellipse",
        };
        writeln!(
            buf,
            "    n{} [label=\"{} [{}]\", shape={}];",
            idx,
            node.kind.name(),
            idx,
            shape
        )
        .unwrap();
    }
    writeln!(buf).unwrap();
    for (idx, node) in dag.nodes().iter().enumerate() {
        if let Some(l) = node.left {
            writeln!(buf, "    n{} -> n{} [label=\"L\"];", idx, l).unwrap();
        }
        if let Some(r) = node.right {
            writeln!(buf, "    n{} -> n{} [label=\"R\"];", idx, r).unwrap();
        }
    }
    writeln!(buf, "}}").unwrap();
    buf
}
