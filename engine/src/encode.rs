// encode.rs — Program and witness serializers
//
// Inverse of the decoder: emits the version-1 wire format for a DAG and
// for a witness payload bitstring. The node-record section is written
// twice — once into a scratch writer to learn its bit length for the
// header, once for real.
//
// Preconditions: `dag` satisfies the back-reference invariant and fits
//   the format's 32-bit naturals (see `encode_program`).
// Postconditions: `decode_program(encode_program(dag))` reproduces `dag`
//   node for node.
// Failure modes: none for inputs within the format bound; oversized
//   inputs panic (encoding is a trusted in-process operation, unlike
//   decoding).
// Side effects: none.

use crate::bits::{BitWriter, NATURAL_MAX};
use crate::dag::{CombKind, Dag};

fn kind_code(kind: CombKind) -> (u64, usize) {
    match kind {
        CombKind::Comp => (0b00, 2),
        CombKind::Pair => (0b010, 3),
        CombKind::Case => (0b011, 3),
        CombKind::InjL => (0b1000, 4),
        CombKind::InjR => (0b1001, 4),
        CombKind::Take => (0b1010, 4),
        CombKind::Drop => (0b1011, 4),
        CombKind::Iden => (0b1100, 4),
        CombKind::Unit => (0b1101, 4),
        CombKind::Witness => (0b1110, 4),
    }
}

fn write_records(writer: &mut BitWriter, dag: &Dag) {
    for (idx, node) in dag.nodes().iter().enumerate() {
        let (code, width) = kind_code(node.kind);
        writer.write_bits(code, width);
        for child in node.children() {
            writer.write_natural((idx - child) as u64);
        }
    }
}

/// Serialize a DAG to the program wire format.
///
/// # Panics
///
/// Wire naturals carry at most 32 bits, so the node-record section is
/// capped at `NATURAL_MAX` bits (on the order of 2^27 nodes). Larger
/// arenas are not representable in format v1.
pub fn encode_program(dag: &Dag) -> Vec<u8> {
    let mut scratch = BitWriter::new();
    write_records(&mut scratch, dag);
    let section_bits = scratch.bits_written() as u64;
    assert!(
        section_bits <= NATURAL_MAX,
        "node-record section of {} bits exceeds the format bound",
        section_bits
    );

    let mut writer = BitWriter::new();
    writer.write_natural(section_bits);
    write_records(&mut writer, dag);
    writer.finish()
}

/// Serialize witness payload bits to the witness wire format.
///
/// The header natural stores `bit length + 1` so that the empty payload
/// (all witness nodes unit-typed, or no witness nodes at all) stays
/// encodable.
///
/// # Panics
///
/// Payloads of `NATURAL_MAX` bits or more overflow the 32-bit header
/// natural.
pub fn encode_witness(payload: &[bool]) -> Vec<u8> {
    let mut writer = BitWriter::new();
    writer.write_natural(payload.len() as u64 + 1);
    for &bit in payload {
        writer.write_bit(bit);
    }
    writer.finish()
}
