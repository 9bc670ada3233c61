// decode.rs — Program bitstream decoder
//
// Reconstructs a combinator DAG from the version-1 wire format: a natural
// giving the bit length of the node-record section, then prefix-coded node
// records until exactly that many bits are consumed, then zero padding to
// the byte boundary. Sharing in the source program arrives as multiple
// back-references to one arena slot and is preserved as-is.
//
// Preconditions: none (input is untrusted bytes).
// Postconditions: on success the returned DAG satisfies the back-reference
//   invariant; on failure no partial DAG is observable.
// Failure modes: every defect is a specific `Malformed` variant; decoding
//   never panics on any input.
// Side effects: none.

use crate::bits::BitReader;
use crate::dag::{CombKind, Dag, Node};
use crate::error::Malformed;

// ── Discriminant prefix code ─────────────────────────────────────────────
//
// Two-child combinators dominate real programs and get the short codes:
//
//   comp    00          injl 1000    iden    1100
//   pair    010         injr 1001    unit    1101
//   case    011         take 1010    witness 1110
//                       drop 1011    (1111 unassigned)

fn read_kind(reader: &mut BitReader<'_>) -> Result<CombKind, Malformed> {
    if !reader.read_bit()? {
        return if reader.read_bit()? {
            if reader.read_bit()? {
                Ok(CombKind::Case)
            } else {
                Ok(CombKind::Pair)
            }
        } else {
            Ok(CombKind::Comp)
        };
    }
    match reader.read_bits(3)? {
        0b000 => Ok(CombKind::InjL),
        0b001 => Ok(CombKind::InjR),
        0b010 => Ok(CombKind::Take),
        0b011 => Ok(CombKind::Drop),
        0b100 => Ok(CombKind::Iden),
        0b101 => Ok(CombKind::Unit),
        0b110 => Ok(CombKind::Witness),
        _ => Err(Malformed::BadPrefixCode),
    }
}

/// Read one child back-reference for the node being built at `idx`.
///
/// The wire carries the distance `d ≥ 1` back from the current node; a
/// distance reaching past slot 0 cannot name an earlier node, which is the
/// forward-or-self defect class.
fn read_child(reader: &mut BitReader<'_>, idx: usize) -> Result<usize, Malformed> {
    let delta = reader.read_natural()?;
    if delta > idx as u64 {
        return Err(Malformed::ForwardOrSelfReference { node: idx });
    }
    Ok(idx - delta as usize)
}

// ── Decoder ──────────────────────────────────────────────────────────────

/// Decode a program buffer into a combinator DAG.
pub fn decode_program(bytes: &[u8]) -> Result<Dag, Malformed> {
    if bytes.is_empty() {
        return Err(Malformed::EmptyProgram);
    }
    let mut reader = BitReader::new(bytes);
    let declared = reader.read_natural()? as usize;
    let section_start = reader.bits_read();

    let mut nodes: Vec<Node> = Vec::new();
    while reader.bits_read() - section_start < declared {
        let idx = nodes.len();
        let kind = read_kind(&mut reader)?;
        let node = match kind.arity() {
            0 => Node::leaf(kind),
            1 => Node::unary(kind, read_child(&mut reader, idx)?),
            _ => {
                let left = read_child(&mut reader, idx)?;
                let right = read_child(&mut reader, idx)?;
                Node::binary(kind, left, right)
            }
        };
        if reader.bits_read() - section_start > declared {
            // The declared length cuts through this record.
            return Err(Malformed::Truncated);
        }
        nodes.push(node);
    }
    if nodes.is_empty() {
        return Err(Malformed::EmptyProgram);
    }
    reader.finish()?;
    Ok(Dag::from_nodes(nodes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::BitWriter;
    use crate::encode::encode_program;

    /// `comp iden unit` encoded by hand: 14 record bits — iden = "1100",
    /// unit = "1101", comp = "00" + delta 2 = "100" + delta 1 = "0".
    fn comp_iden_unit_bytes() -> Vec<u8> {
        let mut w = BitWriter::new();
        w.write_natural(14);
        w.write_bits(0b1100, 4);
        w.write_bits(0b1101, 4);
        w.write_bits(0b00, 2);
        w.write_natural(2);
        w.write_natural(1);
        w.finish()
    }

    #[test]
    fn decodes_hand_built_program() {
        let dag = decode_program(&comp_iden_unit_bytes()).unwrap();
        assert_eq!(dag.len(), 3);
        assert_eq!(dag.node(0).kind, CombKind::Iden);
        assert_eq!(dag.node(1).kind, CombKind::Unit);
        assert_eq!(dag.node(2), &Node::binary(CombKind::Comp, 0, 1));
    }

    #[test]
    fn empty_buffer_is_empty_program() {
        assert_eq!(decode_program(&[]), Err(Malformed::EmptyProgram));
    }

    #[test]
    fn truncated_buffer_rejected() {
        let bytes = comp_iden_unit_bytes();
        for cut in 1..bytes.len() {
            assert_eq!(
                decode_program(&bytes[..cut]),
                Err(Malformed::Truncated),
                "prefix of {} bytes must be truncated",
                cut
            );
        }
    }

    #[test]
    fn declared_length_mid_record_rejected() {
        // Same records as comp_iden_unit but length understated by one bit.
        let mut w = BitWriter::new();
        w.write_natural(13);
        w.write_bits(0b1100, 4);
        w.write_bits(0b1101, 4);
        w.write_bits(0b00, 2);
        w.write_natural(2);
        w.write_natural(1);
        let bytes = w.finish();
        assert_eq!(decode_program(&bytes), Err(Malformed::Truncated));
    }

    #[test]
    fn trailing_byte_rejected() {
        let mut bytes = comp_iden_unit_bytes();
        bytes.push(0x00);
        assert_eq!(decode_program(&bytes), Err(Malformed::TrailingData));
    }

    #[test]
    fn nonzero_padding_rejected() {
        let mut bytes = comp_iden_unit_bytes();
        // 21 content bits leave 3 padding bits in the final byte.
        let last = bytes.len() - 1;
        bytes[last] |= 0x01;
        assert_eq!(decode_program(&bytes), Err(Malformed::TrailingData));
    }

    #[test]
    fn bad_prefix_code_rejected() {
        let mut w = BitWriter::new();
        w.write_natural(4);
        w.write_bits(0b1111, 4);
        let bytes = w.finish();
        assert_eq!(decode_program(&bytes), Err(Malformed::BadPrefixCode));
    }

    #[test]
    fn forward_or_self_reference_rejected() {
        // take as the very first node: any delta reaches past slot 0.
        let mut w = BitWriter::new();
        w.write_natural(5);
        w.write_bits(0b1010, 4);
        w.write_natural(1);
        let bytes = w.finish();
        assert_eq!(
            decode_program(&bytes),
            Err(Malformed::ForwardOrSelfReference { node: 0 })
        );
    }

    #[test]
    fn encoder_output_decodes_to_same_dag() {
        let mut b = crate::dag::DagBuilder::new();
        let w = b.witness();
        let i = b.iden();
        let t = b.take(i);
        let d = b.drop(i);
        let p = b.pair(t, d);
        let c = b.case(p, p);
        let top = b.comp(w, c);
        let u = b.unit();
        b.comp(top, u);
        let dag = b.build();

        let bytes = encode_program(&dag);
        let decoded = decode_program(&bytes).unwrap();
        assert_eq!(decoded.nodes(), dag.nodes());
    }
}
