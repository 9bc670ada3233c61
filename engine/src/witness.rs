// witness.rs — Witness blob decoding
//
// Witness payloads travel in their own length-prefixed bitstream, separate
// from program structure, so the same committed program can be supplied
// with or without its witness data. The blob can only be decoded *after*
// type inference: each witness node consumes exactly the bit width of its
// resolved target type, in arena order.
//
// Preconditions: `typed` is a fully typed DAG.
// Postconditions: on success every witness node has a payload of exactly
//   its target type's width; the DAG itself is untouched.
// Failure modes: `Malformed::WitnessLengthMismatch` when the declared
//   length disagrees with the program's witness types; the usual
//   truncation/trailing rules for the buffer itself.
// Side effects: none.

use crate::bits::BitReader;
use crate::error::Malformed;
use crate::infer::TypedDag;

/// Decoded witness payloads, keyed by witness node index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WitnessData {
    assignments: Vec<(usize, Vec<bool>)>,
}

impl WitnessData {
    /// Payload bits for a witness node, if it has any.
    pub fn payload(&self, node: usize) -> Option<&[bool]> {
        self.assignments
            .iter()
            .find(|(idx, _)| *idx == node)
            .map(|(_, bits)| bits.as_slice())
    }

    /// Total payload bits across all witness nodes.
    pub fn total_bits(&self) -> u64 {
        self.assignments.iter().map(|(_, b)| b.len() as u64).sum()
    }
}

/// Total witness bits the typed program expects.
fn expected_bits(typed: &TypedDag) -> u64 {
    typed
        .dag()
        .witness_nodes()
        .iter()
        .map(|&idx| typed.target(idx).bit_width())
        .fold(0u64, |acc, w| acc.saturating_add(w))
}

/// Decode a witness blob against a typed program.
///
/// The header natural carries `bit length + 1` so the empty payload stays
/// encodable (see `encode_witness`).
pub fn decode_witness(typed: &TypedDag, bytes: &[u8]) -> Result<WitnessData, Malformed> {
    let mut reader = BitReader::new(bytes);
    let declared = reader.read_natural()? - 1;
    let expected = expected_bits(typed);
    if declared != expected {
        return Err(Malformed::WitnessLengthMismatch { declared, expected });
    }

    let mut assignments = Vec::new();
    for idx in typed.dag().witness_nodes() {
        let width = typed.target(idx).bit_width();
        // The declared length is attacker-chosen and the type width can be
        // enormous for tiny programs; reserve no more than the buffer can
        // actually supply.
        let remaining = (reader.bit_len() - reader.bits_read()) as u64;
        let mut bits = Vec::with_capacity(width.min(remaining) as usize);
        for _ in 0..width {
            bits.push(reader.read_bit()?);
        }
        assignments.push((idx, bits));
    }
    reader.finish()?;
    Ok(WitnessData { assignments })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::DagBuilder;
    use crate::encode::encode_witness;
    use crate::infer::infer_types;

    /// A program whose single witness resolves to the type 1 + 1 (one
    /// payload bit): the witness drives a case over take/drop branches.
    fn one_bit_witness_program() -> TypedDag {
        let mut b = DagBuilder::new();
        let w = b.witness();
        let u = b.unit();
        let wu = b.pair(w, u);
        let i = b.iden();
        let tk = b.take(i);
        let dr = b.drop(i);
        let cs = b.case(tk, dr);
        let pc = b.comp(wu, cs);
        let u2 = b.unit();
        b.comp(pc, u2);
        infer_types(b.build()).unwrap()
    }

    #[test]
    fn witness_width_follows_type() {
        let typed = one_bit_witness_program();
        assert_eq!(expected_bits(&typed), 1);
    }

    #[test]
    fn decodes_payload_bits() {
        let typed = one_bit_witness_program();
        let blob = encode_witness(&[true]);
        let data = decode_witness(&typed, &blob).unwrap();
        assert_eq!(data.total_bits(), 1);
        assert_eq!(data.payload(0), Some(&[true][..]));
    }

    #[test]
    fn empty_witness_for_unit_typed_program() {
        // comp(witness, unit): the witness target defaults to unit, so
        // the program expects zero witness bits.
        let mut b = DagBuilder::new();
        let w = b.witness();
        let u = b.unit();
        b.comp(w, u);
        let typed = infer_types(b.build()).unwrap();
        let data = decode_witness(&typed, &encode_witness(&[])).unwrap();
        assert_eq!(data.total_bits(), 0);
        assert_eq!(data.payload(w), Some(&[][..]));
    }

    #[test]
    fn length_mismatch_rejected() {
        let typed = one_bit_witness_program();
        let blob = encode_witness(&[true, false]);
        assert_eq!(
            decode_witness(&typed, &blob),
            Err(Malformed::WitnessLengthMismatch {
                declared: 2,
                expected: 1
            })
        );
    }

    #[test]
    fn trailing_witness_bytes_rejected() {
        let typed = one_bit_witness_program();
        let mut blob = encode_witness(&[true]);
        blob.push(0);
        assert_eq!(decode_witness(&typed, &blob), Err(Malformed::TrailingData));
    }

    #[test]
    fn empty_buffer_is_truncated() {
        let typed = one_bit_witness_program();
        assert_eq!(decode_witness(&typed, &[]), Err(Malformed::Truncated));
    }

    #[test]
    fn wide_witness_type_with_tiny_buffer_fails_fast() {
        // A 31-level width-doubling consumer gives the witness a target
        // type of 2^31 bits from a handful of nodes. A blob that declares
        // that exact length passes the length check, so rejection has to
        // come from the buffer itself, cheaply, without a gigabyte-scale
        // reservation up front.
        let mut b = DagBuilder::new();
        let w = b.witness();
        let i = b.iden();
        let tk = b.take(i);
        let dr = b.drop(i);
        let mut level = b.case(tk, dr);
        for _ in 0..31 {
            let t = b.take(level);
            let d = b.drop(level);
            level = b.pair(t, d);
        }
        let wc = b.comp(w, level);
        let u = b.unit();
        b.comp(wc, u);
        let typed = infer_types(b.build()).unwrap();
        let expected = expected_bits(&typed);
        assert_eq!(expected, 1u64 << 31);

        let mut blob = crate::bits::BitWriter::new();
        blob.write_natural(expected + 1);
        assert_eq!(
            decode_witness(&typed, &blob.finish()),
            Err(Malformed::Truncated)
        );
    }
}
