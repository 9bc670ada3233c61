// bits.rs — Bit-level cursor over a byte buffer
//
// The wire format is bit-addressed: discriminant prefix codes, child
// back-references, and length prefixes all start on arbitrary bit
// boundaries. `BitReader` walks a borrowed buffer MSB-first; `BitWriter`
// is its inverse and zero-pads the final byte.
//
// Preconditions: none.
// Postconditions: the reader never advances past a failed read.
// Failure modes: reads past the buffer end → `Malformed::Truncated`;
//   naturals wider than 32 bits → `Malformed::NaturalOverflow`.
// Side effects: none.

use crate::error::Malformed;

/// Largest value `read_natural` will produce. Wire naturals are capped at
/// 32 bits; anything larger is an encoding defect, not a real program.
pub const NATURAL_MAX: u64 = u32::MAX as u64;

// ── Reader ───────────────────────────────────────────────────────────────

/// MSB-first cursor over a byte buffer.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    /// Absolute bit position of the cursor.
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        BitReader { bytes, pos: 0 }
    }

    /// Bits consumed so far.
    pub fn bits_read(&self) -> usize {
        self.pos
    }

    /// Total bits in the underlying buffer.
    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8
    }

    /// Read a single bit.
    pub fn read_bit(&mut self) -> Result<bool, Malformed> {
        if self.pos >= self.bit_len() {
            return Err(Malformed::Truncated);
        }
        let byte = self.bytes[self.pos / 8];
        let bit = (byte >> (7 - self.pos % 8)) & 1 == 1;
        self.pos += 1;
        Ok(bit)
    }

    /// Read `n` bits (n ≤ 64) as a big-endian unsigned value.
    pub fn read_bits(&mut self, n: usize) -> Result<u64, Malformed> {
        debug_assert!(n <= 64);
        if self.pos + n > self.bit_len() {
            return Err(Malformed::Truncated);
        }
        let mut value = 0u64;
        for _ in 0..n {
            value = (value << 1) | u64::from(self.read_bit()?);
        }
        Ok(value)
    }

    /// Decode a self-delimiting natural (value ≥ 1).
    ///
    /// Code: for v with bit length k+1, write k one-bits, a zero, then the
    /// k low bits of v. So 1 = `0`, 2 = `10 0`, 3 = `10 1`, 4 = `110 00`.
    pub fn read_natural(&mut self) -> Result<u64, Malformed> {
        let mut k = 0usize;
        while self.read_bit()? {
            k += 1;
            if k > 31 {
                return Err(Malformed::NaturalOverflow);
            }
        }
        let low = self.read_bits(k)?;
        let value = (1u64 << k) | low;
        debug_assert!(value <= NATURAL_MAX);
        Ok(value)
    }

    /// Consume the zero padding that fills the final byte, then require
    /// the buffer to be fully consumed.
    ///
    /// Any set padding bit and any whole remaining byte is trailing data.
    pub fn finish(&mut self) -> Result<(), Malformed> {
        while self.pos % 8 != 0 {
            if self.read_bit()? {
                return Err(Malformed::TrailingData);
            }
        }
        if self.pos != self.bit_len() {
            return Err(Malformed::TrailingData);
        }
        Ok(())
    }
}

// ── Writer ───────────────────────────────────────────────────────────────

/// MSB-first bit accumulator, inverse of `BitReader`.
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    /// Bits used in the final byte of `bytes` (0 means byte-aligned).
    partial: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bits written so far.
    pub fn bits_written(&self) -> usize {
        if self.partial == 0 {
            self.bytes.len() * 8
        } else {
            (self.bytes.len() - 1) * 8 + self.partial
        }
    }

    pub fn write_bit(&mut self, bit: bool) {
        if self.partial == 0 {
            self.bytes.push(0);
        }
        if bit {
            let last = self.bytes.last_mut().unwrap();
            *last |= 1 << (7 - self.partial);
        }
        self.partial = (self.partial + 1) % 8;
    }

    /// Write the low `n` bits of `value`, MSB first.
    pub fn write_bits(&mut self, value: u64, n: usize) {
        debug_assert!(n <= 64);
        for i in (0..n).rev() {
            self.write_bit((value >> i) & 1 == 1);
        }
    }

    /// Encode a natural (value ≥ 1) in the `read_natural` code.
    pub fn write_natural(&mut self, value: u64) {
        assert!(value >= 1 && value <= NATURAL_MAX);
        let k = 63 - value.leading_zeros() as usize;
        for _ in 0..k {
            self.write_bit(true);
        }
        self.write_bit(false);
        self.write_bits(value & !(1 << k), k);
    }

    /// Zero-pad to a byte boundary and return the buffer.
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}
