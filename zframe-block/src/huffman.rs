//! Huffman decoding for literals.
//!
//! Literals use canonical prefix codes described by per-symbol weights. The
//! weight list is transmitted either directly (4-bit nibbles) or as an
//! FSE-compressed stream decoded with two interleaved states; the final
//! weight is never transmitted and is inferred so the code space closes to a
//! power of two.

use crate::fse::{FseDecoder, parse_fse_table};
use zframe_core::bits::ReverseBitReader;
use zframe_core::error::{Result, ZframeError};

/// Maximum Huffman code length.
pub const MAX_CODE_LENGTH: u8 = 11;

/// Maximum accuracy log for FSE-compressed weights.
const MAX_WEIGHT_ACCURACY: u8 = 6;

/// One prefix-table entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct HuffmanEntry {
    /// Decoded symbol.
    pub symbol: u8,
    /// Code length in bits.
    pub num_bits: u8,
}

/// Huffman decoding table indexed by a `max_bits`-wide prefix.
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    entries: Vec<HuffmanEntry>,
    max_bits: u8,
}

impl HuffmanTable {
    /// Build the table from transmitted weights.
    ///
    /// The weight of the final symbol is inferred: the sum of `1 <<
    /// (weight - 1)` over all symbols must reach a power of two, and the
    /// leftover determines the missing weight.
    pub fn from_weights(transmitted: &[u8]) -> Result<Self> {
        if transmitted.is_empty() {
            return Err(ZframeError::block_decode("empty Huffman weight list"));
        }
        if transmitted.len() > 255 {
            return Err(ZframeError::block_decode("too many Huffman weights"));
        }

        let mut weight_sum = 0u64;
        for &w in transmitted {
            if w > 0 {
                weight_sum += 1u64 << (w - 1);
            }
        }
        if weight_sum == 0 {
            return Err(ZframeError::block_decode("all Huffman weights are zero"));
        }

        let max_bits = (64 - weight_sum.leading_zeros()) as u8;
        if max_bits > MAX_CODE_LENGTH {
            return Err(ZframeError::block_decode(format!(
                "Huffman code length {max_bits} exceeds maximum {MAX_CODE_LENGTH}"
            )));
        }

        let left_over = (1u64 << max_bits) - weight_sum;
        if !left_over.is_power_of_two() {
            return Err(ZframeError::block_decode(
                "Huffman weights do not close to a power of two",
            ));
        }
        let last_weight = (64 - left_over.leading_zeros()) as u8;

        let mut lengths: Vec<u8> = transmitted
            .iter()
            .chain(std::iter::once(&last_weight))
            .map(|&w| if w > 0 { max_bits + 1 - w } else { 0 })
            .collect();

        // Longest codes occupy the bottom of the table; within one length,
        // symbols keep natural order.
        let mut rank_count = [0usize; MAX_CODE_LENGTH as usize + 1];
        for &len in &lengths {
            if len > 0 {
                rank_count[len as usize] += 1;
            }
        }
        let mut next_index = [0usize; MAX_CODE_LENGTH as usize + 2];
        next_index[max_bits as usize] = 0;
        for bits in (1..=max_bits as usize).rev() {
            next_index[bits - 1] = next_index[bits] + rank_count[bits] * (1 << (max_bits as usize - bits));
        }
        debug_assert_eq!(next_index[0], 1 << max_bits);

        let table_size = 1usize << max_bits;
        let mut entries = vec![HuffmanEntry::default(); table_size];
        for (symbol, len) in lengths.drain(..).enumerate() {
            if len == 0 {
                continue;
            }
            let span = 1usize << (max_bits - len);
            let start = next_index[len as usize];
            for entry in &mut entries[start..start + span] {
                entry.symbol = symbol as u8;
                entry.num_bits = len;
            }
            next_index[len as usize] += span;
        }

        Ok(Self { entries, max_bits })
    }

    /// Entry for a `max_bits`-wide prefix.
    #[inline]
    pub fn decode(&self, prefix: u64) -> &HuffmanEntry {
        &self.entries[prefix as usize & ((1 << self.max_bits) - 1)]
    }

    /// Prefix width of this table.
    pub fn max_bits(&self) -> u8 {
        self.max_bits
    }
}

/// Read a Huffman table description from the start of `data`.
///
/// Returns the table and the bytes consumed.
pub fn read_huffman_table(data: &[u8]) -> Result<(HuffmanTable, usize)> {
    let Some(&header) = data.first() else {
        return Err(ZframeError::block_decode("empty Huffman table description"));
    };

    if header >= 128 {
        read_direct_weights(data)
    } else {
        read_fse_weights(data)
    }
}

/// Direct representation: `header - 127` weights as 4-bit nibbles.
fn read_direct_weights(data: &[u8]) -> Result<(HuffmanTable, usize)> {
    let count = (data[0] - 127) as usize;
    let bytes = count.div_ceil(2);
    if data.len() < 1 + bytes {
        return Err(ZframeError::block_decode("truncated Huffman weights"));
    }

    let mut weights = vec![0u8; count];
    for (i, weight) in weights.iter_mut().enumerate() {
        let byte = data[1 + i / 2];
        *weight = if i % 2 == 0 { byte >> 4 } else { byte & 0x0F };
    }

    let table = HuffmanTable::from_weights(&weights)?;
    Ok((table, 1 + bytes))
}

/// FSE representation: `header` bytes of table description plus a backward
/// bitstream decoded with two alternating states.
fn read_fse_weights(data: &[u8]) -> Result<(HuffmanTable, usize)> {
    let compressed_size = data[0] as usize;
    if compressed_size == 0 {
        return Err(ZframeError::block_decode("empty Huffman weight stream"));
    }
    if data.len() < 1 + compressed_size {
        return Err(ZframeError::block_decode("truncated Huffman weight stream"));
    }

    let src = &data[1..1 + compressed_size];
    let (table, desc_bytes) = parse_fse_table(src, MAX_WEIGHT_ACCURACY, 15)?;

    let stream = &src[desc_bytes..];
    let mut reader = ReverseBitReader::new(stream)?;
    let mut first = FseDecoder::new(&table, &mut reader)?;
    let mut second = FseDecoder::new(&table, &mut reader)?;

    // The states take turns emitting weights. When the stream cannot fund
    // the next transition, the other state flushes its symbol and decoding
    // stops.
    let mut weights = Vec::new();
    loop {
        if weights.len() >= 255 {
            return Err(ZframeError::block_decode("Huffman weight stream overflow"));
        }
        weights.push(first.symbol());
        if usize::from(first.transition_bits()) > reader.remaining() {
            weights.push(second.symbol());
            break;
        }
        first.advance(&mut reader)?;
        std::mem::swap(&mut first, &mut second);
    }

    let table = HuffmanTable::from_weights(&weights)?;
    Ok((table, 1 + compressed_size))
}

/// Decode a single backward Huffman stream into `out_len` symbols.
pub fn decode_stream(table: &HuffmanTable, stream: &[u8], out_len: usize) -> Result<Vec<u8>> {
    let mut reader = ReverseBitReader::new(stream)?;
    let mut out = Vec::with_capacity(out_len);

    while out.len() < out_len {
        let entry = table.decode(reader.peek(table.max_bits()));
        reader.consume(entry.num_bits);
        out.push(entry.symbol);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inferred_last_weight() {
        // Transmitted weights [1, 1]: sum 2, next power of two is 4, so the
        // third symbol gets weight 2 and a 1-bit code.
        let table = HuffmanTable::from_weights(&[1, 1]).unwrap();
        assert_eq!(table.max_bits(), 2);

        assert_eq!(table.decode(0).symbol, 0);
        assert_eq!(table.decode(0).num_bits, 2);
        assert_eq!(table.decode(1).symbol, 1);
        assert_eq!(table.decode(2).symbol, 2);
        assert_eq!(table.decode(2).num_bits, 1);
        assert_eq!(table.decode(3).symbol, 2);
    }

    #[test]
    fn test_unclosed_weights_rejected() {
        // Sum 3 leaves a non-power-of-two remainder 1? 4 - 3 = 1 is a power
        // of two, so pick weights whose leftover is 3: sum 5 -> 8 - 5 = 3.
        assert!(HuffmanTable::from_weights(&[3, 1]).is_err());
        assert!(HuffmanTable::from_weights(&[0]).is_err());
        assert!(HuffmanTable::from_weights(&[]).is_err());
    }

    #[test]
    fn test_direct_description() {
        // Header 127 + 2 transmitted weights, nibbles 1 and 1.
        let data = [129, 0x11];
        let (table, consumed) = read_huffman_table(&data).unwrap();

        assert_eq!(consumed, 2);
        assert_eq!(table.max_bits(), 2);
        assert_eq!(table.decode(3).symbol, 2);
    }

    #[test]
    fn test_direct_description_truncated() {
        // Header demands 5 weights = 3 bytes of nibbles, only 1 present.
        let data = [132, 0x11];
        assert!(read_huffman_table(&data).is_err());
    }

    #[test]
    fn test_decode_stream() {
        let table = HuffmanTable::from_weights(&[1, 1]).unwrap();

        // Codes: symbol 0 = 00, symbol 1 = 01, symbol 2 = 1. Stream holds
        // [2, 0, 1] followed by the sentinel bit.
        let stream = [0b0011_0001];
        let symbols = decode_stream(&table, &stream, 3).unwrap();
        assert_eq!(symbols, vec![2, 0, 1]);
    }

    #[test]
    fn test_decode_stream_rejects_empty() {
        let table = HuffmanTable::from_weights(&[1, 1]).unwrap();
        assert!(decode_stream(&table, &[], 1).is_err());
    }
}
