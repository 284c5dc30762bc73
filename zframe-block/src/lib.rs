//! # ZFrame Block
//!
//! Zstandard block codec for the ZFrame container (RFC 8878 block format).
//!
//! The frame layer hands this crate the payload of each Compressed block;
//! everything else (Raw and RLE blocks, headers, checksums) stays in the
//! container. Decoding is complete: literals in all four representations,
//! Huffman tables with direct or FSE-compressed weights, and FSE-coded
//! sequences with repeat-offset history. Encoding is conservative: the codec
//! always reports that a payload would not shrink, so frames built with it
//! contain only Raw and RLE blocks, which every conformant decoder reads.
//!
//! ## Example
//!
//! ```rust,no_run
//! use zframe_block::EntropyCodec;
//! use zframe_core::BlockCodec;
//!
//! let mut codec = EntropyCodec::new();
//! let block = [0x28, b'H', b'e', b'l', b'l', b'o', 0x00];
//! let bytes = codec.decode_block(&block, &[], 128 * 1024).unwrap();
//! assert_eq!(bytes, b"Hello");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod fse;
mod huffman;
mod literals;
mod sequences;

pub use fse::{FseDecoder, FseTable, FseTableEntry, parse_fse_table};
pub use huffman::{HuffmanEntry, HuffmanTable, MAX_CODE_LENGTH, read_huffman_table};
pub use literals::{LiteralsHeader, LiteralsKind, LiteralsState, parse_literals_header};
pub use sequences::{Sequence, SequenceState, SequencesHeader, SymbolMode, parse_sequences_header};

use zframe_core::error::{Result, ZframeError};
use zframe_core::traits::BlockCodec;

/// The Zstandard block codec.
///
/// Keeps the per-frame state the format threads between blocks: the literals
/// Huffman table (for Treeless blocks), the three sequence FSE tables (for
/// Repeat mode), and the repeat-offset history. [`BlockCodec::reset`] clears
/// all of it.
#[derive(Debug, Default)]
pub struct EntropyCodec {
    literals: LiteralsState,
    sequences: SequenceState,
}

impl EntropyCodec {
    /// Create a codec with fresh per-frame state.
    pub fn new() -> Self {
        Self {
            literals: LiteralsState::new(),
            sequences: SequenceState::new(),
        }
    }
}

impl BlockCodec for EntropyCodec {
    fn encode_block(&mut self, _raw: &[u8], _max_output: usize) -> Result<Option<Vec<u8>>> {
        // No entropy encoder: report the payload as incompressible and let
        // the frame layer store it.
        Ok(None)
    }

    fn decode_block(
        &mut self,
        block: &[u8],
        history: &[u8],
        max_regenerated: usize,
    ) -> Result<Vec<u8>> {
        let (literal_bytes, consumed) = self.literals.decode(block)?;
        let sequences = self.sequences.decode(&block[consumed..])?;
        execute_sequences(&literal_bytes, &sequences, history, max_regenerated)
    }

    fn reset(&mut self) {
        self.literals.reset();
        self.sequences.reset();
    }
}

/// Replay sequences over the literal bytes, producing the block's content.
///
/// Matches may reach into `history` (bytes regenerated by earlier blocks of
/// the frame) and may overlap their own output; copies are byte-wise so the
/// overlap semantics hold.
fn execute_sequences(
    literal_bytes: &[u8],
    sequences: &[Sequence],
    history: &[u8],
    max_regenerated: usize,
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut literal_pos = 0usize;

    for seq in sequences {
        if literal_pos + seq.literal_length > literal_bytes.len() {
            return Err(ZframeError::block_decode(
                "sequence consumes more literals than available",
            ));
        }
        if out.len() + seq.literal_length + seq.match_length > max_regenerated {
            return Err(ZframeError::block_decode(
                "block regenerates more than the block size limit",
            ));
        }

        out.extend_from_slice(&literal_bytes[literal_pos..literal_pos + seq.literal_length]);
        literal_pos += seq.literal_length;

        if seq.offset > out.len() + history.len() {
            return Err(ZframeError::block_decode(format!(
                "match offset {} reaches before the frame start",
                seq.offset
            )));
        }
        for _ in 0..seq.match_length {
            let byte = if seq.offset <= out.len() {
                out[out.len() - seq.offset]
            } else {
                history[history.len() - (seq.offset - out.len())]
            };
            out.push(byte);
        }
    }

    let tail = &literal_bytes[literal_pos..];
    if out.len() + tail.len() > max_regenerated {
        return Err(ZframeError::block_decode(
            "block regenerates more than the block size limit",
        ));
    }
    out.extend_from_slice(tail);

    Ok(out)
}
