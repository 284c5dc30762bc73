//! The block codec capability trait.
//!
//! The frame container treats block compression as a pluggable capability:
//! the frame layer owns the container bytes (headers, block framing,
//! checksum) while a [`BlockCodec`] owns the payload of Compressed blocks.
//! Raw and RLE blocks never reach the codec.

use crate::error::Result;

/// A block compression capability.
///
/// Implementations may keep per-frame state (entropy tables carried between
/// blocks, repeat offsets); the frame layer calls [`BlockCodec::reset`]
/// before each frame so no state leaks across frames.
pub trait BlockCodec {
    /// Try to compress `raw` into at most `max_output` bytes.
    ///
    /// Returns `Ok(None)` when the payload would not shrink below
    /// `max_output`; the caller then stores the block raw.
    fn encode_block(&mut self, raw: &[u8], max_output: usize) -> Result<Option<Vec<u8>>>;

    /// Decode one Compressed block payload.
    ///
    /// `history` holds the bytes already regenerated for the current frame,
    /// in order, so back-references may reach across block boundaries.
    /// At most `max_regenerated` bytes may be produced.
    fn decode_block(
        &mut self,
        block: &[u8],
        history: &[u8],
        max_regenerated: usize,
    ) -> Result<Vec<u8>>;

    /// Clear per-frame state.
    fn reset(&mut self);
}

/// The trivial codec: stores everything raw and decodes nothing.
///
/// Frames produced with this codec contain only Raw and RLE blocks and are
/// readable by any conformant decoder. Decoding a frame that contains a
/// Compressed block fails, since this codec has no entropy stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreCodec;

impl StoreCodec {
    /// Create a new store codec.
    pub fn new() -> Self {
        Self
    }
}

impl BlockCodec for StoreCodec {
    fn encode_block(&mut self, _raw: &[u8], _max_output: usize) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    fn decode_block(
        &mut self,
        _block: &[u8],
        _history: &[u8],
        _max_regenerated: usize,
    ) -> Result<Vec<u8>> {
        Err(crate::error::ZframeError::block_decode(
            "store codec cannot decode compressed blocks",
        ))
    }

    fn reset(&mut self) {}
}
