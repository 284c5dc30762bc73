//! # ZFrame
//!
//! Pure Rust implementation of the Zstandard frame container (RFC 8878).
//!
//! The crate owns the container format: magic number, frame header, block
//! sequence, and content checksum. Block payload compression is a pluggable
//! capability behind the [`BlockCodec`] trait; the bundled [`EntropyCodec`]
//! decodes all block representations and stores payloads raw on the encode
//! side, so every produced frame is readable by any conformant decoder.
//!
//! ## Features
//!
//! - Complete frame header parsing, every size class and field layout
//! - Raw, RLE, and Compressed block handling
//! - XXH64 content checksum verification
//! - Skippable frame recognition
//! - Header introspection without decompression
//!
//! ## Example
//!
//! ```rust,no_run
//! use zframe::{compress, decompress, parse_frame_header};
//!
//! let data = b"Hello, Zstandard!";
//! let frame = compress(data).unwrap();
//! assert_eq!(parse_frame_header(&frame).unwrap().content_size.value(), Some(17));
//! assert_eq!(decompress(&frame).unwrap(), data);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod decode;
mod encode;
mod header;
mod xxhash;

pub use decode::FrameDecoder;
pub use encode::FrameEncoder;
pub use header::{ContentSize, FrameHeader, FrameKind, WindowDescriptor, parse_frame_header};
pub use xxhash::{content_checksum, xxh64};
pub use zframe_block::EntropyCodec;
pub use zframe_core::error::{Result, ZframeError};
pub use zframe_core::traits::{BlockCodec, StoreCodec};

/// Zstandard magic number (0xFD2FB528 little-endian).
pub const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Skippable frame magic number range start (0x184D2A50).
pub const SKIPPABLE_MAGIC_LOW: u32 = 0x184D2A50;

/// Skippable frame magic number range end (0x184D2A5F).
pub const SKIPPABLE_MAGIC_HIGH: u32 = 0x184D2A5F;

/// Maximum block size (128 KiB).
pub const MAX_BLOCK_SIZE: usize = 128 * 1024;

/// Largest window descriptor accepted by default (8 MiB, the support level
/// the format recommends of every decoder).
pub const MAX_WINDOW_SIZE: usize = 8 * 1024 * 1024;

/// Block representations in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Stored bytes.
    Raw,
    /// A single byte repeated to the block size.
    Rle,
    /// Payload for the block codec.
    Compressed,
}

impl BlockKind {
    /// Decode the 2-bit block type field; type 3 is reserved.
    pub fn from_bits(bits: u8, offset: u64) -> Result<Self> {
        match bits & 0x03 {
            0 => Ok(BlockKind::Raw),
            1 => Ok(BlockKind::Rle),
            2 => Ok(BlockKind::Compressed),
            _ => Err(ZframeError::frame_format(offset, "reserved block type")),
        }
    }

    /// The 2-bit wire value.
    pub fn to_bits(self) -> u32 {
        match self {
            BlockKind::Raw => 0,
            BlockKind::Rle => 1,
            BlockKind::Compressed => 2,
        }
    }
}

/// Compress `data` into a single frame with default settings: content size
/// declared, checksum appended, RLE blocks enabled.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    FrameEncoder::new(EntropyCodec::new()).compress(data)
}

/// Compress without a trailing content checksum.
pub fn compress_no_checksum(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = FrameEncoder::new(EntropyCodec::new());
    encoder.set_checksum(false);
    encoder.compress(data)
}

/// Decompress a single frame produced by any conformant encoder.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    FrameDecoder::new(EntropyCodec::new()).decompress(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zstd_magic_value() {
        assert_eq!(u32::from_le_bytes(ZSTD_MAGIC), 0xFD2FB528);
    }

    #[test]
    fn test_block_kind_bits() {
        assert_eq!(BlockKind::from_bits(0, 0).unwrap(), BlockKind::Raw);
        assert_eq!(BlockKind::from_bits(1, 0).unwrap(), BlockKind::Rle);
        assert_eq!(BlockKind::from_bits(2, 0).unwrap(), BlockKind::Compressed);
        assert!(BlockKind::from_bits(3, 0).is_err());

        for kind in [BlockKind::Raw, BlockKind::Rle, BlockKind::Compressed] {
            assert_eq!(BlockKind::from_bits(kind.to_bits() as u8, 0).unwrap(), kind);
        }
    }

    #[test]
    fn test_convenience_roundtrip() {
        let data = b"convenience layer";
        assert_eq!(decompress(&compress(data).unwrap()).unwrap(), data);
        assert_eq!(
            decompress(&compress_no_checksum(data).unwrap()).unwrap(),
            data
        );
    }
}
