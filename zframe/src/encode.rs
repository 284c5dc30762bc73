//! Frame construction.
//!
//! The encoder assembles magic number, header, block sequence, and optional
//! checksum. Input is cut into segments of at most the block size; each
//! segment becomes an RLE block when it is one repeated byte, a Compressed
//! block when the codec shrinks it, and a Raw block otherwise. A Compressed
//! block is never allowed to be as large as its Raw form.

use crate::header::FrameHeader;
use crate::xxhash::content_checksum;
use crate::{BlockKind, MAX_BLOCK_SIZE};
use zframe_core::error::Result;
use zframe_core::traits::BlockCodec;

/// Frame encoder.
///
/// Configuration follows the builder style; defaults are a trailing
/// checksum, a declared content size, RLE detection, and 128 KiB blocks.
#[derive(Debug, Clone)]
pub struct FrameEncoder<C: BlockCodec> {
    codec: C,
    include_checksum: bool,
    include_content_size: bool,
    rle_blocks: bool,
    max_block_size: usize,
}

impl<C: BlockCodec> FrameEncoder<C> {
    /// Create an encoder with default settings around the given codec.
    pub fn new(codec: C) -> Self {
        Self {
            codec,
            include_checksum: true,
            include_content_size: true,
            rle_blocks: true,
            max_block_size: MAX_BLOCK_SIZE,
        }
    }

    /// Set whether to append a content checksum.
    pub fn set_checksum(&mut self, include: bool) -> &mut Self {
        self.include_checksum = include;
        self
    }

    /// Set whether to declare the content size in the header.
    pub fn set_content_size(&mut self, include: bool) -> &mut Self {
        self.include_content_size = include;
        self
    }

    /// Set whether uniform segments become RLE blocks.
    pub fn set_rle_blocks(&mut self, enable: bool) -> &mut Self {
        self.rle_blocks = enable;
        self
    }

    /// Set the segment size, clamped to the format's 128 KiB block limit.
    pub fn set_max_block_size(&mut self, bytes: usize) -> &mut Self {
        self.max_block_size = bytes.clamp(1, MAX_BLOCK_SIZE);
        self
    }

    /// Compress `data` into a complete frame.
    pub fn compress(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(data.len() + 32);

        let header = FrameHeader::for_content(
            data.len() as u64,
            self.include_content_size,
            self.include_checksum,
        );
        output.extend_from_slice(&header.encode());

        self.codec.reset();
        self.write_blocks(&mut output, data)?;

        if self.include_checksum {
            output.extend_from_slice(&content_checksum(data).to_le_bytes());
        }

        Ok(output)
    }

    fn write_blocks(&mut self, output: &mut Vec<u8>, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            // An empty frame still carries one zero-length raw block so the
            // final-block flag exists.
            write_block_header(output, true, BlockKind::Raw, 0);
            return Ok(());
        }

        let mut offset = 0;
        while offset < data.len() {
            let end = (offset + self.max_block_size).min(data.len());
            let segment = &data[offset..end];
            let is_last = end == data.len();

            if self.rle_blocks {
                if let Some(byte) = uniform_byte(segment) {
                    write_block_header(output, is_last, BlockKind::Rle, segment.len());
                    output.push(byte);
                    offset = end;
                    continue;
                }
            }

            match self.codec.encode_block(segment, segment.len() - 1)? {
                Some(encoded) if encoded.len() < segment.len() => {
                    write_block_header(output, is_last, BlockKind::Compressed, encoded.len());
                    output.extend_from_slice(&encoded);
                }
                _ => {
                    write_block_header(output, is_last, BlockKind::Raw, segment.len());
                    output.extend_from_slice(segment);
                }
            }
            offset = end;
        }

        Ok(())
    }
}

/// Write a 3-byte block header: last flag, 2-bit type, 21-bit size.
///
/// For RLE blocks `size` is the regenerated size, not the single stored
/// byte.
fn write_block_header(output: &mut Vec<u8>, is_last: bool, kind: BlockKind, size: usize) {
    let header =
        u32::from(is_last) | (kind.to_bits() << 1) | ((size as u32) << 3);
    output.push(header as u8);
    output.push((header >> 8) as u8);
    output.push((header >> 16) as u8);
}

/// The repeated byte of a uniform segment, if any.
fn uniform_byte(segment: &[u8]) -> Option<u8> {
    let (&first, rest) = segment.split_first()?;
    for chunk in rest.chunks(16) {
        if !chunk.iter().all(|&b| b == first) {
            return None;
        }
    }
    Some(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{ContentSize, parse_frame_header};
    use crate::{ZSTD_MAGIC, decompress};
    use zframe_core::traits::StoreCodec;

    fn encoder() -> FrameEncoder<StoreCodec> {
        FrameEncoder::new(StoreCodec::new())
    }

    #[test]
    fn test_compress_empty() {
        let frame = encoder().compress(&[]).unwrap();
        assert_eq!(&frame[0..4], &ZSTD_MAGIC);
        assert_eq!(decompress(&frame).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_compress_small() {
        let data = b"Hello, Zstandard!";
        let frame = encoder().compress(data).unwrap();
        assert_eq!(decompress(&frame).unwrap(), data);
    }

    #[test]
    fn test_empty_frame_layout() {
        let mut enc = encoder();
        enc.set_checksum(false);
        let frame = enc.compress(&[]).unwrap();

        // Magic, descriptor (single segment), size 0, one raw final block.
        assert_eq!(frame, [0x28, 0xB5, 0x2F, 0xFD, 0x20, 0x00, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn test_rle_detection() {
        let data = vec![0xAA; 10_000];
        let frame = encoder().compress(&data).unwrap();

        assert!(
            frame.len() < data.len() / 10,
            "expected an RLE block, frame is {} bytes",
            frame.len()
        );
        assert_eq!(decompress(&frame).unwrap(), data);
    }

    #[test]
    fn test_rle_multi_block() {
        let data = vec![0xBB; MAX_BLOCK_SIZE * 3];
        let frame = encoder().compress(&data).unwrap();

        assert!(frame.len() < 100, "expected tiny frame, got {}", frame.len());
        assert_eq!(decompress(&frame).unwrap(), data);
    }

    #[test]
    fn test_rle_disabled_stores_raw() {
        let data = vec![0xEE; 1000];
        let mut enc = encoder();
        enc.set_rle_blocks(false);
        let frame = enc.compress(&data).unwrap();

        assert!(frame.len() > data.len());
        assert_eq!(decompress(&frame).unwrap(), data);
    }

    #[test]
    fn test_mixed_data_roundtrip() {
        let mut data = vec![0xCC; 1000];
        data.extend_from_slice(b"Hello, World!");
        data.extend_from_slice(&vec![0xDD; 1000]);

        let frame = encoder().compress(&data).unwrap();
        assert_eq!(decompress(&frame).unwrap(), data);
    }

    #[test]
    fn test_multi_block_split() {
        let mut data = Vec::new();
        for i in 0..(MAX_BLOCK_SIZE + 1000) {
            data.push((i % 251) as u8);
        }
        let frame = encoder().compress(&data).unwrap();
        assert_eq!(decompress(&frame).unwrap(), data);
    }

    #[test]
    fn test_small_block_size_setting() {
        let data = b"abcdefghij".repeat(10);
        let mut enc = encoder();
        enc.set_max_block_size(16);
        let frame = enc.compress(&data).unwrap();
        assert_eq!(decompress(&frame).unwrap(), data);
    }

    #[test]
    fn test_no_checksum() {
        let data = b"Test without checksum";
        let mut enc = encoder();
        enc.set_checksum(false);
        let frame = enc.compress(data).unwrap();

        assert!(!parse_frame_header(&frame).unwrap().checksum);
        assert_eq!(decompress(&frame).unwrap(), data);
    }

    #[test]
    fn test_undeclared_content_size() {
        let data = b"size learned from the blocks";
        let mut enc = encoder();
        enc.set_content_size(false);
        let frame = enc.compress(data).unwrap();

        let header = parse_frame_header(&frame).unwrap();
        assert_eq!(header.content_size, ContentSize::Unknown);
        assert!(!header.single_segment());
        assert_eq!(decompress(&frame).unwrap(), data);
    }

    #[test]
    fn test_header_reports_length() {
        for len in [0usize, 1, 100, 255, 256, 300, 70_000] {
            let data = vec![0x55; len];
            let frame = encoder().compress(&data).unwrap();
            let header = parse_frame_header(&frame).unwrap();
            assert_eq!(header.content_size.value(), Some(len as u64), "len {len}");
            assert!(header.checksum);
        }
    }

    #[test]
    fn test_various_sizes_roundtrip() {
        for size in [0, 1, 10, 255, 256, 257, 1000, 65535, 65536, 100_000, 200_000] {
            let data: Vec<u8> = (0..size).map(|i| (i * 7 % 253) as u8).collect();
            let frame = encoder().compress(&data).unwrap();
            assert_eq!(decompress(&frame).unwrap(), data, "size {size}");
        }
    }

    #[test]
    fn test_uniform_byte() {
        assert_eq!(uniform_byte(&[0xAA; 100]), Some(0xAA));
        assert_eq!(uniform_byte(&[0xFF]), Some(0xFF));
        assert_eq!(uniform_byte(&[0xAA, 0xAA, 0xBB]), None);
        assert_eq!(uniform_byte(&[]), None);
    }
}
