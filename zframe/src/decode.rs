//! Frame parsing and decompression.
//!
//! The decoder validates the magic number and header, walks the block
//! sequence until the final-block flag, reconstructs the content through
//! the block codec, and verifies the declared size and trailing checksum.
//! An operation either returns the complete content or exactly one error;
//! no partial output escapes.

use crate::header::{FrameHeader, FrameKind};
use crate::xxhash::content_checksum;
use crate::{BlockKind, MAX_BLOCK_SIZE, MAX_WINDOW_SIZE};
use zframe_core::error::{Result, ZframeError};
use zframe_core::traits::BlockCodec;

/// Upper bound on the buffer reservation taken from a declared size, so a
/// forged header cannot demand the allocation up front.
const RESERVE_LIMIT: usize = 16 * 1024 * 1024;

/// Frame decoder.
#[derive(Debug, Clone)]
pub struct FrameDecoder<C: BlockCodec> {
    codec: C,
    max_window_size: u64,
}

impl<C: BlockCodec> FrameDecoder<C> {
    /// Create a decoder with the default 8 MiB window limit.
    pub fn new(codec: C) -> Self {
        Self {
            codec,
            max_window_size: MAX_WINDOW_SIZE as u64,
        }
    }

    /// Set the largest window descriptor this decoder accepts.
    pub fn set_max_window_size(&mut self, bytes: u64) -> &mut Self {
        self.max_window_size = bytes;
        self
    }

    /// Decompress exactly one frame.
    pub fn decompress(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        let header = FrameHeader::decode(data)?;

        if let FrameKind::Skippable { size } = header.kind {
            return skip_frame(data, size);
        }

        // Dictionary ids are parsed for introspection, but decoding content
        // that was compressed against an external dictionary is not
        // supported.
        if let Some(id) = header.dictionary_id {
            if id != 0 {
                return Err(ZframeError::frame_format(
                    5,
                    format!("frame requires dictionary {id}"),
                ));
            }
        }

        if let Some(window) = header.window {
            if window.window_size() > self.max_window_size {
                return Err(ZframeError::frame_format(
                    5,
                    format!(
                        "window size {} exceeds decoder limit {}",
                        window.window_size(),
                        self.max_window_size
                    ),
                ));
            }
        }

        let mut output = Vec::new();
        if let Some(size) = header.content_size.value() {
            output.reserve(usize::try_from(size).unwrap_or(usize::MAX).min(RESERVE_LIMIT));
        }

        self.codec.reset();
        let mut pos = header.header_len;

        loop {
            let Some(block_header) = data.get(pos..pos + 3) else {
                return Err(ZframeError::incomplete(pos as u64, "truncated block header"));
            };
            let raw_header =
                u32::from_le_bytes([block_header[0], block_header[1], block_header[2], 0]);
            pos += 3;

            let is_last = raw_header & 1 != 0;
            let kind = BlockKind::from_bits(((raw_header >> 1) & 0x03) as u8, pos as u64)?;
            let block_size = (raw_header >> 3) as usize;

            if block_size > MAX_BLOCK_SIZE {
                return Err(ZframeError::frame_format(
                    pos as u64,
                    format!("block size {block_size} exceeds the 128 KiB limit"),
                ));
            }

            // RLE stores one byte regardless of the regenerated size.
            let stored_size = match kind {
                BlockKind::Rle => 1,
                _ => block_size,
            };
            let Some(payload) = data.get(pos..pos + stored_size) else {
                return Err(ZframeError::frame_format(
                    pos as u64,
                    "block size exceeds remaining input",
                ));
            };
            pos += stored_size;

            match kind {
                BlockKind::Raw => output.extend_from_slice(payload),
                BlockKind::Rle => output.extend(std::iter::repeat_n(payload[0], block_size)),
                BlockKind::Compressed => {
                    let regenerated = self.codec.decode_block(payload, &output, MAX_BLOCK_SIZE)?;
                    output.extend_from_slice(&regenerated);
                }
            }

            if is_last {
                break;
            }
        }

        if let Some(declared) = header.content_size.value() {
            if output.len() as u64 != declared {
                return Err(ZframeError::frame_format(
                    pos as u64,
                    format!(
                        "content size mismatch: declared {declared}, regenerated {}",
                        output.len()
                    ),
                ));
            }
        }

        if header.checksum {
            let Some(trailer) = data.get(pos..pos + 4) else {
                return Err(ZframeError::incomplete(pos as u64, "missing content checksum"));
            };
            pos += 4;

            let stored = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
            let computed = content_checksum(&output);
            if stored != computed {
                return Err(ZframeError::checksum_mismatch(stored, computed));
            }
        }

        if pos != data.len() {
            return Err(ZframeError::frame_format(
                pos as u64,
                "trailing data after frame end",
            ));
        }

        Ok(output)
    }
}

/// Handle a lone skippable frame: no content, but the payload must be
/// complete and nothing may follow it.
fn skip_frame(data: &[u8], size: u32) -> Result<Vec<u8>> {
    let total = 8 + size as usize;
    if data.len() < total {
        return Err(ZframeError::incomplete(
            data.len() as u64,
            "truncated skippable frame payload",
        ));
    }
    if data.len() > total {
        return Err(ZframeError::frame_format(
            total as u64,
            "trailing data after frame end",
        ));
    }
    Ok(Vec::new())
}
