//! Frame header encoding, decoding, and introspection.
//!
//! The header after the magic number is one descriptor byte followed by
//! optional fields in a fixed order: window descriptor, dictionary id,
//! frame content size. Each optional field's width is chosen by descriptor
//! flags; a decoder must accept every width a conformant encoder may pick,
//! not just the one this encoder would choose for the same content.

use crate::{MAX_WINDOW_SIZE, SKIPPABLE_MAGIC_HIGH, SKIPPABLE_MAGIC_LOW, ZSTD_MAGIC};
use zframe_core::error::{Result, ZframeError};

/// Frame header descriptor flags.
const FHD_DICT_ID_MASK: u8 = 0x03;
const FHD_CONTENT_CHECKSUM: u8 = 0x04;
const FHD_RESERVED: u8 = 0x08;
const FHD_SINGLE_SEGMENT: u8 = 0x20;
const FHD_CONTENT_SIZE_SHIFT: u8 = 6;

/// Smallest window a descriptor byte can express (exponent 0, mantissa 0).
const MIN_WINDOW_SIZE: u64 = 1024;

/// What kind of frame a magic number announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// A standard Zstandard frame carrying compressed content.
    Standard,
    /// A skippable frame: opaque payload of the given size, no content.
    Skippable {
        /// Declared payload size, excluding the 8 header bytes.
        size: u32,
    },
}

/// Frame content size field, tagged with its encoded width.
///
/// The same logical size can travel in several widths; decoding preserves
/// the width that was actually used so callers can reason about the exact
/// bytes, and [`ContentSize::value`] collapses it to the logical size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSize {
    /// Not recorded; the decoder learns the size by consuming all blocks.
    Unknown,
    /// 1-byte field, only valid in single-segment frames.
    Small(u8),
    /// 2-byte field storing `value - 256`.
    Offset16(u16),
    /// 4-byte field.
    Wide32(u32),
    /// 8-byte field.
    Wide64(u64),
}

impl ContentSize {
    /// Logical content size, if recorded.
    pub fn value(&self) -> Option<u64> {
        match *self {
            ContentSize::Unknown => None,
            ContentSize::Small(v) => Some(u64::from(v)),
            ContentSize::Offset16(v) => Some(u64::from(v) + 256),
            ContentSize::Wide32(v) => Some(u64::from(v)),
            ContentSize::Wide64(v) => Some(v),
        }
    }

    /// Encoded field width in bytes.
    pub fn field_width(&self) -> usize {
        match self {
            ContentSize::Unknown => 0,
            ContentSize::Small(_) => 1,
            ContentSize::Offset16(_) => 2,
            ContentSize::Wide32(_) => 4,
            ContentSize::Wide64(_) => 8,
        }
    }

    /// Smallest representation for a known size.
    ///
    /// The 1-byte class exists only in single-segment frames; without that
    /// flag, sizes under 256 skip to the 4-byte class because the 2-byte
    /// class cannot reach below 256.
    pub fn for_value(len: u64, single_segment: bool) -> Self {
        if single_segment && len <= 255 {
            ContentSize::Small(len as u8)
        } else if (256..=u64::from(u16::MAX) + 256).contains(&len) {
            ContentSize::Offset16((len - 256) as u16)
        } else if len <= u64::from(u32::MAX) {
            ContentSize::Wide32(len as u32)
        } else {
            ContentSize::Wide64(len)
        }
    }
}

/// The one-byte window descriptor: `exponent` in the high 5 bits,
/// `mantissa` in the low 3, describing `2^(10+exponent)` plus eighths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowDescriptor(u8);

impl WindowDescriptor {
    /// Wrap a raw descriptor byte.
    pub fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    /// The raw descriptor byte.
    pub fn byte(&self) -> u8 {
        self.0
    }

    /// Window exponent (0-31).
    pub fn exponent(&self) -> u8 {
        self.0 >> 3
    }

    /// Window mantissa (0-7), in eighths of the base.
    pub fn mantissa(&self) -> u8 {
        self.0 & 0x07
    }

    /// The window size this descriptor declares.
    pub fn window_size(&self) -> u64 {
        let base = 1u64 << (10 + u32::from(self.exponent()));
        base + (base >> 3) * u64::from(self.mantissa())
    }

    /// Smallest descriptor whose window covers `min_size`.
    pub fn for_window(min_size: u64) -> Self {
        let min_size = min_size.max(MIN_WINDOW_SIZE);
        for exponent in 0u8..=31 {
            for mantissa in 0u8..=7 {
                let descriptor = Self((exponent << 3) | mantissa);
                if descriptor.window_size() >= min_size {
                    return descriptor;
                }
            }
        }
        Self(0xFF)
    }
}

/// A parsed or to-be-encoded frame header, magic number included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    /// Frame kind announced by the magic number.
    pub kind: FrameKind,
    /// Content size field. Always [`ContentSize::Unknown`] for skippable
    /// frames.
    pub content_size: ContentSize,
    /// Window descriptor; absent in single-segment and skippable frames.
    pub window: Option<WindowDescriptor>,
    /// Dictionary id, if the frame references one.
    pub dictionary_id: Option<u32>,
    /// Whether a content checksum trails the blocks.
    pub checksum: bool,
    /// Encoded header length in bytes, magic included.
    pub header_len: usize,
}

impl FrameHeader {
    /// Header an encoder should use for content of length `len`.
    ///
    /// Known sizes up to the maximum window stay single-segment with the
    /// smallest content-size class; anything larger, or a size the caller
    /// declines to declare (`declare_size == false`), gets a window
    /// descriptor sized to the content.
    pub fn for_content(len: u64, declare_size: bool, checksum: bool) -> Self {
        if declare_size && len <= MAX_WINDOW_SIZE as u64 {
            let content_size = ContentSize::for_value(len, true);
            let header_len = 5 + content_size.field_width();
            return Self {
                kind: FrameKind::Standard,
                content_size,
                window: None,
                dictionary_id: None,
                checksum,
                header_len,
            };
        }

        let content_size = if declare_size {
            ContentSize::for_value(len, false)
        } else {
            ContentSize::Unknown
        };
        let window = WindowDescriptor::for_window(len.min(MAX_WINDOW_SIZE as u64));
        Self {
            kind: FrameKind::Standard,
            content_size,
            window: Some(window),
            dictionary_id: None,
            checksum,
            header_len: 6 + content_size.field_width(),
        }
    }

    /// Whether this is a single-segment frame (window descriptor omitted).
    pub fn single_segment(&self) -> bool {
        self.kind == FrameKind::Standard && self.window.is_none()
    }

    /// The back-reference window a decoder must provision: the declared
    /// window, or the content size for single-segment frames.
    pub fn window_size(&self) -> Option<u64> {
        match self.window {
            Some(descriptor) => Some(descriptor.window_size()),
            None => self.content_size.value(),
        }
    }

    /// Serialize the header, magic number included.
    pub fn encode(&self) -> Vec<u8> {
        if let FrameKind::Skippable { size } = self.kind {
            let mut out = Vec::with_capacity(8);
            out.extend_from_slice(&SKIPPABLE_MAGIC_LOW.to_le_bytes());
            out.extend_from_slice(&size.to_le_bytes());
            return out;
        }

        let mut out = Vec::with_capacity(self.header_len);
        out.extend_from_slice(&ZSTD_MAGIC);

        let content_size_flag: u8 = match self.content_size {
            ContentSize::Unknown | ContentSize::Small(_) => 0,
            ContentSize::Offset16(_) => 1,
            ContentSize::Wide32(_) => 2,
            ContentSize::Wide64(_) => 3,
        };
        let dict_id_flag: u8 = match self.dictionary_id {
            None => 0,
            Some(id) if id <= 0xFF => 1,
            Some(id) if id <= 0xFFFF => 2,
            Some(_) => 3,
        };

        let mut descriptor = (content_size_flag << FHD_CONTENT_SIZE_SHIFT) | dict_id_flag;
        if self.window.is_none() {
            descriptor |= FHD_SINGLE_SEGMENT;
        }
        if self.checksum {
            descriptor |= FHD_CONTENT_CHECKSUM;
        }
        out.push(descriptor);

        if let Some(window) = self.window {
            out.push(window.byte());
        }
        match (dict_id_flag, self.dictionary_id) {
            (1, Some(id)) => out.push(id as u8),
            (2, Some(id)) => out.extend_from_slice(&(id as u16).to_le_bytes()),
            (3, Some(id)) => out.extend_from_slice(&id.to_le_bytes()),
            _ => {}
        }
        match self.content_size {
            ContentSize::Unknown => {}
            ContentSize::Small(v) => out.push(v),
            ContentSize::Offset16(v) => out.extend_from_slice(&v.to_le_bytes()),
            ContentSize::Wide32(v) => out.extend_from_slice(&v.to_le_bytes()),
            ContentSize::Wide64(v) => out.extend_from_slice(&v.to_le_bytes()),
        }

        out
    }

    /// Parse a frame header from the start of `data`.
    ///
    /// Only the header region is touched; block bytes may be absent or
    /// arbitrary.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(ZframeError::frame_format(0, "truncated magic number"));
        }
        let magic = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);

        if (SKIPPABLE_MAGIC_LOW..=SKIPPABLE_MAGIC_HIGH).contains(&magic) {
            if data.len() < 8 {
                return Err(ZframeError::frame_format(
                    4,
                    "truncated skippable frame size",
                ));
            }
            let size = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
            return Ok(Self {
                kind: FrameKind::Skippable { size },
                content_size: ContentSize::Unknown,
                window: None,
                dictionary_id: None,
                checksum: false,
                header_len: 8,
            });
        }

        if data[0..4] != ZSTD_MAGIC {
            return Err(ZframeError::frame_format(
                0,
                format!("invalid magic number {:02x?}", &data[0..4]),
            ));
        }
        if data.len() < 5 {
            return Err(ZframeError::frame_format(
                4,
                "missing frame header descriptor",
            ));
        }

        let descriptor = data[4];
        if descriptor & FHD_RESERVED != 0 {
            return Err(ZframeError::frame_format(4, "reserved descriptor bit set"));
        }
        let single_segment = descriptor & FHD_SINGLE_SEGMENT != 0;
        let checksum = descriptor & FHD_CONTENT_CHECKSUM != 0;
        let dict_id_flag = descriptor & FHD_DICT_ID_MASK;
        let content_size_flag = descriptor >> FHD_CONTENT_SIZE_SHIFT;

        let mut pos = 5usize;

        let window = if single_segment {
            None
        } else {
            let Some(&byte) = data.get(pos) else {
                return Err(ZframeError::frame_format(
                    pos as u64,
                    "missing window descriptor",
                ));
            };
            pos += 1;
            Some(WindowDescriptor::from_byte(byte))
        };

        let dict_width = match dict_id_flag {
            0 => 0,
            1 => 1,
            2 => 2,
            _ => 4,
        };
        let dictionary_id = if dict_width == 0 {
            None
        } else {
            let Some(field) = data.get(pos..pos + dict_width) else {
                return Err(ZframeError::frame_format(
                    pos as u64,
                    "truncated dictionary id",
                ));
            };
            pos += dict_width;
            let mut bytes = [0u8; 4];
            bytes[..dict_width].copy_from_slice(field);
            Some(u32::from_le_bytes(bytes))
        };

        // Content-size width follows from the flag, except that flag 0
        // means "1 byte" in single-segment frames and "absent" otherwise.
        // Every width is accepted for any value it can represent.
        let content_size = match (content_size_flag, single_segment) {
            (0, false) => ContentSize::Unknown,
            (0, true) => {
                let Some(&v) = data.get(pos) else {
                    return Err(ZframeError::frame_format(
                        pos as u64,
                        "truncated content size",
                    ));
                };
                pos += 1;
                ContentSize::Small(v)
            }
            (1, _) => {
                let Some(field) = data.get(pos..pos + 2) else {
                    return Err(ZframeError::frame_format(
                        pos as u64,
                        "truncated content size",
                    ));
                };
                pos += 2;
                ContentSize::Offset16(u16::from_le_bytes([field[0], field[1]]))
            }
            (2, _) => {
                let Some(field) = data.get(pos..pos + 4) else {
                    return Err(ZframeError::frame_format(
                        pos as u64,
                        "truncated content size",
                    ));
                };
                pos += 4;
                ContentSize::Wide32(u32::from_le_bytes([field[0], field[1], field[2], field[3]]))
            }
            (3, _) => {
                let Some(field) = data.get(pos..pos + 8) else {
                    return Err(ZframeError::frame_format(
                        pos as u64,
                        "truncated content size",
                    ));
                };
                pos += 8;
                ContentSize::Wide64(u64::from_le_bytes([
                    field[0], field[1], field[2], field[3], field[4], field[5], field[6], field[7],
                ]))
            }
            _ => unreachable!(),
        };

        Ok(Self {
            kind: FrameKind::Standard,
            content_size,
            window,
            dictionary_id,
            checksum,
            header_len: pos,
        })
    }
}

/// Parse the frame header at the start of `data` without touching block
/// bytes.
///
/// This is the introspection entry point: it succeeds on any structurally
/// valid header even when the rest of the frame is absent or malformed.
pub fn parse_frame_header(data: &[u8]) -> Result<FrameHeader> {
    FrameHeader::decode(data)
}
