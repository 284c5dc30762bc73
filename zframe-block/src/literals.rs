//! Literals section decoding.
//!
//! The literals section opens every compressed block. Its payload is either
//! stored (Raw), a repeated byte (RLE), or Huffman-compressed in one or four
//! streams, optionally reusing the previous block's table (Treeless).

use crate::huffman::{HuffmanTable, decode_stream, read_huffman_table};
use zframe_core::error::{Result, ZframeError};

/// Largest regenerated literals payload a block may carry.
const MAX_LITERALS: usize = 128 * 1024;

/// Literals payload representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralsKind {
    /// Stored bytes.
    Raw,
    /// One byte repeated.
    Rle,
    /// Huffman-compressed, table included.
    Compressed,
    /// Huffman-compressed, reuses the previous table.
    Treeless,
}

impl LiteralsKind {
    /// Decode the 2-bit type field.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => LiteralsKind::Raw,
            1 => LiteralsKind::Rle,
            2 => LiteralsKind::Compressed,
            3 => LiteralsKind::Treeless,
            _ => unreachable!(),
        }
    }
}

/// Parsed literals section header.
#[derive(Debug)]
pub struct LiteralsHeader {
    /// Payload representation.
    pub kind: LiteralsKind,
    /// Size after decoding.
    pub regenerated_size: usize,
    /// Size of the stored payload (table plus streams for compressed kinds).
    pub compressed_size: usize,
    /// Whether the payload is split into four streams.
    pub four_streams: bool,
    /// Header size in bytes.
    pub header_size: usize,
}

/// Parse the literals section header at the start of `data`.
pub fn parse_literals_header(data: &[u8]) -> Result<LiteralsHeader> {
    let Some(&byte0) = data.first() else {
        return Err(ZframeError::block_decode("empty literals section"));
    };

    let kind = LiteralsKind::from_bits(byte0);
    let size_format = (byte0 >> 2) & 0x03;

    match kind {
        LiteralsKind::Raw | LiteralsKind::Rle => {
            let (regenerated_size, header_size) = match size_format {
                // One-byte header, 5-bit size; bit 3 repurposes the unused
                // stream flag, so formats 0 and 2 read identically.
                0 | 2 => ((byte0 >> 3) as usize, 1),
                1 => {
                    if data.len() < 2 {
                        return Err(ZframeError::block_decode("truncated literals header"));
                    }
                    (((byte0 >> 4) as usize) | ((data[1] as usize) << 4), 2)
                }
                3 => {
                    if data.len() < 3 {
                        return Err(ZframeError::block_decode("truncated literals header"));
                    }
                    let size = ((byte0 >> 4) as usize)
                        | ((data[1] as usize) << 4)
                        | ((data[2] as usize) << 12);
                    (size, 3)
                }
                _ => unreachable!(),
            };

            Ok(LiteralsHeader {
                kind,
                regenerated_size,
                compressed_size: if kind == LiteralsKind::Rle {
                    1
                } else {
                    regenerated_size
                },
                four_streams: false,
                header_size,
            })
        }
        LiteralsKind::Compressed | LiteralsKind::Treeless => {
            let (regenerated_size, compressed_size, four_streams, header_size) = match size_format {
                0 | 1 => {
                    if data.len() < 3 {
                        return Err(ZframeError::block_decode("truncated literals header"));
                    }
                    let combined =
                        ((byte0 >> 4) as u32) | ((data[1] as u32) << 4) | ((data[2] as u32) << 12);
                    let regen = (combined & 0x3FF) as usize;
                    let comp = ((combined >> 10) & 0x3FF) as usize;
                    (regen, comp, size_format == 1, 3)
                }
                2 => {
                    if data.len() < 4 {
                        return Err(ZframeError::block_decode("truncated literals header"));
                    }
                    let combined = ((byte0 >> 4) as u32)
                        | ((data[1] as u32) << 4)
                        | ((data[2] as u32) << 12)
                        | ((data[3] as u32) << 20);
                    let regen = (combined & 0x3FFF) as usize;
                    let comp = ((combined >> 14) & 0x3FFF) as usize;
                    (regen, comp, true, 4)
                }
                3 => {
                    if data.len() < 5 {
                        return Err(ZframeError::block_decode("truncated literals header"));
                    }
                    let combined = ((byte0 >> 4) as u64)
                        | ((data[1] as u64) << 4)
                        | ((data[2] as u64) << 12)
                        | ((data[3] as u64) << 20)
                        | ((data[4] as u64) << 28);
                    let regen = (combined & 0x3FFFF) as usize;
                    let comp = ((combined >> 18) & 0x3FFFF) as usize;
                    (regen, comp, true, 5)
                }
                _ => unreachable!(),
            };

            Ok(LiteralsHeader {
                kind,
                regenerated_size,
                compressed_size,
                four_streams,
                header_size,
            })
        }
    }
}

/// Literals decoder, carrying the Huffman table between blocks for the
/// Treeless representation.
#[derive(Debug, Default)]
pub struct LiteralsState {
    table: Option<HuffmanTable>,
}

impl LiteralsState {
    /// Create a fresh decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the carried table.
    pub fn reset(&mut self) {
        self.table = None;
    }

    /// Decode the literals section at the start of `data`.
    ///
    /// Returns the literal bytes and the section length consumed.
    pub fn decode(&mut self, data: &[u8]) -> Result<(Vec<u8>, usize)> {
        let header = parse_literals_header(data)?;
        if header.regenerated_size > MAX_LITERALS {
            return Err(ZframeError::block_decode(format!(
                "literals regenerate {} bytes, above the 128 KiB block limit",
                header.regenerated_size
            )));
        }

        let content = &data[header.header_size..];

        match header.kind {
            LiteralsKind::Raw => {
                if content.len() < header.regenerated_size {
                    return Err(ZframeError::block_decode("truncated raw literals"));
                }
                let literals = content[..header.regenerated_size].to_vec();
                Ok((literals, header.header_size + header.regenerated_size))
            }
            LiteralsKind::Rle => {
                let Some(&byte) = content.first() else {
                    return Err(ZframeError::block_decode("missing RLE literal byte"));
                };
                let literals = vec![byte; header.regenerated_size];
                Ok((literals, header.header_size + 1))
            }
            LiteralsKind::Compressed => {
                let payload = Self::payload(content, &header)?;
                let (table, table_bytes) = read_huffman_table(payload)?;
                let literals = Self::decode_streams(
                    &table,
                    &payload[table_bytes..],
                    header.regenerated_size,
                    header.four_streams,
                )?;
                self.table = Some(table);
                Ok((literals, header.header_size + header.compressed_size))
            }
            LiteralsKind::Treeless => {
                let payload = Self::payload(content, &header)?;
                let table = self.table.as_ref().ok_or_else(|| {
                    ZframeError::block_decode("treeless literals without a previous table")
                })?;
                let literals = Self::decode_streams(
                    table,
                    payload,
                    header.regenerated_size,
                    header.four_streams,
                )?;
                Ok((literals, header.header_size + header.compressed_size))
            }
        }
    }

    fn payload<'a>(content: &'a [u8], header: &LiteralsHeader) -> Result<&'a [u8]> {
        content
            .get(..header.compressed_size)
            .ok_or_else(|| ZframeError::block_decode("truncated compressed literals"))
    }

    fn decode_streams(
        table: &HuffmanTable,
        data: &[u8],
        regenerated_size: usize,
        four_streams: bool,
    ) -> Result<Vec<u8>> {
        if regenerated_size == 0 {
            return Ok(Vec::new());
        }
        if !four_streams {
            return decode_stream(table, data, regenerated_size);
        }

        // Jump table: sizes of the first three streams, 16-bit little-endian.
        if data.len() < 6 {
            return Err(ZframeError::block_decode("truncated literal jump table"));
        }
        let size1 = u16::from_le_bytes([data[0], data[1]]) as usize;
        let size2 = u16::from_le_bytes([data[2], data[3]]) as usize;
        let size3 = u16::from_le_bytes([data[4], data[5]]) as usize;

        let streams = &data[6..];
        let head = size1 + size2 + size3;
        if head > streams.len() {
            return Err(ZframeError::block_decode("literal stream sizes overflow"));
        }

        let quarter = regenerated_size.div_ceil(4);
        let Some(last_quarter) = regenerated_size.checked_sub(3 * quarter) else {
            return Err(ZframeError::block_decode(
                "regenerated size too small for four streams",
            ));
        };

        let mut literals = Vec::with_capacity(regenerated_size);
        literals.extend(decode_stream(table, &streams[..size1], quarter)?);
        literals.extend(decode_stream(table, &streams[size1..size1 + size2], quarter)?);
        literals.extend(decode_stream(table, &streams[size1 + size2..head], quarter)?);
        literals.extend(decode_stream(table, &streams[head..], last_quarter)?);

        Ok(literals)
    }
}
