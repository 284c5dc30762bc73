//! Sequences section decoding.
//!
//! Sequences describe the LZ back-references of a compressed block as
//! (literal length, match length, offset) triples. The three symbol
//! alphabets are FSE-coded with interleaved states over one backward
//! bitstream; symbol codes expand to values through fixed baseline tables
//! and extra bits.

use crate::fse::{FseDecoder, FseTable, parse_fse_table};
use zframe_core::bits::ReverseBitReader;
use zframe_core::error::{Result, ZframeError};

/// A decoded sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sequence {
    /// Literal bytes to copy before the match.
    pub literal_length: usize,
    /// Bytes to copy from the back-reference.
    pub match_length: usize,
    /// Distance of the back-reference.
    pub offset: usize,
}

/// Table representation for one symbol alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolMode {
    /// Distribution fixed by the format.
    Predefined,
    /// Single symbol, zero bits per use.
    Rle,
    /// Distribution transmitted as an FSE table description.
    Fse,
    /// Reuse the previous block's table.
    Repeat,
}

impl SymbolMode {
    /// Decode the 2-bit mode field.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => SymbolMode::Predefined,
            1 => SymbolMode::Rle,
            2 => SymbolMode::Fse,
            3 => SymbolMode::Repeat,
            _ => unreachable!(),
        }
    }
}

/// Parsed sequences section header.
#[derive(Debug)]
pub struct SequencesHeader {
    /// Number of sequences in the block.
    pub count: usize,
    /// Literal length table mode.
    pub ll_mode: SymbolMode,
    /// Offset table mode.
    pub of_mode: SymbolMode,
    /// Match length table mode.
    pub ml_mode: SymbolMode,
    /// Header size in bytes.
    pub header_size: usize,
}

/// Parse the sequences section header at the start of `data`.
pub fn parse_sequences_header(data: &[u8]) -> Result<SequencesHeader> {
    let Some(&byte0) = data.first() else {
        return Err(ZframeError::block_decode("empty sequences section"));
    };

    let (count, mut header_size) = if byte0 == 0 {
        (0, 1)
    } else if byte0 < 128 {
        (byte0 as usize, 1)
    } else if byte0 < 255 {
        if data.len() < 2 {
            return Err(ZframeError::block_decode("truncated sequence count"));
        }
        ((((byte0 as usize) - 128) << 8) + data[1] as usize, 2)
    } else {
        if data.len() < 3 {
            return Err(ZframeError::block_decode("truncated sequence count"));
        }
        (
            (data[1] as usize) + ((data[2] as usize) << 8) + 0x7F00,
            3,
        )
    };

    if count == 0 {
        return Ok(SequencesHeader {
            count: 0,
            ll_mode: SymbolMode::Predefined,
            of_mode: SymbolMode::Predefined,
            ml_mode: SymbolMode::Predefined,
            header_size,
        });
    }

    let Some(&modes) = data.get(header_size) else {
        return Err(ZframeError::block_decode("missing symbol mode byte"));
    };
    if modes & 0x03 != 0 {
        return Err(ZframeError::block_decode(
            "reserved bits set in symbol mode byte",
        ));
    }
    header_size += 1;

    Ok(SequencesHeader {
        count,
        ll_mode: SymbolMode::from_bits(modes >> 6),
        of_mode: SymbolMode::from_bits(modes >> 4),
        ml_mode: SymbolMode::from_bits(modes >> 2),
        header_size,
    })
}

/// Alphabet parameters for one of the three sequence symbol kinds.
struct AlphabetSpec {
    name: &'static str,
    max_symbol: u8,
    max_accuracy: u8,
    predefined: fn() -> FseTable,
}

const LL_SPEC: AlphabetSpec = AlphabetSpec {
    name: "literal length",
    max_symbol: 35,
    max_accuracy: 9,
    predefined: predefined_ll_table,
};

const OF_SPEC: AlphabetSpec = AlphabetSpec {
    name: "offset",
    max_symbol: 31,
    max_accuracy: 8,
    predefined: predefined_of_table,
};

const ML_SPEC: AlphabetSpec = AlphabetSpec {
    name: "match length",
    max_symbol: 52,
    max_accuracy: 9,
    predefined: predefined_ml_table,
};

/// Sequences decoder, carrying FSE tables and the repeat-offset history
/// between blocks of one frame.
#[derive(Debug)]
pub struct SequenceState {
    ll_table: Option<FseTable>,
    of_table: Option<FseTable>,
    ml_table: Option<FseTable>,
    repeat_offsets: [usize; 3],
}

impl SequenceState {
    /// Create a fresh decoder.
    pub fn new() -> Self {
        Self {
            ll_table: None,
            of_table: None,
            ml_table: None,
            repeat_offsets: [1, 4, 8],
        }
    }

    /// Drop carried tables and restore the initial repeat offsets.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Decode the sequences section, which must span the whole of `data`.
    pub fn decode(&mut self, data: &[u8]) -> Result<Vec<Sequence>> {
        let header = parse_sequences_header(data)?;

        if header.count == 0 {
            if data.len() > header.header_size {
                return Err(ZframeError::block_decode(
                    "unexpected bytes after empty sequences section",
                ));
            }
            return Ok(Vec::new());
        }

        let mut pos = header.header_size;
        pos += install_table(&mut self.ll_table, &data[pos..], header.ll_mode, &LL_SPEC)?;
        pos += install_table(&mut self.of_table, &data[pos..], header.of_mode, &OF_SPEC)?;
        pos += install_table(&mut self.ml_table, &data[pos..], header.ml_mode, &ML_SPEC)?;

        let ll_table = required(&self.ll_table, &LL_SPEC)?;
        let of_table = required(&self.of_table, &OF_SPEC)?;
        let ml_table = required(&self.ml_table, &ML_SPEC)?;

        let mut reader = ReverseBitReader::new(&data[pos..])?;
        let mut ll_state = FseDecoder::new(ll_table, &mut reader)?;
        let mut of_state = FseDecoder::new(of_table, &mut reader)?;
        let mut ml_state = FseDecoder::new(ml_table, &mut reader)?;

        let mut sequences = Vec::with_capacity(header.count);
        for i in 0..header.count {
            let of_code = of_state.symbol();
            if of_code > OF_SPEC.max_symbol {
                return Err(ZframeError::block_decode(format!(
                    "invalid offset code {of_code}"
                )));
            }

            // Extra bits are read offset first, then match length, then
            // literal length.
            let offset_value = (1u64 << of_code) + reader.read(of_code)?;
            let match_length = expand_code(ml_state.symbol(), &ML_BASE, &ML_BITS, &mut reader)?;
            let literal_length = expand_code(ll_state.symbol(), &LL_BASE, &LL_BITS, &mut reader)?;

            let offset = resolve_offset(&mut self.repeat_offsets, offset_value, literal_length)?;
            sequences.push(Sequence {
                literal_length,
                match_length,
                offset,
            });

            // All but the last sequence update the states, literal length
            // first, then match length, then offset.
            if i + 1 < header.count {
                ll_state.advance(&mut reader)?;
                ml_state.advance(&mut reader)?;
                of_state.advance(&mut reader)?;
            }
        }

        if reader.remaining() != 0 {
            return Err(ZframeError::block_decode(
                "sequence bitstream not fully consumed",
            ));
        }

        Ok(sequences)
    }
}

impl Default for SequenceState {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn an offset value into a distance, maintaining the three-slot repeat
/// history. Values 1-3 select recent offsets, shifted by one when the
/// sequence copies no literals.
fn resolve_offset(
    repeat_offsets: &mut [usize; 3],
    offset_value: u64,
    literal_length: usize,
) -> Result<usize> {
    if offset_value > 3 {
        let offset = (offset_value - 3) as usize;
        *repeat_offsets = [offset, repeat_offsets[0], repeat_offsets[1]];
        return Ok(offset);
    }

    let index = offset_value as usize - 1 + usize::from(literal_length == 0);
    if index == 0 {
        return Ok(repeat_offsets[0]);
    }

    let offset = if index < 3 {
        repeat_offsets[index]
    } else {
        repeat_offsets[0].wrapping_sub(1)
    };
    if offset == 0 {
        return Err(ZframeError::block_decode("sequence offset is zero"));
    }

    if index > 1 {
        repeat_offsets[2] = repeat_offsets[1];
    }
    repeat_offsets[1] = repeat_offsets[0];
    repeat_offsets[0] = offset;
    Ok(offset)
}

/// Prepare one alphabet's table according to its mode, returning the bytes
/// consumed from `data`.
fn install_table(
    slot: &mut Option<FseTable>,
    data: &[u8],
    mode: SymbolMode,
    spec: &AlphabetSpec,
) -> Result<usize> {
    match mode {
        SymbolMode::Predefined => {
            *slot = Some((spec.predefined)());
            Ok(0)
        }
        SymbolMode::Rle => {
            let Some(&symbol) = data.first() else {
                return Err(ZframeError::block_decode(format!(
                    "missing RLE symbol for {} table",
                    spec.name
                )));
            };
            if symbol > spec.max_symbol {
                return Err(ZframeError::block_decode(format!(
                    "RLE symbol {symbol} out of range for {} table",
                    spec.name
                )));
            }
            *slot = Some(FseTable::rle(symbol));
            Ok(1)
        }
        SymbolMode::Fse => {
            let (table, consumed) = parse_fse_table(data, spec.max_accuracy, spec.max_symbol)?;
            *slot = Some(table);
            Ok(consumed)
        }
        SymbolMode::Repeat => {
            if slot.is_none() {
                return Err(ZframeError::block_decode(format!(
                    "repeat mode without a previous {} table",
                    spec.name
                )));
            }
            Ok(0)
        }
    }
}

fn required<'a>(slot: &'a Option<FseTable>, spec: &AlphabetSpec) -> Result<&'a FseTable> {
    slot.as_ref()
        .ok_or_else(|| ZframeError::block_decode(format!("missing {} table", spec.name)))
}

/// Expand a symbol code to its value using baseline and extra-bit tables.
fn expand_code(
    code: u8,
    base: &[u32],
    bits: &[u8],
    reader: &mut ReverseBitReader,
) -> Result<usize> {
    let idx = code as usize;
    if idx >= base.len() {
        return Err(ZframeError::block_decode(format!(
            "invalid sequence symbol code {code}"
        )));
    }
    let extra = reader.read(bits[idx])?;
    Ok(base[idx] as usize + extra as usize)
}

/// Literal length code expansion.
const LL_BASE: [u32; 36] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 18, 20, 22, 24, 28, 32, 40, 48, 64,
    128, 256, 512, 1024, 2048, 4096, 8192, 16384, 32768, 65536,
];
const LL_BITS: [u8; 36] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 3, 3, 4, 6, 7, 8, 9, 10, 11,
    12, 13, 14, 15, 16,
];

/// Match length code expansion.
const ML_BASE: [u32; 53] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27,
    28, 29, 30, 31, 32, 33, 34, 35, 37, 39, 41, 43, 47, 51, 59, 67, 83, 99, 131, 259, 515, 1027,
    2051, 4099, 8195, 16387, 32771, 65539,
];
const ML_BITS: [u8; 53] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 1, 1, 1, 1, 2, 2, 3, 3, 4, 4, 5, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16,
];

/// Default literal length distribution, accuracy log 6.
const LL_DEFAULT: [i16; 36] = [
    4, 3, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 1, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 3, 2, 1, 1, 1, 1,
    1, -1, -1, -1, -1,
];

/// Default offset distribution, accuracy log 5.
const OF_DEFAULT: [i16; 29] = [
    1, 1, 1, 1, 1, 1, 2, 2, 2, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, -1, -1, -1, -1, -1,
];

/// Default match length distribution, accuracy log 6.
const ML_DEFAULT: [i16; 53] = [
    1, 4, 3, 2, 2, 2, 2, 2, 2, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, -1, -1, -1, -1, -1, -1, -1,
];

fn predefined_ll_table() -> FseTable {
    FseTable::from_probabilities(6, &LL_DEFAULT)
        .expect("default literal length distribution is valid")
}

fn predefined_of_table() -> FseTable {
    FseTable::from_probabilities(5, &OF_DEFAULT).expect("default offset distribution is valid")
}

fn predefined_ml_table() -> FseTable {
    FseTable::from_probabilities(6, &ML_DEFAULT)
        .expect("default match length distribution is valid")
}
