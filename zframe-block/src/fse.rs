//! Finite State Entropy decoding.
//!
//! FSE drives the sequences section and the compressed form of Huffman
//! weight descriptions. A decoding table maps each state to a symbol, a bit
//! count, and a baseline for the next state; the bitstream is read backward.

use zframe_core::bits::{ForwardBitReader, ReverseBitReader};
use zframe_core::error::{Result, ZframeError};

/// One state of an FSE decoding table.
#[derive(Debug, Clone, Copy, Default)]
pub struct FseTableEntry {
    /// Symbol emitted while in this state.
    pub symbol: u8,
    /// Bits to read for the state transition.
    pub num_bits: u8,
    /// Baseline added to the read bits to form the next state.
    pub baseline: u16,
}

/// FSE decoding table.
#[derive(Debug, Clone)]
pub struct FseTable {
    entries: Vec<FseTableEntry>,
    accuracy_log: u8,
}

impl FseTable {
    /// Build a decoding table from normalized probabilities.
    ///
    /// A probability of `-1` marks a low-probability symbol that occupies a
    /// single state at the top of the table and forces a full state reload.
    /// The probabilities must sum (counting `-1` as one state) to exactly
    /// `1 << accuracy_log`.
    pub fn from_probabilities(accuracy_log: u8, probabilities: &[i16]) -> Result<Self> {
        let table_size = 1usize << accuracy_log;

        let used: usize = probabilities
            .iter()
            .map(|&p| if p == -1 { 1 } else { p.max(0) as usize })
            .sum();
        if used != table_size {
            return Err(ZframeError::block_decode(format!(
                "probability distribution fills {used} of {table_size} states"
            )));
        }

        // state_desc[s] counts upward from the symbol's frequency as its
        // states are visited in index order; it determines bit counts and
        // baselines below.
        let mut state_desc = vec![0u16; probabilities.len()];
        let mut symbols = vec![0u8; table_size];

        // Low-probability symbols occupy the top of the table.
        let mut high_threshold = table_size;
        for (symbol, &prob) in probabilities.iter().enumerate() {
            if prob == -1 {
                high_threshold -= 1;
                symbols[high_threshold] = symbol as u8;
                state_desc[symbol] = 1;
            }
        }

        // Remaining symbols are spread with the standard step, skipping the
        // region reserved above.
        let step = (table_size >> 1) + (table_size >> 3) + 3;
        let mask = table_size - 1;
        let mut position = 0usize;
        for (symbol, &prob) in probabilities.iter().enumerate() {
            if prob <= 0 {
                continue;
            }
            state_desc[symbol] = prob as u16;
            for _ in 0..prob {
                symbols[position] = symbol as u8;
                loop {
                    position = (position + step) & mask;
                    if position < high_threshold {
                        break;
                    }
                }
            }
        }
        if position != 0 {
            return Err(ZframeError::block_decode(
                "probability distribution did not close the state table",
            ));
        }

        let mut entries = vec![FseTableEntry::default(); table_size];
        for (state, entry) in entries.iter_mut().enumerate() {
            let symbol = symbols[state];
            let next = state_desc[symbol as usize];
            state_desc[symbol as usize] += 1;

            let num_bits = accuracy_log - highest_set_bit(next);
            entry.symbol = symbol;
            entry.num_bits = num_bits;
            entry.baseline = (next << num_bits).wrapping_sub(table_size as u16);
        }

        Ok(Self {
            entries,
            accuracy_log,
        })
    }

    /// Build the single-state table an RLE symbol mode uses.
    pub fn rle(symbol: u8) -> Self {
        Self {
            entries: vec![FseTableEntry {
                symbol,
                num_bits: 0,
                baseline: 0,
            }],
            accuracy_log: 0,
        }
    }

    /// Entry for a given state.
    #[inline]
    pub fn get(&self, state: usize) -> &FseTableEntry {
        &self.entries[state]
    }

    /// Accuracy log of this table.
    pub fn accuracy_log(&self) -> u8 {
        self.accuracy_log
    }

    /// Number of states.
    pub fn size(&self) -> usize {
        self.entries.len()
    }
}

/// FSE decoder state over a backward bitstream.
pub struct FseDecoder<'t> {
    table: &'t FseTable,
    state: usize,
}

impl<'t> FseDecoder<'t> {
    /// Initialize by reading `accuracy_log` bits for the first state.
    pub fn new(table: &'t FseTable, reader: &mut ReverseBitReader) -> Result<Self> {
        let state = reader.read(table.accuracy_log())? as usize;
        Ok(Self { table, state })
    }

    /// Symbol for the current state.
    pub fn symbol(&self) -> u8 {
        self.table.get(self.state).symbol
    }

    /// Bits the next transition will consume.
    pub fn transition_bits(&self) -> u8 {
        self.table.get(self.state).num_bits
    }

    /// Advance to the next state.
    pub fn advance(&mut self, reader: &mut ReverseBitReader) -> Result<()> {
        let entry = self.table.get(self.state);
        let bits = reader.read(entry.num_bits)?;
        self.state = entry.baseline as usize + bits as usize;
        Ok(())
    }
}

/// Parse an FSE table description from the start of `data`.
///
/// Returns the table and the number of bytes the description occupied. The
/// description is a forward bitstream: 4 bits of accuracy log (minus 5),
/// then variable-width probabilities with the shrinking-threshold scheme and
/// 2-bit zero-repeat flags.
pub fn parse_fse_table(data: &[u8], max_accuracy: u8, max_symbol: u8) -> Result<(FseTable, usize)> {
    let mut reader = ForwardBitReader::new(data);

    let accuracy_log = reader.read(4)? as u8 + 5;
    if accuracy_log > max_accuracy {
        return Err(ZframeError::block_decode(format!(
            "accuracy log {accuracy_log} exceeds maximum {max_accuracy}"
        )));
    }

    let table_size = 1i32 << accuracy_log;
    let mut remaining = table_size + 1;
    let mut threshold = table_size;
    let mut value_bits = accuracy_log + 1;
    let mut probabilities: Vec<i16> = Vec::new();

    while remaining > 1 {
        if probabilities.len() > max_symbol as usize {
            return Err(ZframeError::block_decode(
                "too many symbols in FSE table description",
            ));
        }

        // Values below `small_cutoff` fit in one fewer bit.
        let small_cutoff = 2 * threshold - 1 - remaining;
        let low = reader.read(value_bits - 1)? as i32;
        let value = if low < small_cutoff {
            low
        } else {
            let high = reader.read(1)? as i32;
            let full = low | (high << (value_bits - 1));
            if full >= threshold {
                full - small_cutoff
            } else {
                full
            }
        };

        let prob = (value - 1) as i16;
        remaining -= if prob < 0 { 1 } else { i32::from(prob) };
        probabilities.push(prob);

        if prob == 0 {
            loop {
                let repeat = reader.read(2)?;
                probabilities.extend(std::iter::repeat_n(0i16, repeat as usize));
                if repeat < 3 {
                    break;
                }
            }
        }

        while remaining < threshold {
            value_bits -= 1;
            threshold >>= 1;
        }
    }

    if remaining != 1 {
        return Err(ZframeError::block_decode(
            "FSE table description overruns the state budget",
        ));
    }
    if probabilities.len() > max_symbol as usize + 1 {
        return Err(ZframeError::block_decode(
            "too many symbols in FSE table description",
        ));
    }

    let table = FseTable::from_probabilities(accuracy_log, &probabilities)?;
    Ok((table, reader.bytes_consumed()))
}

/// Position of the highest set bit, 0-indexed. Zero maps to zero.
#[inline]
pub(crate) fn highest_set_bit(value: u16) -> u8 {
    if value == 0 {
        0
    } else {
        15 - value.leading_zeros() as u8
    }
}
