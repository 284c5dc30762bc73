//! # ZFrame Core
//!
//! Core components for the ZFrame Zstandard frame container library.
//!
//! This crate provides the building blocks shared by the frame engine and
//! the block codec:
//!
//! - [`error`]: the library error type and `Result` alias
//! - [`bits`]: bit-level readers for entropy-coded payloads
//! - [`traits`]: the block codec capability trait
//!
//! ## Architecture
//!
//! ZFrame is layered the same way the frame format itself is:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ zframe: frame container                              │
//! │     magic, header, block sequence, checksum          │
//! ├──────────────────────────────────────────────────────┤
//! │ zframe-block: block codec                            │
//! │     literals, Huffman, FSE, sequences                │
//! ├──────────────────────────────────────────────────────┤
//! │ zframe-core (this crate)                             │
//! │     errors, bit readers, BlockCodec trait            │
//! └──────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bits;
pub mod error;
pub mod traits;

// Re-exports for convenience
pub use bits::{ForwardBitReader, ReverseBitReader};
pub use error::{Result, ZframeError};
pub use traits::{BlockCodec, StoreCodec};
