//! Error types for ZFrame operations.
//!
//! A single enum covers the four failure classes a frame operation can hit:
//! structural format violations, truncated input, block codec rejections,
//! and content checksum mismatches. Every error is terminal for the
//! operation that raised it; no partial output accompanies an error.

use thiserror::Error;

/// The main error type for ZFrame operations.
#[derive(Debug, Error)]
pub enum ZframeError {
    /// The byte sequence is not a structurally valid frame.
    #[error("invalid frame at offset {offset}: {message}")]
    FrameFormat {
        /// Byte offset where the violation was detected.
        offset: u64,
        /// Description of the violation.
        message: String,
    },

    /// The input ended before the frame did.
    #[error("frame truncated at offset {offset}: {message}")]
    IncompleteFrame {
        /// Byte offset where more input was expected.
        offset: u64,
        /// Description of what was missing.
        message: String,
    },

    /// The block codec rejected a compressed block payload.
    #[error("block decode failed: {message}")]
    BlockDecode {
        /// Description of the malformed payload.
        message: String,
    },

    /// The stored content checksum does not match the decoded content.
    #[error("content checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        /// Checksum stored in the frame trailer.
        stored: u32,
        /// Checksum computed over the decoded content.
        computed: u32,
    },
}

/// Result type alias for ZFrame operations.
pub type Result<T> = std::result::Result<T, ZframeError>;

impl ZframeError {
    /// Create a frame format error.
    pub fn frame_format(offset: u64, message: impl Into<String>) -> Self {
        Self::FrameFormat {
            offset,
            message: message.into(),
        }
    }

    /// Create an incomplete frame error.
    pub fn incomplete(offset: u64, message: impl Into<String>) -> Self {
        Self::IncompleteFrame {
            offset,
            message: message.into(),
        }
    }

    /// Create a block decode error.
    pub fn block_decode(message: impl Into<String>) -> Self {
        Self::BlockDecode {
            message: message.into(),
        }
    }

    /// Create a checksum mismatch error.
    pub fn checksum_mismatch(stored: u32, computed: u32) -> Self {
        Self::ChecksumMismatch { stored, computed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ZframeError::frame_format(4, "reserved bit set");
        assert!(err.to_string().contains("offset 4"));
        assert!(err.to_string().contains("reserved bit set"));

        let err = ZframeError::checksum_mismatch(0x12345678, 0xDEADBEEF);
        assert!(err.to_string().contains("0x12345678"));
        assert!(err.to_string().contains("0xdeadbeef"));

        let err = ZframeError::block_decode("bad literals header");
        assert!(err.to_string().contains("bad literals header"));
    }

    #[test]
    fn test_error_kinds_are_distinct() {
        assert!(matches!(
            ZframeError::incomplete(0, "eof"),
            ZframeError::IncompleteFrame { .. }
        ));
        assert!(matches!(
            ZframeError::frame_format(0, "bad"),
            ZframeError::FrameFormat { .. }
        ));
    }
}
