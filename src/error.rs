//! Decryption error taxonomy.
use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DecryptError>;

/// Everything the decryption engine can reject.
///
/// Only [`DecryptError::FormatMismatch`] is recoverable: the caller treats
/// the input as plaintext and passes it through. Every other variant means
/// the key was wrong or the data is corrupt, and no partial output exists.
#[derive(Debug, Error)]
pub enum DecryptError {
    /// Leading magic or signature is not one we recognise.
    #[error("input is not in a recognised protected format")]
    FormatMismatch,

    /// Bytes that must be zero after decryption were not.
    #[error("non-zero padding after decryption")]
    PaddingViolation,

    /// Embedded checksum disagrees with the decrypted payload.
    #[error("checksum mismatch: stored {stored:08X}, computed {computed:08X}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    /// A declared count or size points past the end of the buffer.
    #[error("structure overflows buffer: {0}")]
    StructuralOverflow(&'static str),

    /// The block cipher rejected the ciphertext (bad length or padding).
    #[error("invalid ciphertext")]
    InvalidCiphertext,

    /// Container format version outside the supported range.
    #[error("unsupported container version: {0}")]
    UnsupportedVersion(u32),

    /// Block index compression algorithm id we cannot decompress.
    #[error("unsupported compression algorithm: {0}")]
    UnsupportedCompression(u32),

    /// A decompressor reported corrupt input.
    #[error("decompression failed: {0}")]
    Decompress(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl DecryptError {
    /// Whether the input must be rejected, as opposed to passed through.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DecryptError::FormatMismatch)
    }
}
