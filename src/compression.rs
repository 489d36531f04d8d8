//! Decompressors the pipelines hand off to.
//!
//! These are thin adapters; the algorithms themselves are provided by
//! `flate2`, `xz2` and `lz4_flex`.
use std::io::{Cursor, Read};

use flate2::read::DeflateDecoder;
use log::trace;

use crate::constants::*;
use crate::error::{DecryptError, Result};

/// Inflate a raw DEFLATE stream (no zlib header).
pub fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() * 2);
    DeflateDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| DecryptError::Decompress(format!("deflate: {e}")))?;
    Ok(out)
}

/// Decompress container-style LZMA: 5 property bytes followed by the raw
/// stream, with the uncompressed size known from outside.
pub fn lzma(data: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
    if data.len() < 5 {
        return Err(DecryptError::Decompress("lzma: missing properties".into()));
    }

    // Rebuild the 13 byte .lzma header the decoder expects.
    let mut header = Vec::with_capacity(13);
    header.extend_from_slice(&data[..5]);
    header.extend_from_slice(&(uncompressed_size as u64).to_le_bytes());
    let mut reader = Cursor::new(header).chain(&data[5..]);

    let stream = xz2::stream::Stream::new_lzma_decoder(u64::MAX)
        .map_err(|e| DecryptError::Decompress(format!("lzma: {e}")))?;
    let mut decoder = xz2::read::XzDecoder::new_stream(&mut reader, stream);

    let mut out = Vec::with_capacity(uncompressed_size);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| DecryptError::Decompress(format!("lzma: {e}")))?;
    Ok(out)
}

/// Decompress a raw LZ4 block of known output size.
pub fn lz4(data: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
    lz4_flex::block::decompress(data, uncompressed_size)
        .map_err(|e| DecryptError::Decompress(format!("lz4: {e}")))
}

/// Decompress a block index according to the algorithm id in the bundle flags.
pub fn decompress_block_index(data: &[u8], uncompressed_size: usize, flags: u32) -> Result<Vec<u8>> {
    let algorithm = flags & BUNDLE_COMPRESSION_MASK;
    trace!(
        "block index: algorithm {}, {} -> {} bytes",
        algorithm,
        data.len(),
        uncompressed_size
    );

    if algorithm != COMPRESSION_NONE && uncompressed_size > data.len().saturating_mul(BLOCK_INDEX_MAX_EXPANSION) {
        return Err(DecryptError::StructuralOverflow("block index size out of proportion to its data"));
    }

    let out = match algorithm {
        COMPRESSION_NONE => data.to_vec(),
        COMPRESSION_LZMA => lzma(data, uncompressed_size)?,
        COMPRESSION_LZ4 | COMPRESSION_LZ4HC => lz4(data, uncompressed_size)?,
        other => return Err(DecryptError::UnsupportedCompression(other)),
    };

    if out.len() != uncompressed_size {
        return Err(DecryptError::Decompress(format!(
            "block index decompressed to {} bytes, expected {}",
            out.len(),
            uncompressed_size
        )));
    }

    Ok(out)
}
