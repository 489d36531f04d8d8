//! Rewrites a platform-B block index into the standard layout.
//!
//! Platform B stores each block record as
//! `[flags:2][reserved:2][compressed:4][uncompressed:4]` and each directory
//! entry with its size ahead of its offset. The standard layout is
//! `[uncompressed:4][compressed:4][flags:2]` and offset-then-size.
use byteorder::{BigEndian, ByteOrder};
use log::{debug, trace};

use crate::constants::*;
use crate::error::{DecryptError, Result};

const COUNT_LEN: usize = 4;

/// Produce the standard-layout block index from a decompressed platform-B one.
///
/// The output is `2 * block_count` bytes shorter than the input. A blob that
/// ends right after the block records is read as having no directory.
pub fn normalize(blob: &[u8]) -> Result<Vec<u8>> {
    let block_count = read_count(blob, BLOCK_INDEX_HASH_LEN, "block count past end of index")?;

    let records_end = block_count
        .checked_mul(SWITCH_BLOCK_RECORD_LEN)
        .and_then(|n| n.checked_add(BLOCK_INDEX_HEADER_LEN))
        .filter(|&end| end <= blob.len())
        .ok_or(DecryptError::StructuralOverflow("block records past end of index"))?;

    let directory_count = if records_end == blob.len() {
        0
    } else {
        read_count(blob, records_end, "directory count past end of index")?
    };
    debug!("normalizing block index: {} blocks, {} directory entries", block_count, directory_count);

    let mut out = vec![0u8; blob.len() - 2 * block_count];
    out[..BLOCK_INDEX_HEADER_LEN].copy_from_slice(&blob[..BLOCK_INDEX_HEADER_LEN]);

    let src_records = BLOCK_INDEX_HEADER_LEN;
    for i in 0..block_count {
        let src = &blob[src_records + SWITCH_BLOCK_RECORD_LEN * i..][..SWITCH_BLOCK_RECORD_LEN];
        let dst = &mut out[src_records + BLOCK_RECORD_LEN * i..][..BLOCK_RECORD_LEN];

        dst[0..4].copy_from_slice(&src[8..12]);
        dst[4..8].copy_from_slice(&src[4..8]);
        dst[8..10].copy_from_slice(&src[0..2]);
    }

    let directory_start = src_records + BLOCK_RECORD_LEN * block_count;
    out[directory_start..].copy_from_slice(&blob[records_end..]);

    let mut cursor = directory_start + COUNT_LEN;
    for i in 0..directory_count {
        let fields = out
            .get_mut(cursor..cursor + 16)
            .ok_or(DecryptError::StructuralOverflow("directory entry past end of index"))?;
        let (first, second) = fields.split_at_mut(8);
        first.swap_with_slice(second);
        trace!(
            "directory entry {}: offset {}, size {}",
            i,
            BigEndian::read_u64(first),
            BigEndian::read_u64(second)
        );

        // Names carry no embedded NUL, so the first zero after the fixed
        // fields terminates this entry.
        let name_start = cursor + DIRECTORY_ENTRY_FIXED_LEN;
        let name_len = out
            .get(name_start..)
            .and_then(|rest| rest.iter().position(|&b| b == 0))
            .ok_or(DecryptError::StructuralOverflow("unterminated directory entry name"))?;
        cursor = name_start + name_len + 1;
    }

    Ok(out)
}

fn read_count(blob: &[u8], at: usize, what: &'static str) -> Result<usize> {
    let field = blob
        .get(at..at + COUNT_LEN)
        .ok_or(DecryptError::StructuralOverflow(what))?;
    usize::try_from(BigEndian::read_i32(field)).map_err(|_| DecryptError::StructuralOverflow("negative count"))
}
