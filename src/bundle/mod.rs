//! Protected asset bundle repair.
//!
//! A protected bundle is a regular `UnityFS` container whose descriptor size
//! fields and block index have been encrypted, with flag `0x200` marking the
//! fact. Platform B additionally reorders the block index records and swaps
//! the directory entry offset and size. [`decrypt_bundle`] undoes all of it
//! and writes the block index back uncompressed so the result loads in any
//! standard bundle reader.
use std::io::{BufRead, Cursor};

use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use log::{debug, trace};

use crate::compression;
use crate::constants::*;
use crate::error::{DecryptError, Result};
use crate::platform::Platform;

pub mod cipher;
pub mod normalize;

pub use cipher::{decrypt_block_index, decrypt_header, decrypted_block_index, decrypted_header};
pub use normalize::normalize;

/// Flag bit placing the block index at the end of the file.
const FLAG_BLOCK_INDEX_AT_END: u32 = 0x80;

/// Leading strings and version of a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleHeader {
    pub signature: String,
    pub version: u32,
    pub player_version: String,
    pub engine_version: String,
    /// Byte offset of the size/flags descriptor.
    pub descriptor_offset: usize,
}

impl BundleHeader {
    pub fn parse(bundle: &[u8]) -> Result<Self> {
        let mut reader = Cursor::new(bundle);

        let signature = read_cstr(&mut reader).ok_or(DecryptError::FormatMismatch)?;
        if signature != BUNDLE_SIGNATURE {
            return Err(DecryptError::FormatMismatch);
        }

        let version = reader.read_u32::<BigEndian>()?;
        if version > BUNDLE_FORMAT_VERSION_MAX {
            return Err(DecryptError::UnsupportedVersion(version));
        }

        let player_version = read_cstr(&mut reader)
            .ok_or(DecryptError::StructuralOverflow("unterminated player version"))?;
        let engine_version = read_cstr(&mut reader)
            .ok_or(DecryptError::StructuralOverflow("unterminated engine version"))?;

        Ok(Self {
            signature,
            version,
            player_version,
            engine_version,
            descriptor_offset: reader.position() as usize,
        })
    }
}

/// The size/length/flags descriptor, in the clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundleDescriptor {
    pub total_size: u64,
    pub compressed_index_size: u32,
    pub uncompressed_index_size: u32,
    pub flags: u32,
}

impl BundleDescriptor {
    pub fn read(buf: &[u8]) -> Result<Self> {
        let mut reader = Cursor::new(buf);
        Ok(Self {
            total_size: reader.read_u64::<BigEndian>()?,
            compressed_index_size: reader.read_u32::<BigEndian>()?,
            uncompressed_index_size: reader.read_u32::<BigEndian>()?,
            flags: reader.read_u32::<BigEndian>()?,
        })
    }

    pub fn write(&self, buf: &mut [u8]) {
        BigEndian::write_u64(&mut buf[0x00..], self.total_size);
        BigEndian::write_u32(&mut buf[0x08..], self.compressed_index_size);
        BigEndian::write_u32(&mut buf[0x0C..], self.uncompressed_index_size);
        BigEndian::write_u32(&mut buf[0x10..], self.flags);
    }

    pub fn is_protected(&self) -> bool {
        self.flags & BUNDLE_FLAG_ENCRYPTED != 0
    }

    pub fn compression(&self) -> u32 {
        self.flags & BUNDLE_COMPRESSION_MASK
    }
}

/// Whether `data` is a bundle carrying the protection flag.
pub fn is_protected_bundle(data: &[u8]) -> bool {
    BundleHeader::parse(data)
        .ok()
        .and_then(|header| protection_flag(data, &header))
        .unwrap_or(false)
}

/// The protection bit of the flags word, which is never encrypted.
fn protection_flag(data: &[u8], header: &BundleHeader) -> Option<bool> {
    let flags_at = header.descriptor_offset + BUNDLE_SIZE_FIELDS_LEN;
    data.get(flags_at..flags_at + 4)
        .map(|flags| BigEndian::read_u32(flags) & BUNDLE_FLAG_ENCRYPTED != 0)
}

/// Decrypt and normalize a protected bundle into a standard one.
///
/// Returns [`DecryptError::FormatMismatch`] for input that is not a bundle
/// or does not carry the protection flag; the caller keeps such input as is.
/// A bundle whose header cannot be read is rejected with the parse error.
pub fn decrypt_bundle(bundle: &[u8], platform: Platform) -> Result<Vec<u8>> {
    let header = BundleHeader::parse(bundle)?;
    let protected = protection_flag(bundle, &header)
        .ok_or(DecryptError::StructuralOverflow("descriptor past end of bundle"))?;
    if !protected {
        return Err(DecryptError::FormatMismatch);
    }
    debug!(
        "bundle v{} ({} / {}), platform {}",
        header.version, header.player_version, header.engine_version, platform
    );

    let offset = header.descriptor_offset;
    let mut out = bundle.to_vec();

    cipher::decrypt_header(&mut out, offset, platform)?;
    let mut descriptor = BundleDescriptor::read(&out[offset..])?;

    let index_size = descriptor.compressed_index_size as usize;
    let index_start = if descriptor.flags & FLAG_BLOCK_INDEX_AT_END != 0 {
        out.len()
            .checked_sub(index_size)
            .ok_or(DecryptError::StructuralOverflow("block index larger than bundle"))?
    } else {
        offset + BUNDLE_DESCRIPTOR_LEN
    };
    cipher::decrypt_block_index(&mut out, index_start, index_size, platform)?;

    let index = compression::decompress_block_index(
        &out[index_start..index_start + index_size],
        descriptor.uncompressed_index_size as usize,
        descriptor.flags,
    )?;
    let index = if platform.needs_block_index_fixup() {
        normalize::normalize(&index)?
    } else {
        index
    };

    let new_size = u32::try_from(index.len())
        .map_err(|_| DecryptError::StructuralOverflow("block index too large"))?;
    descriptor.total_size = descriptor
        .total_size
        .checked_sub(index_size as u64)
        .and_then(|size| size.checked_add(index.len() as u64))
        .ok_or(DecryptError::StructuralOverflow("total size out of range"))?;
    descriptor.compressed_index_size = new_size;
    descriptor.uncompressed_index_size = new_size;
    descriptor.flags &= !BUNDLE_COMPRESSION_MASK;

    trace!(
        "splicing {} byte block index over {} bytes at {:#X}",
        index.len(),
        index_size,
        index_start
    );
    out.splice(index_start..index_start + index_size, index);
    descriptor.write(&mut out[offset..offset + BUNDLE_DESCRIPTOR_LEN]);

    Ok(out)
}

fn read_cstr(reader: &mut Cursor<&[u8]>) -> Option<String> {
    let mut bytes = Vec::new();
    reader.read_until(0, &mut bytes).ok()?;
    if bytes.pop() != Some(0) {
        return None;
    }
    String::from_utf8(bytes).ok()
}
