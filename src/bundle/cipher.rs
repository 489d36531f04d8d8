//! Ciphers protecting the bundle descriptor and block index.
//!
//! Platform A uses a keyed XOR-then-add byte substitution for both. Platform
//! B uses AES-128-CBC for the size fields and SM4-CBC for the block index,
//! each with a fixed key and IV.
//!
//! Every routine comes in two shapes: an in-place one over the whole bundle
//! buffer, and a copying one that leaves the caller's bytes alone.
use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, KeyIvInit};
use byteorder::{BigEndian, ByteOrder};
use log::trace;

use crate::constants::*;
use crate::error::{DecryptError, Result};
use crate::platform::Platform;

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Sm4CbcDec = cbc::Decryptor<sm4::Sm4>;

const CIPHER_BLOCK_LEN: usize = 16;

/// Widths of the three size fields: total size, compressed and uncompressed
/// block index size.
const SIZE_FIELD_WIDTHS: [usize; 3] = [8, 4, 4];

/// Undo the XOR-rotate substitution over `data` with a repeating `key`.
pub fn xor_rotate(data: &mut [u8], key: &[u8]) {
    for (b, k) in data.iter_mut().zip(key.iter().cycle()) {
        *b = (*b ^ !k).wrapping_add(XOR_ROTATE_BIAS);
    }
}

/// Decrypt the 16 size bytes of the descriptor at `offset` and clear the
/// protection flag that follows them.
pub fn decrypt_header(bundle: &mut [u8], offset: usize, platform: Platform) -> Result<()> {
    let end = offset
        .checked_add(BUNDLE_DESCRIPTOR_LEN)
        .filter(|&end| end <= bundle.len())
        .ok_or(DecryptError::StructuralOverflow("descriptor past end of bundle"))?;
    let descriptor = &mut bundle[offset..end];

    let sizes = &mut descriptor[..BUNDLE_SIZE_FIELDS_LEN];
    match platform {
        Platform::Android => xor_rotate(sizes, &SIZE_FIELDS_KEY),
        Platform::Switch => {
            // The AES block holds each field in little-endian order.
            reverse_size_fields(sizes);
            Aes128CbcDec::new(&SIZE_FIELDS_AES_KEY.into(), &SIZE_FIELDS_AES_IV.into())
                .decrypt_padded_mut::<NoPadding>(sizes)
                .map_err(|_| DecryptError::InvalidCiphertext)?;
            reverse_size_fields(sizes);
        }
    }

    let flags_at = BUNDLE_SIZE_FIELDS_LEN;
    let flags = BigEndian::read_u32(&descriptor[flags_at..]);
    BigEndian::write_u32(&mut descriptor[flags_at..], flags & !BUNDLE_FLAG_ENCRYPTED);

    trace!(
        "descriptor at {:#X} ({}): size {}, block index {} -> {}, flags {:#X}",
        offset,
        platform,
        BigEndian::read_u64(&descriptor[0..]),
        BigEndian::read_u32(&descriptor[8..]),
        BigEndian::read_u32(&descriptor[12..]),
        flags
    );

    Ok(())
}

/// Copying form of [`decrypt_header`]; returns the decrypted descriptor.
pub fn decrypted_header(bundle: &[u8], offset: usize, platform: Platform) -> Result<Vec<u8>> {
    let descriptor = offset
        .checked_add(BUNDLE_DESCRIPTOR_LEN)
        .and_then(|end| bundle.get(offset..end))
        .ok_or(DecryptError::StructuralOverflow("descriptor past end of bundle"))?;

    let mut out = descriptor.to_vec();
    decrypt_header(&mut out, 0, platform)?;
    Ok(out)
}

/// Decrypt `size` bytes of block index at `offset`, in place.
pub fn decrypt_block_index(bundle: &mut [u8], offset: usize, size: usize, platform: Platform) -> Result<()> {
    let blob = offset
        .checked_add(size)
        .and_then(|end| bundle.get_mut(offset..end))
        .ok_or(DecryptError::StructuralOverflow("block index past end of bundle"))?;

    match platform {
        Platform::Android => xor_rotate(blob, &BLOCK_INDEX_KEY),
        Platform::Switch => {
            // Whole blocks only; a ragged tail is stored in the clear.
            let whole = size - size % CIPHER_BLOCK_LEN;
            Sm4CbcDec::new(&BLOCK_INDEX_SM4_KEY.into(), &BLOCK_INDEX_SM4_IV.into())
                .decrypt_padded_mut::<NoPadding>(&mut blob[..whole])
                .map_err(|_| DecryptError::InvalidCiphertext)?;
        }
    }

    trace!("decrypted {} byte block index at {:#X} ({})", size, offset, platform);
    Ok(())
}

/// Copying form of [`decrypt_block_index`] over a standalone blob.
pub fn decrypted_block_index(blob: &[u8], platform: Platform) -> Result<Vec<u8>> {
    let mut out = blob.to_vec();
    decrypt_block_index(&mut out, 0, blob.len(), platform)?;
    Ok(out)
}

fn reverse_size_fields(sizes: &mut [u8]) {
    let mut at = 0;
    for width in SIZE_FIELD_WIDTHS {
        sizes[at..at + width].reverse();
        at += width;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use aes::cipher::BlockEncryptMut;

    use super::*;

    type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
    type Sm4CbcEnc = cbc::Encryptor<sm4::Sm4>;

    /// Inverse of [`xor_rotate`], for building fixtures.
    pub(crate) fn xor_rotate_seal(data: &mut [u8], key: &[u8]) {
        for (b, k) in data.iter_mut().zip(key.iter().cycle()) {
            *b = b.wrapping_sub(XOR_ROTATE_BIAS) ^ !k;
        }
    }

    pub(crate) fn seal_size_fields(sizes: &mut [u8], platform: Platform) {
        match platform {
            Platform::Android => xor_rotate_seal(sizes, &SIZE_FIELDS_KEY),
            Platform::Switch => {
                reverse_size_fields(sizes);
                let len = sizes.len();
                Aes128CbcEnc::new(&SIZE_FIELDS_AES_KEY.into(), &SIZE_FIELDS_AES_IV.into())
                    .encrypt_padded_mut::<NoPadding>(sizes, len)
                    .unwrap();
                reverse_size_fields(sizes);
            }
        }
    }

    pub(crate) fn seal_block_index(blob: &mut [u8], platform: Platform) {
        match platform {
            Platform::Android => xor_rotate_seal(blob, &BLOCK_INDEX_KEY),
            Platform::Switch => {
                let whole = blob.len() - blob.len() % CIPHER_BLOCK_LEN;
                Sm4CbcEnc::new(&BLOCK_INDEX_SM4_KEY.into(), &BLOCK_INDEX_SM4_IV.into())
                    .encrypt_padded_mut::<NoPadding>(&mut blob[..whole], whole)
                    .unwrap();
            }
        }
    }

    fn descriptor(size: u64, compressed: u32, uncompressed: u32, flags: u32) -> Vec<u8> {
        let mut out = vec![0u8; BUNDLE_DESCRIPTOR_LEN];
        BigEndian::write_u64(&mut out[0..], size);
        BigEndian::write_u32(&mut out[8..], compressed);
        BigEndian::write_u32(&mut out[12..], uncompressed);
        BigEndian::write_u32(&mut out[16..], flags);
        out
    }

    #[test]
    fn xor_rotate_known_vector() {
        let mut data = [0u8; 16];
        xor_rotate(&mut data, &SIZE_FIELDS_KEY);
        assert_eq!(
            data,
            [
                0x36, 0x32, 0xE8, 0x7E, 0xE4, 0x3C, 0x4B, 0x7A, 0x67, 0xDB, 0xD4, 0x0C, 0x3B, 0x2E,
                0xAF, 0xDE,
            ]
        );
    }

    #[test]
    fn xor_rotate_repeats_key() {
        let key = [0xFFu8];
        let mut data = [0x00, 0x10, 0xB7];
        xor_rotate(&mut data, &key);
        assert_eq!(data, [0x49, 0x59, 0x00]);
    }

    #[test]
    fn block_index_key_is_not_truncated() {
        assert_eq!(BLOCK_INDEX_KEY.len(), 1013);
        assert_eq!(BLOCK_INDEX_KEY[0], 0x23);
        assert_eq!(BLOCK_INDEX_KEY[1012], 0x51);
    }

    #[test]
    fn header_in_place_both_platforms() {
        for platform in [Platform::Android, Platform::Switch] {
            let plain = descriptor(0x1_0000_2000, 0x98, 0xA5, 0x243);

            let mut bundle = b"UnityFS\0".to_vec();
            let offset = bundle.len();
            bundle.extend_from_slice(&plain);
            seal_size_fields(&mut bundle[offset..offset + 16], platform);
            assert_ne!(&bundle[offset..offset + 16], &plain[..16]);

            decrypt_header(&mut bundle, offset, platform).unwrap();
            assert_eq!(&bundle[offset..], &descriptor(0x1_0000_2000, 0x98, 0xA5, 0x43)[..]);
        }
    }

    #[test]
    fn header_copy_leaves_input_untouched() {
        let mut sealed = descriptor(4096, 64, 80, 0x242);
        seal_size_fields(&mut sealed[..16], Platform::Switch);
        let before = sealed.clone();

        let out = decrypted_header(&sealed, 0, Platform::Switch).unwrap();
        assert_eq!(sealed, before);
        assert_eq!(out, descriptor(4096, 64, 80, 0x42));
    }

    #[test]
    fn header_past_end() {
        let mut bundle = vec![0u8; 0x20];
        assert!(matches!(
            decrypt_header(&mut bundle, 0x10, Platform::Android),
            Err(DecryptError::StructuralOverflow(_))
        ));
        assert!(decrypted_header(&bundle, usize::MAX, Platform::Android).is_err());
    }

    #[test]
    fn block_index_round_trip_android() {
        let plain: Vec<u8> = (0..1500u32).map(|i| (i * 7) as u8).collect();
        let mut blob = plain.clone();
        seal_block_index(&mut blob, Platform::Android);

        assert_eq!(decrypted_block_index(&blob, Platform::Android).unwrap(), plain);
    }

    #[test]
    fn block_index_sm4_leaves_ragged_tail() {
        let plain: Vec<u8> = (0..37u8).collect();
        let mut blob = plain.clone();
        seal_block_index(&mut blob, Platform::Switch);
        assert_ne!(blob[..32], plain[..32]);
        assert_eq!(blob[32..], plain[32..]);

        let mut bundle = vec![0xEEu8; 8];
        bundle.extend_from_slice(&blob);
        decrypt_block_index(&mut bundle, 8, blob.len(), Platform::Switch).unwrap();
        assert_eq!(&bundle[..8], &[0xEE; 8]);
        assert_eq!(&bundle[8..], &plain[..]);
    }

    #[test]
    fn block_index_past_end() {
        let mut bundle = vec![0u8; 16];
        assert!(decrypt_block_index(&mut bundle, 8, 16, Platform::Switch).is_err());
    }
}
