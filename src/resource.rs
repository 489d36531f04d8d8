//! Resource archive decryption.
//!
//! Layout: `[magic:3][padding:1][ciphertext]`. The ciphertext is AES-128-CBC
//! under a salted master key with a zero IV, and decrypts to
//! `[checksum:4 LE][payload]`.
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, KeyIvInit};
use byteorder::{ByteOrder, LittleEndian};
use log::{debug, trace};

use crate::compression;
use crate::constants::*;
use crate::error::{DecryptError, Result};
use crate::hash::payload_checksum;
use crate::keys::{ResourceKey, BUILTIN_RESOURCE_KEYS};

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// Decrypts resource archives against a table of known key pairs.
pub struct ResourceDecoder<'a> {
    keys: &'a [ResourceKey],
}

impl Default for ResourceDecoder<'static> {
    fn default() -> Self {
        Self::new(BUILTIN_RESOURCE_KEYS)
    }
}

impl<'a> ResourceDecoder<'a> {
    pub fn new(keys: &'a [ResourceKey]) -> Self {
        Self { keys }
    }

    /// Whether `archive` carries one of the known magics.
    pub fn is_resource_archive(&self, archive: &[u8]) -> bool {
        archive.len() >= RESOURCE_HEADER_LEN && ResourceKey::detect(self.keys, archive).is_some()
    }

    /// Decrypt an archive, passing unrecognised input through unchanged.
    ///
    /// Padding, cipher and checksum failures are all fatal and all mean the
    /// same thing to the caller: wrong salt or corrupt data.
    pub fn decrypt(&self, salt: u32, archive: &[u8]) -> Result<Vec<u8>> {
        match self.try_decrypt(salt, archive) {
            Err(DecryptError::FormatMismatch) => {
                trace!("no resource magic, passing {} bytes through", archive.len());
                Ok(archive.to_vec())
            }
            other => other,
        }
    }

    /// Decrypt, then inflate the payload.
    pub fn decrypt_and_decompress(&self, salt: u32, archive: &[u8]) -> Result<Vec<u8>> {
        if archive.is_empty() {
            return Ok(Vec::new());
        }
        match self.try_decrypt(salt, archive) {
            Ok(payload) => compression::inflate(&payload),
            Err(DecryptError::FormatMismatch) => Ok(archive.to_vec()),
            Err(e) => Err(e),
        }
    }

    /// Decrypt an archive, reporting unrecognised input as
    /// [`DecryptError::FormatMismatch`].
    pub fn try_decrypt(&self, salt: u32, archive: &[u8]) -> Result<Vec<u8>> {
        if archive.is_empty() {
            return Ok(Vec::new());
        }
        if archive.len() < RESOURCE_HEADER_LEN {
            return Err(DecryptError::FormatMismatch);
        }
        let key = ResourceKey::detect(self.keys, archive).ok_or(DecryptError::FormatMismatch)?;

        let padding = archive[3];
        trace!(
            "resource archive: platform {}, salt {:08X}, padding {}, {} bytes",
            key.platform,
            salt,
            padding,
            archive.len()
        );
        if padding > RESOURCE_MAX_PADDING {
            debug!("declared padding {} exceeds block size", padding);
            return Err(DecryptError::PaddingViolation);
        }
        let padding = padding as usize;

        let mut window = archive[RESOURCE_HEADER_LEN..].to_vec();
        let cipher_len = window.len();
        let plain_len = Aes128CbcDec::new(&key.derive(salt).into(), &[0u8; 16].into())
            .decrypt_padded_mut::<Pkcs7>(&mut window)
            .map_err(|_| {
                debug!("cipher rejected {} byte ciphertext", cipher_len);
                DecryptError::InvalidCiphertext
            })?
            .len();

        // The cipher strips its own padding; whatever it removed reads back as
        // zero and must cover the declared padding.
        window[plain_len..].fill(0);
        if window.len() < padding || window[window.len() - padding..].iter().any(|&b| b != 0) {
            debug!("non-zero bytes in the last {} of the decrypted window", padding);
            return Err(DecryptError::PaddingViolation);
        }
        window.truncate(window.len() - padding);

        if window.len() < RESOURCE_CHECKSUM_LEN {
            return Err(DecryptError::StructuralOverflow("payload shorter than its checksum"));
        }
        let stored = LittleEndian::read_u32(&window[..RESOURCE_CHECKSUM_LEN]);
        let payload = window.split_off(RESOURCE_CHECKSUM_LEN);
        let computed = payload_checksum(&payload);
        if stored != computed {
            debug!("checksum mismatch: stored {:08X}, computed {:08X}", stored, computed);
            return Err(DecryptError::ChecksumMismatch { stored, computed });
        }

        Ok(payload)
    }
}

/// Decrypt with the built-in key table.
pub fn decrypt(salt: u32, archive: &[u8]) -> Result<Vec<u8>> {
    ResourceDecoder::default().decrypt(salt, archive)
}

/// Decrypt and inflate with the built-in key table.
pub fn decrypt_and_decompress(salt: u32, archive: &[u8]) -> Result<Vec<u8>> {
    ResourceDecoder::default().decrypt_and_decompress(salt, archive)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;

    use aes::cipher::BlockEncryptMut;
    use flate2::write::DeflateEncoder;
    use flate2::Compression;

    use super::*;

    type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;

    /// Build an archive the way the client packs one.
    pub(crate) fn seal(key: &ResourceKey, salt: u32, checksum: u32, payload: &[u8]) -> Vec<u8> {
        let mut buf = checksum.to_le_bytes().to_vec();
        buf.extend_from_slice(payload);
        let msg_len = buf.len();
        let padding = 16 - msg_len % 16;
        buf.resize(msg_len + padding, 0);

        let ciphertext = Aes128CbcEnc::new(&key.derive(salt).into(), &[0u8; 16].into())
            .encrypt_padded_mut::<Pkcs7>(&mut buf, msg_len)
            .unwrap()
            .to_vec();

        let mut archive = key.magic.to_vec();
        archive.push(padding as u8);
        archive.extend_from_slice(&ciphertext);
        archive
    }

    fn android() -> &'static ResourceKey {
        &BUILTIN_RESOURCE_KEYS[0]
    }

    #[test]
    fn decrypts_and_verifies_checksum() {
        let payload = b"return { hp = 100 }";
        let archive = seal(android(), SALT_STREAM, payload_checksum(payload), payload);

        assert_eq!(decrypt(SALT_STREAM, &archive).unwrap(), payload);
    }

    #[test]
    fn block_aligned_payload() {
        // 4 byte checksum + 12 byte payload fills exactly one block, so the
        // cipher adds a whole block of padding.
        let payload = [0x5Au8; 12];
        let archive = seal(android(), SALT_RES_MAP, payload_checksum(&payload), &payload);
        assert_eq!(archive[3], 16);

        assert_eq!(decrypt(SALT_RES_MAP, &archive).unwrap(), payload);
    }

    #[test]
    fn checksum_mismatch_is_fatal() {
        let payload = b"languagemap";
        let archive = seal(android(), SALT_TABLE_DATA, payload_checksum(payload) ^ 1, payload);

        let err = decrypt(SALT_TABLE_DATA, &archive).unwrap_err();
        assert!(matches!(err, DecryptError::ChecksumMismatch { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn wrong_salt_is_fatal() {
        let payload = b"databin contents";
        let archive = seal(android(), SALT_TABLE_DATA, payload_checksum(payload), payload);

        let err = decrypt(SALT_RES_MAP, &archive).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn padding_count_over_block_size() {
        let payload = b"x";
        let mut archive = seal(android(), SALT_STREAM, payload_checksum(payload), payload);
        archive[3] = 17;

        assert!(matches!(decrypt(SALT_STREAM, &archive), Err(DecryptError::PaddingViolation)));
    }

    #[test]
    fn padding_must_be_zero() {
        // Claim one more byte of padding than the cipher stripped; that byte
        // is the last payload byte, which is non-zero.
        let payload = b"payload ending in x";
        let mut archive = seal(android(), SALT_STREAM, payload_checksum(payload), payload);
        archive[3] += 1;

        assert!(matches!(decrypt(SALT_STREAM, &archive), Err(DecryptError::PaddingViolation)));
    }

    #[test]
    fn truncated_ciphertext_is_fatal() {
        let payload = b"some payload";
        let mut archive = seal(android(), SALT_STREAM, payload_checksum(payload), payload);
        archive.pop();

        assert!(matches!(decrypt(SALT_STREAM, &archive), Err(DecryptError::InvalidCiphertext)));
    }

    #[test]
    fn unknown_magic_is_identity() {
        let plain = b"-- already plain lua".to_vec();
        assert_eq!(decrypt(SALT_STREAM, &plain).unwrap(), plain);
        assert_eq!(decrypt_and_decompress(SALT_STREAM, &plain).unwrap(), plain);
        assert!(matches!(
            ResourceDecoder::default().try_decrypt(SALT_STREAM, &plain),
            Err(DecryptError::FormatMismatch)
        ));
    }

    #[test]
    fn magic_without_padding_byte_is_identity() {
        let short = RESOURCE_MAGIC_ANDROID.to_vec();
        assert_eq!(decrypt(SALT_STREAM, &short).unwrap(), short);
    }

    #[test]
    fn empty_input() {
        assert!(decrypt(SALT_STREAM, &[]).unwrap().is_empty());
        assert!(decrypt_and_decompress(SALT_STREAM, &[]).unwrap().is_empty());
    }

    #[test]
    fn empty_input_with_runtime_keys() {
        let switch: ResourceKey = "1a2b3c:0f0e0d0c0b0a09080706050403020100".parse().unwrap();
        let keys = [switch];
        let decoder = ResourceDecoder::new(&keys);

        assert!(decoder.decrypt_and_decompress(SALT_RES_MAP, &[]).unwrap().is_empty());
        assert!(decoder.try_decrypt(SALT_RES_MAP, &[]).unwrap().is_empty());
    }

    #[test]
    fn decrypt_then_inflate() {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(b"{\"HashToAssetNames\":{}}").unwrap();
        let compressed = encoder.finish().unwrap();
        let archive = seal(android(), SALT_RES_MAP, payload_checksum(&compressed), &compressed);

        assert_eq!(
            decrypt_and_decompress(SALT_RES_MAP, &archive).unwrap(),
            b"{\"HashToAssetNames\":{}}"
        );
    }

    #[test]
    fn runtime_key_table() {
        let switch: ResourceKey = "1a2b3c:0f0e0d0c0b0a09080706050403020100".parse().unwrap();
        let keys = [BUILTIN_RESOURCE_KEYS[0], switch];
        let decoder = ResourceDecoder::new(&keys);

        let payload = b"switch resource";
        let archive = seal(&switch, SALT_DATA_OCEAN, payload_checksum(payload), payload);

        assert!(decoder.is_resource_archive(&archive));
        assert!(!ResourceDecoder::default().is_resource_archive(&archive));
        assert_eq!(decoder.decrypt(SALT_DATA_OCEAN, &archive).unwrap(), payload);
    }
}
