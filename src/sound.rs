//! Sound bank decryption.
//!
//! Two XTEA-derived block ciphers over 8 byte little-endian blocks:
//!
//! * Variant A (Android): `[header:4][size ^ header:4][tweak key:4][ciphertext]`.
//!   A single XTEA round with a fixed key, XORed with a per-block tweak. One
//!   round is what the client does; it is not a truncated implementation.
//! * Variant B (Switch): `[header:4][ciphertext]`. The key schedule is
//!   derived from the bank's file name and header, and each block runs one or
//!   two tweaked Feistel rounds chosen by the block index.
use byteorder::{ByteOrder, LittleEndian};
use log::{debug, trace};

use crate::constants::*;
use crate::error::{DecryptError, Result};
use crate::platform::Platform;

const PADDING_MASK: u32 = 0xF;

#[inline]
fn mix(v: u32) -> u32 {
    ((v << 4) ^ (v >> 5)).wrapping_add(v)
}

#[inline]
fn lcg(x: u32) -> u32 {
    SOUND_LCG_MUL.wrapping_mul(x).wrapping_add(SOUND_LCG_INC)
}

#[inline]
fn split(block: u64) -> (u32, u32) {
    (block as u32, (block >> 32) as u32)
}

#[inline]
fn join(v0: u32, v1: u32) -> u64 {
    (v0 as u64) | ((v1 as u64) << 32)
}

/// Whether `data` is a variant A sound archive.
///
/// The header's low nibble is the padding count; the remaining 28 bits hold
/// [`SOUND_MAGIC`] rotated by an amount derived from that count.
pub fn is_sound_archive(data: &[u8]) -> bool {
    if data.len() < SOUND_HEADER_LEN {
        return false;
    }

    let header = LittleEndian::read_u32(&data[0..]);
    let padding = header & PADDING_MASK;
    let rotate = (2 * padding + 1) & 0x1C;
    let word = header >> 4;
    let magic = ((word << (28 - rotate)) & 0x0FFF_FFFF) | (word >> rotate);
    if magic != SOUND_MAGIC {
        return false;
    }

    let size = LittleEndian::read_u32(&data[4..]) ^ header;
    SOUND_HEADER_LEN as u64 + size as u64 + padding as u64 == data.len() as u64
}

/// One XTEA decryption round under the fixed variant A key.
pub fn xtea_single_round(block: u64) -> u64 {
    let (mut v0, mut v1) = split(block);
    v1 = v1.wrapping_sub(mix(v0) ^ SOUND_TEA_KEY[3].wrapping_sub(TEA_NEG_DELTA));
    v0 = v0.wrapping_sub(mix(v1) ^ SOUND_TEA_KEY[0]);
    join(v0, v1)
}

/// Per-block tweak: low word from the table, index and key; high word its complement.
pub fn tweak(key: u32, idx: u32) -> u64 {
    let t = key ^ idx ^ SOUND_TWEAKS[idx as usize % SOUND_TWEAKS.len()];
    join(t, !t)
}

/// Decrypt block `idx` of a variant A archive.
///
/// Not an involution: applying it twice does not give the input back.
pub fn decrypt_block(tweak_key: u32, block: u64, idx: u32) -> u64 {
    xtea_single_round(block) ^ tweak(tweak_key, idx)
}

/// Decrypt a variant A archive.
pub fn decrypt(data: &[u8]) -> Result<Vec<u8>> {
    if !is_sound_archive(data) {
        return Err(DecryptError::FormatMismatch);
    }

    let header = LittleEndian::read_u32(&data[0..]);
    let size = (LittleEndian::read_u32(&data[4..]) ^ header) as usize;
    let tweak_key = LittleEndian::read_u32(&data[8..]);
    trace!("sound archive: {} bytes, tweak key {:08X}", size, tweak_key);

    Ok(decrypt_blocks(&data[SOUND_HEADER_LEN..], size, |block, idx| {
        decrypt_block(tweak_key, block, idx)
    }))
}

/// Key schedule of a variant B archive, from its file name and header.
///
/// The name is hashed over UTF-16 code units, as the client stores it.
pub fn switch_key(filename: &str, header: u32) -> [u32; 8] {
    let len = filename.encode_utf16().count() as u32;
    let mut h0 = lcg(len) as u64;
    let mut h1 = lcg(0xCB98685Cu32.wrapping_sub(SOUND_LCG_MUL.wrapping_mul(len))) as u64;

    for c in filename.encode_utf16() {
        h0 = h0.wrapping_mul(0x10F4AB).wrapping_add(0x17720F33 * c as u64);
        h1 = h1.wrapping_mul(0x5994A7).wrapping_add(0x17B32437 * c as u64);
    }

    let header = header & !PADDING_MASK;
    let mut key = [0u32; 8];
    key[0] = SOUND_SWITCH_BASE_KEY[0] ^ (h0 >> 32) as u32 ^ header;
    key[1] = SOUND_SWITCH_BASE_KEY[1] ^ h0 as u32 ^ header;
    key[2] = SOUND_SWITCH_BASE_KEY[2] ^ (h1 >> 32) as u32 ^ header;
    key[3] = SOUND_SWITCH_BASE_KEY[3] ^ h1 as u32 ^ header;
    for i in 0..4 {
        key[i + 4] = lcg(key[i]);
    }
    key
}

/// Decrypt block `idx` of a variant B archive under `key`.
pub fn switch_decrypt_block(key: &[u32; 8], block: u64, idx: u32) -> u64 {
    let (mut v0, mut v1) = split(block);

    let x0 = SOUND_SWITCH_TWEAKS[idx as usize % SOUND_SWITCH_TWEAKS.len()] ^ idx;
    let x1 = 0x8Bu32.wrapping_mul(x0 & 0xFF).wrapping_sub(0x5D) & 1;
    let t0 = lcg(x0);
    let t1 = TEA_DELTA.wrapping_mul(x1);

    // Window of four key words, starting somewhere in 0..=4.
    let base = ((0x8Bu32.wrapping_mul(t0 & 0xFF).wrapping_sub(0x5D) & 3) + ((lcg(t0) >> 31) & 1)) as usize;
    let k = |select: u32| key[base + (select & 3) as usize];

    v1 = v1.wrapping_sub(mix(v0) ^ k(t1.wrapping_sub(TEA_NEG_DELTA)).wrapping_add(t1).wrapping_sub(TEA_NEG_DELTA));
    v0 = v0.wrapping_sub(mix(v1) ^ k(t1).wrapping_sub(TEA_NEG_DELTA.wrapping_mul(x1)));

    if x1 != 0 {
        let t0_low = t0 & 1;
        v1 = v1.wrapping_sub(
            mix(v0) ^ k(TEA_DELTA.wrapping_mul(t0_low) >> 11).wrapping_sub(TEA_NEG_DELTA.wrapping_mul(t0_low)),
        );
        v0 = v0.wrapping_sub(mix(v1) ^ k(t1.wrapping_add(TEA_NEG_DELTA)).wrapping_add(t1).wrapping_add(TEA_NEG_DELTA));
    }

    join(v0 ^ t0, v1 ^ lcg(t0))
}

/// Decrypt a variant B archive. `filename` is the bank's file name with
/// extension, e.g. `snd_Init.bnk`.
pub fn decrypt_switch(filename: &str, data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < SOUND_SWITCH_HEADER_LEN {
        return Err(DecryptError::FormatMismatch);
    }

    let header = LittleEndian::read_u32(&data[0..]);
    let padding = (header & PADDING_MASK) as usize;
    let size = (data.len() - SOUND_SWITCH_HEADER_LEN)
        .checked_sub(padding)
        .ok_or(DecryptError::StructuralOverflow("sound padding exceeds archive"))?;

    let key = switch_key(filename, header);
    debug!("switch sound archive {:?}: {} bytes, header {:08X}", filename, size, header);

    Ok(decrypt_blocks(&data[SOUND_SWITCH_HEADER_LEN..], size, |block, idx| {
        switch_decrypt_block(&key, block, idx)
    }))
}

/// Decrypt a sound archive for `platform`.
pub fn decrypt_sound(platform: Platform, filename: &str, data: &[u8]) -> Result<Vec<u8>> {
    match platform {
        Platform::Android => decrypt(data),
        Platform::Switch => decrypt_switch(filename, data),
    }
}

/// Run `f` over 8 byte blocks of `ciphertext`, keeping `size` bytes of output.
///
/// A short final block is zero-extended before decryption. `ciphertext` must
/// hold at least `size` bytes.
fn decrypt_blocks(ciphertext: &[u8], size: usize, mut f: impl FnMut(u64, u32) -> u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(size);
    let blocks = (size + SOUND_BLOCK_LEN - 1) / SOUND_BLOCK_LEN;

    for (idx, chunk) in ciphertext.chunks(SOUND_BLOCK_LEN).take(blocks).enumerate() {
        let mut block = [0u8; SOUND_BLOCK_LEN];
        block[..chunk.len()].copy_from_slice(chunk);

        let plain = f(u64::from_le_bytes(block), idx as u32).to_le_bytes();
        let take = (size - out.len()).min(SOUND_BLOCK_LEN);
        out.extend_from_slice(&plain[..take]);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ciphertext() -> Vec<u8> {
        (0..16u32).map(|i| (i * 37 + 11) as u8).collect()
    }

    fn archive_a() -> Vec<u8> {
        let header = 0xA0CF89B3u32;
        let mut data = Vec::new();
        data.extend_from_slice(&header.to_le_bytes());
        data.extend_from_slice(&(13 ^ header).to_le_bytes());
        data.extend_from_slice(&0xDEADBEEFu32.to_le_bytes());
        data.extend_from_slice(&ciphertext());
        data
    }

    #[test]
    fn magic_rotation_for_every_padding() {
        for (padding, header) in [
            (0u32, 0xBA0CF890u32),
            (3, 0xA0CF89B3),
            (6, 0xCF89BA06),
            (9, 0xF89BA0C9),
            (12, 0x9BA0CF8C),
            (14, 0xBA0CF89E),
            (15, 0xBA0CF89F),
        ] {
            let size = 32u32;
            let mut data = header.to_le_bytes().to_vec();
            data.extend_from_slice(&(size ^ header).to_le_bytes());
            data.resize(SOUND_HEADER_LEN + (size + padding) as usize, 0);
            assert!(is_sound_archive(&data), "padding {padding}");
        }
    }

    #[test]
    fn rejects_short_input() {
        assert!(!is_sound_archive(&[]));
        assert!(!is_sound_archive(&archive_a()[..11]));
    }

    #[test]
    fn rejects_bad_magic_or_size() {
        let mut bad_magic = archive_a();
        bad_magic[2] ^= 0x10;
        assert!(!is_sound_archive(&bad_magic));

        let mut bad_size = archive_a();
        bad_size.push(0);
        assert!(!is_sound_archive(&bad_size));
        assert!(matches!(decrypt(&bad_size), Err(DecryptError::FormatMismatch)));
    }

    #[test]
    fn single_round_vectors() {
        assert_eq!(xtea_single_round(0), 0xF4D2B1FBAF1C3BDA);
        assert_eq!(xtea_single_round(0x0123456789ABCDEF), 0xDD7344DCC8DAE911);
        assert_eq!(tweak(0xDEADBEEF, 9), 0x86A10A25795EF5DA);
        assert_eq!(decrypt_block(0xDEADBEEF, 0x0123456789ABCDEF, 9), 0x5BD24EF9B1841CCB);
    }

    #[test]
    fn block_transform_is_not_an_involution() {
        let once = decrypt_block(0xDEADBEEF, 0x0123456789ABCDEF, 9);
        assert_ne!(decrypt_block(0xDEADBEEF, once, 9), 0x0123456789ABCDEF);
    }

    #[test]
    fn tweak_high_word_is_complement() {
        for idx in 0..16 {
            let t = tweak(0x12345678, idx);
            assert_eq!((t >> 32) as u32, !(t as u32));
        }
    }

    #[test]
    fn decrypt_variant_a() {
        assert_eq!(
            decrypt(&archive_a()).unwrap(),
            [0x43, 0xB8, 0xA8, 0xEE, 0x96, 0x69, 0x4C, 0xE5, 0xCE, 0x3B, 0x11, 0x6A, 0x8B]
        );
    }

    #[test]
    fn switch_key_vector() {
        assert_eq!(
            switch_key("snd_Init.bnk", 0x290463D3),
            [
                0x90E802D5, 0x766566BA, 0x4F73499D, 0x84968488, 0x00D4B24A, 0xBB4750A1, 0xCDFA48E2,
                0x275A757B,
            ]
        );
    }

    #[test]
    fn switch_key_ignores_padding_nibble() {
        assert_eq!(switch_key("snd_Init.bnk", 0x290463D0), switch_key("snd_Init.bnk", 0x290463DF));
        assert_ne!(switch_key("snd_Init.bnk", 0x290463D3), switch_key("snd_Init.bnk", 0x290463E3));
    }

    #[test]
    fn switch_block_vectors() {
        let key = switch_key("snd_Init.bnk", 0x290463D3);
        // Blocks 5..=7 take the single round path, the rest take both.
        let expected = [
            0x9CE4AC301C92E0C8u64,
            0x9D2462006E4A4498,
            0xA51455E830CCE2E0,
            0x1B410B5871ADBEF3,
            0x79720D0E9C969F20,
            0x081E77EEDD433E74,
            0x4E49B701662F3D7F,
            0x6DA8CB4507EFA620,
            0x5306EEA45891742F,
            0x5147A8B469CAE87F,
        ];
        for (idx, want) in expected.into_iter().enumerate() {
            assert_eq!(switch_decrypt_block(&key, 0x0123456789ABCDEF, idx as u32), want, "block {idx}");
        }
    }

    #[test]
    fn decrypt_variant_b() {
        let mut data = 0x290463D3u32.to_le_bytes().to_vec();
        data.extend_from_slice(&ciphertext());
        data.push(0x99);

        let plain = decrypt_sound(Platform::Switch, "snd_Init.bnk", &data).unwrap();
        assert_eq!(
            plain,
            [0x43, 0xD1, 0x4C, 0xED, 0x08, 0xD9, 0x8F, 0x1D, 0xE1, 0x82, 0x0C, 0x4B, 0xAA, 0xE4]
        );
    }

    #[test]
    fn variant_b_padding_past_end() {
        let data = 0x290463DFu32.to_le_bytes();
        assert!(matches!(
            decrypt_switch("snd_Init.bnk", &data),
            Err(DecryptError::StructuralOverflow(_))
        ));
        assert!(matches!(decrypt_switch("x.bnk", &[1, 2]), Err(DecryptError::FormatMismatch)));
    }

    #[test]
    fn final_block_is_trimmed() {
        let out = decrypt_blocks(&[0u8; 16], 9, |block, idx| block ^ (idx as u64 + 1));
        assert_eq!(out, [1, 0, 0, 0, 0, 0, 0, 0, 2]);
    }
}
