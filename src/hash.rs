//! Small polynomial hashes used by the client.

/// Checksum stored ahead of every decrypted resource payload.
#[inline]
pub fn payload_checksum(data: &[u8]) -> u32 {
    data.iter()
        .fold(17u32, |hash, &b| hash.wrapping_mul(31).wrapping_add(b as u32))
}

/// Hash the client computes over asset names (UTF-16 code units).
#[inline]
pub fn name_hash(name: &str) -> u32 {
    name.encode_utf16()
        .fold(0u32, |hash, c| hash.wrapping_mul(29).wrapping_add(c as u32))
}
