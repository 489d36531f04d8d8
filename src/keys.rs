//! Resource key material and salt lookup.
use std::fmt;
use std::str::FromStr;

use crate::constants::*;
use crate::platform::Platform;

/// A resource archive magic paired with the master key it is encrypted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceKey {
    pub platform: Platform,
    pub magic: [u8; 3],
    pub master: [u8; 16],
}

/// Key pairs compiled into the tool.
///
/// Only the platform-A pair has been recovered. The platform-B pair is
/// supplied at runtime, see [`ResourceKey::from_str`].
pub const BUILTIN_RESOURCE_KEYS: &[ResourceKey] = &[ResourceKey {
    platform: Platform::Android,
    magic: RESOURCE_MAGIC_ANDROID,
    master: RESOURCE_MASTER_KEY_ANDROID,
}];

impl ResourceKey {
    /// Derive the AES key for this pair under `salt`.
    #[inline]
    pub fn derive(&self, salt: u32) -> [u8; 16] {
        derive_key(&self.master, salt)
    }

    /// Find the pair whose magic opens `archive`.
    pub fn detect<'a>(keys: &'a [ResourceKey], archive: &[u8]) -> Option<&'a ResourceKey> {
        let magic = archive.get(..3)?;
        keys.iter().find(|key| key.magic == magic)
    }
}

/// Parses `MAGIC:KEY` with both halves in hex, e.g. `9d4c2d:b27f...55`.
///
/// Keys given on the command line are always registered for [`Platform::Switch`].
impl FromStr for ResourceKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (magic, master) = s
            .split_once(':')
            .ok_or_else(|| format!("expected MAGIC:KEY, got {s:?}"))?;

        let mut key = ResourceKey {
            platform: Platform::Switch,
            magic: [0; 3],
            master: [0; 16],
        };
        hex::decode_to_slice(magic.trim(), &mut key.magic)
            .map_err(|e| format!("resource magic must be 3 hex bytes: {e}"))?;
        hex::decode_to_slice(master.trim(), &mut key.master)
            .map_err(|e| format!("resource key must be 16 hex bytes: {e}"))?;

        Ok(key)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", hex::encode(self.magic), hex::encode(self.master), self.platform)
    }
}

/// XOR the salt's little-endian bytes, repeated, over the master key.
///
/// A salt of zero yields the master key unchanged.
pub fn derive_key(master: &[u8; 16], salt: u32) -> [u8; 16] {
    let mut derived = *master;
    for (i, b) in derived.iter_mut().enumerate() {
        let shift = (i << 3) & 0x1F;
        *b ^= (salt >> shift) as u8;
    }
    derived
}

/// Look up a salt by the client class name that owns it.
pub fn named_salt(name: &str) -> Option<u32> {
    NAMED_SALTS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|&(_, salt)| salt)
}

/// Resolve a salt given either by name or as a hex literal (`0x` optional).
pub fn parse_salt(s: &str) -> Result<u32, String> {
    if let Some(salt) = named_salt(s) {
        return Ok(salt);
    }
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u32::from_str_radix(digits, 16).map_err(|_| format!("unknown salt {s:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_salt_keeps_master_key() {
        for key in BUILTIN_RESOURCE_KEYS {
            assert_eq!(key.derive(0), key.master);
        }
        let custom: ResourceKey = "010203:000102030405060708090a0b0c0d0e0f".parse().unwrap();
        assert_eq!(custom.derive(0), custom.master);
    }

    #[test]
    fn derive_known_vector() {
        let derived = derive_key(&RESOURCE_MASTER_KEY_ANDROID, 12345678);
        assert_eq!(
            derived,
            [
                0xFC, 0x1E, 0xA5, 0x12, 0xC3, 0x3E, 0x77, 0x75, 0xFE, 0x8B, 0x96, 0x60, 0x82, 0x62,
                0x1E, 0x55,
            ]
        );
    }

    #[test]
    fn derive_is_deterministic() {
        let a = derive_key(&RESOURCE_MASTER_KEY_ANDROID, SALT_RES_MAP);
        let b = derive_key(&RESOURCE_MASTER_KEY_ANDROID, SALT_RES_MAP);
        assert_eq!(a, b);
        assert_eq!(
            a,
            [
                0xF5, 0xAA, 0x8A, 0xD2, 0xCA, 0x8A, 0x58, 0xB5, 0xF7, 0x3F, 0xB9, 0xA0, 0x8B, 0xD6,
                0x31, 0x95,
            ]
        );
    }

    #[test]
    fn detect_by_magic() {
        let archive = [0x9D, 0x4C, 0x2D, 0x04, 0xAA];
        let key = ResourceKey::detect(BUILTIN_RESOURCE_KEYS, &archive).unwrap();
        assert_eq!(key.platform, Platform::Android);

        assert!(ResourceKey::detect(BUILTIN_RESOURCE_KEYS, b"PK\x03\x04").is_none());
        assert!(ResourceKey::detect(BUILTIN_RESOURCE_KEYS, &[0x9D, 0x4C]).is_none());
    }

    #[test]
    fn parse_resource_key_pair() {
        let key: ResourceKey = "aabbcc:00112233445566778899aabbccddeeff".parse().unwrap();
        assert_eq!(key.magic, [0xAA, 0xBB, 0xCC]);
        assert_eq!(key.master[15], 0xFF);
        assert_eq!(key.platform, Platform::Switch);

        assert!("aabbcc".parse::<ResourceKey>().is_err());
        assert!("aabb:00112233445566778899aabbccddeeff".parse::<ResourceKey>().is_err());
    }

    #[test]
    fn salts_by_name_or_hex() {
        assert_eq!(parse_salt("GResMap"), Ok(SALT_RES_MAP));
        assert_eq!(parse_salt("tablebindatacenter"), Ok(SALT_TABLE_DATA));
        assert_eq!(parse_salt("0xC0F7D582"), Ok(SALT_STREAM));
        assert_eq!(parse_salt("e18626dd"), Ok(SALT_DATA_OCEAN));
        assert!(parse_salt("NoSuchClass").is_err());
    }
}
