//! # Hashing Utilities
//!
//! The ledger hashes everything with SHA3-256: entry ids, asset ids, nonce
//! hashes and signature hashes. RIPEMD-160 appears exactly once, in the
//! pay-to-witness-pubkey-hash program.
//!
//! [`Hash`] and [`AssetId`] are both 32-byte newtypes. They are kept apart
//! so an asset id can never be passed where an entry reference is expected.

use ripemd::Ripemd160;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Sha3_256};
use std::fmt;
use std::str::FromStr;

/// Compute the SHA3-256 hash of the input data.
///
/// # Example
///
/// ```
/// use btm_offline::crypto::sha3_256;
///
/// let hash = sha3_256(b"");
/// assert_eq!(
///     hex::encode(hash),
///     "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a"
/// );
/// ```
pub fn sha3_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash several byte slices as if concatenated, without the buffer.
pub fn sha3_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Compute RIPEMD-160 of the input data.
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Errors when parsing a 32-byte identifier from hex.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseHashError {
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

fn parse_32(s: &str) -> Result<[u8; 32], ParseHashError> {
    let bytes = hex::decode(s)?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| ParseHashError::InvalidLength(bytes.len()))
}

macro_rules! bytes32_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name([u8; 32]);

        impl $name {
            /// Wrap raw bytes.
            pub const fn new(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            pub fn from_hex(s: &str) -> Result<Self, ParseHashError> {
                parse_32(s).map(Self)
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = ParseHashError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), &self.to_hex()[..16])
            }
        }

        // Serialized as hex so JSON requests and results stay readable.
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

bytes32_newtype!(
    /// A SHA3-256 digest identifying an entry, a transaction, or a spent source.
    Hash
);

bytes32_newtype!(
    /// A 32-byte asset identifier.
    AssetId
);

impl Hash {
    /// SHA3-256 of `data`, wrapped.
    pub fn digest(data: &[u8]) -> Self {
        Self(sha3_256(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha3_256_known_vector() {
        assert_eq!(
            hex::encode(sha3_256(b"abc")),
            "3a985da74fe225b2045c172d6bd390bd855f086e3e9d525b46bfe24511431532"
        );
    }

    #[test]
    fn sha3_multi_matches_concatenation() {
        let multi = sha3_256_multi(&[b"entry", b"id:"]);
        assert_eq!(multi, sha3_256(b"entryid:"));
    }

    #[test]
    fn ripemd160_known_vector() {
        assert_eq!(
            hex::encode(ripemd160(b"")),
            "9c1185a5c5e9fc54612808977ee8f548b2258d31"
        );
    }

    #[test]
    fn hash_hex_roundtrip() {
        let h = Hash::digest(b"utxo");
        let parsed: Hash = h.to_hex().parse().unwrap();
        assert_eq!(h, parsed);
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert_eq!(
            AssetId::from_hex("abcd"),
            Err(ParseHashError::InvalidLength(2))
        );
        assert!(matches!(
            Hash::from_hex("zz"),
            Err(ParseHashError::InvalidHex(_))
        ));
        assert_eq!(
            Hash::from_hex("abc"),
            Err(ParseHashError::InvalidHex(hex::FromHexError::OddLength))
        );
    }

    #[test]
    fn serde_uses_hex_strings() {
        let id = AssetId::new([0xff; 32]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", "f".repeat(64)));
        let back: AssetId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
