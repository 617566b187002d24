//! # Canonical Encoding
//!
//! Byte-exact encoding shared by the entry hasher and the wire format.
//!
//! ```text
//! varint63 / varint31  — unsigned LEB128, range-checked to 63 / 31 bits
//! varstr31             — varint31(len) ‖ bytes
//! varstr list          — varint31(count) ‖ varstr31*
//! extensible string    — a nested encoding wrapped as one varstr31
//! ```
//!
//! Any deviation here changes every downstream id and invalidates every
//! signature, so both halves are covered by fixed vectors in the tests.

pub mod reader;
pub mod writer;

pub use reader::CanonicalReader;
pub use writer::CanonicalWriter;

use thiserror::Error;

/// Largest value accepted by `varint63`.
pub const MAX_VARINT63: u64 = (1 << 63) - 1;

/// Largest value accepted by `varint31`.
pub const MAX_VARINT31: u64 = (1 << 31) - 1;

/// Encoding and decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializationError {
    #[error("value {value} does not fit in a {bits}-bit varint")]
    VarintOutOfRange { value: u64, bits: u32 },

    #[error("varint overflows 64 bits")]
    VarintOverflow,

    #[error("unexpected end of data: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("{0} trailing bytes after transaction")]
    TrailingBytes(usize),

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("unsupported serialization flags 0x{0:02x}")]
    UnsupportedFlags(u8),

    #[error("unsupported asset version {0}")]
    UnsupportedAssetVersion(u64),

    #[error("unknown input type 0x{0:02x} at input {1}")]
    UnknownInputType(u8, usize),

    #[error("input {0}: asset id does not match its issuance program and definition")]
    AssetIdMismatch(usize),
}

/// Append `n` as unsigned LEB128.
pub(crate) fn put_uvarint(buf: &mut Vec<u8>, mut n: u64) {
    loop {
        let byte = (n & 0x7f) as u8;
        n >>= 7;
        if n == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(n: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        put_uvarint(&mut buf, n);
        buf
    }

    #[test]
    fn uvarint_vectors() {
        assert_eq!(encoded(0), vec![0x00]);
        assert_eq!(encoded(1), vec![0x01]);
        assert_eq!(encoded(127), vec![0x7f]);
        assert_eq!(encoded(128), vec![0x80, 0x01]);
        assert_eq!(encoded(300), vec![0xac, 0x02]);
        assert_eq!(encoded(1_000_000), vec![0xc0, 0x84, 0x3d]);
    }

    #[test]
    fn uvarint_max_u64_is_ten_bytes() {
        let buf = encoded(u64::MAX);
        assert_eq!(buf.len(), 10);
        assert_eq!(buf[9], 0x01);
    }
}
