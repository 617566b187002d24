//! Field encoding used when hashing entry bodies.
//!
//! Scalars are fixed 8-byte little-endian, byte strings are varstr31, ids are
//! 32 raw bytes, lists are `varint31(count)` followed by each element, and
//! composites write their fields in declaration order. This is a different
//! layout from the wire format: the wire uses varints for amounts, the hash
//! input never does.

use crate::crypto::hash::{AssetId, Hash};
use crate::encoding::{CanonicalWriter, SerializationError};

/// Types that contribute to an entry's content hash.
pub trait WriteForHash {
    fn write_for_hash(&self, w: &mut CanonicalWriter) -> Result<(), SerializationError>;
}

impl WriteForHash for u64 {
    fn write_for_hash(&self, w: &mut CanonicalWriter) -> Result<(), SerializationError> {
        w.write_u64_le(*self);
        Ok(())
    }
}

impl WriteForHash for Hash {
    fn write_for_hash(&self, w: &mut CanonicalWriter) -> Result<(), SerializationError> {
        w.write_bytes(self.as_bytes());
        Ok(())
    }
}

impl WriteForHash for AssetId {
    fn write_for_hash(&self, w: &mut CanonicalWriter) -> Result<(), SerializationError> {
        w.write_bytes(self.as_bytes());
        Ok(())
    }
}

impl WriteForHash for [u8] {
    fn write_for_hash(&self, w: &mut CanonicalWriter) -> Result<(), SerializationError> {
        w.write_varstr31(self)
    }
}

impl WriteForHash for Vec<u8> {
    fn write_for_hash(&self, w: &mut CanonicalWriter) -> Result<(), SerializationError> {
        w.write_varstr31(self)
    }
}

/// Lists of composite values (sources, result ids).
pub fn write_list_for_hash<T: WriteForHash>(
    w: &mut CanonicalWriter,
    items: &[T],
) -> Result<(), SerializationError> {
    w.write_varint31(items.len() as u64)?;
    for item in items {
        item.write_for_hash(w)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_are_fixed_width_le() {
        let mut w = CanonicalWriter::new();
        300u64.write_for_hash(&mut w).unwrap();
        assert_eq!(w.as_bytes(), &[0x2c, 0x01, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn bytes_are_length_prefixed() {
        let mut w = CanonicalWriter::new();
        vec![0x51u8].write_for_hash(&mut w).unwrap();
        assert_eq!(w.as_bytes(), &[0x01, 0x51]);
    }

    #[test]
    fn lists_carry_a_count() {
        let mut w = CanonicalWriter::new();
        write_list_for_hash(&mut w, &[1u64, 2u64]).unwrap();
        assert_eq!(w.len(), 1 + 16);
        assert_eq!(w.as_bytes()[0], 0x02);
    }
}
