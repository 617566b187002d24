//! Buffer-backed canonical writer.

use super::{put_uvarint, SerializationError, MAX_VARINT31, MAX_VARINT63};

/// Accumulates canonically encoded bytes.
///
/// Fixed-width writes are infallible. Varint writes are range-checked and
/// return [`SerializationError::VarintOutOfRange`] rather than silently
/// truncating.
#[derive(Debug, Default, Clone)]
pub struct CanonicalWriter {
    buf: Vec<u8>,
}

impl CanonicalWriter {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn write_u8(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Append raw bytes with no length prefix (hashes, asset ids).
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Fixed 8-byte little-endian integer, used by entry hashing.
    pub fn write_u64_le(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_varint63(&mut self, value: u64) -> Result<(), SerializationError> {
        if value > MAX_VARINT63 {
            return Err(SerializationError::VarintOutOfRange { value, bits: 63 });
        }
        put_uvarint(&mut self.buf, value);
        Ok(())
    }

    pub fn write_varint31(&mut self, value: u64) -> Result<(), SerializationError> {
        if value > MAX_VARINT31 {
            return Err(SerializationError::VarintOutOfRange { value, bits: 31 });
        }
        put_uvarint(&mut self.buf, value);
        Ok(())
    }

    /// `varint31(len) ‖ bytes`.
    pub fn write_varstr31(&mut self, bytes: &[u8]) -> Result<(), SerializationError> {
        self.write_varint31(bytes.len() as u64)?;
        self.write_bytes(bytes);
        Ok(())
    }

    /// `varint31(count)` followed by each item as a varstr31.
    pub fn write_varstr_list<T: AsRef<[u8]>>(
        &mut self,
        items: &[T],
    ) -> Result<(), SerializationError> {
        self.write_varint31(items.len() as u64)?;
        for item in items {
            self.write_varstr31(item.as_ref())?;
        }
        Ok(())
    }

    /// Encode `f` into a scratch writer and emit the result as one varstr31.
    pub fn write_extensible_string<F>(&mut self, f: F) -> Result<(), SerializationError>
    where
        F: FnOnce(&mut CanonicalWriter) -> Result<(), SerializationError>,
    {
        let mut inner = CanonicalWriter::new();
        f(&mut inner)?;
        self.write_varstr31(&inner.buf)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
