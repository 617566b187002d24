//! Cursor-based canonical reader, the inverse of [`super::CanonicalWriter`].

use super::{SerializationError, MAX_VARINT31, MAX_VARINT63};

/// Reads canonically encoded data from a borrowed slice.
pub struct CanonicalReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> CanonicalReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Read `n` bytes and advance.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], SerializationError> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(SerializationError::UnexpectedEof {
                needed: n,
                remaining,
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, SerializationError> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Read 32 raw bytes (a hash or asset id).
    pub fn read_hash(&mut self) -> Result<[u8; 32], SerializationError> {
        let bytes = self.read_bytes(32)?;
        let mut out = [0u8; 32];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn read_uvarint(&mut self) -> Result<u64, SerializationError> {
        let mut value: u64 = 0;
        let mut shift: u32 = 0;
        loop {
            let byte = self.read_u8()?;
            if shift == 63 && byte > 1 {
                return Err(SerializationError::VarintOverflow);
            }
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift > 63 {
                return Err(SerializationError::VarintOverflow);
            }
        }
    }

    pub fn read_varint63(&mut self) -> Result<u64, SerializationError> {
        let value = self.read_uvarint()?;
        if value > MAX_VARINT63 {
            return Err(SerializationError::VarintOutOfRange { value, bits: 63 });
        }
        Ok(value)
    }

    pub fn read_varint31(&mut self) -> Result<u64, SerializationError> {
        let value = self.read_uvarint()?;
        if value > MAX_VARINT31 {
            return Err(SerializationError::VarintOutOfRange { value, bits: 31 });
        }
        Ok(value)
    }

    pub fn read_varstr31(&mut self) -> Result<&'a [u8], SerializationError> {
        let len = self.read_varint31()? as usize;
        self.read_bytes(len)
    }

    pub fn read_varstr_list(&mut self) -> Result<Vec<Vec<u8>>, SerializationError> {
        let count = self.read_varint31()? as usize;
        // Each item costs at least one byte, which bounds the allocation.
        let mut items = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            items.push(self.read_varstr31()?.to_vec());
        }
        Ok(items)
    }

    /// Read one varstr31 and hand back a reader over its contents.
    pub fn read_extensible_string(&mut self) -> Result<CanonicalReader<'a>, SerializationError> {
        Ok(CanonicalReader::new(self.read_varstr31()?))
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Succeeds only if every byte was consumed.
    pub fn finish(&self) -> Result<(), SerializationError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(SerializationError::TrailingBytes(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::CanonicalWriter;

    #[test]
    fn reads_what_the_writer_wrote() {
        let mut w = CanonicalWriter::new();
        w.write_varint63(1_000_000).unwrap();
        w.write_varstr31(b"program").unwrap();
        w.write_varstr_list(&[b"sig".to_vec(), b"pub".to_vec()]).unwrap();
        w.write_bytes(&[0xff; 32]);
        let bytes = w.into_bytes();

        let mut r = CanonicalReader::new(&bytes);
        assert_eq!(r.read_varint63().unwrap(), 1_000_000);
        assert_eq!(r.read_varstr31().unwrap(), b"program");
        assert_eq!(
            r.read_varstr_list().unwrap(),
            vec![b"sig".to_vec(), b"pub".to_vec()]
        );
        assert_eq!(r.read_hash().unwrap(), [0xff; 32]);
        assert!(r.finish().is_ok());
    }

    #[test]
    fn truncated_varstr_is_eof() {
        let mut r = CanonicalReader::new(&[0x05, 0x01, 0x02]);
        assert_eq!(
            r.read_varstr31(),
            Err(SerializationError::UnexpectedEof {
                needed: 5,
                remaining: 2
            })
        );
    }

    #[test]
    fn unterminated_varint_is_eof() {
        let mut r = CanonicalReader::new(&[0x80, 0x80]);
        assert!(matches!(
            r.read_varint63(),
            Err(SerializationError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn overlong_varint_overflows() {
        let mut r = CanonicalReader::new(&[0xff; 11]);
        assert_eq!(r.read_varint63(), Err(SerializationError::VarintOverflow));
    }

    #[test]
    fn varint31_range_enforced_on_read() {
        // 2^31 encoded as LEB128.
        let mut r = CanonicalReader::new(&[0x80, 0x80, 0x80, 0x80, 0x08]);
        assert!(matches!(
            r.read_varint31(),
            Err(SerializationError::VarintOutOfRange { bits: 31, .. })
        ));
    }

    #[test]
    fn trailing_bytes_detected() {
        let r = CanonicalReader::new(&[0x00]);
        assert_eq!(r.finish(), Err(SerializationError::TrailingBytes(1)));
    }
}
