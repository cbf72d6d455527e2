//! Little-endian and CompactSize primitives for the transaction wire format

use crate::error::{DecodingError, Result};

/// Cursor over a byte slice; every read is bounds-checked.
pub struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Look at the next `n` bytes without consuming them
    pub fn peek(&self, n: usize) -> Option<&'a [u8]> {
        self.data.get(self.offset..self.offset.checked_add(n)?)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(DecodingError::Truncated { offset: self.offset, needed: n });
        }
        let bytes = &self.data[self.offset..self.offset + n];
        self.offset += n;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32_le(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64_le(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_hash(&mut self) -> Result<[u8; 32]> {
        self.read_array()
    }

    /// Read a CompactSize, rejecting non-minimal encodings
    pub fn read_compact_size(&mut self) -> Result<u64> {
        let start = self.offset;
        let tag = self.read_u8()?;
        let (value, minimal) = match tag {
            0x00..=0xfc => (tag as u64, true),
            0xfd => {
                let v = self.read_u16_le()? as u64;
                (v, v >= 0xfd)
            }
            0xfe => {
                let v = self.read_u32_le()? as u64;
                (v, v > 0xffff)
            }
            0xff => {
                let v = self.read_u64_le()?;
                (v, v > 0xffff_ffff)
            }
        };
        if !minimal {
            return Err(DecodingError::NonCanonicalVarInt(start));
        }
        Ok(value)
    }

    /// Read a count of items that each occupy at least `min_item_size` bytes.
    ///
    /// Counts that cannot fit in the remaining data fail before the caller allocates.
    pub fn read_count(&mut self, min_item_size: usize) -> Result<usize> {
        let count = self.read_compact_size()?;
        let needed = count.saturating_mul(min_item_size as u64);
        if needed > self.remaining() as u64 {
            return Err(DecodingError::Truncated {
                offset: self.offset,
                needed: usize::try_from(needed).unwrap_or(usize::MAX),
            });
        }
        Ok(count as usize)
    }

    /// Read a CompactSize length followed by that many bytes
    pub fn read_var_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_count(1)?;
        self.read_bytes(len)
    }
}

/// Encode a number as a Bitcoin CompactSize
pub fn encode_varint(value: u64, out: &mut Vec<u8>) {
    match value {
        0x00..=0xfc => out.push(value as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(value as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(value as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
}

/// Append a CompactSize length prefix and the bytes themselves
pub fn encode_var_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    encode_varint(bytes.len() as u64, out);
    out.extend_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_varint_small() {
        let mut out = Vec::new();
        encode_varint(0xfc, &mut out);
        assert_eq!(out, vec![0xfc]);
    }

    #[test]
    fn test_encode_varint_medium() {
        let mut out = Vec::new();
        encode_varint(0xfd, &mut out);
        assert_eq!(out, vec![0xfd, 0xfd, 0x00]);
    }

    #[test]
    fn test_encode_varint_large() {
        let mut out = Vec::new();
        encode_varint(0x10000, &mut out);
        assert_eq!(out, vec![0xfe, 0x00, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn test_encode_varint_huge() {
        let mut out = Vec::new();
        encode_varint(0x1_0000_0000, &mut out);
        assert_eq!(out.len(), 9);
        assert_eq!(out[0], 0xff);
    }

    #[test]
    fn test_read_compact_size_values() {
        let data = [0x05, 0xfd, 0x00, 0x01, 0xfe, 0x00, 0x00, 0x01, 0x00];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.read_compact_size().unwrap(), 5);
        assert_eq!(reader.read_compact_size().unwrap(), 0x100);
        assert_eq!(reader.read_compact_size().unwrap(), 0x10000);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_read_compact_size_non_minimal() {
        let data = [0xfd, 0x10, 0x00];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.read_compact_size(), Err(DecodingError::NonCanonicalVarInt(0)));
    }

    #[test]
    fn test_read_bytes_truncated() {
        let data = [0x01, 0x02];
        let mut reader = Reader::new(&data);
        assert_eq!(
            reader.read_u32_le(),
            Err(DecodingError::Truncated { offset: 0, needed: 4 })
        );
        // A failed read consumes nothing
        assert_eq!(reader.offset(), 0);
    }

    #[test]
    fn test_read_count_rejects_oversized() {
        // Claims 200 items of at least 41 bytes with only 3 bytes left
        let data = [0xc8, 0x00, 0x00, 0x00];
        let mut reader = Reader::new(&data);
        assert!(matches!(reader.read_count(41), Err(DecodingError::Truncated { .. })));
    }

    #[test]
    fn test_read_var_bytes() {
        let data = [0x02, 0xaa, 0xbb, 0xcc];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.read_var_bytes().unwrap(), &[0xaa, 0xbb]);
        assert_eq!(reader.remaining(), 1);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let data = [0x00, 0x01];
        let reader = Reader::new(&data);
        assert_eq!(reader.peek(2), Some(&data[..]));
        assert_eq!(reader.peek(3), None);
        assert_eq!(reader.offset(), 0);
    }
}
