// SPDX-License-Identifier: Apache-2.0

//! Byte-order handling for proxied connections.
//!
//! Each client announces its byte order in the first octet of the
//! connection initiation, and the server answers that client in the same
//! order. [`Cursor`] carries the order alongside the bytes so that parser
//! bodies stay free of endianness conditionals.

use byteorder::{BigEndian, ByteOrder as _, LittleEndian};

use super::{align, ParseError};

/// Byte order of a connection, fixed at handshake time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    /// Initiation octet announcing LSB-first integers.
    pub const LSB_FIRST_OCTET: u8 = b'l';
    /// Initiation octet announcing MSB-first integers.
    pub const MSB_FIRST_OCTET: u8 = b'B';

    pub fn from_octet(octet: u8) -> Option<Self> {
        match octet {
            Self::LSB_FIRST_OCTET => Some(Self::LittleEndian),
            Self::MSB_FIRST_OCTET => Some(Self::BigEndian),
            _ => None,
        }
    }

    pub const fn host() -> Self {
        if cfg!(target_endian = "big") {
            Self::BigEndian
        } else {
            Self::LittleEndian
        }
    }

    /// Whether integers from a connection in this order need swapping on
    /// this host.
    pub fn swapped(self) -> bool {
        self != Self::host()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::LittleEndian => "LSBFirst",
            Self::BigEndian => "MSBFirst",
        }
    }
}

/// Bounds-checked reader over one framed message.
///
/// Every multi-byte read honors the connection byte order; the `_be`
/// variants are for the few fields the protocol pins to big-endian
/// regardless of the connection (CHAR2B, PolyText font ids).
pub struct Cursor<'a> {
    data: &'a [u8],
    offset: usize,
    byte_order: ByteOrder,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8], byte_order: ByteOrder) -> Self {
        Self {
            data,
            offset: 0,
            byte_order,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ParseError> {
        if self.remaining() < n {
            return Err(ParseError::Truncated {
                needed: self.offset + n,
                available: self.data.len(),
            });
        }
        let bytes = &self.data[self.offset..self.offset + n];
        self.offset += n;
        Ok(bytes)
    }

    pub fn u8(&mut self) -> Result<u8, ParseError> {
        Ok(self.take(1)?[0])
    }

    pub fn i8(&mut self) -> Result<i8, ParseError> {
        Ok(self.u8()? as i8)
    }

    pub fn u16(&mut self) -> Result<u16, ParseError> {
        let bytes = self.take(2)?;
        Ok(match self.byte_order {
            ByteOrder::LittleEndian => LittleEndian::read_u16(bytes),
            ByteOrder::BigEndian => BigEndian::read_u16(bytes),
        })
    }

    pub fn i16(&mut self) -> Result<i16, ParseError> {
        Ok(self.u16()? as i16)
    }

    pub fn u32(&mut self) -> Result<u32, ParseError> {
        let bytes = self.take(4)?;
        Ok(match self.byte_order {
            ByteOrder::LittleEndian => LittleEndian::read_u32(bytes),
            ByteOrder::BigEndian => BigEndian::read_u32(bytes),
        })
    }

    pub fn i32(&mut self) -> Result<i32, ParseError> {
        Ok(self.u32()? as i32)
    }

    /// 16-bit read pinned to big-endian (CHAR2B).
    pub fn u16_be(&mut self) -> Result<u16, ParseError> {
        let bytes = self.take(2)?;
        Ok(BigEndian::read_u16(bytes))
    }

    /// 32-bit read pinned to big-endian (PolyText font-change items).
    pub fn u32_be(&mut self) -> Result<u32, ParseError> {
        let bytes = self.take(4)?;
        Ok(BigEndian::read_u32(bytes))
    }

    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8], ParseError> {
        self.take(n)
    }

    /// Reads `n` bytes and skips the trailing alignment padding.
    pub fn padded_bytes(&mut self, n: usize) -> Result<&'a [u8], ParseError> {
        let bytes = self.take(n)?;
        self.skip(align::padding(n))?;
        Ok(bytes)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), ParseError> {
        self.take(n).map(|_| ())
    }

    /// Skips to the next 4-byte boundary relative to the cursor start.
    pub fn align4(&mut self) -> Result<(), ParseError> {
        self.skip(align::padding(self.offset))
    }

    /// Remaining bytes without consuming them.
    pub fn peek_remaining(&self) -> &'a [u8] {
        &self.data[self.offset..]
    }

    pub fn peek_u8(&self) -> Result<u8, ParseError> {
        self.data
            .get(self.offset)
            .copied()
            .ok_or(ParseError::Truncated {
                needed: self.offset + 1,
                available: self.data.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_from_octet() {
        assert_eq!(ByteOrder::from_octet(b'l'), Some(ByteOrder::LittleEndian));
        assert_eq!(ByteOrder::from_octet(b'B'), Some(ByteOrder::BigEndian));
        assert_eq!(ByteOrder::from_octet(b'x'), None);
    }

    #[test]
    fn test_little_endian_reads() {
        let data = [0x34, 0x12, 0x78, 0x56, 0x34, 0x12];
        let mut c = Cursor::new(&data, ByteOrder::LittleEndian);
        assert_eq!(c.u16().unwrap(), 0x1234);
        assert_eq!(c.u32().unwrap(), 0x12345678);
        assert!(c.is_empty());
    }

    #[test]
    fn test_big_endian_reads() {
        let data = [0x12, 0x34, 0x12, 0x34, 0x56, 0x78];
        let mut c = Cursor::new(&data, ByteOrder::BigEndian);
        assert_eq!(c.u16().unwrap(), 0x1234);
        assert_eq!(c.u32().unwrap(), 0x12345678);
    }

    #[test]
    fn test_swap_is_involutive() {
        // reading the same bytes under both orders and swapping one must
        // agree with the other
        let data = [0xde, 0xad, 0xbe, 0xef];
        let le = Cursor::new(&data, ByteOrder::LittleEndian).u32().unwrap();
        let be = Cursor::new(&data, ByteOrder::BigEndian).u32().unwrap();
        assert_eq!(le.swap_bytes(), be);
        assert_eq!(le.swap_bytes().swap_bytes(), le);
    }

    #[test]
    fn test_pinned_big_endian_reads() {
        let data = [0x00, 0x41, 0x00, 0x12, 0x34, 0x56];
        let mut c = Cursor::new(&data, ByteOrder::LittleEndian);
        assert_eq!(c.u16_be().unwrap(), 0x0041);
        assert_eq!(c.u32_be().unwrap(), 0x00123456);
    }

    #[test]
    fn test_bounds_checking() {
        let data = [0x12];
        let mut c = Cursor::new(&data, ByteOrder::LittleEndian);
        assert!(c.u16().is_err());
        assert_eq!(c.u8().unwrap(), 0x12);
        assert!(matches!(
            c.u8(),
            Err(ParseError::Truncated {
                needed: 2,
                available: 1
            })
        ));
    }

    #[test]
    fn test_padded_bytes() {
        let data = [b'a', b'b', 0, 0, 1, 0, 0, 0];
        let mut c = Cursor::new(&data, ByteOrder::LittleEndian);
        assert_eq!(c.padded_bytes(2).unwrap(), b"ab");
        assert_eq!(c.offset(), 4);
        assert_eq!(c.u32().unwrap(), 1);
    }

    #[test]
    fn test_align4() {
        let data = [1, 2, 3, 4, 5, 6, 7, 8];
        let mut c = Cursor::new(&data, ByteOrder::LittleEndian);
        c.skip(3).unwrap();
        c.align4().unwrap();
        assert_eq!(c.offset(), 4);
        c.align4().unwrap();
        assert_eq!(c.offset(), 4);
    }
}
