//! Byte order (endianness) handling

use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};
use std::io;

/// Byte order of the TIFF data inside an Exif segment.
///
/// This only governs TIFF fields; JPEG marker and segment-length words are
/// always big-endian on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Detect endianness from the TIFF byte-order mark
    pub fn from_tiff_header(data: &[u8]) -> Option<Self> {
        if data.len() < 2 {
            return None;
        }

        match &data[0..2] {
            b"II" => Some(Endian::Little), // Intel byte order
            b"MM" => Some(Endian::Big),    // Motorola byte order
            _ => None,
        }
    }

    /// The two-byte mark that opens a TIFF header in this byte order
    pub fn mark(&self) -> [u8; 2] {
        match self {
            Endian::Little => *b"II",
            Endian::Big => *b"MM",
        }
    }

    /// Read u16 from bytes
    pub fn read_u16(&self, data: &[u8]) -> u16 {
        match self {
            Endian::Little => LittleEndian::read_u16(data),
            Endian::Big => BigEndian::read_u16(data),
        }
    }

    /// Read u32 from bytes
    pub fn read_u32(&self, data: &[u8]) -> u32 {
        match self {
            Endian::Little => LittleEndian::read_u32(data),
            Endian::Big => BigEndian::read_u32(data),
        }
    }

    /// Read i16 from bytes
    pub fn read_i16(&self, data: &[u8]) -> i16 {
        match self {
            Endian::Little => LittleEndian::read_i16(data),
            Endian::Big => BigEndian::read_i16(data),
        }
    }

    /// Read i32 from bytes
    pub fn read_i32(&self, data: &[u8]) -> i32 {
        match self {
            Endian::Little => LittleEndian::read_i32(data),
            Endian::Big => BigEndian::read_i32(data),
        }
    }

    /// Store u16 into the first two bytes of `out`
    pub fn put_u16(&self, out: &mut [u8], value: u16) {
        match self {
            Endian::Little => LittleEndian::write_u16(out, value),
            Endian::Big => BigEndian::write_u16(out, value),
        }
    }

    /// Store u32 into the first four bytes of `out`
    pub fn put_u32(&self, out: &mut [u8], value: u32) {
        match self {
            Endian::Little => LittleEndian::write_u32(out, value),
            Endian::Big => BigEndian::write_u32(out, value),
        }
    }

    pub fn u16_bytes(&self, value: u16) -> [u8; 2] {
        let mut out = [0u8; 2];
        self.put_u16(&mut out, value);
        out
    }

    pub fn u32_bytes(&self, value: u32) -> [u8; 4] {
        let mut out = [0u8; 4];
        self.put_u32(&mut out, value);
        out
    }

    /// Write u16 to a stream
    pub fn write_u16<W: io::Write>(&self, writer: &mut W, value: u16) -> io::Result<()> {
        match self {
            Endian::Little => writer.write_u16::<LittleEndian>(value),
            Endian::Big => writer.write_u16::<BigEndian>(value),
        }
    }

    /// Write u32 to a stream
    pub fn write_u32<W: io::Write>(&self, writer: &mut W, value: u32) -> io::Result<()> {
        match self {
            Endian::Little => writer.write_u32::<LittleEndian>(value),
            Endian::Big => writer.write_u32::<BigEndian>(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_byte_order() {
        assert_eq!(Endian::from_tiff_header(b"II*\0"), Some(Endian::Little));
        assert_eq!(Endian::from_tiff_header(b"MM\0*"), Some(Endian::Big));
        assert_eq!(Endian::from_tiff_header(b"XX"), None);
        assert_eq!(Endian::from_tiff_header(b"I"), None);
    }

    #[test]
    fn test_read_both_orders() {
        let data = [0x12, 0x34, 0x56, 0x78];
        assert_eq!(Endian::Little.read_u16(&data), 0x3412);
        assert_eq!(Endian::Big.read_u16(&data), 0x1234);
        assert_eq!(Endian::Little.read_u32(&data), 0x7856_3412);
        assert_eq!(Endian::Big.read_u32(&data), 0x1234_5678);
    }

    #[test]
    fn test_signed_reads() {
        let data = [0xFE, 0xFF, 0xFF, 0xFF];
        assert_eq!(Endian::Little.read_i16(&data), -2);
        assert_eq!(Endian::Little.read_i32(&data), -2);
        assert_eq!(Endian::Big.read_i16(&[0xFF, 0xFE]), -2);
    }

    #[test]
    fn test_write_round_trips_read() {
        for endian in [Endian::Little, Endian::Big] {
            assert_eq!(endian.read_u16(&endian.u16_bytes(0xBEEF)), 0xBEEF);
            assert_eq!(endian.read_u32(&endian.u32_bytes(0xDEAD_BEEF)), 0xDEAD_BEEF);
        }
    }

    #[test]
    fn test_stream_writes() {
        let mut out = Vec::new();
        Endian::Big.write_u16(&mut out, 0x002A).unwrap();
        Endian::Little.write_u32(&mut out, 8).unwrap();
        assert_eq!(out, [0x00, 0x2A, 0x08, 0x00, 0x00, 0x00]);
    }
}
