//! APP1 segment preamble and TIFF header
//!
//! The first 18 bytes of an Exif APP1 segment: marker, big-endian segment
//! length, the `"Exif\0\0"` id, and the TIFF header that fixes the byte
//! order of everything that follows. All IFD offsets are relative to the
//! start of the TIFF header.

use crate::core::endian::Endian;
use crate::error::{Error, Result};
use byteorder::ByteOrder as _;
use std::io::{Read, Seek, SeekFrom};

/// Marker word of an APP1 segment
pub const APP1_MARKER: u16 = 0xFFE1;

/// Segment id introducing Exif data
pub const EXIF_IDENT: [u8; 6] = *b"Exif\0\0";

/// TIFF version word, always 42
pub const TIFF_MAGIC: u16 = 0x002A;

/// Size of the TIFF header: byte-order mark, version, 0th-IFD offset
pub const TIFF_HEADER_LEN: u16 = 8;

/// Bytes from the APP1 marker to the TIFF header (marker + length + id)
pub const TIFF_HEADER_START: u64 = 10;

/// Size of the whole preamble including the TIFF header
pub const APP1_HEADER_LEN: u16 = TIFF_HEADER_START as u16 + TIFF_HEADER_LEN;

/// The 8-byte TIFF header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    pub endian: Endian,
    pub ifd0_offset: u32,
}

/// Decoded APP1 segment preamble
#[derive(Debug, Clone)]
pub struct App1Header {
    /// Segment length as stored on the wire; counts everything after the
    /// marker, including the length word itself
    pub length: u16,
    pub ident: [u8; 6],
    pub tiff: TiffHeader,
}

impl Default for App1Header {
    /// Header for a freshly created segment: little-endian data, IFD0 at
    /// the fixed base
    fn default() -> Self {
        App1Header {
            length: 0,
            ident: EXIF_IDENT,
            tiff: TiffHeader {
                endian: Endian::Little,
                ifd0_offset: TIFF_HEADER_LEN as u32,
            },
        }
    }
}

impl App1Header {
    /// Read and validate the preamble at `offset`
    pub fn read_at<R: Read + Seek>(reader: &mut R, offset: u64) -> Result<Self> {
        reader.seek(SeekFrom::Start(offset)).map_err(Error::ReadFile)?;
        let mut raw = [0u8; APP1_HEADER_LEN as usize];
        reader
            .read_exact(&mut raw)
            .map_err(|_| Error::InvalidApp1Header("truncated APP1 header".into()))?;

        let marker = byteorder::BigEndian::read_u16(&raw[0..2]);
        if marker != APP1_MARKER {
            return Err(Error::InvalidApp1Header(format!(
                "unexpected marker {marker:#06x}"
            )));
        }
        let length = byteorder::BigEndian::read_u16(&raw[2..4]);

        let mut ident = [0u8; 6];
        ident.copy_from_slice(&raw[4..10]);

        let endian = Endian::from_tiff_header(&raw[10..12])
            .ok_or_else(|| Error::InvalidApp1Header("invalid TIFF byte-order mark".into()))?;
        let magic = endian.read_u16(&raw[12..14]);
        if magic != TIFF_MAGIC {
            return Err(Error::InvalidApp1Header(format!(
                "invalid TIFF version word {magic:#06x}"
            )));
        }
        let ifd0_offset = endian.read_u32(&raw[14..18]);

        Ok(App1Header {
            length,
            ident,
            tiff: TiffHeader { endian, ifd0_offset },
        })
    }

    /// Encode the preamble with a recomputed segment length.
    ///
    /// Re-encoded segments always lay the 0th IFD at the fixed base, so the
    /// stored 0th-IFD offset is 8 regardless of what the input carried.
    pub fn encode(&self, length: u16) -> [u8; APP1_HEADER_LEN as usize] {
        let mut out = [0u8; APP1_HEADER_LEN as usize];
        byteorder::BigEndian::write_u16(&mut out[0..2], APP1_MARKER);
        byteorder::BigEndian::write_u16(&mut out[2..4], length);
        out[4..10].copy_from_slice(&self.ident);
        out[10..12].copy_from_slice(&self.tiff.endian.mark());
        self.tiff.endian.put_u16(&mut out[12..14], TIFF_MAGIC);
        self.tiff.endian.put_u32(&mut out[14..18], TIFF_HEADER_LEN as u32);
        out
    }
}
