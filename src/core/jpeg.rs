//! JPEG marker-chain scanning
//!
//! Walks the APP0..APPn segment chain of a JPEG stream to locate an APP1
//! segment by its id string and to record where the DQT marker sits. No
//! image decoding happens here; the scan stops at the first marker that is
//! not an application segment.

use crate::error::{Error, Result};
use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Read, Seek, SeekFrom};

/// JPEG segment markers
pub(crate) const MARKER_SOI: u16 = 0xFFD8; // Start of Image
pub(crate) const MARKER_APP1: u16 = 0xFFE1;
pub(crate) const MARKER_DQT: u16 = 0xFFDB; // Define Quantization Table

/// APP1 id string of an Exif segment. Only the first five bytes take part
/// in the comparison; the stored id carries a second NUL.
pub const EXIF_ID: &[u8] = b"Exif\0";

/// APP1 id prefix of Adobe's XMP metadata segment
pub const ADOBE_XAP_ID: &[u8] = b"http://ns.adobe.com/xap/";

/// Where the interesting segments of a JPEG stream sit
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    /// Offset of the first APP1 segment whose id matched
    pub app1_offset: Option<u64>,
    /// Offset of the DQT marker, when one was seen before the scan stopped
    pub dqt_offset: Option<u64>,
}

/// Scan the marker chain for an APP1 segment introduced by `id`.
///
/// The stream must open with SOI. Application segments are skipped by their
/// declared length; every APP1 segment has its id compared against `id`.
/// Once a match is recorded the scan ends at the next marker that is not
/// another APP1, so a trailing DQT offset is only reported when it is seen
/// before (or instead of) the match.
pub fn scan_segments<R: Read + Seek>(reader: &mut R, id: &[u8]) -> Result<ScanReport> {
    let mut report = ScanReport::default();
    reader.seek(SeekFrom::Start(0)).map_err(Error::ReadFile)?;

    let marker = reader.read_u16::<BigEndian>().map_err(Error::ReadFile)?;
    if marker != MARKER_SOI {
        return Err(Error::InvalidJpeg(format!(
            "expected SOI marker, found {marker:#06x}"
        )));
    }

    let mut marker = reader.read_u16::<BigEndian>().map_err(Error::ReadFile)?;
    if marker == MARKER_DQT {
        // no application segments at all
        report.dqt_offset = Some(position(reader)? - 2);
        return Ok(report);
    }

    let mut pos = position(reader)?;
    loop {
        if !(0xFFE0..=0xFFEF).contains(&marker) {
            if marker == MARKER_DQT {
                report.dqt_offset = Some(pos - 2);
            }
            tracing::debug!("scan stopped at marker {marker:#06x}, offset {:#x}", pos - 2);
            break;
        }

        let length = reader.read_u16::<BigEndian>().map_err(Error::ReadFile)? as u64;
        if length < 2 {
            return Err(Error::InvalidJpeg(format!(
                "segment {marker:#06x} declares length {length}"
            )));
        }

        if marker != MARKER_APP1 {
            // the segment chain past the match holds nothing more for us
            if report.app1_offset.is_some() {
                break;
            }
            reader
                .seek(SeekFrom::Current(length as i64 - 2))
                .map_err(|_| Error::InvalidJpeg("truncated segment".into()))?;
        } else {
            let mut head = vec![0u8; id.len() + 4];
            let got = read_up_to(reader, &mut head).map_err(Error::ReadFile)?;
            if got < id.len() {
                return Err(Error::InvalidJpeg("APP1 segment shorter than its id".into()));
            }
            if &head[..id.len()] == id && report.app1_offset.is_none() {
                report.app1_offset = Some(pos - 2);
            }
            tracing::debug!(
                "APP1 at {:#x}, len={}, id starts {:?}",
                pos - 2,
                length - 2,
                String::from_utf8_lossy(&head[..4.min(got)])
            );
            reader
                .seek(SeekFrom::Start(pos + length))
                .map_err(|_| Error::InvalidJpeg("truncated APP1 segment".into()))?;
        }

        marker = reader.read_u16::<BigEndian>().map_err(Error::ReadFile)?;
        pos = position(reader)?;
    }
    Ok(report)
}

fn position<S: Seek>(stream: &mut S) -> Result<u64> {
    stream.stream_position().map_err(Error::ReadFile)
}

/// Read as many bytes as the stream still has, up to `buf.len()`
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let got = reader.read(&mut buf[filled..])?;
        if got == 0 {
            break;
        }
        filled += got;
    }
    Ok(filled)
}
