//! File-level splicing of APP1 segments
//!
//! Each operation streams the input to a fresh output path: the bytes in
//! front of the segment, then (for updates) the re-encoded segment, then
//! everything behind the old one. The input file is never touched.

use crate::core::app1::App1Header;
use crate::core::fixup;
use crate::core::graph::IfdGraph;
use crate::core::jpeg;
use crate::core::writer;
use crate::error::{Error, Result};
use byteorder::{BigEndian, ReadBytesExt};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

const COPY_BUF_LEN: usize = 8192;

/// Remove the Exif APP1 segment from `input`, writing the rest of the file
/// to `output` unchanged. `Ok(false)` when there is no Exif segment (and no
/// output is produced).
pub fn remove_exif_segment<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<bool> {
    let mut reader = open_input(input)?;
    let scan = jpeg::scan_segments(&mut reader, jpeg::EXIF_ID)?;
    let Some(app1_offset) = scan.app1_offset else {
        return Ok(false);
    };
    let header = App1Header::read_at(&mut reader, app1_offset)?;

    let mut writer = create_output(output)?;
    copy_prefix(&mut reader, &mut writer, app1_offset)?;
    skip_to(&mut reader, app1_offset + 2 + header.length as u64)?;
    copy_remainder(&mut reader, &mut writer)?;
    writer.flush().map_err(Error::WriteFile)?;
    Ok(true)
}

/// Re-encode the graph into `input`'s Exif segment, writing the result to
/// `output`. When the input has no Exif segment yet, a fresh little-endian
/// segment is inserted immediately before the DQT marker.
pub fn update_exif_segment<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    graph: &mut IfdGraph,
) -> Result<()> {
    fixup::reconcile(graph);

    let mut reader = open_input(input)?;
    let scan = jpeg::scan_segments(&mut reader, jpeg::EXIF_ID)?;
    let (splice_at, old_header) = match scan.app1_offset {
        Some(offset) => {
            let header = App1Header::read_at(&mut reader, offset)?;
            (offset, Some(header))
        }
        None => {
            let Some(dqt) = scan.dqt_offset else {
                return Err(Error::InvalidJpeg(
                    "no DQT marker to insert the Exif segment before".into(),
                ));
            };
            (dqt, None)
        }
    };
    let header = old_header.clone().unwrap_or_default();

    let mut writer = create_output(output)?;
    copy_prefix(&mut reader, &mut writer, splice_at)?;
    writer::write_segment(&mut writer, graph, &header)?;
    if let Some(old) = old_header {
        skip_to(&mut reader, splice_at + 2 + old.length as u64)?;
    }
    copy_remainder(&mut reader, &mut writer)?;
    writer.flush().map_err(Error::WriteFile)?;
    Ok(())
}

/// Remove Adobe's XMP APP1 segment. Same splice as `remove_exif_segment`,
/// but the segment carries no TIFF preamble, so only the marker-level
/// length is read. `Ok(false)` when the segment is absent.
pub fn remove_adobe_metadata<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<bool> {
    let mut reader = open_input(input)?;
    let scan = jpeg::scan_segments(&mut reader, jpeg::ADOBE_XAP_ID)?;
    let Some(offset) = scan.app1_offset else {
        return Ok(false);
    };
    reader
        .seek(SeekFrom::Start(offset + 2))
        .map_err(Error::ReadFile)?;
    let length = reader.read_u16::<BigEndian>().map_err(Error::ReadFile)? as u64;

    let mut writer = create_output(output)?;
    copy_prefix(&mut reader, &mut writer, offset)?;
    skip_to(&mut reader, offset + 2 + length)?;
    copy_remainder(&mut reader, &mut writer)?;
    writer.flush().map_err(Error::WriteFile)?;
    Ok(true)
}

fn open_input<P: AsRef<Path>>(path: P) -> Result<BufReader<File>> {
    File::open(path).map(BufReader::new).map_err(Error::ReadFile)
}

fn create_output<P: AsRef<Path>>(path: P) -> Result<BufWriter<File>> {
    File::create(path).map(BufWriter::new).map_err(Error::WriteFile)
}

fn skip_to<R: Read + Seek>(reader: &mut R, offset: u64) -> Result<()> {
    reader.seek(SeekFrom::Start(offset)).map_err(Error::ReadFile)?;
    Ok(())
}

/// Stream the first `len` bytes of the input to the output
fn copy_prefix<R: Read + Seek, W: Write>(reader: &mut R, writer: &mut W, len: u64) -> Result<()> {
    reader.seek(SeekFrom::Start(0)).map_err(Error::ReadFile)?;
    let mut buf = [0u8; COPY_BUF_LEN];
    let mut remaining = len;
    while remaining > 0 {
        let want = remaining.min(COPY_BUF_LEN as u64) as usize;
        let got = reader.read(&mut buf[..want]).map_err(Error::ReadFile)?;
        if got == 0 {
            return Err(Error::ReadFile(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input ended inside the segment prefix",
            )));
        }
        writer.write_all(&buf[..got]).map_err(Error::WriteFile)?;
        remaining -= got as u64;
    }
    Ok(())
}

/// Fixed-buffer read/write loop to the end of the input
fn copy_remainder<R: Read, W: Write>(reader: &mut R, writer: &mut W) -> Result<()> {
    let mut buf = [0u8; COPY_BUF_LEN];
    loop {
        let got = reader.read(&mut buf).map_err(Error::ReadFile)?;
        if got == 0 {
            return Ok(());
        }
        writer.write_all(&buf[..got]).map_err(Error::WriteFile)?;
    }
}
