//! APP1 segment emission
//!
//! Emits the reconciled graph as one complete APP1 segment: preamble, then
//! each IFD's entry table with inline values packed into the 4-byte slot or
//! a running offset into the out-of-line area, the out-of-line payloads in
//! tag order, and the thumbnail bytes at the very end of the 1st IFD.
//! `fixup::reconcile` must have run so lengths and pointer tags agree with
//! what gets written.

use crate::core::app1::{App1Header, APP1_HEADER_LEN, TIFF_HEADER_LEN};
use crate::core::endian::Endian;
use crate::core::graph::IfdGraph;
use crate::core::ifd::{IfdKind, IfdTable};
use crate::core::tag::Tag;
use crate::core::value::TagValue;
use crate::error::{Error, Result};
use std::io::Write;

pub fn write_segment<W: Write>(
    writer: &mut W,
    graph: &IfdGraph,
    header: &App1Header,
) -> Result<()> {
    // child IFDs are only reachable through pointers rooted in the 0th
    // IFD, so a graph carrying IFDs without one cannot be encoded
    if graph.ifd(IfdKind::Zeroth).is_none() {
        if graph.is_empty() {
            return Ok(());
        }
        return Err(Error::InvalidIfd(
            "graph has IFDs but no 0th IFD to root them".into(),
        ));
    }

    let total: u32 = (APP1_HEADER_LEN as u32 - 2)
        + graph.ifds().map(|ifd| ifd.length()).sum::<u32>();
    if total > u16::MAX as u32 {
        tracing::warn!("reconciled segment needs {total} bytes, over the APP1 limit");
        return Err(Error::Unknown);
    }
    writer
        .write_all(&header.encode(total as u16))
        .map_err(Error::WriteFile)?;

    let endian = header.tiff.endian;
    // out-of-line values are addressed by a single offset running across
    // all IFDs, starting right behind the TIFF header
    let mut out_of_line_at = TIFF_HEADER_LEN as u32;
    for kind in IfdKind::WRITE_ORDER {
        if let Some(ifd) = graph.ifd(kind) {
            write_ifd(writer, ifd, endian, &mut out_of_line_at)?;
        }
    }
    Ok(())
}

fn write_ifd<W: Write>(
    writer: &mut W,
    ifd: &IfdTable,
    endian: Endian,
    out_of_line_at: &mut u32,
) -> Result<()> {
    let live: Vec<&Tag> = ifd.tags().filter(|tag| !tag.is_error()).collect();
    *out_of_line_at += 2 + 12 * live.len() as u32 + 4;

    endian
        .write_u16(writer, live.len() as u16)
        .map_err(Error::WriteFile)?;

    for tag in &live {
        endian.write_u16(writer, tag.id()).map_err(Error::WriteFile)?;
        endian
            .write_u16(writer, tag.tag_type() as u16)
            .map_err(Error::WriteFile)?;
        endian
            .write_u32(writer, tag.count())
            .map_err(Error::WriteFile)?;
        let slot = if tag.is_inline() {
            pack_inline(tag, endian)
        } else {
            let slot = endian.u32_bytes(*out_of_line_at);
            *out_of_line_at += tag.out_of_line_size();
            slot
        };
        writer.write_all(&slot).map_err(Error::WriteFile)?;
    }

    endian
        .write_u32(writer, ifd.next_ifd_offset())
        .map_err(Error::WriteFile)?;

    for tag in &live {
        if !tag.is_inline() {
            write_payload(writer, tag, endian)?;
        }
    }

    if ifd.kind() == IfdKind::First {
        if let Some(buf) = ifd.thumbnail() {
            let len = ifd.thumbnail_write_len() as usize;
            if len > 0 {
                writer.write_all(&buf[..len]).map_err(Error::WriteFile)?;
            }
        }
    }
    Ok(())
}

/// Pack an inline value into the entry's 4-byte slot, left-justified in
/// data endianness
fn pack_inline(tag: &Tag, endian: Endian) -> [u8; 4] {
    let mut slot = [0u8; 4];
    match tag.value() {
        TagValue::Ascii(bytes) | TagValue::Undefined(bytes) | TagValue::Byte(bytes) => {
            slot[..bytes.len()].copy_from_slice(bytes);
        }
        TagValue::SByte(values) => {
            for (i, &n) in values.iter().enumerate() {
                slot[i] = n as u8;
            }
        }
        TagValue::Short(values) => {
            for (i, &n) in values.iter().enumerate() {
                endian.put_u16(&mut slot[i * 2..i * 2 + 2], n);
            }
        }
        TagValue::SShort(values) => {
            for (i, &n) in values.iter().enumerate() {
                endian.put_u16(&mut slot[i * 2..i * 2 + 2], n as u16);
            }
        }
        TagValue::Long(values) => {
            if let Some(&n) = values.first() {
                endian.put_u32(&mut slot, n);
            }
        }
        TagValue::SLong(values) => {
            if let Some(&n) = values.first() {
                endian.put_u32(&mut slot, n as u32);
            }
        }
        // rationals are 8 bytes a piece and never inline
        TagValue::Rational(_) | TagValue::SRational(_) => {}
    }
    slot
}

/// Write an out-of-line payload, padding byte-sized data to the even
/// boundary
fn write_payload<W: Write>(writer: &mut W, tag: &Tag, endian: Endian) -> Result<()> {
    match tag.value() {
        TagValue::Ascii(bytes) | TagValue::Undefined(bytes) | TagValue::Byte(bytes) => {
            writer.write_all(bytes).map_err(Error::WriteFile)?;
            if bytes.len() % 2 != 0 {
                writer.write_all(&[0]).map_err(Error::WriteFile)?;
            }
        }
        TagValue::SByte(values) => {
            for &n in values {
                writer.write_all(&[n as u8]).map_err(Error::WriteFile)?;
            }
            if values.len() % 2 != 0 {
                writer.write_all(&[0]).map_err(Error::WriteFile)?;
            }
        }
        TagValue::Short(values) => {
            for &n in values {
                endian.write_u16(writer, n).map_err(Error::WriteFile)?;
            }
        }
        TagValue::SShort(values) => {
            for &n in values {
                endian.write_u16(writer, n as u16).map_err(Error::WriteFile)?;
            }
        }
        TagValue::Long(values) => {
            for &n in values {
                endian.write_u32(writer, n).map_err(Error::WriteFile)?;
            }
        }
        TagValue::SLong(values) => {
            for &n in values {
                endian.write_u32(writer, n as u32).map_err(Error::WriteFile)?;
            }
        }
        TagValue::Rational(values) => {
            for &(num, den) in values {
                endian.write_u32(writer, num).map_err(Error::WriteFile)?;
                endian.write_u32(writer, den).map_err(Error::WriteFile)?;
            }
        }
        TagValue::SRational(values) => {
            for &(num, den) in values {
                endian.write_u32(writer, num as u32).map_err(Error::WriteFile)?;
                endian.write_u32(writer, den as u32).map_err(Error::WriteFile)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixup;
    use crate::tables;
    use pretty_assertions::assert_eq;

    fn emit(graph: &mut IfdGraph, header: &App1Header) -> Vec<u8> {
        fixup::reconcile(graph);
        let mut out = Vec::new();
        write_segment(&mut out, graph, header).unwrap();
        out
    }

    #[test]
    fn test_empty_graph_writes_nothing() {
        let graph = IfdGraph::new();
        let mut out = Vec::new();
        write_segment(&mut out, &graph, &App1Header::default()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_rootless_graph_rejected() {
        let mut graph = IfdGraph::new();
        graph.insert_ifd(IfdKind::Gps).unwrap();
        fixup::reconcile(&mut graph);
        let mut out = Vec::new();
        let result = write_segment(&mut out, &graph, &App1Header::default());
        assert!(matches!(result, Err(Error::InvalidIfd(_))));
        assert!(out.is_empty());
    }

    #[test]
    fn test_single_make_tag_layout() {
        let mut graph = IfdGraph::new();
        graph.insert_ifd(IfdKind::Zeroth).unwrap();
        graph
            .insert_tag(
                IfdKind::Zeroth,
                Tag::new(tables::MAKE, TagValue::ascii("ABCDE")).unwrap(),
            )
            .unwrap();
        let out = emit(&mut graph, &App1Header::default());

        // preamble + TIFF header + one-tag IFD with a 6-byte payload
        assert_eq!(out.len(), 18 + 24);
        assert_eq!(&out[0..2], &[0xFF, 0xE1]);
        // length = 16 + 24, big-endian regardless of data endianness
        assert_eq!(&out[2..4], &40u16.to_be_bytes());
        assert_eq!(&out[4..10], b"Exif\0\0");
        assert_eq!(&out[10..14], b"II\x2A\x00");
        assert_eq!(&out[14..18], &8u32.to_le_bytes());
        // entry table: count 1, tag 0x010F type 2 count 6, offset 26
        assert_eq!(&out[18..20], &1u16.to_le_bytes());
        assert_eq!(&out[20..22], &0x010Fu16.to_le_bytes());
        assert_eq!(&out[22..24], &2u16.to_le_bytes());
        assert_eq!(&out[24..28], &6u32.to_le_bytes());
        assert_eq!(&out[28..32], &26u32.to_le_bytes());
        assert_eq!(&out[32..36], &0u32.to_le_bytes());
        assert_eq!(&out[36..42], b"ABCDE\0");
    }

    #[test]
    fn test_inline_undefined_bytes_kept_verbatim() {
        let mut graph = IfdGraph::new();
        graph.insert_ifd(IfdKind::Zeroth).unwrap();
        graph
            .insert_tag(
                IfdKind::Zeroth,
                Tag::new(
                    tables::COMPONENTS_CONFIGURATION,
                    TagValue::Undefined(vec![1, 2, 3, 0]),
                )
                .unwrap(),
            )
            .unwrap();
        let out = emit(&mut graph, &App1Header::default());
        // slot bytes are the payload itself, in either endianness
        assert_eq!(&out[28..32], &[1, 2, 3, 0]);
    }

    #[test]
    fn test_odd_payload_padded() {
        let mut graph = IfdGraph::new();
        graph.insert_ifd(IfdKind::Zeroth).unwrap();
        graph
            .insert_tag(
                IfdKind::Zeroth,
                Tag::new(tables::MAKE, TagValue::Ascii(b"ABCD\0".to_vec())).unwrap(),
            )
            .unwrap();
        let out = emit(&mut graph, &App1Header::default());
        // 5 payload bytes round up to 6 on disk
        assert_eq!(out.len(), 18 + 2 + 12 + 4 + 6);
        assert_eq!(&out[36..42], b"ABCD\0\0");
    }

    #[test]
    fn test_big_endian_emission() {
        let mut header = App1Header::default();
        header.tiff.endian = Endian::Big;
        let mut graph = IfdGraph::new();
        graph.insert_ifd(IfdKind::Zeroth).unwrap();
        graph
            .insert_tag(
                IfdKind::Zeroth,
                Tag::new(tables::ORIENTATION, TagValue::Short(vec![6])).unwrap(),
            )
            .unwrap();
        let out = emit(&mut graph, &header);

        assert_eq!(&out[10..14], b"MM\x00\x2A");
        assert_eq!(&out[14..18], &8u32.to_be_bytes());
        assert_eq!(&out[18..20], &1u16.to_be_bytes());
        assert_eq!(&out[20..22], &tables::ORIENTATION.to_be_bytes());
        // inline SHORT left-justified in big-endian order
        assert_eq!(&out[28..32], &[0x00, 0x06, 0x00, 0x00]);
    }

    #[test]
    fn test_thumbnail_appended_last() {
        let mut graph = IfdGraph::new();
        graph.insert_ifd(IfdKind::Zeroth).unwrap();
        let thumb = [0xFF, 0xD8, 0xAA, 0xBB, 0xFF, 0xD9];
        graph.set_thumbnail(&thumb).unwrap();
        let out = emit(&mut graph, &App1Header::default());
        assert_eq!(&out[out.len() - thumb.len()..], &thumb);
    }
}
