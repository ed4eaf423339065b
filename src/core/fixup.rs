//! Offset and length reconciliation before writing
//!
//! Reconciliation makes the graph self-consistent: error tags are disposed
//! of, each IFD's encoded length is recomputed, offsets are assigned in
//! layout order, and every pointer tag is made to hold its referent's
//! offset (or 0 when the referent is gone). Creating a missing pointer tag
//! enlarges its parent IFD, which perturbs every offset downstream, so the
//! whole procedure repeats until a pass creates nothing; each pointer tag
//! is created at most once, which bounds the loop.

use crate::core::app1::TIFF_HEADER_LEN;
use crate::core::graph::IfdGraph;
use crate::core::ifd::{IfdKind, IfdTable};
use crate::core::tag::Tag;
use crate::core::value::TagValue;
use crate::tables;

/// All IFD offsets count from the start of the TIFF header
const OFFSET_BASE: u32 = TIFF_HEADER_LEN as u32;

/// `tag count + entries + next-IFD link` plus out-of-line payloads and, for
/// the 1st IFD, the thumbnail bytes
fn ifd_size(ifd: &IfdTable) -> u32 {
    let mut size = 2 + 12 * ifd.live_tag_count() + 4;
    size += ifd
        .tags()
        .filter(|tag| !tag.is_error())
        .map(Tag::out_of_line_size)
        .sum::<u32>();
    if ifd.kind() == IfdKind::First {
        size += ifd.thumbnail_write_len();
    }
    size
}

/// Point `id` in `ifd` at `target`, creating the tag when it is missing.
/// Returns true when a tag had to be created.
fn set_or_create_pointer(ifd: &mut IfdTable, id: u16, target: u32) -> bool {
    match ifd.tag_mut(id) {
        Some(tag) => {
            tag.set_single_uint(target);
            false
        }
        None => {
            // created with a dummy value; the next pass assigns the target
            // after lengths have caught up
            let _ = ifd.insert_tag(Tag::with_value(id, TagValue::Long(vec![0])));
            true
        }
    }
}

/// Zero the pointer tag if it is present; an absent referent never creates
/// a pointer
fn zero_pointer(ifd: &mut IfdTable, id: u16) {
    if let Some(tag) = ifd.tag_mut(id) {
        tag.set_single_uint(0);
    }
}

pub fn reconcile(graph: &mut IfdGraph) {
    loop {
        // dispose error tags and refresh lengths before laying anything out
        for kind in IfdKind::WRITE_ORDER {
            if let Some(ifd) = graph.ifd_mut(kind) {
                ifd.drop_error_tags();
                let size = ifd_size(ifd);
                ifd.set_length(size);
                ifd.set_next_ifd_offset(0);
            }
        }
        if graph.ifd(IfdKind::Zeroth).is_none() {
            return;
        }

        let len = |kind| graph.ifd(kind).map(IfdTable::length).unwrap_or(0);
        let len_zeroth = len(IfdKind::Zeroth);
        let len_exif = len(IfdKind::Exif);
        let len_interop = len(IfdKind::Interop);
        let len_gps = len(IfdKind::Gps);
        let mut changed = false;

        if let Some(zeroth) = graph.ifd_mut(IfdKind::Zeroth) {
            zeroth.set_offset(OFFSET_BASE);
        }

        // chain the 1st IFD behind everything else and settle the thumbnail
        if graph.ifd(IfdKind::First).is_some() {
            let first_offset = OFFSET_BASE + len_zeroth + len_exif + len_interop + len_gps;
            if let Some(zeroth) = graph.ifd_mut(IfdKind::Zeroth) {
                zeroth.set_next_ifd_offset(first_offset);
            }
            if let Some(first) = graph.ifd_mut(IfdKind::First) {
                first.set_offset(first_offset);
                let first_length = first.length();
                if first.thumbnail().is_some() {
                    if first.tag(tables::JPEG_INTERCHANGE_FORMAT_LENGTH).is_some() {
                        // the thumbnail sits at the very end of the 1st IFD
                        let target = first_offset + first_length - first.thumbnail_write_len();
                        changed |= set_or_create_pointer(
                            first,
                            tables::JPEG_INTERCHANGE_FORMAT,
                            target,
                        );
                    } else {
                        zero_pointer(first, tables::JPEG_INTERCHANGE_FORMAT);
                    }
                }
            }
        }

        // ExifIFDPointer in the 0th IFD, InteroperabilityIFDPointer in Exif
        if graph.ifd(IfdKind::Exif).is_some() {
            let target = OFFSET_BASE + len_zeroth;
            if let Some(zeroth) = graph.ifd_mut(IfdKind::Zeroth) {
                changed |= set_or_create_pointer(zeroth, tables::EXIF_IFD_POINTER, target);
            }
            if let Some(exif) = graph.ifd_mut(IfdKind::Exif) {
                exif.set_offset(target);
            }
            if graph.ifd(IfdKind::Interop).is_some() {
                let target = OFFSET_BASE + len_zeroth + len_exif;
                if let Some(exif) = graph.ifd_mut(IfdKind::Exif) {
                    changed |= set_or_create_pointer(exif, tables::INTEROP_IFD_POINTER, target);
                }
                if let Some(interop) = graph.ifd_mut(IfdKind::Interop) {
                    interop.set_offset(target);
                }
            } else if let Some(exif) = graph.ifd_mut(IfdKind::Exif) {
                zero_pointer(exif, tables::INTEROP_IFD_POINTER);
            }
        } else if let Some(zeroth) = graph.ifd_mut(IfdKind::Zeroth) {
            zero_pointer(zeroth, tables::EXIF_IFD_POINTER);
        }

        // GPSInfoIFDPointer in the 0th IFD
        if graph.ifd(IfdKind::Gps).is_some() {
            let target = OFFSET_BASE + len_zeroth + len_exif + len_interop;
            if let Some(zeroth) = graph.ifd_mut(IfdKind::Zeroth) {
                changed |= set_or_create_pointer(zeroth, tables::GPS_IFD_POINTER, target);
            }
            if let Some(gps) = graph.ifd_mut(IfdKind::Gps) {
                gps.set_offset(target);
            }
        } else if let Some(zeroth) = graph.ifd_mut(IfdKind::Zeroth) {
            zero_pointer(zeroth, tables::GPS_IFD_POINTER);
        }

        if !changed {
            return;
        }
        tracing::debug!("pointer tag created, reconciling again");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::TagType;

    fn bare_graph(kinds: &[IfdKind]) -> IfdGraph {
        let mut graph = IfdGraph::new();
        for &kind in kinds {
            graph.insert_ifd(kind).unwrap();
        }
        graph
    }

    fn pointer_value(graph: &IfdGraph, kind: IfdKind, id: u16) -> Option<u32> {
        graph.ifd(kind).and_then(|ifd| ifd.tag(id)).and_then(Tag::first_uint)
    }

    #[test]
    fn test_empty_zeroth_length() {
        let mut graph = bare_graph(&[IfdKind::Zeroth]);
        reconcile(&mut graph);
        let zeroth = graph.ifd(IfdKind::Zeroth).unwrap();
        // tag count word + next link only
        assert_eq!(zeroth.length(), 6);
        assert_eq!(zeroth.offset(), 8);
        assert_eq!(zeroth.next_ifd_offset(), 0);
    }

    #[test]
    fn test_out_of_line_value_counted() {
        let mut graph = bare_graph(&[IfdKind::Zeroth]);
        graph
            .insert_tag(
                IfdKind::Zeroth,
                Tag::new(tables::MAKE, TagValue::ascii("ABCDE")).unwrap(),
            )
            .unwrap();
        reconcile(&mut graph);
        // 2 + 12 + 4 + 6 payload bytes
        assert_eq!(graph.ifd(IfdKind::Zeroth).unwrap().length(), 24);
    }

    #[test]
    fn test_missing_pointer_tag_created() {
        let mut graph = bare_graph(&[IfdKind::Zeroth, IfdKind::Exif]);
        reconcile(&mut graph);

        // the created pointer enlarged the 0th IFD to 2 + 12 + 4
        let zeroth = graph.ifd(IfdKind::Zeroth).unwrap();
        assert_eq!(zeroth.length(), 18);
        assert_eq!(
            pointer_value(&graph, IfdKind::Zeroth, tables::EXIF_IFD_POINTER),
            Some(8 + 18)
        );
        assert_eq!(graph.ifd(IfdKind::Exif).unwrap().offset(), 26);
    }

    #[test]
    fn test_pointer_chain_offsets() {
        let mut graph = bare_graph(&[
            IfdKind::Zeroth,
            IfdKind::Exif,
            IfdKind::Interop,
            IfdKind::Gps,
        ]);
        reconcile(&mut graph);

        let len = |kind| graph.ifd(kind).unwrap().length();
        // 0th holds Exif + GPS pointers, Exif holds the Interop pointer
        assert_eq!(len(IfdKind::Zeroth), 6 + 24);
        assert_eq!(len(IfdKind::Exif), 6 + 12);
        assert_eq!(len(IfdKind::Interop), 6);
        assert_eq!(len(IfdKind::Gps), 6);

        let exif_at = 8 + 30;
        let interop_at = exif_at + 18;
        let gps_at = interop_at + 6;
        assert_eq!(
            pointer_value(&graph, IfdKind::Zeroth, tables::EXIF_IFD_POINTER),
            Some(exif_at)
        );
        assert_eq!(
            pointer_value(&graph, IfdKind::Exif, tables::INTEROP_IFD_POINTER),
            Some(interop_at)
        );
        assert_eq!(
            pointer_value(&graph, IfdKind::Zeroth, tables::GPS_IFD_POINTER),
            Some(gps_at)
        );
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut graph = bare_graph(&[IfdKind::Zeroth, IfdKind::Exif, IfdKind::Gps]);
        graph
            .insert_tag(
                IfdKind::Exif,
                Tag::new(0x9000, TagValue::Undefined(b"0230".to_vec())).unwrap(),
            )
            .unwrap();
        graph.set_thumbnail(&[0xFF, 0xD8, 0xFF, 0xD9]).unwrap();

        reconcile(&mut graph);
        let snapshot: Vec<(u32, u32)> = graph.ifds().map(|i| (i.offset(), i.length())).collect();
        reconcile(&mut graph);
        let again: Vec<(u32, u32)> = graph.ifds().map(|i| (i.offset(), i.length())).collect();
        assert_eq!(snapshot, again);
    }

    #[test]
    fn test_dangling_pointer_zeroed() {
        let mut graph = bare_graph(&[IfdKind::Zeroth]);
        graph
            .insert_tag(
                IfdKind::Zeroth,
                Tag::new(tables::GPS_IFD_POINTER, TagValue::Long(vec![0x1234])).unwrap(),
            )
            .unwrap();
        reconcile(&mut graph);
        assert_eq!(
            pointer_value(&graph, IfdKind::Zeroth, tables::GPS_IFD_POINTER),
            Some(0)
        );
    }

    #[test]
    fn test_error_tags_disposed() {
        let mut graph = bare_graph(&[IfdKind::Zeroth]);
        graph
            .ifd_mut(IfdKind::Zeroth)
            .unwrap()
            .push_parsed(Tag::damaged(0x011A, TagType::Rational, 5000));
        reconcile(&mut graph);
        let zeroth = graph.ifd(IfdKind::Zeroth).unwrap();
        assert!(zeroth.is_empty());
        assert_eq!(zeroth.length(), 6);
    }

    #[test]
    fn test_thumbnail_offset_points_at_tail() {
        let mut graph = bare_graph(&[IfdKind::Zeroth]);
        let thumb = vec![0xAB; 10];
        graph.set_thumbnail(&thumb).unwrap();
        reconcile(&mut graph);

        let first = graph.ifd(IfdKind::First).unwrap();
        // two LONG tags inline: 2 + 24 + 4 + 10 thumbnail bytes
        assert_eq!(first.length(), 40);
        let expected = first.offset() + first.length() - 10;
        assert_eq!(
            pointer_value(&graph, IfdKind::First, tables::JPEG_INTERCHANGE_FORMAT),
            Some(expected)
        );
        assert_eq!(
            graph.ifd(IfdKind::Zeroth).unwrap().next_ifd_offset(),
            first.offset()
        );
    }
}
