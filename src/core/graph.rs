//! The five-IFD graph: construction from a file, lookups and edits
//!
//! The graph owns at most one IFD per kind. Children are only reachable the
//! way the wire format links them: Exif and GPS through pointer tags in the
//! 0th IFD, Interoperability through a pointer tag in the Exif IFD, and the
//! 1st IFD through the 0th IFD's next-IFD offset.

use crate::core::app1::{App1Header, TIFF_HEADER_START};
use crate::core::ifd::{IfdKind, IfdTable};
use crate::core::jpeg;
use crate::core::parser::IfdParser;
use crate::core::tag::Tag;
use crate::core::value::TagValue;
use crate::error::{Error, Result};
use crate::tables;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

#[derive(Debug, Default)]
pub struct IfdGraph {
    zeroth: Option<IfdTable>,
    exif: Option<IfdTable>,
    interop: Option<IfdTable>,
    gps: Option<IfdTable>,
    first: Option<IfdTable>,
    partial: bool,
}

impl IfdGraph {
    pub fn new() -> Self {
        IfdGraph::default()
    }

    /// Parse the Exif segment of a JPEG file. `Ok(None)` when the file has
    /// no Exif APP1 segment at all.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let file = File::open(path).map_err(Error::ReadFile)?;
        Self::from_reader(&mut BufReader::new(file))
    }

    /// Parse the Exif segment out of any seekable JPEG stream
    pub fn from_reader<R: Read + Seek>(reader: &mut R) -> Result<Option<Self>> {
        let scan = jpeg::scan_segments(reader, jpeg::EXIF_ID)?;
        let Some(app1_offset) = scan.app1_offset else {
            return Ok(None);
        };
        let header = App1Header::read_at(reader, app1_offset)?;

        // the segment length covers itself, the id and the TIFF block
        let tiff_len = (header.length as u64).saturating_sub(8);
        reader
            .seek(SeekFrom::Start(app1_offset + TIFF_HEADER_START))
            .map_err(Error::ReadFile)?;
        let mut tiff = Vec::new();
        reader
            .by_ref()
            .take(tiff_len)
            .read_to_end(&mut tiff)
            .map_err(Error::ReadFile)?;

        tracing::debug!(
            "Exif segment at {app1_offset:#x}, {:?} data, {tiff_len} TIFF bytes",
            header.tiff.endian
        );
        let parser = IfdParser::new(&tiff, header.tiff.endian, header.length);
        let mut graph = IfdGraph::new();

        // a broken 0th IFD is not continuable
        let zeroth = parser.parse_ifd(header.tiff.ifd0_offset, IfdKind::Zeroth)?;
        let exif_at = zeroth.tag(tables::EXIF_IFD_POINTER).and_then(Tag::first_uint);
        let gps_at = zeroth.tag(tables::GPS_IFD_POINTER).and_then(Tag::first_uint);
        let first_at = zeroth.next_ifd_offset();
        graph.zeroth = Some(zeroth);

        if let Some(offset) = exif_at.filter(|&o| o != 0) {
            match parser.parse_ifd(offset, IfdKind::Exif) {
                Ok(exif) => {
                    let interop_at = exif
                        .tag(tables::INTEROP_IFD_POINTER)
                        .and_then(Tag::first_uint);
                    graph.exif = Some(exif);
                    if let Some(offset) = interop_at.filter(|&o| o != 0) {
                        graph.adopt(parser.parse_ifd(offset, IfdKind::Interop));
                    }
                }
                Err(err) => graph.tolerate(IfdKind::Exif, err),
            }
        }
        if let Some(offset) = gps_at.filter(|&o| o != 0) {
            graph.adopt(parser.parse_ifd(offset, IfdKind::Gps));
        }
        if first_at != 0 {
            graph.adopt(parser.parse_ifd(first_at, IfdKind::First));
        }
        Ok(Some(graph))
    }

    /// File a parsed child IFD, or tolerate its failure
    fn adopt(&mut self, parsed: Result<IfdTable>) {
        match parsed {
            Ok(ifd) => {
                let kind = ifd.kind();
                *self.slot_mut(kind) = Some(ifd);
            }
            Err(err) => {
                tracing::warn!("{err}; keeping the IFDs parsed so far");
                self.partial = true;
            }
        }
    }

    fn tolerate(&mut self, kind: IfdKind, err: Error) {
        tracing::warn!("{} IFD unusable: {err}; keeping the IFDs parsed so far", kind.label());
        self.partial = true;
    }

    /// True when a child IFD failed to parse and was left out
    pub fn is_partial(&self) -> bool {
        self.partial
    }

    pub fn ifd(&self, kind: IfdKind) -> Option<&IfdTable> {
        match kind {
            IfdKind::Zeroth => self.zeroth.as_ref(),
            IfdKind::First => self.first.as_ref(),
            IfdKind::Exif => self.exif.as_ref(),
            IfdKind::Gps => self.gps.as_ref(),
            IfdKind::Interop => self.interop.as_ref(),
        }
    }

    pub(crate) fn ifd_mut(&mut self, kind: IfdKind) -> Option<&mut IfdTable> {
        self.slot_mut(kind).as_mut()
    }

    fn slot_mut(&mut self, kind: IfdKind) -> &mut Option<IfdTable> {
        match kind {
            IfdKind::Zeroth => &mut self.zeroth,
            IfdKind::First => &mut self.first,
            IfdKind::Exif => &mut self.exif,
            IfdKind::Gps => &mut self.gps,
            IfdKind::Interop => &mut self.interop,
        }
    }

    /// Present IFDs in layout order
    pub fn ifds(&self) -> impl Iterator<Item = &IfdTable> {
        IfdKind::WRITE_ORDER.iter().filter_map(|&kind| self.ifd(kind))
    }

    pub fn is_empty(&self) -> bool {
        self.ifds().next().is_none()
    }

    /// Create an empty IFD of the given kind
    pub fn insert_ifd(&mut self, kind: IfdKind) -> Result<()> {
        let slot = self.slot_mut(kind);
        if slot.is_some() {
            return Err(Error::AlreadyExist);
        }
        *slot = Some(IfdTable::new(kind));
        Ok(())
    }

    /// Drop the IFD of the given kind (and its thumbnail, for the 1st);
    /// returns how many were removed
    pub fn remove_ifd(&mut self, kind: IfdKind) -> usize {
        self.slot_mut(kind).take().map_or(0, |_| 1)
    }

    /// Deep copy of one tag
    pub fn tag(&self, kind: IfdKind, id: u16) -> Option<Tag> {
        self.ifd(kind).and_then(|ifd| ifd.tag(id)).cloned()
    }

    pub fn has_tag(&self, kind: IfdKind, id: u16) -> bool {
        self.ifd(kind).is_some_and(|ifd| ifd.tag(id).is_some())
    }

    /// Append a tag to an existing IFD
    pub fn insert_tag(&mut self, kind: IfdKind, tag: Tag) -> Result<()> {
        let Some(ifd) = self.ifd_mut(kind) else {
            return Err(Error::NotExist);
        };
        ifd.insert_tag(tag)
    }

    /// Remove all tags with this id from the IFD; returns the count removed
    pub fn remove_tag(&mut self, kind: IfdKind, id: u16) -> usize {
        self.ifd_mut(kind).map_or(0, |ifd| ifd.remove_tag(id))
    }

    /// Copy of the 1st IFD's thumbnail, sized by the
    /// JPEGInterchangeFormatLength tag
    pub fn thumbnail(&self) -> Result<Vec<u8>> {
        let ifd = self.first.as_ref().ok_or(Error::NotExist)?;
        let buf = ifd.thumbnail().ok_or(Error::NotExist)?;
        let length = ifd
            .tag(tables::JPEG_INTERCHANGE_FORMAT_LENGTH)
            .and_then(Tag::first_uint)
            .ok_or(Error::NotExist)?;
        if length == 0 {
            return Err(Error::NotExist);
        }
        let length = (length as usize).min(buf.len());
        let mut out = Vec::new();
        out.try_reserve_exact(length).map_err(|_| Error::MemAlloc)?;
        out.extend_from_slice(&buf[..length]);
        Ok(out)
    }

    /// Replace (or install) the thumbnail, creating the 1st IFD when it is
    /// missing. The length tag is updated to match and the offset tag is
    /// zeroed for the offset fixer to resolve.
    pub fn set_thumbnail(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Err(Error::InvalidPointer);
        }
        let ifd = self
            .first
            .get_or_insert_with(|| IfdTable::new(IfdKind::First));

        let length = data.len() as u32;
        match ifd.tag_mut(tables::JPEG_INTERCHANGE_FORMAT_LENGTH) {
            Some(tag) => {
                tag.set_single_uint(length);
            }
            None => ifd.insert_tag(Tag::with_value(
                tables::JPEG_INTERCHANGE_FORMAT_LENGTH,
                TagValue::Long(vec![length]),
            ))?,
        }
        match ifd.tag_mut(tables::JPEG_INTERCHANGE_FORMAT) {
            Some(tag) => {
                tag.set_single_uint(0);
            }
            None => ifd.insert_tag(Tag::with_value(
                tables::JPEG_INTERCHANGE_FORMAT,
                TagValue::Long(vec![0]),
            ))?,
        }

        let mut buf = Vec::new();
        buf.try_reserve_exact(data.len()).map_err(|_| Error::MemAlloc)?;
        buf.extend_from_slice(data);
        ifd.set_thumbnail_buffer(Some(buf));
        Ok(())
    }

    /// Text dump of one IFD, `None` when it is absent
    pub fn dump_ifd(&self, kind: IfdKind, verbose: bool) -> Option<String> {
        self.ifd(kind).map(|ifd| ifd.dump(verbose))
    }

    /// Text dump of every present IFD in layout order
    pub fn dump(&self, verbose: bool) -> String {
        self.ifds().map(|ifd| ifd.dump(verbose)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with_zeroth() -> IfdGraph {
        let mut graph = IfdGraph::new();
        graph.insert_ifd(IfdKind::Zeroth).unwrap();
        graph
    }

    #[test]
    fn test_insert_ifd_twice_fails() {
        let mut graph = graph_with_zeroth();
        assert!(matches!(
            graph.insert_ifd(IfdKind::Zeroth),
            Err(Error::AlreadyExist)
        ));
    }

    #[test]
    fn test_remove_ifd_counts() {
        let mut graph = graph_with_zeroth();
        assert_eq!(graph.remove_ifd(IfdKind::Zeroth), 1);
        assert_eq!(graph.remove_ifd(IfdKind::Zeroth), 0);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_insert_tag_needs_ifd() {
        let mut graph = IfdGraph::new();
        let tag = Tag::new(tables::MAKE, TagValue::ascii("ABCDE")).unwrap();
        assert!(matches!(
            graph.insert_tag(IfdKind::Zeroth, tag.clone()),
            Err(Error::NotExist)
        ));
        graph.insert_ifd(IfdKind::Zeroth).unwrap();
        graph.insert_tag(IfdKind::Zeroth, tag.clone()).unwrap();
        assert!(matches!(
            graph.insert_tag(IfdKind::Zeroth, tag),
            Err(Error::AlreadyExist)
        ));
    }

    #[test]
    fn test_tag_returns_copy() {
        let mut graph = graph_with_zeroth();
        graph
            .insert_tag(
                IfdKind::Zeroth,
                Tag::new(tables::MAKE, TagValue::ascii("KLab")).unwrap(),
            )
            .unwrap();
        let copy = graph.tag(IfdKind::Zeroth, tables::MAKE).unwrap();
        assert_eq!(copy.value(), &TagValue::ascii("KLab"));
        assert!(graph.has_tag(IfdKind::Zeroth, tables::MAKE));
        assert!(!graph.has_tag(IfdKind::Exif, tables::MAKE));
    }

    #[test]
    fn test_thumbnail_requires_first_ifd() {
        let graph = graph_with_zeroth();
        assert!(matches!(graph.thumbnail(), Err(Error::NotExist)));
    }

    #[test]
    fn test_set_thumbnail_creates_first_ifd() {
        let mut graph = graph_with_zeroth();
        let jpeg = [0xFF, 0xD8, 0xFF, 0xD9];
        graph.set_thumbnail(&jpeg).unwrap();

        let first = graph.ifd(IfdKind::First).unwrap();
        assert_eq!(
            first
                .tag(tables::JPEG_INTERCHANGE_FORMAT_LENGTH)
                .unwrap()
                .first_uint(),
            Some(4)
        );
        assert_eq!(
            first.tag(tables::JPEG_INTERCHANGE_FORMAT).unwrap().first_uint(),
            Some(0)
        );
        assert_eq!(graph.thumbnail().unwrap(), jpeg);
    }

    #[test]
    fn test_set_thumbnail_rejects_empty() {
        let mut graph = graph_with_zeroth();
        assert!(matches!(
            graph.set_thumbnail(&[]),
            Err(Error::InvalidPointer)
        ));
    }

    #[test]
    fn test_set_thumbnail_updates_existing_tags() {
        let mut graph = graph_with_zeroth();
        graph.set_thumbnail(&[1, 2, 3, 4]).unwrap();
        graph.set_thumbnail(&[5, 6]).unwrap();
        let first = graph.ifd(IfdKind::First).unwrap();
        assert_eq!(
            first
                .tag(tables::JPEG_INTERCHANGE_FORMAT_LENGTH)
                .unwrap()
                .first_uint(),
            Some(2)
        );
        assert_eq!(graph.thumbnail().unwrap(), [5, 6]);
    }
}
