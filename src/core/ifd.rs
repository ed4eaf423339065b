//! IFD tables: ordered tag sequences with per-IFD bookkeeping

use crate::core::tag::Tag;
use crate::error::{Error, Result};
use crate::tables;
use indexmap::IndexMap;
use std::fmt::Write as _;

/// The five IFDs an Exif APP1 segment can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IfdKind {
    Zeroth,
    First,
    Exif,
    Gps,
    Interop,
}

impl IfdKind {
    /// The order IFDs are laid out and written in
    pub(crate) const WRITE_ORDER: [IfdKind; 5] = [
        IfdKind::Zeroth,
        IfdKind::Exif,
        IfdKind::Interop,
        IfdKind::Gps,
        IfdKind::First,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            IfdKind::Zeroth => "0TH",
            IfdKind::First => "1ST",
            IfdKind::Exif => "EXIF",
            IfdKind::Gps => "GPS",
            IfdKind::Interop => "Interoperability",
        }
    }
}

/// One Image File Directory: an ordered sequence of uniquely-keyed tags
/// plus the links and placement data the codec maintains around it.
#[derive(Debug, Clone)]
pub struct IfdTable {
    kind: IfdKind,
    tags: IndexMap<u16, Tag>,
    /// Offset of the chained IFD; only ever non-zero on the 0th IFD, where
    /// it points at the 1st IFD
    next_ifd_offset: u32,
    /// Placement within the segment, populated by the offset fixer
    offset: u32,
    length: u32,
    /// Embedded thumbnail JPEG; 1st IFD only
    thumbnail: Option<Vec<u8>>,
}

impl IfdTable {
    pub fn new(kind: IfdKind) -> Self {
        IfdTable {
            kind,
            tags: IndexMap::new(),
            next_ifd_offset: 0,
            offset: 0,
            length: 0,
            thumbnail: None,
        }
    }

    pub fn kind(&self) -> IfdKind {
        self.kind
    }

    pub fn tag(&self, id: u16) -> Option<&Tag> {
        self.tags.get(&id)
    }

    pub(crate) fn tag_mut(&mut self, id: u16) -> Option<&mut Tag> {
        self.tags.get_mut(&id)
    }

    /// Tags in insertion order
    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags.values()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Tags that survive a re-encode
    pub fn live_tag_count(&self) -> u32 {
        self.tags.values().filter(|t| !t.is_error()).count() as u32
    }

    /// Append a parsed tag. The first occurrence of a duplicate id wins.
    pub(crate) fn push_parsed(&mut self, tag: Tag) {
        if self.tags.contains_key(&tag.id()) {
            tracing::debug!(
                "duplicate tag {:#06x} in {} IFD, keeping the first",
                tag.id(),
                self.kind.label()
            );
            return;
        }
        self.tags.insert(tag.id(), tag);
    }

    /// Append an edit-API tag; the id must not be present yet
    pub fn insert_tag(&mut self, tag: Tag) -> Result<()> {
        if self.tags.contains_key(&tag.id()) {
            return Err(Error::AlreadyExist);
        }
        self.tags.insert(tag.id(), tag);
        Ok(())
    }

    /// Remove the tag with this id; returns how many were dropped
    pub fn remove_tag(&mut self, id: u16) -> usize {
        self.tags.shift_remove(&id).map_or(0, |_| 1)
    }

    pub(crate) fn drop_error_tags(&mut self) {
        self.tags.retain(|_, tag| !tag.is_error());
    }

    pub fn next_ifd_offset(&self) -> u32 {
        self.next_ifd_offset
    }

    pub(crate) fn set_next_ifd_offset(&mut self, offset: u32) {
        self.next_ifd_offset = offset;
    }

    /// Offset of this IFD relative to the TIFF header, as last reconciled
    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub(crate) fn set_offset(&mut self, offset: u32) {
        self.offset = offset;
    }

    /// Encoded size of this IFD including out-of-line values, as last
    /// reconciled
    pub fn length(&self) -> u32 {
        self.length
    }

    pub(crate) fn set_length(&mut self, length: u32) {
        self.length = length;
    }

    pub fn thumbnail(&self) -> Option<&[u8]> {
        self.thumbnail.as_deref()
    }

    pub(crate) fn set_thumbnail_buffer(&mut self, data: Option<Vec<u8>>) {
        self.thumbnail = data;
    }

    /// Bytes of thumbnail the writer appends, bounded by both the
    /// JPEGInterchangeFormatLength tag and the owned buffer
    pub(crate) fn thumbnail_write_len(&self) -> u32 {
        let Some(buf) = self.thumbnail.as_deref() else {
            return 0;
        };
        let declared = self
            .tag(tables::JPEG_INTERCHANGE_FORMAT_LENGTH)
            .and_then(Tag::first_uint)
            .unwrap_or(0);
        declared.min(buf.len() as u32)
    }

    /// Render this IFD the way the CLI prints it. The verbose shape adds
    /// entry indices, raw types and counts.
    pub fn dump(&self, verbose: bool) -> String {
        let mut out = String::new();
        let _ = write!(out, "\n{{{} IFD}}", self.kind.label());
        if verbose {
            let _ = writeln!(out, " tags={}", self.tags.len());
        } else {
            out.push('\n');
        }
        for (index, tag) in self.tags.values().enumerate() {
            let name = tables::tag_name(self.kind, tag.id());
            if verbose {
                let _ = writeln!(
                    out,
                    "tag[{index:02}] {:#06X} {}",
                    tag.id(),
                    name.unwrap_or("(unknown)")
                );
                let _ = write!(
                    out,
                    "\ttype={} count={} val=",
                    tag.tag_type() as u16,
                    tag.count()
                );
            } else {
                let _ = write!(out, " - {}: ", name.unwrap_or("(unknown)"));
            }
            if tag.is_error() {
                out.push_str("(error)");
            } else {
                tag.value().dump_into(&mut out, verbose);
            }
            out.push('\n');
        }
        out
    }
}
