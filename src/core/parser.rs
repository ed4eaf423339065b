//! IFD decoding from the TIFF block of an APP1 segment
//!
//! Offsets inside the block are relative to the TIFF header, which is byte
//! 0 of the parser's slice. A tag whose payload cannot be decoded is kept
//! with its error flag set so the surrounding tags still come through; the
//! whole IFD only fails when its entry table itself is unreadable.

use crate::core::endian::Endian;
use crate::core::ifd::{IfdKind, IfdTable};
use crate::core::tag::Tag;
use crate::core::value::{TagType, TagValue};
use crate::error::{Error, Result};
use crate::tables;

/// Size of one IFD entry on disk
const ENTRY_LEN: usize = 12;

pub struct IfdParser<'a> {
    data: &'a [u8],
    endian: Endian,
    /// Declared wire length of the enclosing APP1 segment. A payload claim
    /// at or past it cannot be honest and marks the tag as damaged.
    segment_len: u32,
}

impl<'a> IfdParser<'a> {
    pub fn new(data: &'a [u8], endian: Endian, segment_len: u16) -> Self {
        IfdParser {
            data,
            endian,
            segment_len: segment_len as u32,
        }
    }

    /// Decode the IFD at `start`. Damaged tags are retained; only an
    /// unreadable entry table fails the IFD as a whole.
    pub fn parse_ifd(&self, start: u32, kind: IfdKind) -> Result<IfdTable> {
        let start = start as usize;
        let tag_count = self
            .read_u16_at(start)
            .ok_or_else(|| self.invalid(kind, "tag count out of bounds"))? as usize;

        let mut ifd = IfdTable::new(kind);
        tracing::debug!("parsing {} IFD at offset {start:#x}, {tag_count} tags", kind.label());

        // the 0th IFD's link to the 1st sits right after the entry array
        if kind == IfdKind::Zeroth {
            let link_at = start + 2 + ENTRY_LEN * tag_count;
            let next = self
                .read_u32_at(link_at)
                .ok_or_else(|| self.invalid(kind, "next-IFD offset out of bounds"))?;
            ifd.set_next_ifd_offset(next);
        }

        for index in 0..tag_count {
            let entry = self
                .slice(start + 2 + index * ENTRY_LEN, ENTRY_LEN)
                .ok_or_else(|| self.invalid(kind, "entry out of bounds"))?;
            let id = self.endian.read_u16(&entry[0..2]);
            let raw_type = self.endian.read_u16(&entry[2..4]);
            let count = self.endian.read_u32(&entry[4..8]);
            // keep the raw slot bytes: short inline values are left-justified
            // in data endianness and must be re-read from them
            let raw: [u8; 4] = entry[8..12].try_into().unwrap_or_default();
            let value_or_offset = self.endian.read_u32(&raw);

            let Ok(tag_type) = TagType::from_u16(raw_type) else {
                tracing::debug!("skipping tag {id:#06x} with unknown value type {raw_type}");
                continue;
            };
            tracing::trace!(
                "tag {id:#06x} type={raw_type} count={count} value/offset={value_or_offset:#x}"
            );
            ifd.push_parsed(self.decode_tag(id, tag_type, count, raw, value_or_offset));
        }

        if kind == IfdKind::First {
            self.load_thumbnail(&mut ifd);
        }
        Ok(ifd)
    }

    fn decode_tag(
        &self,
        id: u16,
        tag_type: TagType,
        count: u32,
        raw: [u8; 4],
        value_or_offset: u32,
    ) -> Tag {
        let payload = tag_type.payload_size(count);
        if payload >= self.segment_len as u64 {
            tracing::debug!(
                "tag {id:#06x} claims {payload} payload bytes against a {} byte segment",
                self.segment_len
            );
            return Tag::damaged(id, tag_type, count);
        }

        let value = match tag_type {
            TagType::Ascii | TagType::Undefined => {
                let bytes = if payload <= 4 {
                    Some(raw[..count as usize].to_vec())
                } else {
                    self.copy_out_of_line(value_or_offset, payload as usize)
                };
                bytes.map(|data| match tag_type {
                    TagType::Ascii => TagValue::Ascii(data),
                    _ => TagValue::Undefined(data),
                })
            }
            // a zero-count rational has no bytes to fetch; the offset slot
            // holds nothing meaningful then and must not be dereferenced
            TagType::Rational | TagType::SRational if payload == 0 => {
                Some(self.decode_rationals(tag_type, count, &[]))
            }
            TagType::Rational | TagType::SRational => self
                .slice(value_or_offset as usize, payload as usize)
                .map(|bytes| self.decode_rationals(tag_type, count, bytes)),
            _ => self.decode_integers(tag_type, count, raw, value_or_offset, payload),
        };

        match value {
            Some(value) => Tag::with_value(id, value),
            None => Tag::damaged(id, tag_type, count),
        }
    }

    /// Integer payloads: inline values decode from the preserved raw slot
    /// bytes, everything else from the out-of-line area.
    fn decode_integers(
        &self,
        tag_type: TagType,
        count: u32,
        raw: [u8; 4],
        value_or_offset: u32,
        payload: u64,
    ) -> Option<TagValue> {
        let bytes: &[u8] = if payload <= 4 {
            &raw
        } else {
            self.slice(value_or_offset as usize, payload as usize)?
        };
        let count = count as usize;
        let value = match tag_type {
            TagType::Byte => TagValue::Byte(bytes[..count].to_vec()),
            TagType::SByte => {
                TagValue::SByte(bytes[..count].iter().map(|&b| b as i8).collect())
            }
            TagType::Short => TagValue::Short(
                (0..count)
                    .map(|i| self.endian.read_u16(&bytes[i * 2..i * 2 + 2]))
                    .collect(),
            ),
            TagType::SShort => TagValue::SShort(
                (0..count)
                    .map(|i| self.endian.read_i16(&bytes[i * 2..i * 2 + 2]))
                    .collect(),
            ),
            TagType::Long => TagValue::Long(
                (0..count)
                    .map(|i| self.endian.read_u32(&bytes[i * 4..i * 4 + 4]))
                    .collect(),
            ),
            TagType::SLong => TagValue::SLong(
                (0..count)
                    .map(|i| self.endian.read_i32(&bytes[i * 4..i * 4 + 4]))
                    .collect(),
            ),
            _ => return None,
        };
        Some(value)
    }

    fn decode_rationals(&self, tag_type: TagType, count: u32, bytes: &[u8]) -> TagValue {
        if tag_type == TagType::Rational {
            TagValue::Rational(
                (0..count as usize)
                    .map(|i| {
                        (
                            self.endian.read_u32(&bytes[i * 8..i * 8 + 4]),
                            self.endian.read_u32(&bytes[i * 8 + 4..i * 8 + 8]),
                        )
                    })
                    .collect(),
            )
        } else {
            TagValue::SRational(
                (0..count as usize)
                    .map(|i| {
                        (
                            self.endian.read_i32(&bytes[i * 8..i * 8 + 4]),
                            self.endian.read_i32(&bytes[i * 8 + 4..i * 8 + 8]),
                        )
                    })
                    .collect(),
            )
        }
    }

    /// Out-of-line byte copy through a fallible reserve so an oversized
    /// claim degrades to an error tag instead of aborting
    fn copy_out_of_line(&self, offset: u32, len: usize) -> Option<Vec<u8>> {
        let bytes = self.slice(offset as usize, len)?;
        let mut out = Vec::new();
        out.try_reserve_exact(len).ok()?;
        out.extend_from_slice(bytes);
        Some(out)
    }

    /// Load the 1st IFD's thumbnail from JPEGInterchangeFormat/-Length.
    /// A bad offset or length drops the thumbnail silently.
    fn load_thumbnail(&self, ifd: &mut IfdTable) {
        let offset = ifd
            .tag(tables::JPEG_INTERCHANGE_FORMAT)
            .and_then(Tag::first_uint)
            .unwrap_or(0);
        if offset == 0 {
            return;
        }
        let Some(length) = ifd
            .tag(tables::JPEG_INTERCHANGE_FORMAT_LENGTH)
            .and_then(Tag::first_uint)
            .filter(|&len| len > 0)
        else {
            return;
        };
        match self.copy_out_of_line(offset, length as usize) {
            Some(bytes) => ifd.set_thumbnail_buffer(Some(bytes)),
            None => tracing::debug!("thumbnail claims {length} bytes at {offset:#x}, dropped"),
        }
    }

    fn invalid(&self, kind: IfdKind, what: &str) -> Error {
        Error::InvalidIfd(format!("{} IFD: {what}", kind.label()))
    }

    fn read_u16_at(&self, offset: usize) -> Option<u16> {
        self.slice(offset, 2).map(|b| self.endian.read_u16(b))
    }

    fn read_u32_at(&self, offset: usize) -> Option<u32> {
        self.slice(offset, 4).map(|b| self.endian.read_u32(b))
    }

    fn slice(&self, offset: usize, len: usize) -> Option<&'a [u8]> {
        let end = offset.checked_add(len)?;
        self.data.get(offset..end)
    }
}
