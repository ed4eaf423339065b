//! exif-splice - JPEG Exif segment reading, editing and rewriting
//!
//! Parses the APP1/Exif segment of a JPEG file into an in-memory graph of
//! TIFF IFDs, lets tags and the embedded thumbnail be queried and edited,
//! and splices a re-encoded segment back into a new file while leaving
//! every other byte of the image untouched.
//!
//! # Example
//! ```no_run
//! use exif_splice::{update_exif_segment, IfdGraph, IfdKind, Tag, TagValue};
//!
//! # fn main() -> exif_splice::Result<()> {
//! let mut graph = IfdGraph::from_file("photo.jpg")?.unwrap_or_default();
//! if graph.is_empty() {
//!     graph.insert_ifd(IfdKind::Zeroth)?;
//! }
//! graph.remove_tag(IfdKind::Zeroth, exif_splice::tables::SOFTWARE);
//! graph.insert_tag(
//!     IfdKind::Zeroth,
//!     Tag::new(exif_splice::tables::SOFTWARE, TagValue::ascii("exif-splice"))?,
//! )?;
//! update_exif_segment("photo.jpg", "photo-out.jpg", &mut graph)?;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod error;
pub mod tables;

pub use crate::core::editor::{remove_adobe_metadata, remove_exif_segment, update_exif_segment};
pub use crate::core::endian::Endian;
pub use crate::core::graph::IfdGraph;
pub use crate::core::ifd::{IfdKind, IfdTable};
pub use crate::core::jpeg::{scan_segments, ScanReport, ADOBE_XAP_ID, EXIF_ID};
pub use crate::core::tag::Tag;
pub use crate::core::value::{TagType, TagValue};
pub use crate::error::{Error, Result};
