//! Error types for exif-splice
//!
//! One variant per status in the public taxonomy; I/O failures are
//! classified as read- or write-side at the call site.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read input file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to write output file: {0}")]
    WriteFile(#[source] std::io::Error),

    #[error("invalid JPEG stream: {0}")]
    InvalidJpeg(String),

    #[error("invalid APP1 segment header: {0}")]
    InvalidApp1Header(String),

    #[error("invalid IFD: {0}")]
    InvalidIfd(String),

    #[error("invalid argument")]
    InvalidPointer,

    #[error("invalid tag type: {0}")]
    InvalidType(u16),

    #[error("invalid tag count: {0}")]
    InvalidCount(u32),

    #[error("memory allocation failed")]
    MemAlloc,

    #[error("target does not exist")]
    NotExist,

    #[error("target already exists")]
    AlreadyExist,

    #[error("internal error")]
    Unknown,
}
