//! Error types that can be emitted from this library

use std::io;

use derive_more::Display;
use miette::Diagnostic;
use thiserror::Error;

use crate::types::ImageType;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent warpper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// the fixed 18 byte header could not be read
    #[error("file is too short to hold a tga header")]
    HeaderTruncated,

    /// the image id ended before {expected} bytes were read
    #[error("image id is truncated, expected {expected} bytes")]
    IdTruncated { expected: u8 },

    /// the file is too small to hold the 26 byte footer
    #[error("unable to seek to the footer of a {length} byte file")]
    SeekEnd { length: u64 },

    /// the footer could not be read
    #[error("unable to read the file signature")]
    SignatureRead,

    /// the size implied by the header does not match the file
    #[error("uncompressed file size should be {expected} bytes but is {actual}")]
    BadFileSize { expected: u64, actual: u64 },

    /// the extension area could not be read
    #[error("unable to read the extension area at offset {offset:#010x}")]
    ExtendedArea { offset: u32 },

    /// the developer directory could not be read
    #[error("unable to read the developer directory at offset {offset:#010x}")]
    DeveloperDirectory { offset: u32 },

    /// a developer directory entry points outside the file
    #[error("developer field {tag:#06x} of {size} bytes at offset {offset:#010x} lies outside the file")]
    DeveloperField { tag: u16, offset: u32, size: u32 },

    /// more developer fields than the 16 bit directory count can describe
    #[error("{0} developer fields do not fit in a developer directory")]
    TooManyDeveloperFields(usize),

    /// a table could not be allocated
    #[error("unable to allocate {entries} developer directory entries")]
    OutOfMemory { entries: usize },

    /// the destination accepted fewer bytes than were written
    #[error("short write to output stream")]
    ShortWrite,

    /// run-length data ended in the middle of a packet
    #[error("run-length encoded data is truncated")]
    DecodeTruncated,

    /// a sub-table referenced by the extension area lies outside the file
    #[error("unable to seek to {table} at offset {offset:#010x}")]
    SubTableSeekFailed { table: SubTable, offset: u32 },

    /// a sub-table referenced by the extension area ends past the end of the file
    #[error("{table} at offset {offset:#010x} is truncated")]
    SubTableTruncated { table: SubTable, offset: u32 },

    /// pixels must be between 1 and 4 bytes wide
    #[error("unsupported pixel size of {0} bytes")]
    InvalidBytesPerPixel(usize),

    /// a pixel buffer does not hold a whole number of pixels
    #[error("buffer of {len} bytes does not hold whole {bpp} byte pixels")]
    PixelBufferLength { len: usize, bpp: usize },

    /// a row buffer is not exactly one decoded row long
    #[error("row buffer of {len} bytes should be {expected} bytes")]
    RowBufferLength { len: usize, expected: usize },

    /// the operation does not know how to handle pixel data of this type
    #[error("unsupported image type {0}")]
    UnsupportedImageType(ImageType),

    /// the requested conversion does not apply to the image type
    #[error("image type {0} is inconsistent with the requested operation")]
    InconsistentImageType(ImageType),

    /// a structure would start beyond what a 32 bit offset can address
    #[error("offset {0:#x} does not fit in a tga file")]
    OffsetOverflow(u64),

    /// the length of the image data cannot be derived from the header
    #[error("cannot determine amount of image data")]
    UnknownImageLength,
}

/// Optional tables located through offsets in the extension area
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq)]
pub enum SubTable {
    #[display("color correction table")]
    ColorCorrection,

    #[display("postage stamp")]
    PostageStamp,

    #[display("scan line table")]
    ScanLine,
}

impl Error {
    /// Whether a decode may carry on after reporting this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::BadFileSize { .. }
                | Error::SubTableSeekFailed { .. }
                | Error::SubTableTruncated { .. }
        )
    }

    pub(crate) fn from_write(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::WriteZero => Error::ShortWrite,
            _ => Error::IOError(error),
        }
    }

    pub(crate) fn from_rle_read(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::UnexpectedEof => Error::DecodeTruncated,
            _ => Error::IOError(error),
        }
    }
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
