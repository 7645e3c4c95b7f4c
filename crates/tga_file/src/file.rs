//! The decoded structure of a TGA file
//!

use crate::error::{Error, Result};
use crate::extension::ExtensionArea;
use crate::tables::{ColorCorrectionTable, DeveloperDirectory, PostageStamp, ScanLineTable};
use crate::types::ImageHeader;

/// Everything in a TGA file except the color map and image data
///
/// Produced by [`crate::TgaReader`], may be edited, and is written back out by
/// [`crate::TgaWriter`]. The variable length tables are owned here and dropped with it,
/// or earlier through [`TgaFile::release`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TgaFile {
    pub header: ImageHeader,

    /// Image id, `header.id_length` bytes
    pub image_id: Vec<u8>,

    /// Whether the footer carried the 2.0 signature
    pub extended: bool,

    /// Extension area offset from the footer, 0 for legacy files
    pub ext_area_offset: u32,

    /// Developer directory offset from the footer, 0 for legacy files
    pub dev_dir_offset: u32,

    pub extension: Option<ExtensionArea>,

    pub developer_directory: DeveloperDirectory,

    pub color_correction: Option<ColorCorrectionTable>,

    pub scan_lines: Option<ScanLineTable>,

    pub postage_stamp: Option<PostageStamp>,
}

impl TgaFile {
    /// Drop every variable length table
    ///
    /// Safe to call any number of times, and on a partially populated structure.
    pub fn release(&mut self) {
        self.developer_directory = DeveloperDirectory::default();
        self.color_correction = None;
        self.scan_lines = None;
        self.postage_stamp = None;
    }

    /// Image id up to the first NUL, as text
    pub fn image_id_text(&self) -> String {
        let end = self
            .image_id
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.image_id.len());
        String::from_utf8_lossy(&self.image_id[..end]).into_owned()
    }
}

/// Compare the size implied by the header with the actual file size
///
/// Only uncompressed images in legacy files can be checked, everything else passes.
pub fn validate_file_size(header: &ImageHeader, extended: bool, actual: u64) -> Result<()> {
    if extended || !header.image_type.is_uncompressed() {
        return Ok(());
    }

    let expected = header.expected_file_size();
    if expected != actual {
        return Err(Error::BadFileSize { expected, actual });
    }

    Ok(())
}
