//! Base types for the fixed structure of a TGA file.

use binrw::{BinRead, BinWrite};
use derive_more::Display;

/// Size of the fixed portion of the header in bytes
pub const HEADER_SIZE: u64 = 18;

/// Size of the footer that closes an extended file
pub const FOOTER_SIZE: u64 = 26;

/// Signature stored in the last 18 bytes of an extended file
pub const SIGNATURE: &[u8; 18] = b"TRUEVISION-XFILE.\0";

/// Identifies how the pixel data of the image is stored
///
/// Unknown codes are kept in [`ImageType::Other`] so a file can be rewritten without
/// losing them.
#[derive(Debug, Display, Copy, Clone, Default, PartialEq, Eq)]
pub enum ImageType {
    /// No image data is present
    #[default]
    #[display("no image data")]
    NoImage,

    /// Uncompressed, color-mapped image
    #[display("uncompressed color-mapped")]
    ColorMapped,

    /// Uncompressed, true-color image
    #[display("uncompressed true-color")]
    TrueColor,

    /// Uncompressed, black and white image
    #[display("uncompressed black and white")]
    BlackAndWhite,

    /// Run-length encoded, color-mapped image
    #[display("run-length encoded color-mapped")]
    RleColorMapped,

    /// Run-length encoded, true-color image
    #[display("run-length encoded true-color")]
    RleTrueColor,

    /// Run-length encoded, black and white image
    #[display("run-length encoded black and white")]
    RleBlackAndWhite,

    /// Any code not defined by the format
    #[display("{_0}")]
    Other(u8),
}

impl From<u8> for ImageType {
    fn from(value: u8) -> Self {
        match value {
            0 => ImageType::NoImage,
            1 => ImageType::ColorMapped,
            2 => ImageType::TrueColor,
            3 => ImageType::BlackAndWhite,
            9 => ImageType::RleColorMapped,
            10 => ImageType::RleTrueColor,
            11 => ImageType::RleBlackAndWhite,
            other => ImageType::Other(other),
        }
    }
}

impl From<ImageType> for u8 {
    fn from(value: ImageType) -> Self {
        match value {
            ImageType::NoImage => 0,
            ImageType::ColorMapped => 1,
            ImageType::TrueColor => 2,
            ImageType::BlackAndWhite => 3,
            ImageType::RleColorMapped => 9,
            ImageType::RleTrueColor => 10,
            ImageType::RleBlackAndWhite => 11,
            ImageType::Other(other) => other,
        }
    }
}

impl ImageType {
    /// Image types 1, 2 and 3
    pub fn is_uncompressed(self) -> bool {
        matches!(
            self,
            ImageType::ColorMapped | ImageType::TrueColor | ImageType::BlackAndWhite
        )
    }

    /// Image types 9, 10 and 11
    pub fn is_compressed(self) -> bool {
        matches!(
            self,
            ImageType::RleColorMapped | ImageType::RleTrueColor | ImageType::RleBlackAndWhite
        )
    }

    /// The run-length encoded counterpart of an uncompressed type
    pub fn packed(self) -> Option<ImageType> {
        match self {
            ImageType::ColorMapped => Some(ImageType::RleColorMapped),
            ImageType::TrueColor => Some(ImageType::RleTrueColor),
            ImageType::BlackAndWhite => Some(ImageType::RleBlackAndWhite),
            _ => None,
        }
    }

    /// The uncompressed counterpart of a run-length encoded type
    pub fn unpacked(self) -> Option<ImageType> {
        match self {
            ImageType::RleColorMapped => Some(ImageType::ColorMapped),
            ImageType::RleTrueColor => Some(ImageType::TrueColor),
            ImageType::RleBlackAndWhite => Some(ImageType::BlackAndWhite),
            _ => None,
        }
    }
}

/// Screen corner holding the first pixel of the image data
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq)]
pub enum Origin {
    #[display("bottom left")]
    BottomLeft,
    #[display("bottom right")]
    BottomRight,
    #[display("top left")]
    TopLeft,
    #[display("top right")]
    TopRight,
}

const INTERLEAVE_NAMES: [&str; 2] = [
    "two way (even-odd) interleave",
    "four way interleave",
];

/// Obsolete row interleaving stored in the top two bits of the descriptor
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Interleave {
    None,
    TwoWay,
    FourWay,
    Reserved,
}

impl Interleave {
    /// Name of one of the two legacy interleave modes
    pub fn name(self) -> Option<&'static str> {
        match self.raw() {
            raw @ 1..=2 => Some(INTERLEAVE_NAMES[raw as usize - 1]),
            _ => None,
        }
    }

    fn raw(self) -> u8 {
        match self {
            Interleave::None => 0,
            Interleave::TwoWay => 1,
            Interleave::FourWay => 2,
            Interleave::Reserved => 3,
        }
    }
}

/// Image descriptor byte
///
/// | Bits | Meaning                          |
/// |------|----------------------------------|
/// | 0-3  | attribute (alpha) bits per pixel |
/// | 4-5  | screen origin of the first pixel |
/// | 6-7  | obsolete interleave flag         |
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct ImageDescriptor(pub u8);

impl ImageDescriptor {
    /// Number of attribute bits associated with each pixel
    pub fn alpha_bits(self) -> u8 {
        self.0 & 0x0f
    }

    /// Location of the first pixel
    pub fn origin(self) -> Origin {
        match (self.0 >> 4) & 0x03 {
            0 => Origin::BottomLeft,
            1 => Origin::BottomRight,
            2 => Origin::TopLeft,
            _ => Origin::TopRight,
        }
    }

    /// Interleave flag
    pub fn interleave(self) -> Interleave {
        match self.0 >> 6 {
            0 => Interleave::None,
            1 => Interleave::TwoWay,
            2 => Interleave::FourWay,
            _ => Interleave::Reserved,
        }
    }

    /// Replace the attribute bit count, keeping the other fields
    pub fn with_alpha_bits(self, bits: u8) -> Self {
        Self((self.0 & 0xf0) | (bits & 0x0f))
    }
}

/// Color map specification
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct ColorMapSpec {
    /// Index of the first color map entry
    pub origin: u16,

    /// Number of color map entries
    pub length: u16,

    /// Number of bits in each color map entry
    pub entry_size: u8,
}

impl ColorMapSpec {
    /// Number of bytes occupied by the color map data
    pub fn byte_len(&self) -> u64 {
        (self.entry_size as u64).div_ceil(8) * self.length as u64
    }
}

/// Image specification
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct ImageSpec {
    /// Horizontal screen position of the lower left corner
    pub x_origin: u16,

    /// Vertical screen position of the lower left corner
    pub y_origin: u16,

    /// Width of the image in pixels
    pub width: u16,

    /// Height of the image in pixels
    pub height: u16,

    /// Number of bits per pixel
    pub pixel_depth: u8,

    /// Attribute bits, origin and interleave
    pub descriptor: ImageDescriptor,
}

impl ImageSpec {
    /// Pixel depth rounded up to whole bytes
    pub fn bytes_per_pixel(&self) -> usize {
        (self.pixel_depth as usize).div_ceil(8)
    }

    /// Number of bytes in one uncompressed row
    pub fn row_len(&self) -> usize {
        self.bytes_per_pixel() * self.width as usize
    }

    /// Number of bytes in the uncompressed image
    pub fn byte_len(&self) -> u64 {
        self.row_len() as u64 * self.height as u64
    }
}

/// TGA file header
///
/// The fixed 18 bytes at the start of every file. The image id whose length is given by
/// [`ImageHeader::id_length`] follows immediately and is kept in [`crate::TgaFile::image_id`].
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct ImageHeader {
    /// Number of bytes in the image id
    pub id_length: u8,

    /// Whether a color map is included
    pub color_map_type: u8,

    /// How the image data is stored
    #[br(map = |raw: u8| ImageType::from(raw))]
    #[bw(map = |image_type: &ImageType| u8::from(*image_type))]
    pub image_type: ImageType,

    /// Color map layout
    pub color_map: ColorMapSpec,

    /// Image dimensions and pixel format
    pub image: ImageSpec,
}

impl ImageHeader {
    /// Offset of the first byte of the color map data
    pub fn color_map_offset(&self) -> u64 {
        HEADER_SIZE + self.id_length as u64
    }

    /// Offset of the first byte of the image data
    pub fn image_data_offset(&self) -> u64 {
        self.color_map_offset() + self.color_map.byte_len()
    }

    /// File size implied by the header for an uncompressed image without extension data
    pub fn expected_file_size(&self) -> u64 {
        self.image_data_offset() + self.image.byte_len()
    }
}

/// Trailing 26 bytes of a file
///
/// Only meaningful when [`Footer::is_extended`] holds; legacy files end in image data.
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct Footer {
    /// Offset of the extension area, 0 when absent
    pub ext_area_offset: u32,

    /// Offset of the developer directory, 0 when absent
    pub dev_dir_offset: u32,

    /// `"TRUEVISION-XFILE.\0"` in an extended file
    pub signature: [u8; 18],
}

impl Footer {
    /// Footer for an extended file pointing at the given structures
    pub fn new(ext_area_offset: u32, dev_dir_offset: u32) -> Self {
        Self {
            ext_area_offset,
            dev_dir_offset,
            signature: *SIGNATURE,
        }
    }

    /// Whether the signature exactly matches the 2.0 format
    pub fn is_extended(&self) -> bool {
        &self.signature == SIGNATURE
    }
}
