//! This library handles reading from and creating **Truevision TGA** image files.
//!
//! # TGA File Format Documentation
//!
//! TGA is a raster container with no leading magic number. The original format is a fixed
//! header followed by the image id, the color map and the pixel data. Version 2.0 adds
//! optional structures placed after the image data, all located through offsets stored
//! in a 26 byte footer. Files are typically identified with the `.tga`, `.vst`, `.icb`,
//! `.vda` or `.win` extensions.
//!
//! ## File Structure
//!
//! | Offset (bytes)       | Field                  | Description                                           |
//! |----------------------|------------------------|-------------------------------------------------------|
//! | 0x0000               | Header                 | 18 bytes: image layout, see below                     |
//! | 0x0012               | Image ID               | `id_length` bytes of free form identification         |
//! | after the ID         | Color Map              | `ceil(entry_size / 8) * length` bytes                 |
//! | after the color map  | Image Data             | Raw pixels, or run-length encoded packets             |
//! | anywhere after       | Developer Fields       | Opaque blocks listed in the developer directory       |
//! | anywhere after       | Scan Line Table        | `height` 4-byte offsets, one per row of image data    |
//! | anywhere after       | Postage Stamp          | Width, height, then an uncompressed thumbnail         |
//! | anywhere after       | Color Correction Table | 1024 2-byte values, 256 entries of A, R, G, B         |
//! | anywhere after       | Extension Area         | 495 bytes of metadata, see [`extension`]              |
//! | anywhere after       | Developer Directory    | 2-byte count, then 10 bytes per entry                 |
//! | length - 26          | Footer                 | 26 bytes: offsets and the 2.0 signature               |
//!
//! ### Header
//!
//! | Offset (bytes) | Field                  | Description                                             |
//! |----------------|------------------------|---------------------------------------------------------|
//! | 0x0000         | ID Length              | 1 byte: number of bytes in the image id                 |
//! | 0x0001         | Color Map Type         | 1 byte: 1 when a color map is included                  |
//! | 0x0002         | Image Type             | 1 byte: storage of the image data, see below            |
//! | 0x0003         | Color Map Origin       | 2 bytes: index of the first color map entry             |
//! | 0x0005         | Color Map Length       | 2 bytes: number of color map entries                    |
//! | 0x0007         | Color Map Entry Size   | 1 byte: bits per color map entry                        |
//! | 0x0008         | X Origin               | 2 bytes: horizontal screen position                     |
//! | 0x000A         | Y Origin               | 2 bytes: vertical screen position                       |
//! | 0x000C         | Width                  | 2 bytes: width in pixels                                |
//! | 0x000E         | Height                 | 2 bytes: height in pixels                               |
//! | 0x0010         | Pixel Depth            | 1 byte: bits per pixel                                  |
//! | 0x0011         | Image Descriptor       | 1 byte: alpha bits, origin and interleave               |
//!
//! - **Image Type**: one of
//!   - `0`: no image data
//!   - `1`: uncompressed, color-mapped
//!   - `2`: uncompressed, true-color
//!   - `3`: uncompressed, black and white
//!   - `9`: run-length encoded, color-mapped
//!   - `10`: run-length encoded, true-color
//!   - `11`: run-length encoded, black and white
//! - **Image Descriptor**: bits 0-3 give the number of attribute bits per pixel, bits 4-5
//!   the corner of the first pixel, bits 6-7 an obsolete interleave flag.
//!
//! ### Image Data
//!
//! Pixels take `ceil(pixel_depth / 8)` bytes each. Run-length encoded data is a sequence
//! of packets described in [`rle`]; a packet may continue from one row into the next.
//!
//! ### Footer
//!
//! | Offset (bytes) | Field                  | Description                                             |
//! |----------------|------------------------|---------------------------------------------------------|
//! | 0x0000         | Extension Area Offset  | 4 bytes: 0 when there is no extension area              |
//! | 0x0004         | Developer Dir. Offset  | 4 bytes: 0 when there is no developer directory         |
//! | 0x0008         | Signature              | 18 bytes: `"TRUEVISION-XFILE."` and a NUL               |
//!
//! A file is only treated as version 2.0 when the signature matches exactly. Otherwise
//! the last 26 bytes are image data and both offsets are ignored.
//!
//! ## Additional Information
//!
//! - **Endianness**: Little-endian for all multi-byte integers
//! - **Offsets**: 4 bytes, from the start of the file
//!

pub mod error;
pub mod extension;
pub mod file;
pub mod read;
pub mod rle;
pub mod stamp;
pub mod tables;
pub mod types;
pub mod write;

pub use file::TgaFile;
pub use read::{decode, TgaReader};
pub use types::{ImageHeader, ImageType};
pub use write::{encode, ImageDataMode, TgaWriter, TgaWriterOptions};
