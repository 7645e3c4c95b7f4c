//! Types for writing TGA files
//!

use std::io::{self, Read, Seek, Write};

use binrw::io::NoSeek;
use binrw::{BinWrite, Endian};
use bon::Builder;
use byteorder::{LittleEndian, WriteBytesExt};
use tracing::{debug, instrument, warn};

use crate::error::{Error, Result};
use crate::file::TgaFile;
use crate::read::TgaReader;
use crate::rle::encode_row_into;
use crate::stamp::synthesize;
use crate::tables::{DeveloperDirectory, DeveloperEntry, PostageStamp, ScanLineTable};
use crate::types::{Footer, ImageHeader, ImageType, HEADER_SIZE};

/// What to do with the image data when rewriting a file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImageDataMode {
    /// Keep the data exactly as stored
    #[default]
    Copy,

    /// Run-length encode an uncompressed image, turning types 1, 2 and 3 into 9, 10 and 11
    Pack,

    /// Decode a run-length encoded image, turning types 9, 10 and 11 into 1, 2 and 3
    Unpack,
}

/// Options for how the TGA file should be written
#[derive(Debug, Clone, Copy, Builder)]
pub struct TgaWriterOptions {
    /// Write the extension area, its tables and the 2.0 footer
    #[builder(default = true)]
    pub extended: bool,

    #[builder(default)]
    pub image_data: ImageDataMode,

    /// Carry over the developer directory and the fields it points to
    #[builder(default = true)]
    pub developer_area: bool,

    /// Write a scan line table when one exists or the rows are re-encoded
    #[builder(default = true)]
    pub scan_line_table: bool,

    /// Write the stored postage stamp, or build one from the image
    #[builder(default = true)]
    pub postage_stamp: bool,

    #[builder(default = true)]
    pub color_correction: bool,
}

impl Default for TgaWriterOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Serialize a fixed layout structure in memory
fn to_bytes<T>(value: &T) -> Result<Vec<u8>>
where
    T: for<'a> BinWrite<Args<'a> = ()>,
{
    let mut buffer = Vec::new();
    value.write_options(&mut NoSeek::new(&mut buffer), Endian::Little, ())?;
    Ok(buffer)
}

/// Write the fixed header followed by the image id
///
/// The id is cut or zero padded to `header.id_length` bytes. A destination that stops
/// accepting bytes fails with [`Error::ShortWrite`].
pub fn write_header<W: Write>(
    writer: &mut W,
    header: &ImageHeader,
    image_id: &[u8],
) -> Result<()> {
    let id_length = header.id_length as usize;

    let mut buffer = to_bytes(header)?;
    buffer.extend_from_slice(&image_id[..image_id.len().min(id_length)]);
    buffer.resize(HEADER_SIZE as usize + id_length, 0);

    writer.write_all(&buffer).map_err(Error::from_write)
}

/// Counts the bytes passed through so offsets can be recorded while writing
struct OffsetWriter<W> {
    inner: W,
    position: u64,
}

impl<W: Write> OffsetWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, position: 0 }
    }

    /// Current position as a file offset
    fn offset(&self) -> Result<u32> {
        u32::try_from(self.position).map_err(|_| Error::OffsetOverflow(self.position))
    }

    fn put(&mut self, data: &[u8]) -> Result<()> {
        self.write_all(data).map_err(Error::from_write)
    }
}

impl<W: Write> Write for OffsetWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.position += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// TGA file generator
///
/// Rewrites a decoded [`TgaFile`], pulling the color map, image data and developer fields
/// from the reader it was decoded with. Every structure after the image data is placed
/// right after the previous one: scan line table, postage stamp, color correction
/// table, extension area, developer fields, developer directory and finally the footer.
///
/// ```
/// # fn doit() -> tga_file::error::Result<()>
/// # {
/// use std::io::Cursor;
/// use tga_file::{ImageDataMode, TgaReader, TgaWriter, TgaWriterOptions};
///
/// # let mut input = vec![0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 0, 1, 0, 8, 0, 1, 1];
/// # input.extend_from_slice(&[0; 26]);
/// let mut source = TgaReader::new(Cursor::new(input))?;
/// let file = source.file().clone();
///
/// let options = TgaWriterOptions::builder()
///     .image_data(ImageDataMode::Pack)
///     .build();
/// let packed = TgaWriter::new(Cursor::new(Vec::new()), options).write(&file, &mut source)?;
///
/// assert_eq!(packed.get_ref()[2], 10);
/// # Ok(())
/// # }
/// # doit().unwrap();
/// ```
pub struct TgaWriter<W: Write> {
    out: OffsetWriter<W>,
    options: TgaWriterOptions,
}

impl<W: Write> TgaWriter<W> {
    pub fn new(inner: W, options: TgaWriterOptions) -> TgaWriter<W> {
        TgaWriter {
            out: OffsetWriter::new(inner),
            options,
        }
    }

    /// Write `file`, returning the inner writer
    ///
    /// `source` must be the reader `file` was decoded from; `file` itself may have been
    /// edited in between.
    #[instrument(skip(self, file, source), err)]
    pub fn write<R: Read + Seek>(
        mut self,
        file: &TgaFile,
        source: &mut TgaReader<R>,
    ) -> Result<W> {
        let mut header = file.header;
        header.image_type = self.output_type(header.image_type)?;

        write_header(&mut self.out, &header, &file.image_id)?;
        let color_map = source.color_map()?;
        self.out.put(&color_map)?;

        let image_offset = self.out.offset()?;
        let row_offsets = self.write_image_data(source)?;

        if !self.options.extended {
            self.out.flush()?;
            return Ok(self.out.inner);
        }

        let mut extension = file.extension.clone().unwrap_or_default().normalized();

        let scan_lines = self.scan_line_table(file, source, image_offset, row_offsets);
        extension.scan_line_offset = match scan_lines {
            Some(table) => self.write_scan_lines(&table)?,
            None => 0,
        };

        extension.stamp_offset = match self.postage_stamp(file, source)? {
            Some(stamp) => self.write_stamp(&stamp)?,
            None => 0,
        };

        extension.color_correct_offset = match &file.color_correction {
            Some(table) if self.options.color_correction => {
                let offset = self.out.offset()?;
                for value in table.iter() {
                    self.out
                        .write_u16::<LittleEndian>(*value)
                        .map_err(Error::from_write)?;
                }
                offset
            }
            _ => 0,
        };

        let ext_area_offset = self.out.offset()?;
        self.out.put(&to_bytes(&extension)?)?;

        let directory = &file.developer_directory;
        let dev_dir_offset = if self.options.developer_area && !directory.is_empty() {
            self.write_developer_area(directory, source)?
        } else {
            0
        };

        debug!(ext_area_offset, dev_dir_offset, "writing footer");
        self.out
            .put(&to_bytes(&Footer::new(ext_area_offset, dev_dir_offset))?)?;

        self.out.flush()?;
        Ok(self.out.inner)
    }

    fn output_type(&self, image_type: ImageType) -> Result<ImageType> {
        let converted = match self.options.image_data {
            ImageDataMode::Copy => Some(image_type),
            ImageDataMode::Pack => image_type.packed(),
            ImageDataMode::Unpack => image_type.unpacked(),
        };

        converted.ok_or(Error::InconsistentImageType(image_type))
    }

    /// Write the image data, returning the offset of every row when they were re-encoded
    fn write_image_data<R: Read + Seek>(
        &mut self,
        source: &mut TgaReader<R>,
    ) -> Result<Option<Vec<u32>>> {
        if self.options.image_data == ImageDataMode::Copy {
            source.copy_image_data(&mut self.out)?;
            return Ok(None);
        }

        let bpp = source.file().header.image.bytes_per_pixel();
        let mut rows = source.rows()?;
        let mut row = vec![0; rows.row_len()];
        let mut packed = Vec::with_capacity(row.len() + row.len() / 128 + 1);
        let mut offsets = Vec::with_capacity(rows.remaining());

        while rows.read_row(&mut row)? {
            offsets.push(self.out.offset()?);

            match self.options.image_data {
                ImageDataMode::Pack => {
                    packed.clear();
                    encode_row_into(&row, bpp, &mut packed)?;
                    self.out.put(&packed)?;
                }
                _ => self.out.put(&row)?,
            }
        }

        Ok(Some(offsets))
    }

    fn scan_line_table<R>(
        &self,
        file: &TgaFile,
        source: &TgaReader<R>,
        image_offset: u32,
        row_offsets: Option<Vec<u32>>,
    ) -> Option<ScanLineTable> {
        if !self.options.scan_line_table {
            return None;
        }

        if let Some(offsets) = row_offsets {
            return Some(ScanLineTable(offsets));
        }

        // copied data keeps its layout, only its start moves
        let old_offset = source.image_data_offset() as u32;
        file.scan_lines.as_ref().map(|table| {
            table
                .iter()
                .map(|offset| offset.wrapping_sub(old_offset).wrapping_add(image_offset))
                .collect::<Vec<_>>()
                .into()
        })
    }

    fn write_scan_lines(&mut self, table: &ScanLineTable) -> Result<u32> {
        let offset = self.out.offset()?;
        for row in table.iter() {
            self.out
                .write_u32::<LittleEndian>(*row)
                .map_err(Error::from_write)?;
        }
        Ok(offset)
    }

    fn postage_stamp<R: Read + Seek>(
        &self,
        file: &TgaFile,
        source: &mut TgaReader<R>,
    ) -> Result<Option<PostageStamp>> {
        if !self.options.postage_stamp {
            return Ok(None);
        }
        if let Some(stamp) = &file.postage_stamp {
            return Ok(Some(stamp.clone()));
        }

        let image_type = source.file().header.image_type;
        if !image_type.is_uncompressed() && !image_type.is_compressed() {
            warn!("cannot build a postage stamp for {image_type} images");
            return Ok(None);
        }

        synthesize(source)
    }

    fn write_stamp(&mut self, stamp: &PostageStamp) -> Result<u32> {
        let offset = self.out.offset()?;
        self.out.put(&[stamp.width, stamp.height])?;
        self.out.put(&stamp.data)?;
        Ok(offset)
    }

    /// Copy every developer field, then write the directory pointing at the copies
    fn write_developer_area<R: Read + Seek>(
        &mut self,
        directory: &DeveloperDirectory,
        source: &mut TgaReader<R>,
    ) -> Result<u32> {
        let mut entries = Vec::with_capacity(directory.len());

        for (index, entry) in directory.iter().enumerate() {
            let offset = self.out.offset()?;
            let data = source.read_developer_block(entry)?;
            self.out.put(&data)?;

            debug!(index, tag = entry.tag, offset, "copied developer field");
            entries.push(DeveloperEntry { offset, ..*entry });
        }

        let count = u16::try_from(entries.len())
            .map_err(|_| Error::TooManyDeveloperFields(entries.len()))?;

        let dev_dir_offset = self.out.offset()?;
        self.out
            .write_u16::<LittleEndian>(count)
            .map_err(Error::from_write)?;
        for entry in &entries {
            self.out.put(&to_bytes(entry)?)?;
        }

        Ok(dev_dir_offset)
    }
}

/// Rewrite a decoded file with the default options
pub fn encode<W: Write, R: Read + Seek>(
    writer: W,
    file: &TgaFile,
    source: &mut TgaReader<R>,
) -> Result<W> {
    TgaWriter::new(writer, TgaWriterOptions::default()).write(file, source)
}
