//! Types for reading TGA files
//!

use std::io::{self, Read, Seek, SeekFrom, Write};

use binrw::BinRead;
use byteorder::{LittleEndian, ReadBytesExt};
use tracing::{debug, instrument, warn};

use crate::error::{Error, Result, SubTable};
use crate::extension::{ExtensionArea, EXT_SIZE_20};
use crate::file::{validate_file_size, TgaFile};
use crate::rle::{count_encoded_bytes, RleDecoder};
use crate::tables::{
    ColorCorrectionTable, DeveloperDirectory, DeveloperEntry, PostageStamp, ScanLineTable,
};
use crate::types::{Footer, ImageHeader, ImageType, FOOTER_SIZE};

/// Map a premature end of input to a format specific error
fn on_eof(error: binrw::Error, truncated: Error) -> Error {
    if error.is_eof() {
        truncated
    } else {
        Error::BinRWError(error)
    }
}

/// TGA file reader
///
/// Decoding happens up front in [`TgaReader::new`]: header, footer, extension area, the
/// tables it points to and the developer directory. The color map, image data and
/// developer fields stay in the stream and are read on demand.
///
/// ```no_run
/// use std::fs::File;
///
/// fn describe(path: &str) -> tga_file::error::Result<()> {
///     let mut tga = tga_file::TgaReader::new(File::open(path)?)?;
///
///     for problem in tga.diagnostics() {
///         println!("warning: {problem}");
///     }
///
///     let header = tga.file().header;
///     println!("{}x{} {}", header.image.width, header.image.height, header.image_type);
///     println!("{} bytes of image data", tga.image_data_len()?);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct TgaReader<R> {
    reader: R,
    length: u64,
    file: TgaFile,
    diagnostics: Vec<Error>,
}

impl<R> TgaReader<R> {
    /// The decoded structure
    pub fn file(&self) -> &TgaFile {
        &self.file
    }

    /// Problems that did not stop the decode
    pub fn diagnostics(&self) -> &[Error] {
        &self.diagnostics
    }

    /// Size of the underlying stream
    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Offset of the first byte of image data
    pub fn image_data_offset(&self) -> u64 {
        self.file.header.image_data_offset()
    }

    /// Split into the decoded structure and its diagnostics, dropping the stream
    pub fn into_parts(self) -> (TgaFile, Vec<Error>) {
        (self.file, self.diagnostics)
    }

    /// Unwrap and return the inner reader object
    ///
    /// The position of the reader is undefined.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read + Seek> TgaReader<R> {
    /// Decode the structure of a TGA file
    ///
    /// Fails on anything that prevents locating the primary structures. Damaged optional
    /// tables are left empty and reported through [`TgaReader::diagnostics`].
    #[instrument(skip(reader), err)]
    pub fn new(mut reader: R) -> Result<Self> {
        let length = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        let header =
            ImageHeader::read(&mut reader).map_err(|e| on_eof(e, Error::HeaderTruncated))?;

        let mut image_id = vec![0; header.id_length as usize];
        reader.read_exact(&mut image_id).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => Error::IdTruncated {
                expected: header.id_length,
            },
            _ => Error::IOError(e),
        })?;

        let mut tga = TgaReader {
            reader,
            length,
            file: TgaFile {
                header,
                image_id,
                ..Default::default()
            },
            diagnostics: Vec::new(),
        };

        tga.read_footer()?;

        if let Err(e) = validate_file_size(&tga.file.header, tga.file.extended, length) {
            warn!("{e}");
            tga.diagnostics.push(e);
        }

        if tga.file.ext_area_offset != 0 {
            tga.read_extension()?;
        }

        if tga.file.dev_dir_offset != 0 {
            tga.read_developer_directory()?;
        }

        Ok(tga)
    }

    fn read_footer(&mut self) -> Result<()> {
        if self.length < FOOTER_SIZE {
            return Err(Error::SeekEnd {
                length: self.length,
            });
        }

        self.reader.seek(SeekFrom::Start(self.length - FOOTER_SIZE))?;
        let footer = Footer::read(&mut self.reader).map_err(|_| Error::SignatureRead)?;

        self.file.extended = footer.is_extended();
        if self.file.extended {
            self.file.ext_area_offset = footer.ext_area_offset;
            self.file.dev_dir_offset = footer.dev_dir_offset;
        }

        debug!(
            extended = self.file.extended,
            ext_area_offset = self.file.ext_area_offset,
            dev_dir_offset = self.file.dev_dir_offset,
            "read footer"
        );

        Ok(())
    }

    fn read_extension(&mut self) -> Result<()> {
        let offset = self.file.ext_area_offset;
        if offset as u64 + EXT_SIZE_20 as u64 > self.length {
            return Err(Error::ExtendedArea { offset });
        }

        self.reader.seek(SeekFrom::Start(offset as u64))?;
        let extension = ExtensionArea::read(&mut self.reader)
            .map_err(|e| on_eof(e, Error::ExtendedArea { offset }))?;

        if !extension.is_version_2() {
            debug!(ext_size = extension.ext_size, "unexpected extension area size");
        }

        let height = self.file.header.image.height as usize;
        let bpp = self.file.header.image.bytes_per_pixel();

        self.file.color_correction =
            self.read_sub_table(SubTable::ColorCorrection, extension.color_correct_offset, |r| {
                let mut table = ColorCorrectionTable::default();
                r.read_u16_into::<LittleEndian>(&mut table[..])?;
                Ok(table)
            })?;

        self.file.postage_stamp =
            self.read_sub_table(SubTable::PostageStamp, extension.stamp_offset, |r| {
                let width = r.read_u8()?;
                let height = r.read_u8()?;
                let mut data = vec![0; width as usize * height as usize * bpp];
                r.read_exact(&mut data)?;
                Ok(PostageStamp {
                    width,
                    height,
                    data,
                })
            })?;

        self.file.scan_lines =
            self.read_sub_table(SubTable::ScanLine, extension.scan_line_offset, |r| {
                let mut table = vec![0; height];
                r.read_u32_into::<LittleEndian>(&mut table)?;
                Ok(ScanLineTable(table))
            })?;

        self.file.extension = Some(extension);
        Ok(())
    }

    /// Read a table pointed to by the extension area
    ///
    /// Offsets outside the file and tables cut short are recorded as diagnostics and
    /// leave the table empty.
    fn read_sub_table<T>(
        &mut self,
        table: SubTable,
        offset: u32,
        read: impl FnOnce(&mut R) -> io::Result<T>,
    ) -> Result<Option<T>> {
        if offset == 0 {
            return Ok(None);
        }

        let problem = if offset as u64 > self.length {
            Error::SubTableSeekFailed { table, offset }
        } else {
            self.reader.seek(SeekFrom::Start(offset as u64))?;
            match read(&mut self.reader) {
                Ok(value) => return Ok(Some(value)),
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    Error::SubTableTruncated { table, offset }
                }
                Err(e) => return Err(e.into()),
            }
        };

        warn!("{problem}");
        self.diagnostics.push(problem);
        Ok(None)
    }

    fn read_developer_directory(&mut self) -> Result<()> {
        let offset = self.file.dev_dir_offset;
        if offset as u64 + 2 > self.length {
            return Err(Error::DeveloperDirectory { offset });
        }

        self.reader.seek(SeekFrom::Start(offset as u64))?;
        let count = self
            .reader
            .read_u16::<LittleEndian>()
            .map_err(|_| Error::DeveloperDirectory { offset })?;

        let mut entries = Vec::new();
        entries
            .try_reserve_exact(count as usize)
            .map_err(|_| Error::OutOfMemory {
                entries: count as usize,
            })?;

        for _ in 0..count {
            entries.push(
                DeveloperEntry::read(&mut self.reader)
                    .map_err(|e| on_eof(e, Error::DeveloperDirectory { offset }))?,
            );
        }

        debug!(entries = entries.len(), "read developer directory");
        self.file.developer_directory = DeveloperDirectory(entries);
        Ok(())
    }

    /// Raw color map data
    #[instrument(skip(self), err)]
    pub fn color_map(&mut self) -> Result<Vec<u8>> {
        let header = &self.file.header;
        let mut data = vec![0; header.color_map.byte_len() as usize];

        self.reader.seek(SeekFrom::Start(header.color_map_offset()))?;
        self.reader.read_exact(&mut data)?;
        Ok(data)
    }

    /// Number of bytes of image data as stored in the file
    ///
    /// Compressed data has to be walked packet by packet to find its end.
    #[instrument(skip(self), err)]
    pub fn image_data_len(&mut self) -> Result<u64> {
        let header = self.file.header;
        let image = header.image;

        match header.image_type {
            ImageType::NoImage => Ok(0),
            t if t.is_uncompressed() => Ok(image.byte_len()),
            t if t.is_compressed() => {
                self.reader.seek(SeekFrom::Start(header.image_data_offset()))?;
                count_encoded_bytes(
                    &mut self.reader,
                    image.width,
                    image.height,
                    image.bytes_per_pixel(),
                )
            }
            _ if !self.file.extended => Ok(self.length.saturating_sub(header.image_data_offset())),
            _ => Err(Error::UnknownImageLength),
        }
    }

    /// Copy the image data exactly as stored, returning the number of bytes copied
    #[instrument(skip(self, out), err)]
    pub fn copy_image_data<W: Write>(&mut self, out: &mut W) -> Result<u64> {
        let len = self.image_data_len()?;

        self.reader.seek(SeekFrom::Start(self.image_data_offset()))?;
        let copied = io::copy(&mut self.reader.by_ref().take(len), out)
            .map_err(Error::from_write)?;
        if copied != len {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }

        Ok(copied)
    }

    /// Contents of a developer field, `None` when there is no entry at `index`
    #[instrument(skip(self), err)]
    pub fn developer_field(&mut self, index: usize) -> Result<Option<Vec<u8>>> {
        match self.file.developer_directory.get(index).copied() {
            Some(entry) => self.read_developer_block(&entry).map(Some),
            None => Ok(None),
        }
    }

    /// The bytes a developer directory entry points to
    pub fn read_developer_block(&mut self, entry: &DeveloperEntry) -> Result<Vec<u8>> {
        if entry.offset as u64 + entry.size as u64 > self.length {
            return Err(Error::DeveloperField {
                tag: entry.tag,
                offset: entry.offset,
                size: entry.size,
            });
        }

        let mut data = vec![0; entry.size as usize];
        self.reader.seek(SeekFrom::Start(entry.offset as u64))?;
        self.reader.read_exact(&mut data)?;
        Ok(data)
    }

    /// Read the image one row at a time, decompressing if needed
    pub fn rows(&mut self) -> Result<RowReader<'_, R>> {
        let header = self.file.header;
        let bpp = header.image.bytes_per_pixel();

        let decoder = match header.image_type {
            t if t.is_uncompressed() => None,
            t if t.is_compressed() => Some(RleDecoder::new(bpp)?),
            t => return Err(Error::UnsupportedImageType(t)),
        };

        self.reader.seek(SeekFrom::Start(header.image_data_offset()))?;

        Ok(RowReader {
            reader: &mut self.reader,
            decoder,
            row_len: header.image.row_len(),
            remaining: header.image.height as usize,
        })
    }
}

/// Reads decoded rows of image data, created by [`TgaReader::rows`]
///
/// Rows come out in file order, which depends on the origin of the image.
#[derive(Debug)]
pub struct RowReader<'a, R> {
    reader: &'a mut R,
    decoder: Option<RleDecoder>,
    row_len: usize,
    remaining: usize,
}

impl<R: Read> RowReader<'_, R> {
    /// Number of bytes in one decoded row
    pub fn row_len(&self) -> usize {
        self.row_len
    }

    /// Rows not read yet
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Fill `out` with the next row
    ///
    /// Returns `false` without touching `out` once every row has been read.
    pub fn read_row(&mut self, out: &mut [u8]) -> Result<bool> {
        if self.remaining == 0 {
            return Ok(false);
        }
        if out.len() != self.row_len {
            return Err(Error::RowBufferLength {
                len: out.len(),
                expected: self.row_len,
            });
        }

        match &mut self.decoder {
            Some(decoder) => decoder.decode_into(&mut *self.reader, out)?,
            None => self.reader.read_exact(out)?,
        }

        self.remaining -= 1;
        Ok(true)
    }
}

/// Decode a TGA file, returning its structure and any non-fatal problems
pub fn decode<R: Read + Seek>(reader: R) -> Result<(TgaFile, Vec<Error>)> {
    Ok(TgaReader::new(reader)?.into_parts())
}
