//! Postage stamp synthesis by subsampling the image data.

use std::io::{Read, Seek};

use tracing::{debug, instrument};

use crate::error::Result;
use crate::read::TgaReader;
use crate::tables::PostageStamp;

/// Width and height of a synthesized stamp
pub const STAMP_DIMENSION: usize = 64;

/// Images must be at least this large in both directions to get a stamp
const MIN_SOURCE_DIMENSION: u16 = 128;

/// Build a 64x64 stamp by sampling the source image
///
/// The image is split into a 64x64 grid of cells, after setting aside half of any
/// remainder on each side, and the pixel in the middle of each cell is kept. Returns
/// `None` when the image is smaller than 128 pixels in either direction.
#[instrument(skip(source), err)]
pub fn synthesize<R: Read + Seek>(source: &mut TgaReader<R>) -> Result<Option<PostageStamp>> {
    let image = source.file().header.image;
    if image.width < MIN_SOURCE_DIMENSION || image.height < MIN_SOURCE_DIMENSION {
        debug!(width = image.width, height = image.height, "image too small for a stamp");
        return Ok(None);
    }

    let width = image.width as usize;
    let height = image.height as usize;
    let bpp = image.bytes_per_pixel();

    let dx = width / STAMP_DIMENSION;
    let dy = height / STAMP_DIMENSION;
    let x0 = (width % STAMP_DIMENSION) / 2 + dx / 2;
    let y0 = (height % STAMP_DIMENSION) / 2 + dy / 2;
    let last_row = y0 + (STAMP_DIMENSION - 1) * dy;

    let mut rows = source.rows()?;
    let mut row = vec![0; rows.row_len()];
    let mut data = Vec::with_capacity(STAMP_DIMENSION * STAMP_DIMENSION * bpp);

    for y in 0..=last_row {
        rows.read_row(&mut row)?;
        if y < y0 || (y - y0) % dy != 0 {
            continue;
        }

        for x in (0..STAMP_DIMENSION).map(|j| x0 + j * dx) {
            data.extend_from_slice(&row[x * bpp..(x + 1) * bpp]);
        }
    }

    Ok(Some(PostageStamp {
        width: STAMP_DIMENSION as u8,
        height: STAMP_DIMENSION as u8,
        data,
    }))
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use binrw::BinWrite;
    use pretty_assertions::assert_eq;

    use crate::error::{Error, Result};
    use crate::read::TgaReader;
    use crate::rle::encode_row;
    use crate::stamp::synthesize;
    use crate::types::{ImageHeader, ImageSpec, ImageType};

    fn pixel(x: usize, y: usize) -> [u8; 2] {
        [x as u8, (y as u8).wrapping_mul(3)]
    }

    fn image(image_type: ImageType, width: u16, height: u16) -> Result<Vec<u8>> {
        let header = ImageHeader {
            image_type,
            image: ImageSpec {
                width,
                height,
                pixel_depth: 16,
                ..Default::default()
            },
            ..Default::default()
        };

        let mut data = Vec::new();
        header.write(&mut Cursor::new(&mut data))?;

        for y in 0..height as usize {
            let row: Vec<u8> = (0..width as usize).flat_map(|x| pixel(x, y)).collect();
            if image_type.is_compressed() {
                data.extend(encode_row(&row, 2)?);
            } else {
                data.extend(row);
            }
        }

        Ok(data)
    }

    fn expected_stamp(x0: usize, dx: usize, y0: usize, dy: usize) -> Vec<u8> {
        (0..64)
            .flat_map(|k| (0..64).map(move |j| (x0 + j * dx, y0 + k * dy)))
            .flat_map(|(x, y)| pixel(x, y))
            .collect()
    }

    #[test]
    fn samples_centre_of_each_cell() -> Result<()> {
        let input = image(ImageType::TrueColor, 128, 130)?;
        let mut tga = TgaReader::new(Cursor::new(&input))?;

        let stamp = synthesize(&mut tga)?.expect("stamp");
        assert_eq!((stamp.width, stamp.height), (64, 64));
        assert_eq!(stamp.data, expected_stamp(1, 2, 2, 2));

        Ok(())
    }

    #[test]
    fn samples_compressed_rows() -> Result<()> {
        let input = image(ImageType::RleTrueColor, 200, 128)?;
        let mut tga = TgaReader::new(Cursor::new(&input))?;

        let stamp = synthesize(&mut tga)?.expect("stamp");
        assert_eq!(stamp.data, expected_stamp(4 + 1, 3, 1, 2));

        Ok(())
    }

    #[test]
    fn small_images_have_no_stamp() -> Result<()> {
        let input = image(ImageType::TrueColor, 127, 200)?;
        let mut tga = TgaReader::new(Cursor::new(&input))?;
        assert_eq!(synthesize(&mut tga)?, None);

        Ok(())
    }

    #[test]
    fn unknown_image_types_are_rejected() -> Result<()> {
        let mut input = image(ImageType::TrueColor, 128, 128)?;
        input[2] = 0x20;
        let mut tga = TgaReader::new(Cursor::new(&input))?;

        assert!(matches!(
            synthesize(&mut tga),
            Err(Error::UnsupportedImageType(ImageType::Other(0x20)))
        ));

        Ok(())
    }
}
