use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use tga_file::error::Result;
use tga_file::{ImageDataMode, ImageType, TgaReader, TgaWriter, TgaWriterOptions};
use tracing::info;
use tracing_test::traced_test;
use walkdir::WalkDir;

fn resource(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("resources").join(name)
}

fn resources() -> Vec<PathBuf> {
    WalkDir::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("resources"))
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "tga"))
        .map(|e| e.into_path())
        .collect()
}

fn read_pixels<R: Read + Seek>(tga: &mut TgaReader<R>) -> Result<Vec<u8>> {
    let mut rows = tga.rows()?;
    let mut row = vec![0; rows.row_len()];
    let mut pixels = Vec::new();
    while rows.read_row(&mut row)? {
        pixels.extend_from_slice(&row);
    }
    Ok(pixels)
}

fn rewrite(input: &[u8], options: TgaWriterOptions) -> Result<Vec<u8>> {
    let mut source = TgaReader::new(Cursor::new(input))?;
    let file = source.file().clone();
    let out = TgaWriter::new(Cursor::new(Vec::new()), options).write(&file, &mut source)?;
    Ok(out.into_inner())
}

fn validate_rewrite(path: &Path) -> Result<()> {
    info!("testing {}", path.display());

    let input = std::fs::read(path)?;
    let mut source = TgaReader::new(Cursor::new(&input))?;
    assert!(source.diagnostics().is_empty());

    let output = rewrite(&input, TgaWriterOptions::default())?;
    let mut rewritten = TgaReader::new(Cursor::new(&output))?;
    assert!(rewritten.diagnostics().is_empty());
    assert!(rewritten.file().extended);

    let before = source.file().clone();
    let after = rewritten.file().clone();

    assert_eq!(after.header, before.header);
    assert_eq!(after.image_id, before.image_id);
    assert_eq!(after.color_correction, before.color_correction);
    assert_eq!(rewritten.color_map()?, source.color_map()?);
    assert_eq!(read_pixels(&mut rewritten)?, read_pixels(&mut source)?);

    if before.postage_stamp.is_some() {
        assert_eq!(after.postage_stamp, before.postage_stamp);
    }

    assert_eq!(
        after.developer_directory.len(),
        before.developer_directory.len()
    );
    for index in 0..before.developer_directory.len() {
        assert_eq!(
            after.developer_directory[index].tag,
            before.developer_directory[index].tag
        );
        assert_eq!(
            rewritten.developer_field(index)?,
            source.developer_field(index)?
        );
    }

    if let Some(table) = &before.scan_lines {
        let moved = after.scan_lines.clone().expect("scan line table");
        let shift = rewritten.image_data_offset() as i64 - source.image_data_offset() as i64;
        for (old, new) in table.iter().zip(moved.iter()) {
            assert_eq!(*new as i64, *old as i64 + shift);
        }
    }

    if let (Some(old), Some(new)) = (&before.extension, &after.extension) {
        assert_eq!(new.author, old.author);
        assert_eq!(new.comments, old.comments);
        assert_eq!(new.timestamp, old.timestamp);
        assert_eq!(new.job_id, old.job_id);
        assert_eq!(new.job_time, old.job_time);
        assert_eq!(new.software_id, old.software_id);
        assert_eq!(new.version_number, old.version_number);
        assert_eq!(new.key_color, old.key_color);
        assert_eq!(new.pixel_aspect, old.pixel_aspect);
        assert_eq!(new.gamma, old.gamma);
        assert_eq!(new.alpha_attribute, old.alpha_attribute);
    }

    // once everything is in its canonical place another pass changes nothing
    assert_eq!(rewrite(&output, TgaWriterOptions::default())?, output);

    Ok(())
}

#[test]
#[traced_test]
fn rewrite_resources() -> Result<()> {
    let paths = resources();
    assert_eq!(paths.len(), 3);

    for path in paths {
        validate_rewrite(&path)?;
    }

    Ok(())
}

#[test]
#[traced_test]
fn stamp_is_built_for_large_images() -> Result<()> {
    let input = std::fs::read(resource("mapped_rle.tga"))?;
    let output = rewrite(&input, TgaWriterOptions::default())?;

    let tga = TgaReader::new(Cursor::new(&output))?;
    let stamp = tga.file().postage_stamp.clone().expect("postage stamp");
    assert_eq!((stamp.width, stamp.height), (64, 64));
    assert_eq!(stamp.data.len(), 64 * 64);

    let without = rewrite(
        &input,
        TgaWriterOptions::builder().postage_stamp(false).build(),
    )?;
    assert_eq!(without.len(), output.len() - 2 - 64 * 64);

    Ok(())
}

#[test]
#[traced_test]
fn pack_then_unpack() -> Result<()> {
    for name in ["legacy_rgb24.tga", "gray_stamp.tga"] {
        let input = std::fs::read(resource(name))?;
        let mut source = TgaReader::new(Cursor::new(&input))?;
        let image_type = source.file().header.image_type;

        let packed = rewrite(
            &input,
            TgaWriterOptions::builder()
                .image_data(ImageDataMode::Pack)
                .build(),
        )?;
        let mut compressed = TgaReader::new(Cursor::new(&packed))?;
        assert_eq!(
            Some(compressed.file().header.image_type),
            image_type.packed()
        );
        assert_eq!(read_pixels(&mut compressed)?, read_pixels(&mut source)?);

        let unpacked = rewrite(
            &packed,
            TgaWriterOptions::builder()
                .image_data(ImageDataMode::Unpack)
                .build(),
        )?;
        let mut restored = TgaReader::new(Cursor::new(&unpacked))?;
        assert_eq!(restored.file().header, source.file().header);
        assert_eq!(read_pixels(&mut restored)?, read_pixels(&mut source)?);
    }

    Ok(())
}

#[test]
#[traced_test]
fn strip_extension() -> Result<()> {
    let input = std::fs::read(resource("mapped_rle.tga"))?;
    let mut source = TgaReader::new(Cursor::new(&input))?;
    let image_end = source.image_data_offset() + source.image_data_len()?;

    let output = rewrite(&input, TgaWriterOptions::builder().extended(false).build())?;
    assert_eq!(output.len() as u64, image_end);
    assert_eq!(&output[..], &input[..image_end as usize]);

    let stripped = TgaReader::new(Cursor::new(&output))?;
    assert!(!stripped.file().extended);
    assert_eq!(stripped.file().header.image_type, ImageType::RleColorMapped);
    assert_eq!(stripped.file().extension, None);
    assert!(stripped.file().developer_directory.is_empty());

    Ok(())
}
