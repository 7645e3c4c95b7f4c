use std::path::PathBuf;

use clap::Args;
use miette::Result;
use tga_file::{ImageDataMode, TgaWriterOptions};

use super::batch;

#[derive(Args)]
pub struct PackArgs {
    /// TGA files, or directories to search for them
    #[arg(required = true, value_name = "PATH")]
    paths: Vec<PathBuf>,
}

impl PackArgs {
    pub fn handle(&self) -> Result<()> {
        batch::run(&self.paths, &|file| {
            file.header.image_type.is_uncompressed().then(|| {
                TgaWriterOptions::builder()
                    .image_data(ImageDataMode::Pack)
                    .extended(file.extended)
                    .build()
            })
        })
    }
}

#[derive(Args)]
pub struct UnpackArgs {
    /// TGA files, or directories to search for them
    #[arg(required = true, value_name = "PATH")]
    paths: Vec<PathBuf>,
}

impl UnpackArgs {
    pub fn handle(&self) -> Result<()> {
        batch::run(&self.paths, &|file| {
            file.header.image_type.is_compressed().then(|| {
                TgaWriterOptions::builder()
                    .image_data(ImageDataMode::Unpack)
                    .extended(file.extended)
                    .build()
            })
        })
    }
}
