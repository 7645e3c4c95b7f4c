use std::path::PathBuf;

use clap::Args;
use miette::Result;
use tga_file::TgaWriterOptions;

use super::batch;

#[derive(Args)]
pub struct StripArgs {
    /// TGA files, or directories to search for them
    #[arg(required = true, value_name = "PATH")]
    paths: Vec<PathBuf>,
}

impl StripArgs {
    pub fn handle(&self) -> Result<()> {
        batch::run(&self.paths, &|_| {
            Some(TgaWriterOptions::builder().extended(false).build())
        })
    }
}
