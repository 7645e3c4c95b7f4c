use std::path::PathBuf;

use clap::Args;
use miette::Result;
use tga_file::TgaWriterOptions;

use super::batch;

#[derive(Args)]
pub struct ExtendArgs {
    /// TGA files, or directories to search for them
    #[arg(required = true, value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Do not write or create a postage stamp
    #[arg(long, default_value_t = false)]
    no_stamp: bool,

    /// Drop the developer directory and its fields
    #[arg(long, default_value_t = false)]
    no_dev: bool,

    /// Drop the color correction table
    #[arg(long, default_value_t = false)]
    no_color: bool,

    /// Drop the scan line table
    #[arg(long, default_value_t = false)]
    no_scan: bool,
}

impl ExtendArgs {
    fn options(&self) -> TgaWriterOptions {
        TgaWriterOptions::builder()
            .extended(true)
            .postage_stamp(!self.no_stamp)
            .developer_area(!self.no_dev)
            .color_correction(!self.no_color)
            .scan_line_table(!self.no_scan)
            .build()
    }

    pub fn handle(&self) -> Result<()> {
        let options = self.options();
        batch::run(&self.paths, &|_| Some(options))
    }
}
