pub mod batch;
pub mod extend;
pub mod pack;
pub mod strip;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Run-length encode uncompressed images
    Pack(pack::PackArgs),
    /// Decode run-length encoded images
    Unpack(pack::UnpackArgs),
    /// Rewrite files in the 2.0 format with an extension area
    Extend(extend::ExtendArgs),
    /// Rewrite files in the original format, dropping everything after the image data
    Strip(strip::StripArgs),
}

impl Commands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            Commands::Pack(pack) => pack.handle(),
            Commands::Unpack(unpack) => unpack.handle(),
            Commands::Extend(extend) => extend.handle(),
            Commands::Strip(strip) => strip.handle(),
        }
    }
}
