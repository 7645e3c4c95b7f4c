//! Optional tables referenced from the extension area and the footer.

use binrw::{BinRead, BinWrite};
use derive_more::{Deref, DerefMut, From, Index, IntoIterator};

/// Number of 16 bit values in a color correction table
pub const COLOR_CORRECTION_LEN: usize = 1024;

/// Size of a developer directory entry on disk
pub const DEVELOPER_ENTRY_SIZE: u64 = 10;

/// 256 entries of four 16 bit channels, stored as A, R, G, B
#[derive(Debug, Clone, PartialEq, Eq, Deref, DerefMut, From)]
pub struct ColorCorrectionTable(pub Box<[u16; COLOR_CORRECTION_LEN]>);

impl Default for ColorCorrectionTable {
    fn default() -> Self {
        Self(Box::new([0; COLOR_CORRECTION_LEN]))
    }
}

impl ColorCorrectionTable {
    /// Channels of one entry as `[alpha, red, green, blue]`
    pub fn color(&self, index: u8) -> [u16; 4] {
        let start = index as usize * 4;
        [
            self.0[start],
            self.0[start + 1],
            self.0[start + 2],
            self.0[start + 3],
        ]
    }

    /// Size of the table on disk
    pub fn byte_len(&self) -> u64 {
        COLOR_CORRECTION_LEN as u64 * 2
    }
}

/// Offset of every row of the image data, one entry per row
#[derive(Debug, Default, Clone, PartialEq, Eq, Deref, DerefMut, From, Index, IntoIterator)]
pub struct ScanLineTable(pub Vec<u32>);

/// Entry of the developer directory
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct DeveloperEntry {
    /// Application defined tag
    pub tag: u16,

    /// Offset of the field data in the file
    pub offset: u32,

    /// Size of the field data
    pub size: u32,
}

/// Developer directory, kept in file order
#[derive(Debug, Default, Clone, PartialEq, Eq, Deref, DerefMut, From, Index, IntoIterator)]
pub struct DeveloperDirectory(pub Vec<DeveloperEntry>);

impl DeveloperDirectory {
    /// Size of the directory on disk, count included
    pub fn byte_len(&self) -> u64 {
        2 + self.0.len() as u64 * DEVELOPER_ENTRY_SIZE
    }
}

/// Small preview of the image stored in the same format as the image data
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PostageStamp {
    pub width: u8,
    pub height: u8,
    pub data: Vec<u8>,
}

impl PostageStamp {
    /// Size of the stamp on disk, dimensions included
    pub fn byte_len(&self) -> u64 {
        2 + self.data.len() as u64
    }
}
