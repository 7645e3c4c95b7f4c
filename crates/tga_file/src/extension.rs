//! The TGA 2.0 extension area.
//!
//! A fixed block of 495 bytes located through [`crate::types::Footer::ext_area_offset`].
//!
//! | Offset | Size | Field                                  |
//! |--------|------|----------------------------------------|
//! | 0      | 2    | Extension size (495 for version 2.0)   |
//! | 2      | 41   | Author name                            |
//! | 43     | 324  | Author comments, 4 lines of 81 bytes   |
//! | 367    | 12   | Date/time stamp                        |
//! | 379    | 41   | Job name/ID                            |
//! | 420    | 6    | Job time                               |
//! | 426    | 41   | Software ID                            |
//! | 467    | 3    | Software version                       |
//! | 470    | 4    | Key color                              |
//! | 474    | 4    | Pixel aspect ratio                     |
//! | 478    | 4    | Gamma value                            |
//! | 482    | 4    | Color correction offset                |
//! | 486    | 4    | Postage stamp offset                   |
//! | 490    | 4    | Scan line offset                       |
//! | 494    | 1    | Attributes type                        |

use std::borrow::Cow;
use std::fmt::{self, Debug};

use binrw::io::{Read, Seek, Write};
use binrw::{BinRead, BinResult, BinWrite, Endian};
use derive_more::Display;

/// Size of a version 2.0 extension area
pub const EXT_SIZE_20: u16 = 495;

/// Fixed-width, NUL padded character field
///
/// The whole field is kept as stored, bytes after the first NUL included, so that a
/// rewrite reproduces it exactly.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct FixedString<const N: usize>(pub [u8; N]);

impl<const N: usize> FixedString<N> {
    /// The raw field
    pub fn as_bytes(&self) -> &[u8; N] {
        &self.0
    }

    /// Bytes up to the first NUL
    pub fn text_bytes(&self) -> &[u8] {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(N);
        &self.0[..end]
    }

    /// Field contents up to the first NUL
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.text_bytes())
    }

    /// Whether the field holds something other than blanks and tabs
    pub fn is_meaningful(&self) -> bool {
        self.text_bytes().iter().any(|&b| b != b' ' && b != b'\t')
    }
}

impl<const N: usize> Default for FixedString<N> {
    fn default() -> Self {
        Self([0; N])
    }
}

/// Keeps at most `N - 1` bytes so the field stays NUL terminated.
impl<const N: usize> From<&str> for FixedString<N> {
    fn from(value: &str) -> Self {
        let mut field = [0; N];
        let len = value.len().min(N.saturating_sub(1));
        field[..len].copy_from_slice(&value.as_bytes()[..len]);
        Self(field)
    }
}

impl<const N: usize> Debug for FixedString<N> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FixedString<{}>({:?})", N, self.text())
    }
}

impl<const N: usize> BinRead for FixedString<N> {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        _endian: Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<Self> {
        let mut field = [0; N];
        reader.read_exact(&mut field)?;
        Ok(Self(field))
    }
}

impl<const N: usize> BinWrite for FixedString<N> {
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        _endian: Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<()> {
        writer.write_all(&self.0)?;
        Ok(())
    }
}

/// Date and time the image was saved
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct DateTimeStamp {
    pub month: u16,
    pub day: u16,
    pub year: u16,
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
}

/// Time spent on the job the image belongs to
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct JobTime {
    pub hours: u16,
    pub minutes: u16,
    pub seconds: u16,
}

/// Key color stored as `0xAARRGGBB`
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct KeyColor(pub u32);

impl KeyColor {
    pub fn from_argb(alpha: u8, red: u8, green: u8, blue: u8) -> Self {
        Self(u32::from_be_bytes([alpha, red, green, blue]))
    }

    pub fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn blue(self) -> u8 {
        self.0 as u8
    }
}

/// A ratio of two 16 bit values, used for pixel aspect and gamma
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct Ratio {
    pub numerator: u16,
    pub denominator: u16,
}

impl Ratio {
    /// The ratio as a float, `None` when the field is unused
    pub fn value(self) -> Option<f64> {
        (self.denominator != 0).then(|| self.numerator as f64 / self.denominator as f64)
    }
}

/// Meaning of the attribute (alpha) bits of each pixel
#[derive(Debug, Display, Copy, Clone, Default, PartialEq, Eq)]
pub enum AlphaAttribute {
    #[default]
    #[display("no alpha data")]
    None,
    #[display("undefined, can be ignored")]
    UndefinedIgnore,
    #[display("undefined, should be retained")]
    UndefinedRetain,
    #[display("useful alpha channel")]
    Useful,
    #[display("pre-multiplied alpha")]
    Premultiplied,
    #[display("unknown attribute {_0}")]
    Other(u8),
}

impl From<u8> for AlphaAttribute {
    fn from(value: u8) -> Self {
        match value {
            0 => AlphaAttribute::None,
            1 => AlphaAttribute::UndefinedIgnore,
            2 => AlphaAttribute::UndefinedRetain,
            3 => AlphaAttribute::Useful,
            4 => AlphaAttribute::Premultiplied,
            other => AlphaAttribute::Other(other),
        }
    }
}

impl From<AlphaAttribute> for u8 {
    fn from(value: AlphaAttribute) -> Self {
        match value {
            AlphaAttribute::None => 0,
            AlphaAttribute::UndefinedIgnore => 1,
            AlphaAttribute::UndefinedRetain => 2,
            AlphaAttribute::Useful => 3,
            AlphaAttribute::Premultiplied => 4,
            AlphaAttribute::Other(other) => other,
        }
    }
}

/// TGA 2.0 extension area
#[derive(BinRead, BinWrite, Debug, Default, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct ExtensionArea {
    /// Size of the area, 495 for version 2.0
    pub ext_size: u16,

    pub author: FixedString<41>,

    pub comments: [FixedString<81>; 4],

    pub timestamp: DateTimeStamp,

    pub job_id: FixedString<41>,

    pub job_time: JobTime,

    pub software_id: FixedString<41>,

    /// Software version multiplied by 100
    pub version_number: u16,

    /// Software version letter, a space when unused
    pub version_letter: u8,

    pub key_color: KeyColor,

    pub pixel_aspect: Ratio,

    pub gamma: Ratio,

    /// Offset of the color correction table, 0 when absent
    pub color_correct_offset: u32,

    /// Offset of the postage stamp, 0 when absent
    pub stamp_offset: u32,

    /// Offset of the scan line table, 0 when absent
    pub scan_line_offset: u32,

    #[br(map = |raw: u8| AlphaAttribute::from(raw))]
    #[bw(map = |attribute: &AlphaAttribute| u8::from(*attribute))]
    pub alpha_attribute: AlphaAttribute,
}

impl ExtensionArea {
    /// Whether the stored size matches the version 2.0 layout
    pub fn is_version_2(&self) -> bool {
        self.ext_size == EXT_SIZE_20
    }

    /// Copy of the area as it is written by this library
    pub(crate) fn normalized(&self) -> Self {
        let mut area = self.clone();
        area.ext_size = EXT_SIZE_20;
        if area.version_letter == 0 {
            area.version_letter = b' ';
        }
        area
    }
}
