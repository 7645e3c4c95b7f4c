//! Run-length packet codec used by image types 9, 10 and 11.
//!
//! Compressed image data is a sequence of packets, each starting with a control byte:
//!
//! | Control byte  | Packet | Pixels               | Followed by            |
//! |---------------|--------|----------------------|------------------------|
//! | `0x00..=0x7F` | raw    | `control + 1`        | that many pixels       |
//! | `0x80..=0xFF` | repeat | `(control & 0x7F)+1` | one pixel, repeated    |
//!
//! A packet never holds more than 128 pixels. Packets are allowed to cross row
//! boundaries, so [`RleDecoder`] keeps the unfinished part of a packet between calls.

use std::io::{self, Read};

use tracing::instrument;

use crate::error::{Error, Result};

/// Largest number of pixels a single packet can describe
pub const MAX_PACKET_PIXELS: usize = 128;

const REPEAT_FLAG: u8 = 0x80;

fn check_bpp(bpp: usize) -> Result<()> {
    match bpp {
        1..=4 => Ok(()),
        _ => Err(Error::InvalidBytesPerPixel(bpp)),
    }
}

/// Encode a row of pixels into packets
///
/// `pixels` must hold a whole number of `bpp` byte pixels.
pub fn encode_row(pixels: &[u8], bpp: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(pixels.len() + pixels.len() / MAX_PACKET_PIXELS + 1);
    encode_row_into(pixels, bpp, &mut out)?;
    Ok(out)
}

/// Append the packets for a row of pixels to `out`, returning the number of bytes added
pub fn encode_row_into(pixels: &[u8], bpp: usize, out: &mut Vec<u8>) -> Result<usize> {
    check_bpp(bpp)?;
    if pixels.len() % bpp != 0 {
        return Err(Error::PixelBufferLength {
            len: pixels.len(),
            bpp,
        });
    }

    let start = out.len();
    let row: Vec<&[u8]> = pixels.chunks_exact(bpp).collect();
    let mut cursor = 0;

    while cursor < row.len() {
        let diff = count_diff_pixels(&row[cursor..]);
        if diff > 0 {
            out.push((diff - 1) as u8);
            for pixel in &row[cursor..cursor + diff] {
                out.extend_from_slice(pixel);
            }
            cursor += diff;
        }

        let mut same = count_same_pixels(&row[cursor..]);
        if same > 1 {
            let pixel = row[cursor];
            while same > 0 {
                let chunk = same.min(MAX_PACKET_PIXELS);
                out.push((chunk - 1) as u8 | REPEAT_FLAG);
                out.extend_from_slice(pixel);
                cursor += chunk;
                same -= chunk;
            }
        }
    }

    Ok(out.len() - start)
}

/// Pixels before the next pair of equal neighbours, at most one packet's worth
fn count_diff_pixels(row: &[&[u8]]) -> usize {
    let limit = row.len().min(MAX_PACKET_PIXELS);
    row.windows(2)
        .take(limit)
        .position(|pair| pair[0] == pair[1])
        .unwrap_or(limit)
        .min(limit)
}

/// Length of the run of identical pixels at the start of the row
fn count_same_pixels(row: &[&[u8]]) -> usize {
    match row.first() {
        Some(first) => row.iter().take_while(|pixel| *pixel == first).count(),
        None => 0,
    }
}

/// Progress through the packet being decoded
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum PacketState {
    /// The next byte of input is a control byte
    #[default]
    Idle,

    /// Inside a raw packet, `remaining` literal bytes are left to copy
    Raw { remaining: usize },

    /// Inside a repeat packet
    Repeat {
        /// The repeated pixel, only the first `bpp` bytes are used
        pixel: [u8; 4],

        /// Bytes left to produce
        remaining: usize,

        /// Bytes produced so far, so a pixel split across calls resumes at the right byte
        emitted: usize,
    },
}

/// Resumable decoder for a stream of packets
///
/// Each call fills exactly the requested number of bytes. A packet that does not fit is
/// kept in [`RleDecoder::state`] and finished by the next call, so rows can be decoded
/// one at a time even when packets span them.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RleDecoder {
    bpp: usize,
    state: PacketState,
}

impl RleDecoder {
    pub fn new(bpp: usize) -> Result<Self> {
        check_bpp(bpp)?;
        Ok(Self {
            bpp,
            state: PacketState::Idle,
        })
    }

    /// Continue from a state saved by an earlier decoder
    pub fn with_state(mut self, state: PacketState) -> Self {
        self.state = state;
        self
    }

    pub fn state(&self) -> PacketState {
        self.state
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.bpp
    }

    /// Fill `out` with decoded bytes
    ///
    /// Input is read only as far as needed: once `out` is full no further control byte is
    /// consumed. Running out of input mid-packet fails with [`Error::DecodeTruncated`].
    pub fn decode_into<R: Read>(&mut self, reader: &mut R, out: &mut [u8]) -> Result<()> {
        let mut filled = 0;

        while filled < out.len() {
            let wanted = out.len() - filled;

            self.state = match self.state {
                PacketState::Idle => self.read_control(reader)?,
                PacketState::Raw { remaining } => {
                    let take = remaining.min(wanted);
                    reader
                        .read_exact(&mut out[filled..filled + take])
                        .map_err(Error::from_rle_read)?;
                    filled += take;

                    match remaining - take {
                        0 => PacketState::Idle,
                        remaining => PacketState::Raw { remaining },
                    }
                }
                PacketState::Repeat {
                    pixel,
                    remaining,
                    emitted,
                } => {
                    let take = remaining.min(wanted);
                    for (i, byte) in out[filled..filled + take].iter_mut().enumerate() {
                        *byte = pixel[(emitted + i) % self.bpp];
                    }
                    filled += take;

                    match remaining - take {
                        0 => PacketState::Idle,
                        remaining => PacketState::Repeat {
                            pixel,
                            remaining,
                            emitted: emitted + take,
                        },
                    }
                }
            };
        }

        Ok(())
    }

    /// Decode the next `len` bytes into a new buffer
    pub fn decode_row<R: Read>(&mut self, reader: &mut R, len: usize) -> Result<Vec<u8>> {
        let mut out = vec![0; len];
        self.decode_into(reader, &mut out)?;
        Ok(out)
    }

    fn read_control<R: Read>(&self, reader: &mut R) -> Result<PacketState> {
        let mut control = [0u8];
        reader
            .read_exact(&mut control)
            .map_err(Error::from_rle_read)?;
        let count = (control[0] & !REPEAT_FLAG) as usize + 1;

        if control[0] & REPEAT_FLAG == 0 {
            return Ok(PacketState::Raw {
                remaining: count * self.bpp,
            });
        }

        let mut pixel = [0u8; 4];
        reader
            .read_exact(&mut pixel[..self.bpp])
            .map_err(Error::from_rle_read)?;
        Ok(PacketState::Repeat {
            pixel,
            remaining: count * self.bpp,
            emitted: 0,
        })
    }
}

/// Decode `len` bytes starting at a packet boundary
pub fn decode_row<R: Read>(reader: &mut R, len: usize, bpp: usize) -> Result<Vec<u8>> {
    RleDecoder::new(bpp)?.decode_row(reader, len)
}

/// Walk the packets of a `width` by `height` image and return their encoded size
///
/// The reader is left just past the last packet. Packets are counted whole, as a
/// writer would have emitted them.
#[instrument(skip(reader), err)]
pub fn count_encoded_bytes<R: Read>(
    reader: &mut R,
    width: u16,
    height: u16,
    bpp: usize,
) -> Result<u64> {
    check_bpp(bpp)?;

    let total_pixels = width as u64 * height as u64;
    let mut pixels = 0u64;
    let mut bytes = 0u64;

    while pixels < total_pixels {
        let mut control = [0u8];
        reader
            .read_exact(&mut control)
            .map_err(Error::from_rle_read)?;
        let count = (control[0] & !REPEAT_FLAG) as u64 + 1;

        let literal = if control[0] & REPEAT_FLAG == 0 {
            count * bpp as u64
        } else {
            bpp as u64
        };

        let skipped = io::copy(&mut reader.by_ref().take(literal), &mut io::sink())?;
        if skipped != literal {
            return Err(Error::DecodeTruncated);
        }

        bytes += 1 + literal;
        pixels += count;
    }

    Ok(bytes)
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use crate::error::{Error, Result};
    use crate::rle::{
        count_encoded_bytes, decode_row, encode_row, PacketState, RleDecoder, MAX_PACKET_PIXELS,
    };

    /// Small deterministic generator so the round trips cover irregular data
    fn pseudo_random(seed: u32, len: usize, spread: u32) -> Vec<u8> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                ((state >> 16) % spread) as u8
            })
            .collect()
    }

    /// Splits a packet stream into (control, literal bytes) pairs
    fn packets(encoded: &[u8], bpp: usize) -> Vec<(u8, usize)> {
        let mut packets = Vec::new();
        let mut i = 0;
        while i < encoded.len() {
            let control = encoded[i];
            let literal = if control & 0x80 == 0 {
                (control as usize + 1) * bpp
            } else {
                bpp
            };
            packets.push((control, literal));
            i += 1 + literal;
        }
        packets
    }

    #[test]
    fn identical_pixels_make_one_repeat_packet() -> Result<()> {
        let pixel = [0x11, 0x22, 0x33];
        let pixels = pixel.repeat(5);

        let encoded = encode_row(&pixels, 3)?;
        assert_eq!(encoded, [0x84, 0x11, 0x22, 0x33]);

        let decoded = decode_row(&mut Cursor::new(&encoded), 15, 3)?;
        assert_eq!(decoded, pixels);

        Ok(())
    }

    #[test]
    fn raw_and_repeat_interleave() -> Result<()> {
        let (a, b) = (0x0A, 0x0B);
        let pixels = [a, a, b, b, b, a, a];

        let encoded = encode_row(&pixels, 1)?;
        assert_eq!(encoded, [0x81, a, 0x82, b, 0x81, a]);
        assert_eq!(decode_row(&mut Cursor::new(&encoded), 7, 1)?, pixels);

        let pixels = [1, 2, 3, 3, 3, 4];
        let encoded = encode_row(&pixels, 1)?;
        assert_eq!(encoded, [0x01, 1, 2, 0x82, 3, 0x00, 4]);

        Ok(())
    }

    #[test]
    fn long_distinct_run_splits_raw_packets() -> Result<()> {
        let pixels: Vec<u8> = (0..300u32)
            .flat_map(|i| [(i >> 8) as u8, i as u8])
            .collect();

        let encoded = encode_row(&pixels, 2)?;
        let controls: Vec<u8> = packets(&encoded, 2).iter().map(|p| p.0).collect();
        assert_eq!(controls, [0x7F, 0x7F, 0x2B]);
        assert_eq!(decode_row(&mut Cursor::new(&encoded), 600, 2)?, pixels);

        Ok(())
    }

    #[test]
    fn long_identical_run_splits_repeat_packets() -> Result<()> {
        let encoded = encode_row(&[7; 300], 1)?;
        assert_eq!(encoded, [0xFF, 7, 0xFF, 7, 0xAB, 7]);

        let encoded = encode_row(&[7; 129], 1)?;
        assert_eq!(encoded, [0xFF, 7, 0x80, 7]);

        let encoded = encode_row(&[7; 128], 1)?;
        assert_eq!(encoded, [0xFF, 7]);

        Ok(())
    }

    #[test]
    fn empty_and_single_pixel_rows() -> Result<()> {
        assert_eq!(encode_row(&[], 3)?, Vec::<u8>::new());
        assert_eq!(encode_row(&[1, 2, 3], 3)?, [0x00, 1, 2, 3]);

        Ok(())
    }

    #[test]
    fn rejects_bad_pixel_sizes() {
        assert!(matches!(
            encode_row(&[0; 5], 0),
            Err(Error::InvalidBytesPerPixel(0))
        ));
        assert!(matches!(
            encode_row(&[0; 5], 2),
            Err(Error::PixelBufferLength { len: 5, bpp: 2 })
        ));
        assert!(matches!(
            RleDecoder::new(5),
            Err(Error::InvalidBytesPerPixel(5))
        ));
    }

    #[test]
    fn round_trips() -> Result<()> {
        for bpp in 1..=4 {
            let cases = [(1, 0, 2), (2, 1, 2), (3, 997, 2), (4, 4096, 4), (5, 10_000, 256)];
            for (seed, len, spread) in cases {
                let pixels = pseudo_random(seed * bpp as u32, len * bpp, spread);
                let encoded = encode_row(&pixels, bpp)?;

                let described: usize = packets(&encoded, bpp)
                    .iter()
                    .map(|(control, _)| (control & 0x7F) as usize + 1)
                    .sum();
                assert_eq!(described, len);

                let decoded = decode_row(&mut Cursor::new(&encoded), pixels.len(), bpp)?;
                assert_eq!(decoded, pixels, "bpp {bpp}, {len} pixels");
            }

            for len in [1usize, 128, 129, 300, 10_000] {
                let pixels: Vec<u8> = (0..len).flat_map(|_| (1..=bpp as u8).rev()).collect();
                let encoded = encode_row(&pixels, bpp)?;
                assert_eq!(packets(&encoded, bpp).len(), len.div_ceil(MAX_PACKET_PIXELS));

                let decoded = decode_row(&mut Cursor::new(&encoded), pixels.len(), bpp)?;
                assert_eq!(decoded, pixels, "bpp {bpp}, {len} identical pixels");
            }

            let alternating: Vec<u8> = (0..500).flat_map(|i| vec![(i % 2) as u8; bpp]).collect();
            let encoded = encode_row(&alternating, bpp)?;
            assert_eq!(
                decode_row(&mut Cursor::new(&encoded), alternating.len(), bpp)?,
                alternating
            );
        }

        Ok(())
    }

    #[test]
    fn repeat_packet_spans_rows() -> Result<()> {
        // 10 pixels of 3 bytes decoded as rows of 4 pixels
        let encoded = [0x89, 1, 2, 3];
        let mut input = Cursor::new(&encoded);
        let mut decoder = RleDecoder::new(3)?;

        assert_eq!(decoder.decode_row(&mut input, 12)?, [1, 2, 3].repeat(4));
        assert_eq!(
            decoder.state(),
            PacketState::Repeat {
                pixel: [1, 2, 3, 0],
                remaining: 18,
                emitted: 12
            }
        );
        assert_eq!(decoder.decode_row(&mut input, 12)?, [1, 2, 3].repeat(4));
        assert_eq!(decoder.decode_row(&mut input, 6)?, [1, 2, 3].repeat(2));
        assert_eq!(decoder.state(), PacketState::Idle);
        assert_eq!(input.position(), 4);

        Ok(())
    }

    #[test]
    fn partial_pixels_resume_mid_pixel() -> Result<()> {
        #[rustfmt::skip]
        let encoded = [
            0x81, 1, 2, 3,
            0x01, 4, 5, 6, 7, 8, 9,
        ];
        let expected = [1, 2, 3, 1, 2, 3, 4, 5, 6, 7, 8, 9];

        let mut input = Cursor::new(&encoded);
        let mut decoder = RleDecoder::new(3)?;
        let mut actual = Vec::new();
        for len in [4, 1, 5, 2] {
            actual.extend(decoder.decode_row(&mut input, len)?);
        }

        assert_eq!(actual, expected);
        assert_eq!(decoder.state(), PacketState::Idle);

        Ok(())
    }

    #[test]
    fn saved_state_resumes_in_new_decoder() -> Result<()> {
        let encoded = [0x03, 1, 2, 3, 4];
        let mut input = Cursor::new(&encoded);

        let mut first = RleDecoder::new(1)?;
        assert_eq!(first.decode_row(&mut input, 1)?, [1]);
        assert_eq!(first.state(), PacketState::Raw { remaining: 3 });

        let mut second = RleDecoder::new(1)?.with_state(first.state());
        assert_eq!(second.decode_row(&mut input, 3)?, [2, 3, 4]);

        Ok(())
    }

    #[test]
    fn does_not_read_past_the_budget() -> Result<()> {
        let encoded = [0x81, 9, 0xFF];
        let mut input = Cursor::new(&encoded);

        assert_eq!(decode_row(&mut input, 2, 1)?, [9, 9]);
        assert_eq!(input.position(), 2);

        Ok(())
    }

    #[test]
    fn truncated_input() -> Result<()> {
        let truncated_raw = [0x05, 1, 2];
        assert!(matches!(
            decode_row(&mut Cursor::new(&truncated_raw), 6, 1),
            Err(Error::DecodeTruncated)
        ));

        let truncated_repeat = [0x85, 1];
        assert!(matches!(
            decode_row(&mut Cursor::new(&truncated_repeat), 6, 2),
            Err(Error::DecodeTruncated)
        ));

        let missing_packet = [0x81, 1];
        assert!(matches!(
            decode_row(&mut Cursor::new(&missing_packet), 3, 1),
            Err(Error::DecodeTruncated)
        ));

        Ok(())
    }

    #[test]
    fn counts_encoded_bytes() -> Result<()> {
        let pixels = pseudo_random(42, 8 * 3 * 5, 3);
        let mut encoded = Vec::new();
        for row in pixels.chunks(8 * 3) {
            encoded.extend(encode_row(row, 3)?);
        }
        let expected = encoded.len() as u64;
        encoded.extend_from_slice(b"trailing");

        let mut input = Cursor::new(&encoded);
        assert_eq!(count_encoded_bytes(&mut input, 8, 5, 3)?, expected);
        assert_eq!(input.position(), expected);

        let truncated = &encoded[..expected as usize - 1];
        assert!(matches!(
            count_encoded_bytes(&mut Cursor::new(truncated), 8, 5, 3),
            Err(Error::DecodeTruncated)
        ));

        Ok(())
    }
}
