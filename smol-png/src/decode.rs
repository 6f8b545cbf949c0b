//! Whole-file decode: parse -> reassemble -> inflate -> reconstruct.

use alloc::vec::Vec;

use crate::chunk::{ColourType, Header, Palette};
use crate::document::parse_with;
use crate::error::Error;
use crate::scanline::{ScanlineLayout, reconstruct};
use crate::zlib::{Inflate, Miniz, reassemble};

// max total pixels we are willing to decode (memory guard)
pub const MAX_PIXELS: u64 = 16_384 * 16_384;

/// Decoder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Check every chunk's CRC-32 while parsing.
    pub verify_crc: bool,
    /// Refuse images with more pixels than this.
    pub max_pixels: u64,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            verify_crc: false,
            max_pixels: MAX_PIXELS,
        }
    }
}

/// Reconstructed samples plus what a writer needs to interpret them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub colour_type: ColourType,
    /// Only for [`ColourType::Palette`] images.
    pub palette: Option<Palette>,
    /// Row-major, channel-interleaved; 16-bit samples are big-endian pairs.
    pub data: Vec<u8>,
}

impl DecodedImage {
    pub fn channels(&self) -> u8 {
        self.colour_type.channels()
    }

    pub fn bytes_per_sample(&self) -> usize {
        (self.bit_depth as usize).div_ceil(8)
    }

    /// Largest value a sample can take.
    pub fn max_value(&self) -> u16 {
        ((1u32 << self.bit_depth) - 1) as u16
    }

    pub fn sample_count(&self) -> usize {
        self.data.len() / self.bytes_per_sample()
    }

    /// Sample `i` in row-major, channel-interleaved order.
    pub fn sample(&self, i: usize) -> Option<u16> {
        match self.bytes_per_sample() {
            2 => {
                let b = self.data.get(i * 2..i * 2 + 2)?;
                Some(u16::from_be_bytes([b[0], b[1]]))
            }
            _ => self.data.get(i).map(|&v| v as u16),
        }
    }
}

/// Decode with default options and the `miniz_oxide` codec.
pub fn decode(data: &[u8]) -> Result<DecodedImage, Error> {
    decode_with(data, &DecodeOptions::default(), &Miniz)
}

pub fn decode_with<C: Inflate + ?Sized>(
    data: &[u8],
    options: &DecodeOptions,
    codec: &C,
) -> Result<DecodedImage, Error> {
    let doc = parse_with(data, options)?;
    let header = *doc.header();
    check_supported(&header, options)?;

    let palette = match header.colour_type {
        ColourType::Palette => Some(doc.palette().cloned().ok_or(Error::MissingPalette)?),
        _ => None,
    };

    log::info!(
        "png: decoding {}x{} {:?} {}-bit, {} IDAT chunk(s)",
        header.width,
        header.height,
        header.colour_type,
        header.bit_depth,
        doc.payload().len()
    );

    let stream = reassemble(doc.payload().iter().map(|c| c.data))?;
    log::debug!(
        "png: zlib method {} window {} level {} dict {} body {} bytes adler {:08X}",
        stream.compression_method(),
        stream.window_size(),
        stream.level(),
        stream.has_preset_dict(),
        stream.body().len(),
        stream.checksum()
    );
    if let Some((bfinal, btype)) = stream.first_block() {
        log::trace!("png: first DEFLATE block BFINAL={} BTYPE={}", bfinal, btype);
    }

    let layout = ScanlineLayout::from_header(&header);
    // one byte of headroom so an over-long stream reports LengthMismatch
    let limit = layout
        .filtered_len()
        .and_then(|n| n.checked_add(1))
        .ok_or_else(|| layout.too_large())?;
    let scanlines = codec.inflate(stream.as_bytes(), limit)?;
    let samples = reconstruct(&scanlines, layout)?;

    Ok(DecodedImage {
        width: header.width,
        height: header.height,
        bit_depth: header.bit_depth,
        colour_type: header.colour_type,
        palette,
        data: samples,
    })
}

fn check_supported(header: &Header, options: &DecodeOptions) -> Result<(), Error> {
    if header.is_interlaced() {
        return Err(Error::UnsupportedInterlace);
    }
    if header.bit_depth < 8 {
        return Err(Error::UnsupportedBitDepth {
            bit_depth: header.bit_depth,
        });
    }
    if header.pixels() > options.max_pixels {
        return Err(Error::ImageTooLarge {
            pixels: header.pixels(),
            limit: options.max_pixels,
        });
    }
    Ok(())
}
