//! Netpbm writer: PPM (P3 / P6) for colour images, PGM (P2 / P5) for grey.
//!
//! Alpha channels are dropped and palette indices are expanded through
//! the palette. Binary output stores samples as one byte when the max
//! value fits, otherwise as big-endian pairs.

use std::io::{self, Write};

use smol_png::{ColourType, DecodedImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PnmEncoding {
    /// P2 / P3: decimal samples.
    Ascii,
    /// P5 / P6: raw samples.
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PnmKind {
    Graymap,
    Pixmap,
}

impl PnmKind {
    pub fn for_image(image: &DecodedImage) -> Self {
        match image.colour_type {
            ColourType::Greyscale | ColourType::GreyAlpha => PnmKind::Graymap,
            ColourType::Rgb | ColourType::Rgba | ColourType::Palette => PnmKind::Pixmap,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            PnmKind::Graymap => "pgm",
            PnmKind::Pixmap => "ppm",
        }
    }

    pub fn magic(self, encoding: PnmEncoding) -> &'static str {
        match (self, encoding) {
            (PnmKind::Graymap, PnmEncoding::Ascii) => "P2",
            (PnmKind::Pixmap, PnmEncoding::Ascii) => "P3",
            (PnmKind::Graymap, PnmEncoding::Binary) => "P5",
            (PnmKind::Pixmap, PnmEncoding::Binary) => "P6",
        }
    }

    fn samples_per_pixel(self) -> usize {
        match self {
            PnmKind::Graymap => 1,
            PnmKind::Pixmap => 3,
        }
    }
}

/// Max sample value written in the header; palette entries are 8-bit.
pub fn max_value(image: &DecodedImage) -> u16 {
    match image.colour_type {
        ColourType::Palette => 255,
        _ => image.max_value(),
    }
}

// output samples of pixel `p`: grey, or RGB; alpha skipped
fn pixel(image: &DecodedImage, p: usize, out: &mut [u16; 3]) -> io::Result<usize> {
    let channels = image.channels() as usize;
    let base = p * channels;
    let sample = |i: usize| {
        image
            .sample(base + i)
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "pnm: sample grid too short"))
    };
    match image.colour_type {
        ColourType::Greyscale | ColourType::GreyAlpha => {
            out[0] = sample(0)?;
            Ok(1)
        }
        ColourType::Rgb | ColourType::Rgba => {
            for (i, slot) in out.iter_mut().enumerate() {
                *slot = sample(i)?;
            }
            Ok(3)
        }
        ColourType::Palette => {
            let index = sample(0)? as u8;
            let rgb = image
                .palette
                .as_ref()
                .and_then(|pal| pal.get(index))
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("pnm: palette index {index} out of range"),
                    )
                })?;
            *out = [rgb.r as u16, rgb.g as u16, rgb.b as u16];
            Ok(3)
        }
    }
}

pub fn write_pnm<W: Write>(image: &DecodedImage, encoding: PnmEncoding, out: &mut W) -> io::Result<()> {
    let kind = PnmKind::for_image(image);
    let maxval = max_value(image);
    writeln!(out, "{}", kind.magic(encoding))?;
    writeln!(out, "{} {}", image.width, image.height)?;
    writeln!(out, "{maxval}")?;

    let width = image.width as usize;
    let mut px = [0u16; 3];
    let mut line = String::new();
    for y in 0..image.height as usize {
        line.clear();
        for x in 0..width {
            let n = pixel(image, y * width + x, &mut px)?;
            debug_assert_eq!(n, kind.samples_per_pixel());
            for &v in &px[..n] {
                match encoding {
                    PnmEncoding::Ascii => {
                        if !line.is_empty() {
                            line.push(' ');
                        }
                        line.push_str(&v.to_string());
                    }
                    PnmEncoding::Binary if maxval < 256 => out.write_all(&[v as u8])?,
                    PnmEncoding::Binary => out.write_all(&v.to_be_bytes())?,
                }
            }
        }
        if encoding == PnmEncoding::Ascii {
            writeln!(out, "{line}")?;
        }
    }
    out.flush()
}
