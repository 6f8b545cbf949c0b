//! Scanline reconstruction: undo the per-row filters.
//!
//! The inflated stream is `height` rows of `1 + row_bytes` bytes; the
//! first byte of each row names the filter that was applied before
//! compression. Rows are reconstructed strictly top to bottom since Up,
//! Average and Paeth read the previous row's reconstructed bytes. The
//! "left" neighbour is the same byte of the previous pixel, `bpp` bytes
//! back; before the first pixel and above the first row it is zero.

use alloc::vec;
use alloc::vec::Vec;

use crate::chunk::Header;
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FilterType {
    None = 0,
    Sub = 1,
    Up = 2,
    Average = 3,
    Paeth = 4,
}

impl TryFrom<u8> for FilterType {
    type Error = u8;

    fn try_from(v: u8) -> Result<Self, u8> {
        match v {
            0 => Ok(FilterType::None),
            1 => Ok(FilterType::Sub),
            2 => Ok(FilterType::Up),
            3 => Ok(FilterType::Average),
            4 => Ok(FilterType::Paeth),
            other => Err(other),
        }
    }
}

/// Geometry of the filtered scanline buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanlineLayout {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub bit_depth: u8,
}

impl ScanlineLayout {
    pub fn from_header(header: &Header) -> Self {
        Self {
            width: header.width,
            height: header.height,
            channels: header.channels(),
            bit_depth: header.bit_depth,
        }
    }

    // 1 for 8-bit, 2 for 16-bit
    pub fn bytes_per_sample(&self) -> usize {
        (self.bit_depth as usize).div_ceil(8)
    }

    /// Filter stride: bytes per complete pixel.
    pub fn bytes_per_pixel(&self) -> usize {
        (self.channels as usize * self.bytes_per_sample()).max(1)
    }

    /// Bytes of one reconstructed row (without the filter byte).
    /// `None` when the size does not fit in `usize`; likewise below.
    pub fn row_bytes(&self) -> Option<usize> {
        usize::try_from(self.width)
            .ok()?
            .checked_mul(self.bytes_per_pixel())
    }

    /// Length the inflated stream must have.
    pub fn filtered_len(&self) -> Option<usize> {
        self.row_bytes()?
            .checked_add(1)?
            .checked_mul(usize::try_from(self.height).ok()?)
    }

    /// Length of the reconstructed sample grid.
    pub fn output_len(&self) -> Option<usize> {
        self.row_bytes()?
            .checked_mul(usize::try_from(self.height).ok()?)
    }

    // limit is the largest pixel count whose scanline buffer fits in usize
    pub(crate) fn too_large(&self) -> Error {
        Error::ImageTooLarge {
            pixels: self.width as u64 * self.height as u64,
            limit: (usize::MAX / (1 + self.bytes_per_pixel())) as u64,
        }
    }
}

/// Reverse the filters of every row, returning the flat sample grid
/// (row-major, channel-interleaved, 16-bit samples big-endian).
pub fn reconstruct(data: &[u8], layout: ScanlineLayout) -> Result<Vec<u8>, Error> {
    if !matches!(layout.bit_depth, 8 | 16) {
        return Err(Error::UnsupportedBitDepth {
            bit_depth: layout.bit_depth,
        });
    }
    let expected = layout.filtered_len().ok_or_else(|| layout.too_large())?;
    if data.len() != expected {
        return Err(Error::LengthMismatch {
            expected,
            actual: data.len(),
        });
    }

    let row_bytes = layout.row_bytes().ok_or_else(|| layout.too_large())?;
    let output_len = layout.output_len().ok_or_else(|| layout.too_large())?;
    let bpp = layout.bytes_per_pixel();

    let mut output = Vec::new();
    output
        .try_reserve_exact(output_len)
        .map_err(|_| Error::OutOfMemory { what: "sample grid" })?;

    // row 0 reads an all-zero previous row
    let zero_row = vec![0u8; row_bytes];
    for (y, filtered) in data.chunks_exact(1 + row_bytes).enumerate() {
        let filter = FilterType::try_from(filtered[0])
            .map_err(|filter| Error::UnknownFilterType { row: y, filter })?;

        let start = output.len();
        output.extend_from_slice(&filtered[1..]);
        let (done, row) = output.split_at_mut(start);
        let prev = if y == 0 {
            &zero_row[..]
        } else {
            &done[start - row_bytes..]
        };
        unfilter_row(filter, row, prev, bpp);
    }

    Ok(output)
}

/// Reconstruct one scanline in place given the previous reconstructed row.
pub fn unfilter_row(filter: FilterType, row: &mut [u8], prev: &[u8], bpp: usize) {
    let len = row.len();
    match filter {
        FilterType::None => {}
        FilterType::Sub => {
            for i in bpp..len {
                row[i] = row[i].wrapping_add(row[i - bpp]);
            }
        }
        FilterType::Up => {
            for i in 0..len {
                row[i] = row[i].wrapping_add(prev[i]);
            }
        }
        FilterType::Average => {
            for i in 0..len {
                let a = if i >= bpp { row[i - bpp] as u16 } else { 0 };
                let b = prev[i] as u16;
                row[i] = row[i].wrapping_add(((a + b) / 2) as u8);
            }
        }
        FilterType::Paeth => {
            for i in 0..len {
                let a = if i >= bpp { row[i - bpp] } else { 0 };
                let b = prev[i];
                let c = if i >= bpp { prev[i - bpp] } else { 0 };
                row[i] = row[i].wrapping_add(paeth(a, b, c));
            }
        }
    }
}

// a = left, b = up, c = upper-left
#[inline]
pub fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let a = a as i16;
    let b = b as i16;
    let c = c as i16;
    let p = a + b - c;
    let pa = (p - a).unsigned_abs();
    let pb = (p - b).unsigned_abs();
    let pc = (p - c).unsigned_abs();
    if pa <= pb && pa <= pc {
        a as u8
    } else if pb <= pc {
        b as u8
    } else {
        c as u8
    }
}
