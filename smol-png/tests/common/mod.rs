// PNG fixture builders shared by the integration tests.

#![allow(dead_code)]

use miniz_oxide::deflate::compress_to_vec_zlib;
use smol_png::PNG_SIG;
use smol_png::bits::crc32;

pub fn push_chunk(out: &mut Vec<u8>, tag: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(tag);
    out.extend_from_slice(data);
    out.extend_from_slice(&crc32(&[&tag[..], data]).to_be_bytes());
}

pub fn ihdr(width: u32, height: u32, bit_depth: u8, colour_type: u8) -> Vec<u8> {
    let mut d = Vec::with_capacity(13);
    d.extend_from_slice(&width.to_be_bytes());
    d.extend_from_slice(&height.to_be_bytes());
    d.extend_from_slice(&[bit_depth, colour_type, 0, 0, 0]);
    d
}

/// Prefix every row of `raw` with filter byte `filter` (no actual filtering).
pub fn with_filter_bytes(raw: &[u8], row_bytes: usize, filter: u8) -> Vec<u8> {
    raw.chunks(row_bytes)
        .flat_map(|row| std::iter::once(filter).chain(row.iter().copied()))
        .collect()
}

/// Apply the Sub filter to one row.
pub fn sub_filter(row: &[u8], bpp: usize) -> Vec<u8> {
    (0..row.len())
        .map(|i| {
            let left = if i >= bpp { row[i - bpp] } else { 0 };
            row[i].wrapping_sub(left)
        })
        .collect()
}

/// Build a PNG whose zlib stream is split into `idat_parts` IDAT chunks.
pub fn build_png(header: &[u8], plte: Option<&[u8]>, scanlines: &[u8], idat_parts: usize) -> Vec<u8> {
    let z = compress_to_vec_zlib(scanlines, 6);
    let mut png = PNG_SIG.to_vec();
    push_chunk(&mut png, b"IHDR", header);
    if let Some(p) = plte {
        push_chunk(&mut png, b"PLTE", p);
    }
    let step = z.len().div_ceil(idat_parts.max(1));
    for part in z.chunks(step) {
        push_chunk(&mut png, b"IDAT", part);
    }
    push_chunk(&mut png, b"IEND", &[]);
    png
}
