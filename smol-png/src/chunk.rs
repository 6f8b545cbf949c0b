//! PNG chunk model and the tag -> variant registry.
//!
//! A [`Chunk`] is the raw framing (`length`, tag, data, CRC) borrowed
//! from the input buffer. A [`Record`] is the same chunk after
//! [`decode_record`] has dispatched on its tag: IHDR and PLTE get their
//! fields decoded, IDAT and IEND keep their bytes verbatim, and any other
//! tag is preserved as [`Record::Opaque`].

use alloc::vec::Vec;
use core::fmt;

use crate::bits::{be_u32, crc32};
use crate::error::Error;

/// IHDR payload is always 13 bytes.
pub const IHDR_LEN: usize = 13;

/// 256 RGB entries.
pub const MAX_PALETTE_ENTRIES: usize = 256;

/// A 4-byte chunk type code such as `IHDR`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkTag(pub [u8; 4]);

impl ChunkTag {
    pub const IHDR: ChunkTag = ChunkTag(*b"IHDR");
    pub const PLTE: ChunkTag = ChunkTag(*b"PLTE");
    pub const IDAT: ChunkTag = ChunkTag(*b"IDAT");
    pub const IEND: ChunkTag = ChunkTag(*b"IEND");

    /// Registered PNG type codes are ASCII letters; anything else is
    /// still framed and kept, but displayed as hex.
    pub fn is_valid(&self) -> bool {
        self.0.iter().all(u8::is_ascii_alphabetic)
    }

    /// Which record variant interprets this tag; critical tags match
    /// case-insensitively, everything else is opaque.
    pub fn kind(&self) -> ChunkKind {
        let t = &self.0;
        if t.eq_ignore_ascii_case(&Self::IHDR.0) {
            ChunkKind::Header
        } else if t.eq_ignore_ascii_case(&Self::PLTE.0) {
            ChunkKind::Palette
        } else if t.eq_ignore_ascii_case(&Self::IDAT.0) {
            ChunkKind::Payload
        } else if t.eq_ignore_ascii_case(&Self::IEND.0) {
            ChunkKind::Trailer
        } else {
            ChunkKind::Opaque
        }
    }
}

impl fmt::Display for ChunkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            for &b in &self.0 {
                write!(f, "{}", b as char)?;
            }
            Ok(())
        } else {
            write!(f, "{:02X?}", self.0)
        }
    }
}

impl fmt::Debug for ChunkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkTag({self})")
    }
}

/// Record variant selected by a chunk's tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    Header,
    Palette,
    Payload,
    Trailer,
    Opaque,
}

/// One chunk as framed in the file, borrowing its data from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Offset of the length field from the start of the file.
    pub offset: usize,
    pub length: u32,
    pub tag: ChunkTag,
    pub data: &'a [u8],
    /// CRC as stored in the file; not checked unless asked for.
    pub crc: u32,
}

impl Chunk<'_> {
    /// CRC-32 over tag + data.
    pub fn computed_crc(&self) -> u32 {
        crc32(&[&self.tag.0[..], self.data])
    }

    pub fn crc_matches(&self) -> bool {
        self.computed_crc() == self.crc
    }

    /// Bytes this chunk occupies in the file, framing included.
    pub fn framed_len(&self) -> usize {
        12 + self.data.len()
    }
}

/// PNG colour type (IHDR byte 9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ColourType {
    Greyscale = 0,
    Rgb = 2,
    Palette = 3,
    GreyAlpha = 4,
    Rgba = 6,
}

impl ColourType {
    /// Samples per pixel.
    pub const fn channels(self) -> u8 {
        match self {
            ColourType::Greyscale | ColourType::Palette => 1,
            ColourType::GreyAlpha => 2,
            ColourType::Rgb => 3,
            ColourType::Rgba => 4,
        }
    }

    pub const fn has_alpha(self) -> bool {
        matches!(self, ColourType::GreyAlpha | ColourType::Rgba)
    }

    /// Whether the format permits `bit_depth` for this colour type.
    pub const fn allows_depth(self, bit_depth: u8) -> bool {
        match self {
            ColourType::Greyscale => matches!(bit_depth, 1 | 2 | 4 | 8 | 16),
            ColourType::Palette => matches!(bit_depth, 1 | 2 | 4 | 8),
            ColourType::Rgb | ColourType::GreyAlpha | ColourType::Rgba => {
                matches!(bit_depth, 8 | 16)
            }
        }
    }
}

impl TryFrom<u8> for ColourType {
    type Error = Error;

    fn try_from(v: u8) -> Result<Self, Error> {
        match v {
            0 => Ok(ColourType::Greyscale),
            2 => Ok(ColourType::Rgb),
            3 => Ok(ColourType::Palette),
            4 => Ok(ColourType::GreyAlpha),
            6 => Ok(ColourType::Rgba),
            _ => Err(Error::InvalidHeader {
                field: "colour type",
                value: v as u32,
            }),
        }
    }
}

/// Decoded IHDR fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub colour_type: ColourType,
    pub compression_method: u8,
    pub filter_method: u8,
    pub interlace_method: u8,
}

impl Header {
    pub fn channels(&self) -> u8 {
        self.colour_type.channels()
    }

    pub fn is_interlaced(&self) -> bool {
        self.interlace_method == 1
    }

    pub fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Decode a 13-byte IHDR payload:
/// width u32, height u32, bit depth, colour type, compression, filter, interlace.
pub fn decode_header(data: &[u8]) -> Result<Header, Error> {
    if data.len() != IHDR_LEN {
        return Err(Error::MalformedHeader { length: data.len() });
    }
    let width = be_u32(data, 0).ok_or(Error::MalformedHeader { length: data.len() })?;
    let height = be_u32(data, 4).ok_or(Error::MalformedHeader { length: data.len() })?;

    if width == 0 || width > i32::MAX as u32 {
        return Err(Error::InvalidHeader {
            field: "width",
            value: width,
        });
    }
    if height == 0 || height > i32::MAX as u32 {
        return Err(Error::InvalidHeader {
            field: "height",
            value: height,
        });
    }

    let bit_depth = data[8];
    let colour_type = ColourType::try_from(data[9])?;
    if !colour_type.allows_depth(bit_depth) {
        return Err(Error::InvalidHeader {
            field: "bit depth",
            value: bit_depth as u32,
        });
    }

    let header = Header {
        width,
        height,
        bit_depth,
        colour_type,
        compression_method: data[10],
        filter_method: data[11],
        interlace_method: data[12],
    };
    if header.compression_method != 0 {
        return Err(Error::InvalidHeader {
            field: "compression method",
            value: header.compression_method as u32,
        });
    }
    if header.filter_method != 0 {
        return Err(Error::InvalidHeader {
            field: "filter method",
            value: header.filter_method as u32,
        });
    }
    if header.interlace_method > 1 {
        return Err(Error::InvalidHeader {
            field: "interlace method",
            value: header.interlace_method as u32,
        });
    }
    Ok(header)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Decoded PLTE entries, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub entries: Vec<Rgb>,
}

impl Palette {
    pub fn get(&self, index: u8) -> Option<Rgb> {
        self.entries.get(index as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Decode a PLTE payload into RGB triples; up to 768 bytes.
pub fn decode_palette(data: &[u8]) -> Result<Palette, Error> {
    if data.len() % 3 != 0 || data.len() > MAX_PALETTE_ENTRIES * 3 {
        return Err(Error::MalformedPalette { length: data.len() });
    }
    let mut entries = Vec::new();
    entries
        .try_reserve_exact(data.len() / 3)
        .map_err(|_| Error::OutOfMemory { what: "PLTE" })?;
    entries.extend(
        data.chunks_exact(3)
            .map(|c| Rgb { r: c[0], g: c[1], b: c[2] }),
    );
    Ok(Palette { entries })
}

/// A chunk after tag dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record<'a> {
    Header { chunk: Chunk<'a>, header: Header },
    Palette { chunk: Chunk<'a>, palette: Palette },
    Payload(Chunk<'a>),
    Trailer(Chunk<'a>),
    Opaque(Chunk<'a>),
}

impl<'a> Record<'a> {
    pub fn chunk(&self) -> &Chunk<'a> {
        match self {
            Record::Header { chunk, .. }
            | Record::Palette { chunk, .. }
            | Record::Payload(chunk)
            | Record::Trailer(chunk)
            | Record::Opaque(chunk) => chunk,
        }
    }

    pub fn kind(&self) -> ChunkKind {
        match self {
            Record::Header { .. } => ChunkKind::Header,
            Record::Palette { .. } => ChunkKind::Palette,
            Record::Payload(_) => ChunkKind::Payload,
            Record::Trailer(_) => ChunkKind::Trailer,
            Record::Opaque(_) => ChunkKind::Opaque,
        }
    }
}

/// Dispatch a framed chunk to the decoder for its tag.
pub fn decode_record(chunk: Chunk<'_>) -> Result<Record<'_>, Error> {
    Ok(match chunk.tag.kind() {
        ChunkKind::Header => Record::Header {
            header: decode_header(chunk.data)?,
            chunk,
        },
        ChunkKind::Palette => Record::Palette {
            palette: decode_palette(chunk.data)?,
            chunk,
        },
        ChunkKind::Payload => Record::Payload(chunk),
        ChunkKind::Trailer => {
            if !chunk.data.is_empty() {
                log::warn!("png: IEND carries {} data bytes", chunk.data.len());
            }
            Record::Trailer(chunk)
        }
        ChunkKind::Opaque => Record::Opaque(chunk),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    fn ihdr(width: u32, height: u32, depth: u8, colour: u8) -> [u8; 13] {
        let mut d = [0u8; 13];
        d[0..4].copy_from_slice(&width.to_be_bytes());
        d[4..8].copy_from_slice(&height.to_be_bytes());
        d[8] = depth;
        d[9] = colour;
        d
    }

    fn chunk(tag: [u8; 4], data: &[u8]) -> Chunk<'_> {
        Chunk {
            offset: 8,
            length: data.len() as u32,
            tag: ChunkTag(tag),
            data,
            crc: 0,
        }
    }

    #[test]
    fn tag_registry_is_case_insensitive() {
        assert_eq!(ChunkTag(*b"IHDR").kind(), ChunkKind::Header);
        assert_eq!(ChunkTag(*b"ihdr").kind(), ChunkKind::Header);
        assert_eq!(ChunkTag(*b"PLTE").kind(), ChunkKind::Palette);
        assert_eq!(ChunkTag(*b"IDAT").kind(), ChunkKind::Payload);
        assert_eq!(ChunkTag(*b"iend").kind(), ChunkKind::Trailer);
        assert_eq!(ChunkTag(*b"tEXt").kind(), ChunkKind::Opaque);
        assert_eq!(ChunkTag(*b"gAMA").kind(), ChunkKind::Opaque);
    }

    #[test]
    fn tag_display() {
        assert_eq!(format!("{}", ChunkTag::IDAT), "IDAT");
        assert!(!ChunkTag([0x49, 0x00, 0x41, 0x54]).is_valid());
        assert_eq!(format!("{}", ChunkTag([0x49, 0x00, 0x41, 0x54])), "[49, 00, 41, 54]");
    }

    #[test]
    fn header_minimal_truecolour() {
        let h = decode_header(&ihdr(1, 1, 8, 2)).unwrap();
        assert_eq!(h.width, 1);
        assert_eq!(h.height, 1);
        assert_eq!(h.bit_depth, 8);
        assert_eq!(h.colour_type, ColourType::Rgb);
        assert_eq!(h.channels(), 3);
        assert!(!h.is_interlaced());
    }

    #[test]
    fn header_wrong_length() {
        let d = [0u8; 14];
        assert_eq!(
            decode_header(&d[..12]),
            Err(Error::MalformedHeader { length: 12 })
        );
        assert_eq!(decode_header(&d), Err(Error::MalformedHeader { length: 14 }));
    }

    #[test]
    fn header_field_checks() {
        assert_eq!(
            decode_header(&ihdr(0, 1, 8, 2)),
            Err(Error::InvalidHeader { field: "width", value: 0 })
        );
        assert_eq!(
            decode_header(&ihdr(1, 1, 8, 5)),
            Err(Error::InvalidHeader { field: "colour type", value: 5 })
        );
        assert_eq!(
            decode_header(&ihdr(1, 1, 4, 2)),
            Err(Error::InvalidHeader { field: "bit depth", value: 4 })
        );
        let mut d = ihdr(1, 1, 8, 0);
        d[10] = 1;
        assert_eq!(
            decode_header(&d),
            Err(Error::InvalidHeader { field: "compression method", value: 1 })
        );
        let mut d = ihdr(1, 1, 8, 0);
        d[12] = 2;
        assert!(decode_header(&d).is_err());
        d[12] = 1;
        assert!(decode_header(&d).unwrap().is_interlaced());
    }

    #[test]
    fn palette_triples() {
        let p = decode_palette(&[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(p.len(), 2);
        assert_eq!(p.get(1), Some(Rgb { r: 4, g: 5, b: 6 }));
        assert_eq!(p.get(2), None);
        assert_eq!(
            decode_palette(&[1, 2, 3, 4]),
            Err(Error::MalformedPalette { length: 4 })
        );
    }

    #[test]
    fn record_dispatch() {
        let h = ihdr(2, 2, 8, 6);
        let rec = decode_record(chunk(*b"IHDR", &h)).unwrap();
        assert_eq!(rec.kind(), ChunkKind::Header);
        assert!(matches!(rec, Record::Header { header, .. } if header.channels() == 4));

        let rec = decode_record(chunk(*b"IDAT", &[9, 9])).unwrap();
        assert_eq!(rec, Record::Payload(chunk(*b"IDAT", &[9, 9])));

        let rec = decode_record(chunk(*b"tIME", &[0; 7])).unwrap();
        assert_eq!(rec.kind(), ChunkKind::Opaque);
        assert_eq!(rec.chunk().data.len(), 7);

        assert!(decode_record(chunk(*b"IHDR", &h[..12])).is_err());
    }

    #[test]
    fn crc_check() {
        let mut c = chunk(*b"IEND", &[]);
        assert!(!c.crc_matches());
        c.crc = 0xAE42_6082;
        assert!(c.crc_matches());
        assert_eq!(c.framed_len(), 12);
    }
}
