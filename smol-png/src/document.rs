//! Container parser.
//!
//! [`parse`] checks the 8-byte signature, then walks length-prefixed
//! chunks until the input is exhausted. Each chunk goes through
//! [`decode_record`] and is installed into a local `DocumentBuilder`;
//! the resulting [`Document`] is only handed out once IHDR, at least one
//! IDAT and IEND are all present.

use alloc::vec::Vec;

use crate::bits::{array4, be_u32};
use crate::chunk::{Chunk, ChunkTag, Header, Palette, Record, decode_record};
use crate::decode::DecodeOptions;
use crate::error::Error;

pub const PNG_SIG: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

// length + tag + CRC
const CHUNK_OVERHEAD: usize = 12;

const MAX_CHUNK_LEN: u32 = i32::MAX as u32;

/// A fully parsed PNG: the critical chunks plus every other chunk, in
/// file order. Borrows chunk data from the input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document<'a> {
    signature: [u8; 8],
    header_chunk: Chunk<'a>,
    header: Header,
    palette: Option<(Chunk<'a>, Palette)>,
    payload: Vec<Chunk<'a>>,
    trailer: Chunk<'a>,
    opaque: Vec<Chunk<'a>>,
}

impl<'a> Document<'a> {
    pub fn signature(&self) -> &[u8; 8] {
        &self.signature
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn header_chunk(&self) -> &Chunk<'a> {
        &self.header_chunk
    }

    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref().map(|(_, p)| p)
    }

    pub fn palette_chunk(&self) -> Option<&Chunk<'a>> {
        self.palette.as_ref().map(|(c, _)| c)
    }

    /// IDAT chunks in file order.
    pub fn payload(&self) -> &[Chunk<'a>] {
        &self.payload
    }

    pub fn trailer(&self) -> &Chunk<'a> {
        &self.trailer
    }

    /// Ancillary / unknown chunks in file order.
    pub fn opaque(&self) -> &[Chunk<'a>] {
        &self.opaque
    }

    /// Every chunk, sorted by file offset.
    pub fn chunks(&self) -> Vec<&Chunk<'a>> {
        let mut all: Vec<&Chunk<'a>> = core::iter::once(&self.header_chunk)
            .chain(self.palette_chunk())
            .chain(self.payload.iter())
            .chain(core::iter::once(&self.trailer))
            .chain(self.opaque.iter())
            .collect();
        all.sort_by_key(|c| c.offset);
        all
    }
}

// in-progress document; private to parse_with
#[derive(Default)]
struct DocumentBuilder<'a> {
    header: Option<(Chunk<'a>, Header)>,
    palette: Option<(Chunk<'a>, Palette)>,
    payload: Vec<Chunk<'a>>,
    trailer: Option<Chunk<'a>>,
    opaque: Vec<Chunk<'a>>,
}

impl<'a> DocumentBuilder<'a> {
    fn install(&mut self, record: Record<'a>) -> Result<(), Error> {
        let dup = |c: &Chunk<'_>| Error::DuplicateRecord {
            offset: c.offset,
            tag: c.tag,
        };
        match record {
            Record::Header { chunk, header } => {
                if self.header.is_some() {
                    return Err(dup(&chunk));
                }
                self.header = Some((chunk, header));
            }
            Record::Palette { chunk, palette } => {
                if self.palette.is_some() {
                    return Err(dup(&chunk));
                }
                self.palette = Some((chunk, palette));
            }
            Record::Payload(chunk) => self.payload.push(chunk),
            Record::Trailer(chunk) => {
                if self.trailer.is_some() {
                    return Err(dup(&chunk));
                }
                self.trailer = Some(chunk);
            }
            Record::Opaque(chunk) => {
                log::trace!("png: keeping ancillary {} chunk", chunk.tag);
                self.opaque.push(chunk);
            }
        }
        Ok(())
    }

    fn finish(self, signature: [u8; 8]) -> Result<Document<'a>, Error> {
        let (header_chunk, header) = self
            .header
            .ok_or(Error::IncompleteDocument { missing: "IHDR" })?;
        if self.payload.is_empty() {
            return Err(Error::IncompleteDocument { missing: "IDAT" });
        }
        let trailer = self
            .trailer
            .ok_or(Error::IncompleteDocument { missing: "IEND" })?;
        Ok(Document {
            signature,
            header_chunk,
            header,
            palette: self.palette,
            payload: self.payload,
            trailer,
            opaque: self.opaque,
        })
    }
}

/// Parse with default options (CRCs not checked).
pub fn parse(data: &[u8]) -> Result<Document<'_>, Error> {
    parse_with(data, &DecodeOptions::default())
}

pub fn parse_with<'a>(data: &'a [u8], options: &DecodeOptions) -> Result<Document<'a>, Error> {
    let signature: [u8; 8] = data
        .get(..8)
        .and_then(|s| s.try_into().ok())
        .ok_or(Error::InvalidSignature)?;
    if signature != PNG_SIG {
        return Err(Error::InvalidSignature);
    }

    let mut builder = DocumentBuilder::default();
    let mut pos = PNG_SIG.len();
    while pos < data.len() {
        let chunk = read_chunk(data, pos)?;
        log::debug!(
            "png: chunk {} at {} ({} bytes)",
            chunk.tag,
            chunk.offset,
            chunk.length
        );
        if options.verify_crc && !chunk.crc_matches() {
            return Err(Error::ChecksumMismatch {
                offset: chunk.offset,
                tag: chunk.tag,
                stored: chunk.crc,
                computed: chunk.computed_crc(),
            });
        }
        pos += chunk.framed_len();
        builder.install(decode_record(chunk)?)?;
    }

    builder.finish(signature)
}

// frame one chunk starting at `pos`
fn read_chunk(data: &[u8], pos: usize) -> Result<Chunk<'_>, Error> {
    let available = data.len() - pos;
    let truncated = |needed: usize| Error::TruncatedStream {
        offset: pos,
        needed,
        available,
    };

    let length = be_u32(data, pos).ok_or_else(|| truncated(CHUNK_OVERHEAD))?;
    if length > MAX_CHUNK_LEN {
        return Err(Error::ChunkTooLong {
            offset: pos,
            length,
        });
    }
    let tag = array4(data, pos + 4).ok_or_else(|| truncated(CHUNK_OVERHEAD))?;
    let tag = ChunkTag(tag);

    let needed = CHUNK_OVERHEAD + length as usize;
    if available < needed {
        return Err(truncated(needed));
    }
    let data_start = pos + 8;
    let data_end = data_start + length as usize;
    let crc = be_u32(data, data_end).ok_or_else(|| truncated(needed))?;

    Ok(Chunk {
        offset: pos,
        length,
        tag,
        data: &data[data_start..data_end],
        crc,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::crc32;
    use crate::chunk::ChunkKind;
    use alloc::vec;

    fn push_chunk(out: &mut Vec<u8>, tag: &[u8; 4], data: &[u8]) {
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        out.extend_from_slice(tag);
        out.extend_from_slice(data);
        out.extend_from_slice(&crc32(&[&tag[..], data]).to_be_bytes());
    }

    fn ihdr_1x1() -> Vec<u8> {
        vec![0, 0, 0, 1, 0, 0, 0, 1, 8, 2, 0, 0, 0]
    }

    fn minimal() -> Vec<u8> {
        let mut png = PNG_SIG.to_vec();
        push_chunk(&mut png, b"IHDR", &ihdr_1x1());
        push_chunk(&mut png, b"IDAT", &[1, 2, 3]);
        push_chunk(&mut png, b"IEND", &[]);
        png
    }

    #[test]
    fn parses_minimal_document() {
        let png = minimal();
        let doc = parse(&png).unwrap();
        assert_eq!(doc.signature(), &PNG_SIG);
        assert_eq!(doc.header().width, 1);
        assert_eq!(doc.payload().len(), 1);
        assert_eq!(doc.payload()[0].data, &[1, 2, 3]);
        assert_eq!(doc.payload()[0].offset, 8 + 25);
        assert!(doc.palette().is_none());
        assert_eq!(doc.trailer().length, 0);
        assert_eq!(doc.chunks().len(), 3);
    }

    #[test]
    fn rejects_bad_signature() {
        let mut png = minimal();
        png[1] = b'Q';
        assert_eq!(parse(&png), Err(Error::InvalidSignature));
        assert_eq!(parse(&PNG_SIG[..5]), Err(Error::InvalidSignature));
    }

    #[test]
    fn signature_only_is_incomplete() {
        assert_eq!(
            parse(&PNG_SIG),
            Err(Error::IncompleteDocument { missing: "IHDR" })
        );
    }

    #[test]
    fn length_past_end_is_truncated() {
        let mut png = minimal();
        // IEND declares 16 data bytes that are not there
        let iend = png.len() - 12;
        png[iend + 3] = 16;
        assert_eq!(
            parse(&png),
            Err(Error::TruncatedStream {
                offset: iend,
                needed: 28,
                available: 12,
            })
        );
    }

    #[test]
    fn partial_length_field_is_truncated() {
        let mut png = minimal();
        png.extend_from_slice(&[0, 0]);
        assert!(matches!(
            parse(&png),
            Err(Error::TruncatedStream { available: 2, .. })
        ));
    }

    #[test]
    fn oversized_length() {
        let mut png = PNG_SIG.to_vec();
        png.extend_from_slice(&0x8000_0000u32.to_be_bytes());
        png.extend_from_slice(b"IDAT");
        assert_eq!(
            parse(&png),
            Err(Error::ChunkTooLong {
                offset: 8,
                length: 0x8000_0000
            })
        );
    }

    #[test]
    fn duplicate_header() {
        let mut png = PNG_SIG.to_vec();
        push_chunk(&mut png, b"IHDR", &ihdr_1x1());
        push_chunk(&mut png, b"IHDR", &ihdr_1x1());
        assert_eq!(
            parse(&png),
            Err(Error::DuplicateRecord {
                offset: 33,
                tag: ChunkTag::IHDR
            })
        );
    }

    #[test]
    fn missing_payload_and_trailer() {
        let mut png = PNG_SIG.to_vec();
        push_chunk(&mut png, b"IHDR", &ihdr_1x1());
        assert_eq!(
            parse(&png),
            Err(Error::IncompleteDocument { missing: "IDAT" })
        );
        push_chunk(&mut png, b"IDAT", &[0]);
        assert_eq!(
            parse(&png),
            Err(Error::IncompleteDocument { missing: "IEND" })
        );
    }

    #[test]
    fn keeps_ancillary_chunks_and_lower_case_tags() {
        let mut png = PNG_SIG.to_vec();
        push_chunk(&mut png, b"ihdr", &ihdr_1x1());
        push_chunk(&mut png, b"tEXt", b"Comment\0hi");
        push_chunk(&mut png, b"IDAT", &[1]);
        push_chunk(&mut png, b"gAMA", &[0, 0, 0xB1, 0x8F]);
        push_chunk(&mut png, b"idat", &[2]);
        push_chunk(&mut png, b"IEND", &[]);
        let doc = parse(&png).unwrap();
        assert_eq!(doc.opaque().len(), 2);
        assert_eq!(doc.opaque()[0].tag, ChunkTag(*b"tEXt"));
        let payload: Vec<u8> = doc.payload().iter().flat_map(|c| c.data.iter().copied()).collect();
        assert_eq!(payload, vec![1, 2]);
        let order: Vec<ChunkKind> = doc.chunks().iter().map(|c| c.tag.kind()).collect();
        assert_eq!(
            order,
            vec![
                ChunkKind::Header,
                ChunkKind::Opaque,
                ChunkKind::Payload,
                ChunkKind::Opaque,
                ChunkKind::Payload,
                ChunkKind::Trailer
            ]
        );
    }

    #[test]
    fn non_letter_tags_are_opaque() {
        let mut png = PNG_SIG.to_vec();
        push_chunk(&mut png, b"IHDR", &ihdr_1x1());
        push_chunk(&mut png, b"pr1v", b"x");
        push_chunk(&mut png, &[b'I', b'D', 0, b'T'], &[]);
        push_chunk(&mut png, b"IDAT", &[1]);
        push_chunk(&mut png, b"IEND", &[]);
        let doc = parse(&png).unwrap();
        assert_eq!(doc.opaque().len(), 2);
        assert_eq!(doc.opaque()[0].tag, ChunkTag(*b"pr1v"));
        assert_eq!(doc.opaque()[0].offset, 33);
        assert_eq!(doc.opaque()[0].data, b"x");
        assert_eq!(doc.opaque()[1].tag, ChunkTag([b'I', b'D', 0, b'T']));
        assert_eq!(doc.payload().len(), 1);
    }

    #[test]
    fn crc_verification_is_opt_in() {
        let mut png = minimal();
        // corrupt the IDAT CRC
        let idat_crc = 8 + 25 + 8 + 3;
        png[idat_crc] ^= 0xFF;
        assert!(parse(&png).is_ok());

        let opts = DecodeOptions {
            verify_crc: true,
            ..DecodeOptions::default()
        };
        assert!(matches!(
            parse_with(&png, &opts),
            Err(Error::ChecksumMismatch { offset: 33, tag: ChunkTag::IDAT, .. })
        ));
    }

    #[test]
    fn duplicate_palette() {
        let mut png = PNG_SIG.to_vec();
        push_chunk(&mut png, b"IHDR", &ihdr_1x1());
        push_chunk(&mut png, b"PLTE", &[0, 0, 0]);
        push_chunk(&mut png, b"PLTE", &[0, 0, 0]);
        assert!(matches!(
            parse(&png),
            Err(Error::DuplicateRecord { tag: ChunkTag::PLTE, .. })
        ));
    }

    #[test]
    fn duplicate_trailer() {
        let mut png = minimal();
        let second = png.len();
        push_chunk(&mut png, b"IEND", &[]);
        assert_eq!(
            parse(&png),
            Err(Error::DuplicateRecord {
                offset: second,
                tag: ChunkTag::IEND
            })
        );
    }
}
