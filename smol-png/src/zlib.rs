//! IDAT reassembly and the inflate collaborator.
//!
//! The image data of a PNG is one zlib stream cut into IDAT chunks at
//! arbitrary points. [`reassemble`] glues the pieces back together in
//! file order and exposes the envelope (2-byte CMF/FLG header, DEFLATE
//! body, 4-byte Adler-32 trailer). The [`Inflate`] trait is the seam to
//! the codec; [`Miniz`] implements it with `miniz_oxide`.

use alloc::vec::Vec;

use miniz_oxide::inflate::TINFLStatus;
use thiserror::Error;

use crate::bits::{be_u32, bit, bits};
use crate::error::Error;

// CMF + FLG
const ZLIB_HEADER_LEN: usize = 2;
// Adler-32
const ZLIB_TRAILER_LEN: usize = 4;

/// A complete zlib stream rebuilt from IDAT payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZlibStream {
    bytes: Vec<u8>,
}

impl ZlibStream {
    /// Exact input for the codec: header ++ body ++ checksum.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn header(&self) -> [u8; 2] {
        [self.bytes[0], self.bytes[1]]
    }

    pub fn body(&self) -> &[u8] {
        &self.bytes[ZLIB_HEADER_LEN..self.bytes.len() - ZLIB_TRAILER_LEN]
    }

    /// Stored Adler-32 of the uncompressed data.
    pub fn checksum(&self) -> u32 {
        be_u32(&self.bytes, self.bytes.len() - ZLIB_TRAILER_LEN).unwrap_or(0)
    }

    // CMF bits 0-3; 8 = DEFLATE
    pub fn compression_method(&self) -> u8 {
        bits(self.bytes[0], 0, 4)
    }

    /// LZ77 window size from CINFO (CMF bits 4-7).
    pub fn window_size(&self) -> u32 {
        1 << (bits(self.bytes[0], 4, 4) as u32 + 8)
    }

    // FLG bit 5
    pub fn has_preset_dict(&self) -> bool {
        bit(self.bytes[1], 5)
    }

    // FLG bits 6-7: 0 fastest .. 3 maximum
    pub fn level(&self) -> u8 {
        bits(self.bytes[1], 6, 2)
    }

    /// CMF*256 + FLG must be a multiple of 31.
    pub fn header_check_ok(&self) -> bool {
        (u16::from(self.bytes[0]) << 8 | u16::from(self.bytes[1])) % 31 == 0
    }

    /// BFINAL and BTYPE of the first DEFLATE block, if the body is non-empty.
    pub fn first_block(&self) -> Option<(bool, u8)> {
        let b = *self.body().first()?;
        Some((bit(b, 0), bits(b, 1, 2)))
    }
}

/// Concatenate IDAT payloads in the given order and split the envelope.
///
/// Order matters: feeding the pieces out of file order is not detected
/// here and only surfaces as a codec failure.
pub fn reassemble<'a, I>(parts: I) -> Result<ZlibStream, Error>
where
    I: IntoIterator<Item = &'a [u8]>,
    I::IntoIter: Clone,
{
    let parts = parts.into_iter();
    let total: usize = parts.clone().map(<[u8]>::len).sum();
    if total < ZLIB_HEADER_LEN + ZLIB_TRAILER_LEN {
        return Err(Error::InsufficientPayload { length: total });
    }

    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(total)
        .map_err(|_| Error::OutOfMemory { what: "IDAT stream" })?;
    for part in parts {
        bytes.extend_from_slice(part);
    }
    Ok(ZlibStream { bytes })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("zlib: inflate failed ({status:?})")]
    Inflate { status: TINFLStatus },
    #[error("zlib: output exceeds {limit} bytes")]
    OutputLimit { limit: usize },
}

/// Decompresses a complete zlib stream.
pub trait Inflate {
    /// Inflate `stream`, producing at most `limit` bytes.
    fn inflate(&self, stream: &[u8], limit: usize) -> Result<Vec<u8>, CodecError>;
}

/// `miniz_oxide` one-shot inflate; parses the zlib header and checks Adler-32.
#[derive(Debug, Clone, Copy, Default)]
pub struct Miniz;

impl Inflate for Miniz {
    fn inflate(&self, stream: &[u8], limit: usize) -> Result<Vec<u8>, CodecError> {
        miniz_oxide::inflate::decompress_to_vec_zlib_with_limit(stream, limit).map_err(|e| {
            match e.status {
                TINFLStatus::HasMoreOutput => CodecError::OutputLimit { limit },
                status => CodecError::Inflate { status },
            }
        })
    }
}
