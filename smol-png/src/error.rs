//! Decode errors.
//!
//! Every failure aborts the decode; no partial image is ever returned.
//! Variants carry the byte offset or row and the expected / actual
//! values needed to tell which structural rule was broken.

use thiserror::Error;

use crate::chunk::ChunkTag;
use crate::zlib::CodecError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("png: invalid signature")]
    InvalidSignature,
    #[error("png: truncated stream at offset {offset}: need {needed} bytes, {available} left")]
    TruncatedStream {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("png: chunk at offset {offset} declares length {length} (max 2^31 - 1)")]
    ChunkTooLong { offset: usize, length: u32 },
    #[error("png: duplicate {tag} chunk at offset {offset}")]
    DuplicateRecord { offset: usize, tag: ChunkTag },
    #[error("png: incomplete document, no {missing} chunk")]
    IncompleteDocument { missing: &'static str },
    #[error("png: IHDR length {length}, expected 13")]
    MalformedHeader { length: usize },
    #[error("png: invalid IHDR {field} = {value}")]
    InvalidHeader { field: &'static str, value: u32 },
    #[error("png: PLTE length {length} is not a multiple of 3 (max 768)")]
    MalformedPalette { length: usize },
    #[error("png: {tag} CRC mismatch at offset {offset}: stored {stored:08X}, computed {computed:08X}")]
    ChecksumMismatch {
        offset: usize,
        tag: ChunkTag,
        stored: u32,
        computed: u32,
    },
    #[error("png: palette image without PLTE")]
    MissingPalette,
    #[error("png: IDAT stream is {length} bytes, need at least 6")]
    InsufficientPayload { length: usize },
    #[error("png: {0}")]
    Codec(#[from] CodecError),
    #[error("png: unknown filter type {filter} on row {row}")]
    UnknownFilterType { row: usize, filter: u8 },
    #[error("png: decompressed {actual} bytes, header implies {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("png: interlaced PNGs not supported")]
    UnsupportedInterlace,
    #[error("png: bit depth {bit_depth} not supported")]
    UnsupportedBitDepth { bit_depth: u8 },
    #[error("png: {pixels} pixels exceeds limit of {limit}")]
    ImageTooLarge { pixels: u64, limit: u64 },
    #[error("png: OOM for {what}")]
    OutOfMemory { what: &'static str },
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad signature, chunk framing, or malformed critical chunk.
    Structural,
    /// Not enough IDAT bytes to form a zlib envelope.
    Reassembly,
    /// The inflate collaborator rejected the stream.
    Codec,
    /// Scanline data disagrees with the header, or carries a bad filter.
    Reconstruction,
    /// Valid PNG using a feature this decoder does not implement.
    Unsupported,
    /// Memory guard tripped.
    Resource,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidSignature
            | Error::TruncatedStream { .. }
            | Error::ChunkTooLong { .. }
            | Error::DuplicateRecord { .. }
            | Error::IncompleteDocument { .. }
            | Error::MalformedHeader { .. }
            | Error::InvalidHeader { .. }
            | Error::MalformedPalette { .. }
            | Error::ChecksumMismatch { .. }
            | Error::MissingPalette => ErrorKind::Structural,
            Error::InsufficientPayload { .. } => ErrorKind::Reassembly,
            Error::Codec(_) => ErrorKind::Codec,
            Error::UnknownFilterType { .. } | Error::LengthMismatch { .. } => {
                ErrorKind::Reconstruction
            }
            Error::UnsupportedInterlace | Error::UnsupportedBitDepth { .. } => {
                ErrorKind::Unsupported
            }
            Error::ImageTooLarge { .. } | Error::OutOfMemory { .. } => ErrorKind::Resource,
        }
    }
}
