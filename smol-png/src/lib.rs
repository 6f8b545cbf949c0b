// smol-png: minimal no_std PNG container parser.
// bits:     big-endian field and single-bit readers
// error:    decode error enum with offset / expected / actual context
// chunk:    chunk model, IHDR / PLTE decoders, tag -> variant registry
// document: container parser; signature check, chunk walk, Document
// zlib:     IDAT reassembly into one zlib stream, codec adapter
// scanline: per-row filter reversal (None/Sub/Up/Average/Paeth)
// decode:   parse -> reassemble -> inflate -> reconstruct pipeline

#![no_std]

extern crate alloc;

pub mod bits;
pub mod chunk;
pub mod decode;
pub mod document;
pub mod error;
pub mod scanline;
pub mod zlib;

pub use chunk::{Chunk, ChunkKind, ChunkTag, ColourType, Header, Palette, Record, Rgb};
pub use decode::{DecodeOptions, DecodedImage, decode, decode_with};
pub use document::{Document, PNG_SIG, parse, parse_with};
pub use error::{Error, ErrorKind};
pub use scanline::{FilterType, ScanlineLayout, reconstruct};
pub use zlib::{CodecError, Inflate, Miniz, ZlibStream, reassemble};
