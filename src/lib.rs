// png2ppm: host-side front end for smol-png.
// pnm:    PPM / PGM writer for decoded images

pub mod pnm;

pub use pnm::{PnmEncoding, PnmKind, write_pnm};
