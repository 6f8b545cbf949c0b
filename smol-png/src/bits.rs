//! Fixed-width big-endian field readers and single-bit helpers.
//!
//! PNG stores every multi-byte integer in network byte order. The
//! `be_*` readers return `None` when the field would run past the end of
//! the buffer; callers turn that into a
//! [`TruncatedStream`](crate::Error::TruncatedStream) with their own
//! offset context.

#[inline]
pub fn be_u16(d: &[u8], o: usize) -> Option<u16> {
    let b = d.get(o..o.checked_add(2)?)?;
    Some(u16::from_be_bytes([b[0], b[1]]))
}

#[inline]
pub fn be_u32(d: &[u8], o: usize) -> Option<u32> {
    let b = d.get(o..o.checked_add(4)?)?;
    Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

/// Four raw bytes at `o`, e.g. a chunk type tag.
#[inline]
pub fn array4(d: &[u8], o: usize) -> Option<[u8; 4]> {
    d.get(o..o.checked_add(4)?)?.try_into().ok()
}

/// Bit `n` (0 = least significant) of `byte`.
#[inline]
pub const fn bit(byte: u8, n: u8) -> bool {
    n < 8 && (byte >> n) & 1 == 1
}

/// `width` bits of `byte` starting at bit `lsb`.
#[inline]
pub const fn bits(byte: u8, lsb: u8, width: u8) -> u8 {
    let mask = if width >= 8 { 0xFF } else { (1u8 << width) - 1 };
    (byte >> lsb) & mask
}

// CRC-32 (ISO 3309 / ITU-T V.42), reflected polynomial 0xEDB88320;
// the checksum every PNG chunk carries over its type tag and data.

const CRC_TABLE: [u32; 256] = build_crc_table();

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 { 0xEDB8_8320 ^ (c >> 1) } else { c >> 1 };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

/// Running CRC-32; start from `0xFFFF_FFFF`, finish by inverting.
#[inline]
pub fn crc32_update(mut crc: u32, buf: &[u8]) -> u32 {
    for &b in buf {
        crc = CRC_TABLE[((crc ^ b as u32) & 0xFF) as usize] ^ (crc >> 8);
    }
    crc
}

/// CRC-32 over the concatenation of `parts`.
///
/// Public: callers writing their own chunks frame them with
/// `crc32(&[&tag[..], data])`.
pub fn crc32(parts: &[&[u8]]) -> u32 {
    parts
        .iter()
        .fold(0xFFFF_FFFF, |crc, part| crc32_update(crc, part))
        ^ 0xFFFF_FFFF
}
