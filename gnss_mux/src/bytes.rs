//! Little-endian field readers for fixed-layout payloads.
//!
//! Callers check the payload length up front, offsets are always in bounds.

pub(crate) fn u16_le(p: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([p[off], p[off + 1]])
}

pub(crate) fn u32_le(p: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([p[off], p[off + 1], p[off + 2], p[off + 3]])
}

pub(crate) fn i32_le(p: &[u8], off: usize) -> i32 {
    i32::from_le_bytes([p[off], p[off + 1], p[off + 2], p[off + 3]])
}

pub(crate) fn i8_at(p: &[u8], off: usize) -> i8 {
    i8::from_le_bytes([p[off]])
}

pub(crate) fn f32_le(p: &[u8], off: usize) -> f32 {
    f32::from_bits(u32_le(p, off))
}

pub(crate) fn f64_le(p: &[u8], off: usize) -> f64 {
    f64::from_bits(u64::from_le_bytes([
        p[off],
        p[off + 1],
        p[off + 2],
        p[off + 3],
        p[off + 4],
        p[off + 5],
        p[off + 6],
        p[off + 7],
    ]))
}
