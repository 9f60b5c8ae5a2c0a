/// Pack four 8-bit channels into one 32-bit pixel, byte order R,G,B,A.
#[inline]
pub fn pack_rgba8(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (r as u32) | (g as u32) << 8 | (b as u32) << 16 | (a as u32) << 24
}

/// Unpack a 32-bit pixel back into `[r, g, b, a]`.
#[inline]
pub fn unpack_rgba8(pixel: u32) -> [u8; 4] {
    [
        (pixel & 0xff) as u8,
        (pixel >> 8 & 0xff) as u8,
        (pixel >> 16 & 0xff) as u8,
        (pixel >> 24 & 0xff) as u8,
    ]
}
