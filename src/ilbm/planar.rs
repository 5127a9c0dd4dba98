//! Bitplane to packed pixel conversion for one row group.
//!
//! A row group holds `planes` rows of `stride` bytes each, plane 0 first.
//! Pixel `x` of plane `k` is bit `7 - x % 8` of byte `k * stride + x / 8`.

#[inline]
fn bit(group: &[u8], stride: usize, plane: usize, x: usize) -> u8 {
    (group[plane * stride + x / 8] >> (7 - (x % 8))) & 1
}

/// Gather bits `first..first + count` of pixel `x` into one value.
#[inline]
fn gather(group: &[u8], stride: usize, first: usize, count: usize, x: usize) -> u32 {
    (0..count).fold(0, |v, k| v | u32::from(bit(group, stride, first + k, x)) << k)
}

/// Widen a `bits`-bit value to 8 bits by repeating its bit pattern.
pub(crate) fn scale_to_u8(v: u32, bits: u32) -> u8 {
    if bits == 0 {
        return 0;
    }
    if bits >= 8 {
        return v as u8;
    }
    let mut out = 0u32;
    let mut shift = 8 - bits as i32;
    while shift > -(bits as i32) {
        out |= if shift >= 0 { v << shift } else { v >> -shift };
        shift -= bits as i32;
    }
    out as u8
}

/// Plain bit transposition: one index byte per pixel from `planes` planes.
pub(crate) fn indices(group: &[u8], stride: usize, planes: usize, out: &mut [u8]) {
    for (x, px) in out.iter_mut().enumerate() {
        *px = gather(group, stride, 0, planes, x) as u8;
    }
}

/// Extra Half-Brite: the top plane marks a half-brightness pixel, reported
/// as `index + palette_len` for a palette extended with the darker copies.
pub(crate) fn half_brite(
    group: &[u8],
    stride: usize,
    planes: usize,
    palette_len: usize,
    out: &mut [u8],
) {
    let top = planes - 1;
    for (x, px) in out.iter_mut().enumerate() {
        let idx = gather(group, stride, 0, top, x) as usize;
        *px = if bit(group, stride, top, x) != 0 {
            (idx + palette_len).min(255) as u8
        } else {
            idx as u8
        };
    }
}

/// Hold and Modify: RGB output.
///
/// The low `planes - 2` planes carry a value, the top two the control
/// code. Control 1 replaces red, 2 blue, 3 green; 0 loads the palette
/// entry. Each row starts from palette entry 0.
pub(crate) fn ham(group: &[u8], stride: usize, planes: usize, palette: &[[u8; 3]], out: &mut [u8]) {
    let bits = planes - 2;
    let lookup = |i: usize| palette.get(i).copied().unwrap_or([0, 0, 0]);
    let mut color = lookup(0);
    for (x, px) in out.chunks_exact_mut(3).enumerate() {
        let value = gather(group, stride, 0, bits, x);
        let mut ctl = 0u8;
        for k in bits..planes {
            if bit(group, stride, k, x) != 0 {
                ctl |= 1 << (planes - k - 1);
            }
        }
        match ctl {
            1 => color[0] = scale_to_u8(value, bits as u32),
            2 => color[2] = scale_to_u8(value, bits as u32),
            3 => color[1] = scale_to_u8(value, bits as u32),
            _ => color = lookup(value as usize),
        }
        px.copy_from_slice(&color);
    }
}

/// 24 or 32 planes: each run of 8 planes is one channel, R, G, B then A.
pub(crate) fn deep(group: &[u8], stride: usize, planes: usize, out: &mut [u8]) {
    let channels = planes / 8;
    for (x, px) in out.chunks_exact_mut(channels).enumerate() {
        for (c, v) in px.iter_mut().enumerate() {
            *v = gather(group, stride, c * 8, 8, x) as u8;
        }
    }
}
