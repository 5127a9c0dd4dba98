//! Builders for synthetic IFF streams.
#![allow(dead_code)]

/// Chunk padded to an even length.
pub fn chunk(id: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    padded(id, payload, 2)
}

/// Chunk padded to a multiple of four (Maya).
pub fn chunk4(id: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    padded(id, payload, 4)
}

fn padded(id: &[u8; 4], payload: &[u8], align: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 8 + align);
    out.extend_from_slice(id);
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    while out.len() % align != 0 {
        out.push(0);
    }
    out
}

pub fn container(id: &[u8; 4], ty: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    let mut payload = ty.to_vec();
    for c in children {
        payload.extend_from_slice(c);
    }
    if id[3] == b'4' {
        chunk4(id, &payload)
    } else {
        chunk(id, &payload)
    }
}

pub fn form(ty: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    container(b"FORM", ty, children)
}

pub fn for4(ty: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    container(b"FOR4", ty, children)
}

pub fn bmhd(width: u16, height: u16, planes: u8, masking: u8, compression: u8) -> Vec<u8> {
    let mut h = Vec::with_capacity(20);
    h.extend_from_slice(&width.to_be_bytes());
    h.extend_from_slice(&height.to_be_bytes());
    h.extend_from_slice(&[0, 0, 0, 0]);
    h.extend_from_slice(&[planes, masking, compression, 0]);
    h.extend_from_slice(&[0, 0, 1, 1]);
    h.extend_from_slice(&width.to_be_bytes());
    h.extend_from_slice(&height.to_be_bytes());
    chunk(b"BMHD", &h)
}

pub fn cmap(colors: &[[u8; 3]]) -> Vec<u8> {
    chunk(b"CMAP", colors.concat().as_slice())
}

/// Bitplane row stride for `width` pixels.
pub fn stride(width: usize) -> usize {
    width.div_ceil(16) * 2
}

/// One plane row per plane for a row of pixel values, plus an optional
/// all-ones mask plane.
pub fn row_group(values: &[u32], planes: usize, mask: bool) -> Vec<u8> {
    let s = stride(values.len());
    let mut g = vec![0u8; s * (planes + usize::from(mask))];
    for (x, &v) in values.iter().enumerate() {
        for k in 0..planes {
            if (v >> k) & 1 != 0 {
                g[k * s + x / 8] |= 0x80 >> (x % 8);
            }
        }
    }
    if mask {
        g[planes * s..].fill(0xFF);
    }
    g
}

/// Uncompressed interleaved BODY payload.
pub fn planar_body(rows: &[Vec<u32>], planes: usize, mask: bool) -> Vec<u8> {
    rows.iter().flat_map(|r| row_group(r, planes, mask)).collect()
}

/// ByteRun1 encoder (never emits the -128 code).
pub fn packbits(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < data.len() {
        let mut run = 1;
        while i + run < data.len() && data[i + run] == data[i] && run < 128 {
            run += 1;
        }
        if run >= 2 {
            out.push((1 - run as i16) as i8 as u8);
            out.push(data[i]);
            i += run;
        } else {
            let start = i;
            while i < data.len()
                && i - start < 128
                && !(i + 1 < data.len() && data[i] == data[i + 1])
            {
                i += 1;
            }
            out.push((i - start - 1) as u8);
            out.extend_from_slice(&data[start..i]);
        }
    }
    out
}

pub fn tbhd(
    width: u32,
    height: u32,
    flags: u32,
    sixteen_bit: bool,
    tiles: u16,
    rle: bool,
) -> Vec<u8> {
    let mut d = Vec::with_capacity(24);
    d.extend_from_slice(&width.to_be_bytes());
    d.extend_from_slice(&height.to_be_bytes());
    d.extend_from_slice(&[0, 1, 0, 1]);
    d.extend_from_slice(&flags.to_be_bytes());
    d.extend_from_slice(&u16::from(sixteen_bit).to_be_bytes());
    d.extend_from_slice(&tiles.to_be_bytes());
    d.extend_from_slice(&u32::from(rle).to_be_bytes());
    chunk4(b"TBHD", &d)
}

pub fn tile(x0: u16, y0: u16, x1: u16, y1: u16, payload: &[u8]) -> Vec<u8> {
    let mut d = Vec::with_capacity(payload.len() + 8);
    for v in [x0, y0, x1, y1] {
        d.extend_from_slice(&v.to_be_bytes());
    }
    d.extend_from_slice(payload);
    chunk4(b"RGBA", &d)
}

/// Maya RLE for a run of `count` copies of `value`.
pub fn maya_run(mut count: usize, value: u8) -> Vec<u8> {
    let mut out = Vec::new();
    while count > 0 {
        let n = count.min(128);
        out.push(0x80 | (n - 1) as u8);
        out.push(value);
        count -= n;
    }
    out
}
