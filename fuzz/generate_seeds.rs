#!/usr/bin/env -S cargo +nightly -Zscript
//! Generate seed corpus files for fuzzing.
//! Run: cargo +nightly -Zscript fuzz/generate_seeds.rs

fn chunk(id: &[u8; 4], payload: &[u8], align: usize) -> Vec<u8> {
    let mut out = id.to_vec();
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    while out.len() % align != 0 {
        out.push(0);
    }
    out
}

fn form(id: &[u8; 4], ty: &[u8; 4], children: &[Vec<u8>], align: usize) -> Vec<u8> {
    let mut payload = ty.to_vec();
    for c in children {
        payload.extend_from_slice(c);
    }
    chunk(id, &payload, align)
}

fn bmhd(width: u16, height: u16, planes: u8, masking: u8, compression: u8) -> Vec<u8> {
    let mut h = Vec::new();
    h.extend_from_slice(&width.to_be_bytes());
    h.extend_from_slice(&height.to_be_bytes());
    h.extend_from_slice(&[0, 0, 0, 0, planes, masking, compression, 0, 0, 0, 1, 1]);
    h.extend_from_slice(&width.to_be_bytes());
    h.extend_from_slice(&height.to_be_bytes());
    chunk(b"BMHD", &h, 2)
}

fn main() {
    use std::fs;
    let dir = "fuzz/corpus/fuzz_decode";
    fs::create_dir_all(dir).unwrap();

    // ILBM 16x2, 2 planes, uncompressed
    let cmap = chunk(b"CMAP", &[0, 0, 0, 255, 0, 0, 0, 255, 0, 0, 0, 255], 2);
    let body = chunk(b"BODY", &[0xF0, 0x0F, 0xAA, 0x55, 0x0F, 0xF0, 0x55, 0xAA], 2);
    let ilbm = form(b"FORM", b"ILBM", &[bmhd(16, 2, 2, 0, 0), cmap.clone(), body], 2);
    fs::write(format!("{dir}/ilbm_2plane.iff"), &ilbm).unwrap();

    // ILBM 16x1, 1 plane, ByteRun1 including a -128 code
    let body = chunk(b"BODY", &[0x80, 0xFF, 0x01, 0xAA, 0x55], 2);
    let rle = form(b"FORM", b"ILBM", &[bmhd(16, 1, 1, 0, 1), body], 2);
    fs::write(format!("{dir}/ilbm_byterun1.iff"), rle).unwrap();

    // HAM6 with an explicit CAMG
    let camg = chunk(b"CAMG", &0x800u32.to_be_bytes(), 2);
    let body = chunk(b"BODY", &[0u8; 12], 2);
    let ham = form(b"FORM", b"ILBM", &[bmhd(16, 1, 6, 0, 0), cmap, camg, body], 2);
    fs::write(format!("{dir}/ilbm_ham6.iff"), ham).unwrap();

    // PBM 4x1 chunky, 8 bits
    let body = chunk(b"BODY", &[0, 1, 2, 3], 2);
    let pbm = form(b"FORM", b"PBM ", &[bmhd(4, 1, 8, 0, 0), body], 2);
    fs::write(format!("{dir}/pbm_8bit.iff"), pbm).unwrap();

    // ACBM 16x1, 2 contiguous planes
    let abit = chunk(b"ABIT", &[0xFF, 0x00, 0x0F, 0xF0], 2);
    let acbm = form(b"FORM", b"ACBM", &[bmhd(16, 1, 2, 0, 0), abit], 2);
    fs::write(format!("{dir}/acbm_2plane.iff"), acbm).unwrap();

    // Maya 2x2 RGBA, one raw tile
    let mut tbhd = Vec::new();
    tbhd.extend_from_slice(&2u32.to_be_bytes());
    tbhd.extend_from_slice(&2u32.to_be_bytes());
    tbhd.extend_from_slice(&[0, 1, 0, 1, 0, 0, 0, 3, 0, 0, 0, 1, 0, 0, 0, 0]);
    let mut tile = vec![0, 0, 0, 0, 0, 1, 0, 1];
    tile.extend((0..16).map(|i| i as u8 * 16));
    let maya = form(
        b"FOR4",
        b"CIMG",
        &[chunk(b"TBHD", &tbhd, 4), chunk(b"RGBA", &tile, 4)],
        4,
    );
    fs::write(format!("{dir}/maya_rgba.iff"), &maya).unwrap();

    // Both dialects inside a CAT
    let cat = form(b"CAT ", b"    ", &[maya, ilbm], 2);
    fs::write(format!("{dir}/cat_mixed.iff"), cat).unwrap();

    // Truncated/malformed seeds for edge coverage
    fs::write(format!("{dir}/empty.bin"), b"").unwrap();
    fs::write(format!("{dir}/just_form.bin"), b"FORM").unwrap();
    fs::write(format!("{dir}/bad_tag.bin"), b"FORM\0\0\0\x0cILBM\x01BAD\0\0\0\0").unwrap();
    fs::write(format!("{dir}/short_container.bin"), b"FORM\0\0\0\x04ILBMLIST\0\0\0\x02").unwrap();

    println!("Generated seed corpus in {dir}/");
}
