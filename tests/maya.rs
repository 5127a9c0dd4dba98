mod common;

use common::*;
use enough::Unstoppable;
use zeniff::*;

const RGB: u32 = 1;
const RGBA: u32 = 3;

/// 64x64 RLE tile of a flat color; planes are stored A, B, G, R.
fn flat_tile(x0: u16, y0: u16, rgba: [u8; 4]) -> Vec<u8> {
    let mut payload = Vec::new();
    for c in [rgba[3], rgba[2], rgba[1], rgba[0]] {
        payload.extend(maya_run(64 * 64, c));
    }
    tile(x0, y0, x0 + 63, y0 + 63, &payload)
}

/// 64x64 raw tile: R = row, G = canvas column, B = 7, stored as ABGR.
fn gradient_tile(x0: u16, y0: u16) -> Vec<u8> {
    let mut payload = Vec::with_capacity(64 * 64 * 4);
    for y in 0..64u16 {
        for x in 0..64u16 {
            payload.extend_from_slice(&[255, 7, (x0 + x) as u8, y as u8]);
        }
    }
    tile(x0, y0, x0 + 63, y0 + 63, &payload)
}

fn pixel(out: &DecodeOutput, x: usize, y: usize) -> &[u8] {
    let px = out.layout.bytes_per_pixel();
    let row = out.row(y as u32).unwrap();
    &row[x * px..(x + 1) * px]
}

#[test]
fn two_tiles_composite_and_flip() {
    let data = for4(
        b"CIMG",
        &[
            tbhd(128, 64, RGBA, false, 2, true),
            flat_tile(0, 0, [10, 20, 30, 255]),
            gradient_tile(64, 0),
        ],
    );

    let decoded = decode(&data, Unstoppable).unwrap();
    assert_eq!(decoded.dialect, IffDialect::Maya);
    assert_eq!(decoded.layout, PixelLayout::Rgba8);
    assert_eq!((decoded.width, decoded.height), (128, 64));
    for y in 0..64 {
        for x in 0..64 {
            assert_eq!(pixel(&decoded, x, y), &[10, 20, 30, 255], "tile A at {x},{y}");
        }
        for x in 64..128 {
            // stored row 0 is the bottom row
            let stored_row = (63 - y) as u8;
            assert_eq!(
                pixel(&decoded, x, y),
                &[stored_row, x as u8, 7, 255],
                "tile B at {x},{y}"
            );
        }
    }
}

#[test]
fn rgb8_raw_tile() {
    // 2x2, stored BGR, bottom row first
    let payload = [3, 2, 1, 6, 5, 4, 9, 8, 7, 12, 11, 10];
    let data = for4(
        b"CIMG",
        &[
            tbhd(2, 2, RGB, false, 1, false),
            tile(0, 0, 1, 1, &payload),
        ],
    );
    let decoded = decode(&data, Unstoppable).unwrap();
    assert_eq!(decoded.layout, PixelLayout::Rgb8);
    assert_eq!(decoded.pixels(), &[7, 8, 9, 10, 11, 12, 1, 2, 3, 4, 5, 6]);
}

fn rgba16(out: &DecodeOutput) -> Vec<[u16; 4]> {
    out.pixels()
        .chunks_exact(8)
        .map(|p| {
            let v = |i: usize| u16::from_ne_bytes([p[i * 2], p[i * 2 + 1]]);
            [v(0), v(1), v(2), v(3)]
        })
        .collect()
}

#[test]
fn sixteen_bit_raw_rgb() {
    // one pixel per channel order B, G, R as big-endian u16
    let payload = [0x9A, 0xBC, 0x56, 0x78, 0x12, 0x34, 0, 1, 0, 2, 0, 3];
    let data = for4(
        b"CIMG",
        &[
            tbhd(2, 1, RGB, true, 1, false),
            tile(0, 0, 1, 0, &payload),
        ],
    );
    let decoded = decode(&data, Unstoppable).unwrap();
    assert_eq!(decoded.layout, PixelLayout::Rgbx16);
    assert_eq!(
        rgba16(&decoded),
        vec![[0x1234, 0x5678, 0x9ABC, 0xFFFF], [3, 2, 1, 0xFFFF]]
    );
}

#[test]
fn sixteen_bit_rle_rgb() {
    // planes: B, G, R high bytes, then B, G, R low bytes
    let mut payload = Vec::new();
    for b in [0x9A, 0x56, 0x12, 0xBC, 0x78, 0x34] {
        payload.extend(maya_run(4, b));
    }
    let data = for4(
        b"CIMG",
        &[
            tbhd(4, 1, RGB, true, 1, true),
            tile(0, 0, 3, 0, &payload),
        ],
    );
    let decoded = decode(&data, Unstoppable).unwrap();
    assert_eq!(decoded.layout, PixelLayout::Rgbx16);
    assert_eq!(rgba16(&decoded), vec![[0x1234, 0x5678, 0x9ABC, 0xFFFF]; 4]);
}

#[test]
fn sixteen_bit_raw_rgba() {
    let payload = [0x00, 0x80, 0x11, 0x11, 0x22, 0x22, 0x33, 0x33];
    let data = for4(
        b"CIMG",
        &[
            tbhd(1, 1, RGBA, true, 1, false),
            tile(0, 0, 0, 0, &payload),
        ],
    );
    let decoded = decode(&data, Unstoppable).unwrap();
    assert_eq!(decoded.layout, PixelLayout::Rgba16);
    assert_eq!(rgba16(&decoded), vec![[0x3333, 0x2222, 0x1111, 0x0080]]);
}

#[test]
fn tile_count_mismatch() {
    let data = for4(
        b"CIMG",
        &[
            tbhd(128, 64, RGBA, false, 3, true),
            flat_tile(0, 0, [0; 4]),
            flat_tile(64, 0, [0; 4]),
        ],
    );
    assert!(matches!(
        decode(&data, Unstoppable),
        Err(IffError::TileGeometryMismatch(_))
    ));
    // the header alone still describes the image
    let info = ImageInfo::from_bytes(&data).unwrap();
    assert_eq!(info.dialect, IffDialect::Maya);
    assert_eq!((info.width, info.height), (128, 64));
    assert_eq!(info.layout, PixelLayout::Rgba8);
}

#[test]
fn tile_outside_canvas() {
    let data = for4(
        b"CIMG",
        &[
            tbhd(100, 64, RGBA, false, 2, true),
            flat_tile(0, 0, [0; 4]),
            flat_tile(64, 0, [0; 4]),
        ],
    );
    assert!(matches!(
        decode(&data, Unstoppable),
        Err(IffError::TileGeometryMismatch(_))
    ));
}

#[test]
fn truncated_rle_tile() {
    let mut payload = Vec::new();
    for c in [1u8, 2, 3, 4] {
        payload.extend(maya_run(16, c));
    }
    payload.truncate(payload.len() - 2);
    let data = for4(
        b"CIMG",
        &[
            tbhd(4, 4, RGBA, false, 1, true),
            tile(0, 0, 3, 3, &payload),
        ],
    );
    assert!(matches!(
        decode(&data, Unstoppable),
        Err(IffError::CompressionDecodeFailure {
            expected: 16,
            actual: 0
        })
    ));
}

#[test]
fn depth_buffer_images_are_unsupported() {
    let data = for4(
        b"CIMG",
        &[
            tbhd(1, 1, RGBA | 4, false, 1, false),
            tile(0, 0, 0, 0, &[0; 4]),
        ],
    );
    assert!(matches!(
        decode(&data, Unstoppable),
        Err(IffError::UnsupportedPixelLayout(_))
    ));
}

#[test]
fn probe_reports_maya_layout() {
    let data = for4(
        b"CIMG",
        &[
            tbhd(128, 64, RGBA, false, 2, true),
            flat_tile(0, 0, [1, 2, 3, 4]),
            flat_tile(64, 0, [1, 2, 3, 4]),
        ],
    );
    let info = ImageInfo::from_bytes(&data).unwrap();
    assert_eq!(info.dialect, IffDialect::Maya);
    assert_eq!(info.layout, PixelLayout::Rgba8);
    assert_eq!((info.width, info.height), (128, 64));
}

#[test]
fn classic_form_is_preferred() {
    let maya = for4(
        b"CIMG",
        &[tbhd(1, 1, RGB, false, 1, false), tile(0, 0, 0, 0, &[1, 2, 3, 0])],
    );
    let ilbm = form(
        b"ILBM",
        &[
            bmhd(1, 1, 24, 0, 0),
            chunk(b"BODY", &planar_body(&[vec![0x00_03_02_01]], 24, false)),
        ],
    );
    let data = container(b"CAT ", b"    ", &[maya, ilbm]);

    let decoded = decode(&data, Unstoppable).unwrap();
    assert_eq!(decoded.dialect, IffDialect::Ilbm);
    assert_eq!(decoded.pixels(), &[1, 2, 3]);
}

#[test]
fn falls_back_to_maya_when_classic_fails() {
    let maya = for4(
        b"CIMG",
        &[tbhd(1, 1, RGB, false, 1, false), tile(0, 0, 0, 0, &[1, 2, 3, 0])],
    );
    let broken = form(b"ILBM", &[chunk(b"BODY", &[0; 4])]);
    let data = container(b"LIST", b"    ", &[broken, maya]);

    let decoded = decode(&data, Unstoppable).unwrap();
    assert_eq!(decoded.dialect, IffDialect::Maya);
    assert_eq!(decoded.pixels(), &[3, 2, 1]);
}
