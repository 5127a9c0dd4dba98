//! Maya `FOR4 CIMG` tile compositing.
//!
//! Tiles are stored bottom-up with their channels in reverse order (ABGR or
//! BGR). 16-bit tiles store big-endian samples; compressed 16-bit tiles keep
//! the high bytes of every channel before the low bytes.

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;

use enough::Stop;
use log::warn;

use crate::chunk::{
    ChunkForest, ChunkId, ChunkKind, MayaCompression, MayaHeader, MayaTile, NodeId,
};
use crate::cursor::Cursor;
use crate::error::IffError;
use crate::limits::{Limits, check_canvas};
use crate::pixel::PixelLayout;
use crate::rle::unpack_maya_rle;

#[derive(Debug)]
pub(crate) struct MayaImage<'a> {
    header: MayaHeader<'a>,
    tiles: Vec<MayaTile<'a>>,
    layout: PixelLayout,
}

impl<'a> MayaImage<'a> {
    pub(crate) fn from_form(forest: &'a ChunkForest, form: NodeId) -> Result<Self, IffError> {
        let node = forest.node(form);
        match node.kind() {
            ChunkKind::Container {
                form_type: ChunkId::CIMG | ChunkId::TBMP,
            } => {}
            ChunkKind::Container { form_type } => {
                return Err(IffError::UnsupportedPixelLayout(format!(
                    "form type {form_type}"
                )));
            }
            _ => return Err(IffError::UnrecognizedFormat),
        }
        let scope = node.children();

        let header = forest
            .first_variant::<MayaHeader<'_>>(scope)
            .filter(MayaHeader::is_valid)
            .ok_or_else(|| IffError::InvalidStructure("missing or malformed TBHD".into()))?;
        if header.width() == 0 || header.height() == 0 {
            return Err(IffError::InvalidStructure(format!(
                "zero image size {}x{}",
                header.width(),
                header.height()
            )));
        }
        let layout = header.layout().ok_or_else(|| {
            IffError::UnsupportedPixelLayout(format!("TBHD flags {:?}", header.flags()))
        })?;

        let tiles: Vec<MayaTile<'_>> = forest.search_variant(scope);

        Ok(Self {
            header,
            tiles,
            layout,
        })
    }

    pub(crate) fn width(&self) -> u32 {
        self.header.width()
    }

    pub(crate) fn height(&self) -> u32 {
        self.header.height()
    }

    pub(crate) fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Composite every tile onto a new canvas, then flip it upright.
    pub(crate) fn decode(
        &self,
        input: &'a [u8],
        limits: Option<&Limits>,
        stop: &dyn Stop,
    ) -> Result<Vec<u8>, IffError> {
        let (width, height) = (self.width(), self.height());
        let row_bytes = self
            .layout
            .row_bytes(width)
            .ok_or(IffError::DimensionsTooLarge { width, height })?;
        let total = row_bytes
            .checked_mul(height as usize)
            .ok_or(IffError::DimensionsTooLarge { width, height })?;
        check_canvas(limits, width, height, total)?;

        // The stored count is 16 bits; writers with more tiles let it wrap.
        let declared = self.header.tiles();
        if self.tiles.len() & 0xFFFF != usize::from(declared) {
            warn!("TBHD declares {declared} tiles, found {}", self.tiles.len());
            return Err(IffError::TileGeometryMismatch(format!(
                "{declared} tiles declared, {} present",
                self.tiles.len()
            )));
        }

        let mut canvas = vec![0u8; total];
        let px = self.layout.bytes_per_pixel();
        for (i, tile) in self.tiles.iter().enumerate() {
            stop.check()?;
            let b = tile.bounds();
            if u32::from(b.x1) >= width || u32::from(b.y1) >= height {
                warn!("tile {i} {b:?} outside {width}x{height} canvas");
                return Err(IffError::TileGeometryMismatch(format!(
                    "tile {i} spans ({}, {})..=({}, {}) on a {width}x{height} canvas",
                    b.x0, b.y0, b.x1, b.y1
                )));
            }
            let pixels = self.decode_tile(tile, input)?;
            let tile_row = tile.width() * px;
            let x0 = usize::from(b.x0) * px;
            for (ty, src) in pixels.chunks_exact(tile_row).enumerate() {
                let at = (usize::from(b.y0) + ty) * row_bytes + x0;
                canvas[at..at + tile_row].copy_from_slice(src);
            }
        }

        let rows = height as usize;
        for y in 0..rows / 2 {
            if y % 16 == 0 {
                stop.check()?;
            }
            let (top, bottom) = canvas.split_at_mut((rows - 1 - y) * row_bytes);
            top[y * row_bytes..(y + 1) * row_bytes].swap_with_slice(&mut bottom[..row_bytes]);
        }
        Ok(canvas)
    }

    /// One tile in canvas layout, rows top to bottom as stored.
    fn decode_tile(&self, tile: &MayaTile<'_>, input: &[u8]) -> Result<Vec<u8>, IffError> {
        let cs = self.header.channels();
        let bpc = self.header.bytes_per_channel();
        let count = tile.width() * tile.height();
        let mut cur = Cursor::new(tile.payload(input));

        let compressed = tile.is_compressed(cs, bpc);
        if compressed && self.header.compression() != MayaCompression::Rle {
            return Err(IffError::UnsupportedPixelLayout(format!(
                "Maya tile compression {:?}",
                self.header.compression()
            )));
        }

        // Source samples, channel-major when compressed, pixel-major otherwise.
        let mut src = vec![0u8; count * cs * bpc];
        if compressed {
            for plane in src.chunks_exact_mut(count) {
                let actual = unpack_maya_rle(&mut cur, plane)?;
                if actual < count {
                    return Err(IffError::CompressionDecodeFailure {
                        expected: count,
                        actual,
                    });
                }
            }
        } else {
            cur.read_exact(&mut src)?;
        }

        let mut out = vec![0u8; count * self.layout.bytes_per_pixel()];
        match bpc {
            1 => {
                for (i, px) in out.chunks_exact_mut(cs).enumerate() {
                    for c in 0..cs {
                        px[cs - 1 - c] = if compressed {
                            src[c * count + i]
                        } else {
                            src[i * cs + c]
                        };
                    }
                }
            }
            _ => {
                for (i, px) in out.chunks_exact_mut(8).enumerate() {
                    let mut rgba = [0xFFFFu16; 4];
                    for c in 0..cs {
                        let (hi, lo) = if compressed {
                            (src[c * count + i], src[(cs + c) * count + i])
                        } else {
                            (src[(i * cs + c) * 2], src[(i * cs + c) * 2 + 1])
                        };
                        rgba[cs - 1 - c] = u16::from_be_bytes([hi, lo]);
                    }
                    for (dst, v) in px.chunks_exact_mut(2).zip(rgba) {
                        dst.copy_from_slice(&v.to_ne_bytes());
                    }
                }
            }
        }
        Ok(out)
    }
}
