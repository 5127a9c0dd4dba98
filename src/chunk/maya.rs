//! Views over Maya `FOR4 CIMG` chunks: the `TBHD` header and `RGBA` tiles.

use bitflags::bitflags;

use super::{ChunkId, ChunkKind, ChunkNode, ChunkVariant, TileBounds};
use crate::pixel::PixelLayout;

fn be_u32(data: &[u8], at: usize) -> u32 {
    data.get(at..at + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .unwrap_or(0)
}

fn be_u16(data: &[u8], at: usize) -> u16 {
    data.get(at..at + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .unwrap_or(0)
}

bitflags! {
    /// Image contents declared by `TBHD`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct TileFlags: u32 {
        const RGB = 0x01;
        const ALPHA = 0x02;
        const ZBUFFER = 0x04;
        const BLACK = 0x10;
    }
}

/// Tile compression algorithm named in `TBHD`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MayaCompression {
    Uncompressed,
    Rle,
    Other(u32),
}

/// `TBHD`: canvas size, channel set and tiling.
#[derive(Clone, Copy, Debug)]
pub struct MayaHeader<'a> {
    node: &'a ChunkNode,
}

impl<'a> ChunkVariant<'a> for MayaHeader<'a> {
    const IDS: &'static [ChunkId] = &[ChunkId::TBHD];

    fn wrap(node: &'a ChunkNode) -> Self {
        Self { node }
    }

    fn node(&self) -> &'a ChunkNode {
        self.node
    }
}

impl MayaHeader<'_> {
    /// 24 bytes, or 32 with the trailing origin.
    pub fn is_valid(&self) -> bool {
        matches!(self.node.data().len(), 24 | 32)
    }

    fn bytes(&self) -> &[u8] {
        if self.is_valid() { self.node.data() } else { &[] }
    }

    pub fn width(&self) -> u32 {
        be_u32(self.bytes(), 0)
    }

    pub fn height(&self) -> u32 {
        be_u32(self.bytes(), 4)
    }

    pub fn flags(&self) -> TileFlags {
        TileFlags::from_bits_retain(be_u32(self.bytes(), 12))
    }

    /// Bytes per channel: 2 when the depth field is set, 1 otherwise.
    pub fn bytes_per_channel(&self) -> usize {
        if be_u16(self.bytes(), 16) != 0 { 2 } else { 1 }
    }

    /// Number of tiles, as stored (16 bits, may have wrapped).
    pub fn tiles(&self) -> u16 {
        be_u16(self.bytes(), 18)
    }

    pub fn compression(&self) -> MayaCompression {
        match be_u32(self.bytes(), 20) {
            0 => MayaCompression::Uncompressed,
            1 => MayaCompression::Rle,
            v => MayaCompression::Other(v),
        }
    }

    /// Canvas origin; only present in the 32-byte form.
    pub fn origin(&self) -> (u32, u32) {
        (be_u32(self.bytes(), 24), be_u32(self.bytes(), 28))
    }

    /// 4 for RGBA, 3 for RGB, 0 for anything this decoder cannot composite.
    pub fn channels(&self) -> usize {
        let flags = self.flags();
        if flags == TileFlags::RGB | TileFlags::ALPHA {
            4
        } else if flags == TileFlags::RGB {
            3
        } else {
            0
        }
    }

    /// Canvas layout, `None` when the channel set is unsupported.
    pub fn layout(&self) -> Option<PixelLayout> {
        match (self.channels(), self.bytes_per_channel()) {
            (4, 2) => Some(PixelLayout::Rgba16),
            (4, _) => Some(PixelLayout::Rgba8),
            (3, 2) => Some(PixelLayout::Rgbx16),
            (3, _) => Some(PixelLayout::Rgb8),
            _ => None,
        }
    }
}

/// `RGBA`: one tile. The first 8 bytes are the inclusive bounds
/// `x0, y0, x1, y1` (u16), the rest is channel data.
#[derive(Clone, Copy, Debug)]
pub struct MayaTile<'a> {
    node: &'a ChunkNode,
}

impl<'a> ChunkVariant<'a> for MayaTile<'a> {
    const IDS: &'static [ChunkId] = &[ChunkId::RGBA];

    fn wrap(node: &'a ChunkNode) -> Self {
        Self { node }
    }

    fn node(&self) -> &'a ChunkNode {
        self.node
    }
}

impl MayaTile<'_> {
    pub fn bounds(&self) -> TileBounds {
        match self.node.kind {
            ChunkKind::MayaTile(b) => b,
            _ => TileBounds {
                x0: 0,
                y0: 0,
                x1: 0,
                y1: 0,
            },
        }
    }

    pub fn width(&self) -> usize {
        let b = self.bounds();
        usize::from(b.x1 - b.x0) + 1
    }

    pub fn height(&self) -> usize {
        let b = self.bounds();
        usize::from(b.y1 - b.y0) + 1
    }

    /// Declared channel data length (chunk size minus the bounds).
    pub fn payload_len(&self) -> usize {
        (self.node.size as usize).saturating_sub(8)
    }

    /// Channel data within `input`, clamped to what is actually present.
    pub fn payload<'d>(&self, input: &'d [u8]) -> &'d [u8] {
        self.node.read_raw(input, 8, None)
    }

    /// A tile is compressed when its payload is shorter than the raw pixels.
    pub fn is_compressed(&self, channels: usize, bytes_per_channel: usize) -> bool {
        let raw = channels
            .saturating_mul(self.width())
            .saturating_mul(self.height())
            .saturating_mul(bytes_per_channel);
        raw > self.payload_len()
    }
}
