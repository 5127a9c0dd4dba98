//! Views over the classic ILBM / PBM / ACBM property and body chunks.

use alloc::vec::Vec;

use bitflags::bitflags;

use super::{ChunkId, ChunkNode, ChunkVariant};

fn be_u16(data: &[u8], at: usize) -> u16 {
    data.get(at..at + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .unwrap_or(0)
}

/// BMHD masking technique.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Masking {
    None,
    /// One extra mask plane follows the bitplanes of every row.
    HasMask,
    TransparentColor,
    Lasso,
    Other(u8),
}

impl From<u8> for Masking {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::None,
            1 => Self::HasMask,
            2 => Self::TransparentColor,
            3 => Self::Lasso,
            v => Self::Other(v),
        }
    }
}

/// BMHD body compression.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    None,
    /// PackBits-style run length encoding.
    ByteRun1,
    Other(u8),
}

impl From<u8> for Compression {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::None,
            1 => Self::ByteRun1,
            v => Self::Other(v),
        }
    }
}

/// `BMHD`: image geometry and body encoding.
///
/// ```text
/// 0  u16 width        8  u8 planes       12 u16 transparent color
/// 2  u16 height       9  u8 masking      14 u8  x aspect
/// 4  i16 left         10 u8 compression  15 u8  y aspect
/// 6  i16 top          11 u8 pad          16 i16 page width
///                                        18 i16 page height
/// ```
#[derive(Clone, Copy, Debug)]
pub struct BitmapHeader<'a> {
    node: &'a ChunkNode,
}

impl<'a> ChunkVariant<'a> for BitmapHeader<'a> {
    const IDS: &'static [ChunkId] = &[ChunkId::BMHD];

    fn wrap(node: &'a ChunkNode) -> Self {
        Self { node }
    }

    fn node(&self) -> &'a ChunkNode {
        self.node
    }
}

impl BitmapHeader<'_> {
    pub fn is_valid(&self) -> bool {
        self.node.data().len() >= 20
    }

    fn bytes(&self) -> &[u8] {
        if self.is_valid() { self.node.data() } else { &[] }
    }

    fn u8_at(&self, at: usize) -> u8 {
        self.bytes().get(at).copied().unwrap_or(0)
    }

    pub fn width(&self) -> u16 {
        be_u16(self.bytes(), 0)
    }

    pub fn height(&self) -> u16 {
        be_u16(self.bytes(), 2)
    }

    pub fn left(&self) -> i16 {
        be_u16(self.bytes(), 4) as i16
    }

    pub fn top(&self) -> i16 {
        be_u16(self.bytes(), 6) as i16
    }

    pub fn planes(&self) -> u8 {
        self.u8_at(8)
    }

    pub fn masking(&self) -> Masking {
        Masking::from(self.u8_at(9))
    }

    pub fn compression(&self) -> Compression {
        Compression::from(self.u8_at(10))
    }

    pub fn transparent_color(&self) -> u16 {
        be_u16(self.bytes(), 12)
    }

    pub fn x_aspect(&self) -> u8 {
        self.u8_at(14)
    }

    pub fn y_aspect(&self) -> u8 {
        self.u8_at(15)
    }

    pub fn page_width(&self) -> i16 {
        be_u16(self.bytes(), 16) as i16
    }

    pub fn page_height(&self) -> i16 {
        be_u16(self.bytes(), 18) as i16
    }

    /// Bytes in one bitplane row: width rounded up to 16 pixels.
    pub fn row_stride(&self) -> usize {
        usize::from(self.width()).div_ceil(16) * 2
    }
}

/// `CMAP` (RGB triples) or `CMYK` (4-byte entries converted to RGB).
#[derive(Clone, Copy, Debug)]
pub struct Palette<'a> {
    node: &'a ChunkNode,
}

impl<'a> ChunkVariant<'a> for Palette<'a> {
    const IDS: &'static [ChunkId] = &[ChunkId::CMAP, ChunkId::CMYK];

    fn wrap(node: &'a ChunkNode) -> Self {
        Self { node }
    }

    fn node(&self) -> &'a ChunkNode {
        self.node
    }
}

impl Palette<'_> {
    pub fn is_cmyk(&self) -> bool {
        self.node.id() == ChunkId::CMYK
    }

    fn entry_size(&self) -> usize {
        if self.is_cmyk() { 4 } else { 3 }
    }

    pub fn count(&self) -> usize {
        self.node.data().len() / self.entry_size()
    }

    pub fn color(&self, index: usize) -> Option<[u8; 3]> {
        let n = self.entry_size();
        let e = self.node.data().get(index * n..index * n + n)?;
        Some(if self.is_cmyk() {
            cmyk_to_rgb(e[0], e[1], e[2], e[3])
        } else {
            [e[0], e[1], e[2]]
        })
    }

    pub fn colors(&self) -> Vec<[u8; 3]> {
        (0..self.count()).filter_map(|i| self.color(i)).collect()
    }
}

fn cmyk_to_rgb(c: u8, m: u8, y: u8, k: u8) -> [u8; 3] {
    let k = 255 - u32::from(k);
    let ch = |v: u8| ((255 - u32::from(v)) * k / 255) as u8;
    [ch(c), ch(m), ch(y)]
}

bitflags! {
    /// Amiga display mode bits stored in `CAMG`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ViewModes: u32 {
        const LACE = 0x0004;
        const EXTRA_HALFBRITE = 0x0080;
        const DUAL_PLAYFIELD = 0x0400;
        /// Hold and modify.
        const HAM = 0x0800;
        const HIRES = 0x8000;
    }
}

/// `CAMG`: Amiga viewport mode.
#[derive(Clone, Copy, Debug)]
pub struct ViewMode<'a> {
    node: &'a ChunkNode,
}

impl<'a> ChunkVariant<'a> for ViewMode<'a> {
    const IDS: &'static [ChunkId] = &[ChunkId::CAMG];

    fn wrap(node: &'a ChunkNode) -> Self {
        Self { node }
    }

    fn node(&self) -> &'a ChunkNode {
        self.node
    }
}

impl ViewMode<'_> {
    pub fn is_valid(&self) -> bool {
        self.node.data().len() == 4
    }

    /// Mode bits; unknown bits are kept. Empty when the chunk is malformed.
    pub fn modes(&self) -> ViewModes {
        match <[u8; 4]>::try_from(self.node.data()) {
            Ok(b) => ViewModes::from_bits_retain(u32::from_be_bytes(b)),
            Err(_) => ViewModes::empty(),
        }
    }
}

/// `DPI `: horizontal and vertical dots per inch.
#[derive(Clone, Copy, Debug)]
pub struct Resolution<'a> {
    node: &'a ChunkNode,
}

impl<'a> ChunkVariant<'a> for Resolution<'a> {
    const IDS: &'static [ChunkId] = &[ChunkId::DPI];

    fn wrap(node: &'a ChunkNode) -> Self {
        Self { node }
    }

    fn node(&self) -> &'a ChunkNode {
        self.node
    }
}

impl Resolution<'_> {
    fn raw(&self) -> (u16, u16) {
        let d = self.node.data();
        (be_u16(d, 0), be_u16(d, 2))
    }

    pub fn is_valid(&self) -> bool {
        let (x, y) = self.raw();
        x > 0 && y > 0
    }

    pub fn x_dpi(&self) -> u16 {
        if self.is_valid() { self.raw().0 } else { 0 }
    }

    pub fn y_dpi(&self) -> u16 {
        if self.is_valid() { self.raw().1 } else { 0 }
    }

    /// Resolution in dots per meter, rounded. `None` when unset.
    pub fn dots_per_meter(&self) -> Option<(u32, u32)> {
        let conv = |dpi: u16| (u32::from(dpi) * 10_000 + 127) / 254;
        self.is_valid()
            .then(|| (conv(self.x_dpi()), conv(self.y_dpi())))
    }
}

/// `BODY` (row-interleaved planes) or `ABIT` (one full plane after another).
///
/// Pixel data is never cached; bytes come from the input on demand.
#[derive(Clone, Copy, Debug)]
pub struct PixelData<'a> {
    node: &'a ChunkNode,
}

impl<'a> ChunkVariant<'a> for PixelData<'a> {
    const IDS: &'static [ChunkId] = &[ChunkId::BODY, ChunkId::ABIT];

    fn wrap(node: &'a ChunkNode) -> Self {
        Self { node }
    }

    fn node(&self) -> &'a ChunkNode {
        self.node
    }
}

impl PixelData<'_> {
    /// Planes are stored contiguously (`ABIT`, ACBM forms).
    pub fn is_contiguous(&self) -> bool {
        self.node.id() == ChunkId::ABIT
    }

    /// The chunk's bytes within `input`, clamped to what is actually present.
    pub fn bytes<'d>(&self, input: &'d [u8]) -> &'d [u8] {
        self.node.read_raw(input, 0, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{Alignment, ChunkKind};
    use alloc::vec;

    fn node(id: ChunkId, kind: ChunkKind, data: Vec<u8>) -> ChunkNode {
        ChunkNode {
            id,
            size: data.len() as u32,
            data_pos: 8,
            align: Alignment::Word,
            depth: 2,
            data: Some(data),
            children: Vec::new(),
            kind,
        }
    }

    #[test]
    fn bitmap_header_fields() {
        let data = vec![
            0x01, 0x40, 0x00, 0xC8, 0xFF, 0xFE, 0x00, 0x03, 6, 1, 1, 0, 0x00, 0x05, 10, 11, 0x01,
            0x40, 0x00, 0xC8,
        ];
        let n = node(ChunkId::BMHD, ChunkKind::Header, data);
        let h = BitmapHeader::from_node(&n).unwrap();
        assert!(h.is_valid());
        assert_eq!((h.width(), h.height()), (320, 200));
        assert_eq!((h.left(), h.top()), (-2, 3));
        assert_eq!(h.planes(), 6);
        assert_eq!(h.masking(), Masking::HasMask);
        assert_eq!(h.compression(), Compression::ByteRun1);
        assert_eq!(h.transparent_color(), 5);
        assert_eq!((h.x_aspect(), h.y_aspect()), (10, 11));
        assert_eq!((h.page_width(), h.page_height()), (320, 200));
        assert_eq!(h.row_stride(), 40);
    }

    #[test]
    fn short_bitmap_header_reads_as_defaults() {
        let n = node(ChunkId::BMHD, ChunkKind::Header, vec![0x01; 19]);
        let h = BitmapHeader::from_node(&n).unwrap();
        assert!(!h.is_valid());
        assert_eq!(h.width(), 0);
        assert_eq!(h.planes(), 0);
        assert_eq!(h.compression(), Compression::None);
        assert_eq!(h.row_stride(), 0);
    }

    #[test]
    fn row_stride_rounds_to_words() {
        for (w, stride) in [(1u16, 2usize), (16, 2), (17, 4), (33, 6)] {
            let mut d = vec![0u8; 20];
            d[..2].copy_from_slice(&w.to_be_bytes());
            let n = node(ChunkId::BMHD, ChunkKind::Header, d);
            assert_eq!(BitmapHeader::from_node(&n).unwrap().row_stride(), stride);
        }
    }

    #[test]
    fn cmyk_palette_converts_to_rgb() {
        let n = node(
            ChunkId::CMYK,
            ChunkKind::Palette,
            vec![0, 0, 0, 0, 255, 0, 0, 0, 0, 0, 0, 255, 0, 0, 0],
        );
        let p = Palette::from_node(&n).unwrap();
        assert_eq!(p.count(), 3);
        assert_eq!(
            p.colors(),
            vec![[255, 255, 255], [0, 255, 255], [0, 0, 0]]
        );
        assert_eq!(p.color(3), None);
    }

    #[test]
    fn cmap_ignores_partial_entry() {
        let n = node(ChunkId::CMAP, ChunkKind::Palette, vec![1, 2, 3, 4, 5]);
        let p = Palette::from_node(&n).unwrap();
        assert_eq!(p.count(), 1);
        assert_eq!(p.colors(), vec![[1, 2, 3]]);
    }

    #[test]
    fn view_mode_requires_four_bytes() {
        let n = node(ChunkId::CAMG, ChunkKind::ViewMode, vec![0, 0, 0x08, 0x80]);
        let m = ViewMode::from_node(&n).unwrap().modes();
        assert!(m.contains(ViewModes::HAM | ViewModes::EXTRA_HALFBRITE));

        let n = node(ChunkId::CAMG, ChunkKind::ViewMode, vec![0, 0, 0x08, 0x80, 0]);
        assert!(ViewMode::from_node(&n).unwrap().modes().is_empty());
    }

    #[test]
    fn resolution_to_dots_per_meter() {
        let n = node(ChunkId::DPI, ChunkKind::Resolution, vec![0, 72, 0, 150]);
        let r = Resolution::from_node(&n).unwrap();
        assert_eq!(r.dots_per_meter(), Some((2835, 5906)));

        let n = node(ChunkId::DPI, ChunkKind::Resolution, vec![0, 72, 0, 0]);
        let r = Resolution::from_node(&n).unwrap();
        assert!(!r.is_valid());
        assert_eq!(r.x_dpi(), 0);
        assert_eq!(r.dots_per_meter(), None);
    }

    #[test]
    fn generic_node_is_not_wrapped() {
        let n = node(ChunkId::BMHD, ChunkKind::Generic, vec![0; 20]);
        assert!(BitmapHeader::from_node(&n).is_none());
        let n = node(ChunkId::CMAP, ChunkKind::Header, vec![0; 20]);
        assert!(BitmapHeader::from_node(&n).is_none());
    }
}
