//! IFF chunk tree: tags, nodes, the parsed forest and typed chunk views.
//!
//! A stream is parsed once into a [`ChunkForest`], an arena of immutable
//! [`ChunkNode`]s addressed by [`NodeId`]. Each node is classified by tag
//! into a [`ChunkKind`]; typed views implementing [`ChunkVariant`] read
//! values out of a node's cached bytes and fall back to defaults when the
//! node is structurally wrong (for example a `BMHD` shorter than 20 bytes).
//!
//! Format references:
//! - <https://wiki.amigaos.net/wiki/IFF_FORM_and_Chunk_Registry>
//! - <https://www.fileformat.info/format/iff/egff.htm>

mod ilbm;
mod maya;
mod meta;
mod tree;

pub use ilbm::{
    BitmapHeader, Compression, Masking, Palette, PixelData, Resolution, ViewMode, ViewModes,
};
pub use maya::{MayaCompression, MayaHeader, MayaTile, TileFlags};
pub use meta::{
    Annotation, Author, Copyright, DateStamp, Exif, IccName, IccProfile, Name, Version, Xmp,
};
pub use tree::ChunkForest;

use alloc::vec::Vec;
use core::fmt;

/// Chunks larger than this are never cached; read them on demand.
pub const MAX_CACHED_CHUNK_BYTES: u32 = 8 * 1024 * 1024;

/// Nodes at this nesting depth (roots are depth 1) are parsed as leaves.
pub const RECURSION_LIMIT: u32 = 10;

/// Four-byte chunk identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(pub [u8; 4]);

impl ChunkId {
    // Containers (classic)
    pub const CAT: Self = Self(*b"CAT ");
    pub const FILL: Self = Self(*b"    ");
    pub const FORM: Self = Self(*b"FORM");
    pub const LIST: Self = Self(*b"LIST");
    pub const PROP: Self = Self(*b"PROP");

    // Containers (Maya)
    pub const CAT4: Self = Self(*b"CAT4");
    pub const FOR4: Self = Self(*b"FOR4");
    pub const LIS4: Self = Self(*b"LIS4");
    pub const PRO4: Self = Self(*b"PRO4");

    // Form types
    pub const ILBM: Self = Self(*b"ILBM");
    pub const PBM: Self = Self(*b"PBM ");
    pub const ACBM: Self = Self(*b"ACBM");
    pub const CIMG: Self = Self(*b"CIMG");
    pub const TBMP: Self = Self(*b"TBMP");

    // FORM ILBM / PBM / ACBM
    pub const ABIT: Self = Self(*b"ABIT");
    pub const BMHD: Self = Self(*b"BMHD");
    pub const BODY: Self = Self(*b"BODY");
    pub const CAMG: Self = Self(*b"CAMG");
    pub const CMAP: Self = Self(*b"CMAP");
    pub const CMYK: Self = Self(*b"CMYK");
    pub const CTBL: Self = Self(*b"CTBL");
    pub const DPI: Self = Self(*b"DPI ");
    pub const SHAM: Self = Self(*b"SHAM");

    // FOR4 CIMG
    pub const RGBA: Self = Self(*b"RGBA");
    pub const TBHD: Self = Self(*b"TBHD");

    // Metadata
    pub const ANNO: Self = Self(*b"ANNO");
    pub const AUTH: Self = Self(*b"AUTH");
    pub const COPY: Self = Self(*b"(c) ");
    pub const DATE: Self = Self(*b"DATE");
    pub const EXIF: Self = Self(*b"EXIF");
    pub const ICCN: Self = Self(*b"ICCN");
    pub const ICCP: Self = Self(*b"ICCP");
    pub const NAME: Self = Self(*b"NAME");
    pub const VERS: Self = Self(*b"VERS");
    pub const XMP0: Self = Self(*b"XMP0");

    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Printable ASCII (0x20..=0x7E) with no leading space.
    pub fn is_valid(&self) -> bool {
        self.0[0] != b' ' && self.0.iter().all(|&c| (0x20..=0x7E).contains(&c))
    }

    /// The all-space filler id, which is legal despite its leading space.
    pub fn is_filler(&self) -> bool {
        *self == Self::FILL
    }

    /// Version encoded in the fourth byte: `'2'..='9'` give 2 to 9,
    /// anything else is version 1.
    pub fn version(&self) -> u8 {
        match self.0[3] {
            c @ b'2'..=b'9' => c - b'0',
            _ => 1,
        }
    }

    /// Whether this id belongs to the `requested` chunk family.
    ///
    /// Exact matches always count. When `requested` carries a version
    /// (e.g. `DAT2`), any id sharing the first three bytes with an equal or
    /// newer version also matches.
    pub fn is_type(&self, requested: ChunkId) -> bool {
        if *self == requested {
            return true;
        }
        let wanted = requested.version();
        wanted > 1 && self.0[..3] == requested.0[..3] && self.version() >= wanted
    }

    /// Container tags that carry a form type and children.
    pub fn is_container(&self) -> bool {
        matches!(
            *self,
            Self::CAT | Self::FORM | Self::LIST | Self::PROP | Self::CAT4 | Self::FOR4
                | Self::LIS4 | Self::PRO4
        )
    }

    /// Tags whose own alignment carries over to the siblings that follow.
    pub(crate) fn sets_sibling_alignment(&self) -> bool {
        self.is_container() || self.is_filler()
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            write!(f, "{}", core::ascii::escape_default(b))?;
        }
        Ok(())
    }
}

impl fmt::Debug for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkId(\"{self}\")")
    }
}

/// Padding rule applied after a chunk's data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Alignment {
    /// Classic IFF: 2-byte boundaries.
    Word,
    /// Maya IFF: 4-byte boundaries.
    Long,
}

impl Alignment {
    pub fn bytes(self) -> u64 {
        match self {
            Self::Word => 2,
            Self::Long => 4,
        }
    }

    /// Round `pos` up to the next boundary.
    pub fn align(self, pos: u64) -> u64 {
        let a = self.bytes();
        pos.div_ceil(a) * a
    }

    /// Intrinsic alignment of a tag, if it has one.
    pub(crate) fn of(id: ChunkId) -> Option<Self> {
        match id {
            ChunkId::FOR4 | ChunkId::CAT4 | ChunkId::LIS4 | ChunkId::PRO4 => Some(Self::Long),
            ChunkId::TBHD | ChunkId::RGBA => Some(Self::Long),
            ChunkId::FORM | ChunkId::CAT | ChunkId::LIST | ChunkId::PROP | ChunkId::FILL => {
                Some(Self::Word)
            }
            _ => None,
        }
    }
}

/// Index of a node inside a [`ChunkForest`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Inclusive tile rectangle of a Maya `RGBA` chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileBounds {
    pub x0: u16,
    pub y0: u16,
    pub x1: u16,
    pub y1: u16,
}

/// Tag-dispatched classification of a parsed chunk.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChunkKind {
    /// Unknown tag, or a known one parsed past the recursion limit.
    Generic,
    /// `FORM`, `FOR4`, `CAT `, `LIST`, `PROP` and the Maya list family.
    Container { form_type: ChunkId },
    /// `BMHD`
    Header,
    /// `CMAP` or `CMYK`
    Palette,
    /// `CAMG`
    ViewMode,
    /// `DPI `
    Resolution,
    /// `BODY` or `ABIT`
    PixelData,
    /// `TBHD`
    MayaHeader,
    /// `RGBA`
    MayaTile(TileBounds),
    /// Author, date, annotation, color profile and friends.
    Metadata,
}

/// One parsed chunk.
///
/// Equality is structural identity: same id, declared length and data
/// offset. Children and cached bytes are not compared.
#[derive(Clone, Debug)]
pub struct ChunkNode {
    pub(crate) id: ChunkId,
    pub(crate) size: u32,
    pub(crate) data_pos: usize,
    pub(crate) align: Alignment,
    pub(crate) depth: u32,
    pub(crate) data: Option<Vec<u8>>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) kind: ChunkKind,
}

impl ChunkNode {
    pub fn id(&self) -> ChunkId {
        self.id
    }

    /// Declared data length (excluding the 8-byte header and padding).
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Absolute offset of the first data byte.
    pub fn data_offset(&self) -> usize {
        self.data_pos
    }

    pub fn alignment(&self) -> Alignment {
        self.align
    }

    /// Nesting depth; root chunks are depth 1.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn kind(&self) -> &ChunkKind {
        &self.kind
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Offset of the next sibling: data end rounded up to the alignment.
    pub fn end_offset(&self) -> u64 {
        self.align.align(self.data_pos as u64 + u64::from(self.size))
    }

    /// Cached chunk bytes, empty when the chunk was not cached.
    pub fn data(&self) -> &[u8] {
        self.data.as_deref().unwrap_or_default()
    }

    pub fn is_cached(&self) -> bool {
        self.data.is_some()
    }

    /// Read chunk bytes straight from the input, bypassing the cache.
    ///
    /// `rel` is relative to the data start; `len` of `None` means "to the end
    /// of the chunk". The result is clamped to both the chunk and the input.
    pub fn read_raw<'d>(&self, input: &'d [u8], rel: usize, len: Option<usize>) -> &'d [u8] {
        let chunk_len = self.size as usize;
        let rel = rel.min(chunk_len);
        let len = len.unwrap_or(chunk_len).min(chunk_len - rel);
        let start = self.data_pos.saturating_add(rel).min(input.len());
        let end = start.saturating_add(len).min(input.len());
        &input[start..end]
    }

    pub(crate) fn form_type(&self) -> Option<ChunkId> {
        match self.kind {
            ChunkKind::Container { form_type } => Some(form_type),
            _ => None,
        }
    }
}

impl PartialEq for ChunkNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.size == other.size && self.data_pos == other.data_pos
    }
}

impl Eq for ChunkNode {}

/// A typed view over a [`ChunkNode`] of a particular tag family.
pub trait ChunkVariant<'a>: Sized {
    /// Tags this view interprets.
    const IDS: &'static [ChunkId];

    fn wrap(node: &'a ChunkNode) -> Self;

    fn node(&self) -> &'a ChunkNode;

    /// Wrap `node` if its tag belongs to this view and it was parsed as such.
    fn from_node(node: &'a ChunkNode) -> Option<Self> {
        let parsed = !matches!(node.kind, ChunkKind::Generic);
        (parsed && Self::IDS.contains(&node.id)).then(|| Self::wrap(node))
    }
}

/// A `FORM`/`FOR4`/`LIST`/... node together with its form type.
#[derive(Clone, Copy, Debug)]
pub struct Container<'a> {
    node: &'a ChunkNode,
}

impl<'a> ChunkVariant<'a> for Container<'a> {
    const IDS: &'static [ChunkId] = &[
        ChunkId::CAT,
        ChunkId::FORM,
        ChunkId::LIST,
        ChunkId::PROP,
        ChunkId::CAT4,
        ChunkId::FOR4,
        ChunkId::LIS4,
        ChunkId::PRO4,
    ];

    fn wrap(node: &'a ChunkNode) -> Self {
        Self { node }
    }

    fn node(&self) -> &'a ChunkNode {
        self.node
    }
}

impl Container<'_> {
    /// The four-byte type following the container header (`ILBM`, `CIMG`, ...).
    pub fn form_type(&self) -> ChunkId {
        self.node.form_type().unwrap_or(ChunkId([0; 4]))
    }
}
