//! Classic `FORM ILBM` / `PBM ` / `ACBM` pixel reconstruction.

mod planar;

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;

use enough::Stop;
use log::warn;

use crate::chunk::{
    BitmapHeader, ChunkForest, ChunkId, ChunkKind, Compression, Masking, NodeId, Palette,
    PixelData, ViewMode, ViewModes,
};
use crate::cursor::Cursor;
use crate::error::IffError;
use crate::info::IffDialect;
use crate::limits::{Limits, check_canvas};
use crate::pixel::PixelLayout;
use crate::rle::unpack_bits;

/// How row groups turn into pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PlaneMode {
    /// Stored rows are already packed pixels.
    Chunky,
    Ham,
    HalfBrite,
    Indexed,
    /// 24 or 32 planes, 8 per channel.
    Deep,
}

/// Display modes, inferred from the plane count and palette size when the
/// form has no `CAMG`.
fn view_modes(camg: Option<ViewMode<'_>>, planes: u8, palette_len: usize) -> ViewModes {
    if let Some(camg) = camg {
        return camg.modes();
    }
    if (1..=8).contains(&planes) && palette_len == 1 << (planes - 1) {
        ViewModes::EXTRA_HALFBRITE
    } else if planes == 6 {
        ViewModes::HAM
    } else {
        ViewModes::empty()
    }
}

/// A classic image form, ready to reconstruct.
#[derive(Debug)]
pub(crate) struct ClassicImage<'a> {
    header: BitmapHeader<'a>,
    body: PixelData<'a>,
    dialect: IffDialect,
    mode: PlaneMode,
    layout: PixelLayout,
    palette: Vec<[u8; 3]>,
}

impl<'a> ClassicImage<'a> {
    /// Inspect the form at `form` and pick a reconstruction.
    pub(crate) fn from_form(forest: &'a ChunkForest, form: NodeId) -> Result<Self, IffError> {
        let node = forest.node(form);
        let dialect = match node.kind() {
            ChunkKind::Container { form_type } => match *form_type {
                ChunkId::ILBM => IffDialect::Ilbm,
                ChunkId::PBM => IffDialect::Pbm,
                ChunkId::ACBM => IffDialect::Acbm,
                other => {
                    return Err(IffError::UnsupportedPixelLayout(format!(
                        "form type {other}"
                    )));
                }
            },
            _ => return Err(IffError::UnrecognizedFormat),
        };
        let scope = node.children();

        let header = forest
            .first_variant::<BitmapHeader<'_>>(scope)
            .filter(BitmapHeader::is_valid)
            .ok_or_else(|| IffError::InvalidStructure("missing or short BMHD".into()))?;
        let body = forest
            .first_variant::<PixelData<'_>>(scope)
            .ok_or_else(|| IffError::InvalidStructure("no BODY or ABIT chunk".into()))?;
        if header.width() == 0 || header.height() == 0 {
            return Err(IffError::InvalidStructure(format!(
                "zero image size {}x{}",
                header.width(),
                header.height()
            )));
        }
        for id in [ChunkId::SHAM, ChunkId::CTBL] {
            if !forest.search_id(scope, id).is_empty() {
                return Err(IffError::UnsupportedPixelLayout(format!(
                    "{id} multi-palette images"
                )));
            }
        }

        let mut palette = forest
            .first_variant::<Palette<'_>>(scope)
            .map(|p| p.colors())
            .unwrap_or_default();
        let planes = header.planes();
        // a malformed CAMG still counts as present and selects no modes
        let camg = forest.first_variant::<ViewMode<'_>>(scope);
        let modes = view_modes(camg, planes, palette.len());
        let has_palette = !palette.is_empty();
        let gray_or_indexed = if has_palette {
            PixelLayout::Indexed8
        } else {
            PixelLayout::Gray8
        };

        let (mode, layout) = match (dialect, planes) {
            (_, 1) => (PlaneMode::Chunky, PixelLayout::Mono),
            (IffDialect::Pbm, 8) => (PlaneMode::Chunky, gray_or_indexed),
            (IffDialect::Pbm, 24) => (PlaneMode::Chunky, PixelLayout::Rgb8),
            (IffDialect::Pbm, 32) => (PlaneMode::Chunky, PixelLayout::Rgba8),
            (IffDialect::Pbm, n) => {
                return Err(IffError::UnsupportedPixelLayout(format!(
                    "PBM with {n} planes"
                )));
            }
            (_, 5..=8) if modes.contains(ViewModes::HAM) && has_palette => {
                (PlaneMode::Ham, PixelLayout::Rgb8)
            }
            (_, 2..=8) if modes.contains(ViewModes::EXTRA_HALFBRITE) && has_palette => {
                (PlaneMode::HalfBrite, PixelLayout::Indexed8)
            }
            (_, 2..=8) => (PlaneMode::Indexed, gray_or_indexed),
            (_, 24) => (PlaneMode::Deep, PixelLayout::Rgb8),
            (_, 32) => (PlaneMode::Deep, PixelLayout::Rgba8),
            (_, n) => {
                return Err(IffError::UnsupportedPixelLayout(format!("{n} bitplanes")));
            }
        };

        if mode == PlaneMode::Ham && palette.len() < 1 << (planes - 2) {
            warn!(
                "HAM{planes} palette has {} of {} entries; missing entries read as black",
                palette.len(),
                1 << (planes - 2)
            );
        }
        if mode == PlaneMode::HalfBrite {
            // entries past the half-brite bit are unreachable
            palette.truncate(1 << (planes - 1));
        }

        Ok(Self {
            header,
            body,
            dialect,
            mode,
            layout,
            palette,
        })
    }

    pub(crate) fn width(&self) -> u32 {
        u32::from(self.header.width())
    }

    pub(crate) fn height(&self) -> u32 {
        u32::from(self.header.height())
    }

    pub(crate) fn dialect(&self) -> IffDialect {
        self.dialect
    }

    pub(crate) fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Color table for indexed output. Half-Brite appends the darker copies.
    pub(crate) fn output_palette(&self) -> Option<Vec<[u8; 3]>> {
        if !self.layout.is_indexed() || self.palette.is_empty() {
            return None;
        }
        let mut palette = self.palette.clone();
        if self.mode == PlaneMode::HalfBrite {
            palette.extend(self.palette.iter().map(|c| c.map(|v| v / 2)));
        }
        Some(palette)
    }

    fn planes(&self) -> usize {
        usize::from(self.header.planes())
    }

    /// Bytes in one stored row group.
    fn group_len(&self) -> usize {
        if self.dialect == IffDialect::Pbm {
            let bits = self.width() as usize * self.planes();
            return bits.div_ceil(8).next_multiple_of(2);
        }
        let mask = usize::from(
            self.header.masking() == Masking::HasMask && !self.body.is_contiguous(),
        );
        self.header.row_stride() * (self.planes() + mask)
    }

    /// Decode every row into a tightly packed canvas.
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

        let mut pixels = vec![0u8; total];
        let mut reader = StrideReader::new(self, input);
        for (y, dst) in pixels.chunks_exact_mut(row_bytes).enumerate() {
            if y % 16 == 0 {
                stop.check()?;
            }
            let row = reader
                .next_stride()
                .inspect_err(|e| warn!("scanline {y} of {height}: {e}"))?
                .ok_or(IffError::UnexpectedEof)?;
            dst.copy_from_slice(row);
        }
        Ok(pixels)
    }
}

/// Row-at-a-time reconstruction session over one image's pixel data.
///
/// [`reset`](Self::reset) rewinds to row 0.
pub(crate) struct StrideReader<'a, 'i> {
    image: &'i ClassicImage<'a>,
    data: &'a [u8],
    cur: Cursor<'a>,
    group: Vec<u8>,
    row: Vec<u8>,
    y: usize,
}

impl<'a, 'i> StrideReader<'a, 'i> {
    pub(crate) fn new(image: &'i ClassicImage<'a>, input: &'a [u8]) -> Self {
        let data = image.body.bytes(input);
        let mut reader = Self {
            image,
            data,
            cur: Cursor::new(data),
            group: Vec::new(),
            row: Vec::new(),
            y: 0,
        };
        reader.reset();
        reader
    }

    pub(crate) fn reset(&mut self) {
        let image = self.image;
        self.cur = Cursor::new(self.data);
        self.group = vec![0; image.group_len()];
        self.row = vec![0; image.layout.row_bytes(image.width()).unwrap_or(0)];
        self.y = 0;
    }

    /// Reconstruct the next row, or `None` once every row has been read.
    pub(crate) fn next_stride(&mut self) -> Result<Option<&[u8]>, IffError> {
        let image = self.image;
        if self.y >= image.height() as usize {
            return Ok(None);
        }
        if image.body.is_contiguous() {
            self.read_contiguous()?;
        } else {
            self.read_interleaved()?;
        }
        self.y += 1;

        let stride = if image.dialect == IffDialect::Pbm {
            self.group.len()
        } else {
            image.header.row_stride()
        };
        let planes = image.planes();
        let (group, row) = (&self.group, &mut self.row);
        match image.mode {
            PlaneMode::Chunky => {
                let n = row.len();
                row.copy_from_slice(&group[..n])
            }
            PlaneMode::Ham => planar::ham(group, stride, planes, &image.palette, row),
            PlaneMode::HalfBrite => {
                planar::half_brite(group, stride, planes, image.palette.len(), row)
            }
            PlaneMode::Indexed => planar::indices(group, stride, planes, row),
            PlaneMode::Deep => planar::deep(group, stride, planes, row),
        }
        Ok(Some(self.row.as_slice()))
    }

    /// `BODY`: one row group, optionally ByteRun1 packed, mask plane last.
    fn read_interleaved(&mut self) -> Result<(), IffError> {
        match self.image.header.compression() {
            Compression::None => self.cur.read_exact(&mut self.group),
            Compression::ByteRun1 => {
                let actual = unpack_bits(&mut self.cur, &mut self.group, true);
                if actual < self.group.len() {
                    return Err(IffError::CompressionDecodeFailure {
                        expected: self.group.len(),
                        actual,
                    });
                }
                Ok(())
            }
            Compression::Other(c) => Err(IffError::UnsupportedPixelLayout(format!(
                "BMHD compression {c}"
            ))),
        }
    }

    /// `ABIT`: gather row `y` of every plane into one row group.
    fn read_contiguous(&mut self) -> Result<(), IffError> {
        let image = self.image;
        let stride = image.header.row_stride();
        let plane_len = stride * image.height() as usize;
        for (p, dst) in self.group.chunks_exact_mut(stride).enumerate() {
            self.cur.seek(p * plane_len + self.y * stride)?;
            self.cur.read_exact(dst)?;
        }
        Ok(())
    }
}
