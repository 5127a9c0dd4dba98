use alloc::vec::Vec;

use enough::Stop;
use log::warn;
#[cfg(feature = "rgb")]
use rgb::AsPixels as _;

use crate::chunk::{ChunkForest, ChunkId, NodeId};
use crate::error::IffError;
use crate::ilbm::ClassicImage;
use crate::info::{IffDialect, detect};
use crate::limits::Limits;
use crate::maya::MayaImage;
use crate::metadata::Metadata;
use crate::pixel::PixelLayout;

/// Decoded image output.
#[derive(Clone, Debug)]
pub struct DecodeOutput {
    pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    pub dialect: IffDialect,
    /// Color table for `Mono` and `Indexed8` output.
    pub palette: Option<Vec<[u8; 3]>>,
    pub metadata: Metadata,
}

impl DecodeOutput {
    /// Access the pixel data, rows top to bottom with no padding.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Bytes per row (`Mono` rows are `ceil(width / 8)` bytes).
    pub fn row_bytes(&self) -> usize {
        self.layout.row_bytes(self.width).unwrap_or(0)
    }

    /// Row `y`, or `None` past the last row.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        let n = self.row_bytes();
        let start = (y as usize).checked_mul(n)?;
        self.pixels.get(start..start.checked_add(n)?)
    }

    /// Reinterpret pixel data as typed pixel slice.
    ///
    /// Returns [`crate::IffError::LayoutMismatch`] if the pixel layout doesn't match `P`.
    #[cfg(feature = "rgb")]
    pub fn as_pixels<P: crate::DecodePixel>(&self) -> Result<&[P], IffError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        if !self.layout.is_memory_compatible(P::layout()) {
            return Err(IffError::LayoutMismatch {
                expected: P::layout(),
                actual: self.layout,
            });
        }
        Ok(self.pixels().as_pixels())
    }

    /// Zero-copy view as an [`imgref::ImgRef`] of typed pixels.
    ///
    /// Returns [`crate::IffError::LayoutMismatch`] if the pixel layout doesn't match `P`.
    #[cfg(feature = "imgref")]
    pub fn as_imgref<P: crate::DecodePixel>(&self) -> Result<imgref::ImgRef<'_, P>, IffError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        let pixels: &[P] = self.as_pixels()?;
        Ok(imgref::ImgRef::new(
            pixels,
            self.width as usize,
            self.height as usize,
        ))
    }

    /// Convert to an [`imgref::ImgVec`] of typed pixels.
    #[cfg(feature = "imgref")]
    pub fn to_imgvec<P: crate::DecodePixel>(&self) -> Result<imgref::ImgVec<P>, IffError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        let pixels: &[P] = self.as_pixels()?;
        Ok(imgref::ImgVec::new(
            pixels.to_vec(),
            self.width as usize,
            self.height as usize,
        ))
    }
}

/// A supported image form found in a chunk forest.
pub(crate) enum Image<'a> {
    Classic(ClassicImage<'a>),
    Maya(MayaImage<'a>),
}

impl<'a> Image<'a> {
    /// Every image form in stream order, classic forms first. Forms that
    /// cannot be decoded yield their error.
    pub(crate) fn candidates(
        forest: &'a ChunkForest,
    ) -> impl Iterator<Item = Result<(NodeId, Image<'a>), IffError>> + 'a {
        let roots = forest.roots();
        let classic = forest
            .search(roots, |n| {
                n.id() == ChunkId::FORM
                    && matches!(
                        n.form_type(),
                        Some(ChunkId::ILBM | ChunkId::PBM | ChunkId::ACBM)
                    )
            })
            .into_iter()
            .map(move |form| {
                ClassicImage::from_form(forest, form).map(|i| (form, Image::Classic(i)))
            });
        let maya = forest
            .search(roots, |n| {
                n.id() == ChunkId::FOR4
                    && matches!(n.form_type(), Some(ChunkId::CIMG | ChunkId::TBMP))
            })
            .into_iter()
            .map(move |form| {
                MayaImage::from_form(forest, form).map(|i| (form, Image::Maya(i)))
            });
        classic.chain(maya).inspect(|c| {
            if let Err(e) = c {
                warn!("skipping image form: {e}");
            }
        })
    }

    pub(crate) fn width(&self) -> u32 {
        match self {
            Self::Classic(i) => i.width(),
            Self::Maya(i) => i.width(),
        }
    }

    pub(crate) fn height(&self) -> u32 {
        match self {
            Self::Classic(i) => i.height(),
            Self::Maya(i) => i.height(),
        }
    }

    pub(crate) fn layout(&self) -> PixelLayout {
        match self {
            Self::Classic(i) => i.layout(),
            Self::Maya(i) => i.layout(),
        }
    }

    pub(crate) fn dialect(&self) -> IffDialect {
        match self {
            Self::Classic(i) => i.dialect(),
            Self::Maya(_) => IffDialect::Maya,
        }
    }

    fn decode(
        &self,
        input: &'a [u8],
        limits: Option<&Limits>,
        stop: &dyn Stop,
    ) -> Result<Vec<u8>, IffError> {
        match self {
            Self::Classic(i) => i.decode(input, limits, stop),
            Self::Maya(i) => i.decode(input, limits, stop),
        }
    }

    fn palette(&self) -> Option<Vec<[u8; 3]>> {
        match self {
            Self::Classic(i) => i.output_palette(),
            Self::Maya(_) => None,
        }
    }
}

/// Builder for decode operations.
///
/// ```no_run
/// use zeniff::{DecodeRequest, Limits, Unstoppable};
///
/// let data: &[u8] = &[]; // your IFF bytes
/// let limits = Limits {
///     max_pixels: Some(64 * 1024 * 1024),
///     ..Default::default()
/// };
/// let image = DecodeRequest::new(data)
///     .with_limits(&limits)
///     .decode(Unstoppable)?;
/// # Ok::<(), zeniff::IffError>(())
/// ```
#[derive(Clone, Copy, Debug)]
pub struct DecodeRequest<'a> {
    data: &'a [u8],
    limits: Option<&'a Limits>,
}

impl<'a> DecodeRequest<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, limits: None }
    }

    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Decode the first supported image.
    ///
    /// Classic forms are tried before Maya forms. If none decodes, the
    /// first failure is returned; cancellation is returned immediately.
    pub fn decode(self, stop: impl Stop) -> Result<DecodeOutput, IffError> {
        decode_impl(self.data, self.limits, &stop)
    }
}

fn decode_impl(
    data: &[u8],
    limits: Option<&Limits>,
    stop: &dyn Stop,
) -> Result<DecodeOutput, IffError> {
    if !detect(data) {
        return Err(IffError::UnrecognizedFormat);
    }
    let forest = ChunkForest::parse(data)?;
    stop.check()?;

    let mut first_err = None;
    for candidate in Image::candidates(&forest) {
        let (form, image) = match candidate {
            Ok(c) => c,
            Err(e) => {
                first_err.get_or_insert(e);
                continue;
            }
        };
        match image.decode(data, limits, stop) {
            Ok(pixels) => {
                return Ok(DecodeOutput {
                    pixels,
                    width: image.width(),
                    height: image.height(),
                    layout: image.layout(),
                    dialect: image.dialect(),
                    palette: image.palette(),
                    metadata: Metadata::collect(&forest, forest.node(form).children()),
                });
            }
            Err(e @ IffError::Cancelled(_)) => return Err(e),
            Err(e) => {
                warn!("{:?} image failed to decode: {e}", image.dialect());
                first_err.get_or_insert(e);
            }
        }
    }
    Err(first_err.unwrap_or(IffError::UnrecognizedFormat))
}
