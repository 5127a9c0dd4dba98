/// Pixel memory layout of a decoded canvas.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    /// 1 bit per pixel, MSB first. A set bit selects palette entry 1.
    Mono,
    /// Single channel, 8-bit grayscale.
    Gray8,
    /// Single channel, 8-bit index into [`crate::DecodeOutput::palette`].
    Indexed8,
    /// 3 channels, 8-bit RGB.
    Rgb8,
    /// 4 channels, 8-bit RGBA.
    Rgba8,
    /// 4 channels, 16-bit RGBX (native endian; 4th channel is always 0xFFFF).
    Rgbx16,
    /// 4 channels, 16-bit RGBA (native endian).
    Rgba16,
}

impl PixelLayout {
    /// Bits per pixel for this layout.
    pub fn bits_per_pixel(&self) -> usize {
        match self {
            Self::Mono => 1,
            Self::Gray8 | Self::Indexed8 => 8,
            Self::Rgb8 => 24,
            Self::Rgba8 => 32,
            Self::Rgbx16 | Self::Rgba16 => 64,
        }
    }

    /// Bytes per pixel, rounded up (`Mono` reports 1).
    pub fn bytes_per_pixel(&self) -> usize {
        self.bits_per_pixel().div_ceil(8)
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        match self {
            Self::Mono | Self::Gray8 | Self::Indexed8 => 1,
            Self::Rgb8 => 3,
            Self::Rgba8 | Self::Rgbx16 | Self::Rgba16 => 4,
        }
    }

    /// Whether pixel values are palette indices.
    pub fn is_indexed(&self) -> bool {
        matches!(self, Self::Mono | Self::Indexed8)
    }

    /// Tightly packed row length in bytes for `width` pixels.
    pub fn row_bytes(&self, width: u32) -> Option<usize> {
        (width as usize)
            .checked_mul(self.bits_per_pixel())
            .map(|bits| bits.div_ceil(8))
    }

    /// Whether this layout has the same memory representation as `other`.
    ///
    /// `Rgbx16` and `Rgba16` are compatible (same 4×u16 layout).
    pub fn is_memory_compatible(&self, other: PixelLayout) -> bool {
        if *self == other {
            return true;
        }
        matches!(
            (*self, other),
            (Self::Rgbx16, Self::Rgba16) | (Self::Rgba16, Self::Rgbx16)
        )
    }
}

/// Pixel types that a decoded buffer can be reinterpreted as.
#[cfg(feature = "rgb")]
pub trait DecodePixel: Copy + 'static {
    /// The layout whose bytes match this pixel type.
    fn layout() -> PixelLayout;
}

#[cfg(feature = "rgb")]
impl DecodePixel for rgb::RGB8 {
    fn layout() -> PixelLayout {
        PixelLayout::Rgb8
    }
}

#[cfg(feature = "rgb")]
impl DecodePixel for rgb::RGBA8 {
    fn layout() -> PixelLayout {
        PixelLayout::Rgba8
    }
}

#[cfg(feature = "rgb")]
impl DecodePixel for rgb::RGBA16 {
    fn layout() -> PixelLayout {
        PixelLayout::Rgba16
    }
}
