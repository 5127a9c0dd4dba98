//! # zeniff
//!
//! Decoder for IFF-family raster images: Amiga `FORM ILBM`, `PBM ` and
//! `ACBM`, and Autodesk Maya `FOR4 CIMG` tiled images.
//!
//! ## Supported Images
//!
//! ### Classic (`FORM`)
//! - 1–8 bitplanes, indexed or grayscale, uncompressed or ByteRun1
//! - HAM (Hold and Modify) for 5–8 planes, Extra Half-Brite
//! - 24 and 32 plane true color
//! - Chunky `PBM ` with 1, 8, 24 or 32 bits per pixel
//! - Contiguous-plane `ACBM` (`ABIT`)
//! - `CMAP` and `CMYK` palettes, `CAMG` view modes (inferred when absent)
//!
//! ### Maya (`FOR4`)
//! - RGB and RGBA tiles, 8 or 16 bits per channel, raw or RLE
//!
//! ## Non-Goals
//!
//! - Encoding
//! - `SHAM`/`CTBL` multi-palette images (rejected as unsupported)
//! - Maya depth buffers
//!
//! ## Usage
//!
//! ```no_run
//! use zeniff::{DecodeRequest, ImageInfo, PixelLayout};
//! use enough::Unstoppable;
//!
//! let data: &[u8] = &[]; // your IFF bytes
//!
//! // Probe without decoding pixels
//! let info = ImageInfo::from_bytes(data)?;
//! println!("{}x{} {:?} {:?}", info.width, info.height, info.layout, info.dialect);
//!
//! let decoded = DecodeRequest::new(data).decode(Unstoppable)?;
//! if decoded.layout == PixelLayout::Indexed8 {
//!     let palette = decoded.palette.as_deref().unwrap_or_default();
//!     println!("{} colors", palette.len());
//! }
//! # Ok::<(), zeniff::IffError>(())
//! ```
//!
//! The chunk tree itself is available through [`chunk::ChunkForest`].

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod chunk;
mod cursor;
mod decode;
mod error;
mod ilbm;
mod info;
mod limits;
mod maya;
mod metadata;
mod pixel;
mod rle;

// Re-exports
pub use decode::{DecodeOutput, DecodeRequest};
pub use enough::{Stop, Unstoppable};
pub use error::IffError;
pub use info::{IffDialect, ImageInfo, detect};
pub use limits::Limits;
pub use metadata::{ColorProfile, Metadata, keys};
#[cfg(feature = "rgb")]
pub use pixel::DecodePixel;
pub use pixel::PixelLayout;

/// Decode the first supported image in `data` with no limits.
pub fn decode(data: &[u8], stop: impl Stop) -> Result<DecodeOutput, IffError> {
    DecodeRequest::new(data).decode(stop)
}
