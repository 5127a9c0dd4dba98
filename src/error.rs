use alloc::string::String;
use enough::StopReason;

use crate::chunk::ChunkId;

/// Errors from IFF structure parsing and image decoding.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum IffError {
    #[error("no IFF container tag at the start of the input")]
    UnrecognizedFormat,

    #[error("malformed chunk id {id} at offset {offset}")]
    MalformedTag { id: ChunkId, offset: usize },

    #[error("truncated chunk header at offset {0}")]
    TruncatedHeader(usize),

    #[error("invalid chunk structure: {0}")]
    InvalidStructure(String),

    #[error("unsupported pixel layout: {0}")]
    UnsupportedPixelLayout(String),

    #[error("tile geometry mismatch: {0}")]
    TileGeometryMismatch(String),

    #[error("compressed data produced {actual} bytes, expected {expected}")]
    CompressionDecodeFailure { expected: usize, actual: usize },

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("pixel layout mismatch: expected {expected:?}, got {actual:?}")]
    LayoutMismatch {
        expected: crate::PixelLayout,
        actual: crate::PixelLayout,
    },

    #[error("operation cancelled")]
    Cancelled(StopReason),
}

impl From<StopReason> for IffError {
    fn from(r: StopReason) -> Self {
        IffError::Cancelled(r)
    }
}
