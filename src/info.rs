use crate::chunk::{ChunkForest, ChunkId};
use crate::decode::Image;
use crate::error::IffError;
use crate::pixel::PixelLayout;

/// Which member of the IFF family an image came from.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IffDialect {
    /// `FORM ILBM`: interleaved bitplanes.
    Ilbm,
    /// `FORM PBM `: chunky pixels.
    Pbm,
    /// `FORM ACBM`: contiguous bitplanes in `ABIT`.
    Acbm,
    /// `FOR4 CIMG`: Maya tiled RGB(A).
    Maya,
}

/// Image metadata from a structural parse, without decoding pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// Layout that decoding will produce.
    pub layout: PixelLayout,
    pub dialect: IffDialect,
}

impl ImageInfo {
    /// Parse the chunk tree and describe the image `decode` would return.
    pub fn from_bytes(data: &[u8]) -> Result<Self, IffError> {
        if !detect(data) {
            return Err(IffError::UnrecognizedFormat);
        }
        let forest = ChunkForest::parse(data)?;
        let mut first_err = None;
        for candidate in Image::candidates(&forest) {
            match candidate {
                Ok((_, image)) => {
                    return Ok(Self {
                        width: image.width(),
                        height: image.height(),
                        layout: image.layout(),
                        dialect: image.dialect(),
                    });
                }
                Err(e) => {
                    first_err.get_or_insert(e);
                }
            }
        }
        Err(first_err.unwrap_or(IffError::UnrecognizedFormat))
    }
}

/// Cheap check for an IFF container at the start of `data`.
///
/// Looks at the root tag, the presence of a length field and, for `FORM`
/// and `FOR4`, a printable form type. No chunk tree is built.
pub fn detect(data: &[u8]) -> bool {
    let Some(tag) = data.get(..4) else {
        return false;
    };
    let id = ChunkId([tag[0], tag[1], tag[2], tag[3]]);
    let is_root = matches!(
        id,
        ChunkId::CAT | ChunkId::FORM | ChunkId::LIST | ChunkId::CAT4 | ChunkId::FOR4 | ChunkId::LIS4
    );
    if !is_root || data.len() < 8 {
        return false;
    }
    if matches!(id, ChunkId::FORM | ChunkId::FOR4) {
        return match data.get(8..12) {
            Some(t) => ChunkId([t[0], t[1], t[2], t[3]]).is_valid(),
            None => false,
        };
    }
    true
}
