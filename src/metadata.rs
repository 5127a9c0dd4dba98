//! Image metadata gathered from a form's metadata chunks.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::chunk::{
    Annotation, Author, ChunkForest, Copyright, DateStamp, Exif, IccName, IccProfile, Name,
    NodeId, Resolution, Version, Xmp,
};

/// Text metadata keys.
pub mod keys {
    /// `ANNO`
    pub const DESCRIPTION: &str = "Description";
    /// `AUTH`
    pub const AUTHOR: &str = "Author";
    /// `DATE`, as `YYYY-MM-DDTHH:MM:SS`.
    pub const CREATION_DATE: &str = "CreationDate";
    /// `(c) `
    pub const COPYRIGHT: &str = "Copyright";
    /// `NAME`
    pub const TITLE: &str = "Title";
    /// `VERS`, without the `$VER: ` prefix.
    pub const SOFTWARE: &str = "Software";
    /// `XMP0`
    pub const XMP: &str = "XML:com.adobe.xmp";
}

/// An embedded ICC profile.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColorProfile {
    pub icc: Vec<u8>,
    /// From `ICCN`, when present.
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metadata {
    /// Text entries under the names in [`keys`]. Empty values are omitted.
    pub text: BTreeMap<&'static str, String>,
    /// Raw EXIF block.
    pub exif: Option<Vec<u8>>,
    pub color_profile: Option<ColorProfile>,
    /// Horizontal and vertical resolution.
    pub dots_per_meter: Option<(u32, u32)>,
}

impl Metadata {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.text.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
            && self.exif.is_none()
            && self.color_profile.is_none()
            && self.dots_per_meter.is_none()
    }

    fn insert(&mut self, key: &'static str, value: Option<String>) {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.text.insert(key, value);
        }
    }

    /// Collect metadata from the chunks under `scope`. The first chunk of
    /// each kind wins.
    pub(crate) fn collect(forest: &ChunkForest, scope: &[NodeId]) -> Self {
        let mut meta = Self::default();
        meta.insert(
            keys::DESCRIPTION,
            forest.first_variant::<Annotation<'_>>(scope).map(|c| c.value()),
        );
        meta.insert(
            keys::AUTHOR,
            forest.first_variant::<Author<'_>>(scope).map(|c| c.value()),
        );
        meta.insert(
            keys::CREATION_DATE,
            forest
                .first_variant::<DateStamp<'_>>(scope)
                .and_then(|c| c.iso8601()),
        );
        meta.insert(
            keys::COPYRIGHT,
            forest.first_variant::<Copyright<'_>>(scope).map(|c| c.value()),
        );
        meta.insert(
            keys::TITLE,
            forest.first_variant::<Name<'_>>(scope).map(|c| c.value()),
        );
        meta.insert(
            keys::SOFTWARE,
            forest.first_variant::<Version<'_>>(scope).map(|c| c.value()),
        );
        meta.insert(
            keys::XMP,
            forest.first_variant::<Xmp<'_>>(scope).map(|c| c.value()),
        );

        meta.exif = forest
            .first_variant::<Exif<'_>>(scope)
            .map(|c| c.value())
            .filter(|e| !e.is_empty())
            .map(<[u8]>::to_vec);
        meta.color_profile = forest
            .first_variant::<IccProfile<'_>>(scope)
            .and_then(|c| c.value())
            .map(|icc| ColorProfile {
                icc: icc.to_vec(),
                description: forest
                    .first_variant::<IccName<'_>>(scope)
                    .map(|c| c.value())
                    .filter(|d| !d.is_empty()),
            });
        meta.dots_per_meter = forest
            .first_variant::<Resolution<'_>>(scope)
            .and_then(|r| r.dots_per_meter());
        meta
    }
}
