//! Metadata chunk views: text fields, date, EXIF, ICC profile and XMP.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use chrono::{Datelike, NaiveDateTime, Timelike};

use super::{ChunkId, ChunkNode, ChunkVariant};

/// Latin-1 text with trailing NULs removed.
fn latin1(data: &[u8]) -> String {
    let end = data.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    data[..end].iter().map(|&b| char::from(b)).collect()
}

macro_rules! chunk_view {
    ($(#[$meta:meta])* $name:ident, [$($id:expr),+]) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug)]
        pub struct $name<'a> {
            node: &'a ChunkNode,
        }

        impl<'a> ChunkVariant<'a> for $name<'a> {
            const IDS: &'static [ChunkId] = &[$($id),+];

            fn wrap(node: &'a ChunkNode) -> Self {
                Self { node }
            }

            fn node(&self) -> &'a ChunkNode {
                self.node
            }
        }
    };
}

macro_rules! text_chunk {
    ($(#[$meta:meta])* $name:ident, $id:expr) => {
        chunk_view!($(#[$meta])* $name, [$id]);

        impl $name<'_> {
            pub fn value(&self) -> String {
                latin1(self.node.data())
            }
        }
    };
}

text_chunk!(
    /// `ANNO`: free-form annotation.
    Annotation,
    ChunkId::ANNO
);
text_chunk!(
    /// `AUTH`: author name.
    Author,
    ChunkId::AUTH
);
text_chunk!(
    /// `(c) `: copyright notice.
    Copyright,
    ChunkId::COPY
);
text_chunk!(
    /// `NAME`: image title.
    Name,
    ChunkId::NAME
);
text_chunk!(
    /// `ICCN`: color profile description.
    IccName,
    ChunkId::ICCN
);

chunk_view!(
    /// `VERS`: producing software, usually an AmigaOS `$VER:` string.
    Version,
    [ChunkId::VERS]
);

impl Version<'_> {
    pub fn value(&self) -> String {
        let text = latin1(self.node.data());
        match text.strip_prefix("$VER: ") {
            Some(rest) => String::from(rest),
            None => text,
        }
    }
}

chunk_view!(
    /// `DATE`: creation time as text.
    DateStamp,
    [ChunkId::DATE]
);

const DATE_FORMATS: &[&str] = &[
    "%a %b %d %H:%M:%S %Y",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

impl DateStamp<'_> {
    /// Parsed timestamp. Accepts C `ctime` style and ISO 8601 text.
    pub fn value(&self) -> Option<NaiveDateTime> {
        let text = latin1(self.node.data());
        // ctime pads single-digit days with a second space
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        DATE_FORMATS
            .iter()
            .find_map(|f| NaiveDateTime::parse_from_str(&text, f).ok())
    }

    /// `YYYY-MM-DDTHH:MM:SS`, or `None` if the text is not a known format.
    pub fn iso8601(&self) -> Option<String> {
        let dt = self.value()?;
        Some(format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            dt.year(),
            dt.month(),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second()
        ))
    }
}

chunk_view!(
    /// `EXIF`: raw EXIF block.
    Exif,
    [ChunkId::EXIF]
);

impl<'a> Exif<'a> {
    pub fn value(&self) -> &'a [u8] {
        self.node.data()
    }
}

chunk_view!(
    /// `ICCP`: embedded ICC color profile.
    IccProfile,
    [ChunkId::ICCP]
);

impl<'a> IccProfile<'a> {
    /// A full profile header with the `acsp` signature.
    pub fn is_valid(&self) -> bool {
        let d = self.node.data();
        d.len() >= 132 && &d[36..40] == b"acsp"
    }

    pub fn value(&self) -> Option<&'a [u8]> {
        self.is_valid().then(|| self.node.data())
    }
}

chunk_view!(
    /// `XMP0`: XMP packet.
    Xmp,
    [ChunkId::XMP0]
);

impl Xmp<'_> {
    pub fn value(&self) -> String {
        let d = self.node.data();
        let end = d.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        String::from_utf8_lossy(&d[..end]).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{Alignment, ChunkKind};
    use alloc::vec;

    fn node(id: ChunkId, data: &[u8]) -> ChunkNode {
        ChunkNode {
            id,
            size: data.len() as u32,
            data_pos: 8,
            align: Alignment::Word,
            depth: 2,
            data: Some(data.to_vec()),
            children: Vec::new(),
            kind: ChunkKind::Metadata,
        }
    }

    #[test]
    fn latin1_text_drops_trailing_nuls() {
        let n = node(ChunkId::AUTH, b"Jos\xe9\0\0");
        assert_eq!(Author::from_node(&n).unwrap().value(), "Jos\u{e9}");
        let n = node(ChunkId::ANNO, b"\0\0");
        assert_eq!(Annotation::from_node(&n).unwrap().value(), "");
    }

    #[test]
    fn version_prefix_is_stripped() {
        let n = node(ChunkId::VERS, b"$VER: DPaint 4.5\0");
        assert_eq!(Version::from_node(&n).unwrap().value(), "DPaint 4.5");
        let n = node(ChunkId::VERS, b"GIMP");
        assert_eq!(Version::from_node(&n).unwrap().value(), "GIMP");
    }

    #[test]
    fn dates() {
        let n = node(ChunkId::DATE, b"Tue Mar  3 09:05:01 1992\n\0");
        assert_eq!(
            DateStamp::from_node(&n).unwrap().iso8601().as_deref(),
            Some("1992-03-03T09:05:01")
        );
        let n = node(ChunkId::DATE, b"2021-11-30T23:59:58");
        assert_eq!(
            DateStamp::from_node(&n).unwrap().iso8601().as_deref(),
            Some("2021-11-30T23:59:58")
        );
        let n = node(ChunkId::DATE, b"last tuesday");
        assert_eq!(DateStamp::from_node(&n).unwrap().value(), None);
    }

    #[test]
    fn icc_profile_needs_signature() {
        let mut icc = vec![0u8; 132];
        let n = node(ChunkId::ICCP, &icc);
        assert_eq!(IccProfile::from_node(&n).unwrap().value(), None);
        icc[36..40].copy_from_slice(b"acsp");
        let n = node(ChunkId::ICCP, &icc);
        assert_eq!(IccProfile::from_node(&n).unwrap().value().map(<[u8]>::len), Some(132));
        let n = node(ChunkId::ICCP, &icc[..100]);
        assert!(!IccProfile::from_node(&n).unwrap().is_valid());
    }

    #[test]
    fn xmp_is_lossy_utf8() {
        let n = node(ChunkId::XMP0, b"<x:xmpmeta>\xff</x:xmpmeta>\0");
        assert_eq!(
            Xmp::from_node(&n).unwrap().value(),
            "<x:xmpmeta>\u{fffd}</x:xmpmeta>"
        );
    }
}
