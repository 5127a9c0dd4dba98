use alloc::format;
use alloc::vec::Vec;

use log::{debug, trace};

use super::{
    Alignment, ChunkId, ChunkKind, ChunkNode, ChunkVariant, MAX_CACHED_CHUNK_BYTES, NodeId,
    RECURSION_LIMIT, TileBounds,
};
use crate::cursor::Cursor;
use crate::error::IffError;

/// Every chunk parsed from one input, stored as an arena.
///
/// Parent nodes list their children by [`NodeId`]; `roots` holds the
/// top-level siblings in stream order.
#[derive(Clone, Debug, Default)]
pub struct ChunkForest {
    nodes: Vec<ChunkNode>,
    roots: Vec<NodeId>,
}

impl ChunkForest {
    /// Parse `data` into a chunk forest.
    ///
    /// Any malformed tag, truncated header or inconsistent length fails the
    /// whole parse; no partial forest is returned. Unknown tags become
    /// [`ChunkKind::Generic`] leaves. Nesting deeper than
    /// [`RECURSION_LIMIT`] degrades to a leaf instead of failing.
    pub fn parse(data: &[u8]) -> Result<Self, IffError> {
        let mut builder = Builder {
            data,
            nodes: Vec::new(),
        };
        let roots = builder.siblings(0, data.len(), Alignment::Word, 1, true)?;
        Ok(Self {
            nodes: builder.nodes,
            roots,
        })
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Borrow a node. `id` must come from this forest.
    pub fn node(&self, id: NodeId) -> &ChunkNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&ChunkNode> {
        self.nodes.get(id.0)
    }

    /// Total number of nodes at every depth.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in the order they were parsed (depth-first, pre-order).
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &ChunkNode)> + '_ {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Offset just past the last root chunk, including its padding.
    pub fn end_offset(&self) -> u64 {
        self.roots
            .last()
            .map(|&id| self.node(id).end_offset())
            .unwrap_or(0)
    }

    /// Depth-first search over `from` and all their descendants.
    pub fn search(&self, from: &[NodeId], pred: impl Fn(&ChunkNode) -> bool) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = from.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            if pred(node) {
                found.push(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        found
    }

    /// Search by tag, accepting newer versions of versioned tags.
    pub fn search_id(&self, from: &[NodeId], id: ChunkId) -> Vec<NodeId> {
        self.search(from, |n| n.id.is_type(id))
    }

    /// Search and wrap every match in the typed view `V`.
    pub fn search_variant<'a, V: ChunkVariant<'a>>(&'a self, from: &[NodeId]) -> Vec<V> {
        self.search(from, |n| V::IDS.contains(&n.id))
            .into_iter()
            .filter_map(|id| V::from_node(self.node(id)))
            .collect()
    }

    /// First match of [`Self::search_variant`].
    pub fn first_variant<'a, V: ChunkVariant<'a>>(&'a self, from: &[NodeId]) -> Option<V> {
        self.search_variant(from).into_iter().next()
    }
}

struct Builder<'d> {
    data: &'d [u8],
    nodes: Vec<ChunkNode>,
}

impl Builder<'_> {
    /// Parse sibling chunks inside `[start, end)`.
    ///
    /// `align` is the enclosing container's alignment. Container and filler
    /// tags replace it for the siblings that follow them.
    fn siblings(
        &mut self,
        start: usize,
        end: usize,
        mut align: Alignment,
        depth: u32,
        root: bool,
    ) -> Result<Vec<NodeId>, IffError> {
        let data = self.data;
        let declared_end = end;
        let end = end.min(data.len());
        let mut cur = Cursor::new(&data[..end]);
        cur.seek(start)?;
        let mut ids = Vec::new();

        while !cur.at_end() {
            let offset = cur.position();
            let header: [u8; 8] = cur
                .read_array()
                .map_err(|_| IffError::TruncatedHeader(offset))?;
            let id = ChunkId([header[0], header[1], header[2], header[3]]);
            if !id.is_valid() && !id.is_filler() {
                return Err(IffError::MalformedTag { id, offset });
            }
            let size = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);

            let node_align = match Alignment::of(id) {
                Some(a) if id.sets_sibling_alignment() => {
                    align = a;
                    a
                }
                Some(a) => a,
                None => align,
            };

            // A child must fit inside the length its parent declares.
            if !root && cur.position() as u64 + u64::from(size) > declared_end as u64 {
                return Err(IffError::InvalidStructure(format!(
                    "chunk {id} at offset {offset} overruns its container"
                )));
            }

            let node_id = self.node(id, size, cur.position(), node_align, depth)?;
            ids.push(node_id);

            let node = &self.nodes[node_id.0];
            let next = node.end_offset();
            let is_container = node.form_type().is_some();
            cur.seek(next.min(end as u64) as usize)?;

            if root && ids.len() == 1 && is_container {
                break;
            }
        }
        Ok(ids)
    }

    fn node(
        &mut self,
        id: ChunkId,
        size: u32,
        data_pos: usize,
        align: Alignment,
        depth: u32,
    ) -> Result<NodeId, IffError> {
        let mut node = ChunkNode {
            id,
            size,
            data_pos,
            align,
            depth,
            data: None,
            children: Vec::new(),
            kind: ChunkKind::Generic,
        };

        if depth >= RECURSION_LIMIT {
            debug!("chunk {id} at depth {depth} parsed as a leaf (recursion limit)");
            self.cache(&mut node)?;
            return Ok(self.push(node));
        }

        let data_end = data_pos.saturating_add(size as usize);
        let mut children = None;
        node.kind = match id {
            _ if id.is_container() => {
                if size < 4 {
                    return Err(IffError::InvalidStructure(format!(
                        "container {id} is {size} bytes, too short for a form type"
                    )));
                }
                let form_type = ChunkId(self.read_at::<4>(data_pos)?);
                if descends_into(id, form_type) {
                    children = Some((data_pos + 4, data_end));
                } else {
                    trace!("not descending into {id} {form_type}");
                }
                ChunkKind::Container { form_type }
            }
            ChunkId::BMHD => ChunkKind::Header,
            ChunkId::CMAP | ChunkId::CMYK => ChunkKind::Palette,
            ChunkId::CAMG => ChunkKind::ViewMode,
            ChunkId::DPI => ChunkKind::Resolution,
            ChunkId::BODY | ChunkId::ABIT => ChunkKind::PixelData,
            ChunkId::TBHD => ChunkKind::MayaHeader,
            ChunkId::RGBA => ChunkKind::MayaTile(self.tile_bounds(id, size, data_pos)?),
            ChunkId::ANNO
            | ChunkId::AUTH
            | ChunkId::COPY
            | ChunkId::DATE
            | ChunkId::NAME
            | ChunkId::VERS
            | ChunkId::EXIF
            | ChunkId::ICCP
            | ChunkId::ICCN
            | ChunkId::XMP0 => ChunkKind::Metadata,
            _ => {
                trace!("unknown chunk {id} ({size} bytes) at offset {data_pos}");
                ChunkKind::Generic
            }
        };

        if !matches!(
            node.kind,
            ChunkKind::Container { .. } | ChunkKind::PixelData | ChunkKind::MayaTile(_)
        ) {
            self.cache(&mut node)?;
        }

        // Children are pushed after their parent so ids stay in pre-order.
        let parent = self.push(node);
        if let Some((start, end)) = children {
            let kids = self.siblings(start, end, align, depth + 1, false)?;
            self.nodes[parent.0].children = kids;
        }
        Ok(parent)
    }

    fn push(&mut self, node: ChunkNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    fn cache(&self, node: &mut ChunkNode) -> Result<(), IffError> {
        if node.size > MAX_CACHED_CHUNK_BYTES {
            debug!(
                "chunk {} is {} bytes, above the cache ceiling; left uncached",
                node.id, node.size
            );
            return Ok(());
        }
        let mut cur = Cursor::new(self.data);
        cur.seek(node.data_pos)?;
        node.data = Some(cur.take(node.size as usize)?.to_vec());
        Ok(())
    }

    fn read_at<const N: usize>(&self, pos: usize) -> Result<[u8; N], IffError> {
        let mut cur = Cursor::new(self.data);
        cur.seek(pos)?;
        cur.read_array::<N>()
    }

    fn tile_bounds(&self, id: ChunkId, size: u32, pos: usize) -> Result<TileBounds, IffError> {
        if size < 8 {
            return Err(IffError::InvalidStructure(format!(
                "{id} chunk of {size} bytes has no tile bounds"
            )));
        }
        let b = self.read_at::<8>(pos)?;
        let bounds = TileBounds {
            x0: u16::from_be_bytes([b[0], b[1]]),
            y0: u16::from_be_bytes([b[2], b[3]]),
            x1: u16::from_be_bytes([b[4], b[5]]),
            y1: u16::from_be_bytes([b[6], b[7]]),
        };
        if bounds.x0 > bounds.x1 || bounds.y0 > bounds.y1 {
            return Err(IffError::InvalidStructure(format!(
                "inverted tile bounds {bounds:?} at offset {pos}"
            )));
        }
        Ok(bounds)
    }
}

fn descends_into(container: ChunkId, form_type: ChunkId) -> bool {
    match container {
        ChunkId::FORM => matches!(form_type, ChunkId::ILBM | ChunkId::PBM | ChunkId::ACBM),
        ChunkId::FOR4 => matches!(form_type, ChunkId::CIMG | ChunkId::TBMP),
        _ => true,
    }
}
