//! Hierarchy loading: turning wire-format chunks and tables into tree nodes.
//!
//! Two protocols exist. The paged binary protocol packs whole subtrees into
//! byte-range chunks of one hierarchy file, with page-pointer entries
//! chaining to further chunks. The enumerated protocol publishes one JSON
//! table per subtree root, keyed by node id.
//!
//! Both decoders produce the same intermediate shape, a map from octree
//! coordinate to [`HierarchyEntry`], and both go through [`apply`] so that
//! all fallible work (fetching, decoding) happens before the tree is touched.

pub mod enumerated;
pub mod paged;

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::octree::coord::NodeCoord;
use crate::octree::node::{NodeState, PageLocator, PayloadLocator};
use crate::octree::{NodeArena, NodeId};
use crate::resource::ResourceError;

/// One decoded hierarchy entry, keyed by octree coordinate.
#[derive(Clone, Debug, PartialEq)]
pub enum HierarchyEntry {
    /// Concrete node: final count and point payload location.
    Concrete {
        num_points: u64,
        payload: PayloadLocator,
    },
    /// The subtree lives in a further page; the count may be published
    /// alongside the pointer.
    Page {
        num_points: Option<u64>,
        locator: PageLocator,
    },
}

pub type EntryMap = HashMap<NodeCoord, HierarchyEntry>;

/// Which wire format describes a tree's hierarchy, fixed once per source.
#[derive(Clone, Debug)]
pub enum HierarchyProtocol {
    /// One binary hierarchy file paged by byte ranges, one shared point data
    /// file addressed by byte ranges.
    Paged {
        hierarchy_url: String,
        data_url: String,
        first_chunk_size: u64,
    },
    /// One JSON table per subtree root under `<hierarchy_base>/<id>.json`,
    /// one point payload per node under `<data_base>/<id>.<extension>`.
    Enumerated {
        hierarchy_base: String,
        data_base: String,
        data_extension: String,
    },
}

impl HierarchyProtocol {
    /// Locator of the root node's own hierarchy page.
    pub fn root_locator(&self) -> PageLocator {
        match self {
            HierarchyProtocol::Paged {
                first_chunk_size, ..
            } => PageLocator::Range {
                offset: 0,
                size: *first_chunk_size,
            },
            HierarchyProtocol::Enumerated { .. } => PageLocator::Table {
                key: NodeCoord::ROOT,
            },
        }
    }

    /// Locator for a node that was never handed one by a parent page.
    ///
    /// Under the enumerated protocol every node's table address derives from
    /// its own id; under the paged protocol only the root chunk is known
    /// upfront.
    pub fn own_locator(&self, coord: NodeCoord) -> Option<PageLocator> {
        match self {
            HierarchyProtocol::Paged { .. } => {
                (coord == NodeCoord::ROOT).then(|| self.root_locator())
            }
            HierarchyProtocol::Enumerated { .. } => Some(PageLocator::Table { key: coord }),
        }
    }

    /// Decode one fetched page into the coordinate-keyed entry map.
    pub fn decode(&self, chunk_root: NodeCoord, bytes: &[u8]) -> Result<EntryMap, HierarchyError> {
        match self {
            HierarchyProtocol::Paged { .. } => paged::decode_chunk(chunk_root, bytes),
            HierarchyProtocol::Enumerated { .. } => enumerated::decode_table(bytes),
        }
    }

    pub fn table_url(&self, key: NodeCoord) -> String {
        match self {
            HierarchyProtocol::Paged { .. } => {
                unreachable!("paged hierarchies are addressed by byte range")
            }
            HierarchyProtocol::Enumerated { hierarchy_base, .. } => {
                format!("{hierarchy_base}/{key}.json")
            }
        }
    }

    pub fn payload_url(&self, key: NodeCoord) -> String {
        match self {
            HierarchyProtocol::Paged { .. } => {
                unreachable!("paged payloads are addressed by byte range")
            }
            HierarchyProtocol::Enumerated {
                data_base,
                data_extension,
                ..
            } => format!("{data_base}/{key}.{data_extension}"),
        }
    }
}

/// Errors raised while resolving a node's hierarchy.
///
/// Clone-able so one deduplicated in-flight resolution can hand the same
/// outcome to every waiter; foreign payloads are Arc-wrapped for that.
#[derive(Error, Debug, Clone)]
pub enum HierarchyError {
    #[error("resource error: {0}")]
    Resource(Arc<ResourceError>),

    #[error("invalid hierarchy chunk: {0}")]
    InvalidChunk(Arc<binrw::Error>),

    #[error("invalid hierarchy table: {0}")]
    InvalidTable(Arc<serde_json::Error>),

    #[error("chunk length {0} is not a whole number of entries")]
    TruncatedChunk(usize),

    #[error("chunk for {0} describes more nodes than its child masks announce")]
    OverfullChunk(NodeCoord),

    #[error("malformed entry id {0:?} in hierarchy table")]
    BadEntryId(String),

    #[error("hierarchy page is missing the entry for requesting node {0}")]
    MissingOwnEntry(NodeCoord),

    #[error("hierarchy page for {0} points back at itself")]
    PageCycle(NodeCoord),

    #[error("no hierarchy locator known for node {0}")]
    Unlocatable(NodeCoord),
}

impl From<ResourceError> for HierarchyError {
    fn from(error: ResourceError) -> Self {
        Self::Resource(Arc::new(error))
    }
}

impl From<binrw::Error> for HierarchyError {
    fn from(error: binrw::Error) -> Self {
        Self::InvalidChunk(Arc::new(error))
    }
}

impl From<serde_json::Error> for HierarchyError {
    fn from(error: serde_json::Error) -> Self {
        Self::InvalidTable(Arc::new(error))
    }
}

/// Expand a fully decoded entry map into the tree, breadth first.
///
/// Infallible by construction: every fallible step (fetch, decode, the
/// requesting node's own entry being concrete) has already happened, so a
/// caller abandoning the resolution mid-fetch commits nothing.
///
/// The requesting node becomes `Resolved`; concrete descendants found in the
/// map are attached and re-enqueued so their own children are discovered
/// within the same map extent; page-pointer descendants are attached in
/// `Page` state and left for a later resolution of their own. Nothing
/// outside the map's subtree is touched.
pub(crate) fn apply(arena: &mut NodeArena, node_id: NodeId, entries: &EntryMap) {
    let own_coord = arena
        .node(node_id)
        .expect("apply: node not in arena")
        .coord;
    let (num_points, payload) = match entries.get(&own_coord) {
        Some(HierarchyEntry::Concrete {
            num_points,
            payload,
        }) => (*num_points, *payload),
        _ => unreachable!("apply: caller checked the requesting node's entry"),
    };
    arena
        .node_mut(node_id)
        .expect("apply: node not in arena")
        .state = NodeState::Resolved {
        num_points,
        payload,
    };

    arena.reserve(entries.len().saturating_sub(1));

    let mut queue = VecDeque::from([node_id]);
    let mut attached = 0usize;
    while let Some(current_id) = queue.pop_front() {
        let current_coord = arena
            .node(current_id)
            .expect("apply: queued node not in arena")
            .coord;
        for child_coord in current_coord.children() {
            match entries.get(&child_coord) {
                None => {}
                Some(HierarchyEntry::Concrete {
                    num_points,
                    payload,
                }) => {
                    let child_id = arena.add(
                        current_id,
                        child_coord,
                        NodeState::Resolved {
                            num_points: *num_points,
                            payload: *payload,
                        },
                    );
                    attached += 1;
                    queue.push_back(child_id);
                }
                Some(HierarchyEntry::Page {
                    num_points,
                    locator,
                }) => {
                    arena.add(
                        current_id,
                        child_coord,
                        NodeState::Page {
                            num_points: *num_points,
                            locator: locator.clone(),
                        },
                    );
                    attached += 1;
                }
            }
        }
    }

    debug!(node = %own_coord, attached, "expanded hierarchy page");
}
