//! The facade tying a source, its arena and the hierarchy loaders together.
//!
//! One [`PointCloud`] owns one tree. All I/O is asynchronous and
//! single-threaded cooperative: suspension happens only at fetch boundaries,
//! and the arena is only borrowed between them, never across one.

use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use futures::future::{LocalBoxFuture, Shared};
use futures::FutureExt;
use thiserror::Error;
use tracing::debug;

use crate::attributes::{AttributeBuffers, ParseContext, ParseError, PointParser};
use crate::hierarchy::{self, HierarchyEntry, HierarchyError, HierarchyProtocol};
use crate::crs::Crs;
use crate::metadata::{EnumeratedMetadata, PagedMetadata};
use crate::octree::coord::NodeCoord;
use crate::octree::node::{NodeState, PageLocator, PayloadLocator};
use crate::octree::snapshot::NodeSnapshot;
use crate::octree::{NodeArena, NodeId};
use crate::resource::{ResourceClient, ResourceError};
use crate::source::{Source, SourceDescriptor, SourceError};

#[derive(Error, Debug)]
pub enum LoadPointsError {
    #[error("Node does not exist")]
    NodeNotFound,

    #[error("Error resolving hierarchy: {0}")]
    Hierarchy(#[from] HierarchyError),

    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    #[error("Error parsing points: {0}")]
    Parse(#[from] ParseError),
}

/// Memoized in-flight resolution; every concurrent caller awaits the same
/// future instead of re-issuing I/O.
type SharedResolution = Shared<LocalBoxFuture<'static, Result<(), HierarchyError>>>;

pub struct PointCloud<C: ResourceClient + 'static> {
    source: Arc<Source<C>>,
    arena: Rc<RefCell<NodeArena>>,
    pending: Rc<RefCell<HashMap<NodeId, SharedResolution>>>,
}

impl<C: ResourceClient + 'static> PointCloud<C> {
    /// Build the tree for an already-constructed source. The root starts as
    /// a page pointer at the protocol's root locator; nothing is fetched
    /// until the first `resolve_hierarchy`.
    pub fn new(source: Source<C>) -> Result<Self, SourceError> {
        let geometry = source.descriptor.geometry()?;
        let root_state = NodeState::Page {
            num_points: source.descriptor.total_points,
            locator: source.descriptor.protocol.root_locator(),
        };
        let arena = NodeArena::new(
            source.descriptor.bounds,
            root_state,
            source.descriptor.spacing,
            geometry,
        );
        Ok(Self {
            source: Arc::new(source),
            arena: Rc::new(RefCell::new(arena)),
            pending: Rc::new(RefCell::new(HashMap::new())),
        })
    }

    /// Load a paged-format point cloud published under `url`:
    /// `<url>/metadata.json`, `<url>/hierarchy.bin`, `<url>/octree.bin`.
    pub async fn from_paged_url(
        url: &str,
        reference_crs: Crs,
        client: C,
        parser: Arc<dyn PointParser>,
    ) -> Result<Self, SourceError> {
        let metadata: PagedMetadata = client
            .get_json(&format!("{url}/metadata.json"), None)
            .await?;
        let descriptor = metadata.into_descriptor(url, reference_crs);
        Self::new(Source::new(descriptor, client, parser))
    }

    /// Load an enumerated-format point cloud published under `url`:
    /// `<url>/ept.json`, `<url>/ept-hierarchy/`, `<url>/ept-data/`.
    pub async fn from_enumerated_url(
        url: &str,
        reference_crs: Crs,
        client: C,
        parser: Arc<dyn PointParser>,
    ) -> Result<Self, SourceError> {
        let metadata: EnumeratedMetadata =
            client.get_json(&format!("{url}/ept.json"), None).await?;
        let descriptor = metadata.into_descriptor(url, reference_crs);
        Self::new(Source::new(descriptor, client, parser))
    }

    pub fn descriptor(&self) -> &SourceDescriptor {
        &self.source.descriptor
    }

    pub fn octree(&self) -> Ref<'_, NodeArena> {
        self.arena.borrow()
    }

    pub fn root_id(&self) -> NodeId {
        self.arena.borrow().root_id()
    }

    pub fn node_id(&self, coord: NodeCoord) -> Option<NodeId> {
        self.arena.borrow().lookup(coord)
    }

    /// Snapshot of the currently loaded hierarchy, safe to hand to a
    /// renderer while resolution continues.
    pub fn snapshot(&self) -> NodeSnapshot {
        let arena = self.arena.borrow();
        NodeSnapshot::capture(&arena, arena.root_id())
    }

    /// Resolve a node's subtree, fetching and expanding its hierarchy page
    /// if needed.
    ///
    /// No-op once the node is resolved. Concurrent calls for the same node
    /// observe a single in-flight resolution; the page is fetched once and
    /// every caller gets the same outcome. Nothing is committed to the tree
    /// on failure or abandonment.
    pub async fn resolve_hierarchy(&self, node_id: NodeId) -> Result<(), HierarchyError> {
        if self
            .arena
            .borrow()
            .node(node_id)
            .expect("resolve_hierarchy: node not in arena")
            .is_subtree_resolved()
        {
            return Ok(());
        }

        let resolution = {
            let mut pending = self.pending.borrow_mut();
            match pending.get(&node_id) {
                Some(in_flight) => in_flight.clone(),
                None => {
                    let resolution = Self::resolve_inner(
                        Arc::clone(&self.source),
                        Rc::clone(&self.arena),
                        node_id,
                    )
                    .boxed_local()
                    .shared();
                    pending.insert(node_id, resolution.clone());
                    resolution
                }
            }
        };

        let result = resolution.await;
        self.pending.borrow_mut().remove(&node_id);
        result
    }

    async fn resolve_inner(
        source: Arc<Source<C>>,
        arena: Rc<RefCell<NodeArena>>,
        node_id: NodeId,
    ) -> Result<(), HierarchyError> {
        let (coord, state) = {
            let arena = arena.borrow();
            let node = arena
                .node(node_id)
                .expect("resolve_hierarchy: node not in arena");
            (node.coord, node.state.clone())
        };

        let mut locator = match state {
            NodeState::Resolved { .. } => return Ok(()),
            NodeState::Page { locator, .. } => locator,
            NodeState::Unresolved => source
                .descriptor
                .protocol
                .own_locator(coord)
                .ok_or(HierarchyError::Unlocatable(coord))?,
        };

        // Fetch and decode before touching the tree, chasing the node's own
        // page-pointer chain if its entry is itself a pointer. Child
        // pointers found along the way stay lazy. Any locator seen twice
        // means a cyclic chain; fail instead of re-fetching forever.
        let mut visited = vec![locator.clone()];
        let entries = loop {
            let bytes = Self::fetch_page(&source, &locator).await?;
            debug!(node = %coord, bytes = bytes.len(), "fetched hierarchy page");
            let entries = source.descriptor.protocol.decode(coord, &bytes)?;
            match entries.get(&coord) {
                None => return Err(HierarchyError::MissingOwnEntry(coord)),
                Some(HierarchyEntry::Page { locator: next, .. }) => {
                    if visited.contains(next) {
                        return Err(HierarchyError::PageCycle(coord));
                    }
                    visited.push(next.clone());
                    locator = next.clone();
                }
                Some(HierarchyEntry::Concrete { .. }) => break entries,
            }
        };

        hierarchy::apply(&mut arena.borrow_mut(), node_id, &entries);
        Ok(())
    }

    async fn fetch_page(
        source: &Source<C>,
        locator: &PageLocator,
    ) -> Result<Vec<u8>, HierarchyError> {
        let protocol = &source.descriptor.protocol;
        let bytes = match (protocol, locator) {
            (
                HierarchyProtocol::Paged { hierarchy_url, .. },
                PageLocator::Range { offset, size },
            ) => {
                source
                    .client
                    .get_range(hierarchy_url, *offset, *size as usize, None)
                    .await?
            }
            (HierarchyProtocol::Enumerated { .. }, PageLocator::Table { key }) => {
                source.client.get(&protocol.table_url(*key), None).await?
            }
            _ => unreachable!("page locator kind does not match the source protocol"),
        };
        Ok(bytes)
    }

    /// Fetch and parse a node's point payload.
    ///
    /// Requires the node's hierarchy to be resolved; if it is not yet, the
    /// resolution happens here first, transparently.
    pub async fn load_points(&self, node_id: NodeId) -> Result<AttributeBuffers, LoadPointsError> {
        let resolved = {
            let arena = self.arena.borrow();
            arena
                .node(node_id)
                .ok_or(LoadPointsError::NodeNotFound)?
                .is_subtree_resolved()
        };
        if !resolved {
            self.resolve_hierarchy(node_id).await?;
        }

        let (coord, payload, num_points) = {
            let arena = self.arena.borrow();
            let node = arena
                .node(node_id)
                .expect("load_points: node not in arena");
            (
                node.coord,
                node.payload().expect("resolved node has a payload locator"),
                node.num_points().expect("resolved node has a point count"),
            )
        };

        let protocol = &self.source.descriptor.protocol;
        let bytes = match (protocol, payload) {
            (HierarchyProtocol::Paged { data_url, .. }, PayloadLocator::Range { offset, size }) => {
                self.source
                    .client
                    .get_range(data_url, offset, size as usize, None)
                    .await?
            }
            (HierarchyProtocol::Enumerated { .. }, PayloadLocator::Key(key)) => {
                self.source
                    .client
                    .get(&protocol.payload_url(key), None)
                    .await?
            }
            _ => unreachable!("payload locator kind does not match the source protocol"),
        };
        debug!(node = %coord, bytes = bytes.len(), num_points, "fetched point payload");

        let arena = self.arena.borrow();
        let node = arena
            .node(node_id)
            .expect("load_points: node not in arena");
        let context = ParseContext {
            voxel_obb: &node.voxel_obb,
            clamp_obb: &node.clamp_obb,
            native_crs: &self.source.descriptor.native_crs,
            origin: node.voxel_aabb.center(),
            rotation: node.voxel_obb.rotation,
            num_points,
            schema: &self.source.descriptor.attributes,
        };
        Ok(self.source.parser.parse(&bytes, &context)?)
    }
}
