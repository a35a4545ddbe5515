use crate::bounds::{Aabb, Obb};
use crate::octree::coord::NodeCoord;
use crate::octree::NodeId;

/// Where a node's subtree description lives when it is not yet in memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageLocator {
    /// Byte range inside the paged hierarchy file.
    Range { offset: u64, size: u64 },
    /// Enumerated table published under a node's own id.
    Table { key: NodeCoord },
}

/// Where a node's point payload lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadLocator {
    /// Byte range inside the shared point data file.
    Range { offset: u64, size: u64 },
    /// Per-node resource named by the node's id.
    Key(NodeCoord),
}

/// Resolution state of a node's subtree.
///
/// Transitions are monotonic: `Unresolved` -> `Page` -> `Resolved`. A
/// resolved node is final and never re-fetched for hierarchy.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum NodeState {
    /// Never asked; `children` being empty means nothing here.
    #[default]
    Unresolved,
    /// Known to exist; its subtree lives in a further hierarchy page. The
    /// point count may be published alongside the pointer.
    Page {
        num_points: Option<u64>,
        locator: PageLocator,
    },
    /// Fully described: point count and payload location are final.
    Resolved {
        num_points: u64,
        payload: PayloadLocator,
    },
}

/// One octree node. Owned by the [`NodeArena`](crate::octree::NodeArena);
/// parent/child links are arena ids.
#[derive(Clone, Debug)]
pub struct Node {
    pub coord: NodeCoord,
    pub state: NodeState,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// The node's exact octree cell, axis-aligned in the native frame.
    pub voxel_aabb: Aabb,
    /// The voxel cell carried into the local tangent frame.
    pub voxel_obb: Obb,
    /// Like `voxel_obb` but with the vertical extent clamped to the source's
    /// global elevation range; used for culling and framing only.
    pub clamp_obb: Obb,
    /// Spacing between points at this depth (base spacing / 2^depth).
    pub spacing: f64,
    /// Screen-space-error scratch. Written by the renderer, ignored here.
    pub sse: f32,
}

impl Node {
    /// The hierarchy lookup key, also the node-equality test.
    pub fn id(&self) -> String {
        self.coord.id()
    }

    /// True once the node's own point count and payload location are final.
    /// A `Page` node knows it exists but must still fetch its own page.
    pub fn is_subtree_resolved(&self) -> bool {
        matches!(self.state, NodeState::Resolved { .. })
    }

    /// The point count, when known. `Page` entries may publish one ahead of
    /// resolution; `Unresolved` nodes never have one.
    pub fn num_points(&self) -> Option<u64> {
        match &self.state {
            NodeState::Unresolved => None,
            NodeState::Page { num_points, .. } => *num_points,
            NodeState::Resolved { num_points, .. } => Some(*num_points),
        }
    }

    pub fn payload(&self) -> Option<PayloadLocator> {
        match &self.state {
            NodeState::Resolved { payload, .. } => Some(*payload),
            _ => None,
        }
    }
}
