pub mod coord;
pub mod node;
pub mod snapshot;
pub mod traversal;

use std::collections::HashMap;

use slab::Slab;

use crate::bounds::{derive_child_box, derive_clamp_box, Aabb, Obb, TreeGeometry};
use coord::NodeCoord;
use node::{Node, NodeState};

/// Stable arena index of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Flat storage owning every node of one tree.
///
/// Parent/child relationships are ids into the slab, and a coordinate index
/// provides the hierarchy lookup key. The arena and the root together own
/// the whole tree; nodes are never removed during normal operation.
#[derive(Clone, Debug)]
pub struct NodeArena {
    storage: Slab<Node>,
    by_coord: HashMap<NodeCoord, NodeId>,
    root_id: NodeId,
    geometry: TreeGeometry,
}

impl NodeArena {
    /// Create an arena holding only the root node.
    pub fn new(
        root_aabb: Aabb,
        root_state: NodeState,
        base_spacing: f64,
        geometry: TreeGeometry,
    ) -> Self {
        let rotation = geometry.orientation(root_aabb.center());
        let clamp = derive_clamp_box(&root_aabb, geometry.zmin, geometry.zmax);
        let root = Node {
            coord: NodeCoord::ROOT,
            state: root_state,
            parent: None,
            children: Vec::new(),
            voxel_aabb: root_aabb,
            voxel_obb: Obb::new(root_aabb, rotation),
            clamp_obb: Obb::new(clamp, rotation),
            spacing: base_spacing,
            sse: 0.0,
        };

        let mut storage = Slab::new();
        let mut by_coord = HashMap::new();
        let root_id = NodeId(storage.insert(root));
        by_coord.insert(NodeCoord::ROOT, root_id);

        Self {
            storage,
            by_coord,
            root_id,
            geometry,
        }
    }

    pub fn root_id(&self) -> NodeId {
        self.root_id
    }

    pub fn root(&self) -> &Node {
        self.storage
            .get(self.root_id.0)
            .expect("root node not found - invariant broken")
    }

    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.storage.get(node_id.0)
    }

    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.storage.get_mut(node_id.0)
    }

    /// Id of the node with this coordinate, if it has been materialized.
    pub fn lookup(&self, coord: NodeCoord) -> Option<NodeId> {
        self.by_coord.get(&coord).copied()
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.storage.reserve(additional);
        self.by_coord.reserve(additional);
    }

    pub fn geometry(&self) -> &TreeGeometry {
        &self.geometry
    }

    /// Attach a child under `parent_id`, deriving its boxes and spacing from
    /// the parent. Children attached in call order stay in that order.
    ///
    /// Panics on a duplicate coordinate; the hierarchy loaders never produce
    /// one, so hitting this is a programmer error.
    pub fn add(&mut self, parent_id: NodeId, coord: NodeCoord, state: NodeState) -> NodeId {
        assert!(
            !self.by_coord.contains_key(&coord),
            "duplicate child coordinate {coord}"
        );

        let parent = self
            .storage
            .get(parent_id.0)
            .expect("add: parent not in arena");
        let depth_step = coord.depth - parent.coord.depth;
        let voxel_aabb = derive_child_box(&parent.voxel_aabb, parent.coord, coord);
        let clamp = derive_clamp_box(&voxel_aabb, self.geometry.zmin, self.geometry.zmax);
        let rotation = self.geometry.orientation(voxel_aabb.center());
        let child = Node {
            coord,
            state,
            parent: Some(parent_id),
            children: Vec::new(),
            voxel_aabb,
            voxel_obb: Obb::new(voxel_aabb, rotation),
            clamp_obb: Obb::new(clamp, rotation),
            spacing: parent.spacing / (1u64 << depth_step) as f64,
            sse: 0.0,
        };

        let child_id = NodeId(self.storage.insert(child));
        self.by_coord.insert(coord, child_id);
        self.storage
            .get_mut(parent_id.0)
            .expect("add: parent not in arena")
            .children
            .push(child_id);
        child_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::Crs;
    use glam::DVec3;

    fn test_arena() -> NodeArena {
        let geometry = TreeGeometry::new(
            0.0,
            100.0,
            Crs::from_code("EPSG:2154"),
            Crs::from_code("EPSG:2154"),
        )
        .unwrap();
        let aabb = Aabb::new(DVec3::ZERO, DVec3::splat(64.0));
        NodeArena::new(aabb, NodeState::Unresolved, 1.0, geometry)
    }

    #[test]
    fn add_derives_contained_boxes_and_halved_spacing() {
        let mut arena = test_arena();
        let root_id = arena.root_id();
        let coord = NodeCoord::ROOT.child(0b101);
        let child_id = arena.add(root_id, coord, NodeState::Unresolved);

        let child = arena.node(child_id).unwrap();
        assert_eq!(child.parent, Some(root_id));
        assert_eq!(child.spacing, 0.5);
        assert!(arena.root().voxel_aabb.contains(&child.voxel_aabb));
        assert_eq!(arena.root().children, vec![child_id]);
        assert_eq!(arena.lookup(coord), Some(child_id));
        // Clamp box never widens horizontally.
        assert_eq!(child.clamp_obb.min().x, child.voxel_obb.min().x);
        assert_eq!(child.clamp_obb.max().y, child.voxel_obb.max().y);
    }

    #[test]
    #[should_panic(expected = "duplicate child coordinate")]
    fn add_rejects_duplicate_coordinate() {
        let mut arena = test_arena();
        let root_id = arena.root_id();
        let coord = NodeCoord::ROOT.child(0);
        arena.add(root_id, coord, NodeState::Unresolved);
        arena.add(root_id, coord, NodeState::Unresolved);
    }
}
