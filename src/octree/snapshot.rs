use crate::bounds::Obb;
use crate::octree::coord::NodeCoord;
use crate::octree::{NodeArena, NodeId};

/// Immutable copy of the loaded part of the tree, safe to hand to a renderer
/// while the arena keeps mutating under further resolution calls.
#[derive(Clone, Debug)]
pub struct NodeSnapshot {
    pub coord: NodeCoord,
    pub num_points: Option<u64>,
    pub subtree_resolved: bool,
    pub voxel_obb: Obb,
    pub clamp_obb: Obb,
    pub spacing: f64,
    pub children: Vec<NodeSnapshot>,
}

impl NodeSnapshot {
    /// Snapshot the subtree rooted at `node_id`.
    pub fn capture(arena: &NodeArena, node_id: NodeId) -> NodeSnapshot {
        let node = arena.node(node_id).expect("snapshot: node not in arena");
        NodeSnapshot {
            coord: node.coord,
            num_points: node.num_points(),
            subtree_resolved: node.is_subtree_resolved(),
            voxel_obb: node.voxel_obb,
            clamp_obb: node.clamp_obb,
            spacing: node.spacing,
            children: node
                .children
                .iter()
                .map(|&child| NodeSnapshot::capture(arena, child))
                .collect(),
        }
    }

    pub fn id(&self) -> String {
        self.coord.id()
    }

    /// Depth-first iteration over the snapshot, parents before children.
    pub fn iter(&self) -> SnapshotIter<'_> {
        SnapshotIter { stack: vec![self] }
    }
}

pub struct SnapshotIter<'a> {
    stack: Vec<&'a NodeSnapshot>,
}

impl<'a> Iterator for SnapshotIter<'a> {
    type Item = &'a NodeSnapshot;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        for child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some(node)
    }
}
