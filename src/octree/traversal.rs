//! Traversal helpers built only on coordinates and parent links.

use super::{NodeArena, NodeId};

impl NodeArena {
    /// Deepest node that is an ancestor of (or equal to) both inputs.
    ///
    /// Depth-driven climb: the deeper side walks up until both sides sit at
    /// the same depth, then both climb together until the coordinates meet.
    /// Terminates at the shared root in the worst case.
    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> NodeId {
        let (mut a, mut b) = (a, b);
        loop {
            let na = self.node(a).expect("common_ancestor: node not in arena");
            let nb = self.node(b).expect("common_ancestor: node not in arena");
            if na.coord.depth == nb.coord.depth {
                if na.coord == nb.coord {
                    return a;
                }
                // Distinct coordinates at depth 0 would mean two roots; a
                // single arena cannot hold them.
                a = na.parent.expect("distinct nodes at depth 0 in one tree");
                b = nb.parent.expect("distinct nodes at depth 0 in one tree");
            } else if na.coord.depth < nb.coord.depth {
                b = nb.parent.expect("deeper node must have a parent");
            } else {
                a = na.parent.expect("deeper node must have a parent");
            }
        }
    }

    /// Whether `ancestor` is an ancestor of (or equal to) `node`.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let anc = self.node(ancestor).expect("is_ancestor: node not in arena");
        let n = self.node(node).expect("is_ancestor: node not in arena");
        anc.coord.contains(n.coord)
    }

    /// The chain of ancestors from `node` (exclusive) up to the root.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut current = self.node(node).and_then(|n| n.parent);
        std::iter::from_fn(move || {
            let id = current?;
            current = self.node(id).and_then(|n| n.parent);
            Some(id)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::bounds::{Aabb, TreeGeometry};
    use crate::crs::Crs;
    use crate::octree::coord::NodeCoord;
    use crate::octree::node::NodeState;
    use crate::octree::{NodeArena, NodeId};
    use glam::DVec3;

    /// root -> {a, b, c}, a -> {a1, a2}, c -> {c1, c2}.
    fn test_tree() -> (NodeArena, [NodeId; 8]) {
        let geometry = TreeGeometry::new(
            0.0,
            1.0,
            Crs::from_code("EPSG:2154"),
            Crs::from_code("EPSG:2154"),
        )
        .unwrap();
        let aabb = Aabb::new(DVec3::ZERO, DVec3::ONE);
        let mut arena = NodeArena::new(aabb, NodeState::Unresolved, 1.0, geometry);
        let root = arena.root_id();
        let a = arena.add(root, NodeCoord::ROOT.child(0), NodeState::Unresolved);
        let b = arena.add(root, NodeCoord::ROOT.child(1), NodeState::Unresolved);
        let c = arena.add(root, NodeCoord::ROOT.child(2), NodeState::Unresolved);
        let a_coord = NodeCoord::ROOT.child(0);
        let c_coord = NodeCoord::ROOT.child(2);
        let a1 = arena.add(a, a_coord.child(0), NodeState::Unresolved);
        let a2 = arena.add(a, a_coord.child(1), NodeState::Unresolved);
        let c1 = arena.add(c, c_coord.child(0), NodeState::Unresolved);
        let c2 = arena.add(c, c_coord.child(1), NodeState::Unresolved);
        (arena, [root, a, b, c, a1, a2, c1, c2])
    }

    #[test]
    fn common_ancestor_across_branches_is_root() {
        let (arena, [root, _, _, _, a1, _, _, c2]) = test_tree();
        assert_eq!(arena.common_ancestor(a1, c2), root);
    }

    #[test]
    fn common_ancestor_of_siblings_is_parent() {
        let (arena, [_, a, _, _, a1, a2, _, _]) = test_tree();
        assert_eq!(arena.common_ancestor(a1, a2), a);
    }

    #[test]
    fn common_ancestor_of_ancestor_and_descendant() {
        let (arena, [_, a, _, _, a1, _, _, _]) = test_tree();
        assert_eq!(arena.common_ancestor(a, a1), a);
        assert_eq!(arena.common_ancestor(a1, a), a);
    }

    #[test]
    fn common_ancestor_of_node_with_itself() {
        let (arena, [_, _, b, _, _, _, _, _]) = test_tree();
        assert_eq!(arena.common_ancestor(b, b), b);
    }

    #[test]
    fn ancestor_checks_and_chain() {
        let (arena, [root, a, b, _, a1, _, _, _]) = test_tree();
        assert!(arena.is_ancestor(root, a1));
        assert!(arena.is_ancestor(a, a1));
        assert!(!arena.is_ancestor(b, a1));
        let chain: Vec<_> = arena.ancestors(a1).collect();
        assert_eq!(chain, vec![a, root]);
    }
}
