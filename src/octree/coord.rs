use std::fmt;

/// Octree coordinate: a depth and a grid position at that depth.
///
/// The coordinate is the immutable identity of a node. Depth 0 is the root
/// (position 0,0,0); each node has up to 8 children at
/// `(depth + 1, 2x + dx, 2y + dy, 2z + dz)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct NodeCoord {
    pub depth: u32,
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl NodeCoord {
    pub const ROOT: NodeCoord = NodeCoord {
        depth: 0,
        x: 0,
        y: 0,
        z: 0,
    };

    pub fn new(depth: u32, x: u32, y: u32, z: u32) -> Self {
        Self { depth, x, y, z }
    }

    /// Child coordinate for a child index in 0..8.
    ///
    /// Bit layout matches the paged hierarchy's child mask: bit 0 selects the
    /// upper z half, bit 1 the upper y half, bit 2 the upper x half.
    pub fn child(self, index: usize) -> Self {
        debug_assert!(index < 8, "child index out of range: {index}");
        let dz = (index & 0b001) as u32;
        let dy = ((index >> 1) & 0b001) as u32;
        let dx = ((index >> 2) & 0b001) as u32;
        Self {
            depth: self.depth + 1,
            x: 2 * self.x + dx,
            y: 2 * self.y + dy,
            z: 2 * self.z + dz,
        }
    }

    /// The 8 child coordinates, in child-index order.
    pub fn children(self) -> impl Iterator<Item = NodeCoord> {
        (0..8).map(move |i| self.child(i))
    }

    pub fn parent(self) -> Option<NodeCoord> {
        if self.depth == 0 {
            return None;
        }
        Some(Self {
            depth: self.depth - 1,
            x: self.x / 2,
            y: self.y / 2,
            z: self.z / 2,
        })
    }

    /// The coordinate of this node's ancestor at a shallower depth.
    pub fn ancestor_at(self, depth: u32) -> NodeCoord {
        assert!(depth <= self.depth, "ancestor_at: depth {depth} is below {self}");
        let shift = self.depth - depth;
        Self {
            depth,
            x: self.x >> shift,
            y: self.y >> shift,
            z: self.z >> shift,
        }
    }

    /// Whether `other` lies in this node's subtree (inclusive).
    pub fn contains(self, other: NodeCoord) -> bool {
        other.depth >= self.depth && other.ancestor_at(self.depth) == self
    }

    /// The hierarchy lookup key, `"depth-x-y-z"`.
    pub fn id(&self) -> String {
        self.to_string()
    }

    /// Parse an id of the form `"depth-x-y-z"`.
    pub fn parse(id: &str) -> Option<NodeCoord> {
        let mut parts = id.split('-');
        let depth = parts.next()?.parse().ok()?;
        let x = parts.next()?.parse().ok()?;
        let y = parts.next()?.parse().ok()?;
        let z = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { depth, x, y, z })
    }
}

impl fmt::Display for NodeCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}-{}", self.depth, self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_roundtrip() {
        let coord = NodeCoord::new(3, 5, 2, 7);
        assert_eq!(coord.id(), "3-5-2-7");
        assert_eq!(NodeCoord::parse("3-5-2-7"), Some(coord));
        assert_eq!(NodeCoord::parse("3-5-2"), None);
        assert_eq!(NodeCoord::parse("3-5-2-7-1"), None);
        assert_eq!(NodeCoord::parse("a-b-c-d"), None);
    }

    #[test]
    fn children_cover_all_offsets() {
        let parent = NodeCoord::new(1, 1, 0, 1);
        let children: Vec<_> = parent.children().collect();
        assert_eq!(children.len(), 8);
        for (i, child) in children.iter().enumerate() {
            assert_eq!(child.depth, 2);
            assert_eq!(child.parent(), Some(parent));
            assert_eq!(parent.child(i), *child);
        }
        // Index bits: z is bit 0, y is bit 1, x is bit 2.
        assert_eq!(parent.child(0b001), NodeCoord::new(2, 2, 0, 3));
        assert_eq!(parent.child(0b010), NodeCoord::new(2, 2, 1, 2));
        assert_eq!(parent.child(0b100), NodeCoord::new(2, 3, 0, 2));
    }

    #[test]
    fn ancestor_climb() {
        let deep = NodeCoord::new(4, 12, 3, 9);
        assert_eq!(deep.ancestor_at(4), deep);
        assert_eq!(deep.ancestor_at(2), NodeCoord::new(2, 3, 0, 2));
        assert_eq!(deep.ancestor_at(0), NodeCoord::ROOT);
        assert!(NodeCoord::ROOT.contains(deep));
        assert!(NodeCoord::new(2, 3, 0, 2).contains(deep));
        assert!(!NodeCoord::new(2, 2, 0, 2).contains(deep));
    }
}
