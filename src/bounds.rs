//! Bounding-volume engine.
//!
//! Pure functions deriving a child node's boxes from its parent's box and the
//! octree coordinate relationship. Boxes are never recomputed from point
//! data: the subdivision arithmetic alone keeps every child box exactly
//! contained in its parent.

use glam::{DQuat, DVec3};

use crate::crs::{geodetic_surface_normal, Crs, CrsError};
use crate::octree::coord::NodeCoord;

/// Axis-aligned box in the dataset's native reference frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    pub fn volume(&self) -> f64 {
        let s = self.size();
        s.x * s.y * s.z
    }

    pub fn contains(&self, other: &Aabb) -> bool {
        other.min.cmpge(self.min).all() && other.max.cmple(self.max).all()
    }
}

/// A box together with the rotation correcting it into the node's local
/// tangent frame. The rotation is identity unless the rendering reference
/// frame is geocentric.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Obb {
    pub aabb: Aabb,
    pub rotation: DQuat,
}

impl Obb {
    pub fn new(aabb: Aabb, rotation: DQuat) -> Self {
        Self { aabb, rotation }
    }

    pub fn min(&self) -> DVec3 {
        self.aabb.min
    }

    pub fn max(&self) -> DVec3 {
        self.aabb.max
    }
}

/// Derive a child's voxel box from its parent's by exact subdivision.
///
/// Supports skipping levels: the subdivision factor is
/// `2^(child depth - parent depth)`. For the degenerate case (same
/// coordinate) the parent box is returned bit for bit.
pub fn derive_child_box(parent: &Aabb, parent_coord: NodeCoord, child_coord: NodeCoord) -> Aabb {
    debug_assert!(
        parent_coord.contains(child_coord),
        "derive_child_box: {child_coord} is not in the subtree of {parent_coord}"
    );
    if child_coord == parent_coord {
        return *parent;
    }

    let f = 1u64 << (child_coord.depth - parent_coord.depth);
    let child_size = parent.size() / f as f64;
    let parent_pos_at_child_depth = DVec3::new(
        (parent_coord.x as u64 * f) as f64,
        (parent_coord.y as u64 * f) as f64,
        (parent_coord.z as u64 * f) as f64,
    );
    let child_pos = DVec3::new(
        child_coord.x as f64,
        child_coord.y as f64,
        child_coord.z as f64,
    );
    let translation = (child_pos - parent_pos_at_child_depth) * child_size;
    let min = parent.min + translation;
    Aabb::new(min, min + child_size)
}

/// Restrict a voxel box's vertical extent to the dataset's global elevation
/// range. Horizontal bounds are untouched.
///
/// The two adjustments are applied independently, so a box lying entirely
/// outside `[zmin, zmax]` keeps its original thickness and shifts nothing.
pub fn derive_clamp_box(voxel: &Aabb, zmin: f64, zmax: f64) -> Aabb {
    let mut clamped = *voxel;
    if clamped.min.z < zmax {
        clamped.max.z = clamped.max.z.min(zmax);
    }
    if clamped.max.z > zmin {
        clamped.min.z = clamped.min.z.max(zmin);
    }
    clamped
}

/// Rotation aligning the node-local up axis with the geodetic surface normal
/// at `origin`, when the rendering reference frame is geocentric. Identity
/// otherwise.
///
/// Together with a translation to `origin` this defines the node's local
/// tangent frame, used both for the oriented box and for point re-centering.
pub fn orientation_for(origin: DVec3, reference: &Crs, native: &Crs) -> Result<DQuat, CrsError> {
    if !reference.is_geocentric() {
        return Ok(DQuat::IDENTITY);
    }
    if !native.is_geocentric() {
        // Orienting against the ellipsoid needs ECEF coordinates; anything
        // else would require a reprojection this engine does not perform.
        return Err(CrsError::UnsupportedTransform(
            native.code().to_string(),
            reference.code().to_string(),
        ));
    }
    Ok(DQuat::from_rotation_arc(
        DVec3::Z,
        geodetic_surface_normal(origin),
    ))
}

/// Per-tree geometric constants consulted when attaching children.
///
/// Validated once at construction so that per-node orientation lookups are
/// infallible afterwards.
#[derive(Clone, Debug)]
pub struct TreeGeometry {
    pub zmin: f64,
    pub zmax: f64,
    pub native_crs: Crs,
    pub reference_crs: Crs,
}

impl TreeGeometry {
    pub fn new(
        zmin: f64,
        zmax: f64,
        native_crs: Crs,
        reference_crs: Crs,
    ) -> Result<Self, CrsError> {
        // Probe once; orientation_for fails only on the CRS pair, never on
        // the origin point.
        orientation_for(DVec3::Z, &reference_crs, &native_crs)?;
        Ok(Self {
            zmin,
            zmax,
            native_crs,
            reference_crs,
        })
    }

    pub fn orientation(&self, origin: DVec3) -> DQuat {
        orientation_for(origin, &self.reference_crs, &self.native_crs)
            .expect("CRS pair validated at construction")
    }
}
