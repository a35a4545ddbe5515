//! The source descriptor: everything a tree shares, read-only, across all of
//! its nodes.

use std::sync::Arc;

use thiserror::Error;

use crate::attributes::PointParser;
use crate::bounds::{Aabb, TreeGeometry};
use crate::crs::{Crs, CrsError};
use crate::hierarchy::HierarchyProtocol;
use crate::metadata::AttributeMetadata;
use crate::resource::{ResourceClient, ResourceError};

/// Passive record describing one dataset.
#[derive(Clone, Debug)]
pub struct SourceDescriptor {
    pub url: String,
    pub native_crs: Crs,
    /// The rendering/world frame the tree will be consumed in; drives the
    /// per-node orientation correction.
    pub reference_crs: Crs,
    /// Global vertical extent of the data, for the clamp boxes.
    pub zmin: f64,
    pub zmax: f64,
    /// Point spacing at the root; halves at every depth.
    pub spacing: f64,
    /// Root voxel cell.
    pub bounds: Aabb,
    pub total_points: Option<u64>,
    pub attributes: Vec<AttributeMetadata>,
    pub protocol: HierarchyProtocol,
}

impl SourceDescriptor {
    pub fn geometry(&self) -> Result<TreeGeometry, CrsError> {
        TreeGeometry::new(
            self.zmin,
            self.zmax,
            self.native_crs.clone(),
            self.reference_crs.clone(),
        )
    }
}

/// A descriptor bound to its two injected capabilities: fetch and parse.
/// Shared read-only by every node of one tree.
pub struct Source<C: ResourceClient> {
    pub client: C,
    pub parser: Arc<dyn PointParser>,
    pub descriptor: SourceDescriptor,
}

impl<C: ResourceClient> Source<C> {
    pub fn new(descriptor: SourceDescriptor, client: C, parser: Arc<dyn PointParser>) -> Self {
        Self {
            client,
            parser,
            descriptor,
        }
    }
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("error loading metadata: {0}")]
    Metadata(#[from] ResourceError),

    #[error(transparent)]
    Crs(#[from] CrsError),
}
