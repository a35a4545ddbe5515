//! Streaming client for massive clustered-octree point clouds.
//!
//! Exposes an in-memory octree a renderer can progressively refine: nodes
//! are materialized lazily from one of two hierarchy wire formats (a paged
//! binary hierarchy addressed by byte ranges, or one enumerated JSON table
//! per subtree root), bounding volumes are derived from the parent cell by
//! exact subdivision, and point payloads are re-centered into a per-node
//! local tangent frame so single-precision coordinates stay usable at
//! planetary scale.
//!
//! Transport and point decoding are injected capabilities: see
//! [`resource::ResourceClient`] and [`attributes::PointParser`].

pub mod attributes;
pub mod bounds;
pub mod crs;
pub mod hierarchy;
pub mod metadata;
pub mod octree;
pub mod point_cloud;
pub mod prelude;
pub mod resource;
pub mod source;

pub use attributes::{AttributeBuffers, ParseContext, PointParser};
pub use bounds::{Aabb, Obb};
pub use crs::Crs;
pub use hierarchy::HierarchyProtocol;
pub use metadata::{AttributeMetadata, EnumeratedMetadata, PagedMetadata};
pub use octree::coord::NodeCoord;
pub use octree::node::{Node, NodeState};
pub use octree::{NodeArena, NodeId};
pub use point_cloud::PointCloud;
pub use source::{Source, SourceDescriptor};

// Error types
pub use attributes::ParseError;
pub use crs::CrsError;
pub use hierarchy::HierarchyError;
pub use point_cloud::LoadPointsError;
pub use resource::ResourceError;
pub use source::SourceError;
