pub use crate::attributes::{AttributeBuffers, ParseContext, PointParser};
pub use crate::crs::Crs;
pub use crate::octree::coord::NodeCoord;
pub use crate::octree::snapshot::NodeSnapshot;
pub use crate::octree::NodeId;
pub use crate::point_cloud::PointCloud;
pub use crate::resource::ResourceClient;
pub use crate::source::{Source, SourceDescriptor};

// Error types
pub use crate::hierarchy::HierarchyError;
pub use crate::point_cloud::LoadPointsError;
pub use crate::source::SourceError;
