//! Shared helpers: synthetic wire data and capability doubles.

use std::sync::{Arc, Mutex};

use glam::DVec3;

use cloudtree::attributes::{AttributeBuffers, ParseContext, ParseError, PointParser};
use cloudtree::bounds::Aabb;
use cloudtree::crs::Crs;
use cloudtree::hierarchy::HierarchyProtocol;
use cloudtree::resource::memory::MemoryClient;
use cloudtree::source::{Source, SourceDescriptor};

pub const BYTES_PER_ENTRY: usize = 22;
pub const KIND_LEAF: u8 = 1;
pub const KIND_INNER: u8 = 0;
pub const KIND_PAGE: u8 = 2;

/// One 22-byte little-endian paged hierarchy entry.
pub fn entry(kind: u8, child_mask: u8, num_points: u32, offset: u64, size: u64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(BYTES_PER_ENTRY);
    bytes.push(kind);
    bytes.push(child_mask);
    bytes.extend_from_slice(&num_points.to_le_bytes());
    bytes.extend_from_slice(&offset.to_le_bytes());
    bytes.extend_from_slice(&size.to_le_bytes());
    bytes
}

pub fn paged_descriptor(url: &str, first_chunk_size: u64) -> SourceDescriptor {
    SourceDescriptor {
        url: url.to_string(),
        native_crs: Crs::from_code("EPSG:2154"),
        reference_crs: Crs::from_code("EPSG:2154"),
        zmin: 0.0,
        zmax: 100.0,
        spacing: 1.0,
        bounds: Aabb::new(DVec3::ZERO, DVec3::splat(64.0)),
        total_points: None,
        attributes: Vec::new(),
        protocol: HierarchyProtocol::Paged {
            hierarchy_url: format!("{url}/hierarchy.bin"),
            data_url: format!("{url}/octree.bin"),
            first_chunk_size,
        },
    }
}

pub fn enumerated_descriptor(url: &str) -> SourceDescriptor {
    SourceDescriptor {
        url: url.to_string(),
        native_crs: Crs::from_code("EPSG:2154"),
        reference_crs: Crs::from_code("EPSG:2154"),
        zmin: 0.0,
        zmax: 100.0,
        spacing: 1.0,
        bounds: Aabb::new(DVec3::ZERO, DVec3::splat(64.0)),
        total_points: None,
        attributes: Vec::new(),
        protocol: HierarchyProtocol::Enumerated {
            hierarchy_base: format!("{url}/ept-hierarchy"),
            data_base: format!("{url}/ept-data"),
            data_extension: "laz".to_string(),
        },
    }
}

/// Parser double that records what it was handed.
#[derive(Default)]
pub struct RecordingParser {
    pub calls: Mutex<Vec<ParseCall>>,
}

#[derive(Clone, Debug)]
pub struct ParseCall {
    pub bytes: usize,
    pub num_points: u64,
    pub origin: DVec3,
}

impl PointParser for RecordingParser {
    fn parse(
        &self,
        bytes: &[u8],
        context: &ParseContext<'_>,
    ) -> Result<AttributeBuffers, ParseError> {
        self.calls.lock().unwrap().push(ParseCall {
            bytes: bytes.len(),
            num_points: context.num_points,
            origin: context.origin,
        });
        Ok(AttributeBuffers {
            positions: vec![glam::Vec3::ZERO; context.num_points as usize],
            extra: Vec::new(),
        })
    }
}

pub fn source_with(
    descriptor: SourceDescriptor,
    client: Arc<MemoryClient>,
) -> (Source<Arc<MemoryClient>>, Arc<RecordingParser>) {
    let parser = Arc::new(RecordingParser::default());
    (
        Source::new(descriptor, client, parser.clone()),
        parser,
    )
}
