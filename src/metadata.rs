//! Published dataset descriptors for the two supported layouts.
//!
//! A paged dataset publishes `<url>/metadata.json` next to `hierarchy.bin`
//! and `octree.bin`; an enumerated dataset publishes `<url>/ept.json` with
//! per-node tables under `ept-hierarchy/` and payloads under `ept-data/`.
//! Either descriptor deserializes into a [`SourceDescriptor`].

use glam::DVec3;
use serde::Deserialize;

use crate::bounds::Aabb;
use crate::crs::Crs;
use crate::hierarchy::HierarchyProtocol;
use crate::source::SourceDescriptor;

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PagedMetadata {
    pub version: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub points: u64,
    #[serde(default)]
    pub projection: String,
    pub hierarchy: PagedHierarchyMetadata,
    pub offset: [f64; 3],
    pub scale: [f64; 3],
    pub spacing: f64,
    pub bounding_box: BoundingBoxMetadata,
    pub encoding: String,
    pub attributes: Vec<AttributeMetadata>,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PagedHierarchyMetadata {
    pub first_chunk_size: u64,
    pub step_size: u16,
    pub depth: u16,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBoxMetadata {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl From<BoundingBoxMetadata> for Aabb {
    fn from(b: BoundingBoxMetadata) -> Aabb {
        Aabb::new(DVec3::from(b.min), DVec3::from(b.max))
    }
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeType {
    #[serde(rename = "int8")]
    Int8,
    #[serde(rename = "int16")]
    Int16,
    #[serde(rename = "int32")]
    Int32,
    #[serde(rename = "int64")]
    Int64,
    #[serde(rename = "uint8")]
    UInt8,
    #[serde(rename = "uint16")]
    UInt16,
    #[serde(rename = "uint32")]
    UInt32,
    #[serde(rename = "uint64")]
    UInt64,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "double")]
    Double,
    #[serde(rename = "undefined")]
    Undefined,
}

/// Schema of one per-point attribute, passed through to the parse context.
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AttributeMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub size: u16,
    pub num_elements: u16,
    pub element_size: u16,
    pub r#type: AttributeType,
    #[serde(default)]
    pub min: Vec<f64>,
    #[serde(default)]
    pub max: Vec<f64>,
}

impl PagedMetadata {
    /// Global vertical extent: the tight range of the position attribute
    /// when published, else the (cubified, so much looser) bounding box.
    fn elevation_range(&self) -> (f64, f64) {
        let position = self
            .attributes
            .iter()
            .find(|a| a.name == "position" || a.name == "POSITION_CARTESIAN");
        match position {
            Some(a) if a.min.len() >= 3 && a.max.len() >= 3 => (a.min[2], a.max[2]),
            _ => (self.bounding_box.min[2], self.bounding_box.max[2]),
        }
    }

    pub fn into_descriptor(self, url: &str, reference_crs: Crs) -> SourceDescriptor {
        let (zmin, zmax) = self.elevation_range();
        SourceDescriptor {
            url: url.to_string(),
            native_crs: Crs::from_code(&self.projection),
            reference_crs,
            zmin,
            zmax,
            spacing: self.spacing,
            bounds: self.bounding_box.clone().into(),
            total_points: Some(self.points),
            attributes: self.attributes,
            protocol: HierarchyProtocol::Paged {
                hierarchy_url: format!("{url}/hierarchy.bin"),
                data_url: format!("{url}/octree.bin"),
                first_chunk_size: self.hierarchy.first_chunk_size,
            },
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct EnumeratedMetadata {
    /// Cubic bounds: [xmin, ymin, zmin, xmax, ymax, zmax].
    pub bounds: [f64; 6],
    /// Tight bounds of the actual data, same layout.
    pub bounds_conforming: [f64; 6],
    pub points: u64,
    pub span: u32,
    pub data_type: String,
    pub hierarchy_type: String,
    pub srs: SrsMetadata,
    pub schema: Vec<SchemaItemMetadata>,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SrsMetadata {
    #[serde(default)]
    pub authority: String,
    #[serde(default)]
    pub horizontal: String,
    #[serde(default)]
    pub vertical: String,
    #[serde(default)]
    pub wkt: String,
}

impl SrsMetadata {
    pub fn code(&self) -> String {
        format!("{}:{}", self.authority, self.horizontal)
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SchemaItemMetadata {
    pub name: String,
    pub r#type: String,
    pub size: u16,
    #[serde(default)]
    pub scale: Option<f64>,
    #[serde(default)]
    pub offset: Option<f64>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
}

impl SchemaItemMetadata {
    fn attribute_type(&self) -> AttributeType {
        match (self.r#type.as_str(), self.size) {
            ("signed", 1) => AttributeType::Int8,
            ("signed", 2) => AttributeType::Int16,
            ("signed", 4) => AttributeType::Int32,
            ("signed", 8) => AttributeType::Int64,
            ("unsigned", 1) => AttributeType::UInt8,
            ("unsigned", 2) => AttributeType::UInt16,
            ("unsigned", 4) => AttributeType::UInt32,
            ("unsigned", 8) => AttributeType::UInt64,
            ("float", 4) => AttributeType::Float,
            ("float", 8) => AttributeType::Double,
            _ => AttributeType::Undefined,
        }
    }
}

impl From<&SchemaItemMetadata> for AttributeMetadata {
    fn from(item: &SchemaItemMetadata) -> AttributeMetadata {
        AttributeMetadata {
            name: item.name.clone(),
            description: String::new(),
            size: item.size,
            num_elements: 1,
            element_size: item.size,
            r#type: item.attribute_type(),
            min: item.minimum.map(|v| vec![v]).unwrap_or_default(),
            max: item.maximum.map(|v| vec![v]).unwrap_or_default(),
        }
    }
}

impl EnumeratedMetadata {
    fn payload_extension(&self) -> &'static str {
        match self.data_type.as_str() {
            "laszip" => "laz",
            "zstandard" => "zst",
            _ => "bin",
        }
    }

    pub fn into_descriptor(self, url: &str, reference_crs: Crs) -> SourceDescriptor {
        let bounds = Aabb::new(
            DVec3::new(self.bounds[0], self.bounds[1], self.bounds[2]),
            DVec3::new(self.bounds[3], self.bounds[4], self.bounds[5]),
        );
        // Base spacing: one point per cell of the root's span-sized grid.
        let spacing = (bounds.size().x / f64::from(self.span)).max(f64::EPSILON);
        SourceDescriptor {
            url: url.to_string(),
            native_crs: Crs::from_code(&self.srs.code()),
            reference_crs,
            zmin: self.bounds_conforming[2],
            zmax: self.bounds_conforming[5],
            spacing,
            bounds,
            total_points: Some(self.points),
            attributes: self.schema.iter().map(AttributeMetadata::from).collect(),
            protocol: HierarchyProtocol::Enumerated {
                hierarchy_base: format!("{url}/ept-hierarchy"),
                data_base: format!("{url}/ept-data"),
                data_extension: self.payload_extension().to_string(),
            },
        }
    }
}
