//! The injected parse capability and the attribute buffers it returns.
//!
//! Decoding and decompressing point payloads is format-specific work that
//! lives outside this crate. A [`PointParser`] receives the raw payload
//! bytes together with everything it needs to re-center positions into the
//! node's local tangent frame, and hands back typed per-point buffers.

use glam::{DQuat, DVec3, Vec3};
use thiserror::Error;

use crate::bounds::Obb;
use crate::crs::Crs;
use crate::metadata::AttributeMetadata;

/// Context handed to the parser for one node's payload.
#[derive(Debug)]
pub struct ParseContext<'a> {
    pub voxel_obb: &'a Obb,
    pub clamp_obb: &'a Obb,
    pub native_crs: &'a Crs,
    /// Local origin positions are re-centered around, chosen per node so
    /// that single-precision output stays usable at planetary scale.
    pub origin: DVec3,
    /// Rotation of the local tangent frame (identity unless the reference
    /// frame is geocentric).
    pub rotation: DQuat,
    pub num_points: u64,
    pub schema: &'a [AttributeMetadata],
}

/// One typed per-point attribute column.
#[derive(Clone, Debug)]
pub enum AttributeBuffer {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl AttributeBuffer {
    pub fn len(&self) -> usize {
        match self {
            AttributeBuffer::U8(v) => v.len(),
            AttributeBuffer::U16(v) => v.len(),
            AttributeBuffer::U32(v) => v.len(),
            AttributeBuffer::U64(v) => v.len(),
            AttributeBuffer::I8(v) => v.len(),
            AttributeBuffer::I16(v) => v.len(),
            AttributeBuffer::I32(v) => v.len(),
            AttributeBuffer::I64(v) => v.len(),
            AttributeBuffer::F32(v) => v.len(),
            AttributeBuffer::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decoded payload of one node: positions already re-centered to the parse
/// context's origin and rotation, plus auxiliary per-point attributes.
#[derive(Clone, Debug, Default)]
pub struct AttributeBuffers {
    pub positions: Vec<Vec3>,
    pub extra: Vec<(String, AttributeBuffer)>,
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed point payload: {0}")]
    Malformed(String),

    #[error("encoding not implemented: {0}")]
    EncodingUnimplemented(String),
}

pub trait PointParser {
    fn parse(&self, bytes: &[u8], context: &ParseContext<'_>)
        -> Result<AttributeBuffers, ParseError>;
}
