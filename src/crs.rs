//! Minimal coordinate-reference-system classification.
//!
//! Only the distinctions the bounding-volume engine needs are modelled:
//! whether a frame is geocentric (ECEF meters), geodetic (longitude/latitude)
//! or projected/local. Full reprojection is out of scope; sources are expected
//! to publish point coordinates in their native frame.

use glam::DVec3;
use thiserror::Error;

/// WGS84 semi-major axis in meters.
pub const WGS84_SEMI_MAJOR: f64 = 6_378_137.0;
/// WGS84 semi-minor axis in meters.
pub const WGS84_SEMI_MINOR: f64 = 6_356_752.314_245_179;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrsKind {
    /// Earth-centered, earth-fixed metric frame (EPSG:4978).
    Geocentric,
    /// Geodetic longitude/latitude (EPSG:4326 and friends).
    Geographic,
    /// Projected or local metric frame, treated as planar.
    Projected,
}

/// A coordinate reference system, classified from its authority code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Crs {
    code: String,
    kind: CrsKind,
}

impl Crs {
    pub fn from_code(code: &str) -> Self {
        let normalized = code.trim().to_ascii_uppercase();
        let kind = match normalized.as_str() {
            "EPSG:4978" => CrsKind::Geocentric,
            "EPSG:4326" | "EPSG:4979" | "OGC:CRS84" => CrsKind::Geographic,
            _ => CrsKind::Projected,
        };
        Self {
            code: code.trim().to_string(),
            kind,
        }
    }

    /// Geocentric WGS84 frame (EPSG:4978).
    pub fn geocentric() -> Self {
        Self::from_code("EPSG:4978")
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn kind(&self) -> CrsKind {
        self.kind
    }

    pub fn is_geocentric(&self) -> bool {
        self.kind == CrsKind::Geocentric
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CrsError {
    #[error("unsupported CRS transform: {0} -> {1}")]
    UnsupportedTransform(String, String),
}

/// Outward geodetic surface normal of the WGS84 ellipsoid at an ECEF point.
///
/// This is the gradient of the ellipsoid equation, not the geocentric
/// direction; the two differ by the latitude-dependent flattening term.
pub fn geodetic_surface_normal(p: DVec3) -> DVec3 {
    let a2 = WGS84_SEMI_MAJOR * WGS84_SEMI_MAJOR;
    let b2 = WGS84_SEMI_MINOR * WGS84_SEMI_MINOR;
    DVec3::new(p.x / a2, p.y / a2, p.z / b2)
        .try_normalize()
        .unwrap_or(DVec3::Z)
}
