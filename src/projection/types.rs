//! Projection type definitions

use serde::{Deserialize, Serialize};

/// Frame geometry understood by the projection engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GeometryType {
    /// Equirectangular projection (ERP)
    #[default]
    Equirectangular,
    /// Cubemap projection (CMP)
    Cubemap,
    /// Rectilinear viewport
    Viewport,
    /// Flat 2D frame
    Planar,
}

impl std::fmt::Display for GeometryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Equirectangular => write!(f, "ERP"),
            Self::Cubemap => write!(f, "CMP"),
            Self::Viewport => write!(f, "Viewport"),
            Self::Planar => write!(f, "Planar"),
        }
    }
}

/// What the projection engine is asked to compute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UsageMode {
    /// Viewport geometry only; tile selection is done by the caller
    #[default]
    ViewportOnly,
    /// Viewport geometry plus the engine's own tile list
    ViewportAndTiles,
}

/// Head-mounted display capabilities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayInfo {
    /// Viewport width in pixels
    pub viewport_width: u32,
    /// Viewport height in pixels
    pub viewport_height: u32,
    /// Horizontal field of view (degrees)
    pub fov_h: f32,
    /// Vertical field of view (degrees)
    pub fov_v: f32,
    /// Geometry of the decoded stream
    #[serde(default)]
    pub input_geometry: GeometryType,
    /// Geometry rendered to the display
    #[serde(default = "default_output_geometry")]
    pub output_geometry: GeometryType,
}

fn default_output_geometry() -> GeometryType {
    GeometryType::Viewport
}

impl DisplayInfo {
    /// Create display info for an ERP stream rendered to a viewport
    pub fn new(viewport_width: u32, viewport_height: u32, fov_h: f32, fov_v: f32) -> Self {
        Self {
            viewport_width,
            viewport_height,
            fov_h,
            fov_v,
            input_geometry: GeometryType::Equirectangular,
            output_geometry: default_output_geometry(),
        }
    }

    /// Name of the first unusable field, if any
    pub(crate) fn invalid_field(&self) -> Option<&'static str> {
        let usable_fov = |fov: f32| fov.is_finite() && fov > 0.0;

        if !usable_fov(self.fov_h) {
            Some("horizontal FOV")
        } else if !usable_fov(self.fov_v) {
            Some("vertical FOV")
        } else if self.viewport_width == 0 {
            Some("viewport width")
        } else if self.viewport_height == 0 {
            Some("viewport height")
        } else {
            None
        }
    }
}

/// Parameters handed to the projection engine
///
/// Assembled once from display info, stream tiling and the initial pose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    /// Viewport width in pixels
    pub viewport_width: u32,
    /// Viewport height in pixels
    pub viewport_height: u32,
    /// Initial pitch (degrees)
    pub pitch: f32,
    /// Initial yaw (degrees)
    pub yaw: f32,
    /// Horizontal field of view (degrees)
    pub fov_h: f32,
    /// Vertical field of view (degrees)
    pub fov_v: f32,
    /// Stream geometry
    pub input_geometry: GeometryType,
    /// Display geometry
    pub output_geometry: GeometryType,
    /// Tile rows in the stream
    pub tile_rows: u32,
    /// Tile columns in the stream
    pub tile_cols: u32,
    /// Encoded high-resolution face width
    pub face_width: u32,
    /// Encoded high-resolution face height
    pub face_height: u32,
    /// Engine usage mode
    pub usage: UsageMode,
}

impl ViewportConfig {
    /// Total tile count
    pub fn tile_count(&self) -> u64 {
        u64::from(self.tile_rows) * u64::from(self.tile_cols)
    }
}
