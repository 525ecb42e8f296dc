//! Projection context
//!
//! The projection engine owns the sphere-to-tile geometry. This module only
//! prepares its parameters and owns the handle it returns:
//!
//! ```text
//! DisplayInfo ──┐
//! StreamGeometry ┼─> ViewportConfig ─> ProjectionEngine::create()
//! initial pose ──┘                          │
//!                                           ▼
//!                                 ProjectionContext (owns handle,
//!                                 released on drop)
//! ```
//!
//! Engines are plugged in through [`ProjectionEngine`]; the handle they hand
//! back is released by dropping it, so a context can never release twice.

mod context;
mod types;

pub use context::ProjectionContext;
pub use types::{DisplayInfo, GeometryType, UsageMode, ViewportConfig};

/// Tiling of the active media stream
///
/// Read-only queries made once, while the context is built.
#[cfg_attr(test, mockall::automock)]
pub trait StreamGeometry {
    /// Number of tile rows
    fn tile_rows(&self) -> u32;

    /// Number of tile columns
    fn tile_cols(&self) -> u32;

    /// Width of the encoded high-resolution face
    fn high_res_width(&self) -> u32;

    /// Height of the encoded high-resolution face
    fn high_res_height(&self) -> u32;
}

/// Native projection engine
#[cfg_attr(test, mockall::automock)]
pub trait ProjectionEngine {
    /// Create a projection handle for `config`
    ///
    /// Returns `None` when the engine cannot initialize.
    fn create(&self, config: &ViewportConfig) -> Option<Box<dyn ProjectionHandle>>;
}

/// Engine-owned projection state
///
/// Dropping the handle is the engine's teardown call.
pub trait ProjectionHandle: Send + Sync {
    /// Engine name for logging
    fn engine_name(&self) -> &str;
}
