//! Projection context creation

use tracing::{debug, info};

use super::{
    DisplayInfo, ProjectionEngine, ProjectionHandle, StreamGeometry, UsageMode, ViewportConfig,
};
use crate::error::{Result, TracksSelectorError};
use crate::pose::HeadPose;

/// Projection handle plus the parameters it was created with
pub struct ProjectionContext {
    config: ViewportConfig,
    handle: Box<dyn ProjectionHandle>,
}

impl ProjectionContext {
    /// Validate inputs, assemble the viewport config and create a handle
    ///
    /// Nothing is acquired unless every check passes.
    pub fn initialize(
        display: &DisplayInfo,
        stream: &dyn StreamGeometry,
        pose: HeadPose,
        engine: &dyn ProjectionEngine,
    ) -> Result<Self> {
        if let Some(field) = display.invalid_field() {
            return Err(TracksSelectorError::InvalidInput(format!(
                "display {} must be non-zero",
                field
            )));
        }

        if !pose.is_present() {
            return Err(TracksSelectorError::InvalidInput(
                "initial head pose is required".to_string(),
            ));
        }

        let config = ViewportConfig {
            viewport_width: display.viewport_width,
            viewport_height: display.viewport_height,
            pitch: pose.pitch,
            yaw: pose.yaw,
            fov_h: display.fov_h,
            fov_v: display.fov_v,
            input_geometry: display.input_geometry,
            output_geometry: display.output_geometry,
            tile_rows: stream.tile_rows(),
            tile_cols: stream.tile_cols(),
            face_width: stream.high_res_width(),
            face_height: stream.high_res_height(),
            usage: UsageMode::ViewportOnly,
        };

        debug!("Creating projection context: {:?}", config);

        let handle = engine.create(&config).ok_or_else(|| {
            TracksSelectorError::ExternalInitFailure(format!(
                "no handle for {}x{} {} -> {} viewport",
                config.viewport_width,
                config.viewport_height,
                config.input_geometry,
                config.output_geometry
            ))
        })?;

        info!(
            "Projection context ready: engine={}, {}x{} tiles, face {}x{}, fov {:.0}x{:.0}",
            handle.engine_name(),
            config.tile_cols,
            config.tile_rows,
            config.face_width,
            config.face_height,
            config.fov_h,
            config.fov_v
        );

        Ok(Self { config, handle })
    }

    /// Parameters the handle was created with
    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    /// Engine handle
    pub fn handle(&self) -> &dyn ProjectionHandle {
        self.handle.as_ref()
    }
}

impl std::fmt::Debug for ProjectionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectionContext")
            .field("engine", &self.handle.engine_name())
            .field("config", &self.config)
            .finish()
    }
}

impl Drop for ProjectionContext {
    fn drop(&mut self) {
        debug!(
            "Releasing projection handle ({})",
            self.handle.engine_name()
        );
    }
}
