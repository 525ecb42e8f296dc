//! # omaf-viewport
//!
//! Viewport tracking core for adaptive omnidirectional (360°) video streaming.
//!
//! This crate sits between the head tracker and the tile/track selection
//! logic of an OMAF player:
//! - [`pose`] - Bounded, thread-safe head pose history
//! - [`projection`] - Projection context built from display and stream geometry
//! - [`prediction`] - Pose prediction plugins (shared libraries or built in)
//! - [`selector`] - The [`TracksSelector`] coordinator tying them together
//!
//! # Architecture
//!
//! ```text
//! TracksSelector
//!   ├─> ProjectionContext (engine handle + ViewportConfig)
//!   ├─> PoseStore (history + current pose, one lock)
//!   └─> PluginRegistry (name -> prediction plugin)
//! ```
//!
//! # Data Flow
//!
//! **Setup:** DisplayInfo + StreamGeometry + initial pose → ProjectionEngine → ProjectionContext
//!
//! **Tracking:** Head tracker → `update_pose()` → PoseStore
//!
//! **Selection:** `viewport_pose()` → active plugin (history snapshot) → tile selection

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Configuration loading and validation
pub mod config;

/// Error types and status codes
pub mod error;

/// Tracing subscriber setup
pub mod logging;

/// Head pose history
pub mod pose;

/// Pose prediction plugins
pub mod prediction;

/// Projection context and engine interfaces
pub mod projection;

/// Tracks selector coordinator
pub mod selector;

pub use config::Config;
pub use error::{ErrorCode, Result, TracksSelectorError};
pub use pose::{HeadPose, PoseSample};
pub use projection::{DisplayInfo, GeometryType, ProjectionEngine, StreamGeometry, ViewportConfig};
pub use selector::{SelectorState, TracksSelector};
