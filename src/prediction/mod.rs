//! Viewport pose prediction
//!
//! Tile requests take a network round trip plus decode time to reach the
//! display. Predicting where the head will point after that delay lets track
//! selection fetch the tiles the viewer is about to look at.
//!
//! Predictors are plugins:
//!
//! | Plugin | Source | Loaded by |
//! |--------|--------|-----------|
//! | [`DylibPredictor`] | shared library exporting `omaf_viewport_predict` | [`DylibLoader`] |
//! | [`LinearPredictor`] | built in | registered directly |
//!
//! ```text
//! enable_pose_prediction(name, dir)
//!   └─> PluginRegistry::load_plugin()
//!       └─> PluginLoader::load(dir/name)
//!           └─> Box<dyn PosePredictor>  (owned by registry, dropped once)
//!
//! viewport_pose()
//!   └─> active plugin .predict(history snapshot, lookahead)
//! ```

mod dylib;
mod linear;
mod plugin;
mod registry;

pub use dylib::{DylibLoader, DylibPredictor, RawHeadPose, RawPoseSample, PREDICT_SYMBOL};
pub use linear::{LinearPredictor, LinearPredictorConfig, LINEAR_PREDICTOR_NAME};
pub use plugin::{PluginLoader, PosePredictor, PredictionPlugin};
pub use registry::PluginRegistry;

/// Default lookahead for pose prediction (ms)
pub const DEFAULT_LOOKAHEAD_MS: u64 = 50;

/// Upper bound on the configurable lookahead (ms)
pub const MAX_LOOKAHEAD_MS: u64 = 1000;
