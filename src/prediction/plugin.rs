//! Prediction plugin interface

use std::path::Path;

use crate::error::Result;
use crate::pose::{HeadPose, PoseSample};

/// Forecasts a future head pose from recent history
///
/// Implementations are shared with the selection thread, so they must be
/// callable through `&self` from any thread.
pub trait PosePredictor: Send + Sync {
    /// Predict the pose `lookahead_ms` after the newest sample
    ///
    /// `history` is newest first and never empty.
    fn predict(&self, history: &[PoseSample], lookahead_ms: u64) -> Result<HeadPose>;

    /// Implementation name for logging
    fn kind(&self) -> &'static str;
}

/// Turns a filesystem path into a predictor
pub trait PluginLoader: Send + Sync {
    /// Load the module at `path`
    ///
    /// A failed load must not leave anything allocated behind.
    fn load(&self, path: &Path) -> Result<Box<dyn PosePredictor>>;
}

/// A named, owned predictor
pub struct PredictionPlugin {
    name: String,
    predictor: Box<dyn PosePredictor>,
}

impl PredictionPlugin {
    /// Wrap a loaded predictor
    pub fn new(name: impl Into<String>, predictor: Box<dyn PosePredictor>) -> Self {
        Self {
            name: name.into(),
            predictor,
        }
    }

    /// Registry name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Implementation name
    pub fn kind(&self) -> &'static str {
        self.predictor.kind()
    }

    /// Forward to the predictor
    pub fn predict(&self, history: &[PoseSample], lookahead_ms: u64) -> Result<HeadPose> {
        self.predictor.predict(history, lookahead_ms)
    }
}

impl std::fmt::Debug for PredictionPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionPlugin")
            .field("name", &self.name)
            .field("kind", &self.predictor.kind())
            .finish()
    }
}
