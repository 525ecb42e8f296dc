//! Tracks selector
//!
//! [`TracksSelector`] is the coordinator track selection logic is built on.
//! It owns the projection context, the pose history and the prediction
//! plugins, and hands selection code the pose to pick tiles for.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized ──initialize_viewport()──> Active ──enable_*_prediction()──> ActivePredicting
//!       │                                    │ ▲                                │ ▲
//!       │                        update_pose()└─┘                   update_pose()└─┘
//!       └──────────────────── drop: projection, history, plugins ───────────────┘
//! ```
//!
//! # Threading
//!
//! Setup calls take `&mut self` and therefore run before the selector is
//! shared. Afterwards it is shared as `Arc<TracksSelector>`: the head-tracking
//! thread calls [`TracksSelector::update_pose`] while the selection thread
//! reads [`TracksSelector::viewport_pose`]. Both go through one lock around
//! the pose history and current pose.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, TracksSelectorError};
use crate::pose::{HeadPose, PoseSample, PoseStore};
use crate::prediction::{
    DylibLoader, LinearPredictor, LinearPredictorConfig, PluginLoader, PluginRegistry,
    DEFAULT_LOOKAHEAD_MS, LINEAR_PREDICTOR_NAME,
};
use crate::projection::{
    DisplayInfo, ProjectionContext, ProjectionEngine, StreamGeometry, ViewportConfig,
};

/// Coordinator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorState {
    /// No projection context yet
    Uninitialized,
    /// Projection context created, history seeded
    Active,
    /// Active with a prediction plugin loaded
    ActivePredicting,
}

impl std::fmt::Display for SelectorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::Active => write!(f, "Active"),
            Self::ActivePredicting => write!(f, "Active+Predicting"),
        }
    }
}

/// Viewport tracking coordinator
pub struct TracksSelector {
    // Field order is release order
    projection: Option<ProjectionContext>,
    poses: PoseStore,
    plugins: PluginRegistry,

    prediction_enabled: bool,
    plugin_name: String,
    library_dir: PathBuf,
    lookahead_ms: u64,
}

impl TracksSelector {
    /// Create a selector keeping `history_size` poses, loading plugins with
    /// the platform dynamic loader
    pub fn new(history_size: usize) -> Result<Self> {
        Self::with_loader(history_size, Box::new(DylibLoader))
    }

    /// Create a selector with a custom plugin loader
    pub fn with_loader(history_size: usize, loader: Box<dyn PluginLoader>) -> Result<Self> {
        let poses = PoseStore::new(history_size)?;

        debug!("Tracks selector created: history_size={}", history_size);

        Ok(Self {
            projection: None,
            poses,
            plugins: PluginRegistry::new(loader),
            prediction_enabled: false,
            plugin_name: String::new(),
            library_dir: PathBuf::new(),
            lookahead_ms: DEFAULT_LOOKAHEAD_MS,
        })
    }

    /// Create a selector from configuration, enabling prediction if asked
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut selector = Self::new(config.selector.history_size)?;
        selector.apply_prediction_config(config)?;
        Ok(selector)
    }

    /// Create a selector from configuration with a custom plugin loader
    pub fn from_config_with_loader(config: &Config, loader: Box<dyn PluginLoader>) -> Result<Self> {
        let mut selector = Self::with_loader(config.selector.history_size, loader)?;
        selector.apply_prediction_config(config)?;
        Ok(selector)
    }

    fn apply_prediction_config(&mut self, config: &Config) -> Result<()> {
        let prediction = &config.prediction;
        self.lookahead_ms = prediction.lookahead_ms;

        if !prediction.enabled {
            return Ok(());
        }

        if prediction.builtin {
            self.enable_builtin_prediction(prediction.linear.clone());
            Ok(())
        } else {
            self.enable_pose_prediction(&prediction.plugin_name, &prediction.library_dir)
        }
    }

    /// Create the projection context and seed the history
    ///
    /// Valid once per selector. On failure nothing is acquired and the
    /// selector stays uninitialized.
    pub fn initialize_viewport(
        &mut self,
        display: &DisplayInfo,
        pose: HeadPose,
        stream: &dyn StreamGeometry,
        engine: &dyn ProjectionEngine,
    ) -> Result<()> {
        if self.projection.is_some() {
            warn!("Viewport already initialized, keeping existing projection context");
            return Err(TracksSelectorError::AlreadyInitialized);
        }

        let context = ProjectionContext::initialize(display, stream, pose, engine)?;
        self.projection = Some(context);
        self.poses.record(pose)?;

        let (width, height) = (display.viewport_width, display.viewport_height);
        info!(
            "Viewport initialized: pitch={:.1}, yaw={:.1}, {}x{}",
            pose.pitch, pose.yaw, width, height
        );
        Ok(())
    }

    /// Record a new head pose
    ///
    /// Safe to call from any thread concurrently with readers.
    pub fn update_pose(&self, pose: HeadPose) -> Result<()> {
        self.poses.record(pose).map(|_| ())
    }

    /// Enable prediction with the plugin `library_dir/plugin_name`
    ///
    /// The enabled flag and plugin location are stored before loading; on a
    /// failed load no plugin is retained and prediction stays inactive.
    pub fn enable_pose_prediction(
        &mut self,
        plugin_name: &str,
        library_dir: impl AsRef<Path>,
    ) -> Result<()> {
        let library_dir = library_dir.as_ref();

        self.prediction_enabled = true;
        self.plugin_name = plugin_name.to_string();
        self.library_dir = library_dir.to_path_buf();

        self.plugins.load_plugin(plugin_name, library_dir)
    }

    /// Enable prediction with the built-in linear predictor
    pub fn enable_builtin_prediction(&mut self, config: LinearPredictorConfig) {
        self.prediction_enabled = true;
        self.plugin_name = LINEAR_PREDICTOR_NAME.to_string();
        self.library_dir = PathBuf::new();

        self.plugins
            .insert(LINEAR_PREDICTOR_NAME, Box::new(LinearPredictor::new(config)));
        info!("Built-in linear pose prediction enabled");
    }

    /// Forecast the pose `lookahead_ms` ahead with the active plugin
    ///
    /// Returns `Ok(None)` when prediction is not active.
    pub fn predicted_pose(&self, lookahead_ms: u64) -> Result<Option<HeadPose>> {
        let plugin = match self.plugins.active() {
            Some(plugin) if self.prediction_enabled => plugin,
            _ => return Ok(None),
        };

        // Predict on a copy so the tracker thread is never blocked by a plugin
        let history = self.poses.snapshot();
        if history.is_empty() {
            return Err(TracksSelectorError::NotInitialized);
        }

        plugin.predict(&history, lookahead_ms).map(Some)
    }

    /// Pose tile selection should use
    ///
    /// The predicted pose at the configured lookahead when prediction is
    /// active, the current pose otherwise or when the plugin fails.
    pub fn viewport_pose(&self) -> Option<HeadPose> {
        match self.predicted_pose(self.lookahead_ms) {
            Ok(Some(pose)) => Some(pose),
            Ok(None) => self.current_pose(),
            Err(e) => {
                warn!("Pose prediction unavailable, using current pose: {}", e);
                self.current_pose()
            }
        }
    }

    /// Current coordinator state
    pub fn state(&self) -> SelectorState {
        match (&self.projection, self.is_predicting()) {
            (None, _) => SelectorState::Uninitialized,
            (Some(_), false) => SelectorState::Active,
            (Some(_), true) => SelectorState::ActivePredicting,
        }
    }

    /// Check if the projection context exists
    pub fn is_initialized(&self) -> bool {
        self.projection.is_some()
    }

    /// Check if prediction was requested
    pub fn prediction_enabled(&self) -> bool {
        self.prediction_enabled
    }

    /// Check if prediction was requested and a plugin is loaded
    pub fn is_predicting(&self) -> bool {
        self.prediction_enabled && self.plugins.active().is_some()
    }

    /// Requested plugin name
    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    /// Requested plugin directory
    pub fn library_dir(&self) -> &Path {
        &self.library_dir
    }

    /// Prediction lookahead (ms)
    pub fn lookahead_ms(&self) -> u64 {
        self.lookahead_ms
    }

    /// Set the prediction lookahead, e.g. from measured fetch latency
    pub fn set_lookahead_ms(&mut self, lookahead_ms: u64) {
        self.lookahead_ms = lookahead_ms;
    }

    /// Last ingested pose
    pub fn current_pose(&self) -> Option<HeadPose> {
        self.poses.current_pose()
    }

    /// Most recent sample
    pub fn latest_sample(&self) -> Option<PoseSample> {
        self.poses.latest()
    }

    /// Copy of the pose history, newest first
    pub fn pose_history(&self) -> Vec<PoseSample> {
        self.poses.snapshot()
    }

    /// Number of retained pose samples
    pub fn history_len(&self) -> usize {
        self.poses.len()
    }

    /// Maximum number of retained pose samples
    pub fn history_capacity(&self) -> usize {
        self.poses.capacity()
    }

    /// Projection context, once initialized
    pub fn projection(&self) -> Option<&ProjectionContext> {
        self.projection.as_ref()
    }

    /// Viewport parameters, once initialized
    pub fn viewport_config(&self) -> Option<&ViewportConfig> {
        self.projection.as_ref().map(ProjectionContext::config)
    }

    /// Loaded prediction plugins
    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }
}

impl std::fmt::Debug for TracksSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TracksSelector")
            .field("state", &self.state())
            .field("projection", &self.projection)
            .field("history_len", &self.poses.len())
            .field("plugins", &self.plugins)
            .field("lookahead_ms", &self.lookahead_ms)
            .finish()
    }
}

impl Drop for TracksSelector {
    fn drop(&mut self) {
        debug!("Tracks selector shutting down ({})", self.state());

        self.projection = None;
        self.poses.clear();
        self.plugins.clear();
        self.prediction_enabled = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::PoseSample;
    use crate::prediction::PosePredictor;
    use crate::projection::{MockProjectionEngine, MockStreamGeometry, ProjectionHandle};

    struct StubHandle;

    impl ProjectionHandle for StubHandle {
        fn engine_name(&self) -> &str {
            "stub"
        }
    }

    fn stream() -> MockStreamGeometry {
        let mut stream = MockStreamGeometry::new();
        stream.expect_tile_rows().return_const(2u32);
        stream.expect_tile_cols().return_const(4u32);
        stream.expect_high_res_width().return_const(1920u32);
        stream.expect_high_res_height().return_const(960u32);
        stream
    }

    fn engine() -> MockProjectionEngine {
        let mut engine = MockProjectionEngine::new();
        engine
            .expect_create()
            .returning(|_| Some(Box::new(StubHandle) as Box<dyn ProjectionHandle>));
        engine
    }

    fn display() -> DisplayInfo {
        DisplayInfo::new(1920, 1080, 90.0, 90.0)
    }

    struct FixedLoader(HeadPose);

    struct FixedPredictor(HeadPose);

    impl PosePredictor for FixedPredictor {
        fn predict(&self, _history: &[PoseSample], _lookahead_ms: u64) -> Result<HeadPose> {
            Ok(self.0)
        }

        fn kind(&self) -> &'static str {
            "fixed"
        }
    }

    impl PluginLoader for FixedLoader {
        fn load(&self, _path: &Path) -> Result<Box<dyn PosePredictor>> {
            Ok(Box::new(FixedPredictor(self.0)))
        }
    }

    struct FailingPredictor;

    impl PosePredictor for FailingPredictor {
        fn predict(&self, _history: &[PoseSample], _lookahead_ms: u64) -> Result<HeadPose> {
            Err(TracksSelectorError::PredictionFailed {
                plugin: "failing".to_string(),
                reason: "injected".to_string(),
            })
        }

        fn kind(&self) -> &'static str {
            "failing"
        }
    }

    struct FailingLoader;

    impl PluginLoader for FailingLoader {
        fn load(&self, _path: &Path) -> Result<Box<dyn PosePredictor>> {
            Ok(Box::new(FailingPredictor))
        }
    }

    #[test]
    fn test_new_selector_is_uninitialized() {
        let selector = TracksSelector::new(8).unwrap();
        assert_eq!(selector.state(), SelectorState::Uninitialized);
        assert!(!selector.prediction_enabled());
        assert_eq!(selector.history_len(), 0);
        assert_eq!(selector.history_capacity(), 8);
        assert!(selector.current_pose().is_none());
        assert!(selector.viewport_config().is_none());
    }

    #[test]
    fn test_zero_history_rejected() {
        assert!(matches!(
            TracksSelector::new(0),
            Err(TracksSelectorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_oversized_history_rejected() {
        let result = TracksSelector::new(usize::MAX);
        assert_eq!(result.unwrap_err().code(), crate::ErrorCode::ResourceExhausted);
    }

    #[test]
    fn test_initialize_viewport() {
        let mut selector = TracksSelector::new(8).unwrap();
        let pose = HeadPose::new(15.0, -30.0);

        selector
            .initialize_viewport(&display(), pose, &stream(), &engine())
            .unwrap();

        assert_eq!(selector.state(), SelectorState::Active);
        assert_eq!(selector.current_pose(), Some(pose));
        let history = selector.pose_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].pose, pose);

        let config = selector.viewport_config().unwrap();
        assert_eq!(config.tile_count(), 8);
        assert_eq!(config.yaw, -30.0);
    }

    #[test]
    fn test_initialize_twice_rejected() {
        let mut selector = TracksSelector::new(8).unwrap();
        selector
            .initialize_viewport(&display(), HeadPose::default(), &stream(), &engine())
            .unwrap();

        let mut second = MockProjectionEngine::new();
        second.expect_create().times(0);
        let result =
            selector.initialize_viewport(&display(), HeadPose::default(), &stream(), &second);

        assert!(matches!(result, Err(TracksSelectorError::AlreadyInitialized)));
        assert_eq!(selector.history_len(), 1);
    }

    #[test]
    fn test_initialize_with_absent_pose() {
        let mut selector = TracksSelector::new(8).unwrap();
        let mut engine = MockProjectionEngine::new();
        engine.expect_create().times(0);

        let result = selector.initialize_viewport(
            &display(),
            HeadPose::new(f32::NAN, f32::NAN),
            &stream(),
            &engine,
        );
        assert!(matches!(result, Err(TracksSelectorError::InvalidInput(_))));
        assert_eq!(selector.state(), SelectorState::Uninitialized);
        assert_eq!(selector.history_len(), 0);
    }

    #[test]
    fn test_update_pose() {
        let selector = TracksSelector::new(2).unwrap();
        for yaw in [1.0, 2.0, 3.0] {
            selector.update_pose(HeadPose::new(0.0, yaw)).unwrap();
        }

        let yaws: Vec<f32> = selector.pose_history().iter().map(|s| s.pose.yaw).collect();
        assert_eq!(yaws, vec![3.0, 2.0]);
        assert_eq!(selector.latest_sample().unwrap().pose.yaw, 3.0);
    }

    #[test]
    fn test_enable_pose_prediction() {
        let predicted = HeadPose::new(1.0, 99.0);
        let mut selector =
            TracksSelector::with_loader(8, Box::new(FixedLoader(predicted))).unwrap();
        selector
            .initialize_viewport(&display(), HeadPose::default(), &stream(), &engine())
            .unwrap();

        selector
            .enable_pose_prediction("libpredict.so", "/opt/omaf/plugins")
            .unwrap();

        assert_eq!(selector.state(), SelectorState::ActivePredicting);
        assert_eq!(selector.plugin_name(), "libpredict.so");
        assert_eq!(selector.library_dir(), Path::new("/opt/omaf/plugins"));
        assert_eq!(selector.plugins().active_name(), Some("libpredict.so"));
        assert_eq!(selector.predicted_pose(50).unwrap(), Some(predicted));
        assert_eq!(selector.viewport_pose(), Some(predicted));
    }

    #[test]
    fn test_enable_with_empty_name() {
        let mut selector =
            TracksSelector::with_loader(8, Box::new(FixedLoader(HeadPose::default()))).unwrap();

        let result = selector.enable_pose_prediction("", "/opt/omaf/plugins");
        assert_eq!(result.unwrap_err().code(), crate::ErrorCode::InvalidConfig);
        assert!(selector.plugins().is_empty());
        assert!(!selector.is_predicting());
    }

    #[test]
    fn test_viewport_pose_without_prediction() {
        let selector = TracksSelector::new(8).unwrap();
        assert!(selector.viewport_pose().is_none());

        selector.update_pose(HeadPose::new(3.0, 4.0)).unwrap();
        assert_eq!(selector.predicted_pose(50).unwrap(), None);
        assert_eq!(selector.viewport_pose(), Some(HeadPose::new(3.0, 4.0)));
    }

    #[test]
    fn test_viewport_pose_falls_back_on_plugin_error() {
        let mut selector = TracksSelector::with_loader(8, Box::new(FailingLoader)).unwrap();
        selector.enable_pose_prediction("bad.so", "/p").unwrap();
        selector.update_pose(HeadPose::new(7.0, 8.0)).unwrap();

        assert!(selector.predicted_pose(50).is_err());
        assert_eq!(selector.viewport_pose(), Some(HeadPose::new(7.0, 8.0)));
    }

    #[test]
    fn test_prediction_without_history() {
        let mut selector = TracksSelector::new(8).unwrap();
        selector.enable_builtin_prediction(LinearPredictorConfig::default());

        assert!(matches!(
            selector.predicted_pose(50),
            Err(TracksSelectorError::NotInitialized)
        ));
    }

    #[test]
    fn test_builtin_prediction() {
        let mut selector = TracksSelector::new(8).unwrap();
        selector.enable_builtin_prediction(LinearPredictorConfig::default());
        selector
            .initialize_viewport(&display(), HeadPose::new(0.0, 10.0), &stream(), &engine())
            .unwrap();

        assert_eq!(selector.state(), SelectorState::ActivePredicting);
        assert_eq!(selector.plugin_name(), LINEAR_PREDICTOR_NAME);
        // Single sample: nothing to extrapolate from
        assert_eq!(selector.viewport_pose(), Some(HeadPose::new(0.0, 10.0)));
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.selector.history_size = 4;
        config.prediction.enabled = true;
        config.prediction.builtin = true;
        config.prediction.lookahead_ms = 80;

        let selector = TracksSelector::from_config(&config).unwrap();
        assert_eq!(selector.history_capacity(), 4);
        assert_eq!(selector.lookahead_ms(), 80);
        assert!(selector.is_predicting());
    }

    #[test]
    fn test_from_config_with_loader() {
        let mut config = Config::default();
        config.prediction.enabled = true;
        config.prediction.plugin_name = "libpredict.so".to_string();
        config.prediction.library_dir = PathBuf::from("/opt/omaf");

        let selector = TracksSelector::from_config_with_loader(
            &config,
            Box::new(FixedLoader(HeadPose::default())),
        )
        .unwrap();
        assert!(selector.plugins().contains("libpredict.so"));
    }
}
