//! Prediction plugin registry

use std::collections::HashMap;
use std::path::Path;
use tracing::{error, info, warn};

use super::plugin::{PluginLoader, PosePredictor, PredictionPlugin};
use crate::error::{Result, TracksSelectorError};

/// Owns loaded prediction plugins, keyed by name
///
/// Only one plugin is active at a time: the last one inserted. Inserting a
/// name that is already present replaces and drops the old plugin.
pub struct PluginRegistry {
    loader: Box<dyn PluginLoader>,
    plugins: HashMap<String, PredictionPlugin>,
    active: Option<String>,
}

impl PluginRegistry {
    /// Create an empty registry using `loader` for path-based plugins
    pub fn new(loader: Box<dyn PluginLoader>) -> Self {
        Self {
            loader,
            plugins: HashMap::new(),
            active: None,
        }
    }

    /// Load `library_dir/name` and make it the active plugin
    pub fn load_plugin(&mut self, name: &str, library_dir: &Path) -> Result<()> {
        if name.is_empty() || library_dir.as_os_str().is_empty() {
            error!("Viewport predict plugin path or name is empty");
            return Err(TracksSelectorError::InvalidConfig(format!(
                "plugin name {:?} and library path {:?} must both be set",
                name, library_dir
            )));
        }

        let path = library_dir.join(name);
        let predictor = self.loader.load(&path).inspect_err(|e| {
            error!("Load plugin failed: {}", e);
        })?;

        info!(
            "Loaded prediction plugin '{}' ({}) from {:?}",
            name,
            predictor.kind(),
            path
        );
        self.insert(name, predictor);
        Ok(())
    }

    /// Register an in-process predictor and make it active
    pub fn insert(&mut self, name: &str, predictor: Box<dyn PosePredictor>) {
        let plugin = PredictionPlugin::new(name, predictor);
        if let Some(previous) = self.plugins.insert(name.to_string(), plugin) {
            warn!(
                "Replacing prediction plugin '{}' ({})",
                previous.name(),
                previous.kind()
            );
        }
        self.active = Some(name.to_string());
    }

    /// Currently active plugin
    pub fn active(&self) -> Option<&PredictionPlugin> {
        self.active.as_ref().and_then(|name| self.plugins.get(name))
    }

    /// Name of the active plugin
    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Look up a plugin by name
    pub fn get(&self, name: &str) -> Option<&PredictionPlugin> {
        self.plugins.get(name)
    }

    /// Check if a plugin is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// Number of registered plugins
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Check if no plugin is registered
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Drop every plugin
    pub fn clear(&mut self) {
        self.active = None;
        self.plugins.clear();
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.plugins.keys().collect::<Vec<_>>())
            .field("active", &self.active)
            .finish()
    }
}
