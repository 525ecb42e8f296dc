//! Tracks selector error types
//!
//! Every public operation of the crate returns [`Result`]. Callers that need
//! the small integer status codes of the C-style interface convert with
//! [`TracksSelectorError::code`] or [`ErrorCode::from_result`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type for tracks selector operations
pub type Result<T> = std::result::Result<T, TracksSelectorError>;

/// Tracks selector error types
#[derive(Error, Debug)]
pub enum TracksSelectorError {
    /// A required input was absent or zero-valued
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration value rejected (empty plugin name/path, zero capacity)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The projection engine returned no handle
    #[error("Projection engine initialization failed: {0}")]
    ExternalInitFailure(String),

    /// A prediction plugin could not be loaded
    #[error("Failed to load prediction plugin {path:?}: {reason}")]
    PluginLoadFailure {
        /// Full path handed to the loader
        path: PathBuf,
        /// Loader diagnostic
        reason: String,
    },

    /// Allocation or native resource limit hit
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// `initialize_viewport` called on an already active selector
    #[error("Viewport already initialized")]
    AlreadyInitialized,

    /// Operation requires an initialized viewport
    #[error("Viewport not initialized")]
    NotInitialized,

    /// The active plugin failed to produce a pose
    #[error("Pose prediction by '{plugin}' failed: {reason}")]
    PredictionFailed {
        /// Registry name of the plugin
        plugin: String,
        /// Plugin diagnostic
        reason: String,
    },
}

impl TracksSelectorError {
    /// Integer status code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidInput(_) => ErrorCode::InvalidInput,
            Self::InvalidConfig(_) => ErrorCode::InvalidConfig,
            Self::ExternalInitFailure(_) => ErrorCode::ExternalInitFailure,
            Self::PluginLoadFailure { .. } => ErrorCode::PluginLoadFailure,
            Self::ResourceExhausted(_) => ErrorCode::ResourceExhausted,
            Self::AlreadyInitialized | Self::NotInitialized => ErrorCode::InvalidState,
            Self::PredictionFailed { .. } => ErrorCode::PredictionFailed,
        }
    }

    /// Check if retrying the same call might succeed
    ///
    /// Input and configuration errors never change on retry; native
    /// resource failures might.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ExternalInitFailure(_)
                | Self::PluginLoadFailure { .. }
                | Self::ResourceExhausted(_)
                | Self::PredictionFailed { .. }
        )
    }
}

/// Status codes of the caller-facing interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    /// Success
    None = 0,
    /// Absent or zero-valued input
    InvalidInput = -1,
    /// Rejected configuration
    InvalidConfig = -2,
    /// Projection engine returned no handle
    ExternalInitFailure = -3,
    /// Plugin load failed
    PluginLoadFailure = -4,
    /// Resource exhausted
    ResourceExhausted = -5,
    /// Call not valid in the current selector state
    InvalidState = -6,
    /// Plugin prediction failed
    PredictionFailed = -7,
}

impl ErrorCode {
    /// Collapse a result into its status code
    pub fn from_result<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Self::None,
            Err(e) => e.code(),
        }
    }

    /// Raw integer value
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl From<&TracksSelectorError> for ErrorCode {
    fn from(error: &TracksSelectorError) -> Self {
        error.code()
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} ({})", self, self.as_i32())
    }
}
