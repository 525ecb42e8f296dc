//! Shared-library prediction plugins
//!
//! A plugin is a shared object exporting one C-ABI entry point:
//!
//! ```c
//! int32_t omaf_viewport_predict(const RawPoseSample *samples, size_t count,
//!                               uint64_t lookahead_ms, RawHeadPose *out);
//! ```
//!
//! `samples` is newest first. A return value of `0` means `out` holds the
//! predicted pose; anything else is a plugin error code.
//!
//! The library stays open for as long as the predictor lives and is closed
//! exactly once when it is dropped.

#![allow(unsafe_code)]

use std::ffi::{c_void, CStr, CString};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use tracing::{debug, warn};

use super::plugin::{PluginLoader, PosePredictor};
use crate::error::{Result, TracksSelectorError};
use crate::pose::{HeadPose, PoseSample};

/// Symbol every plugin library must export
pub const PREDICT_SYMBOL: &str = "omaf_viewport_predict";

/// Pose as laid out across the plugin ABI
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RawHeadPose {
    /// Pitch (degrees)
    pub pitch: f32,
    /// Yaw (degrees)
    pub yaw: f32,
}

/// Pose sample as laid out across the plugin ABI
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawPoseSample {
    /// Pitch (degrees)
    pub pitch: f32,
    /// Yaw (degrees)
    pub yaw: f32,
    /// Milliseconds since the UNIX epoch
    pub timestamp_ms: u64,
}

impl From<&PoseSample> for RawPoseSample {
    fn from(sample: &PoseSample) -> Self {
        Self {
            pitch: sample.pose.pitch,
            yaw: sample.pose.yaw,
            timestamp_ms: sample.timestamp_ms,
        }
    }
}

type PredictFn = unsafe extern "C" fn(*const RawPoseSample, usize, u64, *mut RawHeadPose) -> i32;

/// Owned `dlopen` handle
struct LibraryHandle(NonNull<c_void>);

// SAFETY: a dlopen handle is a process-global reference count; dlsym and
// dlclose may be called on it from any thread.
unsafe impl Send for LibraryHandle {}
unsafe impl Sync for LibraryHandle {}

impl LibraryHandle {
    fn open(path: &Path) -> std::result::Result<Self, String> {
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| "path contains an interior NUL byte".to_string())?;

        // SAFETY: c_path is a valid NUL-terminated string for the call.
        let raw = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };

        NonNull::new(raw).map(Self).ok_or_else(last_dl_error)
    }

    fn symbol(&self, name: &str) -> std::result::Result<NonNull<c_void>, String> {
        let c_name = CString::new(name).map_err(|_| format!("invalid symbol name {}", name))?;

        // SAFETY: the handle is open until self is dropped; dlerror is called
        // first to clear stale state so a null result can be diagnosed.
        let raw = unsafe {
            libc::dlerror();
            libc::dlsym(self.0.as_ptr(), c_name.as_ptr())
        };

        NonNull::new(raw).ok_or_else(|| format!("symbol {} not found: {}", name, last_dl_error()))
    }
}

impl Drop for LibraryHandle {
    fn drop(&mut self) {
        // SAFETY: the handle came from dlopen and is closed only here.
        if unsafe { libc::dlclose(self.0.as_ptr()) } != 0 {
            warn!("dlclose failed: {}", last_dl_error());
        }
    }
}

fn last_dl_error() -> String {
    // SAFETY: dlerror returns null or a thread-local NUL-terminated string.
    unsafe {
        let err = libc::dlerror();
        if err.is_null() {
            "unknown dynamic loader error".to_string()
        } else {
            CStr::from_ptr(err).to_string_lossy().into_owned()
        }
    }
}

/// Predictor backed by a loaded shared library
pub struct DylibPredictor {
    predict_fn: PredictFn,
    path: PathBuf,
    // Closed after predict_fn can no longer be reached
    _library: LibraryHandle,
}

impl DylibPredictor {
    /// Open `path` and resolve the entry point
    pub fn open(path: &Path) -> Result<Self> {
        let load_error = |reason: String| TracksSelectorError::PluginLoadFailure {
            path: path.to_path_buf(),
            reason,
        };

        let library = LibraryHandle::open(path).map_err(load_error)?;
        // On a missing symbol `library` is dropped here, closing it
        let symbol = library.symbol(PREDICT_SYMBOL).map_err(load_error)?;

        // SAFETY: plugins export PREDICT_SYMBOL with the PredictFn signature.
        let predict_fn = unsafe { std::mem::transmute::<*mut c_void, PredictFn>(symbol.as_ptr()) };

        Ok(Self {
            predict_fn,
            path: path.to_path_buf(),
            _library: library,
        })
    }

    /// Library path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PosePredictor for DylibPredictor {
    fn predict(&self, history: &[PoseSample], lookahead_ms: u64) -> Result<HeadPose> {
        let samples: Vec<RawPoseSample> = history.iter().map(RawPoseSample::from).collect();
        let mut out = RawHeadPose::default();

        // SAFETY: samples and out outlive the call; the library is still open.
        let status =
            unsafe { (self.predict_fn)(samples.as_ptr(), samples.len(), lookahead_ms, &mut out) };

        if status != 0 {
            return Err(TracksSelectorError::PredictionFailed {
                plugin: self.path.display().to_string(),
                reason: format!("plugin returned {}", status),
            });
        }

        let pose = HeadPose::new(out.pitch, out.yaw);
        if !pose.is_present() {
            return Err(TracksSelectorError::PredictionFailed {
                plugin: self.path.display().to_string(),
                reason: "plugin returned a non-finite pose".to_string(),
            });
        }

        Ok(pose)
    }

    fn kind(&self) -> &'static str {
        "dylib"
    }
}

/// Loads plugins with the platform dynamic loader
#[derive(Debug, Clone, Copy, Default)]
pub struct DylibLoader;

impl PluginLoader for DylibLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn PosePredictor>> {
        debug!("Opening prediction plugin {:?}", path);
        let predictor = DylibPredictor::open(path)?;
        Ok(Box::new(predictor))
    }
}
