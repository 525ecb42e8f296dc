//! Head pose tracking
//!
//! Head poses arrive continuously from the head-tracking source. This module
//! keeps the most recent ones in a bounded, newest-first window that can be
//! written and read from any thread.
//!
//! # Architecture
//!
//! ```text
//! Head tracker
//!   └─> PoseStore::record()
//!       ├─> PoseClock (epoch ms, never decreasing)
//!       ├─> PoseHistory (front insert, back evict)
//!       └─> current pose
//!
//! Track selection
//!   └─> PoseStore::snapshot() / current_pose()
//! ```

mod clock;
mod history;

pub use clock::PoseClock;
pub use history::{PoseHistory, PoseStore};

/// Largest history a configuration file may request
pub const MAX_HISTORY_SIZE: usize = 65_536;

use serde::{Deserialize, Serialize};

/// Head orientation in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HeadPose {
    /// Elevation, positive looking up (-90..=90)
    pub pitch: f32,
    /// Azimuth (-180..=180)
    pub yaw: f32,
}

impl HeadPose {
    /// Create a new pose
    pub fn new(pitch: f32, yaw: f32) -> Self {
        Self { pitch, yaw }
    }

    /// A pose with a non-finite angle carries no orientation
    pub fn is_present(&self) -> bool {
        self.pitch.is_finite() && self.yaw.is_finite()
    }

    /// Yaw wrapped into [-180, 180)
    pub fn normalized(&self) -> Self {
        Self {
            pitch: self.pitch.clamp(-90.0, 90.0),
            yaw: wrap_degrees(self.yaw),
        }
    }
}

/// Wrap an angle into [-180, 180)
pub(crate) fn wrap_degrees(angle: f32) -> f32 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

/// A pose captured at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseSample {
    /// Copy of the ingested pose
    pub pose: HeadPose,
    /// Milliseconds since the UNIX epoch
    pub timestamp_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pose_presence() {
        assert!(HeadPose::new(10.0, -45.0).is_present());
        assert!(!HeadPose::new(f32::NAN, 0.0).is_present());
        assert!(!HeadPose::new(0.0, f32::INFINITY).is_present());
    }

    #[test]
    fn test_wrap_degrees() {
        assert_eq!(wrap_degrees(190.0), -170.0);
        assert_eq!(wrap_degrees(-190.0), 170.0);
        assert_eq!(wrap_degrees(45.0), 45.0);
        assert_eq!(wrap_degrees(180.0), -180.0);
    }

    #[test]
    fn test_normalized() {
        let pose = HeadPose::new(120.0, 370.0).normalized();
        assert_eq!(pose.pitch, 90.0);
        assert!((pose.yaw - 10.0).abs() < 1e-4);
    }
}
