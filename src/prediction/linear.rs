//! Built-in linear pose predictor
//!
//! Extrapolates head orientation from angular velocity and acceleration
//! estimated over the pose history:
//!
//! ```text
//! pose(t) = pose(0) + velocity * t + 0.5 * acceleration * t²
//! ```
//!
//! Both rates are smoothed with an exponential moving average, oldest sample
//! first, so a single noisy sample cannot swing the forecast:
//!
//! ```text
//! velocity_smooth = α * velocity_new + (1 - α) * velocity_old
//! ```
//!
//! Yaw deltas are unwrapped across the ±180° seam before differencing.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::plugin::PosePredictor;
use crate::error::Result;
use crate::pose::{wrap_degrees, HeadPose, PoseSample};

/// Registry name of the built-in predictor
pub const LINEAR_PREDICTOR_NAME: &str = "linear";

/// Configuration for the linear predictor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearPredictorConfig {
    /// Velocity smoothing factor (0.0-1.0, higher = more responsive)
    #[serde(default = "default_velocity_smoothing")]
    pub velocity_smoothing: f32,

    /// Acceleration smoothing factor (0.0-1.0)
    #[serde(default = "default_accel_smoothing")]
    pub acceleration_smoothing: f32,

    /// Maximum predicted rotation away from the newest pose (degrees)
    #[serde(default = "default_max_prediction")]
    pub max_prediction_deg: f32,

    /// Minimum angular speed to apply prediction (degrees/second)
    #[serde(default = "default_min_velocity")]
    pub min_velocity_deg_s: f32,
}

fn default_velocity_smoothing() -> f32 {
    0.4
}
fn default_accel_smoothing() -> f32 {
    0.2
}
fn default_max_prediction() -> f32 {
    30.0
}
fn default_min_velocity() -> f32 {
    5.0
}

impl Default for LinearPredictorConfig {
    fn default() -> Self {
        Self {
            velocity_smoothing: default_velocity_smoothing(),
            acceleration_smoothing: default_accel_smoothing(),
            max_prediction_deg: default_max_prediction(),
            min_velocity_deg_s: default_min_velocity(),
        }
    }
}

/// Angular rates in degrees/second (pitch, yaw)
#[derive(Debug, Clone, Copy, Default)]
struct Motion {
    velocity: (f32, f32),
    acceleration: (f32, f32),
}

/// Stateless predictor over the supplied history
#[derive(Debug, Clone, Default)]
pub struct LinearPredictor {
    config: LinearPredictorConfig,
}

impl LinearPredictor {
    /// Create a predictor
    pub fn new(config: LinearPredictorConfig) -> Self {
        Self { config }
    }

    /// Predictor configuration
    pub fn config(&self) -> &LinearPredictorConfig {
        &self.config
    }

    fn estimate_motion(&self, history: &[PoseSample]) -> Motion {
        let mut motion = Motion::default();
        let mut last_velocity: Option<(f32, f32)> = None;
        let alpha_v = self.config.velocity_smoothing;
        let alpha_a = self.config.acceleration_smoothing;

        // history is newest first; walk oldest to newest
        for pair in history.windows(2).rev() {
            let (newer, older) = (&pair[0], &pair[1]);
            let dt = newer.timestamp_ms.saturating_sub(older.timestamp_ms) as f32 / 1000.0;
            if dt <= 0.0 {
                continue;
            }

            let vp = (newer.pose.pitch - older.pose.pitch) / dt;
            let vy = wrap_degrees(newer.pose.yaw - older.pose.yaw) / dt;

            motion.velocity = match last_velocity {
                None => (vp, vy),
                Some(_) => (
                    alpha_v * vp + (1.0 - alpha_v) * motion.velocity.0,
                    alpha_v * vy + (1.0 - alpha_v) * motion.velocity.1,
                ),
            };

            if let Some((lp, ly)) = last_velocity {
                let ap = (vp - lp) / dt;
                let ay = (vy - ly) / dt;
                motion.acceleration.0 = alpha_a * ap + (1.0 - alpha_a) * motion.acceleration.0;
                motion.acceleration.1 = alpha_a * ay + (1.0 - alpha_a) * motion.acceleration.1;
            }

            last_velocity = Some((vp, vy));
        }

        motion
    }
}

impl PosePredictor for LinearPredictor {
    fn predict(&self, history: &[PoseSample], lookahead_ms: u64) -> Result<HeadPose> {
        let Some(latest) = history.first() else {
            return Ok(HeadPose::default());
        };
        let current = latest.pose;

        let motion = self.estimate_motion(history);
        let speed = (motion.velocity.0.powi(2) + motion.velocity.1.powi(2)).sqrt();
        if speed < self.config.min_velocity_deg_s {
            return Ok(current);
        }

        let t = lookahead_ms as f32 / 1000.0;
        let mut dp = motion.velocity.0 * t + 0.5 * motion.acceleration.0 * t * t;
        let mut dy = motion.velocity.1 * t + 0.5 * motion.acceleration.1 * t * t;

        // Clamp to maximum prediction distance
        let dist = (dp * dp + dy * dy).sqrt();
        if dist > self.config.max_prediction_deg {
            let scale = self.config.max_prediction_deg / dist;
            dp *= scale;
            dy *= scale;
        }

        let predicted = HeadPose::new(current.pitch + dp, current.yaw + dy).normalized();

        trace!(
            "Linear prediction: vel=({:.1}, {:.1}) deg/s, +{}ms -> pitch={:.2}, yaw={:.2}",
            motion.velocity.0,
            motion.velocity.1,
            lookahead_ms,
            predicted.pitch,
            predicted.yaw
        );

        Ok(predicted)
    }

    fn kind(&self) -> &'static str {
        "linear"
    }
}
