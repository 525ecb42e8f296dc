//! Bounded pose history
//!
//! [`PoseHistory`] is the plain newest-first window. [`PoseStore`] wraps it
//! together with the current pose behind a single lock; it is the only way
//! the selector touches either.

use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::trace;

use super::{HeadPose, PoseClock, PoseSample};
use crate::error::{Result, TracksSelectorError};

/// Newest-first window of at most `capacity` samples
#[derive(Debug, Clone)]
pub struct PoseHistory {
    samples: VecDeque<PoseSample>,
    capacity: usize,
}

impl PoseHistory {
    /// Create an empty history
    ///
    /// A zero capacity would discard every sample on insert and is rejected.
    /// The window is allocated up front; a capacity the allocator cannot
    /// satisfy fails with `ResourceExhausted`.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(TracksSelectorError::InvalidConfig(
                "pose history size must be greater than zero".to_string(),
            ));
        }

        let mut samples = VecDeque::new();
        // One extra slot for the sample pushed before the oldest is evicted
        samples
            .try_reserve_exact(capacity.saturating_add(1))
            .map_err(|e| {
                TracksSelectorError::ResourceExhausted(format!(
                    "pose history of {} samples: {}",
                    capacity, e
                ))
            })?;

        Ok(Self { samples, capacity })
    }

    /// Insert at the front, returning the evicted oldest sample if any
    pub fn push(&mut self, sample: PoseSample) -> Option<PoseSample> {
        self.samples.push_front(sample);
        if self.samples.len() > self.capacity {
            self.samples.pop_back()
        } else {
            None
        }
    }

    /// Most recent sample
    pub fn latest(&self) -> Option<&PoseSample> {
        self.samples.front()
    }

    /// Oldest retained sample
    pub fn oldest(&self) -> Option<&PoseSample> {
        self.samples.back()
    }

    /// Iterate newest first
    pub fn iter(&self) -> impl Iterator<Item = &PoseSample> + '_ {
        self.samples.iter()
    }

    /// Number of retained samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if no sample is retained
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of retained samples
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy out all samples, newest first
    pub fn to_vec(&self) -> Vec<PoseSample> {
        self.samples.iter().copied().collect()
    }

    /// Drop every sample
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[derive(Debug)]
struct PoseState {
    history: PoseHistory,
    current: Option<HeadPose>,
}

/// Thread-safe pose history plus the last known pose
#[derive(Debug)]
pub struct PoseStore {
    state: Mutex<PoseState>,
    clock: PoseClock,
}

impl PoseStore {
    /// Create a store retaining up to `capacity` samples
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            state: Mutex::new(PoseState {
                history: PoseHistory::new(capacity)?,
                current: None,
            }),
            clock: PoseClock::new(),
        })
    }

    /// Timestamp and insert a pose
    ///
    /// Absent poses are rejected before the lock is taken, leaving the
    /// history untouched. Returns the stored sample.
    pub fn record(&self, pose: HeadPose) -> Result<PoseSample> {
        if !pose.is_present() {
            return Err(TracksSelectorError::InvalidInput(format!(
                "head pose has no orientation (pitch={}, yaw={})",
                pose.pitch, pose.yaw
            )));
        }

        let mut state = self.state.lock();

        // Stamped under the lock so history timestamps follow insertion order
        let sample = PoseSample {
            pose,
            timestamp_ms: self.clock.now_ms(),
        };

        let evicted = state.history.push(sample);
        state.current = Some(pose);

        trace!(
            "Pose recorded: pitch={:.2}, yaw={:.2}, t={}, len={}, evicted={}",
            pose.pitch,
            pose.yaw,
            sample.timestamp_ms,
            state.history.len(),
            evicted.is_some()
        );

        Ok(sample)
    }

    /// Last ingested pose
    pub fn current_pose(&self) -> Option<HeadPose> {
        self.state.lock().current
    }

    /// Most recent sample
    pub fn latest(&self) -> Option<PoseSample> {
        self.state.lock().history.latest().copied()
    }

    /// Copy of the history, newest first
    pub fn snapshot(&self) -> Vec<PoseSample> {
        self.state.lock().history.to_vec()
    }

    /// Run `f` against the locked history without copying it
    pub fn with_history<R>(&self, f: impl FnOnce(&PoseHistory) -> R) -> R {
        f(&self.state.lock().history)
    }

    /// Number of retained samples
    pub fn len(&self) -> usize {
        self.state.lock().history.len()
    }

    /// Check if no sample is retained
    pub fn is_empty(&self) -> bool {
        self.state.lock().history.is_empty()
    }

    /// Maximum number of retained samples
    pub fn capacity(&self) -> usize {
        self.state.lock().history.capacity()
    }

    /// Drop all samples and forget the current pose
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.history.clear();
        state.current = None;
    }
}
