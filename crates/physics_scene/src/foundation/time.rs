//! Time management utilities
//!
//! The synchronization core never reads the wall clock. Hosts measure frame
//! durations with [`FrameTimer`] and hand them to the frame driver.

use std::time::{Duration, Instant};

/// High-precision timer for measuring real frame durations
pub struct FrameTimer {
    last_frame: Instant,
    delta: Duration,
    total: Duration,
    frame_count: u64,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTimer {
    /// Create a new timer starting now
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta: Duration::ZERO,
            total: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Mark the start of a new frame and return the time since the previous one
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        self.delta = now.duration_since(self.last_frame);
        self.total += self.delta;
        self.last_frame = now;
        self.frame_count += 1;
        self.delta
    }

    /// Get the duration of the last measured frame
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Get the total measured time since timer creation
    pub fn total(&self) -> Duration {
        self.total
    }

    /// Get the number of frames measured
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the average FPS since timer creation
    pub fn average_fps(&self) -> f32 {
        let secs = self.total.as_secs_f32();
        if secs > 0.0 {
            self.frame_count as f32 / secs
        } else {
            0.0
        }
    }
}
